//! Untyped failures reported by collaborators (datastore driver, I/O stack,
//! request body extraction, schema validation) and their translation into
//! the error taxonomy.

use std::io;

use axum::{extract::rejection::JsonRejection, http::StatusCode};
use thiserror::Error;
use uuid::Uuid;
use validator::ValidationErrors;

use crate::app_error::{AppError, ErrorKind};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub const UNEXPECTED_MESSAGE: &str = "An unexpected error occurred. Please try again later.";
const DATASTORE_TIMEOUT: &str = "Database operation timed out. Please try again.";
const DATASTORE_UNREACHABLE: &str = "Unable to connect to the database. Please try again later.";

#[derive(Error, Debug)]
pub enum Fault {
    #[error("malformed identifier for `{field}`: {value}")]
    MalformedId { field: String, value: String },

    #[error("duplicate value for `{field}`: {value}")]
    DuplicateKey { field: String, value: String },

    #[error("schema validation failed")]
    Schema(#[from] ValidationErrors),

    #[error("request body rejected")]
    Json(#[from] JsonRejection),

    /// Anti-forgery token missing or not matching the session.
    #[error("csrf token rejected")]
    CsrfToken,

    #[error("datastore error")]
    Datastore(#[from] sqlx::Error),

    #[error("i/o error")]
    Io(#[from] io::Error),

    #[error("unexpected failure")]
    Unexpected(#[source] BoxError),
}

impl Fault {
    pub fn unexpected(err: impl Into<BoxError>) -> Self {
        Fault::Unexpected(err.into())
    }

    pub fn name(&self) -> &'static str {
        match self {
            Fault::MalformedId { .. } => "malformed_id",
            Fault::DuplicateKey { .. } => "duplicate_key",
            Fault::Schema(_) => "schema",
            Fault::Json(_) => "json",
            Fault::CsrfToken => "csrf_token",
            Fault::Datastore(_) => "datastore",
            Fault::Io(_) => "io",
            Fault::Unexpected(_) => "unexpected",
        }
    }

    /// Maps the failure to a kind and a client-safe message. First match wins.
    pub fn classify(&self) -> (ErrorKind, String) {
        match self {
            Fault::MalformedId { field, value } => (
                ErrorKind::NotFound,
                format!("Resource not found. Invalid {field}: {value}"),
            ),
            Fault::DuplicateKey { field, value } => {
                (ErrorKind::Conflict, duplicate_message(field, value))
            }
            Fault::Schema(errors) => (ErrorKind::BadRequest, schema_message(errors)),
            Fault::Json(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => (
                ErrorKind::PayloadTooLarge,
                "Request payload is too large.".into(),
            ),
            Fault::Json(JsonRejection::MissingJsonContentType(_)) => (
                ErrorKind::UnsupportedMediaType,
                "Expected request with `Content-Type: application/json`".into(),
            ),
            Fault::Json(_) => (ErrorKind::BadRequest, "Invalid JSON payload".into()),
            Fault::CsrfToken => (ErrorKind::Forbidden, "Invalid CSRF token.".into()),
            Fault::Datastore(err) => classify_datastore(err),
            Fault::Io(err) => classify_io(err),
            Fault::Unexpected(_) => (ErrorKind::Internal, UNEXPECTED_MESSAGE.into()),
        }
    }
}

fn duplicate_message(field: &str, value: &str) -> String {
    format!("{field} '{value}' already exists.")
}

/// Joins every field violation, ordered by field name.
fn schema_message(errors: &ValidationErrors) -> String {
    let mut fields: Vec<(String, Vec<String>)> = errors
        .field_errors()
        .into_iter()
        .map(|(field, violations)| {
            let field = field.to_string();
            let messages = violations
                .iter()
                .map(|violation| match &violation.message {
                    Some(message) => message.to_string(),
                    None => format!("{field} is invalid ({})", violation.code),
                })
                .collect();
            (field, messages)
        })
        .collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    let message = fields
        .into_iter()
        .flat_map(|(_, messages)| messages)
        .collect::<Vec<_>>()
        .join("; ");
    if message.is_empty() {
        "Validation failed".into()
    } else {
        message
    }
}

fn classify_datastore(err: &sqlx::Error) -> (ErrorKind, String) {
    match err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            let detail = db
                .try_downcast_ref::<sqlx::postgres::PgDatabaseError>()
                .and_then(|pg| pg.detail())
                .and_then(parse_duplicate_detail);
            match detail {
                Some((field, value)) => (ErrorKind::Conflict, duplicate_message(&field, &value)),
                None => (ErrorKind::Conflict, "Resource already exists".into()),
            }
        }
        sqlx::Error::RowNotFound => (ErrorKind::NotFound, "Resource not found".into()),
        sqlx::Error::PoolTimedOut => (ErrorKind::GatewayTimeout, DATASTORE_TIMEOUT.into()),
        sqlx::Error::Io(e) if e.kind() == io::ErrorKind::TimedOut => {
            (ErrorKind::GatewayTimeout, DATASTORE_TIMEOUT.into())
        }
        sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Protocol(_) => (ErrorKind::Unavailable, DATASTORE_UNREACHABLE.into()),
        sqlx::Error::Database(_) => (
            ErrorKind::Unavailable,
            "Database operation failed. Please try again.".into(),
        ),
        _ => (ErrorKind::Internal, UNEXPECTED_MESSAGE.into()),
    }
}

fn classify_io(err: &io::Error) -> (ErrorKind, String) {
    let (kind, message) = match err.kind() {
        io::ErrorKind::TimedOut => (ErrorKind::RequestTimeout, "Request timeout. Please try again."),
        io::ErrorKind::ConnectionAborted => (
            ErrorKind::RequestTimeout,
            "Connection was aborted due to timeout.",
        ),
        io::ErrorKind::ConnectionRefused => (
            ErrorKind::Unavailable,
            "Service temporarily unavailable. Please try again later.",
        ),
        io::ErrorKind::ConnectionReset => (
            ErrorKind::Unavailable,
            "Connection was reset. Please try again.",
        ),
        io::ErrorKind::NotFound => (ErrorKind::NotFound, "The requested resource was not found"),
        io::ErrorKind::PermissionDenied => (ErrorKind::Forbidden, "Permission denied"),
        io::ErrorKind::StorageFull => (ErrorKind::InsufficientStorage, "Storage limit reached"),
        _ => (ErrorKind::Internal, UNEXPECTED_MESSAGE),
    };
    (kind, message.to_string())
}

/// Parses Postgres' `Key (email)=(a@b.com) already exists.` detail line.
pub(crate) fn parse_duplicate_detail(detail: &str) -> Option<(String, String)> {
    let rest = detail.strip_prefix("Key (")?;
    let (field, rest) = rest.split_once(")=(")?;
    let value = rest.strip_suffix(") already exists.")?;
    Some((field.to_string(), value.to_string()))
}

/// Parses a resource identifier taken from a path or body field.
pub fn parse_id(field: &str, raw: &str) -> Result<Uuid, Fault> {
    Uuid::parse_str(raw).map_err(|_| Fault::MalformedId {
        field: field.to_string(),
        value: raw.to_string(),
    })
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Fault(Fault::Datastore(e))
    }
}

impl From<io::Error> for AppError {
    fn from(e: io::Error) -> Self {
        AppError::Fault(Fault::Io(e))
    }
}

impl From<ValidationErrors> for AppError {
    fn from(e: ValidationErrors) -> Self {
        AppError::Fault(Fault::Schema(e))
    }
}

impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        AppError::Fault(Fault::Json(e))
    }
}

#[cfg(test)]
mod tests {
    use validator::Validate;

    use super::*;

    #[derive(Validate)]
    struct NewUser {
        #[validate(length(max = 30, message = "Your name cannot exceed 30 Characters"))]
        name: String,
        #[validate(email(message = "Please enter valid email address"))]
        email: String,
        #[validate(length(min = 6, message = "Your password must be longer than 6 characters"))]
        password: String,
    }

    #[test]
    fn malformed_identifier_maps_to_not_found_naming_the_value() {
        let fault = parse_id("id", "xyz").unwrap_err();
        let (kind, message) = fault.classify();

        assert_eq!(kind, ErrorKind::NotFound);
        assert!(message.contains("xyz"));
        assert!(message.contains("id"));
    }

    #[test]
    fn valid_identifier_parses() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id("id", &id.to_string()).unwrap(), id);
    }

    #[test]
    fn duplicate_key_maps_to_conflict_naming_field_and_value() {
        let fault = Fault::DuplicateKey {
            field: "email".into(),
            value: "a@b.com".into(),
        };
        let (kind, message) = fault.classify();

        assert_eq!(kind, ErrorKind::Conflict);
        assert_eq!(message, "email 'a@b.com' already exists.");
    }

    #[test]
    fn postgres_duplicate_detail_is_parsed() {
        assert_eq!(
            parse_duplicate_detail("Key (email)=(a@b.com) already exists."),
            Some(("email".to_string(), "a@b.com".to_string()))
        );
        assert_eq!(parse_duplicate_detail("Failing row contains (1, 2)."), None);
    }

    #[test]
    fn schema_violations_are_concatenated_in_field_order() {
        let user = NewUser {
            name: "x".repeat(31),
            email: "not-an-email".into(),
            password: "abc".into(),
        };
        let errors = user.validate().unwrap_err();
        let (kind, message) = Fault::from(errors).classify();

        assert_eq!(kind, ErrorKind::BadRequest);
        assert_eq!(
            message,
            "Please enter valid email address; \
             Your name cannot exceed 30 Characters; \
             Your password must be longer than 6 characters"
        );
    }

    #[test]
    fn datastore_failures_are_classified() {
        let cases = [
            (sqlx::Error::RowNotFound, ErrorKind::NotFound),
            (sqlx::Error::PoolTimedOut, ErrorKind::GatewayTimeout),
            (sqlx::Error::PoolClosed, ErrorKind::Unavailable),
            (
                sqlx::Error::Io(io::Error::from(io::ErrorKind::TimedOut)),
                ErrorKind::GatewayTimeout,
            ),
            (
                sqlx::Error::Io(io::Error::from(io::ErrorKind::ConnectionRefused)),
                ErrorKind::Unavailable,
            ),
            (
                sqlx::Error::Protocol("unexpected message".into()),
                ErrorKind::Unavailable,
            ),
            (
                sqlx::Error::ColumnNotFound("price".into()),
                ErrorKind::Internal,
            ),
        ];

        for (err, expected) in cases {
            let (kind, message) = Fault::from(err).classify();
            assert_eq!(kind, expected);
            assert!(!message.contains("unexpected message"));
        }
    }

    #[test]
    fn datastore_timeout_differs_from_generic_timeout() {
        let datastore = Fault::from(sqlx::Error::PoolTimedOut).classify().0;
        let generic = Fault::from(io::Error::from(io::ErrorKind::TimedOut)).classify().0;

        assert_eq!(datastore, ErrorKind::GatewayTimeout);
        assert_eq!(generic, ErrorKind::RequestTimeout);
    }

    #[test]
    fn io_failures_are_classified() {
        let cases = [
            (io::ErrorKind::ConnectionAborted, ErrorKind::RequestTimeout),
            (io::ErrorKind::ConnectionRefused, ErrorKind::Unavailable),
            (io::ErrorKind::ConnectionReset, ErrorKind::Unavailable),
            (io::ErrorKind::NotFound, ErrorKind::NotFound),
            (io::ErrorKind::PermissionDenied, ErrorKind::Forbidden),
            (io::ErrorKind::StorageFull, ErrorKind::InsufficientStorage),
            (io::ErrorKind::InvalidData, ErrorKind::Internal),
        ];

        for (io_kind, expected) in cases {
            let (kind, _) = Fault::from(io::Error::new(io_kind, "/var/data/secret.db")).classify();
            assert_eq!(kind, expected, "{io_kind:?}");
        }
    }

    #[test]
    fn csrf_failures_are_forbidden() {
        let (kind, message) = Fault::CsrfToken.classify();
        assert_eq!(kind, ErrorKind::Forbidden);
        assert_eq!(message, "Invalid CSRF token.");
        assert_eq!(AppError::from(Fault::CsrfToken).outcome().status.as_u16(), 403);
    }

    #[test]
    fn unexpected_failures_get_the_generic_message() {
        let (kind, message) = Fault::unexpected("driver exploded at 0xdeadbeef").classify();
        assert_eq!(kind, ErrorKind::Internal);
        assert_eq!(message, UNEXPECTED_MESSAGE);
    }
}
