use std::collections::BTreeMap;

use axum::http::StatusCode;
use serde_json::json;
use thiserror::Error;

use crate::application::fault::Fault;

/// Per-field validation messages, returned to clients as `errors`.
pub type FieldErrors = BTreeMap<String, String>;

/// Why a request could not be authenticated.
///
/// Clients always see the same 401 message; the reason only reaches logs and
/// verbose error responses.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    #[error("no credential supplied")]
    Missing,

    #[error("credential is malformed or its signature does not verify")]
    Invalid,

    #[error("credential has expired")]
    Expired,
}

impl AuthFailure {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthFailure::Missing => "missing",
            AuthFailure::Invalid => "invalid",
            AuthFailure::Expired => "expired",
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Authentication failed: {0}")]
    Unauthenticated(AuthFailure),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    MethodNotAllowed(String),

    #[error("{0}")]
    RequestTimeout(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{message}")]
    Validation { message: String, errors: FieldErrors },

    #[error("{0}")]
    RateLimited(String),

    /// The payload is internal detail; clients get a generic message.
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Unavailable(String),

    /// Business-rule failure with its own code and status.
    #[error("{message}")]
    Rule {
        code: &'static str,
        status: StatusCode,
        message: String,
    },

    /// Failure reported by a collaborator, classified by the responder.
    #[error(transparent)]
    Fault(#[from] Fault),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    BadRequest,
    Unauthenticated,
    Forbidden,
    NotFound,
    MethodNotAllowed,
    RequestTimeout,
    Conflict,
    PayloadTooLarge,
    UnsupportedMediaType,
    ValidationFailed,
    RateLimited,
    Internal,
    Unavailable,
    GatewayTimeout,
    InsufficientStorage,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "BAD_REQUEST",
            ErrorKind::Unauthenticated => "UNAUTHENTICATED",
            ErrorKind::Forbidden => "FORBIDDEN",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            ErrorKind::RequestTimeout => "REQUEST_TIMEOUT",
            ErrorKind::Conflict => "CONFLICT",
            ErrorKind::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            ErrorKind::UnsupportedMediaType => "UNSUPPORTED_MEDIA_TYPE",
            ErrorKind::ValidationFailed => "VALIDATION_FAILED",
            ErrorKind::RateLimited => "RATE_LIMITED",
            ErrorKind::Internal => "INTERNAL_ERROR",
            ErrorKind::Unavailable => "SERVICE_UNAVAILABLE",
            ErrorKind::GatewayTimeout => "GATEWAY_TIMEOUT",
            ErrorKind::InsufficientStorage => "INSUFFICIENT_STORAGE",
        }
    }

    /// Canonical HTTP status for this kind.
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ErrorKind::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ErrorKind::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ErrorKind::ValidationFailed => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::GatewayTimeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorKind::InsufficientStorage => StatusCode::INSUFFICIENT_STORAGE,
        }
    }
}

pub const AUTHENTICATION_REQUIRED: &str = "Authentication required";
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// What a client is told about an error: status, code and public message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
    pub errors: Option<FieldErrors>,
}

impl Outcome {
    fn of(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            status: kind.status(),
            code: kind.as_str(),
            message: message.into(),
            errors: None,
        }
    }
}

impl AppError {
    /// 422 with structured per-field messages.
    pub fn validation(errors: FieldErrors) -> Self {
        AppError::Validation {
            message: "Validation failed".into(),
            errors,
        }
    }

    /// 422 carrying a single free-form message under `errors.message`.
    pub fn validation_message(message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert("message".into(), message.into());
        Self::validation(errors)
    }

    pub fn rule(code: &'static str, status: StatusCode, message: impl Into<String>) -> Self {
        AppError::Rule {
            code,
            status,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        Some(match self {
            AppError::BadRequest(_) => ErrorKind::BadRequest,
            AppError::Unauthenticated(_) => ErrorKind::Unauthenticated,
            AppError::Forbidden(_) => ErrorKind::Forbidden,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::MethodNotAllowed(_) => ErrorKind::MethodNotAllowed,
            AppError::RequestTimeout(_) => ErrorKind::RequestTimeout,
            AppError::Conflict(_) => ErrorKind::Conflict,
            AppError::Validation { .. } => ErrorKind::ValidationFailed,
            AppError::RateLimited(_) => ErrorKind::RateLimited,
            AppError::Internal(_) => ErrorKind::Internal,
            AppError::Unavailable(_) => ErrorKind::Unavailable,
            AppError::Rule { .. } => return None,
            AppError::Fault(fault) => fault.classify().0,
        })
    }

    /// Resolves the error to the status and message clients see.
    pub fn outcome(&self) -> Outcome {
        match self {
            AppError::BadRequest(msg) => Outcome::of(ErrorKind::BadRequest, msg.as_str()),
            AppError::Unauthenticated(_) => {
                Outcome::of(ErrorKind::Unauthenticated, AUTHENTICATION_REQUIRED)
            }
            AppError::Forbidden(msg) => Outcome::of(ErrorKind::Forbidden, msg.as_str()),
            AppError::NotFound(msg) => Outcome::of(ErrorKind::NotFound, msg.as_str()),
            AppError::MethodNotAllowed(msg) => {
                Outcome::of(ErrorKind::MethodNotAllowed, msg.as_str())
            }
            AppError::RequestTimeout(msg) => Outcome::of(ErrorKind::RequestTimeout, msg.as_str()),
            AppError::Conflict(msg) => Outcome::of(ErrorKind::Conflict, msg.as_str()),
            AppError::Validation { message, errors } => Outcome {
                errors: Some(errors.clone()),
                ..Outcome::of(ErrorKind::ValidationFailed, message.as_str())
            },
            AppError::RateLimited(msg) => Outcome::of(ErrorKind::RateLimited, msg.as_str()),
            AppError::Internal(_) => Outcome::of(ErrorKind::Internal, INTERNAL_ERROR_MESSAGE),
            AppError::Unavailable(msg) => Outcome::of(ErrorKind::Unavailable, msg.as_str()),
            AppError::Rule {
                code,
                status,
                message,
            } => Outcome {
                status: *status,
                code: *code,
                message: message.clone(),
                errors: None,
            },
            AppError::Fault(fault) => {
                let (kind, message) = fault.classify();
                Outcome::of(kind, message)
            }
        }
    }

    /// Extra structured fields exposed only in verbose responses.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            AppError::Unauthenticated(reason) => Some(json!({ "reason": reason.as_str() })),
            AppError::Rule { code, .. } => Some(json!({ "rule": *code })),
            AppError::Fault(fault) => Some(json!({ "fault": fault.name() })),
            _ => None,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
