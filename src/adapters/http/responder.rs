//! Terminal error responder.
//!
//! Handlers and guards return [`AppError`]; its `IntoResponse` impl renders a
//! terse body and tags the response with [`PendingError`]. This middleware,
//! registered outside every route, is the only place that logs the error and
//! decides the final body. Responses without the tag pass through untouched,
//! which also makes a second pass a no-op.

use std::error::Error as _;
use std::sync::Arc;

use axum::{
    Json,
    extract::{Request, State},
    http::{Method, header::CONTENT_LENGTH},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::{
    app_error::{AppError, FieldErrors, Outcome},
    infra::config::ErrorMode,
};

/// Links a response to the error that produced it until it is shaped.
#[derive(Clone, Debug)]
pub struct PendingError(pub Arc<AppError>);

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope<'a> {
    pub success: bool,
    pub message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<&'a FieldErrors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
}

impl<'a> ErrorEnvelope<'a> {
    pub fn terse(outcome: &'a Outcome) -> Self {
        Self {
            success: false,
            message: &outcome.message,
            errors: outcome.errors.as_ref(),
            error: None,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetail {
    pub kind: &'static str,
    pub status_code: u16,
    pub timestamp: String,
    pub path: String,
    pub method: String,
    pub causes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// The request line, captured before the request is handed on.
#[derive(Debug, Clone)]
pub struct RequestMeta {
    pub method: Method,
    pub path: String,
}

impl RequestMeta {
    pub fn of(request: &Request) -> Self {
        Self {
            method: request.method().clone(),
            path: request.uri().path().to_string(),
        }
    }
}

pub async fn error_responder(
    State(mode): State<ErrorMode>,
    request: Request,
    next: Next,
) -> Response {
    let meta = RequestMeta::of(&request);
    let response = next.run(request).await;
    respond(mode, &meta, response)
}

/// Shapes a tagged error response for `mode`; forwards anything else as is.
pub fn respond(mode: ErrorMode, meta: &RequestMeta, mut response: Response) -> Response {
    let Some(PendingError(error)) = response.extensions_mut().remove::<PendingError>() else {
        return response;
    };

    let outcome = error.outcome();
    log_error(mode, meta, &error, &outcome);

    let mut envelope = ErrorEnvelope::terse(&outcome);
    if mode.is_verbose() {
        envelope.error = Some(ErrorDetail {
            kind: outcome.code,
            status_code: outcome.status.as_u16(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            path: meta.path.clone(),
            method: meta.method.to_string(),
            causes: cause_chain(&error),
            details: error.details(),
        });
    }

    let (mut parts, _) = response.into_parts();
    parts.status = outcome.status;
    parts.headers.remove(CONTENT_LENGTH);
    let (_, body) = Json(envelope).into_response().into_parts();
    Response::from_parts(parts, body)
}

/// The error's message followed by each of its sources.
pub fn cause_chain(error: &AppError) -> Vec<String> {
    let mut causes = vec![error.to_string()];
    let mut source = error.source();
    while let Some(err) = source {
        causes.push(err.to_string());
        source = err.source();
    }
    causes
}

fn log_error(mode: ErrorMode, meta: &RequestMeta, error: &AppError, outcome: &Outcome) {
    let causes = mode.is_verbose().then(|| cause_chain(error));

    if outcome.status.is_server_error() {
        tracing::error!(
            path = %meta.path,
            method = %meta.method,
            status = outcome.status.as_u16(),
            kind = outcome.code,
            message = %outcome.message,
            error = %error,
            causes = ?causes,
            "Request failed"
        );
    } else {
        tracing::warn!(
            path = %meta.path,
            method = %meta.method,
            status = outcome.status.as_u16(),
            kind = outcome.code,
            message = %outcome.message,
            error = %error,
            causes = ?causes,
            "Request rejected"
        );
    }
}
