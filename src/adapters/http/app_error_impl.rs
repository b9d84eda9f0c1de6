use std::sync::Arc;

use crate::adapters::http::responder::{ErrorEnvelope, PendingError};
use crate::app_error::AppError;
use axum::Json;
use axum::response::{IntoResponse, Response};

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Terse body up front; the responder reshapes it and logs once.
        let outcome = self.outcome();
        let mut response = (outcome.status, Json(ErrorEnvelope::terse(&outcome))).into_response();
        response
            .extensions_mut()
            .insert(PendingError(Arc::new(self)));
        response
    }
}
