use axum::{
    Json,
    extract::{FromRequest, Request},
};

use crate::app_error::AppError;

/// JSON body extractor whose rejections go through the error taxonomy.
///
/// `axum::Json` answers bad bodies itself with a plain-text message; this
/// wrapper turns every rejection into an [`AppError`] so it gets the usual
/// envelope and logging.
#[derive(Debug, Clone, Copy, Default)]
pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = axum::extract::rejection::JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(AppJson(value))
    }
}
