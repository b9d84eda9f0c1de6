pub mod admin;
pub mod session;

use axum::{
    Router,
    http::Uri,
    middleware,
    routing::{get, post},
};

use crate::{
    adapters::http::{
        app_state::AppState,
        auth::RoleGate,
        middleware::{authenticate, authorize},
    },
    app_error::AppError,
};

pub fn router(app_state: &AppState) -> Router<AppState> {
    let authenticated = Router::new()
        .route("/me", get(session::me))
        .route("/session/refresh", post(session::refresh))
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            authenticate,
        ));

    let admin = Router::new()
        .route("/admin/session", get(session::me))
        .route("/admin/tokens", post(admin::issue_token))
        .route_layer(middleware::from_fn_with_state(
            RoleGate::new(app_state.verifier.clone(), app_state.config.admin_roles),
            authorize,
        ));

    Router::new()
        .route("/logout", get(session::logout))
        .merge(authenticated)
        .merge(admin)
        .method_not_allowed_fallback(method_not_allowed)
}

pub async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("Can't find {} on this server!", uri.path()))
}

pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed("Method not allowed".into())
}
