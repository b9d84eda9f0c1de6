use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use time::Duration;
use validator::Validate;

use crate::{
    adapters::http::{app_state::AppState, auth::Identity, extract::AppJson},
    app_error::{AppError, AppResult},
    application::jwt,
    entities::role::Role,
};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct IssueTokenRequest {
    #[validate(length(min = 1, max = 64, message = "Subject must be 1 to 64 characters"))]
    pub subject: String,
    #[serde(default)]
    pub role: Role,
    #[validate(range(
        min = 60,
        max = 2_592_000,
        message = "Token lifetime must be between 60 seconds and 30 days"
    ))]
    pub ttl_secs: Option<i64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IssuedToken {
    success: bool,
    token: String,
    expires_in: i64,
}

/// Issues a credential for another subject. Callers cannot mint a role above their own.
pub async fn issue_token(
    State(app_state): State<AppState>,
    Identity(caller): Identity,
    AppJson(payload): AppJson<IssueTokenRequest>,
) -> AppResult<impl IntoResponse> {
    payload.validate()?;

    if payload.role > caller.role {
        return Err(AppError::Forbidden(format!(
            "{} cannot issue {} credentials",
            caller.role, payload.role
        )));
    }

    let ttl = payload
        .ttl_secs
        .map(Duration::seconds)
        .unwrap_or(app_state.config.token_ttl);
    let token = jwt::issue(
        &payload.subject,
        payload.role,
        &app_state.config.jwt_secret,
        ttl,
    )?;

    tracing::info!(
        issuer = %caller.sub,
        subject = %payload.subject,
        role = %payload.role,
        "Credential issued"
    );

    Ok((
        StatusCode::CREATED,
        Json(IssuedToken {
            success: true,
            token,
            expires_in: ttl.whole_seconds(),
        }),
    ))
}
