use axum::{
    Json,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
};
use axum_extra::extract::cookie::{Cookie, SameSite};
use serde::Serialize;
use time::Duration;

use crate::{
    adapters::http::{
        app_state::AppState,
        auth::{Identity, TOKEN_COOKIE},
    },
    app_error::{AppError, AppResult},
    application::jwt,
    entities::role::Role,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionUser {
    id: String,
    role: Role,
    issued_at: i64,
    expires_at: i64,
}

#[derive(Serialize)]
struct SessionResponse {
    success: bool,
    user: SessionUser,
}

#[derive(Serialize)]
struct TokenResponse {
    success: bool,
    token: String,
}

#[derive(Serialize)]
struct MessageResponse {
    success: bool,
    message: &'static str,
}

pub async fn me(Identity(claims): Identity) -> impl IntoResponse {
    Json(SessionResponse {
        success: true,
        user: SessionUser {
            id: claims.sub,
            role: claims.role,
            issued_at: claims.iat,
            expires_at: claims.exp,
        },
    })
}

/// Issues a fresh credential for the caller and stores it in the `token` cookie.
pub async fn refresh(
    State(app_state): State<AppState>,
    Identity(claims): Identity,
) -> AppResult<impl IntoResponse> {
    let token = jwt::issue(
        &claims.sub,
        claims.role,
        &app_state.config.jwt_secret,
        app_state.config.token_ttl,
    )?;

    let mut headers = HeaderMap::new();
    let cookie = Cookie::build((TOKEN_COOKIE, token.clone()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(app_state.config.cookie_ttl)
        .build();
    append_cookie(&mut headers, cookie)?;

    Ok((
        StatusCode::OK,
        headers,
        Json(TokenResponse {
            success: true,
            token,
        }),
    ))
}

pub async fn logout() -> AppResult<impl IntoResponse> {
    let mut headers = HeaderMap::new();
    let cookie = Cookie::build((TOKEN_COOKIE, ""))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(Duration::seconds(0))
        .build();
    append_cookie(&mut headers, cookie)?;

    Ok((
        StatusCode::OK,
        headers,
        Json(MessageResponse {
            success: true,
            message: "Logged out",
        }),
    ))
}

/// Appends a cookie to the headers, handling parse errors gracefully
fn append_cookie(headers: &mut HeaderMap, cookie: Cookie<'_>) -> Result<(), AppError> {
    let value = HeaderValue::from_str(&cookie.to_string())
        .map_err(|_| AppError::Internal("Failed to build cookie header".into()))?;
    headers.append("set-cookie", value);
    Ok(())
}
