//! Test data factories for credentials and configuration.
//!
//! Each factory returns a complete, valid value with sensible defaults.
//! Use the closure parameter to override specific fields as needed.

use std::net::{Ipv4Addr, SocketAddr};

use axum::http::{HeaderValue, header::SET_COOKIE};
use axum::response::IntoResponse;
use axum_extra::extract::cookie::{Cookie, SignedCookieJar};
use secrecy::SecretString;
use time::Duration;

use crate::{
    access_policy::RoleSet,
    adapters::http::auth::TOKEN_COOKIE,
    application::jwt,
    entities::role::Role,
    infra::config::{AppConfig, ErrorMode, derive_cookie_key},
};

pub const TEST_JWT_SECRET: &str = "test-jwt-secret-with-enough-entropy";
pub const TEST_COOKIE_SECRET: &str = "test-cookie-secret";

/// Create a test configuration: verbose errors, fixed secrets, default TTLs.
pub fn create_test_config(overrides: impl FnOnce(&mut AppConfig)) -> AppConfig {
    let mut config = AppConfig {
        jwt_secret: SecretString::new(TEST_JWT_SECRET.into()),
        cookie_key: derive_cookie_key(&SecretString::new(TEST_COOKIE_SECRET.into())),
        error_mode: ErrorMode::Verbose,
        token_ttl: Duration::days(7),
        cookie_ttl: Duration::days(7),
        admin_roles: RoleSet::from([Role::Admin, Role::Sysadmin]),
        bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 0)),
        cors_origin: HeaderValue::from_static("http://localhost:3000"),
        body_limit_bytes: 1024,
        log_file: None,
    };
    overrides(&mut config);
    config
}

/// Create a valid token for `subject` signed with the config's secret.
pub fn create_test_token(config: &AppConfig, subject: &str, role: Role) -> String {
    jwt::issue(subject, role, &config.jwt_secret, config.token_ttl).unwrap()
}

/// A `Cookie` header value carrying `token` as a cookie signed with the config's key.
pub fn signed_cookie_header(config: &AppConfig, token: &str) -> String {
    let jar = SignedCookieJar::new(config.cookie_key.clone())
        .add(Cookie::new(TOKEN_COOKIE, token.to_string()));
    let response = jar.into_response();
    let set_cookie = response
        .headers()
        .get(SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    let cookie = Cookie::parse(set_cookie.to_string()).unwrap();
    format!("{}={}", cookie.name(), cookie.value())
}
