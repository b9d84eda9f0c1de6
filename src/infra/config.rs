use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use axum::http::HeaderValue;
use axum_extra::extract::cookie::Key;
use env_helpers::{get_env, get_env_default};
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha512};
use time::Duration;

use crate::{access_policy::RoleSet, entities::role::Role};

/// How much an error response reveals. Fixed for the life of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorMode {
    /// Adds kind, timestamp, request line and cause chain. Never in production.
    Verbose,
    Terse,
}

impl ErrorMode {
    /// Any deployment name containing `prod` (any case) selects terse mode.
    pub fn from_app_env(app_env: &str) -> Self {
        if app_env.to_ascii_lowercase().contains("prod") {
            ErrorMode::Terse
        } else {
            ErrorMode::Verbose
        }
    }

    pub fn is_verbose(&self) -> bool {
        matches!(self, ErrorMode::Verbose)
    }
}

pub struct AppConfig {
    pub jwt_secret: SecretString,
    /// Signs and verifies the `token` cookie when sent as a signed cookie.
    pub cookie_key: Key,
    pub error_mode: ErrorMode,
    pub token_ttl: Duration,
    pub cookie_ttl: Duration,
    /// Roles allowed on `/admin` routes.
    pub admin_roles: RoleSet,
    pub bind_addr: SocketAddr,
    pub cors_origin: HeaderValue,
    pub body_limit_bytes: usize,
    /// When set, JSON logs are written here in addition to the console.
    pub log_file: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let jwt_secret: SecretString = SecretString::new(get_env::<String>("JWT_SECRET").into());
        let cookie_secret: SecretString =
            SecretString::new(get_env::<String>("COOKIE_SECRET").into());

        let app_env: String = get_env_default("APP_ENV", "development".to_string());
        let token_ttl_secs: i64 = get_env_default("TOKEN_TTL_SECS", 604_800);
        let cookie_lifetime_days: i64 = get_env_default("COOKIE_LIFETIME_DAYS", 7);
        let admin_roles: RoleSet =
            get_env_default("ADMIN_ROLES", RoleSet::from([Role::Admin, Role::Sysadmin]));
        let bind_addr: SocketAddr = get_env_default(
            "BIND_ADDR",
            SocketAddr::from((Ipv4Addr::LOCALHOST, 5001)),
        );
        let cors_origin: HeaderValue =
            get_env_default("CORS_ORIGIN", String::from("http://localhost:3000"))
                .parse()
                .expect("CORS_ORIGIN must be a valid header value");
        let body_limit_bytes: usize = get_env_default("BODY_LIMIT_BYTES", 1024 * 1024);
        let log_file: Option<PathBuf> = std::env::var("LOG_FILE").ok().map(PathBuf::from);

        Self {
            jwt_secret,
            cookie_key: derive_cookie_key(&cookie_secret),
            error_mode: ErrorMode::from_app_env(&app_env),
            token_ttl: Duration::seconds(token_ttl_secs),
            cookie_ttl: Duration::days(cookie_lifetime_days),
            admin_roles,
            bind_addr,
            cors_origin,
            body_limit_bytes,
            log_file,
        }
    }
}

/// Stretches an arbitrary-length secret into the 64 bytes a cookie key needs.
pub fn derive_cookie_key(secret: &SecretString) -> Key {
    let digest = Sha512::digest(secret.expose_secret().as_bytes());
    Key::from(digest.as_slice())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn production_like_environments_select_terse_mode() {
        for name in ["production", "PROD", "preprod", "Production-EU"] {
            assert_eq!(ErrorMode::from_app_env(name), ErrorMode::Terse, "{name}");
        }
        for name in ["development", "test", "staging", ""] {
            assert_eq!(ErrorMode::from_app_env(name), ErrorMode::Verbose, "{name}");
        }
    }

    #[test]
    fn cookie_key_is_stable_for_a_secret() {
        let a = derive_cookie_key(&SecretString::new("cookie-secret".into()));
        let b = derive_cookie_key(&SecretString::new("cookie-secret".into()));
        let c = derive_cookie_key(&SecretString::new("other-secret".into()));

        assert_eq!(a.master(), b.master());
        assert_ne!(a.master(), c.master());
    }
}
