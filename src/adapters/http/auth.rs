//! Credential lookup and verification for inbound requests.
//!
//! A credential is looked up in the `Authorization: Bearer` header, then a
//! plain `token` cookie, then a signed `token` cookie. The first source that
//! yields a value wins; sources are never merged.

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use axum_extra::extract::cookie::{CookieJar, Key, SignedCookieJar};

use crate::{
    access_policy::RoleSet,
    app_error::{AppError, AppResult, AuthFailure},
    application::jwt::{self, Claims},
    infra::config::AppConfig,
};

pub const TOKEN_COOKIE: &str = "token";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Header,
    Cookie,
    SignedCookie,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub source: CredentialSource,
    pub token: String,
}

/// Finds the credential a request carries, without validating it.
///
/// Both cookie sources share the `token` name: a cookie whose value carries a
/// valid signature under `key` is the signed source, anything else is plain.
pub fn locate_credential(headers: &HeaderMap, key: &Key) -> Option<Credential> {
    if let Some(value) = headers.get(AUTHORIZATION)
        && let Ok(value) = value.to_str()
        && let Some(token) = value.strip_prefix("Bearer ")
    {
        return Some(Credential {
            source: CredentialSource::Header,
            token: token.trim().to_string(),
        });
    }

    let plain = CookieJar::from_headers(headers);
    let signed = SignedCookieJar::from_headers(headers, key.clone());
    let verified = signed.get(TOKEN_COOKIE);

    if verified.is_none()
        && let Some(cookie) = plain.get(TOKEN_COOKIE)
    {
        return Some(Credential {
            source: CredentialSource::Cookie,
            token: cookie.value().to_string(),
        });
    }

    verified.map(|cookie| Credential {
        source: CredentialSource::SignedCookie,
        token: cookie.value().to_string(),
    })
}

/// Turns request headers into verified [`Claims`].
#[derive(Clone)]
pub struct Verifier {
    config: Arc<AppConfig>,
}

impl Verifier {
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self { config }
    }

    pub fn verify(&self, headers: &HeaderMap) -> AppResult<Claims> {
        let credential = locate_credential(headers, &self.config.cookie_key)
            .filter(|credential| !credential.token.is_empty())
            .ok_or(AppError::Unauthenticated(AuthFailure::Missing))?;

        let claims = jwt::verify(&credential.token, &self.config.jwt_secret)?;

        tracing::debug!(
            subject = %claims.sub,
            role = %claims.role,
            source = ?credential.source,
            "Credential verified"
        );

        Ok(claims)
    }
}

/// The verified caller, handed to handlers as an explicit argument.
///
/// Verification runs at most once per request: the first extraction caches
/// the identity so later guards and the handler reuse it.
#[derive(Debug, Clone)]
pub struct Identity(pub Claims);

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
    Verifier: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(identity) = parts.extensions.get::<Identity>() {
            return Ok(identity.clone());
        }

        let claims = Verifier::from_ref(state).verify(&parts.headers)?;
        let identity = Identity(claims);
        parts.extensions.insert(identity.clone());
        Ok(identity)
    }
}

/// Route guard state: the verifier plus the roles captured at registration.
#[derive(Clone)]
pub struct RoleGate {
    pub verifier: Verifier,
    pub allowed: RoleSet,
}

impl RoleGate {
    pub fn new(verifier: Verifier, allowed: impl Into<RoleSet>) -> Self {
        Self {
            verifier,
            allowed: allowed.into(),
        }
    }
}

impl FromRef<RoleGate> for Verifier {
    fn from_ref(gate: &RoleGate) -> Self {
        gate.verifier.clone()
    }
}
