use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::app_error::{AppError, AppResult, AuthFailure};
use crate::entities::role::Role;
use secrecy::ExposeSecret;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

pub fn issue(
    subject: &str,
    role: Role,
    secret: &secrecy::SecretString,
    ttl: Duration,
) -> AppResult<String> {
    let now = OffsetDateTime::now_utc().unix_timestamp();
    let exp = now + ttl.whole_seconds();
    let claims = Claims {
        sub: subject.to_string(),
        role,
        iat: now,
        exp,
    };
    sign(&claims, secret)
}

pub fn sign(claims: &Claims, secret: &secrecy::SecretString) -> AppResult<String> {
    let header = Header::new(Algorithm::HS256);
    encode(
        &header,
        claims,
        &EncodingKey::from_secret(secret.expose_secret().as_bytes()),
    )
    .map_err(|e| AppError::Internal(e.to_string()))
}

/// Verifies signature and expiry. `exp` must lie strictly in the future;
/// no clock-skew leeway is granted.
pub fn verify(token: &str, secret: &secrecy::SecretString) -> AppResult<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "sub"]);

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.expose_secret().as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
            AppError::Unauthenticated(AuthFailure::Expired)
        }
        _ => AppError::Unauthenticated(AuthFailure::Invalid),
    })?;

    if claims.exp <= OffsetDateTime::now_utc().unix_timestamp() {
        return Err(AppError::Unauthenticated(AuthFailure::Expired));
    }

    Ok(claims)
}
