//! Cookie-token auth guard.
//!
//! Protected routes read a signed token from the `token` cookie. The
//! token carries the caller's email claim and a 10-hour expiry; handlers
//! compare that email against the resource owner they are asked for.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::ApiError;

/// Name of the session cookie.
pub const TOKEN_COOKIE: &str = "token";

const TOKEN_TTL_HOURS: i64 = 10;

/// Claims carried by the session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Authenticated identity.
    pub email: String,
    /// Expiry as a unix timestamp.
    pub exp: i64,
}

/// Signs a token for the given email, expiring in 10 hours.
pub fn issue_token(email: &str, secret: &str) -> Result<String, ApiError> {
    let claims = Claims {
        email: email.to_string(),
        exp: (Utc::now() + Duration::hours(TOKEN_TTL_HOURS)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(e.to_string()))
}

/// Verifies a token's signature and expiry.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, ApiError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ApiError::Unauthenticated)
}

/// Extracts and validates the token cookie from a request.
/// A missing or invalid cookie rejects with Unauthenticated.
pub fn authenticate(jar: &CookieJar, config: &Config) -> Result<Claims, ApiError> {
    let cookie = jar.get(TOKEN_COOKIE).ok_or(ApiError::Unauthenticated)?;
    verify_token(cookie.value(), &config.jwt_secret)
}

/// Builds the session cookie carrying a signed token.
///
/// Always httpOnly. In production the frontend is served cross-site, so
/// the cookie needs `SameSite=None` which in turn requires `Secure`.
pub fn session_cookie(token: String, config: &Config) -> Cookie<'static> {
    let mut cookie = Cookie::new(TOKEN_COOKIE, token);
    cookie.set_http_only(true);
    cookie.set_path("/");
    if config.production {
        cookie.set_secure(true);
        cookie.set_same_site(SameSite::None);
    } else {
        cookie.set_same_site(SameSite::Lax);
    }
    cookie
}

/// Builds the cookie used to clear the session on logout.
/// Name and path must match the session cookie for removal to apply.
pub fn removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::new(TOKEN_COOKIE, "");
    cookie.set_path("/");
    cookie
}
