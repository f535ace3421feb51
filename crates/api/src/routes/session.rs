//! Session token issuance and logout.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use store::{MarathonStore, RegistrationStore};

use crate::AppState;
use crate::auth;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub email: String,
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub success: bool,
}

/// POST /jwt — signs a 10-hour token for the supplied email and sets it
/// as an httpOnly cookie.
#[tracing::instrument(skip(state, jar, body), fields(email = %body.email))]
pub async fn issue<S: MarathonStore + RegistrationStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    jar: CookieJar,
    Json(body): Json<TokenRequest>,
) -> Result<(CookieJar, Json<TokenResponse>), ApiError> {
    let token = auth::issue_token(&body.email, &state.config.jwt_secret)?;
    let jar = jar.add(auth::session_cookie(token, &state.config));
    Ok((jar, Json(TokenResponse { success: true })))
}

/// POST /logout — clears the token cookie.
#[tracing::instrument(skip(jar))]
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<TokenResponse>) {
    let jar = jar.remove(auth::removal_cookie());
    (jar, Json(TokenResponse { success: true }))
}
