//! Registration endpoints, including the cookie-guarded listing.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum_extra::extract::cookie::CookieJar;
use common::RegistrationId;
use serde::{Deserialize, Serialize};
use store::{
    FieldPatch, MarathonStore, NewRegistration, Registration, RegistrationFilter,
    RegistrationStore,
};

use crate::AppState;
use crate::auth;
use crate::error::ApiError;

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub email: Option<String>,
    pub search: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedResponse {
    pub inserted_id: RegistrationId,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResponse {
    pub matched_count: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub deleted_count: u64,
}

// -- Handlers --

/// GET /registerMarathon — list the caller's registrations.
///
/// Requires a valid token cookie. The requested email must equal the
/// authenticated email exactly; a mismatch is Forbidden regardless of
/// whether that email has registrations. `search` is a case-insensitive
/// substring match on the marathon title.
#[tracing::instrument(skip(state, jar))]
pub async fn list<S: MarathonStore + RegistrationStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    jar: CookieJar,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Registration>>, ApiError> {
    let claims = auth::authenticate(&jar, &state.config)?;

    let email = params.email.unwrap_or_else(|| claims.email.clone());
    if email != claims.email {
        return Err(ApiError::Forbidden(
            "access restricted to your own registrations".to_string(),
        ));
    }

    let mut filter = RegistrationFilter::new().by_email(email);
    if let Some(term) = params.search {
        filter = filter.with_title_search(term);
    }

    let registrations = state.store.list_registrations(filter).await?;
    Ok(Json(registrations))
}

/// POST /registerMarathon — create a registration through the
/// coordinator, which bumps the marathon's counter.
#[tracing::instrument(skip(state, body))]
pub async fn create<S: MarathonStore + RegistrationStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(body): Json<NewRegistration>,
) -> Result<(axum::http::StatusCode, Json<CreatedResponse>), ApiError> {
    let inserted_id = state.coordinator.create_registration(body).await?;
    Ok((
        axum::http::StatusCode::CREATED,
        Json(CreatedResponse { inserted_id }),
    ))
}

/// PUT /registerMarathon/:id — partial update; 404 when the update
/// matches nothing. The marathon reference is immutable.
#[tracing::instrument(skip(state, patch))]
pub async fn update<S: MarathonStore + RegistrationStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(patch): Json<FieldPatch>,
) -> Result<Json<UpdateResponse>, ApiError> {
    let id = parse_registration_id(&id)?;
    let matched_count = state.store.update_registration_fields(id, patch).await?;
    if matched_count == 0 {
        return Err(ApiError::NotFound(format!("Registration {id} not found")));
    }
    Ok(Json(UpdateResponse { matched_count }))
}

/// DELETE /registerMarathon/:id — delete through the coordinator, which
/// decrements the marathon's counter.
#[tracing::instrument(skip(state))]
pub async fn remove<S: MarathonStore + RegistrationStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let id = parse_registration_id(&id)?;
    state.coordinator.delete_registration(id).await?;
    Ok(Json(DeleteResponse { deleted_count: 1 }))
}

fn parse_registration_id(id: &str) -> Result<RegistrationId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))?;
    Ok(RegistrationId::from_uuid(uuid))
}
