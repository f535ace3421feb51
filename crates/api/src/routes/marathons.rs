//! Marathon CRUD endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use common::MarathonId;
use serde::{Deserialize, Serialize};
use store::{
    FieldPatch, Marathon, MarathonFilter, MarathonStore, NewMarathon, RegistrationStore, SortOrder,
};

use crate::AppState;
use crate::error::ApiError;

/// Number of marathons shown on the landing page.
const HOME_LIMIT: usize = 6;

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub email: Option<String>,
    pub sort: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedResponse {
    pub inserted_id: MarathonId,
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

/// GET /marathons — list, optionally filtered by creator email, sorted on
/// creation time (`sort=desc` descending, anything else ascending).
#[tracing::instrument(skip(state))]
pub async fn list<S: MarathonStore + RegistrationStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Marathon>>, ApiError> {
    let mut filter = MarathonFilter::new().sorted(SortOrder::from_query(params.sort.as_deref()));
    if let Some(email) = params.email {
        filter = filter.by_creator(email);
    }

    let marathons = state.store.list_marathons(filter).await?;
    Ok(Json(marathons))
}

/// GET /marathonsInHome — first few marathons for the landing page,
/// no order guarantee.
#[tracing::instrument(skip(state))]
pub async fn home<S: MarathonStore + RegistrationStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<Marathon>>, ApiError> {
    let marathons = state
        .store
        .list_marathons(MarathonFilter::new().with_limit(HOME_LIMIT))
        .await?;
    Ok(Json(marathons))
}

/// GET /marathons/:id — fetch one marathon by id.
#[tracing::instrument(skip(state))]
pub async fn get<S: MarathonStore + RegistrationStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Marathon>, ApiError> {
    let id = parse_marathon_id(&id)?;
    let marathon = state
        .store
        .get_marathon(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Marathon {id} not found")))?;
    Ok(Json(marathon))
}

/// POST /marathons — create a marathon from an arbitrary record shape.
#[tracing::instrument(skip(state, body))]
pub async fn create<S: MarathonStore + RegistrationStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(body): Json<NewMarathon>,
) -> Result<(axum::http::StatusCode, Json<CreatedResponse>), ApiError> {
    let inserted_id = state.store.insert_marathon(body).await?;
    Ok((
        axum::http::StatusCode::CREATED,
        Json(CreatedResponse { inserted_id }),
    ))
}

/// PUT /marathons/:id — partial update; only supplied fields are
/// overwritten. 404 when the update matches nothing.
#[tracing::instrument(skip(state, patch))]
pub async fn update<S: MarathonStore + RegistrationStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(patch): Json<FieldPatch>,
) -> Result<Json<UpdateResponse>, ApiError> {
    let id = parse_marathon_id(&id)?;
    let matched_count = state.store.update_marathon_fields(id, patch).await?;
    if matched_count == 0 {
        return Err(ApiError::NotFound(format!("Marathon {id} not found")));
    }
    Ok(Json(UpdateResponse { matched_count }))
}

/// DELETE /marathons/:id — idempotent delete by id. Registrations
/// referencing the marathon are deliberately left in place.
#[tracing::instrument(skip(state))]
pub async fn remove<S: MarathonStore + RegistrationStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let id = parse_marathon_id(&id)?;
    let deleted_count = state.store.delete_marathon(id).await?;
    Ok(Json(DeleteResponse { deleted_count }))
}

pub(crate) fn parse_marathon_id(id: &str) -> Result<MarathonId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))?;
    Ok(MarathonId::from_uuid(uuid))
}
