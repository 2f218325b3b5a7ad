use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use tracing::instrument;

use super::collection_id;
use crate::error::AppError;
use crate::extractors::auth::AdminUser;
use crate::extractors::json::AppJson;
use crate::models::shared::respond;
use crate::models::{CollectionRequest, Family};
use crate::state::AppState;

#[instrument(skip(state), fields(%family))]
pub async fn list_collections(
    State(state): State<AppState>,
    Extension(family): Extension<Family>,
) -> Result<Response, AppError> {
    let items = state.collections.list(family).await?;
    let message = if items.is_empty() {
        format!("No {} found.", family.plural())
    } else {
        format!("{} fetched successfully.", family.plural_title())
    };
    Ok(respond(StatusCode::OK, message, Some(items)))
}

#[instrument(skip(state), fields(%family, %id))]
pub async fn get_collection(
    State(state): State<AppState>,
    Extension(family): Extension<Family>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = collection_id(family, &id)?;
    let collection = state
        .collections
        .get(family, id)
        .await?
        .ok_or_else(|| family.not_found())?;
    Ok(respond(
        StatusCode::OK,
        format!("{} retrieved successfully.", family.label()),
        Some(collection),
    ))
}

#[instrument(skip(state, _admin, body), fields(%family))]
pub async fn create_collection(
    _admin: AdminUser,
    State(state): State<AppState>,
    Extension(family): Extension<Family>,
    AppJson(body): AppJson<CollectionRequest>,
) -> Result<Response, AppError> {
    let collection = state.mutations.create_collection(family, body).await?;
    Ok(respond(
        StatusCode::CREATED,
        format!("{} created successfully.", family.label()),
        Some(collection),
    ))
}

#[instrument(skip(state, _admin, body), fields(%family, %id))]
pub async fn update_collection(
    _admin: AdminUser,
    State(state): State<AppState>,
    Extension(family): Extension<Family>,
    Path(id): Path<String>,
    AppJson(body): AppJson<CollectionRequest>,
) -> Result<Response, AppError> {
    let id = collection_id(family, &id)?;
    let collection = state.mutations.update_collection(family, id, body).await?;
    Ok(respond(
        StatusCode::OK,
        format!("{} updated successfully.", family.label()),
        Some(collection),
    ))
}

#[instrument(skip(state, _admin), fields(%family, %id))]
pub async fn delete_collection(
    _admin: AdminUser,
    State(state): State<AppState>,
    Extension(family): Extension<Family>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = collection_id(family, &id)?;
    state.mutations.delete_collection(family, id).await?;
    Ok(respond::<()>(
        StatusCode::OK,
        format!("{} deleted successfully.", family.label()),
        None,
    ))
}
