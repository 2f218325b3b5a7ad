use axum::extract::{DefaultBodyLimit, Extension, Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use tracing::instrument;
use uuid::Uuid;

use super::collection_id;
use crate::error::AppError;
use crate::extractors::auth::AdminUser;
use crate::extractors::entry_form::EntryInput;
use crate::models::Family;
use crate::models::shared::respond;
use crate::state::AppState;

pub fn upload_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(128 * 1024 * 1024) // 128 MB
}

/// Unparseable entry ids resolve to no entry, after the parent has been
/// checked, so the two not-found cases stay distinguishable.
fn entry_id(raw: &str) -> Uuid {
    Uuid::parse_str(raw).unwrap_or(Uuid::nil())
}

#[instrument(skip(state, _admin, input), fields(%family, %id))]
pub async fn add_entry(
    _admin: AdminUser,
    State(state): State<AppState>,
    Extension(family): Extension<Family>,
    Path(id): Path<String>,
    EntryInput(input): EntryInput,
) -> Result<Response, AppError> {
    let id = collection_id(family, &id)?;
    let collection = state.mutations.add_entry(family, id, input).await?;
    Ok(respond(
        StatusCode::CREATED,
        "Entry added successfully.",
        Some(collection),
    ))
}

#[instrument(skip_all, fields(%family, %id, entry_id = %entry_id_raw))]
pub async fn update_entry(
    _admin: AdminUser,
    State(state): State<AppState>,
    Extension(family): Extension<Family>,
    Path((id, entry_id_raw)): Path<(String, String)>,
    EntryInput(input): EntryInput,
) -> Result<Response, AppError> {
    let id = collection_id(family, &id)?;
    let collection = state
        .mutations
        .update_entry(family, id, entry_id(&entry_id_raw), input)
        .await?;
    Ok(respond(
        StatusCode::OK,
        "Entry updated successfully.",
        Some(collection),
    ))
}

#[instrument(skip_all, fields(%family, %id, entry_id = %entry_id_raw))]
pub async fn delete_entry(
    _admin: AdminUser,
    State(state): State<AppState>,
    Extension(family): Extension<Family>,
    Path((id, entry_id_raw)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let id = collection_id(family, &id)?;
    let collection = state
        .mutations
        .delete_entry(family, id, entry_id(&entry_id_raw))
        .await?;
    Ok(respond(
        StatusCode::OK,
        "Entry deleted successfully.",
        Some(collection),
    ))
}
