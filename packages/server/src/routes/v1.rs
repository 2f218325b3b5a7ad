use axum::{
    Extension, Router,
    routing::{get, post, put},
};

use crate::handlers;
use crate::models::Family;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/timelines", collection_routes(Family::Timeline))
        .nest("/programs", collection_routes(Family::Program))
}

/// One handler set serves both families; the family rides along as an
/// extension.
fn collection_routes(family: Family) -> Router<AppState> {
    let crud = Router::new()
        .route(
            "/",
            get(handlers::collection::list_collections)
                .post(handlers::collection::create_collection),
        )
        .route(
            "/{id}",
            get(handlers::collection::get_collection)
                .put(handlers::collection::update_collection)
                .delete(handlers::collection::delete_collection),
        );

    let entries = Router::new()
        .route("/{id}/entries", post(handlers::entry::add_entry))
        .route(
            "/{id}/entries/{entry_id}",
            put(handlers::entry::update_entry).delete(handlers::entry::delete_entry),
        )
        .layer(handlers::entry::upload_body_limit());

    crud.merge(entries).layer(Extension(family))
}
