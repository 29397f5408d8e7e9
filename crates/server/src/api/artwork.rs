use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Response,
};
use library::NotFound;
use tracing::warn;

use crate::state::{AppState, ArtworkQuery};
use crate::utils::{artwork_response, json_error_response, library_error_response, not_found_response};

/// Serves the embedded picture of a catalog track. Paths outside the catalog
/// are refused so the endpoint cannot read arbitrary files.
pub async fn get_artwork(
    State(state): State<AppState>,
    Query(query): Query<ArtworkQuery>,
) -> Response {
    let path = match state.catalog.track_by_path(&query.path) {
        Some(track) => track.path.clone(),
        None => return not_found_response(NotFound::Track(query.path)),
    };

    match tokio::task::spawn_blocking(move || library::artwork(&path)).await {
        Ok(Ok(artwork)) => artwork_response(artwork),
        Ok(Err(err)) => library_error_response(err),
        Err(err) => {
            warn!("Artwork task failed: {}", err);
            json_error_response(StatusCode::INTERNAL_SERVER_ERROR, "artwork task failed")
        }
    }
}
