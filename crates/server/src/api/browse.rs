use axum::{
    extract::{Path as AxumPath, State},
    response::{IntoResponse, Response},
    Json,
};
use library::AlbumView;

use crate::state::AppState;
use crate::utils::not_found_response;

pub async fn list_artists(State(state): State<AppState>) -> Response {
    Json(state.catalog.artists()).into_response()
}

pub async fn list_albums(State(state): State<AppState>) -> Response {
    let catalog = &state.catalog;
    let albums: Vec<AlbumView<'_>> = catalog
        .albums()
        .iter()
        .map(|album| catalog.album_view(album))
        .collect();
    Json(albums).into_response()
}

pub async fn list_artist_albums(
    State(state): State<AppState>,
    AxumPath(name): AxumPath<String>,
) -> Response {
    let catalog = &state.catalog;
    match catalog.find_albums_by_artist(&name) {
        Ok(albums) => {
            let albums: Vec<AlbumView<'_>> = albums
                .into_iter()
                .map(|album| catalog.album_view(album))
                .collect();
            Json(albums).into_response()
        }
        Err(err) => not_found_response(err),
    }
}

pub async fn list_album_tracks(
    State(state): State<AppState>,
    AxumPath(title): AxumPath<String>,
) -> Response {
    match state.catalog.find_tracks_by_album(&title) {
        Ok(tracks) => Json(tracks).into_response(),
        Err(err) => not_found_response(err),
    }
}

pub async fn get_stats(State(state): State<AppState>) -> Response {
    Json(state.catalog.stats()).into_response()
}
