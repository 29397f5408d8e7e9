pub mod artwork;
pub mod browse;

use axum::{
    http::{HeaderValue, Method},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;

use crate::state::{AppState, HealthResponse};

pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/stats", get(browse::get_stats))
        .route("/artists", get(browse::list_artists))
        .route("/artists/:name", get(browse::list_artist_albums))
        .route("/albums", get(browse::list_albums))
        .route("/albums/:title", get(browse::list_album_tracks))
        .route("/artwork", get(artwork::get_artwork))
        .with_state(state)
}

/// Adds `Access-Control-Allow-Origin` for `origin`. A blank or invalid
/// origin leaves the router unchanged.
pub fn with_cors(router: Router, origin: &str) -> Router {
    let origin = origin.trim();
    if origin.is_empty() {
        return router;
    }
    match HeaderValue::from_str(origin) {
        Ok(value) => router.layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::exact(value))
                .allow_methods([Method::GET]),
        ),
        Err(err) => {
            warn!("Ignoring invalid CORS origin {:?}: {}", origin, err);
            router
        }
    }
}

async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}
