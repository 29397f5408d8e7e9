use std::path::PathBuf;
use std::sync::Arc;

use library::Catalog;
use serde::{Deserialize, Serialize};

/// Shared by every handler. The catalog is built before the listener starts
/// and only read afterwards, so it needs no lock.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
}

impl AppState {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog: Arc::new(catalog),
        }
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct ArtworkQuery {
    pub path: PathBuf,
}
