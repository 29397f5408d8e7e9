mod api;
mod config;
mod state;
mod utils;

use std::env;
use std::path::{Path, PathBuf};

use axum::Router;
use api::{api_router, with_cors};
use config::{
    config_path_from_env, load_or_create_config, resolve_music_root, resolve_path, ServerConfig,
};
use library::{load_or_scan, Catalog};
use state::AppState;
use tower_http::request_id::{MakeRequestUuid, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config_path = config_path_from_env();
    let (config, created) = load_or_create_config(&config_path)?;
    if created {
        info!("Created default config at {:?}", config_path);
    } else {
        info!("Loaded config from {:?}", config_path);
    }

    // A positional argument overrides the configured catalog file.
    let catalog_path = match env::args().nth(1) {
        Some(value) if !value.trim().is_empty() => PathBuf::from(value),
        _ => resolve_path(&config_path, &config.catalog_path),
    };

    let catalog = {
        let config = config.clone();
        let config_path = config_path.clone();
        tokio::task::spawn_blocking(move || open_catalog(&config_path, &config, &catalog_path))
            .await??
    };
    let stats = catalog.stats();
    info!(
        "Catalog ready: {} artists, {} albums, {} tracks",
        stats.artists, stats.albums, stats.tracks
    );

    let state = AppState::new(catalog);
    let app = Router::new().nest("/api", api_router(state));
    let app = with_cors(app, &config.cors_origin)
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http());

    let bind_addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Listening on {}", bind_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

fn open_catalog(
    config_path: &Path,
    config: &ServerConfig,
    catalog_path: &Path,
) -> Result<Catalog, Box<dyn std::error::Error + Send + Sync>> {
    match resolve_music_root(config_path, &config.music_root) {
        Some(music_root) => {
            let (catalog, _) = load_or_scan(&music_root, catalog_path, config.rescan_on_start)?;
            Ok(catalog)
        }
        None if catalog_path.exists() => Ok(Catalog::load(catalog_path)?),
        None => Err(format!(
            "no catalog at {:?} and music_root is not set in the config",
            catalog_path
        )
        .into()),
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = match signal(SignalKind::terminate()) {
            Ok(signal) => signal,
            Err(err) => {
                warn!("Failed to install terminate signal handler: {}", err);
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for ctrl-c: {}", err);
        }
    }

    info!("Shutdown signal received.");
}
