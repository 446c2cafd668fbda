use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use urlshort::analytics::GeoClient;
use urlshort::config::{Config, StorageBackend};
use urlshort::resolve::Resolver;
use urlshort::storage::{CachedStore, JsonFileStore, LinkStore, MemoryStore};
use urlshort::telemetry::{HttpSink, Journal, Telemetry, TelemetrySink};
use urlshort::{api, redirect};

#[derive(Parser)]
#[command(name = "urlshort", about = "Short link service")]
struct Args {
    /// Bind host, overrides HOST
    #[arg(long)]
    host: Option<String>,

    /// Bind port, overrides PORT
    #[arg(long)]
    port: Option<u16>,

    /// Snapshot file for the JSON backend, overrides STORAGE_PATH
    #[arg(long)]
    data_file: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut config = Config::from_env()?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(data_file) = args.data_file {
        config.storage.path = data_file;
    }
    info!("Loaded configuration");

    // Storage: chosen backend behind a shared read cache
    let inner: Arc<dyn LinkStore> = match config.storage.backend {
        StorageBackend::Memory => {
            info!("Using in-memory storage");
            Arc::new(MemoryStore::new())
        }
        StorageBackend::Json => {
            info!("Using JSON snapshot storage: {}", config.storage.path);
            Arc::new(JsonFileStore::new(&config.storage.path))
        }
    };
    let store: Arc<dyn LinkStore> =
        Arc::new(CachedStore::new(inner, config.storage.cache_entries));
    store.init().await?;
    info!("Storage initialized");

    // Telemetry: remote collector plus local journal, both optional
    let sink: Option<Arc<dyn TelemetrySink>> = match &config.telemetry.endpoint {
        Some(endpoint) => {
            info!("Telemetry collector: {endpoint}");
            Some(Arc::new(HttpSink::new(
                endpoint.clone(),
                config.telemetry.bearer.clone(),
                Duration::from_secs(config.telemetry.timeout_secs),
            )?))
        }
        None => {
            info!("Telemetry collector disabled");
            None
        }
    };
    let journal = config
        .telemetry
        .journal_path
        .as_ref()
        .map(|path| Arc::new(Journal::new(path)));
    let telemetry = Telemetry::new(sink, journal);

    // Geolocation enrichment, best effort
    let geo = if config.geo.enabled {
        Some(Arc::new(GeoClient::new(Duration::from_secs(
            config.geo.timeout_secs,
        ))?))
    } else {
        info!("Geolocation enrichment disabled");
        None
    };

    let resolver = Resolver::new(Arc::clone(&store), geo, telemetry.clone());

    let app = api::create_api_router(Arc::clone(&store), telemetry)
        .merge(redirect::create_redirect_router(
            resolver,
            Duration::from_millis(config.redirect.delay_ms),
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("🚀 Listening on http://{addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
