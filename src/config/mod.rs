use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub telemetry: TelemetryConfig,
    pub geo: GeoConfig,
    pub redirect: RedirectConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Snapshot document path for the JSON backend
    pub path: String,
    /// Entry cap for the read cache in front of the backend
    pub cache_entries: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Collector URL; unset disables the remote sink
    pub endpoint: Option<String>,
    pub bearer: Option<String>,
    pub timeout_secs: u64,
    /// Local journal path; unset disables the journal
    pub journal_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoConfig {
    pub enabled: bool,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedirectConfig {
    /// Pause before answering a successful resolution, in milliseconds
    pub delay_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()?;

        let backend_str =
            std::env::var("STORAGE_BACKEND").unwrap_or_else(|_| "json".to_string());
        let backend = match backend_str.to_lowercase().as_str() {
            "memory" => StorageBackend::Memory,
            "json" => StorageBackend::Json,
            other => {
                tracing::warn!(
                    "Unknown STORAGE_BACKEND '{other}', falling back to 'json'. Supported values: memory, json"
                );
                StorageBackend::Json
            }
        };
        let storage_path = std::env::var("STORAGE_PATH")
            .unwrap_or_else(|_| "urlshort_urls.json".to_string());
        let cache_entries = std::env::var("STORAGE_CACHE_ENTRIES")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(10_000);

        let telemetry_endpoint = std::env::var("TELEMETRY_ENDPOINT").ok();
        let telemetry_bearer = std::env::var("TELEMETRY_TOKEN").ok();
        let telemetry_timeout_secs = std::env::var("TELEMETRY_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(5);
        let journal_path = match std::env::var("JOURNAL_PATH") {
            Ok(path) if path.is_empty() => None,
            Ok(path) => Some(path),
            Err(_) => Some("urlshort_logs.json".to_string()),
        };

        let geo_enabled = std::env::var("GEO_ENABLED")
            .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(true);
        let geo_timeout_secs = std::env::var("GEO_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(3);

        let redirect_delay_ms = std::env::var("REDIRECT_DELAY_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0);

        Ok(Config {
            server: ServerConfig { host, port },
            storage: StorageConfig {
                backend,
                path: storage_path,
                cache_entries,
            },
            telemetry: TelemetryConfig {
                endpoint: telemetry_endpoint,
                bearer: telemetry_bearer,
                timeout_secs: telemetry_timeout_secs,
                journal_path,
            },
            geo: GeoConfig {
                enabled: geo_enabled,
                timeout_secs: geo_timeout_secs,
            },
            redirect: RedirectConfig {
                delay_ms: redirect_delay_ms,
            },
        })
    }
}
