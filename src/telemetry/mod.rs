//! Structured telemetry events and their delivery.
//!
//! Events go three ways: a `tracing` line for operators, an append to the
//! local journal, and a fire-and-forget POST to the remote collector.
//! Delivery failures are absorbed here and never reach the operation that
//! produced the event.

pub mod http;
pub mod journal;

pub use http::HttpSink;
pub use journal::Journal;

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stack {
    Frontend,
    Backend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Fatal => "fatal",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Package {
    Api,
    Component,
    Hook,
    Page,
    State,
    Style,
    Auth,
    Config,
    Middleware,
    Utils,
}

/// One event for the remote collector. The closed `stack`/`level`/`package`
/// sets are enforced by the enums; the only runtime check left is the
/// non-empty message.
#[derive(Debug, Clone, Serialize)]
pub struct TelemetryEvent {
    pub stack: Stack,
    pub level: Level,
    pub package: Package,
    pub message: String,
}

#[derive(Debug, Error)]
#[error("telemetry message must be a non-empty string")]
pub struct EmptyMessage;

impl TelemetryEvent {
    pub fn new(
        stack: Stack,
        level: Level,
        package: Package,
        message: impl Into<String>,
    ) -> Result<Self, EmptyMessage> {
        let message = message.into();
        if message.trim().is_empty() {
            return Err(EmptyMessage);
        }
        Ok(Self {
            stack,
            level,
            package,
            message,
        })
    }
}

/// Result of one delivery attempt. There is no error variant to propagate:
/// a failed attempt is reported as data and otherwise ignored.
#[derive(Debug)]
pub enum Delivery {
    Accepted(serde_json::Value),
    Failed { message: String },
}

impl Delivery {
    pub fn is_failed(&self) -> bool {
        matches!(self, Delivery::Failed { .. })
    }
}

#[async_trait]
pub trait TelemetrySink: Send + Sync {
    async fn deliver(&self, event: &TelemetryEvent) -> Delivery;
}

/// Shared handle used by the submission and resolution paths.
#[derive(Clone, Default)]
pub struct Telemetry {
    sink: Option<Arc<dyn TelemetrySink>>,
    journal: Option<Arc<Journal>>,
}

impl Telemetry {
    pub fn new(sink: Option<Arc<dyn TelemetrySink>>, journal: Option<Arc<Journal>>) -> Self {
        Self { sink, journal }
    }

    /// A handle that records nothing, for callers that opt out.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn info(&self, package: Package, message: impl Into<String>) {
        self.emit(Level::Info, package, message.into());
    }

    pub fn warn(&self, package: Package, message: impl Into<String>) {
        self.emit(Level::Warn, package, message.into());
    }

    pub fn error(&self, package: Package, message: impl Into<String>) {
        self.emit(Level::Error, package, message.into());
    }

    fn emit(&self, level: Level, package: Package, message: String) {
        match level {
            Level::Debug => tracing::debug!(%message, "telemetry"),
            Level::Info => tracing::info!(%message, "telemetry"),
            Level::Warn => tracing::warn!(%message, "telemetry"),
            Level::Error | Level::Fatal => tracing::error!(%message, "telemetry"),
        }

        if let Some(journal) = &self.journal {
            journal.append(level, &message);
        }

        let event = match TelemetryEvent::new(Stack::Backend, level, package, message) {
            Ok(event) => event,
            Err(err) => {
                tracing::debug!("dropping telemetry event: {err}");
                return;
            }
        };

        if let Some(sink) = &self.sink {
            let sink = Arc::clone(sink);
            // Launched and forgotten: the operation being logged proceeds
            // whether or not the collector ever answers.
            tokio::spawn(async move {
                if let Delivery::Failed { message } = sink.deliver(&event).await {
                    tracing::debug!("telemetry delivery failed: {message}");
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_message_is_rejected_before_delivery() {
        assert!(TelemetryEvent::new(Stack::Backend, Level::Info, Package::Api, "").is_err());
        assert!(TelemetryEvent::new(Stack::Backend, Level::Info, Package::Api, "   ").is_err());
        assert!(TelemetryEvent::new(Stack::Backend, Level::Info, Package::Api, "ok").is_ok());
    }

    #[test]
    fn event_serializes_to_the_collector_shape() {
        let event = TelemetryEvent::new(
            Stack::Backend,
            Level::Warn,
            Package::Api,
            "redirection failed: shortcode promo expired",
        )
        .unwrap();

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["stack"], "backend");
        assert_eq!(json["level"], "warn");
        assert_eq!(json["package"], "api");
        assert_eq!(
            json["message"],
            "redirection failed: shortcode promo expired"
        );
    }
}
