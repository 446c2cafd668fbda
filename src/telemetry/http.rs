use super::{Delivery, TelemetryEvent, TelemetrySink};
use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Remote collector sink: one POST with a JSON body per event.
pub struct HttpSink {
    client: reqwest::Client,
    endpoint: String,
    bearer: Option<String>,
}

impl HttpSink {
    pub fn new(
        endpoint: impl Into<String>,
        bearer: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            bearer,
        })
    }

    async fn post(&self, event: &TelemetryEvent) -> Result<serde_json::Value> {
        let mut request = self.client.post(&self.endpoint).json(event);
        if let Some(token) = &self.bearer {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?.error_for_status()?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl TelemetrySink for HttpSink {
    async fn deliver(&self, event: &TelemetryEvent) -> Delivery {
        match self.post(event).await {
            Ok(body) => Delivery::Accepted(body),
            Err(err) => Delivery::Failed {
                message: err.to_string(),
            },
        }
    }
}
