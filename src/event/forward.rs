use serde_json::{Value, json};

use super::EventBatch;
use crate::config::CapiConfig;

/// Outcome of the single forwarding attempt. There is no retry; either
/// variant is terminal for the request.
#[derive(Debug)]
pub enum ForwardError {
    /// The request never completed (DNS, connect, timeout).
    Request(String),
    /// The ingestion service answered with a non-2xx status; its payload
    /// is carried verbatim.
    Remote { status: u16, body: Value },
}

impl std::fmt::Display for ForwardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ForwardError::Request(msg) => write!(f, "{msg}"),
            ForwardError::Remote { status, body } => {
                write!(f, "Ingestion service returned {status}: {body}")
            }
        }
    }
}

pub struct Forwarder {
    client: reqwest::Client,
}

impl Forwarder {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build reqwest client"),
        }
    }

    /// Serialize the batch and issue one POST to the events endpoint.
    pub async fn send(&self, capi: &CapiConfig, batch: &EventBatch) -> Result<Value, ForwardError> {
        let url = format!(
            "{}/{}/events",
            capi.base_url.trim_end_matches('/'),
            capi.pixel_id
        );

        let mut query: Vec<(&str, &str)> = vec![("access_token", capi.access_token.as_str())];
        if let Some(code) = &capi.test_event_code {
            query.push(("test_event_code", code.as_str()));
        }

        let resp = self
            .client
            .post(&url)
            .query(&query)
            .json(batch)
            .send()
            .await
            .map_err(|e| ForwardError::Request(format!("Events request failed: {e}")))?;

        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        let body: Value =
            serde_json::from_str(&text).unwrap_or_else(|_| json!({ "error": text }));

        if status.is_success() {
            tracing::info!(status = status.as_u16(), "Event accepted");
            Ok(body)
        } else {
            Err(ForwardError::Remote {
                status: status.as_u16(),
                body,
            })
        }
    }
}

impl Default for Forwarder {
    fn default() -> Self {
        Self::new()
    }
}
