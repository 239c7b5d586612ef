use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::RelayConfig;
use crate::envelope::iso_timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Query is required and must be a non-empty string")]
    EmptyQuery,
}

/// Why a forwarded analysis did not produce a JSON body.
///
/// `Display` is the raw detail text; clients only ever see
/// [`RelayError::public_message`] unless the server runs outside production.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("webhook request timed out: {0}")]
    Timeout(String),

    #[error("webhook unreachable: {0}")]
    Unavailable(String),

    #[error("webhook responded with status: {0}")]
    UpstreamStatus(u16),

    #[error("{0}")]
    Other(String),
}

impl RelayError {
    /// HTTP status the gateway answers with.
    pub fn status(&self) -> u16 {
        match self {
            RelayError::Timeout(_) => 408,
            RelayError::Unavailable(_) => 503,
            RelayError::UpstreamStatus(_) => 502,
            RelayError::Other(_) => 500,
        }
    }

    pub fn public_message(&self) -> &'static str {
        match self {
            RelayError::Timeout(_) => "Request timeout - the analysis is taking longer than expected",
            RelayError::Unavailable(_) => "Analysis service is currently unavailable",
            RelayError::UpstreamStatus(_) => "Analysis service returned an error",
            RelayError::Other(_) => "Failed to process analysis request",
        }
    }
}

// Order matters: a connect attempt that runs out of time is a timeout.
impl From<reqwest::Error> for RelayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RelayError::Timeout(err.to_string())
        } else if err.is_connect() {
            RelayError::Unavailable(err.to_string())
        } else if let Some(status) = err.status() {
            RelayError::UpstreamStatus(status.as_u16())
        } else {
            RelayError::Other(err.to_string())
        }
    }
}

/// Inbound `/api/analyze` body.
pub struct AnalysisRequest;

impl AnalysisRequest {
    /// Returns the trimmed query, or rejects the body before anything is sent upstream.
    pub fn validate(body: &Value) -> Result<String, ValidationError> {
        match body.get("query").and_then(Value::as_str).map(str::trim) {
            Some(q) if !q.is_empty() => Ok(q.to_string()),
            _ => Err(ValidationError::EmptyQuery),
        }
    }

    /// The query exactly as the client sent it, for echoing back in error envelopes.
    pub fn raw_query(body: &Value) -> String {
        body.get("query")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }
}

/// What the webhook receives.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    pub query: String,
    pub timestamp: String,
    pub source: String,
    pub user_agent: String,
}

/// Forwards queries to the analysis webhook. One POST per call, no retries.
#[derive(Clone)]
pub struct WebhookRelay {
    client: Client,
    config: RelayConfig,
}

impl WebhookRelay {
    pub fn new(config: RelayConfig) -> Result<Self, RelayError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RelayError::Other(format!("failed to build HTTP client: {e}")))?;

        info!("Relay ready. Webhook: {}", config.webhook_url);
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    pub fn payload(&self, query: &str, user_agent: Option<&str>) -> WebhookPayload {
        WebhookPayload {
            query: query.to_string(),
            timestamp: iso_timestamp(),
            source: self.config.source_tag.clone(),
            user_agent: user_agent
                .filter(|ua| !ua.is_empty())
                .unwrap_or("unknown")
                .to_string(),
        }
    }

    /// Sends an already validated query and returns the webhook's JSON body.
    ///
    /// The whole exchange, body included, is bounded by the configured timeout.
    pub async fn forward(&self, query: &str, user_agent: Option<&str>) -> Result<Value, RelayError> {
        let payload = self.payload(query, user_agent);
        info!(?payload, "Sending to analysis webhook");

        let outcome = tokio::time::timeout(self.config.timeout, self.round_trip(&payload))
            .await
            .unwrap_or_else(|_| {
                Err(RelayError::Timeout(format!(
                    "no response within {} ms",
                    self.config.timeout.as_millis()
                )))
            });

        match &outcome {
            Ok(result) => info!(%result, "Analysis webhook response"),
            Err(e @ RelayError::UpstreamStatus(_)) => warn!(error = %e, "Analysis webhook rejected request"),
            Err(e) => error!(error = %e, "Error calling analysis webhook"),
        }
        outcome
    }

    async fn round_trip(&self, payload: &WebhookPayload) -> Result<Value, RelayError> {
        let response = self
            .client
            .post(self.config.webhook_url.clone())
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::UpstreamStatus(status.as_u16()));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| match RelayError::from(e) {
                RelayError::Other(msg) => RelayError::Other(format!("invalid JSON from webhook: {msg}")),
                other => other,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn relay() -> WebhookRelay {
        let url = reqwest::Url::parse("http://127.0.0.1:9/hook").unwrap();
        WebhookRelay::new(RelayConfig::new(url)).unwrap()
    }

    #[test]
    fn validate_trims_query() {
        assert_eq!(
            AnalysisRequest::validate(&json!({"query": "  NVDA outlook \n"})),
            Ok("NVDA outlook".to_string())
        );
    }

    #[test]
    fn validate_rejects_bad_bodies() {
        for body in [
            json!({}),
            json!({"query": ""}),
            json!({"query": "   \t"}),
            json!({"query": 42}),
            json!({"query": null}),
            json!({"query": ["AAPL"]}),
            json!("AAPL"),
            Value::Null,
        ] {
            assert_eq!(
                AnalysisRequest::validate(&body),
                Err(ValidationError::EmptyQuery),
                "{body}"
            );
        }
    }

    #[test]
    fn raw_query_is_untrimmed_or_empty() {
        assert_eq!(AnalysisRequest::raw_query(&json!({"query": " tsla "})), " tsla ");
        assert_eq!(AnalysisRequest::raw_query(&json!({"query": 7})), "");
        assert_eq!(AnalysisRequest::raw_query(&Value::Null), "");
    }

    #[test]
    fn error_table() {
        let cases = [
            (RelayError::Timeout("t".into()), 408, "Request timeout - the analysis is taking longer than expected"),
            (RelayError::Unavailable("c".into()), 503, "Analysis service is currently unavailable"),
            (RelayError::UpstreamStatus(404), 502, "Analysis service returned an error"),
            (RelayError::Other("x".into()), 500, "Failed to process analysis request"),
        ];
        for (err, status, message) in cases {
            assert_eq!(err.status(), status);
            assert_eq!(err.public_message(), message);
        }
    }

    #[test]
    fn payload_fields() {
        let payload = relay().payload("AAPL", None);
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["query"], json!("AAPL"));
        assert_eq!(value["source"], json!("stockart-ui"));
        assert_eq!(value["userAgent"], json!("unknown"));
        assert!(value["timestamp"].as_str().unwrap().ends_with('Z'));

        let payload = relay().payload("AAPL", Some("Mozilla/5.0"));
        assert_eq!(payload.user_agent, "Mozilla/5.0");
    }
}
