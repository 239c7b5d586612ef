//! JSON envelopes returned to the browser for `/api/analyze`.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::config::AppMode;
use crate::relay::{RelayError, ValidationError};

/// Current UTC time in the `2024-01-01T12:00:00.000Z` form browsers produce.
pub fn iso_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Success envelope. `data` is the webhook's JSON body, untouched.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub success: bool,
    pub data: Value,
    pub query: String,
    pub timestamp: String,
}

impl AnalysisResult {
    pub fn new(data: Value, query: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            query: query.into(),
            timestamp: iso_timestamp(),
        }
    }
}

/// Failure envelope.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisError {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub query: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl AnalysisError {
    /// Envelope for a failed upstream call. `raw_query` is what the client sent.
    pub fn from_relay(err: &RelayError, raw_query: impl Into<String>, mode: AppMode) -> Self {
        Self {
            success: false,
            error: err.public_message().to_string(),
            message: None,
            query: raw_query.into(),
            timestamp: iso_timestamp(),
            details: mode.exposes_details().then(|| err.to_string()),
        }
    }

    /// Envelope for a body that could not be read at all (too large, aborted).
    pub fn unreadable_body(detail: impl Into<String>, mode: AppMode) -> Self {
        Self {
            success: false,
            error: "Request body could not be read".to_string(),
            message: None,
            query: String::new(),
            timestamp: iso_timestamp(),
            details: mode.exposes_details().then(|| detail.into()),
        }
    }

    /// Envelope for a request rejected before any upstream call.
    pub fn invalid_query(err: &ValidationError, raw_query: impl Into<String>) -> Self {
        Self {
            success: false,
            error: "Invalid query".to_string(),
            message: Some(err.to_string()),
            query: raw_query.into(),
            timestamp: iso_timestamp(),
            details: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn timestamp_is_rfc3339_millis_utc() {
        let ts = iso_timestamp();
        assert!(ts.ends_with('Z'), "{ts}");
        assert_eq!(ts.len(), "2024-01-01T12:00:00.000Z".len());
        assert!(DateTime::parse_from_rfc3339(&ts).is_ok());
    }

    #[test]
    fn success_envelope_passes_data_through() {
        let upstream = json!({"summary": "AAPL looks fine", "items": [1, 2, 3]});
        let value = serde_json::to_value(AnalysisResult::new(upstream.clone(), "aapl")).unwrap();
        assert_eq!(value["success"], json!(true));
        assert_eq!(value["data"], upstream);
        assert_eq!(value["query"], json!("aapl"));
    }

    #[test]
    fn details_follow_mode() {
        let err = RelayError::UpstreamStatus(500);

        let dev = serde_json::to_value(AnalysisError::from_relay(&err, " q ", AppMode::Development))
            .unwrap();
        assert_eq!(dev["error"], json!("Analysis service returned an error"));
        assert_eq!(dev["details"], json!("webhook responded with status: 500"));
        assert_eq!(dev["query"], json!(" q "));
        assert!(dev.get("message").is_none());

        let prod = serde_json::to_value(AnalysisError::from_relay(&err, "q", AppMode::Production))
            .unwrap();
        assert!(prod.get("details").is_none());
        assert_eq!(prod["success"], json!(false));
    }

    #[test]
    fn unreadable_body_has_empty_query() {
        let dev = serde_json::to_value(AnalysisError::unreadable_body(
            "length limit exceeded",
            AppMode::Development,
        ))
        .unwrap();
        assert_eq!(dev["success"], json!(false));
        assert_eq!(dev["query"], json!(""));
        assert_eq!(dev["details"], json!("length limit exceeded"));

        let prod = serde_json::to_value(AnalysisError::unreadable_body(
            "length limit exceeded",
            AppMode::Production,
        ))
        .unwrap();
        assert!(prod.get("details").is_none());
    }

    #[test]
    fn invalid_query_carries_fixed_message() {
        let value =
            serde_json::to_value(AnalysisError::invalid_query(&ValidationError::EmptyQuery, ""))
                .unwrap();
        assert_eq!(value["error"], json!("Invalid query"));
        assert_eq!(
            value["message"],
            json!("Query is required and must be a non-empty string")
        );
        assert!(value.get("details").is_none());
    }
}
