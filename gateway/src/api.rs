use serde::{Deserialize, Serialize};

// Input: `/api/stocks/search?q=...`
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: Option<String>,
}

// Output: liveness probe
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub service: &'static str,
}

// Output: last-resort 500 when a handler panics
#[derive(Debug, Serialize)]
pub struct BackstopError {
    pub error: &'static str,
    pub message: String,
}
