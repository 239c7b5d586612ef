//! StockArt core: configuration, the analysis webhook relay, response
//! envelopes and the demo stock catalog.
//!
//! Nothing here knows about HTTP servers; the gateway crate wires these
//! pieces into axum handlers.

pub mod config;
pub mod envelope;
pub mod relay;
pub mod stocks;

pub use config::{AppMode, ConfigError, RelayConfig, ServerConfig};
pub use envelope::{iso_timestamp, AnalysisError, AnalysisResult};
pub use relay::{AnalysisRequest, RelayError, ValidationError, WebhookPayload, WebhookRelay};
pub use stocks::Stock;
