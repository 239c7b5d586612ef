use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, Query, State},
    http::{header::USER_AGENT, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use tracing::{info, warn};

use stockart_core::{
    envelope::{iso_timestamp, AnalysisError, AnalysisResult},
    relay::AnalysisRequest,
    stocks::{self, Stock},
};

use crate::api::{HealthResponse, SearchParams};
use crate::AppState;

pub const SERVICE_NAME: &str = "StockArt Website";

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: iso_timestamp(),
        service: SERVICE_NAME,
    })
}

pub async fn search_stocks(Query(params): Query<SearchParams>) -> Json<Vec<Stock>> {
    let query = params.q.unwrap_or_default();
    Json(stocks::search(&query))
}

// The relay handler: validate, forward once, wrap whatever comes back.
// Body is taken as raw bytes so a malformed payload is a 400 like any other bad query.
pub async fn analyze(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let body = match body {
        Ok(bytes) => bytes,
        Err(rejection) => {
            warn!("Unreadable analysis request body: {}", rejection.body_text());
            return (
                rejection.status(),
                Json(AnalysisError::unreadable_body(
                    rejection.body_text(),
                    state.mode,
                )),
            )
                .into_response();
        }
    };

    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let raw_query = AnalysisRequest::raw_query(&body);

    let query = match AnalysisRequest::validate(&body) {
        Ok(q) => q,
        Err(e) => {
            warn!("Rejected analysis request: {}", e);
            return (
                StatusCode::BAD_REQUEST,
                Json(AnalysisError::invalid_query(&e, raw_query)),
            )
                .into_response();
        }
    };

    let user_agent = headers.get(USER_AGENT).and_then(|v| v.to_str().ok());
    info!("Analysis requested: {}", query);

    match state.relay.forward(&query, user_agent).await {
        Ok(data) => Json(AnalysisResult::new(data, query)).into_response(),
        Err(e) => {
            let status =
                StatusCode::from_u16(e.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (
                status,
                Json(AnalysisError::from_relay(&e, raw_query, state.mode)),
            )
                .into_response()
        }
    }
}
