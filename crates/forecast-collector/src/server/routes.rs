//! HTTP 트리거 및 상태 endpoint.
//!
//! - `GET /hose`, `/hnx`, `/upcom` - 선택을 바꾸고 요청 안에서 파이프라인 실행
//! - `GET /health` - liveness
//! - `GET /status` - 현재 선택 및 마지막 실행 요약

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use forecast_core::MarketId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use super::AppState;
use crate::dispatcher::DispatcherStatus;
use crate::summary::Trigger;

/// 파이프라인 실패 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct FailureResponse {
    /// 항상 "error"
    pub status: String,
    pub market: MarketId,
    /// 실패한 단계
    pub stage: String,
    pub error: String,
}

/// 상태 응답.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub version: &'static str,
    pub uptime_secs: i64,
    #[serde(flatten)]
    pub dispatcher: DispatcherStatus,
}

/// GET /hose
pub async fn run_hose(State(state): State<Arc<AppState>>) -> Response {
    run_market(&state, MarketId::Hose).await
}

/// GET /hnx
pub async fn run_hnx(State(state): State<Arc<AppState>>) -> Response {
    run_market(&state, MarketId::Hnx).await
}

/// GET /upcom
pub async fn run_upcom(State(state): State<Arc<AppState>>) -> Response {
    run_market(&state, MarketId::Upcom).await
}

async fn run_market(state: &AppState, market: MarketId) -> Response {
    match state.dispatcher.run_market(market, Trigger::Http).await {
        Ok(_) => (StatusCode::OK, Json("success")).into_response(),
        Err(e) => {
            warn!(%market, stage = e.stage(), "HTTP trigger failed: {}", e);
            let body = FailureResponse {
                status: "error".to_string(),
                market,
                stage: e.stage().to_string(),
                error: e.to_string(),
            };
            (StatusCode::BAD_GATEWAY, Json(body)).into_response()
        }
    }
}

/// GET /health
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /status
pub async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: (Utc::now() - state.started_at).num_seconds(),
        dispatcher: state.dispatcher.status().await,
    })
}
