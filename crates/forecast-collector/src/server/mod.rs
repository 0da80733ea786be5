//! HTTP 서버.

pub mod routes;

use axum::{routing::get, Router};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::dispatcher::Dispatcher;

/// 핸들러 공유 상태.
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher,
            started_at: Utc::now(),
        }
    }
}

/// 라우터 생성.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/hose", get(routes::run_hose))
        .route("/hnx", get(routes::run_hnx))
        .route("/upcom", get(routes::run_upcom))
        .route("/health", get(routes::health_check))
        .route("/status", get(routes::status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 종료 토큰이 취소될 때까지 요청을 처리합니다.
pub async fn serve(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("HTTP server listening on http://{}", addr);
    }

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}
