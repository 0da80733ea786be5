//! 지수 예측 시트 업데이터.
//!
//! 이 crate는 업데이트 파이프라인과 이를 구동하는 트리거를 제공합니다:
//! - 시장별 업데이트 파이프라인 (스크랩 → 파싱 → 예측 → 시트 기록)
//! - 지표 셀 기반 디스패처와 폴링 상태
//! - 일일/폴링 cron 스케줄러
//! - HTTP 트리거 서버

pub mod dispatcher;
pub mod error;
pub mod pipeline;
pub mod scheduler;
pub mod server;
pub mod summary;

#[cfg(test)]
mod testing;

pub use dispatcher::{DispatchOutcome, Dispatcher, DispatcherStatus};
pub use error::{PipelineError, Result};
pub use pipeline::{PipelineResult, PipelineSettings, UpdatePipeline, ROWS_PER_RUN};
pub use scheduler::ForecastScheduler;
pub use server::{create_router, AppState};
pub use summary::{RunSummary, Trigger};
