//! 실행 요약 구조체.

use chrono::{DateTime, Utc};
use forecast_core::{MarketId, TradeSignal};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::PipelineError;
use crate::pipeline::PipelineResult;

/// 파이프라인을 시작시킨 트리거.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trigger {
    /// `/hose`, `/hnx`, `/upcom` 요청
    Http,
    /// 일일 cron
    Daily,
    /// 지표 셀 폴링
    Poll,
    /// 서버 시작 시 1회
    Startup,
    /// CLI 명령
    Cli,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Trigger::Http => "http",
            Trigger::Daily => "daily",
            Trigger::Poll => "poll",
            Trigger::Startup => "startup",
            Trigger::Cli => "cli",
        };
        write!(f, "{}", name)
    }
}

/// 마지막 실행 요약 (`/status` 응답용).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub market: MarketId,
    pub trigger: Trigger,
    pub success: bool,
    /// 기록한 레코드 수 (실패 시 0)
    pub records: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecast: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal: Option<TradeSignal>,
    /// 실패한 단계 (scrape, parse, forecast, sheet_write, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_stage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub elapsed_ms: u64,
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    pub fn succeeded(trigger: Trigger, result: &PipelineResult) -> Self {
        Self {
            market: result.market,
            trigger,
            success: true,
            records: result.records,
            forecast: Some(result.forecast.clone()),
            signal: Some(result.signal),
            failed_stage: None,
            error: None,
            elapsed_ms: result.elapsed.as_millis() as u64,
            finished_at: result.finished_at,
        }
    }

    pub fn failed(
        market: MarketId,
        trigger: Trigger,
        error: &PipelineError,
        elapsed: std::time::Duration,
    ) -> Self {
        Self {
            market,
            trigger,
            success: false,
            records: 0,
            forecast: None,
            signal: None,
            failed_stage: Some(error.stage().to_string()),
            error: Some(error.to_string()),
            elapsed_ms: elapsed.as_millis() as u64,
            finished_at: Utc::now(),
        }
    }

    /// 요약 로그 출력
    pub fn log_summary(&self) {
        if self.success {
            tracing::info!(
                market = %self.market,
                trigger = %self.trigger,
                records = self.records,
                forecast = self.forecast.as_deref().unwrap_or_default(),
                signal = ?self.signal,
                elapsed = format!("{:.1}s", self.elapsed_ms as f64 / 1000.0),
                "업데이트 완료"
            );
        } else {
            tracing::error!(
                market = %self.market,
                trigger = %self.trigger,
                stage = self.failed_stage.as_deref().unwrap_or_default(),
                error = self.error.as_deref().unwrap_or_default(),
                elapsed = format!("{:.1}s", self.elapsed_ms as f64 / 1000.0),
                "업데이트 실패"
            );
        }
    }
}
