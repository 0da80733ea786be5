//! 시장 디스패처.
//!
//! 모든 트리거(HTTP, 일일 cron, 폴링, 시작 시 1회)는 하나의 `Dispatcher` 를 공유합니다.
//!
//! - 현재 선택된 시장은 디스패처가 소유하는 단일 상태입니다 (`Mutex<Option<MarketId>>`).
//!   HTTP 강제 선택, 디스패치, 폴링이 모두 같은 상태를 갱신합니다.
//! - 파이프라인 실행은 단일 실행 락으로 직렬화되어 동시 트리거는 대기합니다.
//! - 폴링은 지표 값이 현재 선택과 다를 때만 실행합니다.

use forecast_core::{qualified_range, MarketId, SheetLayout, Spreadsheet};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, Instrument};

use crate::error::Result;
use crate::pipeline::{PipelineResult, UpdatePipeline};
use crate::summary::{RunSummary, Trigger};

/// 디스패치 결과.
#[derive(Debug, Clone)]
pub enum DispatchOutcome {
    /// 파이프라인 실행됨
    Ran(PipelineResult),
    /// 실행하지 않음 (지표 값이 시장이 아니거나 폴링 상태 변화 없음)
    Noop { indicator: String },
}

impl DispatchOutcome {
    pub fn ran(&self) -> bool {
        matches!(self, DispatchOutcome::Ran(_))
    }
}

/// `/status` 응답용 디스패처 상태.
#[derive(Debug, Clone, Serialize)]
pub struct DispatcherStatus {
    /// 현재 선택된 시장
    pub current: Option<MarketId>,
    pub last_run: Option<RunSummary>,
}

/// 시장 디스패처.
pub struct Dispatcher {
    pipeline: UpdatePipeline,
    sheet: Arc<dyn Spreadsheet>,
    indicator_range: String,
    current: Mutex<Option<MarketId>>,
    run_lock: Mutex<()>,
    last_run: RwLock<Option<RunSummary>>,
}

impl Dispatcher {
    pub fn new(pipeline: UpdatePipeline, sheet: Arc<dyn Spreadsheet>) -> Self {
        let indicator_range =
            qualified_range(&pipeline.settings().sheet_name, SheetLayout::DEFAULT.indicator_cell);
        Self {
            pipeline,
            sheet,
            indicator_range,
            current: Mutex::new(None),
            run_lock: Mutex::new(()),
            last_run: RwLock::new(None),
        }
    }

    /// 지표 셀을 읽고 시장으로 해석합니다.
    pub async fn read_indicator(&self) -> Result<(String, Option<MarketId>)> {
        let value = self.sheet.read_cell(&self.indicator_range).await?;
        let market = MarketId::from_indicator(&value);
        debug!(indicator = %value, market = ?market, "Indicator read");
        Ok((value, market))
    }

    /// 지표 셀에 선택된 시장의 파이프라인을 실행합니다.
    ///
    /// 지표 값이 `HOSE`, `HNX`, `UPCOM` 이 아니면 아무것도 하지 않습니다.
    /// 읽은 값이 현재 선택이 되므로 이어지는 폴링은 같은 값으로 다시 실행하지 않습니다.
    pub async fn dispatch(&self, trigger: Trigger) -> Result<DispatchOutcome> {
        let (indicator, market) = self.read_indicator().await?;
        *self.current.lock().await = market;
        match market {
            Some(market) => self.execute(market, trigger).await.map(DispatchOutcome::Ran),
            None => {
                info!(indicator = %indicator, trigger = %trigger, "Indicator is not a market, skipping");
                Ok(DispatchOutcome::Noop { indicator })
            }
        }
    }

    /// 선택을 강제로 바꾸고 해당 시장의 파이프라인을 실행합니다.
    ///
    /// 지표 셀이 다른 시장을 가리키면 다음 폴링이 지표의 시장으로 되돌립니다.
    pub async fn run_market(&self, market: MarketId, trigger: Trigger) -> Result<PipelineResult> {
        *self.current.lock().await = Some(market);
        self.execute(market, trigger).await
    }

    /// 지표 셀을 한 번 폴링합니다.
    ///
    /// 값이 현재 선택과 다를 때만 선택을 갱신하고 실행합니다. 읽기 실패 시
    /// 상태는 그대로 유지됩니다.
    pub async fn poll(&self) -> Result<DispatchOutcome> {
        let (indicator, market) = self.read_indicator().await?;

        {
            let mut current = self.current.lock().await;
            if *current == market {
                return Ok(DispatchOutcome::Noop { indicator });
            }
            info!(from = ?*current, to = ?market, "Indicator changed");
            *current = market;
        }

        match market {
            Some(market) => self
                .execute(market, Trigger::Poll)
                .await
                .map(DispatchOutcome::Ran),
            None => Ok(DispatchOutcome::Noop { indicator }),
        }
    }

    /// 현재 상태 스냅샷.
    pub async fn status(&self) -> DispatcherStatus {
        DispatcherStatus {
            current: *self.current.lock().await,
            last_run: self.last_run.read().await.clone(),
        }
    }

    async fn execute(&self, market: MarketId, trigger: Trigger) -> Result<PipelineResult> {
        let _guard = self.run_lock.lock().await;
        let started = Instant::now();

        let outcome = self
            .pipeline
            .run(market)
            .instrument(forecast_core::market_span!("dispatch", market, trigger))
            .await;

        let summary = match &outcome {
            Ok(result) => RunSummary::succeeded(trigger, result),
            Err(e) => RunSummary::failed(market, trigger, e, started.elapsed()),
        };
        summary.log_summary();
        *self.last_run.write().await = Some(summary);

        outcome
    }
}
