//! 시장별 업데이트 파이프라인.
//!
//! 한 번의 실행 순서:
//! 1. 과거 데이터 페이지에서 행 텍스트 수집 (헤더 + 22행 이상)
//! 2. 1..=22 행을 시장 스키마로 파싱
//! 3. 전체 레코드를 하나의 페이로드로 묶어 예측 요청
//! 4. 응답에서 판정과 매매 신호 결정
//! 5. 레코드, 예측, 신호를 한 번의 일괄 쓰기로 기록
//!
//! 어느 단계든 실패하면 시트에는 아무것도 쓰지 않습니다.

use chrono::{DateTime, Utc};
use forecast_core::{
    format_payload, parse_rows, qualified_range, resolve_signal, ForecastVerdict, Forecaster,
    MarketId, PriceRecord, RangeWrite, RowScraper, ScrapeError, Spreadsheet, TradeSignal,
    UnrecognizedReplyPolicy, FORECAST_INSTRUCTION,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, Instrument};

use crate::error::{PipelineError, Result};

/// 한 번의 실행에서 기록하는 레코드 수.
pub const ROWS_PER_RUN: usize = 22;

/// 파이프라인 설정.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// 원천 사이트 기본 URL
    pub source_base_url: String,
    /// 데이터 시트 이름
    pub sheet_name: String,
    pub unrecognized_reply: UnrecognizedReplyPolicy,
}

/// 파이프라인 실행 결과.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    pub market: MarketId,
    /// 기록한 레코드 수
    pub records: usize,
    /// 예측 셀에 기록한 텍스트
    pub forecast: String,
    /// 해석된 판정 (정책으로 대체된 경우 None)
    pub verdict: Option<ForecastVerdict>,
    pub signal: TradeSignal,
    #[serde(skip)]
    pub elapsed: Duration,
    pub finished_at: DateTime<Utc>,
}

/// 시장 프로파일 기반 단일 파이프라인.
pub struct UpdatePipeline {
    scraper: Arc<dyn RowScraper>,
    forecaster: Arc<dyn Forecaster>,
    sheet: Arc<dyn Spreadsheet>,
    settings: PipelineSettings,
}

impl UpdatePipeline {
    pub fn new(
        scraper: Arc<dyn RowScraper>,
        forecaster: Arc<dyn Forecaster>,
        sheet: Arc<dyn Spreadsheet>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            scraper,
            forecaster,
            sheet,
            settings,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// 시장 하나에 대해 파이프라인을 실행합니다.
    ///
    /// # Errors
    ///
    /// - `PipelineError::Scrape`: 페이지 로드 실패 또는 행 부족
    /// - `PipelineError::MalformedRow`: 행 파싱 실패
    /// - `PipelineError::Forecast`: 예측 요청 실패 또는 응답 거부
    /// - `PipelineError::Sheet`: 결과 쓰기 실패
    pub async fn run(&self, market: MarketId) -> Result<PipelineResult> {
        self.run_inner(market)
            .instrument(forecast_core::market_span!("pipeline", market))
            .await
    }

    async fn run_inner(&self, market: MarketId) -> Result<PipelineResult> {
        let started = Instant::now();
        let profile = market.profile();
        let url = profile.source_url(&self.settings.source_base_url);

        info!(%url, "Pipeline started");

        // 1. 행 수집 (첫 행은 헤더)
        let rows = self.scraper.fetch_rows(&url).await?;
        if rows.len() <= ROWS_PER_RUN {
            return Err(ScrapeError::MissingRows {
                expected: ROWS_PER_RUN + 1,
                found: rows.len(),
            }
            .into());
        }

        // 2. 파싱
        let records = parse_rows(&rows[1..=ROWS_PER_RUN], &profile.schema).map_err(
            |(idx, source)| PipelineError::MalformedRow {
                row: idx + 1,
                source,
            },
        )?;
        debug!(records = records.len(), "Rows parsed");

        // 3. 예측 요청
        let payload = format_payload(&records);
        let reply = self
            .forecaster
            .complete(FORECAST_INSTRUCTION, &payload)
            .await?;

        // 4. 신호 결정
        let (verdict, signal) = resolve_signal(&reply, self.settings.unrecognized_reply)?;
        let forecast = verdict
            .map(|v| v.to_string())
            .unwrap_or_else(|| reply.trim().to_string());
        info!(reply = %reply.trim(), forecast = %forecast, signal = %signal, "Forecast resolved");

        // 5. 일괄 쓰기
        let sheet_name = &self.settings.sheet_name;
        let layout = &profile.layout;
        let writes = vec![
            RangeWrite::new(
                qualified_range(sheet_name, layout.rows_range),
                records.iter().map(PriceRecord::to_cells).collect(),
            ),
            RangeWrite::single(qualified_range(sheet_name, layout.forecast_cell), forecast.clone()),
            RangeWrite::single(
                qualified_range(sheet_name, layout.signal_cell),
                signal.to_string(),
            ),
        ];
        self.sheet.batch_write(writes).await?;

        let result = PipelineResult {
            market,
            records: records.len(),
            forecast,
            verdict,
            signal,
            elapsed: started.elapsed(),
            finished_at: Utc::now(),
        };
        info!(
            records = result.records,
            elapsed = format!("{:.1}s", result.elapsed.as_secs_f64()),
            "Pipeline completed"
        );
        Ok(result)
    }
}
