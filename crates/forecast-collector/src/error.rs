//! 파이프라인 에러 타입 정의.

use forecast_core::{ForecastError, MalformedRowError, ScrapeError, SheetError};
use thiserror::Error;

/// 업데이트 파이프라인 및 디스패처 에러.
#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    /// 페이지 로드 실패 또는 행 부족
    #[error(transparent)]
    Scrape(#[from] ScrapeError),

    /// 행 파싱 실패 (시트에 아무것도 쓰지 않음)
    #[error("{row}번째 행 파싱 실패: {source}")]
    MalformedRow {
        row: usize,
        #[source]
        source: MalformedRowError,
    },

    /// 예측 요청 또는 응답 해석 실패
    #[error(transparent)]
    Forecast(#[from] ForecastError),

    /// 지표 셀 읽기 또는 결과 쓰기 실패
    #[error(transparent)]
    Sheet(#[from] SheetError),
}

impl PipelineError {
    /// 로그 및 응답에 사용하는 짧은 단계 이름.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Scrape(_) => "scrape",
            Self::MalformedRow { .. } => "parse",
            Self::Forecast(_) => "forecast",
            Self::Sheet(e) if e.is_write() => "sheet_write",
            Self::Sheet(_) => "sheet_read",
        }
    }
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, PipelineError>;
