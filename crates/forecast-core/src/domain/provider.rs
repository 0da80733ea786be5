//! 외부 협력자 추상화.
//!
//! 업데이트 파이프라인은 세 외부 서비스에만 의존합니다:
//! - `RowScraper` - 과거 데이터 페이지에서 행 텍스트 추출
//! - `Forecaster` - 텍스트 완성 API (오라클)
//! - `Spreadsheet` - 셀 읽기 및 범위 쓰기

use async_trait::async_trait;

use super::{CellValue, RangeWrite, RawRow};
use crate::error::{ForecastError, ScrapeError, SheetError};

// =============================================================================
// RowScraper Trait
// =============================================================================

/// 과거 데이터 행 스크래퍼.
#[async_trait]
pub trait RowScraper: Send + Sync {
    /// 페이지를 로드하고 행 마커에 일치하는 모든 요소의 텍스트를 페이지 순서대로 반환합니다.
    ///
    /// # Errors
    ///
    /// - `ScrapeError::Request` / `ScrapeError::Status`: 페이지 로드 실패
    async fn fetch_rows(&self, url: &str) -> Result<Vec<RawRow>, ScrapeError>;
}

// =============================================================================
// Forecaster Trait
// =============================================================================

/// 텍스트 완성 오라클.
#[async_trait]
pub trait Forecaster: Send + Sync {
    /// 시스템 지시문과 페이로드로 단일 완성을 요청합니다. 스트리밍/재시도 없음.
    async fn complete(&self, system_instruction: &str, payload: &str)
        -> Result<String, ForecastError>;
}

// =============================================================================
// Spreadsheet Trait
// =============================================================================

/// 공유 스프레드시트.
///
/// 모든 범위는 시트 이름을 포함한 A1 표기이며, 쓰기는 대상 범위를 통째로 덮어씁니다.
#[async_trait]
pub trait Spreadsheet: Send + Sync {
    /// 단일 셀 값을 문자열로 읽습니다. 빈 셀은 빈 문자열입니다.
    async fn read_cell(&self, range: &str) -> Result<String, SheetError>;

    /// 범위에 값을 씁니다.
    async fn write_range(&self, range: &str, values: Vec<Vec<CellValue>>)
        -> Result<(), SheetError>;

    /// 여러 범위를 한 번에 씁니다.
    ///
    /// 기본 구현은 범위마다 `write_range` 를 순서대로 호출합니다.
    /// 일괄 API 를 제공하는 구현은 단일 요청으로 재정의해야 합니다.
    async fn batch_write(&self, writes: Vec<RangeWrite>) -> Result<(), SheetError> {
        for write in writes {
            self.write_range(&write.range, write.values).await?;
        }
        Ok(())
    }
}
