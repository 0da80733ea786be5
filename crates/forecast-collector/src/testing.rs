//! 단위 테스트용 인메모리 협력자.

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use forecast_core::{
    CellValue, ForecastError, Forecaster, MarketId, RangeWrite, RawRow, RowScraper, ScrapeError,
    SheetError, Spreadsheet,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// 헤더 + `count` 개의 행 (2024-01-22 부터 하루씩 과거로), 시장 스키마 폭에 맞춤.
pub fn market_page(market: MarketId, count: usize) -> Vec<RawRow> {
    let body = match market {
        MarketId::Hose => "1,165.201,170.051,160.001,168.40612.3K+0.42%",
        MarketId::Hnx => "230.15231.00229.40230.8845.6M-0.31%",
        MarketId::Upcom => "88.4589.1088.0088.9012.1M+0.51%",
    };
    let start = NaiveDate::from_ymd_opt(2024, 1, 22).unwrap();
    let mut rows = vec!["NgàyLần cuốiMởCaoThấpKLThay đổi %".to_string()];
    rows.extend((0..count).map(|i| {
        let date = start - Duration::days(i as i64);
        format!("{}{}", date.format("%d/%m/%Y"), body)
    }));
    rows
}

pub fn hose_page(count: usize) -> Vec<RawRow> {
    market_page(MarketId::Hose, count)
}

/// URL 경로별 페이지를 돌려주는 스크래퍼.
#[derive(Clone, Default)]
pub struct FakeScraper {
    pages: Vec<(String, Vec<RawRow>)>,
    rows: Vec<RawRow>,
    urls: Arc<Mutex<Vec<String>>>,
}

impl FakeScraper {
    pub fn with_rows(rows: Vec<RawRow>) -> Self {
        Self {
            rows,
            ..Default::default()
        }
    }

    /// 시장마다 스키마에 맞는 `count` 행 페이지.
    pub fn per_market(count: usize) -> Self {
        Self {
            pages: MarketId::ALL
                .iter()
                .map(|m| (m.profile().source_path.to_string(), market_page(*m, count)))
                .collect(),
            ..Default::default()
        }
    }

    pub fn requested_urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RowScraper for FakeScraper {
    async fn fetch_rows(&self, url: &str) -> Result<Vec<RawRow>, ScrapeError> {
        self.urls.lock().unwrap().push(url.to_string());
        let page = self
            .pages
            .iter()
            .find(|(path, _)| url.ends_with(path.as_str()))
            .map(|(_, rows)| rows.clone());
        Ok(page.unwrap_or_else(|| self.rows.clone()))
    }
}

#[derive(Clone, Default)]
pub struct FakeForecaster {
    reply: String,
    requests: Arc<Mutex<Vec<(String, String)>>>,
}

impl FakeForecaster {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            ..Default::default()
        }
    }

    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Forecaster for FakeForecaster {
    async fn complete(
        &self,
        system_instruction: &str,
        payload: &str,
    ) -> Result<String, ForecastError> {
        self.requests
            .lock()
            .unwrap()
            .push((system_instruction.to_string(), payload.to_string()));
        Ok(self.reply.clone())
    }
}

/// 지표 셀 값을 순서대로 돌려주고 쓰기를 기록하는 시트.
#[derive(Default)]
pub struct FakeSheet {
    indicators: Mutex<VecDeque<Result<String, SheetError>>>,
    last_indicator: Mutex<String>,
    writes: Mutex<Vec<RangeWrite>>,
    fail_writes: bool,
}

impl FakeSheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_writes() -> Self {
        Self {
            fail_writes: true,
            ..Default::default()
        }
    }

    /// 지표 셀이 고정 값을 갖는 시트.
    pub fn with_indicator(value: &str) -> Self {
        let sheet = Self::new();
        *sheet.last_indicator.lock().unwrap() = value.to_string();
        sheet
    }

    /// 읽을 때마다 다음 값을 돌려주는 시트. 소진되면 마지막 값을 유지합니다.
    pub fn with_indicator_sequence(values: &[&str]) -> Self {
        let sheet = Self::new();
        sheet
            .indicators
            .lock()
            .unwrap()
            .extend(values.iter().map(|v| Ok(v.to_string())));
        sheet
    }

    pub fn push_read_error(&self) {
        self.indicators.lock().unwrap().push_back(Err(SheetError::Read {
            range: "DataChungKhoan!A1".to_string(),
            message: "503 - backend error".to_string(),
        }));
    }

    pub fn push_indicator(&self, value: &str) {
        self.indicators
            .lock()
            .unwrap()
            .push_back(Ok(value.to_string()));
    }

    pub fn writes(&self) -> Vec<RangeWrite> {
        self.writes.lock().unwrap().clone()
    }

    /// 신호 셀에 기록된 값 순서.
    pub fn written_signals(&self) -> Vec<CellValue> {
        self.writes()
            .into_iter()
            .filter(|w| w.range.ends_with("!I23"))
            .map(|w| w.values[0][0].clone())
            .collect()
    }
}

#[async_trait]
impl Spreadsheet for FakeSheet {
    async fn read_cell(&self, _range: &str) -> Result<String, SheetError> {
        let next = self.indicators.lock().unwrap().pop_front();
        match next {
            Some(Ok(value)) => {
                *self.last_indicator.lock().unwrap() = value.clone();
                Ok(value)
            }
            Some(Err(e)) => Err(e),
            None => Ok(self.last_indicator.lock().unwrap().clone()),
        }
    }

    async fn write_range(
        &self,
        range: &str,
        values: Vec<Vec<CellValue>>,
    ) -> Result<(), SheetError> {
        if self.fail_writes {
            return Err(SheetError::Write {
                range: range.to_string(),
                message: "403 - forbidden".to_string(),
            });
        }
        self.writes
            .lock()
            .unwrap()
            .push(RangeWrite::new(range, values));
        Ok(())
    }
}
