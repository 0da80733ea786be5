//! investing.com 과거 데이터 스크래퍼.
//!
//! 지수의 과거 데이터 페이지를 요청하고 행 마커 셀렉터에 일치하는 요소의
//! 텍스트(textContent)를 페이지 순서대로 반환합니다. 첫 행은 헤더 또는 당일 행입니다.
//!
//! ## 사용 예시
//! ```rust,ignore
//! let scraper = InvestingScraper::new(client, r#"[class="datatable_row__qHMpQ"]"#)?;
//! let rows = scraper.fetch_rows("https://vn.investing.com/indices/vn-historical-data").await?;
//! ```

use async_trait::async_trait;
use forecast_core::{RawRow, RowScraper, ScrapeError};
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, warn};

/// 과거 데이터 페이지 스크래퍼.
pub struct InvestingScraper {
    client: Client,
    row_selector: Selector,
}

impl InvestingScraper {
    /// 행 마커 CSS 셀렉터로 생성합니다.
    ///
    /// # Errors
    /// 셀렉터 문법이 잘못되면 `ScrapeError::Selector` 를 반환합니다.
    pub fn new(client: Client, row_selector: &str) -> Result<Self, ScrapeError> {
        let row_selector = Selector::parse(row_selector)
            .map_err(|e| ScrapeError::Selector(format!("{}: {}", row_selector, e)))?;
        Ok(Self {
            client,
            row_selector,
        })
    }

    /// HTML 문서에서 행 텍스트를 추출합니다.
    pub fn extract_rows(&self, html: &str) -> Vec<RawRow> {
        let document = Html::parse_document(html);
        document
            .select(&self.row_selector)
            .map(|row| row.text().collect::<String>())
            .collect()
    }
}

#[async_trait]
impl RowScraper for InvestingScraper {
    async fn fetch_rows(&self, url: &str) -> Result<Vec<RawRow>, ScrapeError> {
        debug!(url, "Fetching historical data page");

        let response = self
            .client
            .get(url)
            .header("Accept", "text/html,application/xhtml+xml")
            .header("Accept-Language", "vi-VN,vi;q=0.9,en;q=0.8")
            .send()
            .await
            .map_err(|e| ScrapeError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(url, status = status.as_u16(), "Historical data page returned error status");
            return Err(ScrapeError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let html = response
            .text()
            .await
            .map_err(|e| ScrapeError::Request(e.to_string()))?;

        let rows = self.extract_rows(&html);
        debug!(url, rows = rows.len(), "Extracted row elements");
        Ok(rows)
    }
}
