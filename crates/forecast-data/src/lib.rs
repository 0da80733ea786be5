//! # Forecast Data
//!
//! 업데이트 파이프라인이 사용하는 외부 서비스 구현.
//!
//! - `provider::investing` - 과거 데이터 페이지 스크래퍼 (`RowScraper`)
//! - `provider::openai` - Chat Completions 오라클 (`Forecaster`)
//! - `sheets` - Google Sheets 값 API 클라이언트 (`Spreadsheet`)
//! - `auth` - 저장된 사용자 토큰 기반 OAuth 인증

pub mod auth;
pub mod provider;
pub mod sheets;

pub use auth::{GoogleAuthorizer, StaticToken, TokenSource, TokenState};
pub use provider::investing::InvestingScraper;
pub use provider::openai::{OpenAiConfig, OpenAiForecaster};
pub use sheets::GoogleSheetsClient;

/// 공통 HTTP 클라이언트를 생성합니다.
pub fn build_http_client(
    settings: &forecast_core::HttpConfig,
) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(settings.timeout())
        .user_agent(settings.user_agent.clone())
        .build()
}
