//! Google Sheets 값 API.
//!
//! - `GET    /v4/spreadsheets/{id}/values/{range}` - 셀 읽기
//! - `PUT    /v4/spreadsheets/{id}/values/{range}?valueInputOption=RAW` - 범위 쓰기
//! - `POST   /v4/spreadsheets/{id}/values:batchUpdate` - 여러 범위 일괄 쓰기

mod client;

pub use client::GoogleSheetsClient;
