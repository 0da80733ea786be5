use async_trait::async_trait;
use forecast_core::{CellValue, RangeWrite, SheetError, Spreadsheet};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error};

use crate::auth::TokenSource;

/// 값 입력 모드. RAW 는 문자열을 수식이나 날짜로 해석하지 않습니다.
const VALUE_INPUT_OPTION: &str = "RAW";

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValueRangeBody<'a> {
    range: &'a str,
    major_dimension: &'static str,
    values: &'a [Vec<CellValue>],
}

impl<'a> ValueRangeBody<'a> {
    fn rows(range: &'a str, values: &'a [Vec<CellValue>]) -> Self {
        Self {
            range,
            major_dimension: "ROWS",
            values,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchUpdateBody<'a> {
    value_input_option: &'static str,
    data: Vec<ValueRangeBody<'a>>,
}

/// Google Sheets 클라이언트.
pub struct GoogleSheetsClient {
    client: Client,
    base_url: String,
    spreadsheet_id: String,
    tokens: Arc<dyn TokenSource>,
}

impl GoogleSheetsClient {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        spreadsheet_id: impl Into<String>,
        tokens: Arc<dyn TokenSource>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            spreadsheet_id: spreadsheet_id.into(),
            tokens,
        }
    }

    /// `{base}/v4/spreadsheets/{id}/{segment}` URL. 범위는 경로 세그먼트로 인코딩됩니다.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, String> {
        let mut url = Url::parse(&self.base_url).map_err(|e| e.to_string())?;
        url.path_segments_mut()
            .map_err(|_| format!("잘못된 base_url: {}", self.base_url))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.spreadsheet_id.as_str()])
            .extend(segments);
        Ok(url)
    }

    async fn auth_header(&self) -> Result<String, SheetError> {
        Ok(self.tokens.access_token().await?.auth_header())
    }
}

/// 비성공 응답의 상태와 본문을 에러 메시지로 만듭니다.
async fn failure_message(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    format!("{} - {}", status, body)
}

fn cell_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait]
impl Spreadsheet for GoogleSheetsClient {
    async fn read_cell(&self, range: &str) -> Result<String, SheetError> {
        let read_error = |message: String| SheetError::Read {
            range: range.to_string(),
            message,
        };

        let url = self.endpoint(&["values", range]).map_err(read_error)?;
        let auth = self.auth_header().await?;

        let response = self
            .client
            .get(url)
            .header("Authorization", auth)
            .send()
            .await
            .map_err(|e| read_error(e.to_string()))?;

        if !response.status().is_success() {
            let message = failure_message(response).await;
            error!(range, %message, "Sheet read failed");
            return Err(read_error(message));
        }

        let body: ValueRange = response
            .json()
            .await
            .map_err(|e| read_error(e.to_string()))?;

        let value = body
            .values
            .into_iter()
            .next()
            .and_then(|row| row.into_iter().next())
            .map(cell_to_string)
            .unwrap_or_default();

        debug!(range, value = %value, "Sheet cell read");
        Ok(value)
    }

    async fn write_range(
        &self,
        range: &str,
        values: Vec<Vec<CellValue>>,
    ) -> Result<(), SheetError> {
        let write_error = |message: String| SheetError::Write {
            range: range.to_string(),
            message,
        };

        let mut url = self.endpoint(&["values", range]).map_err(write_error)?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", VALUE_INPUT_OPTION);
        let auth = self.auth_header().await?;

        let response = self
            .client
            .put(url)
            .header("Authorization", auth)
            .json(&ValueRangeBody::rows(range, &values))
            .send()
            .await
            .map_err(|e| write_error(e.to_string()))?;

        if !response.status().is_success() {
            let message = failure_message(response).await;
            error!(range, %message, "Sheet write failed");
            return Err(write_error(message));
        }

        debug!(range, rows = values.len(), "Sheet range written");
        Ok(())
    }

    /// 모든 범위를 단일 `values:batchUpdate` 요청으로 씁니다.
    async fn batch_write(&self, writes: Vec<RangeWrite>) -> Result<(), SheetError> {
        let ranges = writes
            .iter()
            .map(|w| w.range.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let write_error = |message: String| SheetError::Write {
            range: ranges.clone(),
            message,
        };

        let url = self.endpoint(&["values:batchUpdate"]).map_err(write_error)?;
        let auth = self.auth_header().await?;
        let body = BatchUpdateBody {
            value_input_option: VALUE_INPUT_OPTION,
            data: writes
                .iter()
                .map(|w| ValueRangeBody::rows(&w.range, &w.values))
                .collect(),
        };

        let response = self
            .client
            .post(url)
            .header("Authorization", auth)
            .json(&body)
            .send()
            .await
            .map_err(|e| write_error(e.to_string()))?;

        if !response.status().is_success() {
            let message = failure_message(response).await;
            error!(ranges = %ranges, %message, "Sheet batch update failed");
            return Err(write_error(message));
        }

        debug!(ranges = %ranges, "Sheet batch update applied");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticToken;
    use forecast_core::AuthError;
    use mockito::Matcher;
    use serde_json::json;

    fn client(base_url: String) -> GoogleSheetsClient {
        GoogleSheetsClient::new(
            Client::new(),
            base_url,
            "sheet-id",
            Arc::new(StaticToken::bearer("ya29.test")),
        )
    }

    #[tokio::test]
    async fn test_read_cell() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v4/spreadsheets/sheet-id/values/DataChungKhoan!A1")
            .match_header("authorization", "Bearer ya29.test")
            .with_status(200)
            .with_body(r#"{"range":"DataChungKhoan!A1","majorDimension":"ROWS","values":[["HNX"]]}"#)
            .create_async()
            .await;

        let value = client(server.url()).read_cell("DataChungKhoan!A1").await.unwrap();
        assert_eq!(value, "HNX");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_read_empty_cell() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/v4/spreadsheets/sheet-id/values/DataChungKhoan!A1")
            .with_status(200)
            .with_body(r#"{"range":"DataChungKhoan!A1","majorDimension":"ROWS"}"#)
            .create_async()
            .await;

        let value = client(server.url()).read_cell("DataChungKhoan!A1").await.unwrap();
        assert_eq!(value, "");
    }

    #[tokio::test]
    async fn test_read_failure() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/v4/spreadsheets/sheet-id/values/DataChungKhoan!A1")
            .with_status(403)
            .with_body(r#"{"error":{"code":403,"message":"The caller does not have permission"}}"#)
            .create_async()
            .await;

        let err = client(server.url()).read_cell("DataChungKhoan!A1").await.unwrap_err();
        assert!(matches!(err, SheetError::Read { ref message, .. } if message.contains("permission")));
    }

    #[tokio::test]
    async fn test_write_range_uses_raw_input() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/v4/spreadsheets/sheet-id/values/DataChungKhoan!I23")
            .match_query(Matcher::UrlEncoded("valueInputOption".into(), "RAW".into()))
            .match_body(Matcher::Json(json!({
                "range": "DataChungKhoan!I23",
                "majorDimension": "ROWS",
                "values": [["Sell"]]
            })))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        client(server.url())
            .write_range("DataChungKhoan!I23", vec![vec![CellValue::text("Sell")]])
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_batch_write_is_single_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v4/spreadsheets/sheet-id/values:batchUpdate")
            .match_body(Matcher::PartialJson(json!({
                "valueInputOption": "RAW",
                "data": [
                    {"range": "DataChungKhoan!I22", "values": [["Increase"]]},
                    {"range": "DataChungKhoan!I23", "values": [["Sell"]]}
                ]
            })))
            .with_status(200)
            .with_body("{}")
            .expect(1)
            .create_async()
            .await;

        client(server.url())
            .batch_write(vec![
                RangeWrite::single("DataChungKhoan!I22", "Increase"),
                RangeWrite::single("DataChungKhoan!I23", "Sell"),
            ])
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_batch_write_failure_is_write_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v4/spreadsheets/sheet-id/values:batchUpdate")
            .with_status(500)
            .create_async()
            .await;

        let err = client(server.url())
            .batch_write(vec![RangeWrite::single("DataChungKhoan!I22", "Increase")])
            .await
            .unwrap_err();
        assert!(err.is_write());
    }

    struct FailingTokens;

    #[async_trait]
    impl TokenSource for FailingTokens {
        async fn access_token(&self) -> Result<crate::auth::TokenState, AuthError> {
            Err(AuthError::MissingToken("token.json".to_string()))
        }
    }

    #[tokio::test]
    async fn test_auth_failure_is_propagated() {
        let sheets = GoogleSheetsClient::new(
            Client::new(),
            "http://127.0.0.1:9",
            "sheet-id",
            Arc::new(FailingTokens),
        );
        let err = sheets.read_cell("DataChungKhoan!A1").await.unwrap_err();
        assert!(matches!(err, SheetError::Auth(AuthError::MissingToken(_))));
    }
}
