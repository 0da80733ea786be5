//! 실제 HTTP 협력자(스크래퍼, 오라클, 시트)를 mockito 서버에 연결한 통합 테스트.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use forecast_collector::{
    create_router, AppState, DispatchOutcome, Dispatcher, PipelineSettings, Trigger,
    UpdatePipeline,
};
use forecast_core::{MarketId, TradeSignal, UnrecognizedReplyPolicy, FORECAST_INSTRUCTION};
use forecast_data::{
    GoogleSheetsClient, InvestingScraper, OpenAiConfig, OpenAiForecaster, StaticToken,
};
use mockito::{Matcher, Mock, ServerGuard};
use secrecy::SecretString;
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;

const ROW_CLASS: &str = "datatable_row__qHMpQ";

/// 헤더 + 22행 HOSE 과거 데이터 페이지 (2024-01-22 .. 2024-01-01).
fn hose_history_page() -> String {
    let header = format!(
        r#"<tr class="{}"><th>Ngày</th><th>Mở</th><th>Cao</th><th>Thấp</th><th>Lần cuối</th><th>KL</th><th>% Thay đổi</th></tr>"#,
        ROW_CLASS
    );
    let rows: String = (1..=22)
        .rev()
        .map(|day| {
            format!(
                r#"<tr class="{}"><td><time>{:02}/01/2024</time></td><td>1,165.20</td><td>1,170.05</td><td>1,160.00</td><td>1,168.40</td><td>612.3K</td><td>+0.42%</td></tr>"#,
                ROW_CLASS, day
            )
        })
        .collect();
    format!(
        "<html><body><table><thead>{}</thead><tbody>{}</tbody></table></body></html>",
        header, rows
    )
}

fn build_dispatcher(server: &ServerGuard) -> Arc<Dispatcher> {
    let http = reqwest::Client::new();
    let scraper =
        InvestingScraper::new(http.clone(), &format!(r#"[class="{}"]"#, ROW_CLASS)).unwrap();
    let forecaster = OpenAiForecaster::new(
        OpenAiConfig::new(
            SecretString::new("sk-test".into()),
            "gpt-3.5-turbo",
            format!("{}/v1", server.url()),
        ),
        http.clone(),
    );
    let sheets = Arc::new(GoogleSheetsClient::new(
        http,
        server.url(),
        "sheet-id",
        Arc::new(StaticToken::bearer("ya29.test")),
    ));

    let pipeline = UpdatePipeline::new(
        Arc::new(scraper),
        Arc::new(forecaster),
        sheets.clone(),
        PipelineSettings {
            source_base_url: server.url(),
            sheet_name: "DataChungKhoan".to_string(),
            unrecognized_reply: UnrecognizedReplyPolicy::Reject,
        },
    );
    Arc::new(Dispatcher::new(pipeline, sheets))
}

async fn mock_history(server: &mut ServerGuard) -> Mock {
    server
        .mock("GET", "/indices/vn-historical-data")
        .with_status(200)
        .with_header("content-type", "text/html; charset=utf-8")
        .with_body(hose_history_page())
        .create_async()
        .await
}

async fn mock_oracle(server: &mut ServerGuard, reply: &str) -> Mock {
    server
        .mock("POST", "/v1/chat/completions")
        .match_header("authorization", "Bearer sk-test")
        .match_body(Matcher::PartialJson(json!({
            "messages": [{"role": "system", "content": FORECAST_INSTRUCTION}]
        })))
        .with_status(200)
        .with_body(
            json!({"choices": [{"message": {"role": "assistant", "content": reply}}]}).to_string(),
        )
        .expect(1)
        .create_async()
        .await
}

async fn mock_batch_update(server: &mut ServerGuard, forecast: &str, signal: &str) -> Mock {
    server
        .mock("POST", "/v4/spreadsheets/sheet-id/values:batchUpdate")
        .match_header("authorization", "Bearer ya29.test")
        .match_body(Matcher::PartialJson(json!({
            "valueInputOption": "RAW",
            "data": [
                {"range": "DataChungKhoan!A3:G"},
                {"range": "DataChungKhoan!I22", "values": [[forecast]]},
                {"range": "DataChungKhoan!I23", "values": [[signal]]}
            ]
        })))
        .with_status(200)
        .with_body("{}")
        .expect(1)
        .create_async()
        .await
}

#[tokio::test]
async fn test_hose_update_end_to_end() {
    let mut server = mockito::Server::new_async().await;
    let history = mock_history(&mut server).await;
    let oracle = mock_oracle(&mut server, "Increase").await;
    let batch = mock_batch_update(&mut server, "Increase", "Sell").await;

    let dispatcher = build_dispatcher(&server);
    let result = dispatcher
        .run_market(MarketId::Hose, Trigger::Cli)
        .await
        .unwrap();

    assert_eq!(result.records, 22);
    assert_eq!(result.forecast, "Increase");
    assert_eq!(result.signal, TradeSignal::Sell);

    history.assert_async().await;
    oracle.assert_async().await;
    batch.assert_async().await;
}

#[tokio::test]
async fn test_dispatch_reads_indicator_and_runs() {
    let mut server = mockito::Server::new_async().await;
    let indicator = server
        .mock("GET", "/v4/spreadsheets/sheet-id/values/DataChungKhoan!A1")
        .with_status(200)
        .with_body(r#"{"range":"DataChungKhoan!A1","majorDimension":"ROWS","values":[["HOSE"]]}"#)
        .create_async()
        .await;
    let _history = mock_history(&mut server).await;
    let _oracle = mock_oracle(&mut server, "Decrease").await;
    let batch = mock_batch_update(&mut server, "Decrease", "Buy").await;

    let dispatcher = build_dispatcher(&server);
    let outcome = dispatcher.dispatch(Trigger::Daily).await.unwrap();

    assert!(matches!(outcome, DispatchOutcome::Ran(ref r) if r.signal == TradeSignal::Buy));
    indicator.assert_async().await;
    batch.assert_async().await;

    // 같은 지표 값이면 폴링은 다시 실행하지 않음
    assert!(!dispatcher.poll().await.unwrap().ran());
}

#[tokio::test]
async fn test_route_reports_upstream_failure() {
    let mut server = mockito::Server::new_async().await;
    let _blocked = server
        .mock("GET", "/indices/hnx-historical-data")
        .with_status(403)
        .create_async()
        .await;
    let batch = server
        .mock("POST", "/v4/spreadsheets/sheet-id/values:batchUpdate")
        .expect(0)
        .create_async()
        .await;

    let router = create_router(Arc::new(AppState::new(build_dispatcher(&server))));
    let response = router
        .oneshot(Request::builder().uri("/hnx").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "error");
    assert_eq!(json["market"], "HNX");
    assert_eq!(json["stage"], "scrape");
    batch.assert_async().await;
}
