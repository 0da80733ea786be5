//! Index forecast sheet updater CLI.

use anyhow::Context;
use clap::{Parser, Subcommand};
use forecast_collector::{
    server::{self, AppState},
    DispatchOutcome, Dispatcher, ForecastScheduler, PipelineSettings, Trigger, UpdatePipeline,
};
use forecast_core::{init_logging, AppConfig, LogConfig, MarketId};
use forecast_data::{
    build_http_client, GoogleAuthorizer, GoogleSheetsClient, InvestingScraper, OpenAiConfig,
    OpenAiForecaster,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "forecast-collector")]
#[command(about = "Index forecast sheet updater", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// 설정 파일 경로 (없으면 기본값과 환경 변수만 사용)
    #[arg(long, default_value = "config/default.toml")]
    config: PathBuf,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// HTTP 트리거 서버와 스케줄 실행 (기본)
    Serve,

    /// 특정 시장 파이프라인 1회 실행
    Run {
        /// 시장 (hose, hnx, upcom)
        market: MarketId,
    },

    /// 지표 셀에 선택된 시장으로 1회 디스패치
    Dispatch,

    /// OAuth 동의 화면 URL 출력
    AuthUrl,

    /// 인증 코드를 교환하고 token.json 저장
    Authorize {
        /// 동의 화면에서 받은 인증 코드
        #[arg(long)]
        code: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = AppConfig::load(&cli.config).context("설정 로드 실패")?;

    let mut log_config = LogConfig::from_settings(&config.logging);
    if let Some(level) = cli.log_level {
        log_config.level = level;
    }
    init_logging(log_config).map_err(|e| anyhow::anyhow!("로깅 초기화 실패: {}", e))?;

    let http = build_http_client(&config.http).context("HTTP client 생성 실패")?;
    let authorizer = Arc::new(GoogleAuthorizer::new(config.auth.clone(), http.clone()));

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let dispatcher = build_dispatcher(&config, http, authorizer.clone())?;
            if !authorizer.has_stored_token() {
                warn_missing_token(&authorizer).await;
            }
            serve(&config, dispatcher).await?;
        }
        Commands::Run { market } => {
            let dispatcher = build_dispatcher(&config, http, authorizer)?;
            let result = dispatcher.run_market(market, Trigger::Cli).await?;
            println!("{} {} {}", result.market, result.forecast, result.signal);
        }
        Commands::Dispatch => {
            let dispatcher = build_dispatcher(&config, http, authorizer)?;
            match dispatcher.dispatch(Trigger::Cli).await? {
                DispatchOutcome::Ran(result) => {
                    println!("{} {} {}", result.market, result.forecast, result.signal);
                }
                DispatchOutcome::Noop { indicator } => {
                    println!("no-op (indicator: {:?})", indicator);
                }
            }
        }
        Commands::AuthUrl => {
            let url = authorizer.consent_url().await?;
            println!("{}", url);
        }
        Commands::Authorize { code } => {
            authorizer.exchange_code(&code).await?;
            info!(path = %config.auth.token_path, "Authorization complete");
        }
    }

    Ok(())
}

/// 설정으로 협력자를 구성하고 디스패처를 생성합니다.
fn build_dispatcher(
    config: &AppConfig,
    http: reqwest::Client,
    authorizer: Arc<GoogleAuthorizer>,
) -> anyhow::Result<Arc<Dispatcher>> {
    let scraper = InvestingScraper::new(http.clone(), &config.scraper.row_selector)?;

    let oracle = OpenAiConfig::new(
        config.oracle.resolve_api_key()?,
        config.oracle.model.clone(),
        config.oracle.base_url.clone(),
    );
    let forecaster = OpenAiForecaster::new(oracle, http.clone());

    let sheets = Arc::new(GoogleSheetsClient::new(
        http,
        config.sheet.api_base_url.clone(),
        config.sheet.spreadsheet_id.clone(),
        authorizer,
    ));

    let pipeline = UpdatePipeline::new(
        Arc::new(scraper),
        Arc::new(forecaster),
        sheets.clone(),
        PipelineSettings {
            source_base_url: config.scraper.base_url.clone(),
            sheet_name: config.sheet.sheet_name.clone(),
            unrecognized_reply: config.forecast.unrecognized_reply,
        },
    );

    Ok(Arc::new(Dispatcher::new(pipeline, sheets)))
}

async fn warn_missing_token(authorizer: &GoogleAuthorizer) {
    match authorizer.consent_url().await {
        Ok(url) => warn!(
            "저장된 토큰이 없습니다. 아래 URL에서 동의 후 `forecast-collector authorize --code <CODE>` 를 실행하세요: {}",
            url
        ),
        Err(e) => warn!("저장된 토큰이 없고 동의 URL도 만들 수 없습니다: {}", e),
    }
}

async fn serve(config: &AppConfig, dispatcher: Arc<Dispatcher>) -> anyhow::Result<()> {
    let shutdown_token = CancellationToken::new();

    if config.schedule.startup_dispatch {
        match dispatcher.dispatch(Trigger::Startup).await {
            Ok(DispatchOutcome::Ran(_)) => {}
            Ok(DispatchOutcome::Noop { indicator }) => {
                info!(indicator = %indicator, "Startup dispatch skipped");
            }
            Err(e) => error!(stage = e.stage(), "Startup dispatch failed: {}", e),
        }
    }

    let tz = config.schedule.tz()?;
    let scheduler = ForecastScheduler::start(dispatcher.clone(), &config.schedule, tz).await?;

    let listener = TcpListener::bind((config.server.host.as_str(), config.server.port))
        .await
        .with_context(|| {
            format!(
                "{}:{} 바인딩 실패",
                config.server.host, config.server.port
            )
        })?;

    tokio::spawn(shutdown_signal(shutdown_token.clone()));

    let state = Arc::new(AppState::new(dispatcher));
    server::serve(listener, state, shutdown_token).await?;

    scheduler.shutdown().await?;
    info!("Forecast collector 종료");
    Ok(())
}

/// Ctrl+C 또는 SIGTERM 을 기다린 뒤 종료 토큰을 취소합니다.
async fn shutdown_signal(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }

    shutdown_token.cancel();
}
