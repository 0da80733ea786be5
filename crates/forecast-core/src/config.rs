//! 설정 관리.
//!
//! 기본값 → `config/default.toml` (선택) → `FORECAST__` 접두사 환경 변수 순으로 병합합니다.
//! 예: `FORECAST__SHEET__SPREADSHEET_ID`, `FORECAST__SERVER__PORT`.

use chrono_tz::Tz;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::domain::UnrecognizedReplyPolicy;
use crate::error::ConfigError;

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP 트리거 서버 설정
    pub server: ServerConfig,
    /// 공유 스프레드시트 설정
    pub sheet: SheetConfig,
    /// 예측 오라클 설정
    pub oracle: OracleConfig,
    /// 과거 데이터 스크래퍼 설정
    pub scraper: ScraperConfig,
    /// 자격증명 설정
    pub auth: AuthConfig,
    /// 스케줄 설정
    pub schedule: ScheduleConfig,
    /// 예측 응답 처리 설정
    pub forecast: ForecastConfig,
    /// 로깅 설정
    pub logging: LoggingConfig,
    /// 외부 HTTP 호출 공통 설정
    pub http: HttpConfig,
}

/// 서버 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 바인딩할 호스트
    pub host: String,
    /// 리스닝할 포트
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

/// 스프레드시트 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SheetConfig {
    /// 스프레드시트 ID (필수)
    pub spreadsheet_id: String,
    /// 데이터 시트 이름
    pub sheet_name: String,
    /// Sheets API 기본 URL
    pub api_base_url: String,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: String::new(),
            sheet_name: "DataChungKhoan".to_string(),
            api_base_url: "https://sheets.googleapis.com".to_string(),
        }
    }
}

/// 예측 오라클 설정.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OracleConfig {
    /// API 키 (미설정 시 `OPENAI_API_KEY` 환경 변수 사용)
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// 모델 이름
    pub model: String,
    /// Chat Completions API 기본 URL
    pub base_url: String,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gpt-3.5-turbo".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }
}

impl fmt::Debug for OracleConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OracleConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl OracleConfig {
    /// API 키를 결정합니다 (설정 값 → `OPENAI_API_KEY`).
    pub fn resolve_api_key(&self) -> Result<SecretString, ConfigError> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .filter(|k| !k.is_empty())
            .map(|k| SecretString::new(k.into()))
            .ok_or_else(|| ConfigError::Missing("OPENAI_API_KEY".to_string()))
    }
}

/// 스크래퍼 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// 원천 사이트 기본 URL
    pub base_url: String,
    /// 행 요소 CSS 셀렉터
    pub row_selector: String,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: "https://vn.investing.com".to_string(),
            row_selector: r#"[class="datatable_row__qHMpQ"]"#.to_string(),
        }
    }
}

/// 자격증명 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// 저장된 사용자 토큰 파일 (authorized_user 형식)
    pub token_path: String,
    /// OAuth 클라이언트 자격증명 파일 (installed/web)
    pub credentials_path: String,
    /// 요청 스코프
    pub scopes: Vec<String>,
    /// 토큰 엔드포인트 (자격증명 파일 값이 없을 때 사용)
    pub token_uri: String,
    /// 동의 화면 엔드포인트
    pub auth_uri: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_path: "token.json".to_string(),
            credentials_path: "credentials.json".to_string(),
            scopes: vec!["https://www.googleapis.com/auth/spreadsheets".to_string()],
            token_uri: "https://oauth2.googleapis.com/token".to_string(),
            auth_uri: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
        }
    }
}

/// 스케줄 설정 (초 단위 포함 6필드 cron).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// 일일 업데이트 cron
    pub daily_cron: String,
    /// 지표 셀 폴링 cron
    pub poll_cron: String,
    /// 일일 업데이트 활성화
    pub enable_daily: bool,
    /// 폴링 활성화
    pub enable_poll: bool,
    /// 서버 시작 시 1회 디스패치
    pub startup_dispatch: bool,
    /// cron 을 해석할 IANA 시간대 (예: `Asia/Ho_Chi_Minh`, `UTC`)
    pub timezone: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            daily_cron: "0 0 0 * * *".to_string(),
            poll_cron: "*/15 * * * * *".to_string(),
            enable_daily: true,
            enable_poll: true,
            startup_dispatch: true,
            timezone: "Asia/Ho_Chi_Minh".to_string(),
        }
    }
}

impl ScheduleConfig {
    /// 설정된 시간대를 해석합니다.
    pub fn tz(&self) -> Result<Tz, ConfigError> {
        self.timezone.parse::<Tz>().map_err(|_| {
            ConfigError::Invalid(format!("schedule.timezone 을 해석할 수 없습니다: {}", self.timezone))
        })
    }
}

/// 예측 응답 처리 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Increase/Decrease 가 아닌 응답 처리 정책
    pub unrecognized_reply: UnrecognizedReplyPolicy,
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// 외부 HTTP 호출 공통 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
    /// User-Agent 헤더
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
        }
    }
}

impl HttpConfig {
    /// 요청 타임아웃을 Duration으로 반환
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl AppConfig {
    /// 파일(선택)과 환경 변수에서 설정을 로드합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let builder = config::Config::builder()
            // 파일에서 로드 (없으면 기본값 유지)
            .add_source(config::File::from(path.as_ref()).required(false))
            // 환경 변수로 오버라이드
            .add_source(
                config::Environment::with_prefix("FORECAST")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("auth.scopes")
                    .try_parsing(true),
            );

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// 필수 값과 cron 형식을 검증합니다.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sheet.spreadsheet_id.trim().is_empty() {
            return Err(ConfigError::Missing(
                "sheet.spreadsheet_id (FORECAST__SHEET__SPREADSHEET_ID)".to_string(),
            ));
        }
        for (key, expr) in [
            ("schedule.daily_cron", &self.schedule.daily_cron),
            ("schedule.poll_cron", &self.schedule.poll_cron),
        ] {
            if expr.split_whitespace().count() != 6 {
                return Err(ConfigError::Invalid(format!(
                    "{} 는 초 필드를 포함한 6필드 cron 이어야 합니다: {}",
                    key, expr
                )));
            }
        }
        self.schedule.tz()?;
        Ok(())
    }
}
