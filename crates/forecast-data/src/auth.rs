//! Google OAuth 2.0 인증 모듈.
//!
//! 처리 기능:
//! - 저장된 사용자 토큰(`token.json`, authorized_user 형식) 로드
//! - refresh_token 으로 접근 토큰 발급 및 캐싱
//! - 동의 화면 URL 생성 및 인증 코드 교환 (최초 1회)

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use forecast_core::{AuthConfig, AuthError};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

/// 토큰 갱신 임계값 (남은 시간이 이 값보다 적으면 갱신).
const TOKEN_REFRESH_THRESHOLD_MINUTES: i64 = 5;

/// 설치형 앱 기본 리다이렉트 URI.
const DEFAULT_REDIRECT_URI: &str = "http://localhost";

/// 저장된 사용자 자격증명 (`token.json`).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthorizedUser {
    #[serde(rename = "type")]
    pub kind: String,
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

/// OAuth 클라이언트 자격증명 (`credentials.json` 의 installed/web 항목).
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub auth_uri: Option<String>,
    #[serde(default)]
    pub token_uri: Option<String>,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

impl ClientSecrets {
    fn redirect_uri(&self) -> &str {
        self.redirect_uris
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_REDIRECT_URI)
    }
}

#[derive(Debug, Deserialize)]
struct ClientSecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

/// Google 토큰 응답.
#[derive(Debug, Clone, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_token_type")]
    token_type: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
    #[serde(default)]
    refresh_token: Option<String>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

fn default_expires_in() -> i64 {
    3600
}

/// Google OAuth 오류 응답.
#[derive(Debug, Clone, Deserialize)]
struct OAuthErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// 만료 추적이 포함된 토큰 상태.
#[derive(Debug, Clone)]
pub struct TokenState {
    /// 접근 토큰
    pub access_token: String,
    /// 토큰 타입
    pub token_type: String,
    /// 만료 시각
    pub expires_at: DateTime<Utc>,
}

impl TokenState {
    pub fn new(access_token: String, token_type: String, expires_at: DateTime<Utc>) -> Self {
        Self {
            access_token,
            token_type,
            expires_at,
        }
    }

    /// 토큰이 만료되었거나 곧 만료되는지 확인.
    pub fn is_expired_or_expiring(&self) -> bool {
        let threshold = Utc::now() + Duration::minutes(TOKEN_REFRESH_THRESHOLD_MINUTES);
        self.expires_at <= threshold
    }

    /// 인증 헤더 값 반환.
    pub fn auth_header(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }
}

// =============================================================================
// TokenSource Trait
// =============================================================================

/// 유효한 접근 토큰 제공자.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Result<TokenState, AuthError>;
}

/// 고정 토큰 (테스트 및 외부에서 발급한 토큰용).
#[derive(Debug, Clone)]
pub struct StaticToken(TokenState);

impl StaticToken {
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self(TokenState::new(
            access_token.into(),
            default_token_type(),
            DateTime::<Utc>::MAX_UTC,
        ))
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn access_token(&self) -> Result<TokenState, AuthError> {
        Ok(self.0.clone())
    }
}

// =============================================================================
// GoogleAuthorizer
// =============================================================================

/// Google OAuth 인증 관리자.
///
/// 저장된 refresh_token 으로 접근 토큰을 발급하고 만료 전까지 재사용합니다.
pub struct GoogleAuthorizer {
    settings: AuthConfig,
    client: Client,
    token: Arc<RwLock<Option<TokenState>>>,
}

impl GoogleAuthorizer {
    pub fn new(settings: AuthConfig, client: Client) -> Self {
        Self {
            settings,
            client,
            token: Arc::new(RwLock::new(None)),
        }
    }

    /// 저장된 사용자 토큰이 있는지 확인합니다.
    pub fn has_stored_token(&self) -> bool {
        Path::new(&self.settings.token_path).exists()
    }

    /// 저장된 사용자 토큰을 로드합니다.
    pub async fn load_authorized_user(&self) -> Result<AuthorizedUser, AuthError> {
        let path = &self.settings.token_path;
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AuthError::MissingToken(path.clone()));
            }
            Err(e) => {
                return Err(AuthError::CredentialFile {
                    path: path.clone(),
                    message: e.to_string(),
                });
            }
        };

        serde_json::from_str(&content).map_err(|e| AuthError::CredentialFile {
            path: path.clone(),
            message: e.to_string(),
        })
    }

    /// OAuth 클라이언트 자격증명을 로드합니다.
    pub async fn load_client_secrets(&self) -> Result<ClientSecrets, AuthError> {
        let path = &self.settings.credentials_path;
        let file_error = |message: String| AuthError::CredentialFile {
            path: path.clone(),
            message,
        };

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| file_error(e.to_string()))?;
        let file: ClientSecretsFile =
            serde_json::from_str(&content).map_err(|e| file_error(e.to_string()))?;

        file.installed
            .or(file.web)
            .ok_or_else(|| file_error("installed 또는 web 항목이 없습니다".to_string()))
    }

    /// 동의 화면 URL을 생성합니다.
    pub async fn consent_url(&self) -> Result<Url, AuthError> {
        let secrets = self.load_client_secrets().await?;
        let auth_uri = secrets
            .auth_uri
            .as_deref()
            .unwrap_or(&self.settings.auth_uri);
        let scope = self.settings.scopes.join(" ");

        Url::parse_with_params(
            auth_uri,
            &[
                ("client_id", secrets.client_id.as_str()),
                ("redirect_uri", secrets.redirect_uri()),
                ("response_type", "code"),
                ("scope", scope.as_str()),
                ("access_type", "offline"),
                ("prompt", "consent"),
            ],
        )
        .map_err(|e| AuthError::Exchange(format!("잘못된 auth_uri '{}': {}", auth_uri, e)))
    }

    /// 인증 코드를 교환하고 `token.json` 에 사용자 자격증명을 저장합니다.
    pub async fn exchange_code(&self, code: &str) -> Result<AuthorizedUser, AuthError> {
        let secrets = self.load_client_secrets().await?;
        let token_uri = secrets
            .token_uri
            .clone()
            .unwrap_or_else(|| self.settings.token_uri.clone());

        info!("Exchanging authorization code for tokens...");

        let token_resp = self
            .request_token(
                &token_uri,
                &[
                    ("grant_type", "authorization_code"),
                    ("code", code),
                    ("client_id", secrets.client_id.as_str()),
                    ("client_secret", secrets.client_secret.as_str()),
                    ("redirect_uri", secrets.redirect_uri()),
                ],
            )
            .await?;

        let refresh_token = token_resp.refresh_token.clone().ok_or_else(|| {
            AuthError::Exchange(
                "응답에 refresh_token 이 없습니다 (access_type=offline 동의 필요)".to_string(),
            )
        })?;

        let user = AuthorizedUser {
            kind: "authorized_user".to_string(),
            client_id: secrets.client_id,
            client_secret: secrets.client_secret,
            refresh_token,
        };

        let payload = serde_json::to_string_pretty(&user)
            .map_err(|e| AuthError::Exchange(e.to_string()))?;
        tokio::fs::write(&self.settings.token_path, payload)
            .await
            .map_err(|e| AuthError::CredentialFile {
                path: self.settings.token_path.clone(),
                message: e.to_string(),
            })?;

        self.store(token_resp).await;
        info!(path = %self.settings.token_path, "Stored authorized user credentials");

        Ok(user)
    }

    /// 접근 토큰 강제 갱신.
    pub async fn refresh_token(&self) -> Result<TokenState, AuthError> {
        let user = self.load_authorized_user().await?;

        info!(
            "Requesting new Google access token... (client: {}...)",
            user.client_id.chars().take(12).collect::<String>()
        );

        let token_resp = self
            .request_token(
                &self.settings.token_uri,
                &[
                    ("grant_type", "refresh_token"),
                    ("client_id", user.client_id.as_str()),
                    ("client_secret", user.client_secret.as_str()),
                    ("refresh_token", user.refresh_token.as_str()),
                ],
            )
            .await?;

        let state = self.store(token_resp).await;
        info!("Google access token obtained, expires at: {}", state.expires_at);
        Ok(state)
    }

    async fn request_token(
        &self,
        token_uri: &str,
        form: &[(&str, &str)],
    ) -> Result<TokenResponse, AuthError> {
        let response = self
            .client
            .post(token_uri)
            .form(form)
            .send()
            .await
            .map_err(|e| AuthError::Exchange(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AuthError::Exchange(e.to_string()))?;

        if !status.is_success() {
            error!("Token request failed: {} - {}", status, body);

            if let Ok(oauth_error) = serde_json::from_str::<OAuthErrorResponse>(&body) {
                let message = match oauth_error.error.as_str() {
                    "invalid_grant" => {
                        "refresh_token 이 만료되었거나 취소되었습니다. `authorize` 명령으로 다시 발급하세요."
                            .to_string()
                    }
                    "invalid_client" => "클라이언트 ID/Secret 이 올바르지 않습니다.".to_string(),
                    _ => format!(
                        "{} ({})",
                        oauth_error.error_description.unwrap_or_default(),
                        oauth_error.error
                    ),
                };
                return Err(AuthError::Exchange(message));
            }

            return Err(AuthError::Exchange(format!(
                "Token request failed: {} - {}",
                status, body
            )));
        }

        serde_json::from_str(&body)
            .map_err(|e| AuthError::Exchange(format!("Failed to parse token response: {}", e)))
    }

    async fn store(&self, token_resp: TokenResponse) -> TokenState {
        let state = TokenState::new(
            token_resp.access_token,
            token_resp.token_type,
            Utc::now() + Duration::seconds(token_resp.expires_in),
        );
        let mut guard = self.token.write().await;
        *guard = Some(state.clone());
        state
    }
}

#[async_trait]
impl TokenSource for GoogleAuthorizer {
    async fn access_token(&self) -> Result<TokenState, AuthError> {
        {
            let guard = self.token.read().await;
            match guard.as_ref() {
                Some(token) if !token.is_expired_or_expiring() => {
                    debug!("Using cached Google token (expires at: {})", token.expires_at);
                    return Ok(token.clone());
                }
                Some(token) => warn!(
                    "Google token expired or expiring soon (expires at: {}), refreshing...",
                    token.expires_at
                ),
                None => info!("No cached Google token found, requesting new token..."),
            }
        }

        self.refresh_token().await
    }
}
