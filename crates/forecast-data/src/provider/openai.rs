//! OpenAI Chat Completions 오라클.
//!
//! 시스템 지시문과 가격 페이로드를 보내고 첫 번째 선택지의 텍스트를 그대로 반환합니다.
//! 응답 해석(Increase/Decrease)은 호출자의 몫입니다.

use async_trait::async_trait;
use forecast_core::{ForecastError, Forecaster};
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

/// Chat Completions 오라클 설정.
#[derive(Debug)]
pub struct OpenAiConfig {
    pub api_key: SecretString,
    pub model: String,
    /// API 기본 URL (예: `https://api.openai.com/v1`)
    pub base_url: String,
}

impl OpenAiConfig {
    pub fn new(api_key: SecretString, model: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key,
            model: model.into(),
            base_url: base_url.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// OpenAI 호환 예측기.
pub struct OpenAiForecaster {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiForecaster {
    pub fn new(config: OpenAiConfig, client: Client) -> Self {
        Self { config, client }
    }
}

#[async_trait]
impl Forecaster for OpenAiForecaster {
    async fn complete(
        &self,
        system_instruction: &str,
        payload: &str,
    ) -> Result<String, ForecastError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_instruction,
                },
                ChatMessage {
                    role: "user",
                    content: payload,
                },
            ],
        };

        debug!(model = %self.config.model, payload_len = payload.len(), "Requesting completion");

        let response = self
            .client
            .post(self.config.endpoint())
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| ForecastError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ForecastError::Transport(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            error!(status = status.as_u16(), %message, "Completion request failed");

            if status == StatusCode::UNAUTHORIZED {
                return Err(ForecastError::Unauthorized(message));
            }
            return Err(ForecastError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&body).map_err(|e| ForecastError::Api {
            status: status.as_u16(),
            message: format!("응답 파싱 실패: {}", e),
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(ForecastError::EmptyReply)
    }
}
