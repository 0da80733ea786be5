//! 예측 판정과 매매 신호.
//!
//! 오라클 응답은 프롬프트로만 제한된 자유 텍스트입니다. 응답을 정규화한 뒤
//! `Increase`/`Decrease` 로 해석하고, 그 외 응답은 설정된 정책으로 처리합니다.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ForecastError;

/// 오라클에 전달하는 고정 시스템 지시문.
pub const FORECAST_INSTRUCTION: &str = "Act as a Financial Analyst for analyzing finance data (OHLCV). \
I will provide you data (format Date, Open, High, Low, Close, Volume, Change %) about the stock market \
and you will only give me 1 answer about the guess the price will increase or decrease in the next \
5-10 days (you only use Bollinger Band). Do not write explanations in replies. \
Reply with exactly one word: 'Increase' or 'Decrease'.";

/// 오라클의 방향 예측.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForecastVerdict {
    Increase,
    Decrease,
}

impl ForecastVerdict {
    /// 오라클 응답을 판정으로 해석합니다.
    ///
    /// 앞뒤 공백, 따옴표, 마침표 등을 제거하고 대소문자를 무시합니다.
    pub fn parse_reply(reply: &str) -> Option<Self> {
        let normalized = reply
            .trim()
            .trim_matches(|c: char| c.is_whitespace() || matches!(c, '\'' | '"' | '.' | '!' | '`'))
            .to_lowercase();

        match normalized.as_str() {
            "increase" => Some(ForecastVerdict::Increase),
            "decrease" => Some(ForecastVerdict::Decrease),
            _ => None,
        }
    }
}

impl fmt::Display for ForecastVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForecastVerdict::Increase => write!(f, "Increase"),
            ForecastVerdict::Decrease => write!(f, "Decrease"),
        }
    }
}

/// 예측에서 파생되는 매매 신호.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeSignal {
    Buy,
    Sell,
}

impl From<ForecastVerdict> for TradeSignal {
    /// 상승 예측이면 매도, 하락 예측이면 매수.
    fn from(verdict: ForecastVerdict) -> Self {
        match verdict {
            ForecastVerdict::Increase => TradeSignal::Sell,
            ForecastVerdict::Decrease => TradeSignal::Buy,
        }
    }
}

impl fmt::Display for TradeSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeSignal::Buy => write!(f, "Buy"),
            TradeSignal::Sell => write!(f, "Sell"),
        }
    }
}

/// 해석할 수 없는 응답 처리 정책.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnrecognizedReplyPolicy {
    /// 쓰기 전에 실행을 실패시킴
    #[default]
    Reject,
    /// 원본 응답을 기록하고 매수 신호 사용
    Buy,
}

impl FromStr for UnrecognizedReplyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "buy" => Ok(Self::Buy),
            _ => Err(format!("Unknown unrecognized-reply policy: {}", s)),
        }
    }
}

/// 오라클 응답에서 판정과 신호를 결정합니다.
///
/// 판정이 `None` 이면 정책 `Buy` 로 대체된 경우입니다.
pub fn resolve_signal(
    reply: &str,
    policy: UnrecognizedReplyPolicy,
) -> Result<(Option<ForecastVerdict>, TradeSignal), ForecastError> {
    match ForecastVerdict::parse_reply(reply) {
        Some(verdict) => Ok((Some(verdict), TradeSignal::from(verdict))),
        None => match policy {
            UnrecognizedReplyPolicy::Reject => {
                Err(ForecastError::UnrecognizedReply(reply.to_string()))
            }
            UnrecognizedReplyPolicy::Buy => {
                tracing::warn!(reply = reply, "해석할 수 없는 예측 응답, 매수 신호로 대체");
                Ok((None, TradeSignal::Buy))
            }
        },
    }
}
