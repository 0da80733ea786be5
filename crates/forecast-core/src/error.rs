//! 예측 시스템의 에러 타입.
//!
//! 파이프라인 각 단계에서 발생하는 에러를 정의합니다:
//! - `MalformedRowError` - 스크랩한 행이 오프셋 스키마에 맞지 않음
//! - `ScrapeError` - 페이지 로드 실패 또는 행 요소 누락
//! - `ForecastError` - 예측 API 호출 실패
//! - `SheetError` - 스프레드시트 읽기/쓰기 실패
//! - `AuthError` - 자격증명 로드/교환 실패

use thiserror::Error;

/// 행 파싱 에러.
///
/// 잘못 정렬된 숫자 값은 눈에 보이는 실패보다 나쁘므로 부분 레코드는 만들지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedRowError {
    /// 행 길이가 스키마 최소 폭보다 짧음
    #[error("행 길이 부족: 최소 {expected}자 필요, 실제 {actual}자")]
    TooShort { expected: usize, actual: usize },

    /// 숫자 필드 변환 실패
    #[error("숫자 필드 '{field}' 변환 실패: {value:?}")]
    InvalidNumber { field: &'static str, value: String },
}

/// 스크래퍼 에러.
#[derive(Debug, Clone, Error)]
pub enum ScrapeError {
    /// HTTP 요청 실패
    #[error("페이지 요청 실패: {0}")]
    Request(String),

    /// 비정상 응답 상태
    #[error("페이지 응답 에러: {url} (status {status})")]
    Status { url: String, status: u16 },

    /// 셀렉터 파싱 실패
    #[error("셀렉터 에러: {0}")]
    Selector(String),

    /// 기대한 행 요소가 부족함
    #[error("행 요소 부족: {expected}개 필요, {found}개 발견")]
    MissingRows { expected: usize, found: usize },
}

/// 인증 에러.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// 자격증명 파일 읽기 실패
    #[error("자격증명 파일 읽기 실패 ({path}): {message}")]
    CredentialFile { path: String, message: String },

    /// 저장된 토큰 없음 (동의 절차 필요)
    #[error("저장된 토큰이 없습니다. `authorize` 명령으로 토큰을 발급하세요: {0}")]
    MissingToken(String),

    /// 토큰 교환 실패
    #[error("토큰 교환 실패: {0}")]
    Exchange(String),
}

/// 예측(오라클) 에러.
#[derive(Debug, Clone, Error)]
pub enum ForecastError {
    /// 네트워크 전송 실패
    #[error("예측 요청 실패: {0}")]
    Transport(String),

    /// API 에러 응답
    #[error("예측 API 에러 (status {status}): {message}")]
    Api { status: u16, message: String },

    /// API 키 누락 등 인증 문제
    #[error("예측 API 인증 에러: {0}")]
    Unauthorized(String),

    /// 응답에 선택지가 없음
    #[error("예측 응답이 비어 있습니다")]
    EmptyReply,

    /// Increase/Decrease 로 해석할 수 없는 응답
    #[error("해석할 수 없는 예측 응답: {0:?}")]
    UnrecognizedReply(String),
}

/// 스프레드시트 에러.
#[derive(Debug, Clone, Error)]
pub enum SheetError {
    /// 셀 읽기 실패
    #[error("시트 읽기 실패 ({range}): {message}")]
    Read { range: String, message: String },

    /// 범위 쓰기 실패
    #[error("시트 쓰기 실패 ({range}): {message}")]
    Write { range: String, message: String },

    /// 인증 실패
    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl SheetError {
    /// 쓰기 에러인지 확인합니다.
    pub fn is_write(&self) -> bool {
        matches!(self, SheetError::Write { .. })
    }
}

/// 설정 에러.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 설정 로드 실패
    #[error("설정 로드 실패: {0}")]
    Load(#[from] config::ConfigError),

    /// 필수 값 누락
    #[error("필수 설정 누락: {0}")]
    Missing(String),

    /// 잘못된 값
    #[error("잘못된 설정 값: {0}")]
    Invalid(String),
}
