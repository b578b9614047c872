//! Error types for jmxpoller
//!
//! This module defines the error types used throughout the application.

use thiserror::Error;

/// Session(원격 JMX 통신) 에러 타입
#[derive(Error, Debug)]
pub enum SessionError {
    /// HTTP 클라이언트 초기화 실패
    #[error("Failed to initialize HTTP client: {0}")]
    HttpClientInit(#[source] reqwest::Error),

    /// HTTP 요청 실패
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[source] reqwest::Error),

    /// HTTP 응답 읽기 실패
    #[error("Failed to read HTTP response: {0}")]
    HttpResponse(#[source] reqwest::Error),

    /// HTTP 상태 코드 에러
    #[error("HTTP error status: {0}")]
    HttpStatus(u16),

    /// JSON 파싱 에러
    #[error("JSON parse error: {0}")]
    JsonParse(String),

    /// Jolokia 에러 응답
    #[error("Jolokia error (status {status}): {message}")]
    Jolokia { status: u16, message: String },

    /// 타임아웃
    /// The value is the configured timeout in milliseconds, if known.
    #[error("Request timed out{}", .0.map(|ms| format!(" after {}ms", ms)).unwrap_or_default())]
    Timeout(Option<u64>),

    /// 연결 실패
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// 인증 실패
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// 세션이 아직 수립되지 않음
    #[error("Session is not connected")]
    NotConnected,
}

impl SessionError {
    /// 재시도 가능한 에러인지 확인
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SessionError::HttpRequest(_)
                | SessionError::HttpResponse(_)
                | SessionError::Timeout(..)
                | SessionError::ConnectionFailed(_)
                | SessionError::HttpStatus(500..=599)
        )
    }

    /// HTTP 상태 코드 추출
    pub fn http_status(&self) -> Option<u16> {
        match self {
            SessionError::HttpStatus(code) => Some(*code),
            SessionError::Jolokia { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for SessionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            // Timeout value is unknown when converting from reqwest::Error
            // because reqwest API doesn't expose the configured timeout duration.
            SessionError::Timeout(None)
        } else if err.is_connect() {
            SessionError::ConnectionFailed(err.to_string())
        } else if err.is_request() {
            SessionError::HttpRequest(err)
        } else {
            SessionError::HttpResponse(err)
        }
    }
}

/// Result type alias for session operations
pub type SessionResult<T> = Result<T, SessionError>;
