//! 에러 타입 -- 도메인별 에러 정의

use std::fmt;

/// flowlog 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum FlowLogError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
///
/// 줄을 하나라도 처리하기 전에 드러나야 하며, 실행 전체에 치명적입니다.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// IP 주소 필드 구분
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressField {
    /// 출발지
    Source,
    /// 목적지
    Destination,
}

impl fmt::Display for AddressField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => write!(f, "source"),
            Self::Destination => write!(f, "destination"),
        }
    }
}

/// 레코드 거부 사유
///
/// 해당 줄만 건너뛰고 처리는 계속됩니다. 실행 전체를 멈추지 않으므로
/// [`FlowLogError`]로 감싸지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    /// 레이아웃이 요구하는 토큰 수보다 적음
    #[error("not enough fields: got {tokens}, need at least {required}")]
    MalformedLine { tokens: usize, required: usize },

    /// 출발지 또는 목적지 토큰이 IPv4 주소가 아님
    #[error("invalid {field} ip: '{value}'")]
    InvalidAddress { field: AddressField, value: String },
}

impl RecordError {
    /// 진단 및 메트릭 레이블에 쓰는 사유 분류
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MalformedLine { .. } => "malformed_line",
            Self::InvalidAddress { .. } => "invalid_address",
        }
    }
}
