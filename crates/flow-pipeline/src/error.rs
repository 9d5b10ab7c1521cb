//! 파이프라인 에러 타입
//!
//! [`FlowPipelineError`]는 레코드 파이프라인 내부에서 발생하는 에러를 표현합니다.
//! 레코드 단위 거부([`RecordError`](flowlog_core::error::RecordError))는 에러가 아니라
//! 처리 결과로 다뤄지므로 여기에 포함되지 않습니다.
//! `From<FlowPipelineError> for FlowLogError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 전파할 수 있습니다.

use flowlog_core::error::{ConfigError, FlowLogError};

/// 파이프라인 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum FlowPipelineError {
    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 출력(sink) 실패
    #[error("sink error: {0}")]
    Sink(#[source] FlowLogError),
}

impl From<FlowPipelineError> for FlowLogError {
    fn from(err: FlowPipelineError) -> Self {
        match err {
            FlowPipelineError::Config { field, reason } => {
                FlowLogError::Config(ConfigError::InvalidValue { field, reason })
            }
            FlowPipelineError::Sink(inner) => inner,
        }
    }
}
