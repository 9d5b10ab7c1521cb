//! 파이프라인 설정
//!
//! [`ProcessorConfig`]는 core의 [`FlowLogConfig`]를 기반으로
//! 라인 처리기가 사용하는 불변 설정(레이아웃, 필터 조건, 집계 여부)을 제공합니다.
//!
//! # 사용 예시
//! ```
//! use flowlog_core::config::FlowLogConfig;
//! use flowlog_pipeline::config::ProcessorConfig;
//!
//! let core_config = FlowLogConfig::default();
//! let config = ProcessorConfig::from_core(&core_config).unwrap();
//! assert!(!config.count_connections);
//! ```

use serde::Serialize;

use flowlog_core::config::FlowLogConfig;
use flowlog_core::types::{FieldLayout, FilterCriteria};

use crate::error::FlowPipelineError;
use crate::ipv4::is_ipv4;

/// 라인 처리기 설정
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProcessorConfig {
    /// 필드 레이아웃
    pub layout: FieldLayout,
    /// 필터 조건
    pub criteria: FilterCriteria,
    /// 연결별 집계 여부
    pub count_connections: bool,
}

impl ProcessorConfig {
    /// core 설정에서 처리기 설정을 생성하고 검증합니다.
    pub fn from_core(core: &FlowLogConfig) -> Result<Self, FlowPipelineError> {
        let config = Self {
            layout: core.layout.to_layout(),
            criteria: core.filter.to_criteria(),
            count_connections: core.filter.count_connections,
        };
        config.validate()?;
        Ok(config)
    }

    /// 설정값의 유효성을 검증합니다.
    ///
    /// 허용 목록의 모든 항목은 IPv4 주소여야 합니다.
    /// 잘못된 항목은 어떤 레코드와도 일치하지 않으므로 실행 전에 거부합니다.
    pub fn validate(&self) -> Result<(), FlowPipelineError> {
        validate_allow_set("filter.src_ips", self.criteria.src_ips())?;
        validate_allow_set("filter.dst_ips", self.criteria.dst_ips())?;
        Ok(())
    }
}

fn validate_allow_set<'a>(
    field: &str,
    ips: impl IntoIterator<Item = &'a String>,
) -> Result<(), FlowPipelineError> {
    for ip in ips {
        if !is_ipv4(ip) {
            return Err(FlowPipelineError::Config {
                field: field.to_owned(),
                reason: format!("'{}' is not an IPv4 address", ip),
            });
        }
    }
    Ok(())
}

/// 처리기 설정 빌더
#[derive(Default)]
pub struct ProcessorConfigBuilder {
    config: ProcessorConfig,
}

impl ProcessorConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 필드 레이아웃을 설정합니다.
    pub fn layout(mut self, layout: FieldLayout) -> Self {
        self.config.layout = layout;
        self
    }

    /// 필터 조건을 설정합니다.
    pub fn criteria(mut self, criteria: FilterCriteria) -> Self {
        self.config.criteria = criteria;
        self
    }

    /// 연결별 집계 여부를 설정합니다.
    pub fn count_connections(mut self, enabled: bool) -> Self {
        self.config.count_connections = enabled;
        self
    }

    /// 설정을 검증하고 `ProcessorConfig`를 생성합니다.
    pub fn build(self) -> Result<ProcessorConfig, FlowPipelineError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
