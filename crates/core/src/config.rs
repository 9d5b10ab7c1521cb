//! 설정 관리 -- flowlog.toml 파싱 및 런타임 설정
//!
//! [`FlowLogConfig`]는 로깅, 필드 레이아웃, 필터 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`FLOWLOG_FILTER_PROTOCOL=6` 형식)
//! 3. 설정 파일 (`flowlog.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), flowlog_core::error::FlowLogError> {
//! use flowlog_core::config::FlowLogConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = FlowLogConfig::load("flowlog.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = FlowLogConfig::parse("[filter]\nprotocol = 6")?;
//! let criteria = config.filter.to_criteria();
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ConfigError, FlowLogError};
use crate::types::{
    DEFAULT_DST_IP_INDEX, DEFAULT_DST_PORT_INDEX, DEFAULT_PROTOCOL_INDEX, DEFAULT_SRC_IP_INDEX,
    DEFAULT_SRC_PORT_INDEX, FieldLayout, FilterCriteria,
};

/// 허용하는 최대 필드 인덱스
pub const MAX_FIELD_INDEX: usize = 1024;

/// 포트 제약의 최댓값
pub const MAX_PORT: u32 = 65_535;

/// 프로토콜 제약의 최댓값 (IP 프로토콜 번호는 8비트)
pub const MAX_PROTOCOL: u32 = 255;

/// flowlog 통합 설정
///
/// `flowlog.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlowLogConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 필드 레이아웃 설정
    #[serde(default)]
    pub layout: LayoutConfig,
    /// 필터 설정
    #[serde(default)]
    pub filter: FilterConfig,
}

impl FlowLogConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, FlowLogError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 설정 파일이 없으면 기본값으로 대체하여 로드합니다.
    ///
    /// 파일이 존재하지만 읽거나 파싱할 수 없으면 에러를 반환합니다.
    pub async fn load_or_default(path: impl AsRef<Path>) -> Result<Self, FlowLogError> {
        let path = path.as_ref();
        match Self::load(path).await {
            Err(FlowLogError::Config(ConfigError::FileNotFound { .. })) => {
                debug!(path = %path.display(), "config file not found, using defaults");
                let mut config = Self::default();
                config.apply_env_overrides();
                config.validate()?;
                Ok(config)
            }
            other => other,
        }
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, FlowLogError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                FlowLogError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                FlowLogError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, FlowLogError> {
        toml::from_str(toml_str).map_err(|e| {
            FlowLogError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `FLOWLOG_{SECTION}_{FIELD}`
    /// 예: `FLOWLOG_LAYOUT_SRC_IP_INDEX=2`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "FLOWLOG_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "FLOWLOG_GENERAL_LOG_FORMAT");

        // Layout
        override_usize(&mut self.layout.src_ip_index, "FLOWLOG_LAYOUT_SRC_IP_INDEX");
        override_usize(&mut self.layout.dst_ip_index, "FLOWLOG_LAYOUT_DST_IP_INDEX");
        override_usize(
            &mut self.layout.src_port_index,
            "FLOWLOG_LAYOUT_SRC_PORT_INDEX",
        );
        override_usize(
            &mut self.layout.dst_port_index,
            "FLOWLOG_LAYOUT_DST_PORT_INDEX",
        );
        override_usize(
            &mut self.layout.protocol_index,
            "FLOWLOG_LAYOUT_PROTOCOL_INDEX",
        );

        // Filter
        override_csv(&mut self.filter.src_ips, "FLOWLOG_FILTER_SRC_IPS");
        override_csv(&mut self.filter.dst_ips, "FLOWLOG_FILTER_DST_IPS");
        override_u32(&mut self.filter.src_port, "FLOWLOG_FILTER_SRC_PORT");
        override_u32(&mut self.filter.dst_port, "FLOWLOG_FILTER_DST_PORT");
        override_u32(&mut self.filter.protocol, "FLOWLOG_FILTER_PROTOCOL");
        override_bool(
            &mut self.filter.count_connections,
            "FLOWLOG_FILTER_COUNT_CONNECTIONS",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), FlowLogError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        let indices = [
            ("layout.src_ip_index", self.layout.src_ip_index),
            ("layout.dst_ip_index", self.layout.dst_ip_index),
            ("layout.src_port_index", self.layout.src_port_index),
            ("layout.dst_port_index", self.layout.dst_port_index),
            ("layout.protocol_index", self.layout.protocol_index),
        ];
        for (field, index) in indices {
            if index > MAX_FIELD_INDEX {
                return Err(ConfigError::InvalidValue {
                    field: field.to_owned(),
                    reason: format!("must be 0-{}", MAX_FIELD_INDEX),
                }
                .into());
            }
        }

        let ports = [
            ("filter.src_port", self.filter.src_port),
            ("filter.dst_port", self.filter.dst_port),
        ];
        for (field, port) in ports {
            if port > MAX_PORT {
                return Err(ConfigError::InvalidValue {
                    field: field.to_owned(),
                    reason: format!("must be 0-{} (0 disables the filter)", MAX_PORT),
                }
                .into());
            }
        }

        if self.filter.protocol > MAX_PROTOCOL {
            return Err(ConfigError::InvalidValue {
                field: "filter.protocol".to_owned(),
                reason: format!("must be 0-{} (0 disables the filter)", MAX_PROTOCOL),
            }
            .into());
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 필드 레이아웃 설정
///
/// 음수 인덱스는 역직렬화 단계에서 거부됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// 출발지 IP 위치
    pub src_ip_index: usize,
    /// 목적지 IP 위치
    pub dst_ip_index: usize,
    /// 출발지 포트 위치
    pub src_port_index: usize,
    /// 목적지 포트 위치
    pub dst_port_index: usize,
    /// 프로토콜 위치
    pub protocol_index: usize,
}

impl LayoutConfig {
    /// 불변 [`FieldLayout`] 값을 생성합니다.
    pub fn to_layout(&self) -> FieldLayout {
        FieldLayout::new(
            self.src_ip_index,
            self.dst_ip_index,
            self.src_port_index,
            self.dst_port_index,
            self.protocol_index,
        )
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            src_ip_index: DEFAULT_SRC_IP_INDEX,
            dst_ip_index: DEFAULT_DST_IP_INDEX,
            src_port_index: DEFAULT_SRC_PORT_INDEX,
            dst_port_index: DEFAULT_DST_PORT_INDEX,
            protocol_index: DEFAULT_PROTOCOL_INDEX,
        }
    }
}

/// 필터 설정
///
/// 설정 파일과 환경변수에서는 `0`이 "필터 없음"을 뜻합니다.
/// [`FilterConfig::to_criteria`]가 이를 `None`으로 변환합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// 출발지 IP 허용 목록 (비어 있으면 필터 없음)
    pub src_ips: Vec<String>,
    /// 목적지 IP 허용 목록 (비어 있으면 필터 없음)
    pub dst_ips: Vec<String>,
    /// 출발지 포트 (0이면 필터 없음)
    pub src_port: u32,
    /// 목적지 포트 (0이면 필터 없음)
    pub dst_port: u32,
    /// 프로토콜 번호 (0이면 필터 없음)
    pub protocol: u32,
    /// 연결별 집계 여부
    pub count_connections: bool,
}

impl FilterConfig {
    /// 불변 [`FilterCriteria`] 값을 생성합니다.
    pub fn to_criteria(&self) -> FilterCriteria {
        FilterCriteria::new()
            .with_src_ips(self.src_ips.iter().cloned())
            .with_dst_ips(self.dst_ips.iter().cloned())
            .with_src_port(non_zero(self.src_port))
            .with_dst_port(non_zero(self.dst_port))
            .with_protocol(non_zero(self.protocol))
    }
}

fn non_zero(value: u32) -> Option<u32> {
    (value != 0).then_some(value)
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_u32(target: &mut u32, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u32>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u32 from env var, ignoring"
            ),
        }
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
    }
}
