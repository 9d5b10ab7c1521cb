//! 도메인 타입 -- 플로우 로그 레코드와 필터/집계에 쓰이는 공통 타입
//!
//! 파서, 필터, 집계기가 공유하는 데이터 구조를 정의합니다.
//! 모든 타입은 생성 후 변경되지 않으며, 호출자가 참조로 전달합니다.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// 기본 출발지 IP 필드 위치
pub const DEFAULT_SRC_IP_INDEX: usize = 3;
/// 기본 목적지 IP 필드 위치
pub const DEFAULT_DST_IP_INDEX: usize = 4;
/// 기본 출발지 포트 필드 위치
pub const DEFAULT_SRC_PORT_INDEX: usize = 5;
/// 기본 목적지 포트 필드 위치
pub const DEFAULT_DST_PORT_INDEX: usize = 6;
/// 기본 프로토콜 필드 위치
pub const DEFAULT_PROTOCOL_INDEX: usize = 7;

/// 필드 레이아웃
///
/// 공백으로 토큰화된 한 줄에서 각 의미 필드가 위치한 0 기반 인덱스입니다.
/// 한 번 생성되면 실행 내내 변경되지 않습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldLayout {
    src_ip_index: usize,
    dst_ip_index: usize,
    src_port_index: usize,
    dst_port_index: usize,
    protocol_index: usize,
}

impl FieldLayout {
    /// 다섯 개의 필드 위치로 레이아웃을 생성합니다.
    pub const fn new(
        src_ip_index: usize,
        dst_ip_index: usize,
        src_port_index: usize,
        dst_port_index: usize,
        protocol_index: usize,
    ) -> Self {
        Self {
            src_ip_index,
            dst_ip_index,
            src_port_index,
            dst_port_index,
            protocol_index,
        }
    }

    /// 출발지 IP 위치
    pub fn src_ip_index(&self) -> usize {
        self.src_ip_index
    }

    /// 목적지 IP 위치
    pub fn dst_ip_index(&self) -> usize {
        self.dst_ip_index
    }

    /// 출발지 포트 위치
    pub fn src_port_index(&self) -> usize {
        self.src_port_index
    }

    /// 목적지 포트 위치
    pub fn dst_port_index(&self) -> usize {
        self.dst_port_index
    }

    /// 프로토콜 위치
    pub fn protocol_index(&self) -> usize {
        self.protocol_index
    }

    /// 가장 큰 설정 인덱스
    pub fn max_index(&self) -> usize {
        self.src_ip_index
            .max(self.dst_ip_index)
            .max(self.src_port_index)
            .max(self.dst_port_index)
            .max(self.protocol_index)
    }

    /// 유효한 줄이 가져야 하는 최소 토큰 수 (`max_index + 1`)
    pub fn required_tokens(&self) -> usize {
        self.max_index() + 1
    }
}

impl Default for FieldLayout {
    fn default() -> Self {
        Self::new(
            DEFAULT_SRC_IP_INDEX,
            DEFAULT_DST_IP_INDEX,
            DEFAULT_SRC_PORT_INDEX,
            DEFAULT_DST_PORT_INDEX,
            DEFAULT_PROTOCOL_INDEX,
        )
    }
}

impl fmt::Display for FieldLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "src_ip={} dst_ip={} src_port={} dst_port={} protocol={}",
            self.src_ip_index,
            self.dst_ip_index,
            self.src_port_index,
            self.dst_port_index,
            self.protocol_index,
        )
    }
}

/// 파싱된 플로우 로그 레코드
///
/// 원본 줄과 다섯 개의 추출 필드를 담습니다.
/// 파서를 거쳐 생성된 레코드의 IP 필드는 유효한 IPv4 dotted-quad 형식입니다.
/// 포트와 프로토콜은 원문 그대로 보관하며, 숫자 검증은 필터 단계에서 수행합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedRecord {
    raw: String,
    src_ip: String,
    dst_ip: String,
    src_port: String,
    dst_port: String,
    protocol: String,
}

impl ParsedRecord {
    /// 필드 값으로 레코드를 생성합니다.
    ///
    /// 값을 검증하지 않습니다. 검증된 레코드가 필요하면 레코드 파서를 사용하세요.
    pub fn new(
        raw: impl Into<String>,
        src_ip: impl Into<String>,
        dst_ip: impl Into<String>,
        src_port: impl Into<String>,
        dst_port: impl Into<String>,
        protocol: impl Into<String>,
    ) -> Self {
        Self {
            raw: raw.into(),
            src_ip: src_ip.into(),
            dst_ip: dst_ip.into(),
            src_port: src_port.into(),
            dst_port: dst_port.into(),
            protocol: protocol.into(),
        }
    }

    /// 원본 줄
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// 출발지 IP
    pub fn src_ip(&self) -> &str {
        &self.src_ip
    }

    /// 목적지 IP
    pub fn dst_ip(&self) -> &str {
        &self.dst_ip
    }

    /// 출발지 포트 (원문)
    pub fn src_port(&self) -> &str {
        &self.src_port
    }

    /// 목적지 포트 (원문)
    pub fn dst_port(&self) -> &str {
        &self.dst_port
    }

    /// 프로토콜 번호 (원문)
    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    /// 레코드의 연결 식별자(5-tuple)를 생성합니다.
    pub fn connection_key(&self) -> ConnectionKey {
        ConnectionKey {
            src_ip: self.src_ip.clone(),
            dst_ip: self.dst_ip.clone(),
            src_port: self.src_port.clone(),
            dst_port: self.dst_port.clone(),
            protocol: self.protocol.clone(),
        }
    }
}

/// 연결 식별자
///
/// (출발지 IP, 목적지 IP, 출발지 포트, 목적지 포트, 프로토콜) 5-tuple 입니다.
/// 다섯 필드가 모두 같을 때만 같은 키로 취급합니다.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ConnectionKey {
    /// 출발지 IP
    pub src_ip: String,
    /// 목적지 IP
    pub dst_ip: String,
    /// 출발지 포트
    pub src_port: String,
    /// 목적지 포트
    pub dst_port: String,
    /// 프로토콜
    pub protocol: String,
}

impl ConnectionKey {
    /// 다섯 필드로 키를 생성합니다.
    pub fn new(
        src_ip: impl Into<String>,
        dst_ip: impl Into<String>,
        src_port: impl Into<String>,
        dst_port: impl Into<String>,
        protocol: impl Into<String>,
    ) -> Self {
        Self {
            src_ip: src_ip.into(),
            dst_ip: dst_ip.into(),
            src_port: src_port.into(),
            dst_port: dst_port.into(),
            protocol: protocol.into(),
        }
    }
}

impl fmt::Display for ConnectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {}:{} (proto:{})",
            self.src_ip, self.dst_ip, self.dst_port, self.protocol,
        )
    }
}

/// 필터 조건
///
/// IP 허용 목록은 비어 있으면 제약이 없습니다.
/// 포트/프로토콜 제약은 `None`이면 제약이 없고, `Some(n)`이면 정확히 `n`과 일치해야 합니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    src_ips: HashSet<String>,
    dst_ips: HashSet<String>,
    src_port: Option<u32>,
    dst_port: Option<u32>,
    protocol: Option<u32>,
}

impl FilterCriteria {
    /// 제약이 없는 필터 조건을 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 출발지 IP 허용 목록을 설정합니다.
    pub fn with_src_ips<I, S>(mut self, ips: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.src_ips = ips.into_iter().map(Into::into).collect();
        self
    }

    /// 목적지 IP 허용 목록을 설정합니다.
    pub fn with_dst_ips<I, S>(mut self, ips: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dst_ips = ips.into_iter().map(Into::into).collect();
        self
    }

    /// 출발지 포트 제약을 설정합니다.
    pub fn with_src_port(mut self, port: Option<u32>) -> Self {
        self.src_port = port;
        self
    }

    /// 목적지 포트 제약을 설정합니다.
    pub fn with_dst_port(mut self, port: Option<u32>) -> Self {
        self.dst_port = port;
        self
    }

    /// 프로토콜 제약을 설정합니다.
    pub fn with_protocol(mut self, protocol: Option<u32>) -> Self {
        self.protocol = protocol;
        self
    }

    /// 출발지 IP 허용 목록
    pub fn src_ips(&self) -> &HashSet<String> {
        &self.src_ips
    }

    /// 목적지 IP 허용 목록
    pub fn dst_ips(&self) -> &HashSet<String> {
        &self.dst_ips
    }

    /// 출발지 포트 제약
    pub fn src_port(&self) -> Option<u32> {
        self.src_port
    }

    /// 목적지 포트 제약
    pub fn dst_port(&self) -> Option<u32> {
        self.dst_port
    }

    /// 프로토콜 제약
    pub fn protocol(&self) -> Option<u32> {
        self.protocol
    }

    /// 설정된 제약이 하나도 없는지 확인합니다.
    pub fn is_unconstrained(&self) -> bool {
        self.src_ips.is_empty()
            && self.dst_ips.is_empty()
            && self.src_port.is_none()
            && self.dst_port.is_none()
            && self.protocol.is_none()
    }
}
