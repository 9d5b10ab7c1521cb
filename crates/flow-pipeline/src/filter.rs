//! 필터 평가 -- 레코드가 모든 필터 조건을 만족하는지 판정
//!
//! [`RecordFilter`]는 [`FilterCriteria`]의 다섯 제약을 AND로 결합하여 평가합니다.
//! 설정되지 않은 제약(빈 허용 목록, `None`)은 항상 만족합니다.
//! 숫자 제약이 설정된 필드가 숫자가 아니면 에러가 아니라 "불일치"로 처리합니다.

use std::fmt;

use flowlog_core::types::{FilterCriteria, ParsedRecord};

/// 레코드를 통과시키지 못한 제약 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// 출발지 IP 허용 목록
    SrcIp,
    /// 목적지 IP 허용 목록
    DstIp,
    /// 출발지 포트
    SrcPort,
    /// 목적지 포트
    DstPort,
    /// 프로토콜
    Protocol,
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SrcIp => write!(f, "src_ip"),
            Self::DstIp => write!(f, "dst_ip"),
            Self::SrcPort => write!(f, "src_port"),
            Self::DstPort => write!(f, "dst_port"),
            Self::Protocol => write!(f, "protocol"),
        }
    }
}

/// 레코드 필터
///
/// 내부 상태를 변경하지 않으므로 같은 레코드에 대해 항상 같은 결과를 반환합니다.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    criteria: FilterCriteria,
}

impl RecordFilter {
    /// 필터 조건으로 필터를 생성합니다.
    pub fn new(criteria: FilterCriteria) -> Self {
        Self { criteria }
    }

    /// 필터 조건
    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    /// 레코드가 모든 제약을 만족하면 `true`를 반환합니다.
    pub fn matches(&self, record: &ParsedRecord) -> bool {
        self.first_mismatch(record).is_none()
    }

    /// 처음으로 실패한 제약을 반환합니다. 모두 만족하면 `None`입니다.
    ///
    /// 평가 순서: 출발지 IP, 목적지 IP, 출발지 포트, 목적지 포트, 프로토콜.
    /// 순서는 결과(통과 여부)에 영향을 주지 않습니다.
    pub fn first_mismatch(&self, record: &ParsedRecord) -> Option<Constraint> {
        let c = &self.criteria;

        if !c.src_ips().is_empty() && !c.src_ips().contains(record.src_ip()) {
            return Some(Constraint::SrcIp);
        }
        if !c.dst_ips().is_empty() && !c.dst_ips().contains(record.dst_ip()) {
            return Some(Constraint::DstIp);
        }
        if !numeric_matches(c.src_port(), record.src_port()) {
            return Some(Constraint::SrcPort);
        }
        if !numeric_matches(c.dst_port(), record.dst_port()) {
            return Some(Constraint::DstPort);
        }
        if !numeric_matches(c.protocol(), record.protocol()) {
            return Some(Constraint::Protocol);
        }

        None
    }
}

/// 숫자 제약을 평가합니다. 제약이 없으면 항상 만족합니다.
fn numeric_matches(expected: Option<u32>, field: &str) -> bool {
    match expected {
        None => true,
        Some(expected) => field.parse::<u32>().is_ok_and(|value| value == expected),
    }
}
