#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`ipv4`]: 점으로 구분된 10진수 IPv4 주소 검증
//! - [`parser`]: 토큰화된 줄을 필드 레이아웃에 따라 레코드로 변환
//! - [`filter`]: 출발지/목적지 IP 허용 목록, 포트, 프로토콜 제약 평가
//! - [`aggregator`]: 연결 식별자(5-tuple)별 발생 횟수 집계
//! - [`processor`]: 한 줄 단위 처리 오케스트레이션 및 실행 통계
//! - [`config`]: 처리기 설정 (core 설정 검증 및 변환)
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! lines -> LineProcessor -> RecordParser -> RecordFilter -> RecordSink
//!                                                  |
//!                                        ConnectionAggregator
//! ```

pub mod aggregator;
pub mod config;
pub mod error;
pub mod filter;
pub mod ipv4;
pub mod parser;
pub mod processor;

// --- 주요 타입 re-export ---

// 처리기
pub use processor::{LineOutcome, LineProcessor, ProcessingStats, ProcessingSummary};

// 설정
pub use config::{ProcessorConfig, ProcessorConfigBuilder};

// 에러
pub use error::FlowPipelineError;

// 파서 / 검증
pub use ipv4::is_ipv4;
pub use parser::{RecordParser, tokenize};

// 필터
pub use filter::{Constraint, RecordFilter};

// 집계
pub use aggregator::ConnectionAggregator;
