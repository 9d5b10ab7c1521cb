//! 메트릭 상수
//!
//! 모든 메트릭의 이름을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()` 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `flowlog_`
//! - 접미어: `_total` (counter)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(flowlog_core::metrics::LINES_READ_TOTAL).increment(1);
//! ```

use metrics::{Unit, describe_counter};

/// 거부 사유 레이블 키 (malformed_line, invalid_address)
pub const LABEL_REASON: &str = "reason";

/// 읽은 전체 줄 수 (counter)
pub const LINES_READ_TOTAL: &str = "flowlog_lines_read_total";

/// 파서가 거부한 레코드 수 (counter, label: reason)
pub const RECORDS_REJECTED_TOTAL: &str = "flowlog_records_rejected_total";

/// 필터를 통과한 레코드 수 (counter)
pub const RECORDS_MATCHED_TOTAL: &str = "flowlog_records_matched_total";

/// 필터에서 제외된 레코드 수 (counter)
pub const RECORDS_FILTERED_TOTAL: &str = "flowlog_records_filtered_total";

/// 메트릭 설명을 등록합니다.
///
/// 레코더를 설치한 직후 한 번 호출합니다. 레코더가 없으면 아무 일도 하지 않습니다.
pub fn describe_metrics() {
    describe_counter!(LINES_READ_TOTAL, Unit::Count, "Total input lines read");
    describe_counter!(
        RECORDS_REJECTED_TOTAL,
        Unit::Count,
        "Records rejected by the parser, by reason"
    );
    describe_counter!(
        RECORDS_MATCHED_TOTAL,
        Unit::Count,
        "Records that passed every filter constraint"
    );
    describe_counter!(
        RECORDS_FILTERED_TOTAL,
        Unit::Count,
        "Records excluded by the filter"
    );
}
