//! 파이프라인 trait -- 모듈 확장 포인트 정의

use crate::error::FlowLogError;
use crate::types::ParsedRecord;

/// 필터를 통과한 레코드를 받는 출력 trait
///
/// 출력 방식(콘솔, JSON 리포트, 테스트용 수집기 등)을 추가하려면 이 trait을 구현합니다.
pub trait RecordSink {
    /// 통과한 레코드 하나를 내보냅니다.
    fn accept(&mut self, record: &ParsedRecord) -> Result<(), FlowLogError>;
}

/// 통과한 원본 줄을 순서대로 모으는 sink
impl RecordSink for Vec<String> {
    fn accept(&mut self, record: &ParsedRecord) -> Result<(), FlowLogError> {
        self.push(record.raw().to_owned());
        Ok(())
    }
}
