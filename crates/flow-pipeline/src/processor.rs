//! 라인 처리기 -- 파서, 필터, 집계기를 한 줄 단위로 연결
//!
//! [`LineProcessor`]는 입력 줄마다 다음 순서로 처리합니다:
//!
//! ```text
//! line -> tokenize -> RecordParser -> RecordFilter -> RecordSink (+ ConnectionAggregator)
//!            |              |               |
//!         blank skip   warn! + 거부     trace! + 제외
//! ```
//!
//! 한 줄을 완전히 처리한 뒤 다음 줄로 넘어갑니다. 집계 테이블은 처리기가 단독으로 소유합니다.
//! 거부된 레코드는 진단 로그만 남기고 처리를 중단하지 않습니다.
//! 출력(sink) 실패만 호출자에게 에러로 전파됩니다.

use metrics::counter;
use serde::Serialize;
use tracing::{debug, trace, warn};

use flowlog_core::error::RecordError;
use flowlog_core::metrics as m;
use flowlog_core::pipeline::RecordSink;
use flowlog_core::types::ConnectionKey;

use crate::aggregator::ConnectionAggregator;
use crate::config::ProcessorConfig;
use crate::error::FlowPipelineError;
use crate::filter::{Constraint, RecordFilter};
use crate::parser::{RecordParser, tokenize};

/// 한 줄의 처리 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    /// 공백만 있는 줄 (조용히 건너뜀)
    Blank,
    /// 파서가 거부한 줄
    Rejected(RecordError),
    /// 필터 제약에 걸린 줄
    FilteredOut(Constraint),
    /// 필터를 통과하여 sink로 전달된 줄
    Matched,
}

/// 실행 통계
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProcessingStats {
    /// 읽은 전체 줄 수 (빈 줄 포함)
    pub lines_read: u64,
    /// 건너뛴 빈 줄 수
    pub blank_lines: u64,
    /// 필드 수 부족으로 거부된 줄 수
    pub malformed: u64,
    /// IP 검증 실패로 거부된 줄 수
    pub invalid_address: u64,
    /// 필터에서 제외된 줄 수
    pub filtered_out: u64,
    /// 필터를 통과한 줄 수
    pub matched: u64,
}

impl ProcessingStats {
    /// 파서가 거부한 줄 수
    pub fn rejected(&self) -> u64 {
        self.malformed + self.invalid_address
    }
}

/// 처리 종료 시 반환되는 결과
#[derive(Debug, Clone)]
pub struct ProcessingSummary {
    /// 실행 통계
    pub stats: ProcessingStats,
    /// 연결 집계 결과. 집계가 비활성화되어 있으면 `None`입니다.
    pub connections: Option<ConnectionAggregator>,
}

impl ProcessingSummary {
    /// 리포트용 연결 집계. 집계가 꺼져 있거나 기록된 키가 없으면 `None`입니다.
    pub fn connection_report(&self) -> Option<Vec<(ConnectionKey, u64)>> {
        self.connections
            .as_ref()
            .filter(|agg| !agg.is_empty())
            .map(ConnectionAggregator::sorted_snapshot)
    }
}

/// 라인 처리기
pub struct LineProcessor {
    parser: RecordParser,
    filter: RecordFilter,
    aggregator: Option<ConnectionAggregator>,
    stats: ProcessingStats,
}

impl LineProcessor {
    /// 검증된 설정으로 처리기를 생성합니다.
    pub fn new(config: ProcessorConfig) -> Self {
        debug!(
            layout = %config.layout,
            unconstrained = config.criteria.is_unconstrained(),
            count_connections = config.count_connections,
            "line processor created"
        );
        Self {
            parser: RecordParser::new(config.layout),
            filter: RecordFilter::new(config.criteria),
            aggregator: config.count_connections.then(ConnectionAggregator::new),
            stats: ProcessingStats::default(),
        }
    }

    /// 현재까지의 통계
    pub fn stats(&self) -> &ProcessingStats {
        &self.stats
    }

    /// 현재까지의 집계 결과. 집계가 비활성화되어 있으면 `None`입니다.
    pub fn aggregator(&self) -> Option<&ConnectionAggregator> {
        self.aggregator.as_ref()
    }

    /// 한 줄을 처리합니다.
    ///
    /// 필터를 통과한 레코드는 `sink`로 전달되고, 집계가 켜져 있으면 연결 키가 기록됩니다.
    ///
    /// # Errors
    /// sink가 레코드를 받지 못하면 [`FlowPipelineError::Sink`]를 반환합니다.
    /// 이 경우 해당 줄은 집계되지 않습니다.
    pub fn process_line<S>(
        &mut self,
        line: &str,
        sink: &mut S,
    ) -> Result<LineOutcome, FlowPipelineError>
    where
        S: RecordSink + ?Sized,
    {
        self.stats.lines_read += 1;
        counter!(m::LINES_READ_TOTAL).increment(1);
        let line_no = self.stats.lines_read;

        let tokens = tokenize(line);
        if tokens.is_empty() {
            self.stats.blank_lines += 1;
            return Ok(LineOutcome::Blank);
        }

        let record = match self.parser.parse(&tokens, line) {
            Ok(record) => record,
            Err(err) => {
                match err {
                    RecordError::MalformedLine { .. } => self.stats.malformed += 1,
                    RecordError::InvalidAddress { .. } => self.stats.invalid_address += 1,
                }
                counter!(m::RECORDS_REJECTED_TOTAL, m::LABEL_REASON => err.reason()).increment(1);
                warn!(
                    line_no,
                    line,
                    reason = err.reason(),
                    error = %err,
                    "skipping flow log record"
                );
                return Ok(LineOutcome::Rejected(err));
            }
        };

        if let Some(constraint) = self.filter.first_mismatch(&record) {
            self.stats.filtered_out += 1;
            counter!(m::RECORDS_FILTERED_TOTAL).increment(1);
            trace!(line_no, %constraint, "record filtered out");
            return Ok(LineOutcome::FilteredOut(constraint));
        }

        sink.accept(&record).map_err(FlowPipelineError::Sink)?;

        self.stats.matched += 1;
        counter!(m::RECORDS_MATCHED_TOTAL).increment(1);
        if let Some(aggregator) = self.aggregator.as_mut() {
            aggregator.record(record.connection_key());
        }

        Ok(LineOutcome::Matched)
    }

    /// 여러 줄을 순서대로 처리합니다. sink 에러가 나면 즉시 중단합니다.
    pub fn process_lines<I, S>(&mut self, lines: I, sink: &mut S) -> Result<(), FlowPipelineError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        S: RecordSink + ?Sized,
    {
        for line in lines {
            self.process_line(line.as_ref(), sink)?;
        }
        Ok(())
    }

    /// 처리를 종료하고 통계와 집계 결과를 반환합니다.
    pub fn finish(self) -> ProcessingSummary {
        debug!(
            lines_read = self.stats.lines_read,
            matched = self.stats.matched,
            rejected = self.stats.rejected(),
            filtered_out = self.stats.filtered_out,
            "line processor finished"
        );
        ProcessingSummary {
            stats: self.stats,
            connections: self.aggregator,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowlog_core::error::{AddressField, FlowLogError};
    use flowlog_core::types::{FieldLayout, FilterCriteria, ParsedRecord};

    use crate::config::ProcessorConfigBuilder;

    const LINE_A: &str =
        "2 123456789012 eni-abc123 10.0.0.1 192.168.0.1 12345 80 6 10 100 1617690000 1617690060 ACCEPT OK";
    const LINE_B: &str =
        "2 123456789012 eni-abc123 10.0.0.2 192.168.0.1 23456 443 6 10 100 1617690000 1617690060 ACCEPT OK";

    fn processor(criteria: FilterCriteria, count: bool) -> LineProcessor {
        let config = ProcessorConfigBuilder::new()
            .criteria(criteria)
            .count_connections(count)
            .build()
            .unwrap();
        LineProcessor::new(config)
    }

    struct FailingSink;

    impl RecordSink for FailingSink {
        fn accept(&mut self, _record: &ParsedRecord) -> Result<(), FlowLogError> {
            Err(FlowLogError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "closed",
            )))
        }
    }

    #[test]
    fn matched_line_reaches_sink() {
        let mut p = processor(FilterCriteria::new(), false);
        let mut out = Vec::new();
        let outcome = p.process_line(LINE_A, &mut out).unwrap();
        assert_eq!(outcome, LineOutcome::Matched);
        assert_eq!(out, vec![LINE_A.to_owned()]);
        assert!(p.aggregator().is_none());
    }

    #[test]
    fn blank_lines_are_skipped_silently() {
        let mut p = processor(FilterCriteria::new(), true);
        let mut out = Vec::new();
        assert_eq!(p.process_line("", &mut out).unwrap(), LineOutcome::Blank);
        assert_eq!(p.process_line("  \t ", &mut out).unwrap(), LineOutcome::Blank);

        let summary = p.finish();
        assert_eq!(summary.stats.lines_read, 2);
        assert_eq!(summary.stats.blank_lines, 2);
        assert_eq!(summary.stats.malformed, 0);
        assert!(out.is_empty());
    }

    #[test]
    fn rejections_are_counted_by_reason() {
        let mut p = processor(FilterCriteria::new(), false);
        let mut out = Vec::new();

        let outcome = p.process_line("2 123456789012 eni-abc123", &mut out).unwrap();
        assert!(matches!(outcome, LineOutcome::Rejected(RecordError::MalformedLine { .. })));

        let bad_ip = LINE_A.replace("10.0.0.1", "10.0.0");
        let outcome = p.process_line(&bad_ip, &mut out).unwrap();
        assert!(matches!(
            outcome,
            LineOutcome::Rejected(RecordError::InvalidAddress {
                field: AddressField::Source,
                ..
            })
        ));

        let stats = *p.stats();
        assert_eq!(stats.malformed, 1);
        assert_eq!(stats.invalid_address, 1);
        assert_eq!(stats.rejected(), 2);
        assert!(out.is_empty());
    }

    #[test]
    fn rejection_does_not_halt_processing() {
        let mut p = processor(FilterCriteria::new(), false);
        let mut out = Vec::new();
        p.process_lines(["garbage", LINE_A, "x y z", LINE_B], &mut out)
            .unwrap();
        assert_eq!(out, vec![LINE_A.to_owned(), LINE_B.to_owned()]);
        assert_eq!(p.stats().malformed, 2);
    }

    #[test]
    fn filtered_line_reports_constraint() {
        let mut p = processor(FilterCriteria::new().with_dst_port(Some(443)), true);
        let mut out = Vec::new();
        let outcome = p.process_line(LINE_A, &mut out).unwrap();
        assert_eq!(outcome, LineOutcome::FilteredOut(Constraint::DstPort));
        assert!(out.is_empty());

        let summary = p.finish();
        assert_eq!(summary.stats.filtered_out, 1);
        assert!(summary.connection_report().is_none());
    }

    #[test]
    fn src_ip_filter_with_counting() {
        let mut p = processor(FilterCriteria::new().with_src_ips(["10.0.0.1"]), true);
        let mut out = Vec::new();
        p.process_lines([LINE_A, LINE_B], &mut out).unwrap();

        assert_eq!(out, vec![LINE_A.to_owned()]);
        let report = p.finish().connection_report().unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(
            report[0],
            (
                ConnectionKey::new("10.0.0.1", "192.168.0.1", "12345", "80", "6"),
                1
            )
        );
    }

    #[test]
    fn counting_disabled_yields_no_report() {
        let mut p = processor(FilterCriteria::new(), false);
        let mut out = Vec::new();
        p.process_lines([LINE_A, LINE_A], &mut out).unwrap();
        let summary = p.finish();
        assert!(summary.connections.is_none());
        assert!(summary.connection_report().is_none());
        assert_eq!(summary.stats.matched, 2);
    }

    #[test]
    fn sink_failure_is_propagated_and_not_counted() {
        let mut p = processor(FilterCriteria::new(), true);
        let err = p.process_line(LINE_A, &mut FailingSink).unwrap_err();
        assert!(matches!(err, FlowPipelineError::Sink(FlowLogError::Io(_))));
        assert_eq!(p.stats().matched, 0);
        assert!(p.aggregator().is_some_and(ConnectionAggregator::is_empty));
    }

    #[test]
    fn custom_layout_is_used() {
        let config = ProcessorConfigBuilder::new()
            .layout(FieldLayout::new(0, 1, 2, 3, 4))
            .criteria(FilterCriteria::new().with_protocol(Some(17)))
            .build()
            .unwrap();
        let mut p = LineProcessor::new(config);
        let mut out = Vec::new();
        p.process_lines(["10.0.0.1 10.0.0.2 53 5353 17", "10.0.0.1 10.0.0.2 53 5353 6"], &mut out)
            .unwrap();
        assert_eq!(out, vec!["10.0.0.1 10.0.0.2 53 5353 17".to_owned()]);
    }

    #[test]
    fn stats_serialize_to_json() {
        let stats = ProcessingStats {
            lines_read: 3,
            matched: 1,
            ..Default::default()
        };
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["lines_read"], 3);
        assert_eq!(json["matched"], 1);
        assert_eq!(json["blank_lines"], 0);
    }
}
