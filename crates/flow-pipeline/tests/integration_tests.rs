//! 통합 테스트 -- 설정부터 집계까지 전체 흐름 검증
//!
//! core 설정을 파이프라인 설정으로 변환하고, 라인 처리기로 여러 줄을 처리한 뒤
//! 출력 줄과 연결 집계 결과를 확인합니다.

use flowlog_core::config::FlowLogConfig;
use flowlog_core::error::{FlowLogError, RecordError};
use flowlog_core::pipeline::RecordSink;
use flowlog_core::types::{ConnectionKey, FilterCriteria, ParsedRecord};
use flowlog_pipeline::{
    FlowPipelineError, LineOutcome, LineProcessor, ProcessorConfig, ProcessorConfigBuilder,
};

fn flow_line(src: &str, dst: &str, src_port: u32, dst_port: u32, protocol: u32) -> String {
    format!(
        "2 123456789012 eni-abc123 {src} {dst} {src_port} {dst_port} {protocol} 10 100 1617690000 1617690060 ACCEPT OK"
    )
}

/// 레코드 전체를 보관하는 sink
#[derive(Default)]
struct CollectingSink {
    records: Vec<ParsedRecord>,
}

impl RecordSink for CollectingSink {
    fn accept(&mut self, record: &ParsedRecord) -> Result<(), FlowLogError> {
        self.records.push(record.clone());
        Ok(())
    }
}

/// 출발지 IP 필터 + 집계: 일치 1줄, 불일치 1줄
#[test]
fn test_src_ip_filter_emits_one_line_and_one_count() {
    let matching = flow_line("10.0.0.1", "192.168.0.1", 12345, 80, 6);
    let other = flow_line("10.0.0.2", "192.168.0.1", 12345, 80, 6);

    let config = ProcessorConfigBuilder::new()
        .criteria(FilterCriteria::new().with_src_ips(["10.0.0.1"]))
        .count_connections(true)
        .build()
        .expect("valid config");
    let mut processor = LineProcessor::new(config);
    let mut emitted: Vec<String> = Vec::new();
    processor
        .process_lines([&matching, &other], &mut emitted)
        .expect("processing should succeed");

    assert_eq!(emitted, vec![matching]);

    let summary = processor.finish();
    let report = summary.connection_report().expect("one key recorded");
    assert_eq!(report.len(), 1);
    assert_eq!(
        report[0].0,
        ConnectionKey::new("10.0.0.1", "192.168.0.1", "12345", "80", "6")
    );
    assert_eq!(report[0].1, 1);
}

/// 두 키를 N, M번 섞어서 처리하면 정확히 두 항목 {A: N, B: M}
#[test]
fn test_interleaved_keys_aggregate_separately() {
    let (n, m) = (5usize, 3usize);
    let a = flow_line("10.0.0.1", "192.168.0.1", 1000, 80, 6);
    let b = flow_line("10.0.0.2", "192.168.0.2", 2000, 53, 17);

    let mut lines = Vec::new();
    for i in 0..n.max(m) {
        if i < n {
            lines.push(a.clone());
        }
        if i < m {
            lines.push(b.clone());
        }
    }

    let config = ProcessorConfigBuilder::new()
        .count_connections(true)
        .build()
        .expect("valid config");
    let mut processor = LineProcessor::new(config);
    let mut emitted: Vec<String> = Vec::new();
    processor.process_lines(&lines, &mut emitted).unwrap();

    let summary = processor.finish();
    let agg = summary.connections.expect("counting enabled");
    assert_eq!(agg.len(), 2);
    assert_eq!(
        agg.count(&ConnectionKey::new("10.0.0.1", "192.168.0.1", "1000", "80", "6")),
        n as u64
    );
    assert_eq!(
        agg.count(&ConnectionKey::new("10.0.0.2", "192.168.0.2", "2000", "53", "17")),
        m as u64
    );
    assert_eq!(emitted.len(), n + m);
}

/// 잘못된 줄이 섞여 있어도 처리는 계속되고 통계에 사유별로 기록된다
#[test]
fn test_mixed_input_statistics() {
    let lines = [
        flow_line("10.0.0.1", "192.168.0.1", 12345, 80, 6),
        String::new(),
        "2 123456789012 eni-abc123".to_owned(),
        flow_line("10.0.0.1", "192.168.0.256", 12345, 80, 6),
        flow_line("10.0.0.1", "192.168.0.1", 12345, 443, 6),
        "2 123456789012 eni-abc123 10.0.0.1 192.168.0.1 - - - 0 0 0 0 NODATA SKIPDATA".to_owned(),
        "   ".to_owned(),
    ];

    let config = ProcessorConfigBuilder::new()
        .criteria(FilterCriteria::new().with_dst_port(Some(80)))
        .build()
        .unwrap();
    let mut processor = LineProcessor::new(config);
    let mut sink = CollectingSink::default();

    let outcomes: Vec<LineOutcome> = lines
        .iter()
        .map(|line| processor.process_line(line, &mut sink).unwrap())
        .collect();

    assert_eq!(outcomes[0], LineOutcome::Matched);
    assert_eq!(outcomes[1], LineOutcome::Blank);
    assert!(matches!(
        outcomes[2],
        LineOutcome::Rejected(RecordError::MalformedLine { .. })
    ));
    assert!(matches!(
        outcomes[3],
        LineOutcome::Rejected(RecordError::InvalidAddress { .. })
    ));
    assert!(matches!(outcomes[4], LineOutcome::FilteredOut(_)));
    assert!(matches!(outcomes[5], LineOutcome::FilteredOut(_)));

    let stats = processor.finish().stats;
    assert_eq!(stats.lines_read, 7);
    assert_eq!(stats.blank_lines, 2);
    assert_eq!(stats.malformed, 1);
    assert_eq!(stats.invalid_address, 1);
    assert_eq!(stats.filtered_out, 2);
    assert_eq!(stats.matched, 1);

    assert_eq!(sink.records.len(), 1);
    assert_eq!(sink.records[0].dst_port(), "80");
}

/// TOML 설정 문자열에서 처리기까지
#[test]
fn test_config_to_processor_flow() {
    let toml = r#"
[layout]
src_ip_index = 0
dst_ip_index = 1
src_port_index = 2
dst_port_index = 3
protocol_index = 4

[filter]
dst_ips = ["10.0.0.53"]
protocol = 17
count_connections = true
"#;
    let core = FlowLogConfig::parse(toml).expect("valid toml");
    let config = ProcessorConfig::from_core(&core).expect("valid processor config");
    let mut processor = LineProcessor::new(config);
    let mut emitted: Vec<String> = Vec::new();

    processor
        .process_lines(
            [
                "10.0.0.7 10.0.0.53 40000 53 17",
                "10.0.0.7 10.0.0.53 40001 53 6",
                "10.0.0.8 10.0.0.54 40002 53 17",
                "10.0.0.7 10.0.0.53 40000 53 17",
            ],
            &mut emitted,
        )
        .unwrap();

    assert_eq!(emitted.len(), 2);
    let report = processor.finish().connection_report().unwrap();
    assert_eq!(report.len(), 1);
    assert_eq!(report[0].1, 2);
}

/// 허용 목록에 IPv4가 아닌 값이 있으면 처리 전에 설정 에러
#[test]
fn test_invalid_allow_set_rejected_before_processing() {
    let toml = r#"
[filter]
src_ips = ["10.0.0.1", "not-an-ip"]
"#;
    let core = FlowLogConfig::parse(toml).expect("valid toml");
    let err = ProcessorConfig::from_core(&core).unwrap_err();
    assert!(matches!(err, FlowPipelineError::Config { .. }));

    let top: FlowLogError = err.into();
    assert!(top.to_string().contains("not-an-ip"));
}

/// 집계가 꺼져 있으면 일치하는 줄이 있어도 리포트가 없다
#[test]
fn test_counting_disabled_has_no_report() {
    let mut processor = LineProcessor::new(ProcessorConfig::default());
    let mut emitted: Vec<String> = Vec::new();
    processor
        .process_lines([flow_line("10.0.0.1", "10.0.0.2", 1, 2, 6)], &mut emitted)
        .unwrap();

    assert_eq!(emitted.len(), 1);
    assert!(processor.finish().connection_report().is_none());
}
