#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use flowlog_core::types::{FieldLayout, FilterCriteria};
use flowlog_pipeline::{LineProcessor, ProcessorConfigBuilder};

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    /// 필드 위치 (작은 범위로 제한)
    indices: [u8; 5],
    src_port: Option<u16>,
    dst_port: Option<u16>,
    protocol: Option<u8>,
    count_connections: bool,
    /// 입력 줄 (최대 64개로 제한)
    lines: Vec<String>,
}

fuzz_target!(|input: FuzzInput| {
    let [src, dst, sport, dport, proto] = input.indices.map(|i| usize::from(i % 32));
    let criteria = FilterCriteria::new()
        .with_src_port(input.src_port.map(u32::from))
        .with_dst_port(input.dst_port.map(u32::from))
        .with_protocol(input.protocol.map(u32::from));

    let Ok(config) = ProcessorConfigBuilder::new()
        .layout(FieldLayout::new(src, dst, sport, dport, proto))
        .criteria(criteria)
        .count_connections(input.count_connections)
        .build()
    else {
        return;
    };

    let mut processor = LineProcessor::new(config);
    let mut out: Vec<String> = Vec::new();
    let lines = input.lines.iter().take(64);
    if processor.process_lines(lines, &mut out).is_err() {
        return;
    }

    let summary = processor.finish();
    let stats = summary.stats;
    assert_eq!(
        stats.lines_read,
        stats.blank_lines + stats.malformed + stats.invalid_address + stats.filtered_out + stats.matched
    );
    assert_eq!(out.len() as u64, stats.matched);
    if let Some(agg) = summary.connections {
        assert_eq!(agg.total(), stats.matched);
    }
});
