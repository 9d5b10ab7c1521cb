#![no_main]

use flowlog_core::types::FieldLayout;
use flowlog_pipeline::ipv4::is_ipv4;
use flowlog_pipeline::parser::RecordParser;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(line) = std::str::from_utf8(data) else {
        return;
    };
    let parser = RecordParser::new(FieldLayout::default());

    // 크래시나 패닉 없이 Ok 또는 Err을 반환해야 한다
    if let Ok(record) = parser.parse_line(line) {
        assert!(is_ipv4(record.src_ip()));
        assert!(is_ipv4(record.dst_ip()));
        assert_eq!(record.raw(), line);
    }
});
