#![no_main]

use flowlog_pipeline::ipv4::is_ipv4;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // 통과한 토큰은 네 개의 0-255 10진수 그룹이어야 한다
    if is_ipv4(data) {
        let groups: Vec<&str> = data.split('.').collect();
        assert_eq!(groups.len(), 4);
        for group in groups {
            assert!(group.bytes().all(|b| b.is_ascii_digit()));
            assert!(group.parse::<u64>().is_ok_and(|v| v <= 255));
        }
    }
});
