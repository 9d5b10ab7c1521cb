//! 플로우 로그 레코드 파서
//!
//! 공백으로 토큰화된 한 줄과 [`FieldLayout`]을 받아 [`ParsedRecord`]를 만들거나 거부합니다.
//!
//! # 레코드 형식 (AWS VPC flow log v2 기본 배치)
//! ```text
//! version account-id interface-id srcaddr dstaddr srcport dstport protocol packets bytes start end action log-status
//! ```
//!
//! # 사용 예시
//! ```
//! use flowlog_core::types::FieldLayout;
//! use flowlog_pipeline::parser::RecordParser;
//!
//! let parser = RecordParser::new(FieldLayout::default());
//! let line = "2 123456789012 eni-abc123 10.0.0.1 192.168.0.1 12345 80 6 10 100 1617690000 1617690060 ACCEPT OK";
//! let record = parser.parse_line(line).unwrap();
//! assert_eq!(record.dst_port(), "80");
//! ```

use flowlog_core::error::{AddressField, RecordError};
use flowlog_core::types::{FieldLayout, ParsedRecord};

use crate::ipv4::is_ipv4;

/// 줄을 연속된 공백 기준으로 토큰화합니다.
pub fn tokenize(line: &str) -> Vec<&str> {
    line.split_whitespace().collect()
}

/// 플로우 로그 레코드 파서
///
/// 상태가 없는 순수 함수이며, 레이아웃만 보관합니다.
/// 거부 시 진단 출력은 하지 않고 사유만 반환합니다.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordParser {
    layout: FieldLayout,
}

impl RecordParser {
    /// 레이아웃으로 파서를 생성합니다.
    pub fn new(layout: FieldLayout) -> Self {
        Self { layout }
    }

    /// 파서가 사용하는 레이아웃
    pub fn layout(&self) -> &FieldLayout {
        &self.layout
    }

    /// 원본 줄을 토큰화하여 파싱합니다.
    pub fn parse_line(&self, line: &str) -> Result<ParsedRecord, RecordError> {
        self.parse(&tokenize(line), line)
    }

    /// 토큰 시퀀스를 레코드로 변환합니다.
    ///
    /// 토큰 수가 레이아웃의 최대 인덱스보다 커야 하며, 두 IP 토큰이 모두 유효해야 합니다.
    /// 포트와 프로토콜은 검증 없이 그대로 저장합니다.
    ///
    /// # Errors
    /// - [`RecordError::MalformedLine`]: 토큰 수 부족 (빈 시퀀스 포함)
    /// - [`RecordError::InvalidAddress`]: 출발지 또는 목적지 IP가 IPv4 형식이 아님
    pub fn parse<S: AsRef<str>>(
        &self,
        tokens: &[S],
        raw: &str,
    ) -> Result<ParsedRecord, RecordError> {
        let required = self.layout.required_tokens();
        if tokens.len() < required {
            return Err(RecordError::MalformedLine {
                tokens: tokens.len(),
                required,
            });
        }

        let src_ip = field(tokens, self.layout.src_ip_index());
        let dst_ip = field(tokens, self.layout.dst_ip_index());

        if !is_ipv4(src_ip) {
            return Err(RecordError::InvalidAddress {
                field: AddressField::Source,
                value: src_ip.to_owned(),
            });
        }
        if !is_ipv4(dst_ip) {
            return Err(RecordError::InvalidAddress {
                field: AddressField::Destination,
                value: dst_ip.to_owned(),
            });
        }

        Ok(ParsedRecord::new(
            raw,
            src_ip,
            dst_ip,
            field(tokens, self.layout.src_port_index()),
            field(tokens, self.layout.dst_port_index()),
            field(tokens, self.layout.protocol_index()),
        ))
    }
}

/// 토큰 수 검사를 통과한 뒤에만 호출합니다.
fn field<S: AsRef<str>>(tokens: &[S], index: usize) -> &str {
    tokens[index].as_ref()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str =
        "2 123456789012 eni-abc123 10.0.0.1 192.168.0.1 12345 80 6 10 100 1617690000 1617690060 ACCEPT OK";

    fn parser() -> RecordParser {
        RecordParser::new(FieldLayout::default())
    }

    fn sample_with(src: &str, dst: &str) -> String {
        format!("2 123456789012 eni-abc123 {src} {dst} 12345 80 6 10 100 1617690000 1617690060 ACCEPT OK")
    }

    #[test]
    fn parses_default_layout() {
        let tokens = [
            "2",
            "123456789012",
            "eni-abc123",
            "10.0.0.1",
            "192.168.0.1",
            "12345",
            "80",
            "6",
            "10",
            "100",
            "1617690000",
            "1617690060",
            "ACCEPT",
            "OK",
        ];
        let record = parser().parse(&tokens, SAMPLE).unwrap();
        assert_eq!(record.src_ip(), "10.0.0.1");
        assert_eq!(record.dst_ip(), "192.168.0.1");
        assert_eq!(record.src_port(), "12345");
        assert_eq!(record.dst_port(), "80");
        assert_eq!(record.protocol(), "6");
        assert_eq!(record.raw(), SAMPLE);
    }

    #[test]
    fn parse_line_tokenizes_runs_of_whitespace() {
        let line = "2  123456789012\teni-abc123   10.0.0.1 192.168.0.1 12345 80 6";
        let record = parser().parse_line(line).unwrap();
        assert_eq!(record.src_ip(), "10.0.0.1");
        assert_eq!(record.protocol(), "6");
        assert_eq!(record.raw(), line);
    }

    #[test]
    fn empty_tokens_rejected() {
        let tokens: [&str; 0] = [];
        let err = parser().parse(&tokens, "").unwrap_err();
        assert_eq!(
            err,
            RecordError::MalformedLine {
                tokens: 0,
                required: 8
            }
        );
    }

    #[test]
    fn too_few_fields_rejected() {
        let err = parser().parse_line("2 123456789012 eni-abc123").unwrap_err();
        assert!(matches!(err, RecordError::MalformedLine { tokens: 3, .. }));
    }

    #[test]
    fn exactly_required_tokens_accepted() {
        let record = parser()
            .parse_line("2 123456789012 eni-abc123 10.0.0.1 192.168.0.1 12345 80 6")
            .unwrap();
        assert_eq!(record.protocol(), "6");
    }

    #[test]
    fn one_short_of_required_rejected() {
        let err = parser()
            .parse_line("2 123456789012 eni-abc123 10.0.0.1 192.168.0.1 12345 80")
            .unwrap_err();
        assert!(matches!(
            err,
            RecordError::MalformedLine {
                tokens: 7,
                required: 8
            }
        ));
    }

    #[test]
    fn invalid_source_ip_rejected() {
        let err = parser()
            .parse_line(&sample_with("not-an-ip", "192.168.0.1"))
            .unwrap_err();
        assert_eq!(
            err,
            RecordError::InvalidAddress {
                field: AddressField::Source,
                value: "not-an-ip".to_owned()
            }
        );
    }

    #[test]
    fn invalid_destination_ip_rejected() {
        let err = parser()
            .parse_line(&sample_with("10.0.0.1", "999.999.999.999"))
            .unwrap_err();
        assert!(matches!(
            err,
            RecordError::InvalidAddress {
                field: AddressField::Destination,
                ..
            }
        ));
    }

    #[test]
    fn invalid_ip_variants_rejected() {
        for src in ["256.0.0.1", "10.0.0", "10.0.0.1.5", "abc.def.ghi.jkl"] {
            let result = parser().parse_line(&sample_with(src, "192.168.0.1"));
            assert!(result.is_err(), "{src}");
        }
    }

    #[test]
    fn valid_ip_variants_accepted() {
        for (src, dst) in [
            ("0.0.0.0", "255.255.255.255"),
            ("192.168.1.1", "10.0.0.1"),
            ("172.16.0.1", "172.31.255.254"),
        ] {
            assert!(parser().parse_line(&sample_with(src, dst)).is_ok(), "{src} {dst}");
        }
    }

    #[test]
    fn field_count_checked_before_addresses() {
        let err = parser().parse_line("x y z not-an-ip").unwrap_err();
        assert!(matches!(err, RecordError::MalformedLine { .. }));
    }

    #[test]
    fn ports_and_protocol_kept_verbatim() {
        let line = "2 123456789012 eni-abc123 10.0.0.1 192.168.0.1 - http tcp";
        let record = parser().parse_line(line).unwrap();
        assert_eq!(record.src_port(), "-");
        assert_eq!(record.dst_port(), "http");
        assert_eq!(record.protocol(), "tcp");
    }

    #[test]
    fn custom_layout() {
        let layout = FieldLayout::new(0, 1, 2, 3, 4);
        let parser = RecordParser::new(layout);
        let record = parser.parse_line("10.0.0.1 10.0.0.2 53 5353 17").unwrap();
        assert_eq!(record.dst_ip(), "10.0.0.2");
        assert_eq!(record.dst_port(), "5353");
        assert_eq!(record.protocol(), "17");
    }

    #[test]
    fn custom_layout_with_sparse_indices() {
        let layout = FieldLayout::new(1, 0, 9, 9, 9);
        let parser = RecordParser::new(layout);
        assert!(parser.parse_line("10.0.0.2 10.0.0.1 a b c").is_err());
        let record = parser
            .parse_line("10.0.0.2 10.0.0.1 a b c d e f g 443")
            .unwrap();
        assert_eq!(record.src_ip(), "10.0.0.1");
        assert_eq!(record.src_port(), "443");
        assert_eq!(record.protocol(), "443");
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn short_token_sequences_always_rejected(tokens in prop::collection::vec("[!-~]{1,16}", 0..8)) {
                let result = parser().parse(&tokens, "");
                let is_malformed = matches!(result, Err(RecordError::MalformedLine { .. }));
                prop_assert!(is_malformed);
            }

            #[test]
            fn arbitrary_line_does_not_panic(line in ".{0,256}") {
                let _ = parser().parse_line(&line);
            }

            #[test]
            fn accepted_record_has_valid_addresses(tokens in prop::collection::vec("[0-9.]{1,15}", 8..16)) {
                if let Ok(record) = parser().parse(&tokens, "") {
                    prop_assert!(is_ipv4(record.src_ip()));
                    prop_assert!(is_ipv4(record.dst_ip()));
                }
            }
        }
    }
}
