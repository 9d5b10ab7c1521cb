//! IPv4 dotted-quad 검증
//!
//! 토큰이 `.`으로 구분된 정확히 네 개의 10진수 그룹이고,
//! 각 그룹이 비어 있지 않으며 0-255 범위의 정수일 때만 유효합니다.
//!
//! # 앞자리 0 처리
//! 앞자리 0은 허용합니다 (`"010.0.0.1"`은 유효하며 첫 옥텟은 10).
//! 일반 정수 파싱과 같은 동작이며, 부호(`+`, `-`)와 공백은 허용하지 않습니다.
//! [`std::net::Ipv4Addr`]의 `FromStr`은 앞자리 0을 거부하므로 사용하지 않습니다.

/// IPv4 주소의 그룹 수
const OCTET_COUNT: usize = 4;

/// 토큰이 유효한 IPv4 dotted-quad 주소인지 확인합니다.
///
/// 부분 허용은 없습니다. 그룹 하나라도 파싱 또는 범위 검사에 실패하면 `false`입니다.
pub fn is_ipv4(token: &str) -> bool {
    let mut groups = 0;
    for group in token.split('.') {
        groups += 1;
        if groups > OCTET_COUNT || parse_octet(group).is_none() {
            return false;
        }
    }
    groups == OCTET_COUNT
}

/// 그룹 하나를 0-255 옥텟으로 파싱합니다.
fn parse_octet(group: &str) -> Option<u8> {
    if group.is_empty() || !group.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    group.parse::<u32>().ok().and_then(|n| u8::try_from(n).ok())
}
