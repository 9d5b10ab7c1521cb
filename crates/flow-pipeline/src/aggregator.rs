//! 연결 집계 -- 연결 식별자(5-tuple)별 발생 횟수
//!
//! [`ConnectionAggregator`]는 한 실행 동안 필터를 통과한 레코드의 연결 키를 셉니다.
//! 단일 스레드에서 단일 소유자만 갱신합니다. 병렬 처리 시에는 파티션별로
//! 집계한 뒤 [`ConnectionAggregator::merge`]로 합칩니다.

use std::collections::HashMap;
use std::collections::hash_map;

use flowlog_core::types::ConnectionKey;

/// 연결 키별 발생 횟수 테이블
#[derive(Debug, Clone, Default)]
pub struct ConnectionAggregator {
    counts: HashMap<ConnectionKey, u64>,
}

impl ConnectionAggregator {
    /// 빈 집계기를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 키의 발생을 한 번 기록합니다.
    pub fn record(&mut self, key: ConnectionKey) {
        *self.counts.entry(key).or_insert(0) += 1;
    }

    /// 키의 현재 횟수. 기록된 적이 없으면 0입니다.
    pub fn count(&self, key: &ConnectionKey) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    /// 서로 다른 키의 수
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// 기록된 키가 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// 모든 키의 횟수 합
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// (키, 횟수) 순회. 순서는 정해져 있지 않습니다.
    pub fn iter(&self) -> hash_map::Iter<'_, ConnectionKey, u64> {
        self.counts.iter()
    }

    /// 다른 집계 결과를 합칩니다.
    pub fn merge(&mut self, other: ConnectionAggregator) {
        for (key, count) in other.counts {
            *self.counts.entry(key).or_insert(0) += count;
        }
    }

    /// 리포트용 스냅샷. 횟수 내림차순, 같은 횟수는 키 오름차순입니다.
    pub fn sorted_snapshot(&self) -> Vec<(ConnectionKey, u64)> {
        let mut entries: Vec<_> = self
            .counts
            .iter()
            .map(|(key, count)| (key.clone(), *count))
            .collect();
        entries.sort_by(|(ka, ca), (kb, cb)| cb.cmp(ca).then_with(|| ka.cmp(kb)));
        entries
    }
}

impl<'a> IntoIterator for &'a ConnectionAggregator {
    type Item = (&'a ConnectionKey, &'a u64);
    type IntoIter = hash_map::Iter<'a, ConnectionKey, u64>;

    fn into_iter(self) -> Self::IntoIter {
        self.counts.iter()
    }
}
