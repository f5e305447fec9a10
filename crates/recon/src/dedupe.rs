use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use crate::model::{ErpRecord, LinkageRecord, WebRecord};

/// A record set in which every key occurs at most once.
///
/// Only [`dedupe`] constructs one, so anything holding a `KeyedSet` can
/// build a lookup map from it without fan-out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyedSet<T> {
    records: Vec<T>,
    before: usize,
}

impl<T> KeyedSet<T> {
    /// Surviving records, ascending by key.
    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn into_records(self) -> Vec<T> {
        self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Input count handed to [`dedupe`].
    pub fn before(&self) -> usize {
        self.before
    }

    pub fn after(&self) -> usize {
        self.records.len()
    }

    pub fn duplicates_removed(&self) -> usize {
        self.before - self.records.len()
    }
}

impl<'a, T> IntoIterator for &'a KeyedSet<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Keep one record per key: the one with the lowest `rank_fn` value.
/// Equal ranks go to the record seen first, so the result depends only on
/// input order, never on hashing. Output is ascending by key.
pub fn dedupe<T, K, R>(
    records: impl IntoIterator<Item = T>,
    key_fn: impl Fn(&T) -> K,
    rank_fn: impl Fn(&T) -> R,
) -> KeyedSet<T>
where
    K: Ord,
    R: Ord,
{
    let mut best: BTreeMap<K, (R, T)> = BTreeMap::new();
    let mut before = 0;

    for record in records {
        before += 1;
        let rank = rank_fn(&record);
        match best.entry(key_fn(&record)) {
            Entry::Vacant(slot) => {
                slot.insert((rank, record));
            }
            Entry::Occupied(mut slot) => {
                // Strict: an equal rank never displaces the earlier row.
                if rank < slot.get().0 {
                    slot.insert((rank, record));
                }
            }
        }
    }

    KeyedSet {
        records: best.into_values().map(|(_, r)| r).collect(),
        before,
    }
}

/// ERP: first row per `product_id` wins.
pub fn dedupe_erp(records: Vec<ErpRecord>) -> KeyedSet<ErpRecord> {
    dedupe(records, |r| r.product_id, |_| ())
}

/// Linkage: a resolved `id_web` beats an unresolved one, then first row wins.
pub fn dedupe_linkage(records: Vec<LinkageRecord>) -> KeyedSet<LinkageRecord> {
    dedupe(records, |r| r.product_id, |r| r.id_web.is_none())
}

/// Web: first row per `id_web` wins.
pub fn dedupe_web(records: Vec<WebRecord>) -> KeyedSet<WebRecord> {
    dedupe(records, |r| r.id_web, |_| ())
}

/// Number of records whose key was already seen earlier in `records`.
pub fn count_duplicate_keys<T, K: Ord>(records: &[T], key_fn: impl Fn(&T) -> K) -> usize {
    let mut seen = std::collections::BTreeSet::new();
    records.iter().filter(|r| !seen.insert(key_fn(*r))).count()
}
