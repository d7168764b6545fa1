//! Grouping primitives shared by every view builder.
//!
//! Groups keep the order in which each key was first seen. Nothing here
//! sorts, so callers get deterministic output for a given input order.

use std::collections::HashMap;
use std::hash::Hash;

use crate::error::{ReportError, Result};
use crate::types::VisitRecord;

/// How values sharing a key are combined.
///
/// Most views sum counts. The heatmap takes the maximum instead, so the rule
/// is always passed explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    Sum,
    Max,
}

impl Aggregation {
    fn combine(self, acc: u64, value: u64) -> Option<u64> {
        match self {
            Aggregation::Sum => acc.checked_add(value),
            Aggregation::Max => Some(acc.max(value)),
        }
    }
}

/// Aggregated values in first-occurrence key order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grouped<K> {
    entries: Vec<(K, u64)>,
}

impl<K: PartialEq> Grouped<K> {
    pub fn get(&self, key: &K) -> Option<u64> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| *v)
    }
}

impl<K> Grouped<K> {
    pub fn iter(&self) -> impl Iterator<Item = (&K, u64)> {
        self.entries.iter().map(|(k, v)| (k, *v))
    }

    pub fn entries(&self) -> &[(K, u64)] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<(K, u64)> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> Result<u64> {
        checked_total(self.entries.iter().map(|(_, v)| *v), "group totals")
    }
}

/// Sum `values`, failing instead of wrapping or clamping.
pub fn checked_total<I>(values: I, what: &'static str) -> Result<u64>
where
    I: IntoIterator<Item = u64>,
{
    values
        .into_iter()
        .try_fold(0u64, |acc, v| acc.checked_add(v))
        .ok_or(ReportError::CountOverflow(what))
}

/// Group `rows` by `key`, combining `value` under `rule`.
///
/// A sum that no longer fits in `u64` is an error; totals are never clamped.
pub fn group_by<T, K, F, V>(rows: &[T], key: F, value: V, rule: Aggregation) -> Result<Grouped<K>>
where
    K: Eq + Hash + Clone,
    F: Fn(&T) -> K,
    V: Fn(&T) -> u64,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut entries: Vec<(K, u64)> = Vec::new();
    for row in rows {
        let k = key(row);
        let v = value(row);
        match index.get(&k) {
            Some(&i) => {
                entries[i].1 = rule
                    .combine(entries[i].1, v)
                    .ok_or(ReportError::CountOverflow("grouped rows"))?;
            }
            None => {
                index.insert(k.clone(), entries.len());
                entries.push((k, v));
            }
        }
    }
    tracing::debug!(rows = rows.len(), groups = entries.len(), ?rule, "grouped rows");
    Ok(Grouped { entries })
}

pub fn group_sum<T, K, F, V>(rows: &[T], key: F, value: V) -> Result<Grouped<K>>
where
    K: Eq + Hash + Clone,
    F: Fn(&T) -> K,
    V: Fn(&T) -> u64,
{
    group_by(rows, key, value, Aggregation::Sum)
}

/// Rows recorded in `year`. An empty result is a normal outcome.
pub fn filter_by_year(rows: &[VisitRecord], year: i32) -> Vec<VisitRecord> {
    rows.iter().filter(|r| r.year == year).cloned().collect()
}

/// Distinct years, latest-seen first: first-occurrence order, reversed.
pub fn available_years(rows: &[VisitRecord]) -> Vec<i32> {
    let mut years: Vec<i32> = Vec::new();
    for r in rows {
        if !years.contains(&r.year) {
            years.push(r.year);
        }
    }
    years.reverse();
    years
}
