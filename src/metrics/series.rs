//! Newest-first historical series and the positional alignment rule.
//!
//! Every history array of one record is indexed by the same provider
//! ordering: position `i` is the i-th most recent reporting period. Two
//! series are paired position by position after truncation to the shorter
//! length, counted from the newest end. A longer series never shifts the
//! other one.

use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Series(Vec<Option<f64>>);

impl Series {
    pub fn new(values: Vec<Option<f64>>) -> Self {
        Self(
            values
                .into_iter()
                .map(|value| value.filter(|v| v.is_finite()))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Period `index` counted from the newest (0 = latest).
    pub fn get(&self, index: usize) -> Option<f64> {
        self.0.get(index).copied().flatten()
    }

    pub fn oldest(&self) -> Option<f64> {
        self.0.last().copied().flatten()
    }

    pub fn defined(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().filter_map(|value| *value)
    }
}

impl From<Vec<f64>> for Series {
    fn from(values: Vec<f64>) -> Self {
        Self::new(values.into_iter().map(Some).collect())
    }
}

/// Pairs two series period by period over `min(len(a), len(b))` positions.
pub fn aligned<'a>(
    a: &'a Series,
    b: &'a Series,
) -> impl Iterator<Item = (Option<f64>, Option<f64>)> + 'a {
    let len = a.len().min(b.len());
    if a.len() != b.len() {
        debug!(
            left = a.len(),
            right = b.len(),
            used = len,
            "history length mismatch, truncating to shared periods"
        );
    }
    (0..len).map(move |index| (a.get(index), b.get(index)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aligned_truncates_to_the_shorter_series_from_the_newest_end() {
        let a = Series::from(vec![10.0, 20.0, 30.0, 40.0]);
        let b = Series::from(vec![1.0, 2.0]);
        let pairs: Vec<_> = aligned(&a, &b).collect();
        assert_eq!(pairs, vec![(Some(10.0), Some(1.0)), (Some(20.0), Some(2.0))]);
    }

    #[test]
    fn non_finite_entries_become_undefined() {
        let series = Series::new(vec![Some(1.0), Some(f64::INFINITY), None]);
        assert_eq!(series.len(), 3);
        assert_eq!(series.get(1), None);
        assert_eq!(series.defined().collect::<Vec<_>>(), vec![1.0]);
        assert_eq!(series.oldest(), None);
    }
}
