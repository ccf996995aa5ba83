// Time series module
// Ordered timestamp -> value series produced by merging raw query results
//
// Numan Thabit 2025 Nov

use serde::Serialize;
use std::collections::BTreeMap;

/// Epoch-millisecond timestamps mapped to values, ascending and unique.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TimeSeries(BTreeMap<i64, f64>);

impl TimeSeries {
    /// Merge raw points in arrival order; a later duplicate timestamp
    /// overwrites the earlier value.
    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = (i64, f64)>,
    {
        Self(points.into_iter().collect())
    }

    pub fn get(&self, timestamp: i64) -> Option<f64> {
        self.0.get(&timestamp).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, f64)> + '_ {
        self.0.iter().map(|(ts, v)| (*ts, *v))
    }

    pub fn timestamps(&self) -> impl Iterator<Item = i64> + '_ {
        self.0.keys().copied()
    }
}

impl FromIterator<(i64, f64)> for TimeSeries {
    fn from_iter<I: IntoIterator<Item = (i64, f64)>>(iter: I) -> Self {
        Self::from_points(iter)
    }
}

impl IntoIterator for TimeSeries {
    type Item = (i64, f64);
    type IntoIter = std::collections::btree_map::IntoIter<i64, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_are_sorted_ascending() {
        let series = TimeSeries::from_points(vec![(300, 3.0), (100, 1.0), (200, 2.0)]);
        let ts: Vec<_> = series.timestamps().collect();
        assert_eq!(ts, vec![100, 200, 300]);
    }

    #[test]
    fn test_duplicate_timestamp_keeps_last_value() {
        let series = TimeSeries::from_points(vec![(100, 1.0), (200, 2.0), (100, 7.5)]);
        assert_eq!(series.len(), 2);
        assert_eq!(series.get(100), Some(7.5));
    }

    #[test]
    fn test_serializes_as_object() {
        let series = TimeSeries::from_points(vec![(2, 0.5), (1, 1.0)]);
        let json = serde_json::to_string(&series).unwrap();
        assert_eq!(json, r#"{"1":1.0,"2":0.5}"#);
    }
}
