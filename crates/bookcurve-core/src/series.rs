//! Ordered, uniquely keyed time series.

use crate::error::{AnalyticsError, Result};
use std::collections::BTreeMap;
use std::fmt::Debug;

/// A sequence of `(index, value)` points with strictly ascending indices.
///
/// The index is a calendar date for seasonal profiles and a DTD for booking
/// curves. Both constructors guarantee the ordering invariant, so consumers
/// never need to re-sort.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries<K> {
    index: Vec<K>,
    values: Vec<f64>,
}

impl<K> Default for TimeSeries<K> {
    fn default() -> Self {
        Self {
            index: Vec::new(),
            values: Vec::new(),
        }
    }
}

impl<K: Ord + Copy + Debug> TimeSeries<K> {
    /// Build a series from points that are already in ascending order.
    ///
    /// Fails if two neighbouring indices are equal or descending.
    pub fn new(points: Vec<(K, f64)>) -> Result<Self> {
        if let Some(pair) = points.windows(2).find(|w| w[0].0 >= w[1].0) {
            return Err(AnalyticsError::InvalidInput(format!(
                "series index must be strictly ascending, found {:?} before {:?}",
                pair[0].0, pair[1].0
            )));
        }

        let (index, values) = points.into_iter().unzip();
        Ok(Self { index, values })
    }

    /// Build a series from unordered observations, summing values that share an index.
    pub fn from_grouped_sum<I>(observations: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
    {
        let mut grouped: BTreeMap<K, f64> = BTreeMap::new();
        for (key, value) in observations {
            *grouped.entry(key).or_insert(0.0) += value;
        }

        let (index, values) = grouped.into_iter().unzip();
        Self { index, values }
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Indices in ascending order.
    pub fn index(&self) -> &[K] {
        &self.index
    }

    /// Values aligned with [`TimeSeries::index`].
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Iterate over `(index, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (K, f64)> + '_ {
        self.index.iter().copied().zip(self.values.iter().copied())
    }

    /// Value at the given index, if present.
    pub fn get(&self, key: K) -> Option<f64> {
        self.index
            .binary_search(&key)
            .ok()
            .map(|pos| self.values[pos])
    }

    /// Consume the series into its point list.
    pub fn into_points(self) -> Vec<(K, f64)> {
        self.index.into_iter().zip(self.values).collect()
    }
}
