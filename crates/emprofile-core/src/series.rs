//! Counter sample series: the common input of every calculator.
//!
//! Samples arrive from an external trace query as `(counter, timestamp, value)`
//! rows. They are grouped per counter in arrival order and never re-sorted;
//! callers are expected to hand over rows already ordered by timestamp.

use std::collections::BTreeMap;
use std::collections::btree_map;

use serde::{Deserialize, Serialize};

use crate::metrics::memory::MEMORY_COUNTERS;

/// Prefix shared by every power-rail counter track.
pub const RAIL_PREFIX: &str = "power.";

/// One counter reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub ts: i64,
    pub value: f64,
}

/// A flat row as produced by the trace query layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterRow {
    pub counter: String,
    pub ts: i64,
    pub value: f64,
}

/// Ordered samples of a single named counter.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CounterSeries {
    pub name: String,
    pub samples: Vec<Sample>,
}

impl CounterSeries {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            samples: Vec::new(),
        }
    }

    /// Build a series from `(ts, value)` pairs, kept in the given order.
    pub fn from_pairs(name: impl Into<String>, pairs: &[(i64, f64)]) -> Self {
        Self {
            name: name.into(),
            samples: pairs
                .iter()
                .map(|&(ts, value)| Sample { ts, value })
                .collect(),
        }
    }

    pub fn push(&mut self, ts: i64, value: f64) {
        self.samples.push(Sample { ts, value });
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn first(&self) -> Option<&Sample> {
        self.samples.first()
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|s| s.value)
    }
}

/// Name-ordered collection of counter series.
///
/// Names are unique: pushing a row for an existing counter appends to it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SeriesSet {
    series: BTreeMap<String, CounterSeries>,
}

impl SeriesSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Group flat rows by counter name, preserving per-counter arrival order.
    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = CounterRow>,
    {
        let mut set = Self::new();
        for row in rows {
            set.push(&row.counter, row.ts, row.value);
        }
        set
    }

    pub fn push(&mut self, counter: &str, ts: i64, value: f64) {
        self.series
            .entry(counter.to_string())
            .or_insert_with(|| CounterSeries::new(counter))
            .push(ts, value);
    }

    /// Insert a whole series, replacing any series with the same name.
    pub fn insert(&mut self, series: CounterSeries) {
        self.series.insert(series.name.clone(), series);
    }

    pub fn get(&self, name: &str) -> Option<&CounterSeries> {
        self.series.get(name)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Series in name order.
    pub fn iter(&self) -> btree_map::Values<'_, String, CounterSeries> {
        self.series.values()
    }

    /// Power-rail counters only (`power.*` tracks).
    pub fn rails(&self) -> SeriesSet {
        self.filter(|name| name.starts_with(RAIL_PREFIX))
    }

    /// System memory counters from [`MEMORY_COUNTERS`].
    pub fn system_memory(&self) -> SeriesSet {
        self.select(MEMORY_COUNTERS)
    }

    /// Counters whose name is in `names`.
    pub fn select(&self, names: &[&str]) -> SeriesSet {
        self.filter(|name| names.contains(&name))
    }

    fn filter(&self, keep: impl Fn(&str) -> bool) -> SeriesSet {
        SeriesSet {
            series: self
                .series
                .iter()
                .filter(|(name, _)| keep(name))
                .map(|(name, s)| (name.clone(), s.clone()))
                .collect(),
        }
    }
}

impl FromIterator<CounterSeries> for SeriesSet {
    fn from_iter<I: IntoIterator<Item = CounterSeries>>(iter: I) -> Self {
        let mut set = SeriesSet::new();
        for series in iter {
            set.insert(series);
        }
        set
    }
}

impl<'a> IntoIterator for &'a SeriesSet {
    type Item = &'a CounterSeries;
    type IntoIter = btree_map::Values<'a, String, CounterSeries>;

    fn into_iter(self) -> Self::IntoIter {
        self.series.values()
    }
}
