//! Per-counter memory statistics.
//!
//! The aggregator works on whatever series it is given. Reports only show the
//! system counters in [`MEMORY_COUNTERS`]; narrowing the input to that list is
//! left to the caller (see [`SeriesSet::select`]).

use std::collections::BTreeMap;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::series::{CounterSeries, SeriesSet};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// System memory counters shown in reports, in display order.
pub const MEMORY_COUNTERS: &[&str] = &[
    "MemTotal",
    "MemFree",
    "MemAvailable",
    "Buffers",
    "Cached",
    "Active",
    "Inactive",
];

/// Min/avg/max of one counter, in MiB.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MemoryCounterStats {
    pub min_mb: f64,
    pub avg_mb: f64,
    pub max_mb: f64,
    pub samples: usize,
}

pub type MemoryStats = BTreeMap<String, MemoryCounterStats>;

/// "Memory used" bounds derived from `MemTotal` and `MemAvailable`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MemoryUsed {
    pub min_mb: f64,
    pub avg_mb: f64,
    pub max_mb: f64,
}

impl MemoryCounterStats {
    /// Statistics for one series, or `None` when it has no finite samples.
    ///
    /// NaN and infinite readings are left out of every figure, including the
    /// sample count.
    pub fn from_series(series: &CounterSeries) -> Option<Self> {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        let mut n = 0usize;
        for v in series.values().filter(|v| v.is_finite()) {
            min = min.min(v);
            max = max.max(v);
            sum += v;
            n += 1;
        }
        if n == 0 {
            return None;
        }
        if n < series.len() {
            debug!(
                "{}: skipped {} non-finite sample(s)",
                series.name,
                series.len() - n
            );
        }
        // Mean can drift past min/max by an ulp when every sample is equal.
        let avg = (sum / n as f64).clamp(min, max);
        Some(Self {
            min_mb: min / BYTES_PER_MB,
            avg_mb: avg / BYTES_PER_MB,
            max_mb: max / BYTES_PER_MB,
            samples: n,
        })
    }
}

/// Compute statistics for every non-empty series in `counters`.
pub fn compute_memory_stats(counters: &SeriesSet) -> MemoryStats {
    let mut stats = MemoryStats::new();
    for series in counters {
        match MemoryCounterStats::from_series(series) {
            Some(s) => {
                debug!(
                    "{}: min {:.2} MB avg {:.2} MB max {:.2} MB ({} samples)",
                    series.name, s.min_mb, s.avg_mb, s.max_mb, s.samples
                );
                stats.insert(series.name.clone(), s);
            }
            None => debug!("{} skipped: no finite samples", series.name),
        }
    }
    info!("memory statistics for {} counters", stats.len());
    stats
}

/// Memory in use, bounded by the swing of `MemAvailable`.
///
/// Used is lowest when available is highest, so the minimum is derived from
/// the available maximum and the maximum from the available minimum.
pub fn memory_used(stats: &MemoryStats) -> Option<MemoryUsed> {
    let total = stats.get("MemTotal")?.avg_mb;
    let available = stats.get("MemAvailable")?;
    Some(MemoryUsed {
        min_mb: total - available.max_mb,
        avg_mb: total - available.avg_mb,
        max_mb: total - available.min_mb,
    })
}
