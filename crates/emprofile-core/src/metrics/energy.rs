//! Window energy from cumulative power-rail counters.
//!
//! Rail counters accumulate microwatt-seconds since an epoch, so the energy
//! spent inside a measurement window is the difference between the last and
//! first sample. There is no integration or resampling.

use std::collections::BTreeMap;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::series::{CounterSeries, SeriesSet};

/// Joules per microwatt-second.
pub const UWS_TO_JOULES: f64 = 1e-6;
/// Number of rails shown in "top consumers" listings.
pub const DEFAULT_TOP_RAILS: usize = 5;

/// Energy attributed to the measurement window.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EnergyReport {
    /// Sum of every entry in `by_rail`, in Joules.
    pub total: f64,
    /// Joules per rail. Rails with fewer than two samples are absent.
    pub by_rail: BTreeMap<String, f64>,
}

impl EnergyReport {
    /// Rails ranked by descending energy, at most `k` of them.
    ///
    /// Equal energies keep rail-name order.
    pub fn top_rails(&self, k: usize) -> Vec<(&str, f64)> {
        let mut rows: Vec<(&str, f64)> = self
            .by_rail
            .iter()
            .map(|(name, joules)| (name.as_str(), *joules))
            .collect();
        rows.sort_by(|a, b| b.1.total_cmp(&a.1));
        rows.truncate(k);
        rows
    }

    pub fn total_wh(&self) -> f64 {
        self.total / 3600.0
    }

    pub fn is_empty(&self) -> bool {
        self.by_rail.is_empty()
    }
}

/// Window energy of one rail, or `None` when it has fewer than two samples.
///
/// A counter that decreased inside the window yields a negative figure; it is
/// returned as computed.
pub fn rail_energy_joules(series: &CounterSeries) -> Option<f64> {
    if series.len() < 2 {
        return None;
    }
    let first = series.first()?.value;
    let last = series.last()?.value;
    Some((last - first) * UWS_TO_JOULES)
}

/// Compute window energy for every rail in `rails`.
pub fn compute_energy(rails: &SeriesSet) -> EnergyReport {
    let mut by_rail = BTreeMap::new();
    let mut total = 0.0;

    for series in rails {
        match rail_energy_joules(series) {
            Some(joules) => {
                debug!("rail {}: {:.6} J over {} samples", series.name, joules, series.len());
                total += joules;
                by_rail.insert(series.name.clone(), joules);
            }
            None => debug!(
                "rail {} skipped: {} sample(s), need at least 2",
                series.name,
                series.len()
            ),
        }
    }

    if by_rail.is_empty() {
        if !rails.is_empty() {
            warn!("no power rail had enough samples to compute energy");
        }
    } else {
        info!("total energy: {:.2} J across {} rails", total, by_rail.len());
    }

    EnergyReport { total, by_rail }
}
