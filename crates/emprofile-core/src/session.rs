//! Offline analysis of one profiling session.
//!
//! The resolved [`CollectionStrategy`] decides which calculators run over the
//! extracted samples; their outputs, plus a battery-drain estimate when energy
//! was measured, are folded into a [`ProfileReport`].

use log::{info, warn};

use crate::config::ProfilerConfig;
use crate::error::{DrainError, ReportError};
use crate::metrics::battery::DrainEstimate;
use crate::metrics::energy::compute_energy;
use crate::metrics::memory::compute_memory_stats;
use crate::report::{ProfileReport, ReportSections, assemble_report};
use crate::series::SeriesSet;
use crate::strategy::CollectionStrategy;

/// Labels attached to the report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionInfo {
    pub app: Option<String>,
    pub duration_seconds: Option<f64>,
}

/// Report plus the reason the drain section is missing, if it is.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionAnalysis {
    pub report: ProfileReport,
    pub drain_error: Option<DrainError>,
}

/// Run the calculators selected by `strategy` over `samples`.
///
/// Drain is estimated only when energy was collected and the total is
/// positive. A drain failure is returned alongside the report rather than
/// failing the analysis.
pub fn analyze_session(
    strategy: &CollectionStrategy,
    samples: &SeriesSet,
    battery: Option<&dyn DrainEstimate>,
    info: &SessionInfo,
    config: &ProfilerConfig,
) -> Result<SessionAnalysis, ReportError> {
    let mut sections = ReportSections::default();
    let mut drain_error = None;

    if strategy.kind.collects_energy() {
        let rails = samples.rails();
        if rails.is_empty() {
            warn!("no power rails found in samples");
        } else {
            sections.energy = Some(compute_energy(&rails));
        }
    }

    if strategy.kind.collects_memory() {
        let counters = samples.select(&config.memory_counter_names());
        let stats = compute_memory_stats(&counters);
        if stats.is_empty() {
            warn!("no system memory data found in samples");
        } else {
            sections.memory = Some(stats);
        }
    }

    if let (Some(energy), Some(estimator)) = (&sections.energy, battery) {
        if energy.total > 0.0 {
            match estimator.estimate_drain(energy.total) {
                Ok(drain) => {
                    info!("estimated battery drain: {:.6}%", drain.battery_drain_percent);
                    sections.battery_drain = Some(drain);
                }
                Err(e) => drain_error = Some(e),
            }
        }
    }

    let mut report = assemble_report(strategy.mode_label(), sections)?;
    if let Some(app) = &info.app {
        report = report.with_app(app.as_str());
    }
    if let Some(seconds) = info.duration_seconds {
        report = report.with_duration(seconds);
    }
    Ok(SessionAnalysis {
        report,
        drain_error,
    })
}
