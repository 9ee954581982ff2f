//! Aggregate profiling report.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ReportError;
use crate::metrics::battery::BatteryDrainReport;
use crate::metrics::energy::EnergyReport;
use crate::metrics::memory::MemoryStats;

/// Everything computed for one profiling session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileReport {
    pub id: String,
    pub mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    pub timestamp_unix_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub energy: Option<EnergyReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<MemoryStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery_drain: Option<BatteryDrainReport>,
}

/// Calculator outputs to combine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportSections {
    pub energy: Option<EnergyReport>,
    pub memory: Option<MemoryStats>,
    pub battery_drain: Option<BatteryDrainReport>,
}

impl ReportSections {
    pub fn is_empty(&self) -> bool {
        self.energy.is_none() && self.memory.is_none() && self.battery_drain.is_none()
    }
}

fn unix_ms_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Combine calculator outputs under a mode label.
pub fn assemble_report(mode: &str, sections: ReportSections) -> Result<ProfileReport, ReportError> {
    if sections.is_empty() {
        return Err(ReportError::Empty);
    }
    Ok(ProfileReport {
        id: Uuid::new_v4().to_string(),
        mode: mode.to_string(),
        app: None,
        duration_seconds: None,
        timestamp_unix_ms: unix_ms_now(),
        energy: sections.energy,
        memory: sections.memory,
        battery_drain: sections.battery_drain,
    })
}

impl ProfileReport {
    pub fn with_app(mut self, app: impl Into<String>) -> Self {
        self.app = Some(app.into());
        self
    }

    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration_seconds = Some(seconds);
        self
    }
}
