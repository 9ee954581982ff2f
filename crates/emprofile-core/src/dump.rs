//! Parser for the battery-service text dump a device prints on request.
//!
//! The dump is a loose `label: value` listing, e.g.
//!
//! ```text
//!   Max charging voltage: 5000000
//!   Charge counter: 2822000
//!   health: 2
//!   level: 96
//!   voltage: 4350
//!   temperature: 280
//! ```
//!
//! Labels are matched as substrings, so `harge counter` matches both
//! `Charge counter` and `charge counter`, and `voltage` also matches
//! `Max charging voltage`. For that reason the last occurrence of a label
//! wins: the plain `voltage:` line comes after the charger lines.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::debug;

use crate::error::DrainError;
use crate::metrics::battery::{BatteryPropertySource, RawBatteryProperties};

const CHARGE_COUNTER: &str = "harge counter: ";
const VOLTAGE: &str = "voltage: ";
const TEMPERATURE: &str = "temperature: ";
const HEALTH: &str = "health: ";
const LEVEL: &str = "level: ";
const ALT_CAPACITY: &str = "battery capacity: ";

/// Digits immediately following each occurrence of `label`, parsed as `T`.
fn values_after<'a, T: FromStr + 'a>(
    text: &'a str,
    label: &'a str,
) -> impl Iterator<Item = T> + 'a {
    text.match_indices(label).filter_map(move |(at, _)| {
        let rest = &text[at + label.len()..];
        let end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        rest[..end].parse().ok()
    })
}

fn last_value<T: FromStr>(text: &str, label: &str) -> Option<T> {
    values_after(text, label).last()
}

fn first_value<T: FromStr>(text: &str, label: &str) -> Option<T> {
    values_after(text, label).next()
}

/// Parse a battery dump into raw properties.
///
/// Capacity comes from the charge counter (µAh, scaled to mAh) and only falls
/// back to `battery capacity` (already mAh) when no charge counter is present.
/// Temperature stays in tenths of a degree.
pub fn parse_battery_dump(text: &str) -> RawBatteryProperties {
    // Capacities are read as f64 so counters past the i64 range still count.
    let capacity_mah = match last_value::<f64>(text, CHARGE_COUNTER) {
        Some(uah) => Some(uah / 1000.0),
        None => first_value::<f64>(text, ALT_CAPACITY),
    };
    let raw = RawBatteryProperties {
        capacity_mah,
        voltage_mv: last_value(text, VOLTAGE),
        temperature_deci_c: last_value(text, TEMPERATURE),
        health_code: last_value(text, HEALTH),
        level_percent: last_value(text, LEVEL),
    };
    debug!("parsed battery dump: {raw:?}");
    raw
}

/// Property source over dump text captured earlier.
#[derive(Debug, Clone)]
pub struct DumpText(pub String);

impl BatteryPropertySource for DumpText {
    fn fetch(&self) -> Result<RawBatteryProperties, DrainError> {
        Ok(parse_battery_dump(&self.0))
    }
}

/// Property source that reads a dump file on every fetch.
#[derive(Debug, Clone)]
pub struct DumpFile {
    path: PathBuf,
}

impl DumpFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl BatteryPropertySource for DumpFile {
    fn fetch(&self) -> Result<RawBatteryProperties, DrainError> {
        let text = std::fs::read_to_string(&self.path).map_err(|e| {
            DrainError::SourceFailed(format!("{}: {e}", self.path.display()))
        })?;
        Ok(parse_battery_dump(&text))
    }
}
