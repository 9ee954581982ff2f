//! Report export to JSON or sectioned CSV.

use std::fmt::{self, Write};

use emprofile_core::ProfileReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn parse(s: &str) -> Self {
        match s {
            "csv" => Self::Csv,
            _ => Self::Json,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

fn field(s: &str) -> String {
    if s.contains([',', '"', '\n']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Sectioned CSV: energy (total, then rails by descending energy), memory
/// counters in `memory_order`, battery drain metrics.
pub fn write_csv(
    out: &mut impl Write,
    report: &ProfileReport,
    memory_order: &[&str],
) -> fmt::Result {
    if let Some(energy) = &report.energy {
        writeln!(out, "ENERGY PROFILING RESULTS")?;
        writeln!(out, "Power Rail,Energy (Joules)")?;
        writeln!(out, "TOTAL,{:.2}", energy.total)?;
        writeln!(out)?;
        writeln!(out, "Individual Rails:")?;
        for (rail, joules) in energy.top_rails(energy.by_rail.len()) {
            writeln!(out, "{},{joules:.2}", field(rail))?;
        }
        writeln!(out)?;
    }

    if let Some(memory) = &report.memory {
        writeln!(out, "MEMORY PROFILING RESULTS")?;
        writeln!(out, "Counter,Min (MB),Avg (MB),Max (MB),Samples")?;
        for name in memory_order {
            if let Some(s) = memory.get(*name) {
                writeln!(
                    out,
                    "{},{:.2},{:.2},{:.2},{}",
                    field(name),
                    s.min_mb,
                    s.avg_mb,
                    s.max_mb,
                    s.samples
                )?;
            }
        }
        writeln!(out)?;
    }

    if let Some(d) = &report.battery_drain {
        writeln!(out, "BATTERY DRAIN ANALYSIS")?;
        writeln!(out, "Metric,Value")?;
        writeln!(out, "Design Capacity (mAh),{:.2}", d.design_capacity_mah)?;
        writeln!(out, "Current Voltage (V),{:.3}", d.current_voltage_v)?;
        if let Some(t) = d.temperature_c {
            writeln!(out, "Temperature (°C),{t:.1}")?;
        }
        if let Some(level) = d.battery_level_percent {
            writeln!(out, "Battery Level (%),{level}")?;
        }
        writeln!(out, "Health Multiplier,{:.2}", d.health_multiplier)?;
        writeln!(out, "Effective Capacity (mAh),{:.2}", d.effective_capacity_mah)?;
        writeln!(out, "Total Battery Energy (Wh),{:.3}", d.total_battery_energy_wh)?;
        writeln!(out, "Consumed Energy (J),{:.2}", d.consumed_energy_joules)?;
        writeln!(out, "Consumed Energy (Wh),{:.6}", d.consumed_energy_wh)?;
        writeln!(out, "Battery Drain (%),{:.6}", d.battery_drain_percent)?;
    }
    Ok(())
}

pub fn report_to_csv(report: &ProfileReport, memory_order: &[&str]) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_csv(&mut out, report, memory_order);
    out
}

/// Write `report` to `path` in `format`.
pub fn export(report: &ProfileReport, format: ExportFormat, path: &str, memory_order: &[&str]) {
    match format {
        ExportFormat::Json => super::write_json(report, path, "Detailed results"),
        ExportFormat::Csv => {
            super::write_text(&report_to_csv(report, memory_order), path, "Detailed results")
        }
    }
}
