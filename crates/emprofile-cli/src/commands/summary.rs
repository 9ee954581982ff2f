//! Human-readable rendering of profiling results.

use std::fmt::{self, Write};

use emprofile_core::{BatteryDrainReport, EnergyReport, MemoryStats, ProfileReport, memory_used};

fn rule(out: &mut impl Write) -> fmt::Result {
    writeln!(out, "{:=<70}", "")
}

fn write_energy(out: &mut impl Write, energy: &EnergyReport, top_rails: usize) -> fmt::Result {
    writeln!(out, "\nENERGY CONSUMPTION:")?;
    writeln!(
        out,
        "  Total: {:.2} Joules ({:.4} Wh)",
        energy.total,
        energy.total_wh()
    )?;
    let top = energy.top_rails(top_rails);
    if !top.is_empty() {
        writeln!(out, "\n  Top Power Rail Consumers:")?;
        for (rail, joules) in top {
            writeln!(out, "    {rail}: {joules:.2} J")?;
        }
    }
    Ok(())
}

fn write_memory(out: &mut impl Write, memory: &MemoryStats) -> fmt::Result {
    writeln!(out, "\nSYSTEM MEMORY STATISTICS:")?;
    if let Some(total) = memory.get("MemTotal") {
        writeln!(
            out,
            "  Total RAM: {:.2} MB ({:.2} GB)",
            total.avg_mb,
            total.avg_mb / 1024.0
        )?;
    }
    if let Some(used) = memory_used(memory) {
        writeln!(out, "\n  Memory Used:")?;
        writeln!(
            out,
            "    Min: {:.2} MB  |  Avg: {:.2} MB  |  Max: {:.2} MB",
            used.min_mb, used.avg_mb, used.max_mb
        )?;
    }
    writeln!(out, "\n  (Per-counter breakdown is in the exported report)")
}

/// Energy and memory sections for the report's mode.
pub fn write_report(out: &mut impl Write, report: &ProfileReport, top_rails: usize) -> fmt::Result {
    writeln!(out)?;
    rule(out)?;
    writeln!(out, "PROFILING RESULTS ({})", report.mode)?;
    if let Some(app) = &report.app {
        writeln!(out, "App: {app}")?;
    }
    if let Some(seconds) = report.duration_seconds {
        writeln!(out, "Duration: {seconds:.1}s")?;
    }
    rule(out)?;

    let wants_energy = matches!(report.mode.as_str(), "energy" | "both");
    let wants_memory = matches!(report.mode.as_str(), "memory" | "both");

    match &report.energy {
        Some(energy) => write_energy(out, energy, top_rails)?,
        None if wants_energy => writeln!(out, "\n  No energy data available")?,
        None => {}
    }
    match &report.memory {
        Some(memory) => write_memory(out, memory)?,
        None if wants_memory => writeln!(out, "\n  No memory data available")?,
        None => {}
    }
    rule(out)
}

/// Battery drain block, or the unavailable notice.
pub fn write_drain(out: &mut impl Write, drain: Option<&BatteryDrainReport>) -> fmt::Result {
    let Some(d) = drain else {
        return writeln!(
            out,
            "\nBattery drain percentage unavailable (could not read battery properties)"
        );
    };
    writeln!(out)?;
    rule(out)?;
    writeln!(out, "BATTERY DRAIN ANALYSIS")?;
    rule(out)?;

    writeln!(out, "\nDevice Battery Properties:")?;
    writeln!(out, "  Design Capacity: {:.2} mAh", d.design_capacity_mah)?;
    writeln!(out, "  Current Voltage: {:.3} V", d.current_voltage_v)?;
    if let Some(t) = d.temperature_c {
        writeln!(out, "  Temperature:     {t:.1} °C")?;
    }
    if let Some(level) = d.battery_level_percent {
        writeln!(out, "  Battery Level:   {level}%")?;
    }
    writeln!(
        out,
        "  Est. Health:     {:.2} ({:.0}%)",
        d.health_multiplier,
        d.health_multiplier * 100.0
    )?;
    writeln!(out, "  Effective Capacity: {:.2} mAh", d.effective_capacity_mah)?;
    writeln!(out, "  Total Battery Energy: {:.3} Wh", d.total_battery_energy_wh)?;

    writeln!(out, "\nEnergy Consumption:")?;
    writeln!(
        out,
        "  Consumed: {:.2} J ({:.6} Wh)",
        d.consumed_energy_joules, d.consumed_energy_wh
    )?;

    writeln!(out, "\nBattery Drain:")?;
    writeln!(out, "  Estimated Drain: {:.6}%", d.battery_drain_percent)?;
    rule(out)
}

pub fn render_report(report: &ProfileReport, top_rails: usize) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_report(&mut out, report, top_rails);
    out
}

pub fn render_drain(drain: Option<&BatteryDrainReport>) -> String {
    let mut out = String::new();
    let _ = write_drain(&mut out, drain);
    out
}
