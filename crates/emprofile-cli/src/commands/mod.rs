pub mod analyze;
pub mod battery;
pub mod export;
pub mod plan;
pub mod summary;

use std::time::{SystemTime, UNIX_EPOCH};

use emprofile_core::{ProfileMode, ProfilerConfig};
use serde::Serialize;

/// Load the config at `path`, or the defaults. Exits on a bad file.
pub fn load_config(path: Option<&str>) -> ProfilerConfig {
    let Some(path) = path else {
        return ProfilerConfig::default();
    };
    match ProfilerConfig::load(path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    }
}

/// Parse a mode string. clap already restricts the values.
pub fn parse_mode(s: &str) -> ProfileMode {
    match s.parse() {
        Ok(mode) => mode,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    }
}

pub fn unix_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// `emprofile_{mode}_{unix_seconds}.{ext}`
pub fn default_output_path(mode: &str, ext: &str, unix_seconds: u64) -> String {
    format!("emprofile_{mode}_{unix_seconds}.{ext}")
}

/// Pretty-print `value` as JSON to `path`.
pub fn write_json<T: Serialize>(value: &T, path: &str, label: &str) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => write_text(&text, path, label),
        Err(e) => eprintln!("Failed to serialize {label}: {e}"),
    }
}

pub fn write_text(text: &str, path: &str, label: &str) {
    match std::fs::write(path, text) {
        Ok(()) => println!("\n{label} written to {path}"),
        Err(e) => eprintln!("Failed to write {path}: {e}"),
    }
}
