//! Error types for the derived-metric engine.
//!
//! Calculators never fail: rails and counters without enough samples are left
//! out of their reports. Only battery-drain estimation, strategy resolution,
//! report assembly and configuration loading have error paths.

use crate::strategy::StrategyKind;

/// Why a battery-drain figure could not be produced.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DrainError {
    /// The property source answered, but required fields were missing.
    #[error("battery properties unavailable: missing {}", .missing.join(", "))]
    PropertiesUnavailable { missing: Vec<&'static str> },

    /// The property source itself failed (device unreachable, unreadable dump).
    #[error("battery property source failed: {0}")]
    SourceFailed(String),

    /// Health-adjusted battery energy came out as zero Wh.
    #[error("total battery energy is zero, cannot compute drain percentage")]
    ZeroBatteryEnergy,
}

/// Session-setup failures raised before any device interaction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// Neither energy nor memory collection was requested.
    #[error("invalid request: at least one of energy or memory must be requested")]
    InvalidRequest,

    /// The resolved strategy has no configuration artifact in the catalog.
    #[error("unsupported strategy {0}: no configuration artifact registered")]
    UnsupportedStrategy(StrategyKind),

    /// The device has no trace collector at all.
    #[error("trace collector is not available on this device")]
    CollectorUnavailable,
}

/// Report assembly failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReportError {
    #[error("report has no energy, memory or battery-drain section")]
    Empty,
}

/// Configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },

    /// Two strategies were given the same collector configuration artifact.
    #[error("artifact {artifact} is assigned to both {first} and {second}")]
    DuplicateArtifact {
        artifact: String,
        first: StrategyKind,
        second: StrategyKind,
    },
}
