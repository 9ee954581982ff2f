//! # emprofile-core
//!
//! Derived-metric engine for device energy and memory profiling.
//!
//! Turns counter samples already extracted from a device trace into an
//! energy report, per-counter memory statistics and a battery-drain estimate,
//! and decides beforehand which collection strategy a session should use.
//!
//! ## Quick Start
//!
//! ```
//! use emprofile_core::{CounterSeries, SeriesSet, compute_energy};
//!
//! let rails: SeriesSet = vec![
//!     CounterSeries::from_pairs("power.rail.A", &[(0, 100.0), (1, 100.0), (2, 350.0)]),
//!     CounterSeries::from_pairs("power.rail.B", &[(0, 5.0)]),
//! ]
//! .into_iter()
//! .collect();
//!
//! let energy = compute_energy(&rails);
//! assert!((energy.total - 0.00025).abs() < 1e-12);
//! assert!(!energy.by_rail.contains_key("power.rail.B"));
//! ```
//!
//! ## Architecture
//!
//! Strategy resolution → (external collection) → samples → calculators →
//! report.
//!
//! - [`resolve_strategy`] picks legacy or rail-based collection from the
//!   request flags and an injected [`CapabilityProbe`].
//! - [`compute_energy`], [`compute_memory_stats`] and
//!   [`BatteryDrainEstimator`] are pure over their inputs; the estimator only
//!   caches device battery properties.
//! - [`analyze_session`] runs the calculators a strategy calls for and
//!   assembles a [`ProfileReport`].

pub mod config;
pub mod dump;
pub mod error;
pub mod metrics;
pub mod report;
pub mod series;
pub mod session;
pub mod strategy;

pub use config::ProfilerConfig;
pub use dump::{DumpFile, DumpText, parse_battery_dump};
pub use error::{ConfigError, DrainError, ReportError, ResolveError};
pub use metrics::battery::{
    BatteryDrainEstimator, BatteryDrainReport, BatteryHealth, BatteryProperties,
    BatteryPropertySource, DrainEstimate, RawBatteryProperties, health_multiplier,
};
pub use metrics::energy::{
    DEFAULT_TOP_RAILS, EnergyReport, UWS_TO_JOULES, compute_energy, rail_energy_joules,
};
pub use metrics::memory::{
    MEMORY_COUNTERS, MemoryCounterStats, MemoryStats, MemoryUsed, compute_memory_stats,
    memory_used,
};
pub use report::{ProfileReport, ReportSections, assemble_report};
pub use series::{CounterRow, CounterSeries, RAIL_PREFIX, Sample, SeriesSet};
pub use session::{SessionAnalysis, SessionInfo, analyze_session};
pub use strategy::{
    ArtifactCatalog, ArtifactEncoding, Capability, CapabilityProbe, CollectionStrategy,
    ConfigArtifact, ProfileMode, ProfileRequest, StaticProbe, StrategyKind, resolve_strategy,
    select_strategy_kind,
};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
