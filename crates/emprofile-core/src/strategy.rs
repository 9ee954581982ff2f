//! Collection-strategy resolution.
//!
//! Decides, once per session and before anything is started on the device,
//! whether the legacy battery-counter collector or the rail-based collector is
//! used, and whether it gathers energy, memory, or both. Device capabilities
//! come from an injected [`CapabilityProbe`]; each strategy maps to exactly one
//! collector configuration artifact in an [`ArtifactCatalog`].

use std::cell::Cell;
use std::collections::BTreeMap;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::ResolveError;

/// Which collector setup governs a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Battery-counter collector; no rail or memory tracks.
    Legacy,
    /// Power-rail energy only.
    EnhancedEnergy,
    /// System memory counters only.
    EnhancedMemory,
    /// Power rails and system memory in one trace.
    EnhancedBoth,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 4] = [
        Self::Legacy,
        Self::EnhancedEnergy,
        Self::EnhancedMemory,
        Self::EnhancedBoth,
    ];

    pub fn collects_energy(self) -> bool {
        matches!(self, Self::EnhancedEnergy | Self::EnhancedBoth)
    }

    pub fn collects_memory(self) -> bool {
        matches!(self, Self::EnhancedMemory | Self::EnhancedBoth)
    }

    /// Device capability the strategy cannot run without.
    pub fn required_capability(self) -> Option<Capability> {
        if self.collects_energy() {
            Some(Capability::PowerRails)
        } else {
            None
        }
    }

    /// Short label used in reports and output file names.
    pub fn mode_label(self) -> &'static str {
        match self {
            Self::Legacy => "legacy",
            Self::EnhancedEnergy => "energy",
            Self::EnhancedMemory => "memory",
            Self::EnhancedBoth => "both",
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Legacy => write!(f, "legacy"),
            Self::EnhancedEnergy => write!(f, "enhanced_energy"),
            Self::EnhancedMemory => write!(f, "enhanced_memory"),
            Self::EnhancedBoth => write!(f, "enhanced_both"),
        }
    }
}

/// Device features a strategy may depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// `power.rails.*` data sources.
    PowerRails,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PowerRails => write!(f, "power_rails"),
        }
    }
}

/// Device capability queries, answered by the session layer.
pub trait CapabilityProbe {
    /// Whether the trace collector exists on the device at all.
    fn has_collector(&self) -> bool {
        true
    }

    fn supports(&self, capability: Capability) -> bool;
}

/// Probe with fixed answers, for offline runs and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticProbe {
    pub collector: bool,
    pub power_rails: bool,
}

impl StaticProbe {
    pub fn with_rails(power_rails: bool) -> Self {
        Self {
            collector: true,
            power_rails,
        }
    }
}

impl CapabilityProbe for StaticProbe {
    fn has_collector(&self) -> bool {
        self.collector
    }

    fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::PowerRails => self.power_rails,
        }
    }
}

/// Encoding of a collector configuration artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactEncoding {
    /// Text protobuf (`.pbtxt`), passed to the collector with `--txt`.
    Text,
    /// Binary protobuf.
    Binary,
}

/// Collector configuration file required by a strategy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigArtifact {
    pub id: String,
    pub encoding: ArtifactEncoding,
}

impl ConfigArtifact {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let encoding = if id.ends_with(".pbtxt") {
            ArtifactEncoding::Text
        } else {
            ArtifactEncoding::Binary
        };
        Self { id, encoding }
    }
}

/// Strategy → artifact identifier table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactCatalog {
    entries: BTreeMap<StrategyKind, String>,
}

impl Default for ArtifactCatalog {
    fn default() -> Self {
        let entries = [
            (StrategyKind::Legacy, "perfetto.config.bin"),
            (StrategyKind::EnhancedEnergy, "perfetto_config_power_rails.pbtxt"),
            (StrategyKind::EnhancedMemory, "perfetto_config_memory.pbtxt"),
            (
                StrategyKind::EnhancedBoth,
                "perfetto_config_power_rails_memory.pbtxt",
            ),
        ]
        .into_iter()
        .map(|(kind, id)| (kind, id.to_string()))
        .collect();
        Self { entries }
    }
}

impl ArtifactCatalog {
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    pub fn with(mut self, kind: StrategyKind, id: impl Into<String>) -> Self {
        self.entries.insert(kind, id.into());
        self
    }

    pub fn without(mut self, kind: StrategyKind) -> Self {
        self.entries.remove(&kind);
        self
    }

    pub fn artifact(&self, kind: StrategyKind) -> Option<ConfigArtifact> {
        self.entries.get(&kind).map(ConfigArtifact::new)
    }

    /// First artifact id registered for two strategies, with both kinds in
    /// catalog order.
    pub fn find_duplicate(&self) -> Option<(StrategyKind, StrategyKind, &str)> {
        let mut seen: BTreeMap<&str, StrategyKind> = BTreeMap::new();
        for (kind, id) in &self.entries {
            if let Some(first) = seen.insert(id.as_str(), *kind) {
                return Some((first, *kind, id.as_str()));
            }
        }
        None
    }
}

/// A resolved strategy and the artifact it runs with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionStrategy {
    pub kind: StrategyKind,
    pub artifact: ConfigArtifact,
}

impl CollectionStrategy {
    pub fn mode_label(&self) -> &'static str {
        self.kind.mode_label()
    }
}

/// User-facing profiling mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileMode {
    Legacy,
    Energy,
    Memory,
    Both,
}

impl std::str::FromStr for ProfileMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "legacy" => Ok(Self::Legacy),
            "energy" => Ok(Self::Energy),
            "memory" => Ok(Self::Memory),
            "both" => Ok(Self::Both),
            other => Err(format!("unknown profile mode '{other}'")),
        }
    }
}

/// What the user asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProfileRequest {
    pub force_legacy: bool,
    pub force_enhanced: bool,
    pub energy: bool,
    pub memory: bool,
}

impl ProfileRequest {
    pub fn from_mode(mode: ProfileMode) -> Self {
        match mode {
            ProfileMode::Legacy => Self {
                force_legacy: true,
                ..Self::default()
            },
            ProfileMode::Energy => Self {
                energy: true,
                ..Self::default()
            },
            ProfileMode::Memory => Self {
                memory: true,
                ..Self::default()
            },
            ProfileMode::Both => Self {
                energy: true,
                memory: true,
                ..Self::default()
            },
        }
    }

    fn requested_kind(self) -> Option<StrategyKind> {
        match (self.energy, self.memory) {
            (true, true) => Some(StrategyKind::EnhancedBoth),
            (true, false) => Some(StrategyKind::EnhancedEnergy),
            (false, true) => Some(StrategyKind::EnhancedMemory),
            (false, false) => None,
        }
    }
}

/// Pick the strategy kind for `request`. First matching rule wins:
///
/// 1. `force_legacy` → legacy.
/// 2. `force_enhanced` → enhanced kind from the request flags, probe ignored.
/// 3. energy + memory on a rails-capable device → both.
/// 4. energy on a rails-capable device → energy.
/// 5. memory → memory (no rails needed).
/// 6. anything else → legacy.
///
/// The rails probe runs at most once and only when rule 3 or 4 needs it.
pub fn select_strategy_kind(
    request: ProfileRequest,
    probe: &dyn CapabilityProbe,
) -> Result<StrategyKind, ResolveError> {
    if !probe.has_collector() {
        return Err(ResolveError::CollectorUnavailable);
    }
    if request.force_legacy {
        info!("forcing legacy collection");
        return Ok(StrategyKind::Legacy);
    }
    let requested = request.requested_kind().ok_or(ResolveError::InvalidRequest)?;
    if request.force_enhanced {
        info!("forcing enhanced collection ({requested})");
        return Ok(requested);
    }

    let probed: Cell<Option<bool>> = Cell::new(None);
    let rails = || match probed.get() {
        Some(answer) => answer,
        None => {
            let answer = probe.supports(Capability::PowerRails);
            probed.set(Some(answer));
            answer
        }
    };

    let kind = if request.energy && request.memory && rails() {
        StrategyKind::EnhancedBoth
    } else if request.energy && rails() {
        StrategyKind::EnhancedEnergy
    } else if request.memory {
        StrategyKind::EnhancedMemory
    } else {
        warn!("device does not support power rails, falling back to legacy collection");
        StrategyKind::Legacy
    };
    info!("resolved collection strategy: {kind}");
    Ok(kind)
}

/// Resolve the strategy and its configuration artifact.
pub fn resolve_strategy(
    request: ProfileRequest,
    probe: &dyn CapabilityProbe,
    catalog: &ArtifactCatalog,
) -> Result<CollectionStrategy, ResolveError> {
    let kind = select_strategy_kind(request, probe)?;
    let artifact = catalog
        .artifact(kind)
        .ok_or(ResolveError::UnsupportedStrategy(kind))?;
    Ok(CollectionStrategy { kind, artifact })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingProbe {
        rails: bool,
        calls: Cell<usize>,
    }

    impl CapabilityProbe for CountingProbe {
        fn supports(&self, _capability: Capability) -> bool {
            self.calls.set(self.calls.get() + 1);
            self.rails
        }
    }

    fn req(force_legacy: bool, force_enhanced: bool, energy: bool, memory: bool) -> ProfileRequest {
        ProfileRequest {
            force_legacy,
            force_enhanced,
            energy,
            memory,
        }
    }

    fn kind(request: ProfileRequest, rails: bool) -> Result<StrategyKind, ResolveError> {
        select_strategy_kind(request, &StaticProbe::with_rails(rails))
    }

    #[test]
    fn force_legacy_beats_everything() {
        for rails in [false, true] {
            for force_enhanced in [false, true] {
                for energy in [false, true] {
                    for memory in [false, true] {
                        assert_eq!(
                            kind(req(true, force_enhanced, energy, memory), rails),
                            Ok(StrategyKind::Legacy)
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn force_enhanced_skips_probe() {
        let probe = CountingProbe {
            rails: false,
            calls: Cell::new(0),
        };
        assert_eq!(
            select_strategy_kind(req(false, true, true, false), &probe),
            Ok(StrategyKind::EnhancedEnergy)
        );
        assert_eq!(
            select_strategy_kind(req(false, true, true, true), &probe),
            Ok(StrategyKind::EnhancedBoth)
        );
        assert_eq!(
            select_strategy_kind(req(false, true, false, true), &probe),
            Ok(StrategyKind::EnhancedMemory)
        );
        assert_eq!(probe.calls.get(), 0);
    }

    #[test]
    fn auto_detection_table() {
        assert_eq!(kind(req(false, false, true, true), true), Ok(StrategyKind::EnhancedBoth));
        assert_eq!(kind(req(false, false, true, true), false), Ok(StrategyKind::EnhancedMemory));
        assert_eq!(kind(req(false, false, true, false), true), Ok(StrategyKind::EnhancedEnergy));
        assert_eq!(kind(req(false, false, true, false), false), Ok(StrategyKind::Legacy));
        assert_eq!(kind(req(false, false, false, true), true), Ok(StrategyKind::EnhancedMemory));
        assert_eq!(kind(req(false, false, false, true), false), Ok(StrategyKind::EnhancedMemory));
    }

    #[test]
    fn nothing_requested_is_invalid() {
        assert_eq!(kind(req(false, false, false, false), true), Err(ResolveError::InvalidRequest));
        assert_eq!(kind(req(false, true, false, false), true), Err(ResolveError::InvalidRequest));
    }

    #[test]
    fn rails_probed_once_and_only_when_needed() {
        let probe = CountingProbe {
            rails: false,
            calls: Cell::new(0),
        };
        select_strategy_kind(req(false, false, true, true), &probe).unwrap();
        assert_eq!(probe.calls.get(), 1);

        let probe = CountingProbe {
            rails: true,
            calls: Cell::new(0),
        };
        select_strategy_kind(req(false, false, false, true), &probe).unwrap();
        assert_eq!(probe.calls.get(), 0);
    }

    #[test]
    fn missing_collector_fails_first() {
        let probe = StaticProbe {
            collector: false,
            power_rails: true,
        };
        assert_eq!(
            select_strategy_kind(req(true, false, false, false), &probe),
            Err(ResolveError::CollectorUnavailable)
        );
    }

    #[test]
    fn every_strategy_has_a_distinct_default_artifact() {
        let catalog = ArtifactCatalog::default();
        let ids: std::collections::HashSet<String> = StrategyKind::ALL
            .iter()
            .map(|k| catalog.artifact(*k).unwrap().id)
            .collect();
        assert_eq!(ids.len(), StrategyKind::ALL.len());
    }

    #[test]
    fn shared_artifact_is_found() {
        assert!(ArtifactCatalog::default().find_duplicate().is_none());
        let catalog = ArtifactCatalog::default()
            .with(StrategyKind::EnhancedMemory, "perfetto.config.bin");
        assert_eq!(
            catalog.find_duplicate(),
            Some((
                StrategyKind::Legacy,
                StrategyKind::EnhancedMemory,
                "perfetto.config.bin"
            ))
        );
    }

    #[test]
    fn artifact_encoding_from_extension() {
        let catalog = ArtifactCatalog::default();
        assert_eq!(
            catalog.artifact(StrategyKind::Legacy).unwrap().encoding,
            ArtifactEncoding::Binary
        );
        assert_eq!(
            catalog.artifact(StrategyKind::EnhancedEnergy).unwrap().encoding,
            ArtifactEncoding::Text
        );
    }

    #[test]
    fn unregistered_strategy_is_not_downgraded() {
        let catalog = ArtifactCatalog::default().without(StrategyKind::EnhancedMemory);
        let probe = StaticProbe::with_rails(true);
        assert_eq!(
            resolve_strategy(req(false, false, false, true), &probe, &catalog),
            Err(ResolveError::UnsupportedStrategy(StrategyKind::EnhancedMemory))
        );
        let ok = resolve_strategy(req(false, false, true, false), &probe, &catalog).unwrap();
        assert_eq!(ok.kind, StrategyKind::EnhancedEnergy);
        assert_eq!(ok.artifact.id, "perfetto_config_power_rails.pbtxt");
    }

    #[test]
    fn modes_map_to_requests() {
        assert!(ProfileRequest::from_mode(ProfileMode::Legacy).force_legacy);
        let both = ProfileRequest::from_mode(ProfileMode::Both);
        assert!(both.energy && both.memory && !both.force_legacy);
        assert_eq!("memory".parse::<ProfileMode>(), Ok(ProfileMode::Memory));
        assert!("Energy".parse::<ProfileMode>().is_err());
    }

    #[test]
    fn required_capability_follows_energy() {
        assert_eq!(StrategyKind::EnhancedEnergy.required_capability(), Some(Capability::PowerRails));
        assert_eq!(StrategyKind::EnhancedBoth.required_capability(), Some(Capability::PowerRails));
        assert_eq!(StrategyKind::EnhancedMemory.required_capability(), None);
        assert_eq!(StrategyKind::Legacy.required_capability(), None);
    }
}
