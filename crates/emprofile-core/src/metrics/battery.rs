//! Battery-drain estimation.
//!
//! Converts consumed energy into a share of the device's health-adjusted
//! battery energy. Device properties come from a [`BatteryPropertySource`] and
//! are fetched at most once per estimator unless a refresh is forced.
//! Concurrent first callers share a single in-flight fetch.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::DrainError;

/// Android `BatteryManager.BATTERY_HEALTH_*` codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BatteryHealth {
    Unknown,
    Good,
    Overheat,
    Dead,
    OverVoltage,
    UnspecifiedFailure,
    Cold,
    Other(i64),
}

impl BatteryHealth {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Self::Unknown,
            2 => Self::Good,
            3 => Self::Overheat,
            4 => Self::Dead,
            5 => Self::OverVoltage,
            6 => Self::UnspecifiedFailure,
            7 => Self::Cold,
            other => Self::Other(other),
        }
    }

    /// Fraction of design capacity assumed usable.
    pub fn multiplier(self) -> f64 {
        match self {
            Self::Good => 1.0,
            Self::Overheat => 0.8,
            Self::Dead => 0.5,
            _ => 0.9,
        }
    }
}

impl std::fmt::Display for BatteryHealth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::Good => write!(f, "good"),
            Self::Overheat => write!(f, "overheat"),
            Self::Dead => write!(f, "dead"),
            Self::OverVoltage => write!(f, "over_voltage"),
            Self::UnspecifiedFailure => write!(f, "unspecified_failure"),
            Self::Cold => write!(f, "cold"),
            Self::Other(code) => write!(f, "code_{code}"),
        }
    }
}

/// Health multiplier for a raw health code: 2→1.0, 3→0.8, 4→0.5, else 0.9.
pub fn health_multiplier(code: i64) -> f64 {
    BatteryHealth::from_code(code).multiplier()
}

/// Parsed device output before required-field validation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawBatteryProperties {
    pub capacity_mah: Option<f64>,
    pub voltage_mv: Option<i64>,
    pub temperature_deci_c: Option<i64>,
    pub health_code: Option<i64>,
    pub level_percent: Option<i64>,
}

/// Battery properties with every field the drain calculation needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatteryProperties {
    pub capacity_mah: f64,
    pub voltage_mv: i64,
    pub temperature_deci_c: Option<i64>,
    pub health_code: i64,
    pub level_percent: Option<i64>,
}

impl BatteryProperties {
    pub fn health(&self) -> BatteryHealth {
        BatteryHealth::from_code(self.health_code)
    }

    pub fn temperature_c(&self) -> Option<f64> {
        self.temperature_deci_c.map(|t| t as f64 / 10.0)
    }
}

impl TryFrom<RawBatteryProperties> for BatteryProperties {
    type Error = DrainError;

    fn try_from(raw: RawBatteryProperties) -> Result<Self, Self::Error> {
        match (raw.voltage_mv, raw.capacity_mah, raw.health_code) {
            (Some(voltage_mv), Some(capacity_mah), Some(health_code)) => Ok(Self {
                capacity_mah,
                voltage_mv,
                temperature_deci_c: raw.temperature_deci_c,
                health_code,
                level_percent: raw.level_percent,
            }),
            (voltage, capacity, health) => {
                let mut missing = Vec::new();
                if voltage.is_none() {
                    missing.push("voltage_mv");
                }
                if capacity.is_none() {
                    missing.push("capacity_mah");
                }
                if health.is_none() {
                    missing.push("health_code");
                }
                Err(DrainError::PropertiesUnavailable { missing })
            }
        }
    }
}

/// Drain figures for one consumed-energy value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatteryDrainReport {
    pub design_capacity_mah: f64,
    pub current_voltage_v: f64,
    pub health_multiplier: f64,
    pub effective_capacity_mah: f64,
    pub total_battery_energy_wh: f64,
    pub consumed_energy_joules: f64,
    pub consumed_energy_wh: f64,
    #[serde(rename = "battery_drain_percentage")]
    pub battery_drain_percent: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature_c: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery_level_percent: Option<i64>,
}

impl BatteryDrainReport {
    /// Compute drain figures from known properties.
    pub fn compute(
        props: &BatteryProperties,
        consumed_energy_joules: f64,
    ) -> Result<Self, DrainError> {
        let health_multiplier = health_multiplier(props.health_code);
        let effective_capacity_mah = props.capacity_mah * health_multiplier;
        let current_voltage_v = props.voltage_mv as f64 / 1000.0;
        let total_battery_energy_wh = (effective_capacity_mah * current_voltage_v) / 1000.0;
        let consumed_energy_wh = consumed_energy_joules / 3600.0;

        if total_battery_energy_wh == 0.0 {
            warn!("total battery energy is zero, cannot compute drain percentage");
            return Err(DrainError::ZeroBatteryEnergy);
        }

        Ok(Self {
            design_capacity_mah: props.capacity_mah,
            current_voltage_v,
            health_multiplier,
            effective_capacity_mah,
            total_battery_energy_wh,
            consumed_energy_joules,
            consumed_energy_wh,
            battery_drain_percent: consumed_energy_wh / total_battery_energy_wh * 100.0,
            temperature_c: props.temperature_c(),
            battery_level_percent: props.level_percent,
        })
    }
}

/// Device-side provider of battery properties.
///
/// Implementations talk to the device (or read a captured dump); the
/// estimator only sees the parsed fields.
pub trait BatteryPropertySource: Send + Sync {
    fn fetch(&self) -> Result<RawBatteryProperties, DrainError>;
}

impl<F> BatteryPropertySource for F
where
    F: Fn() -> Result<RawBatteryProperties, DrainError> + Send + Sync,
{
    fn fetch(&self) -> Result<RawBatteryProperties, DrainError> {
        self()
    }
}

#[derive(Default)]
struct PropertyCache {
    cached: Option<BatteryProperties>,
    in_flight: bool,
    /// Bumped every time a fetch lands.
    landings: u64,
    /// Bumped by `reset`; a flight started under an older generation does
    /// not repopulate `cached`.
    generation: u64,
    last_landed: Option<Result<BatteryProperties, DrainError>>,
}

/// Drain estimator with a memoized property fetch.
pub struct BatteryDrainEstimator<S> {
    source: S,
    cache: Mutex<PropertyCache>,
    landed: Condvar,
}

impl<S: BatteryPropertySource> BatteryDrainEstimator<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            cache: Mutex::new(PropertyCache::default()),
            landed: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PropertyCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Battery properties, fetched on first use.
    ///
    /// With `force_refresh` the cached value is dropped and the source is
    /// queried again. A caller arriving while a fetch is in flight waits for
    /// it and returns its outcome instead of starting another one. Failed
    /// fetches are not cached.
    pub fn fetch_properties(&self, force_refresh: bool) -> Result<BatteryProperties, DrainError> {
        let mut cache = self.lock();

        if cache.in_flight {
            let seen = cache.landings;
            while cache.landings == seen {
                cache = self
                    .landed
                    .wait(cache)
                    .unwrap_or_else(PoisonError::into_inner);
            }
            return cache.last_landed.clone().unwrap_or_else(|| {
                Err(DrainError::SourceFailed("property fetch did not complete".into()))
            });
        }

        if !force_refresh {
            if let Some(props) = &cache.cached {
                return Ok(props.clone());
            }
        }

        cache.cached = None;
        cache.in_flight = true;
        let generation = cache.generation;
        drop(cache);

        let mut flight = Flight {
            estimator: self,
            generation,
            outcome: None,
        };
        info!("querying device for battery properties");
        let result = self.source.fetch().and_then(BatteryProperties::try_from);
        if let Err(e) = &result {
            warn!("{e}; battery drain percentage will not be available");
        }
        flight.outcome = Some(result.clone());
        drop(flight);
        result
    }

    /// Estimate drain for `consumed_energy_joules` using cached properties.
    pub fn estimate_drain(
        &self,
        consumed_energy_joules: f64,
    ) -> Result<BatteryDrainReport, DrainError> {
        let props = self.fetch_properties(false)?;
        BatteryDrainReport::compute(&props, consumed_energy_joules)
    }

    /// Cached properties, without querying the source.
    pub fn cached_properties(&self) -> Option<BatteryProperties> {
        self.lock().cached.clone()
    }

    /// Forget cached properties; the next call fetches again. A fetch already
    /// in flight still answers its waiters but is not cached.
    pub fn reset(&self) {
        let mut cache = self.lock();
        cache.cached = None;
        cache.generation += 1;
    }
}

/// Anything that can turn consumed Joules into a drain report.
pub trait DrainEstimate {
    fn estimate_drain(&self, consumed_energy_joules: f64)
    -> Result<BatteryDrainReport, DrainError>;
}

impl<S: BatteryPropertySource> DrainEstimate for BatteryDrainEstimator<S> {
    fn estimate_drain(
        &self,
        consumed_energy_joules: f64,
    ) -> Result<BatteryDrainReport, DrainError> {
        BatteryDrainEstimator::estimate_drain(self, consumed_energy_joules)
    }
}

/// Publishes a fetch outcome to waiters, including when the fetch panicked.
struct Flight<'a, S: BatteryPropertySource> {
    estimator: &'a BatteryDrainEstimator<S>,
    generation: u64,
    outcome: Option<Result<BatteryProperties, DrainError>>,
}

impl<S: BatteryPropertySource> Drop for Flight<'_, S> {
    fn drop(&mut self) {
        let outcome = self
            .outcome
            .take()
            .unwrap_or_else(|| Err(DrainError::SourceFailed("property fetch panicked".into())));
        let mut cache = self.estimator.lock();
        if cache.generation == self.generation {
            cache.cached = outcome.as_ref().ok().cloned();
        }
        cache.in_flight = false;
        cache.landings += 1;
        cache.last_landed = Some(outcome);
        drop(cache);
        self.estimator.landed.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn good_raw() -> RawBatteryProperties {
        RawBatteryProperties {
            capacity_mah: Some(3000.0),
            voltage_mv: Some(3800),
            temperature_deci_c: Some(281),
            health_code: Some(2),
            level_percent: Some(87),
        }
    }

    struct CountingSource {
        calls: Arc<AtomicUsize>,
        delay: Duration,
        raw: RawBatteryProperties,
    }

    impl CountingSource {
        fn new(raw: RawBatteryProperties, delay: Duration) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let source = Self {
                calls: Arc::clone(&calls),
                delay,
                raw,
            };
            (source, calls)
        }
    }

    impl BatteryPropertySource for CountingSource {
        fn fetch(&self) -> Result<RawBatteryProperties, DrainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(self.delay);
            Ok(self.raw.clone())
        }
    }

    #[test]
    fn health_multiplier_table() {
        assert_eq!(health_multiplier(2), 1.0);
        assert_eq!(health_multiplier(3), 0.8);
        assert_eq!(health_multiplier(4), 0.5);
        for code in [-7, -1, 0, 1, 5, 6, 7, 99, i64::MIN, i64::MAX] {
            assert_eq!(health_multiplier(code), 0.9, "code {code}");
        }
    }

    #[test]
    fn reference_drain_figures() {
        let props = BatteryProperties::try_from(good_raw()).unwrap();
        let r = BatteryDrainReport::compute(&props, 18000.0).unwrap();
        assert_eq!(r.health_multiplier, 1.0);
        assert!((r.effective_capacity_mah - 3000.0).abs() < 1e-9);
        assert!((r.current_voltage_v - 3.8).abs() < 1e-12);
        assert!((r.total_battery_energy_wh - 11.4).abs() < 1e-9);
        assert!((r.consumed_energy_wh - 5.0).abs() < 1e-12);
        assert!((r.battery_drain_percent - 43.859649).abs() < 1e-5);
        assert_eq!(r.temperature_c, Some(28.1));
        assert_eq!(r.battery_level_percent, Some(87));
    }

    #[test]
    fn degraded_health_shrinks_capacity() {
        let mut raw = good_raw();
        raw.health_code = Some(4);
        let props = BatteryProperties::try_from(raw).unwrap();
        let r = BatteryDrainReport::compute(&props, 0.0).unwrap();
        assert!((r.effective_capacity_mah - 1500.0).abs() < 1e-9);
        assert_eq!(r.battery_drain_percent, 0.0);
    }

    #[test]
    fn zero_battery_energy_is_an_error() {
        let mut raw = good_raw();
        raw.voltage_mv = Some(0);
        let props = BatteryProperties::try_from(raw).unwrap();
        assert_eq!(
            BatteryDrainReport::compute(&props, 100.0),
            Err(DrainError::ZeroBatteryEnergy)
        );
    }

    #[test]
    fn missing_required_fields_are_named() {
        let raw = RawBatteryProperties {
            capacity_mah: Some(1.0),
            ..Default::default()
        };
        match BatteryProperties::try_from(raw) {
            Err(DrainError::PropertiesUnavailable { missing }) => {
                assert_eq!(missing, vec!["voltage_mv", "health_code"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn optional_fields_do_not_block_estimate() {
        let raw = RawBatteryProperties {
            temperature_deci_c: None,
            level_percent: None,
            ..good_raw()
        };
        let est = BatteryDrainEstimator::new(move || -> Result<RawBatteryProperties, DrainError> {
            Ok(raw.clone())
        });
        let r = est.estimate_drain(36.0).unwrap();
        assert!(r.temperature_c.is_none());
        assert!(r.battery_level_percent.is_none());
    }

    #[test]
    fn properties_fetched_once_until_forced() {
        let (source, calls) = CountingSource::new(good_raw(), Duration::ZERO);
        let est = BatteryDrainEstimator::new(source);
        est.estimate_drain(1.0).unwrap();
        est.estimate_drain(2.0).unwrap();
        est.fetch_properties(false).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        est.fetch_properties(true).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        est.reset();
        assert!(est.cached_properties().is_none());
        est.estimate_drain(1.0).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn reset_during_fetch_forces_next_fetch() {
        let (source, calls) = CountingSource::new(good_raw(), Duration::from_millis(100));
        let est = Arc::new(BatteryDrainEstimator::new(source));

        let first = {
            let est = Arc::clone(&est);
            std::thread::spawn(move || est.estimate_drain(1.0))
        };
        while calls.load(Ordering::SeqCst) == 0 {
            std::thread::sleep(Duration::from_millis(1));
        }
        est.reset();
        assert!(first.join().unwrap().is_ok());
        assert!(est.cached_properties().is_none());

        est.estimate_drain(1.0).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        est.estimate_drain(1.0).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn failed_fetch_is_not_memoized() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let est = BatteryDrainEstimator::new(move || -> Result<RawBatteryProperties, DrainError> {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(DrainError::SourceFailed("no device".into()))
        });
        assert!(est.estimate_drain(1.0).is_err());
        assert!(est.estimate_drain(1.0).is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn concurrent_first_calls_share_one_fetch() {
        let (source, calls) = CountingSource::new(good_raw(), Duration::from_millis(50));
        let est = Arc::new(BatteryDrainEstimator::new(source));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let est = Arc::clone(&est);
                std::thread::spawn(move || est.estimate_drain(18000.0))
            })
            .collect();
        for h in handles {
            let r = h.join().unwrap().unwrap();
            assert!((r.battery_drain_percent - 43.859649).abs() < 1e-5);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn health_display_names() {
        assert_eq!(BatteryHealth::from_code(2).to_string(), "good");
        assert_eq!(BatteryHealth::from_code(42).to_string(), "code_42");
    }
}
