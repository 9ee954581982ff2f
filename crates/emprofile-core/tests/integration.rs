//! Integration tests for emprofile-core.
//!
//! These tests exercise the full offline pipeline:
//! strategy resolution → sample grouping → calculators → report.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use emprofile_core::{
    ArtifactCatalog, BatteryDrainEstimator, CounterRow, DrainError, DumpText,
    ProfileMode, ProfileRequest, ProfilerConfig, RawBatteryProperties, ResolveError, SeriesSet,
    SessionInfo, StaticProbe, StrategyKind, analyze_session, compute_energy,
    compute_memory_stats, memory_used, resolve_strategy,
};

const MB: f64 = 1024.0 * 1024.0;

const DUMP: &str = "Current Battery Service state:
  AC powered: false
  USB powered: true
  Max charging voltage: 5000000
  Charge counter: 3000000
  status: 3
  health: 2
  level: 64
  voltage: 3800
  temperature: 305
";

fn row(counter: &str, ts: i64, value: f64) -> CounterRow {
    CounterRow {
        counter: counter.to_string(),
        ts,
        value,
    }
}

fn trace_rows() -> Vec<CounterRow> {
    vec![
        row("power.rail.A", 0, 100.0),
        row("power.rail.B", 0, 5.0),
        row("MemTotal", 0, 8000.0 * MB),
        row("MemAvailable", 0, 1000.0 * MB),
        row("power.rail.A", 1, 100.0),
        row("MemTotal", 1, 8000.0 * MB),
        row("MemAvailable", 1, 2000.0 * MB),
        row("power.rail.A", 2, 350.0),
        row("MemTotal", 2, 8000.0 * MB),
        row("MemAvailable", 2, 3000.0 * MB),
        row("SwapFree", 2, 1.0),
    ]
}

#[test]
fn reference_energy_example() {
    let set = SeriesSet::from_rows(trace_rows());
    let energy = compute_energy(&set.rails());
    assert_eq!(energy.by_rail.len(), 1);
    assert!((energy.by_rail["power.rail.A"] - 0.00025).abs() < 1e-12);
    assert!((energy.total - 0.00025).abs() < 1e-12);
}

#[test]
fn reference_memory_used_example() {
    let set = SeriesSet::from_rows(trace_rows());
    let stats = compute_memory_stats(&set.system_memory());
    assert!(!stats.contains_key("SwapFree"));
    assert_eq!(stats["MemTotal"].samples, 3);
    let used = memory_used(&stats).unwrap();
    assert!((used.avg_mb - 6000.0).abs() < 1e-9);
    assert!((used.min_mb - 5000.0).abs() < 1e-9);
    assert!((used.max_mb - 7000.0).abs() < 1e-9);
}

#[test]
fn reference_drain_from_dump_text() {
    let est = BatteryDrainEstimator::new(DumpText(DUMP.to_string()));
    let drain = est.estimate_drain(18000.0).unwrap();
    assert_eq!(drain.design_capacity_mah, 3000.0);
    assert!((drain.total_battery_energy_wh - 11.4).abs() < 1e-9);
    assert!((drain.consumed_energy_wh - 5.0).abs() < 1e-12);
    assert!((drain.battery_drain_percent - 43.86).abs() < 0.01);
    assert_eq!(drain.temperature_c, Some(30.5));
    assert_eq!(drain.battery_level_percent, Some(64));
}

#[test]
fn drain_unavailable_when_dump_lacks_voltage() {
    let est = BatteryDrainEstimator::new(DumpText("health: 2\nCharge counter: 1000\n".into()));
    match est.estimate_drain(1.0) {
        Err(DrainError::PropertiesUnavailable { missing }) => assert_eq!(missing, vec!["voltage_mv"]),
        other => panic!("expected unavailable, got {other:?}"),
    }
}

#[test]
fn full_pipeline_both_mode() {
    let config = ProfilerConfig::default();
    let strategy = resolve_strategy(
        ProfileRequest::from_mode(ProfileMode::Both),
        &StaticProbe::with_rails(true),
        &config.artifacts,
    )
    .unwrap();
    assert_eq!(strategy.kind, StrategyKind::EnhancedBoth);

    let mut rows = trace_rows();
    rows.push(row("power.rail.C", 0, 0.0));
    rows.push(row("power.rail.C", 3, 18_000e6));
    let samples = SeriesSet::from_rows(rows);

    let est = BatteryDrainEstimator::new(DumpText(DUMP.to_string()));
    let out = analyze_session(
        &strategy,
        &samples,
        Some(&est),
        &SessionInfo {
            app: Some("com.android.chrome".into()),
            duration_seconds: Some(30.0),
        },
        &config,
    )
    .unwrap();

    let report = out.report;
    assert_eq!(report.mode, "both");
    let energy = report.energy.as_ref().unwrap();
    let sum: f64 = energy.by_rail.values().sum();
    assert!((energy.total - sum).abs() < 1e-9);
    assert_eq!(energy.top_rails(5)[0].0, "power.rail.C");
    assert!(report.memory.as_ref().unwrap().contains_key("MemAvailable"));
    assert!(report.battery_drain.is_some());

    let json = serde_json::to_value(&report).unwrap();
    assert!(json["battery_drain"]["battery_drain_percentage"].is_number());
    let rail_a = json["energy"]["by_rail"]["power.rail.A"].as_f64().unwrap();
    assert!((rail_a - 0.00025).abs() < 1e-12);
}

#[test]
fn legacy_forced_on_capable_device() {
    let request = ProfileRequest {
        force_legacy: true,
        force_enhanced: false,
        energy: true,
        memory: true,
    };
    let strategy = resolve_strategy(
        request,
        &StaticProbe::with_rails(true),
        &ArtifactCatalog::default(),
    )
    .unwrap();
    assert_eq!(strategy.kind, StrategyKind::Legacy);
    assert_eq!(strategy.artifact.id, "perfetto.config.bin");
}

#[test]
fn resolver_errors_stop_setup() {
    let probe = StaticProbe::with_rails(true);
    assert_eq!(
        resolve_strategy(ProfileRequest::default(), &probe, &ArtifactCatalog::default()),
        Err(ResolveError::InvalidRequest)
    );
    assert_eq!(
        resolve_strategy(
            ProfileRequest::from_mode(ProfileMode::Energy),
            &probe,
            &ArtifactCatalog::empty(),
        ),
        Err(ResolveError::UnsupportedStrategy(StrategyKind::EnhancedEnergy))
    );
}

#[test]
fn shared_estimator_fetches_once_across_threads() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let est = Arc::new(BatteryDrainEstimator::new(
        move || -> Result<RawBatteryProperties, DrainError> {
            counter.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_millis(30));
            Ok(emprofile_core::parse_battery_dump(DUMP))
        },
    ));

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let est = Arc::clone(&est);
            std::thread::spawn(move || est.estimate_drain(100.0 * i as f64))
        })
        .collect();
    for h in handles {
        assert!(h.join().unwrap().is_ok());
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
