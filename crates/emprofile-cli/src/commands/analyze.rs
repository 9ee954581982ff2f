use emprofile_core::{
    BatteryDrainEstimator, CounterRow, DrainEstimate, DumpFile, ProfileMode, ProfileRequest,
    SeriesSet, SessionInfo, StaticProbe, analyze_session, resolve_strategy,
};
use log::{info, warn};

use super::export::{ExportFormat, export};
use super::summary::{render_drain, render_report};

pub struct AnalyzeCommandConfig<'a> {
    pub samples_path: &'a str,
    pub mode: &'a str,
    pub battery_path: Option<&'a str>,
    pub app: Option<&'a str>,
    pub duration_seconds: Option<f64>,
    pub format: &'a str,
    pub output_path: Option<&'a str>,
    pub config_path: Option<&'a str>,
}

/// Read a samples file: a JSON array of `{"counter", "ts", "value"}` rows.
pub fn load_samples(path: &str) -> Result<SeriesSet, String> {
    let text = std::fs::read_to_string(path).map_err(|e| format!("failed to read {path}: {e}"))?;
    let rows: Vec<CounterRow> =
        serde_json::from_str(&text).map_err(|e| format!("failed to parse {path}: {e}"))?;
    info!("loaded {} sample rows from {path}", rows.len());
    Ok(SeriesSet::from_rows(rows))
}

pub fn run(cmd: AnalyzeCommandConfig<'_>) {
    let config = super::load_config(cmd.config_path);
    let mode = super::parse_mode(cmd.mode);
    if mode == ProfileMode::Both {
        warn!(
            "profiling energy and memory together adds collector overhead; \
             use separate runs when precise energy figures matter"
        );
    }

    let samples = match load_samples(cmd.samples_path) {
        Ok(samples) => samples,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    };

    // Offline: a trace with rail tracks came from a rails-capable device.
    let probe = StaticProbe::with_rails(!samples.rails().is_empty());
    let strategy = match resolve_strategy(ProfileRequest::from_mode(mode), &probe, &config.artifacts)
    {
        Ok(strategy) => strategy,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    };

    let estimator = cmd.battery_path.map(|p| BatteryDrainEstimator::new(DumpFile::new(p)));
    let info = SessionInfo {
        app: cmd.app.map(str::to_string),
        duration_seconds: cmd.duration_seconds,
    };
    let analysis = match analyze_session(
        &strategy,
        &samples,
        estimator.as_ref().map(|e| e as &dyn DrainEstimate),
        &info,
        &config,
    ) {
        Ok(analysis) => analysis,
        Err(e) => {
            eprintln!("Error: {e} (strategy: {})", strategy.kind);
            std::process::exit(2);
        }
    };
    let report = analysis.report;

    print!("{}", render_report(&report, config.top_rails));
    let consumed = report.energy.as_ref().map_or(0.0, |e| e.total);
    if estimator.is_some() && consumed > 0.0 {
        print!("{}", render_drain(report.battery_drain.as_ref()));
    }
    if let Some(e) = &analysis.drain_error {
        eprintln!("Battery drain not computed: {e}");
    }

    let format = ExportFormat::parse(cmd.format);
    let path = cmd.output_path.map(str::to_string).unwrap_or_else(|| {
        super::default_output_path(&report.mode, format.extension(), super::unix_seconds())
    });
    export(&report, format, &path, &config.memory_counter_names());
}
