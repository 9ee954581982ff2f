//! CLI for emprofile: energy, memory and battery-drain reports from device
//! trace samples.

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "emprofile")]
#[command(about = "emprofile: energy and memory profiling reports for mobile devices")]
#[command(version = emprofile_core::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve which collection strategy and collector config a session would use
    Plan {
        /// Profiling mode
        #[arg(long, default_value = "energy", value_parser = ["legacy", "energy", "memory", "both"])]
        mode: String,

        /// Use the legacy battery-counter collector regardless of device support
        #[arg(long)]
        force_legacy: bool,

        /// Use the rail-based collector without probing the device
        #[arg(long)]
        force_enhanced: bool,

        /// Device exposes power rails
        #[arg(long)]
        rails_supported: bool,

        /// Device has no trace collector
        #[arg(long)]
        no_collector: bool,

        /// Path to a JSON config (artifact catalog, top rails, memory counters)
        #[arg(long)]
        config: Option<String>,
    },

    /// Compute energy, memory and battery drain from extracted trace samples.
    /// Samples are a JSON array of {"counter", "ts", "value"} rows.
    Analyze {
        /// Samples file
        #[arg(long)]
        samples: String,

        /// Profiling mode the samples were collected with
        #[arg(long, default_value = "both", value_parser = ["legacy", "energy", "memory", "both"])]
        mode: String,

        /// Battery service dump captured with the trace, for drain estimation
        #[arg(long)]
        battery: Option<String>,

        /// Package name of the profiled app
        #[arg(long)]
        app: Option<String>,

        /// Session duration in seconds
        #[arg(long)]
        duration: Option<f64>,

        /// Export format
        #[arg(long, default_value = "json", value_parser = ["json", "csv"])]
        format: String,

        /// Export path (default: emprofile_{mode}_{unix_seconds}.{format})
        #[arg(long)]
        output: Option<String>,

        /// Path to a JSON config
        #[arg(long)]
        config: Option<String>,
    },

    /// Estimate battery drain for a given energy from a battery service dump
    Battery {
        /// Battery service dump file
        #[arg(long)]
        input: String,

        /// Consumed energy in Joules
        #[arg(long)]
        energy_joules: f64,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Plan {
            mode,
            force_legacy,
            force_enhanced,
            rails_supported,
            no_collector,
            config,
        } => commands::plan::run(commands::plan::PlanCommandConfig {
            mode: &mode,
            force_legacy,
            force_enhanced,
            rails_supported,
            collector: !no_collector,
            config_path: config.as_deref(),
        }),
        Commands::Analyze {
            samples,
            mode,
            battery,
            app,
            duration,
            format,
            output,
            config,
        } => commands::analyze::run(commands::analyze::AnalyzeCommandConfig {
            samples_path: &samples,
            mode: &mode,
            battery_path: battery.as_deref(),
            app: app.as_deref(),
            duration_seconds: duration,
            format: &format,
            output_path: output.as_deref(),
            config_path: config.as_deref(),
        }),
        Commands::Battery {
            input,
            energy_joules,
        } => commands::battery::run(&input, energy_joules),
    }
}
