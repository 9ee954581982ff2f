use emprofile_core::{BatteryDrainEstimator, DumpFile};

use super::summary::render_drain;

pub fn run(input: &str, energy_joules: f64) {
    if !energy_joules.is_finite() {
        eprintln!("Invalid --energy-joules value: {energy_joules}. Expected a finite number.");
        std::process::exit(2);
    }

    let estimator = BatteryDrainEstimator::new(DumpFile::new(input));
    match estimator.estimate_drain(energy_joules) {
        Ok(drain) => print!("{}", render_drain(Some(&drain))),
        Err(e) => {
            eprintln!("Error: {e}");
            print!("{}", render_drain(None));
            std::process::exit(2);
        }
    }
}
