//! Derived metrics: rail energy, memory statistics and battery drain.

pub mod battery;
pub mod energy;
pub mod memory;
