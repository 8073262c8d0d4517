//! Step clock for the fixed-timestep driver
//!
//! The balancer runs once per fixed simulation step. Each step carries a
//! `delta_time` supplied by the host, so the clock tracks both the step
//! count and the simulated seconds elapsed.

use serde::{Deserialize, Serialize};

/// Counts fixed simulation steps and the simulated time they covered
///
/// # Example
/// ```
/// use fuel_balancer_core_rs::StepClock;
///
/// let mut clock = StepClock::new();
/// assert_eq!(clock.current_tick(), 0);
///
/// clock.advance(0.02);
/// assert_eq!(clock.current_tick(), 1);
/// assert!((clock.elapsed_seconds() - 0.02).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepClock {
    /// Steps completed since the driver was created
    current_tick: usize,
    /// Sum of every completed step's delta time (seconds)
    elapsed_seconds: f64,
}

impl StepClock {
    /// Create a clock at tick 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Complete one step of `delta_time` seconds
    pub fn advance(&mut self, delta_time: f64) {
        self.current_tick += 1;
        self.elapsed_seconds += delta_time;
    }

    /// Get the current tick (steps completed so far)
    pub fn current_tick(&self) -> usize {
        self.current_tick
    }

    /// Get simulated seconds covered by all completed steps
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed_seconds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_accumulates_variable_steps() {
        let mut clock = StepClock::new();
        clock.advance(0.02);
        clock.advance(0.04);
        clock.advance(0.0);

        assert_eq!(clock.current_tick(), 3);
        assert!((clock.elapsed_seconds() - 0.06).abs() < 1e-12);
    }
}
