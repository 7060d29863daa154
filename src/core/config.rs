use thiserror::Error;

use super::solver::NewtonConfig;

pub const DEFAULT_TOLERANCE: f64 = 1e-6;
pub const DEFAULT_MAX_ITERATIONS: u32 = 100;
pub const DEFAULT_INITIAL_RATE_GUESS: f64 = 0.005;
pub const DEFAULT_CAPITALIZATION_STEP: f64 = 1e-6;
pub const DEFAULT_WITHDRAWAL_STEP: f64 = 1e-8;

/// Policy knobs for a planning run.
///
/// The capitalization equation is differentiated in the rate and the
/// withdrawal one in the payment, so each keeps its own finite-difference step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlannerConfig {
    pub newton: NewtonConfig,
    pub initial_rate_guess: f64,
    pub capitalization_step: f64,
    pub withdrawal_step: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            newton: NewtonConfig::default(),
            initial_rate_guess: DEFAULT_INITIAL_RATE_GUESS,
            capitalization_step: DEFAULT_CAPITALIZATION_STEP,
            withdrawal_step: DEFAULT_WITHDRAWAL_STEP,
        }
    }
}

/// A planner knob outside its accepted range. `knob` is the field name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{knob} {requirement}")]
pub struct InvalidKnob {
    pub knob: &'static str,
    pub requirement: &'static str,
}

fn invalid(knob: &'static str, requirement: &'static str) -> Result<(), InvalidKnob> {
    Err(InvalidKnob { knob, requirement })
}

impl PlannerConfig {
    pub fn validate(&self) -> Result<(), InvalidKnob> {
        if !self.newton.tolerance.is_finite() || self.newton.tolerance <= 0.0 {
            return invalid("tolerance", "must be > 0");
        }
        if self.newton.max_iterations == 0 {
            return invalid("max_iterations", "must be > 0");
        }
        if !self.initial_rate_guess.is_finite() || self.initial_rate_guess <= -1.0 {
            return invalid("initial_rate_guess", "must be > -1");
        }
        for (knob, step) in [
            ("capitalization_step", self.capitalization_step),
            ("withdrawal_step", self.withdrawal_step),
        ] {
            if !step.is_finite() || step <= 0.0 {
                return invalid(knob, "must be > 0");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_documented_knobs() {
        let config = PlannerConfig::default();
        assert_eq!(config.newton.tolerance, 1e-6);
        assert_eq!(config.newton.max_iterations, 100);
        assert_eq!(config.initial_rate_guess, 0.005);
        assert_eq!(config.capitalization_step, 1e-6);
        assert_eq!(config.withdrawal_step, 1e-8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_non_positive_step() {
        let config = PlannerConfig {
            withdrawal_step: 0.0,
            ..PlannerConfig::default()
        };
        let err = config.validate().expect_err("zero step must be rejected");
        assert_eq!(err.knob, "withdrawal_step");
        assert_eq!(err.to_string(), "withdrawal_step must be > 0");
    }

    #[test]
    fn validate_rejects_zero_iteration_budget() {
        let mut config = PlannerConfig::default();
        config.newton.max_iterations = 0;
        let err = config.validate().expect_err("zero budget must be rejected");
        assert_eq!(err.knob, "max_iterations");
    }

    #[test]
    fn validate_rejects_rate_guess_at_minus_one() {
        let config = PlannerConfig {
            initial_rate_guess: -1.0,
            ..PlannerConfig::default()
        };
        let err = config.validate().expect_err("(1 + i) must stay positive");
        assert_eq!(err.knob, "initial_rate_guess");
    }
}
