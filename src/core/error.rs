use std::fmt;

use serde::Serialize;
use thiserror::Error;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Capitalization,
    Withdrawal,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Capitalization => f.write_str("capitalization"),
            Phase::Withdrawal => f.write_str("withdrawal"),
        }
    }
}

/// Failure kinds reported by the planning core.
///
/// Solver and selector failures are carried inside the plan report; only the
/// precondition failures (`InvalidGoalParameters`, an empty capitalization
/// list) abort a run before any solve is attempted.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum PlanError {
    #[error("invalid goal parameters: {reason}")]
    InvalidGoalParameters { reason: String },

    #[error("derivative vanished at iteration {iteration} (x = {x})")]
    SingularDerivative { iteration: u32, x: f64 },

    #[error("no convergence after {iterations} iterations (last x = {last})")]
    NonConvergent { iterations: u32, last: f64 },

    #[error("no investment reaches the required rate {required_rate}")]
    NoQualifyingInvestment { required_rate: f64 },

    #[error("the {phase} investment list is empty")]
    EmptyInvestmentList { phase: Phase },
}

impl PlanError {
    pub(crate) fn invalid_goal(reason: impl Into<String>) -> Self {
        PlanError::InvalidGoalParameters {
            reason: reason.into(),
        }
    }
}
