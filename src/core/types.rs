use serde::Serialize;

use super::error::{Phase, PlanError};

const MONTHS_PER_YEAR: u32 = 12;

#[derive(Debug, Clone, PartialEq)]
pub struct FinancialGoal {
    pub graduation_age: u32,
    pub cap_end_age: u32,
    pub net_monthly_salary: f64,
    pub investment_fraction: f64,
    pub target_principal: f64,
    pub withdrawal_end_age: u32,
}

impl FinancialGoal {
    /// Largest accepted age in years; bounds both horizons to 1800 periods.
    pub const MAX_AGE: u32 = 150;

    pub fn validate(&self) -> Result<(), PlanError> {
        if self.graduation_age == 0 || self.cap_end_age == 0 || self.withdrawal_end_age == 0 {
            return Err(PlanError::invalid_goal("ages must be > 0"));
        }
        if self.withdrawal_end_age > Self::MAX_AGE {
            return Err(PlanError::invalid_goal(format!("ages must be <= {}", Self::MAX_AGE)));
        }
        if self.cap_end_age <= self.graduation_age {
            return Err(PlanError::invalid_goal(
                "capitalization end age must be > graduation age",
            ));
        }
        if self.withdrawal_end_age <= self.cap_end_age {
            return Err(PlanError::invalid_goal(
                "withdrawal end age must be > capitalization end age",
            ));
        }
        if !self.target_principal.is_finite() || self.target_principal <= 0.0 {
            return Err(PlanError::invalid_goal("target principal must be > 0"));
        }
        if !self.net_monthly_salary.is_finite() || self.net_monthly_salary < 0.0 {
            return Err(PlanError::invalid_goal("net monthly salary must be >= 0"));
        }
        if !(0.0..=1.0).contains(&self.investment_fraction) {
            return Err(PlanError::invalid_goal(
                "investment fraction must be between 0 and 1",
            ));
        }
        Ok(())
    }

    pub fn monthly_contribution(&self) -> f64 {
        self.net_monthly_salary * self.investment_fraction
    }

    pub fn capitalization_periods(&self) -> u32 {
        self.cap_end_age
            .saturating_sub(self.graduation_age)
            .saturating_mul(MONTHS_PER_YEAR)
    }

    pub fn withdrawal_periods(&self) -> u32 {
        self.withdrawal_end_age
            .saturating_sub(self.cap_end_age)
            .saturating_mul(MONTHS_PER_YEAR)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Investment {
    pub name: String,
    pub category: String,
    pub periodic_rate: f64,
    pub risk_level: u8,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SolveOutcome {
    Converged { root: f64, iterations: u32 },
    SingularDerivative { iteration: u32, x: f64 },
    NonConvergent { iterations: u32, last: f64 },
}

impl SolveOutcome {
    pub fn root(&self) -> Option<f64> {
        match *self {
            SolveOutcome::Converged { root, .. } => Some(root),
            _ => None,
        }
    }

    pub fn into_result(self) -> Result<f64, PlanError> {
        self.into_converged().map(|(root, _)| root)
    }

    /// Root and iteration count, or the failure kind.
    pub fn into_converged(self) -> Result<(f64, u32), PlanError> {
        match self {
            SolveOutcome::Converged { root, iterations } => Ok((root, iterations)),
            SolveOutcome::SingularDerivative { iteration, x } => {
                Err(PlanError::SingularDerivative { iteration, x })
            }
            SolveOutcome::NonConvergent { iterations, last } => {
                Err(PlanError::NonConvergent { iterations, last })
            }
        }
    }
}

/// Minimum periodic rate that lets the contributions reach the target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequiredRate {
    pub rate: f64,
    pub iterations: u32,
}

impl RequiredRate {
    /// A non-positive rate means the contributions alone already cover the
    /// target; it is a valid answer, not a failure.
    pub fn is_growth_free(&self) -> bool {
        self.rate <= 0.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectionOutcome {
    Selected(Investment),
    NoneQualifies,
}

impl SelectionOutcome {
    pub fn into_result(self, required_rate: f64) -> Result<Investment, PlanError> {
        match self {
            SelectionOutcome::Selected(investment) => Ok(investment),
            SelectionOutcome::NoneQualifies => {
                Err(PlanError::NoQualifyingInvestment { required_rate })
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthTrajectory {
    pub balances: Vec<f64>,
    pub goal_reached_period: Option<usize>,
}

impl GrowthTrajectory {
    pub fn periods(&self) -> usize {
        self.balances.len().saturating_sub(1)
    }

    pub fn final_balance(&self) -> f64 {
        self.balances.last().copied().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CapitalizationReport {
    pub target_principal: f64,
    pub monthly_contribution: f64,
    pub periods: u32,
    pub required_rate: Result<RequiredRate, PlanError>,
    pub selected: Option<Investment>,
    pub trajectory: Option<GrowthTrajectory>,
}

impl CapitalizationReport {
    pub fn is_feasible(&self) -> bool {
        self.selected.is_some() && self.trajectory.is_some()
    }

    /// The step that stopped the capitalization phase, if any.
    pub fn failure(&self) -> Option<PlanError> {
        match &self.required_rate {
            Err(err) => Some(err.clone()),
            Ok(required) if self.selected.is_none() => Some(PlanError::NoQualifyingInvestment {
                required_rate: required.rate,
            }),
            Ok(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WithdrawalCandidate {
    pub investment: Investment,
    pub withdrawal: Result<f64, PlanError>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WithdrawalPhase {
    NotAttempted,
    Failed(PlanError),
    Evaluated {
        principal: f64,
        periods: u32,
        candidates: Vec<WithdrawalCandidate>,
    },
}

impl WithdrawalPhase {
    pub(crate) fn empty_list() -> Self {
        WithdrawalPhase::Failed(PlanError::EmptyInvestmentList {
            phase: Phase::Withdrawal,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlanReport {
    pub capitalization: CapitalizationReport,
    pub withdrawal: WithdrawalPhase,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goal() -> FinancialGoal {
        FinancialGoal {
            graduation_age: 22,
            cap_end_age: 60,
            net_monthly_salary: 5_000.0,
            investment_fraction: 0.2,
            target_principal: 1_000_000.0,
            withdrawal_end_age: 85,
        }
    }

    #[test]
    fn periods_are_whole_years_in_months() {
        let goal = goal();
        assert!(goal.validate().is_ok());
        assert_eq!(goal.capitalization_periods(), 456);
        assert_eq!(goal.withdrawal_periods(), 300);
    }

    #[test]
    fn validate_rejects_ages_beyond_lifespan() {
        let goal = FinancialGoal {
            graduation_age: 1,
            cap_end_age: 400_000_000,
            withdrawal_end_age: 400_000_001,
            ..goal()
        };
        let err = goal.validate().expect_err("age span is unbounded");
        assert_eq!(err, PlanError::invalid_goal("ages must be <= 150"));
    }

    #[test]
    fn validate_accepts_maximum_age() {
        let goal = FinancialGoal {
            withdrawal_end_age: FinancialGoal::MAX_AGE,
            ..goal()
        };
        assert!(goal.validate().is_ok());
        assert_eq!(goal.withdrawal_periods(), (150 - 60) * 12);
    }

    #[test]
    fn period_helpers_saturate_instead_of_overflowing() {
        let goal = FinancialGoal {
            graduation_age: 1,
            cap_end_age: u32::MAX - 1,
            withdrawal_end_age: u32::MAX,
            ..goal()
        };
        assert_eq!(goal.capitalization_periods(), u32::MAX);
        assert_eq!(goal.withdrawal_periods(), 12);
    }
}
