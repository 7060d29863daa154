use super::config::PlannerConfig;
use super::equations::{CapitalizationEquation, WithdrawalEquation};
use super::error::{Phase, PlanError};
use super::solver::{IterationObserver, SilentObserver, solve_equation};
use super::types::{
    CapitalizationReport, FinancialGoal, GrowthTrajectory, Investment, PlanReport, RequiredRate,
    SelectionOutcome, SolveOutcome, WithdrawalCandidate, WithdrawalPhase,
};

pub fn capitalization_equation(
    goal: &FinancialGoal,
    config: &PlannerConfig,
) -> CapitalizationEquation {
    CapitalizationEquation {
        payment: goal.monthly_contribution(),
        periods: goal.capitalization_periods(),
        future_value: goal.target_principal,
        step: config.capitalization_step,
    }
}

/// Minimum periodic rate for the goal's contributions to reach its target.
pub fn solve_required_rate<O>(
    goal: &FinancialGoal,
    config: &PlannerConfig,
    observer: &mut O,
) -> SolveOutcome
where
    O: IterationObserver + ?Sized,
{
    let equation = capitalization_equation(goal, config);
    let _span = tracing::debug_span!("solve", equation = "capitalization").entered();
    solve_equation(&equation, config.initial_rate_guess, config.newton, observer)
}

/// Lowest-risk candidate whose rate meets `required_rate`; ties go to the
/// earliest candidate in input order.
pub fn select_investment(required_rate: f64, candidates: &[Investment]) -> SelectionOutcome {
    let mut best: Option<&Investment> = None;
    for candidate in candidates
        .iter()
        .filter(|candidate| candidate.periodic_rate >= required_rate)
    {
        match best {
            Some(current) if current.risk_level <= candidate.risk_level => {}
            _ => best = Some(candidate),
        }
    }
    match best {
        Some(investment) => SelectionOutcome::Selected(investment.clone()),
        None => SelectionOutcome::NoneQualifies,
    }
}

/// Unbounded balance sequence: yields the balance before each period's growth
/// and contribution, starting from zero.
#[derive(Debug, Clone, Copy)]
pub struct GrowthPath {
    balance: f64,
    growth: f64,
    payment: f64,
}

impl GrowthPath {
    pub fn new(payment: f64, rate: f64) -> Self {
        Self {
            balance: 0.0,
            growth: 1.0 + rate,
            payment,
        }
    }
}

impl Iterator for GrowthPath {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        let recorded = self.balance;
        self.balance = self.balance * self.growth + self.payment;
        Some(recorded)
    }
}

pub fn project_growth(payment: f64, periods: u32, rate: f64, target: f64) -> GrowthTrajectory {
    let balances: Vec<f64> = GrowthPath::new(payment, rate)
        .take(periods as usize + 1)
        .collect();
    let goal_reached_period = balances.iter().position(|balance| *balance >= target);
    GrowthTrajectory {
        balances,
        goal_reached_period,
    }
}

/// Periodic withdrawal that exhausts `principal` in exactly `periods` periods.
pub fn solve_withdrawal<O>(
    principal: f64,
    periods: u32,
    rate: f64,
    config: &PlannerConfig,
    observer: &mut O,
) -> SolveOutcome
where
    O: IterationObserver + ?Sized,
{
    let equation = WithdrawalEquation {
        present_value: principal,
        rate,
        periods,
        step: config.withdrawal_step,
    };
    let initial_payment = principal / f64::from(periods.max(1));
    let _span = tracing::debug_span!("solve", equation = "withdrawal", rate).entered();
    solve_equation(&equation, initial_payment, config.newton, observer)
}

pub fn plan(
    goal: &FinancialGoal,
    capitalization_candidates: &[Investment],
    withdrawal_candidates: &[Investment],
    config: &PlannerConfig,
) -> Result<PlanReport, PlanError> {
    plan_with_observer(
        goal,
        capitalization_candidates,
        withdrawal_candidates,
        config,
        &mut SilentObserver,
    )
}

pub fn plan_with_observer<O>(
    goal: &FinancialGoal,
    capitalization_candidates: &[Investment],
    withdrawal_candidates: &[Investment],
    config: &PlannerConfig,
    observer: &mut O,
) -> Result<PlanReport, PlanError>
where
    O: IterationObserver + ?Sized,
{
    goal.validate()?;
    if capitalization_candidates.is_empty() {
        return Err(PlanError::EmptyInvestmentList {
            phase: Phase::Capitalization,
        });
    }

    let capitalization = run_capitalization(goal, capitalization_candidates, config, observer);
    let withdrawal = match &capitalization.trajectory {
        Some(trajectory) if capitalization.is_feasible() => run_withdrawal(
            goal,
            trajectory.final_balance(),
            withdrawal_candidates,
            config,
            observer,
        ),
        _ => WithdrawalPhase::NotAttempted,
    };

    Ok(PlanReport {
        capitalization,
        withdrawal,
    })
}

fn run_capitalization<O>(
    goal: &FinancialGoal,
    candidates: &[Investment],
    config: &PlannerConfig,
    observer: &mut O,
) -> CapitalizationReport
where
    O: IterationObserver + ?Sized,
{
    let payment = goal.monthly_contribution();
    let periods = goal.capitalization_periods();
    let required_rate = solve_required_rate(goal, config, observer)
        .into_converged()
        .map(|(rate, iterations)| RequiredRate { rate, iterations });

    let selected = match &required_rate {
        Ok(required) => {
            tracing::debug!(
                rate = required.rate,
                iterations = required.iterations,
                "required rate solved"
            );
            match select_investment(required.rate, candidates) {
                SelectionOutcome::Selected(investment) => Some(investment),
                SelectionOutcome::NoneQualifies => None,
            }
        }
        Err(err) => {
            tracing::debug!(error = %err, "required rate not found");
            None
        }
    };

    let trajectory = selected.as_ref().map(|investment| {
        tracing::debug!(
            name = %investment.name,
            rate = investment.periodic_rate,
            "investment selected"
        );
        project_growth(payment, periods, investment.periodic_rate, goal.target_principal)
    });

    CapitalizationReport {
        target_principal: goal.target_principal,
        monthly_contribution: payment,
        periods,
        required_rate,
        selected,
        trajectory,
    }
}

fn run_withdrawal<O>(
    goal: &FinancialGoal,
    principal: f64,
    candidates: &[Investment],
    config: &PlannerConfig,
    observer: &mut O,
) -> WithdrawalPhase
where
    O: IterationObserver + ?Sized,
{
    if candidates.is_empty() {
        return WithdrawalPhase::empty_list();
    }

    let periods = goal.withdrawal_periods();
    let candidates = candidates
        .iter()
        .map(|investment| {
            let withdrawal =
                solve_withdrawal(principal, periods, investment.periodic_rate, config, observer)
                    .into_result();
            tracing::debug!(
                name = %investment.name,
                ok = withdrawal.is_ok(),
                "withdrawal evaluated"
            );
            WithdrawalCandidate {
                investment: investment.clone(),
                withdrawal,
            }
        })
        .collect();

    WithdrawalPhase::Evaluated {
        principal,
        periods,
        candidates,
    }
}
