mod config;
mod engine;
mod equations;
mod error;
mod solver;
mod types;

pub use config::{
    DEFAULT_CAPITALIZATION_STEP, DEFAULT_INITIAL_RATE_GUESS, DEFAULT_MAX_ITERATIONS,
    DEFAULT_TOLERANCE, DEFAULT_WITHDRAWAL_STEP, InvalidKnob, PlannerConfig,
};
pub use engine::{
    GrowthPath, capitalization_equation, plan, plan_with_observer, project_growth,
    select_investment, solve_required_rate, solve_withdrawal,
};
pub use equations::{CapitalizationEquation, Equation, WithdrawalEquation, central_difference};
pub use error::{Phase, PlanError};
pub use solver::{
    IterationObserver, IterationTrace, NewtonConfig, RecordingObserver, SilentObserver,
    TracingObserver, newton_raphson, solve_equation,
};
pub use types::{
    CapitalizationReport, FinancialGoal, GrowthTrajectory, Investment, PlanReport, RequiredRate,
    SelectionOutcome, SolveOutcome, WithdrawalCandidate, WithdrawalPhase,
};
