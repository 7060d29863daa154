use std::error::Error;
use std::net::SocketAddr;
use std::path::PathBuf;

use axum::{
    Router,
    extract::Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use crate::core::{
    DEFAULT_CAPITALIZATION_STEP, DEFAULT_INITIAL_RATE_GUESS, DEFAULT_MAX_ITERATIONS,
    DEFAULT_TOLERANCE, DEFAULT_WITHDRAWAL_STEP, FinancialGoal, Investment, NewtonConfig,
    PlanError, PlanReport, PlannerConfig, RequiredRate, TracingObserver, WithdrawalPhase, plan,
    plan_with_observer,
};
use crate::io::{load_goal, load_investments, write_report};

#[derive(Parser, Debug)]
#[command(
    name = "planfin",
    about = "Two-phase savings planner: required rate, investment choice, growth and withdrawals"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

impl Cli {
    /// Whether per-iteration solver traces were requested.
    pub fn trace(&self) -> bool {
        matches!(&self.command, Command::Plan(args) if args.trace)
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load goal and investment files, plan, and write the text report
    Plan(PlanArgs),
    /// Serve the JSON planning API
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

#[derive(Args, Debug)]
struct PlanArgs {
    #[arg(help = "Goal file (c/d tagged parameters)")]
    goal: PathBuf,
    #[arg(help = "Capitalization investments file")]
    capitalization: PathBuf,
    #[arg(help = "Withdrawal investments file")]
    withdrawal: PathBuf,
    #[arg(help = "Report output path")]
    output: PathBuf,
    #[command(flatten)]
    solver: SolverArgs,
    #[arg(long, help = "Log every Newton-Raphson step at debug level")]
    trace: bool,
}

#[derive(Args, Debug, Clone, Copy)]
struct SolverArgs {
    #[arg(
        long,
        default_value_t = DEFAULT_TOLERANCE,
        help = "Newton-Raphson tolerance on both step and residual"
    )]
    tolerance: f64,
    #[arg(
        long,
        default_value_t = DEFAULT_MAX_ITERATIONS,
        help = "Newton-Raphson iteration budget per solve"
    )]
    max_iterations: u32,
    #[arg(
        long,
        default_value_t = DEFAULT_INITIAL_RATE_GUESS,
        help = "Starting guess for the required periodic rate"
    )]
    initial_rate_guess: f64,
    #[arg(
        long,
        default_value_t = DEFAULT_CAPITALIZATION_STEP,
        help = "Finite-difference step for the capitalization equation"
    )]
    capitalization_step: f64,
    #[arg(
        long,
        default_value_t = DEFAULT_WITHDRAWAL_STEP,
        help = "Finite-difference step for the withdrawal equation"
    )]
    withdrawal_step: f64,
}

impl Default for SolverArgs {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            initial_rate_guess: DEFAULT_INITIAL_RATE_GUESS,
            capitalization_step: DEFAULT_CAPITALIZATION_STEP,
            withdrawal_step: DEFAULT_WITHDRAWAL_STEP,
        }
    }
}

fn build_config(args: SolverArgs) -> Result<PlannerConfig, String> {
    let config = PlannerConfig {
        newton: NewtonConfig {
            tolerance: args.tolerance,
            max_iterations: args.max_iterations,
        },
        initial_rate_guess: args.initial_rate_guess,
        capitalization_step: args.capitalization_step,
        withdrawal_step: args.withdrawal_step,
    };
    config
        .validate()
        .map_err(|err| format!("--{} {}", err.knob.replace('_', "-"), err.requirement))?;
    Ok(config)
}

pub async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    match cli.command {
        Command::Plan(args) => run_plan_command(args),
        Command::Serve { port } => Ok(run_http_server(port).await?),
    }
}

fn run_plan_command(args: PlanArgs) -> Result<(), Box<dyn Error>> {
    let config = build_config(args.solver)?;
    let goal = load_goal(&args.goal)?;
    let capitalization = load_investments(&args.capitalization)?;
    let withdrawal = load_investments(&args.withdrawal)?;

    let report = if args.trace {
        plan_with_observer(
            &goal,
            &capitalization,
            &withdrawal,
            &config,
            &mut TracingObserver,
        )?
    } else {
        plan(&goal, &capitalization, &withdrawal, &config)?
    };

    write_report(&args.output, &report)?;
    tracing::info!(
        path = %args.output.display(),
        feasible = report.capitalization.is_feasible(),
        "report written"
    );
    Ok(())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoalPayload {
    graduation_age: u32,
    cap_end_age: u32,
    net_monthly_salary: f64,
    investment_fraction: f64,
    target_principal: f64,
    withdrawal_end_age: u32,
}

impl From<GoalPayload> for FinancialGoal {
    fn from(value: GoalPayload) -> Self {
        FinancialGoal {
            graduation_age: value.graduation_age,
            cap_end_age: value.cap_end_age,
            net_monthly_salary: value.net_monthly_salary,
            investment_fraction: value.investment_fraction,
            target_principal: value.target_principal,
            withdrawal_end_age: value.withdrawal_end_age,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InvestmentPayload {
    name: String,
    #[serde(default)]
    category: String,
    periodic_rate: f64,
    risk_level: u8,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlanPayload {
    goal: GoalPayload,
    #[serde(default)]
    capitalization: Vec<InvestmentPayload>,
    #[serde(default)]
    withdrawal: Vec<InvestmentPayload>,
    tolerance: Option<f64>,
    max_iterations: Option<u32>,
    initial_rate_guess: Option<f64>,
    capitalization_step: Option<f64>,
    withdrawal_step: Option<f64>,
}

#[derive(Debug)]
struct ApiRequest {
    goal: FinancialGoal,
    capitalization: Vec<Investment>,
    withdrawal: Vec<Investment>,
    config: PlannerConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FailureResponse {
    message: String,
    #[serde(flatten)]
    error: PlanError,
}

impl From<PlanError> for FailureResponse {
    fn from(error: PlanError) -> Self {
        FailureResponse {
            message: error.to_string(),
            error,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CandidateResponse {
    investment: Investment,
    withdrawal: Option<f64>,
    failure: Option<FailureResponse>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
enum WithdrawalResponse {
    NotAttempted,
    Failed {
        failure: FailureResponse,
    },
    Evaluated {
        principal: f64,
        periods: u32,
        candidates: Vec<CandidateResponse>,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlanResponse {
    feasible: bool,
    target_principal: f64,
    monthly_contribution: f64,
    capitalization_periods: u32,
    required_rate: Option<RequiredRate>,
    selected_investment: Option<Investment>,
    failure: Option<FailureResponse>,
    balances: Vec<f64>,
    final_balance: Option<f64>,
    goal_reached_period: Option<usize>,
    withdrawal: WithdrawalResponse,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/plan", post(plan_handler))
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "planning API listening");

    axum::serve(listener, app).await
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, serde_json::json!({ "status": "ok" }))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn plan_handler(Json(payload): Json<PlanPayload>) -> Response {
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    match plan(
        &request.goal,
        &request.capitalization,
        &request.withdrawal,
        &request.config,
    ) {
        Ok(report) => json_response(StatusCode::OK, build_plan_response(&report)),
        Err(err) => error_response(StatusCode::BAD_REQUEST, &err.to_string()),
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn api_request_from_json(json: &str) -> Result<ApiRequest, String> {
    let payload = serde_json::from_str::<PlanPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    api_request_from_payload(payload)
}

fn api_request_from_payload(payload: PlanPayload) -> Result<ApiRequest, String> {
    let mut args = SolverArgs::default();
    if let Some(v) = payload.tolerance {
        args.tolerance = v;
    }
    if let Some(v) = payload.max_iterations {
        args.max_iterations = v;
    }
    if let Some(v) = payload.initial_rate_guess {
        args.initial_rate_guess = v;
    }
    if let Some(v) = payload.capitalization_step {
        args.capitalization_step = v;
    }
    if let Some(v) = payload.withdrawal_step {
        args.withdrawal_step = v;
    }
    let config = build_config(args)?;

    Ok(ApiRequest {
        goal: payload.goal.into(),
        capitalization: investments_from_payload("capitalization", payload.capitalization)?,
        withdrawal: investments_from_payload("withdrawal", payload.withdrawal)?,
        config,
    })
}

fn investments_from_payload(
    list: &str,
    payload: Vec<InvestmentPayload>,
) -> Result<Vec<Investment>, String> {
    payload
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            if !item.periodic_rate.is_finite() {
                return Err(format!("{list}[{index}].periodicRate must be finite"));
            }
            if !(1..=5).contains(&item.risk_level) {
                return Err(format!("{list}[{index}].riskLevel must be between 1 and 5"));
            }
            Ok(Investment {
                name: item.name,
                category: item.category,
                periodic_rate: item.periodic_rate,
                risk_level: item.risk_level,
            })
        })
        .collect()
}

fn build_plan_response(report: &PlanReport) -> PlanResponse {
    let cap = &report.capitalization;
    let trajectory = cap.trajectory.as_ref();

    let withdrawal = match &report.withdrawal {
        WithdrawalPhase::NotAttempted => WithdrawalResponse::NotAttempted,
        WithdrawalPhase::Failed(err) => WithdrawalResponse::Failed {
            failure: err.clone().into(),
        },
        WithdrawalPhase::Evaluated {
            principal,
            periods,
            candidates,
        } => WithdrawalResponse::Evaluated {
            principal: *principal,
            periods: *periods,
            candidates: candidates
                .iter()
                .map(|candidate| CandidateResponse {
                    investment: candidate.investment.clone(),
                    withdrawal: candidate.withdrawal.as_ref().ok().copied(),
                    failure: candidate.withdrawal.clone().err().map(Into::into),
                })
                .collect(),
        },
    };

    PlanResponse {
        feasible: cap.is_feasible(),
        target_principal: cap.target_principal,
        monthly_contribution: cap.monthly_contribution,
        capitalization_periods: cap.periods,
        required_rate: cap.required_rate.as_ref().ok().copied(),
        selected_investment: cap.selected.clone(),
        failure: cap.failure().map(Into::into),
        balances: trajectory.map(|t| t.balances.clone()).unwrap_or_default(),
        final_balance: trajectory.map(|t| t.final_balance()),
        goal_reached_period: trajectory.and_then(|t| t.goal_reached_period),
        withdrawal,
    }
}
