use super::config::{DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE};
use super::equations::Equation;
use super::types::SolveOutcome;

/// Magnitude below which a derivative is treated as zero.
const SINGULAR_DERIVATIVE: f64 = f64::EPSILON;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewtonConfig {
    pub tolerance: f64,
    pub max_iterations: u32,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationTrace {
    pub iteration: u32,
    pub x: f64,
    pub value: f64,
    pub derivative: f64,
    pub delta: f64,
}

/// Receives one trace per Newton step. The solver itself never logs.
pub trait IterationObserver {
    fn on_iteration(&mut self, trace: &IterationTrace);
}

impl<O: IterationObserver + ?Sized> IterationObserver for &mut O {
    fn on_iteration(&mut self, trace: &IterationTrace) {
        (**self).on_iteration(trace);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SilentObserver;

impl IterationObserver for SilentObserver {
    fn on_iteration(&mut self, _trace: &IterationTrace) {}
}

/// Forwards every step to `tracing` at debug level; the enclosing span names
/// the equation being solved.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl IterationObserver for TracingObserver {
    fn on_iteration(&mut self, trace: &IterationTrace) {
        tracing::debug!(
            iteration = trace.iteration,
            x = trace.x,
            fx = trace.value,
            dfx = trace.derivative,
            delta = trace.delta,
            "newton step"
        );
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    pub traces: Vec<IterationTrace>,
}

impl IterationObserver for RecordingObserver {
    fn on_iteration(&mut self, trace: &IterationTrace) {
        self.traces.push(*trace);
    }
}

/// Scalar Newton-Raphson.
///
/// Convergence needs both `|dx| <= tolerance` and `|f(x)| <= tolerance` on
/// the same step. A derivative within machine epsilon of zero stops the
/// iteration before the division; a non-finite value or derivative means the
/// iteration has diverged and is reported as non-convergent.
pub fn newton_raphson<F, D, O>(
    x0: f64,
    mut evaluate: F,
    mut derivative: D,
    config: NewtonConfig,
    observer: &mut O,
) -> SolveOutcome
where
    F: FnMut(f64) -> f64,
    D: FnMut(f64) -> f64,
    O: IterationObserver + ?Sized,
{
    let mut x = x0;
    let mut iteration = 0;
    while iteration < config.max_iterations {
        let value = evaluate(x);
        let slope = derivative(x);
        if !value.is_finite() || !slope.is_finite() {
            return SolveOutcome::NonConvergent {
                iterations: iteration,
                last: x,
            };
        }
        if slope.abs() <= SINGULAR_DERIVATIVE {
            return SolveOutcome::SingularDerivative { iteration, x };
        }

        let delta = -value / slope;
        observer.on_iteration(&IterationTrace {
            iteration,
            x,
            value,
            derivative: slope,
            delta,
        });
        x += delta;
        iteration += 1;

        if delta.abs() <= config.tolerance && value.abs() <= config.tolerance {
            return SolveOutcome::Converged {
                root: x,
                iterations: iteration,
            };
        }
    }

    SolveOutcome::NonConvergent {
        iterations: iteration,
        last: x,
    }
}

pub fn solve_equation<E, O>(
    equation: &E,
    x0: f64,
    config: NewtonConfig,
    observer: &mut O,
) -> SolveOutcome
where
    E: Equation + ?Sized,
    O: IterationObserver + ?Sized,
{
    newton_raphson(
        x0,
        |x| equation.value(x),
        |x| equation.derivative(x),
        config,
        observer,
    )
}
