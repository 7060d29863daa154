use std::fmt;
use std::fs;
use std::path::Path;

use crate::core::{CapitalizationReport, GrowthTrajectory, PlanReport, WithdrawalPhase};

/// Plaintext rendering of a [`PlanReport`].
pub struct ReportView<'a>(pub &'a PlanReport);

pub fn render_report(report: &PlanReport) -> String {
    ReportView(report).to_string()
}

pub fn write_report(path: &Path, report: &PlanReport) -> std::io::Result<()> {
    fs::write(path, render_report(report))
}

impl fmt::Display for ReportView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_capitalization(f, &self.0.capitalization)?;
        writeln!(f)?;
        write_withdrawal(f, &self.0.withdrawal)
    }
}

fn write_capitalization(f: &mut fmt::Formatter<'_>, cap: &CapitalizationReport) -> fmt::Result {
    writeln!(f, "STAGE: CAPITALIZATION")?;
    writeln!(f, "Target principal:      {:.2}", cap.target_principal)?;
    writeln!(f, "Monthly contribution:  {:.2}", cap.monthly_contribution)?;
    writeln!(f, "Periods:               {}", cap.periods)?;

    match &cap.required_rate {
        Ok(required) => {
            writeln!(
                f,
                "Required rate:         {:.6} per period ({} iterations)",
                required.rate, required.iterations
            )?;
            if required.is_growth_free() {
                writeln!(f, "Note: contributions alone reach the target; no growth is required.")?;
            }
        }
        Err(err) => writeln!(f, "Required rate:         not found ({err})")?,
    }

    match (&cap.selected, cap.failure()) {
        (Some(investment), _) => writeln!(
            f,
            "Selected investment:   {} ({}), rate {:.6}, risk {}",
            investment.name, investment.category, investment.periodic_rate, investment.risk_level
        )?,
        (None, Some(err)) => writeln!(f, "Selected investment:   none ({err})")?,
        (None, None) => writeln!(f, "Selected investment:   none")?,
    }

    if let Some(trajectory) = &cap.trajectory {
        writeln!(f)?;
        write_trajectory(f, trajectory, cap.monthly_contribution)?;
    }
    Ok(())
}

fn write_trajectory(
    f: &mut fmt::Formatter<'_>,
    trajectory: &GrowthTrajectory,
    payment: f64,
) -> fmt::Result {
    writeln!(f, "Period   Contributed        Balance       Interest")?;
    writeln!(f, "======  ============  =============  =============")?;
    for (period, balance) in trajectory.balances.iter().enumerate() {
        let contributed = payment * period as f64;
        writeln!(
            f,
            "{:>6}  {:>12.2}  {:>13.2}  {:>13.2}",
            period,
            contributed,
            balance,
            balance - contributed
        )?;
    }
    writeln!(f)?;
    match trajectory.goal_reached_period {
        Some(period) => writeln!(f, "Goal reached at period {period}."),
        None => writeln!(f, "Goal not reached within {} periods.", trajectory.periods()),
    }
}

fn write_withdrawal(f: &mut fmt::Formatter<'_>, phase: &WithdrawalPhase) -> fmt::Result {
    writeln!(f, "STAGE: DECAPITALIZATION")?;
    match phase {
        WithdrawalPhase::NotAttempted => {
            writeln!(f, "Skipped: the capitalization goal is not feasible.")
        }
        WithdrawalPhase::Failed(err) => writeln!(f, "Not evaluated: {err}"),
        WithdrawalPhase::Evaluated {
            principal,
            periods,
            candidates,
        } => {
            writeln!(f, "Accumulated principal: {principal:.2}")?;
            writeln!(f, "Withdrawal periods:    {periods}")?;
            writeln!(f)?;
            writeln!(f, "No.  Investment          Rate        Withdrawal")?;
            writeln!(f, "===  ==================  ==========  ============")?;
            for (index, candidate) in candidates.iter().enumerate() {
                let rate = candidate.investment.periodic_rate;
                match &candidate.withdrawal {
                    Ok(amount) => writeln!(
                        f,
                        "{:>3}  {:<18}  {:>10.6}  {:>12.2}",
                        index + 1,
                        candidate.investment.name,
                        rate,
                        amount
                    )?,
                    Err(err) => writeln!(
                        f,
                        "{:>3}  {:<18}  {:>10.6}  failed: {err}",
                        index + 1,
                        candidate.investment.name,
                        rate
                    )?,
                }
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Investment, Phase, PlanError, RequiredRate, WithdrawalCandidate};

    fn investment(name: &str, rate: f64) -> Investment {
        Investment {
            name: name.to_string(),
            category: "fixed".to_string(),
            periodic_rate: rate,
            risk_level: 1,
        }
    }

    fn feasible_report() -> PlanReport {
        PlanReport {
            capitalization: CapitalizationReport {
                target_principal: 2_000.0,
                monthly_contribution: 1_000.0,
                periods: 2,
                required_rate: Ok(RequiredRate {
                    rate: 0.0,
                    iterations: 3,
                }),
                selected: Some(investment("Savings", 0.01)),
                trajectory: Some(GrowthTrajectory {
                    balances: vec![0.0, 1_000.0, 2_010.0],
                    goal_reached_period: Some(2),
                }),
            },
            withdrawal: WithdrawalPhase::Evaluated {
                principal: 2_010.0,
                periods: 12,
                candidates: vec![
                    WithdrawalCandidate {
                        investment: investment("Bonds", 0.005),
                        withdrawal: Ok(173.0),
                    },
                    WithdrawalCandidate {
                        investment: investment("Broken", 0.002),
                        withdrawal: Err(PlanError::NonConvergent {
                            iterations: 100,
                            last: 1.5,
                        }),
                    },
                ],
            },
        }
    }

    #[test]
    fn render_lists_every_recorded_period_with_interest() {
        let text = render_report(&feasible_report());
        assert!(text.starts_with("STAGE: CAPITALIZATION\n"));
        assert!(text.contains("     0          0.00           0.00           0.00\n"));
        assert!(text.contains("     2       2000.00        2010.00          10.00\n"));
        assert!(text.contains("Goal reached at period 2."));
        assert!(text.contains("Selected investment:   Savings (fixed), rate 0.010000, risk 1"));
    }

    #[test]
    fn render_notes_growth_free_required_rate() {
        let text = render_report(&feasible_report());
        assert!(text.contains("no growth is required"));
    }

    #[test]
    fn render_shows_candidate_amounts_and_failures() {
        let text = render_report(&feasible_report());
        assert!(text.contains("STAGE: DECAPITALIZATION"));
        assert!(text.contains("  1  Bonds                 0.005000        173.00\n"));
        assert!(text.contains(
            "  2  Broken                0.002000  failed: no convergence after 100 iterations"
        ));
    }

    #[test]
    fn render_explains_infeasible_capitalization() {
        let mut report = feasible_report();
        report.capitalization.required_rate = Ok(RequiredRate {
            rate: 0.02,
            iterations: 4,
        });
        report.capitalization.selected = None;
        report.capitalization.trajectory = None;
        report.withdrawal = WithdrawalPhase::NotAttempted;

        let text = render_report(&report);
        assert!(text.contains(
            "Selected investment:   none (no investment reaches the required rate 0.02)"
        ));
        assert!(!text.contains("Period   Contributed"));
        assert!(text.contains("Skipped: the capitalization goal is not feasible."));
    }

    #[test]
    fn render_reports_solver_failure_and_empty_withdrawal_list() {
        let mut report = feasible_report();
        report.capitalization.required_rate = Err(PlanError::SingularDerivative {
            iteration: 0,
            x: 0.005,
        });
        report.capitalization.selected = None;
        report.capitalization.trajectory = None;
        report.withdrawal = WithdrawalPhase::Failed(PlanError::EmptyInvestmentList {
            phase: Phase::Withdrawal,
        });

        let text = render_report(&report);
        assert!(text.contains(
            "Required rate:         not found (derivative vanished at iteration 0"
        ));
        assert!(text.contains("Not evaluated: the withdrawal investment list is empty"));
    }
}
