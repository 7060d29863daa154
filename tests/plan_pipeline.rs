use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use planfin::core::{PlannerConfig, WithdrawalPhase, plan};
use planfin::io::{load_goal, load_investments, write_report};

const GOAL_FILE: &str = "\
# capitalization
c IDADEFORMATURA 22
c IDADEFIMCAP 60
c SALARIOMEDIOLIQ 5000
c PERCINVESTIMENTO 0.2
c PATRIMONIOACC 1000000
# withdrawal
d IDADEFIMRETIRADA 85
";

const CAPITALIZATION_FILE: &str = "\
i Savings fixed 0.002 1
i Treasury bond 0.0045 2
i Index equity 0.008 4
i CDB fixed 0.004 2
f
";

const WITHDRAWAL_FILE: &str = "\
i Annuity fixed 0.003 1
i Bonds bond 0.005 2
i Cash cash 0.0 1
F
";

fn write_fixture(dir: &TempDir, file: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(file);
    fs::write(&path, contents).expect("write fixture");
    path
}

#[test]
fn pipeline_writes_full_report() {
    let dir = TempDir::new().expect("create temp dir");
    let goal = load_goal(&write_fixture(&dir, "goal.txt", GOAL_FILE)).expect("goal loads");
    let capitalization = load_investments(&write_fixture(&dir, "cap.txt", CAPITALIZATION_FILE))
        .expect("cap list loads");
    let withdrawal = load_investments(&write_fixture(&dir, "wd.txt", WITHDRAWAL_FILE))
        .expect("withdrawal list loads");

    let report = plan(
        &goal,
        &capitalization,
        &withdrawal,
        &PlannerConfig::default(),
    )
    .expect("valid plan");
    assert!(report.capitalization.is_feasible());

    let WithdrawalPhase::Evaluated {
        principal,
        periods,
        candidates,
    } = &report.withdrawal
    else {
        panic!("withdrawal phase should be evaluated");
    };
    assert_eq!(*periods, 300);
    assert_eq!(candidates.len(), 3);
    let cash = candidates[2].withdrawal.as_ref().expect("cash converges");
    assert!((cash - principal / 300.0).abs() <= 1e-6 * principal / 300.0);

    let output = dir.path().join("report.txt");
    write_report(&output, &report).expect("report written");
    let text = fs::read_to_string(&output).expect("report readable");

    assert!(text.starts_with("STAGE: CAPITALIZATION\n"));
    assert!(text.contains("Periods:               456"));
    assert!(text.contains("Selected investment:   Treasury (bond), rate 0.004500, risk 2"));
    assert!(text.contains("Goal reached at period"));
    assert!(text.contains("STAGE: DECAPITALIZATION"));
    assert!(text.contains("Withdrawal periods:    300"));
    assert!(text.contains("  3  Cash  "));
}

#[test]
fn pipeline_reports_infeasible_goal_and_skips_withdrawal() {
    let dir = TempDir::new().expect("create temp dir");
    let goal = load_goal(&write_fixture(&dir, "goal.txt", GOAL_FILE)).expect("goal loads");
    let capitalization = load_investments(&write_fixture(
        &dir,
        "cap.txt",
        "i Savings fixed 0.002 1\ni Poupanca fixed 0.0025 1\n",
    ))
    .expect("cap list loads");
    let withdrawal = load_investments(&write_fixture(&dir, "wd.txt", WITHDRAWAL_FILE))
        .expect("withdrawal list loads");

    let report = plan(
        &goal,
        &capitalization,
        &withdrawal,
        &PlannerConfig::default(),
    )
    .expect("valid plan");
    assert!(!report.capitalization.is_feasible());
    assert_eq!(report.withdrawal, WithdrawalPhase::NotAttempted);

    let output = dir.path().join("report.txt");
    write_report(&output, &report).expect("report written");
    let text = fs::read_to_string(&output).expect("report readable");
    assert!(text.contains("Selected investment:   none (no investment reaches the required rate"));
    assert!(text.contains("Skipped: the capitalization goal is not feasible."));
}

#[test]
fn pipeline_rejects_goal_with_inverted_ages() {
    let dir = TempDir::new().expect("create temp dir");
    let goal = load_goal(&write_fixture(
        &dir,
        "goal.txt",
        &GOAL_FILE.replace("IDADEFIMRETIRADA 85", "IDADEFIMRETIRADA 50"),
    ))
    .expect("goal loads");
    let capitalization = load_investments(&write_fixture(&dir, "cap.txt", CAPITALIZATION_FILE))
        .expect("cap list loads");

    let err = plan(&goal, &capitalization, &[], &PlannerConfig::default())
        .expect_err("withdrawal end before capitalization end");
    assert!(err.to_string().starts_with("invalid goal parameters"));
}

#[test]
fn pipeline_rejects_age_span_beyond_lifespan() {
    let dir = TempDir::new().expect("create temp dir");
    let goal = load_goal(&write_fixture(
        &dir,
        "goal.txt",
        &GOAL_FILE
            .replace("IDADEFORMATURA 22", "IDADEFORMATURA 1")
            .replace("IDADEFIMCAP 60", "IDADEFIMCAP 400000000")
            .replace("IDADEFIMRETIRADA 85", "IDADEFIMRETIRADA 400000001"),
    ))
    .expect("the loader only parses");
    let capitalization = load_investments(&write_fixture(&dir, "cap.txt", CAPITALIZATION_FILE))
        .expect("cap list loads");

    let err = plan(&goal, &capitalization, &[], &PlannerConfig::default())
        .expect_err("ages above the lifespan bound");
    assert!(err.to_string().contains("ages must be <= 150"));
}
