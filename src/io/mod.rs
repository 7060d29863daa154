mod loader;
mod report;

pub use loader::{LoadError, load_goal, load_investments, parse_goal, parse_investments};
pub use report::{ReportView, render_report, write_report};
