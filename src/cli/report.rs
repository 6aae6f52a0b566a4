//! `report`: write a task report file from the command line.

use crate::config::Config;
use crate::db::Database;
use crate::report::{self, ReportFormat, ReportPeriod, ReportRequest};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use std::path::PathBuf;

/// Arguments for the report command.
#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Period to report on
    #[arg(long, value_enum, default_value_t = ReportPeriod::Weekly)]
    pub period: ReportPeriod,

    /// First day of a custom period (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<String>,

    /// Last day of a custom period, inclusive (YYYY-MM-DD)
    #[arg(long)]
    pub end: Option<String>,

    /// Only tasks assigned to this employee id
    #[arg(long)]
    pub employee: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Xlsx)]
    pub format: ReportFormat,

    /// Output file (default: wise-report-YYYY-MM-DD.<ext> in the current directory)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

impl ReportArgs {
    fn request(&self) -> ReportRequest {
        ReportRequest {
            period: self.period,
            start: self.start.clone(),
            end: self.end.clone(),
            employee: self.employee.clone(),
        }
    }
}

/// Build and write the report; returns the path written.
pub fn write_report(
    db: &Database,
    config: &Config,
    args: &ReportArgs,
    now: DateTime<Utc>,
) -> Result<PathBuf> {
    let report = report::build_report(db, &args.request(), &config.reports, now)?;
    let bytes = report::render(&report, args.format, &config.reports)?;

    let path = match &args.output {
        Some(path) => path.clone(),
        None => PathBuf::from(report::file_name(args.format, report::report_date(&report))),
    };
    std::fs::write(&path, &bytes)
        .with_context(|| format!("writing report to {}", path.display()))?;
    Ok(path)
}

/// Run the report command.
pub fn run_report(config: &Config, args: &ReportArgs) -> Result<()> {
    let db = Database::open(&config.server.db_path)?;
    let path = write_report(&db, config, args, Utc::now())?;
    println!("Report written to {}", path.display());
    Ok(())
}
