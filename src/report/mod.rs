//! Task reports: filtering by period and employee, aggregation, export.

mod pdf;
mod window;
mod xlsx;

pub use window::{
    ReportPeriod, ReportRequest, ReportWindow, WindowError, resolve_window, utc_offset,
};

use crate::config::ReportsConfig;
use crate::db::Database;
use crate::types::{Employee, Priority, TaskFilter, TaskScope, TaskStatus, TaskView, non_empty};
use anyhow::Result;
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Export file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Xlsx,
    Pdf,
    Json,
}

impl ReportFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "xlsx" => Some(ReportFormat::Xlsx),
            "pdf" => Some(ReportFormat::Pdf),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Xlsx => "xlsx",
            ReportFormat::Pdf => "pdf",
            ReportFormat::Json => "json",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ReportFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            ReportFormat::Pdf => "application/pdf",
            ReportFormat::Json => "application/json",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmployeeBreakdown {
    pub employee_id: String,
    pub full_name_ar: String,
    pub full_name_en: Option<String>,
    pub total: i64,
    pub completed: i64,
    pub completion_rate: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PriorityCounts {
    pub critical: i64,
    pub high: i64,
    pub medium: i64,
    pub low: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportStats {
    pub total: i64,
    pub completed: i64,
    pub in_progress: i64,
    pub open: i64,
    pub completion_rate: i64,
    pub by_employee: Vec<EmployeeBreakdown>,
    pub by_priority: PriorityCounts,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub period: ReportPeriod,
    /// `None` for the all-time period.
    pub window: Option<ReportWindow>,
    pub employee_id: Option<String>,
    pub generated_at: i64,
    /// Offset used for windows and dates, in minutes east of UTC.
    pub utc_offset_minutes: i32,
    pub stats: ReportStats,
    pub tasks: Vec<TaskView>,
}

impl Report {
    pub fn offset(&self) -> FixedOffset {
        utc_offset(self.utc_offset_minutes)
    }

    /// `dd/MM/yyyy - dd/MM/yyyy`, or "All Time".
    pub fn period_label(&self) -> String {
        match &self.window {
            Some(w) => format!(
                "{} - {}",
                w.start_date.format("%d/%m/%Y"),
                w.end_date.format("%d/%m/%Y")
            ),
            None => "All Time".to_string(),
        }
    }
}

/// Rounded percentage of `part` in `total`, 0 when `total` is 0.
pub fn completion_rate(part: i64, total: i64) -> i64 {
    if total <= 0 {
        return 0;
    }
    ((part as f64 / total as f64) * 100.0).round() as i64
}

/// Aggregate tasks. `employees` gives the order of the per-employee rows;
/// employees without tasks are left out.
pub fn aggregate(tasks: &[TaskView], employees: &[Employee]) -> ReportStats {
    let count = |pred: &dyn Fn(&TaskView) -> bool| tasks.iter().filter(|t| pred(t)).count() as i64;

    let total = tasks.len() as i64;
    let completed = count(&|t| t.task.status == TaskStatus::Done);

    let by_employee = employees
        .iter()
        .filter_map(|employee| {
            let assigned = count(&|t| t.task.assigned_to.as_deref() == Some(employee.id.as_str()));
            if assigned == 0 {
                return None;
            }
            let done = count(&|t| {
                t.task.assigned_to.as_deref() == Some(employee.id.as_str())
                    && t.task.status == TaskStatus::Done
            });
            Some(EmployeeBreakdown {
                employee_id: employee.id.clone(),
                full_name_ar: employee.full_name_ar.clone(),
                full_name_en: employee.full_name_en.clone(),
                total: assigned,
                completed: done,
                completion_rate: completion_rate(done, assigned),
            })
        })
        .collect();

    ReportStats {
        total,
        completed,
        in_progress: count(&|t| t.task.status == TaskStatus::InProgress),
        open: count(&|t| t.task.status == TaskStatus::Open),
        completion_rate: completion_rate(completed, total),
        by_employee,
        by_priority: PriorityCounts {
            critical: count(&|t| t.task.priority == Priority::Critical),
            high: count(&|t| t.task.priority == Priority::High),
            medium: count(&|t| t.task.priority == Priority::Medium),
            low: count(&|t| t.task.priority == Priority::Low),
        },
    }
}

/// Build a report evaluated at `now`.
pub fn build_report(
    db: &Database,
    request: &ReportRequest,
    config: &ReportsConfig,
    now: DateTime<Utc>,
) -> Result<Report> {
    let offset = utc_offset(config.utc_offset_minutes);
    let window = resolve_window(request, now, offset).map_err(crate::error::ApiError::from)?;
    let employee_id = non_empty(request.employee.as_deref()).map(str::to_string);

    let filter = TaskFilter {
        assigned_to: employee_id.clone(),
        created_from: window.map(|w| w.start_ms),
        created_to: window.map(|w| w.end_ms),
        ..Default::default()
    };
    let tasks = db.list_tasks(&filter, &TaskScope::All)?;
    let employees = db.list_employees(None)?;
    let stats = aggregate(&tasks, &employees);

    info!(
        period = ?request.period,
        employee = ?employee_id,
        total = stats.total,
        "Report built"
    );

    Ok(Report {
        period: request.period,
        window,
        employee_id,
        generated_at: now.timestamp_millis(),
        utc_offset_minutes: config.utc_offset_minutes,
        stats,
        tasks,
    })
}

/// Render a report in the requested format.
pub fn render(report: &Report, format: ReportFormat, config: &ReportsConfig) -> Result<Vec<u8>> {
    match format {
        ReportFormat::Json => Ok(serde_json::to_vec_pretty(report)?),
        ReportFormat::Xlsx => xlsx::render(report),
        ReportFormat::Pdf => Ok(pdf::render(report, &config.title)),
    }
}

/// `wise-report-YYYY-MM-DD.<ext>`
pub fn file_name(format: ReportFormat, date: NaiveDate) -> String {
    format!("wise-report-{}.{}", date.format("%Y-%m-%d"), format.extension())
}

/// Local calendar date of a report.
pub fn report_date(report: &Report) -> NaiveDate {
    local_datetime(report.generated_at, report.offset())
        .map(|dt| dt.date_naive())
        .unwrap_or_default()
}

fn local_datetime(ms: i64, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    offset.timestamp_millis_opt(ms).single()
}

/// `dd/MM/yyyy` in `offset`, or `-` when absent.
pub(crate) fn format_date(ms: Option<i64>, offset: FixedOffset) -> String {
    ms.and_then(|ms| local_datetime(ms, offset))
        .map(|dt| dt.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// `dd/MM/yyyy HH:mm` in `offset`.
pub(crate) fn format_datetime(ms: i64, offset: FixedOffset) -> String {
    local_datetime(ms, offset)
        .map(|dt| dt.format("%d/%m/%Y %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Text or `-` when empty.
pub(crate) fn or_dash(value: Option<&str>) -> String {
    non_empty(value).unwrap_or("-").to_string()
}
