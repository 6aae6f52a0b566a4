//! Dashboard stats and report endpoints.

use super::AppState;
use super::extract::ApiQuery;
use crate::auth::Session;
use crate::error::{ApiError, ApiResult};
use crate::report::{self, Report, ReportFormat, ReportPeriod, ReportRequest};
use crate::types::{TaskScope, TaskStats, TaskView, non_empty};
use axum::{
    Json,
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Number of recent tasks shown on the dashboard.
const RECENT_TASKS: i64 = 5;

#[derive(Debug, Serialize)]
pub(crate) struct DashboardResponse {
    stats: TaskStats,
    recent_tasks: Vec<TaskView>,
}

pub(crate) async fn dashboard(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Json<DashboardResponse>> {
    let scope = TaskScope::for_user(&session.user);
    Ok(Json(DashboardResponse {
        stats: state.db().task_stats(&scope)?,
        recent_tasks: state.db().recent_tasks(&scope, RECENT_TASKS)?,
    }))
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ReportQuery {
    #[serde(default)]
    period: Option<String>,
    #[serde(default)]
    start: Option<String>,
    #[serde(default)]
    end: Option<String>,
    #[serde(default)]
    employee: Option<String>,
}

impl ReportQuery {
    fn into_request(self) -> ApiResult<ReportRequest> {
        let period = match non_empty(self.period.as_deref()) {
            Some(raw) => ReportPeriod::from_str(raw, true).map_err(|_| {
                ApiError::invalid_value("period", "expected weekly, monthly, custom or all")
            })?,
            None => ReportPeriod::default(),
        };
        Ok(ReportRequest {
            period,
            start: self.start,
            end: self.end,
            employee: self.employee,
        })
    }
}

fn build(state: &AppState, request: &ReportRequest) -> ApiResult<Report> {
    Ok(report::build_report(
        state.db(),
        request,
        &state.config().reports,
        chrono::Utc::now(),
    )?)
}

pub(crate) async fn report(
    State(state): State<AppState>,
    session: Session,
    ApiQuery(query): ApiQuery<ReportQuery>,
) -> ApiResult<Json<Report>> {
    session.require_admin()?;
    let request = query.into_request()?;
    Ok(Json(build(&state, &request)?))
}

pub(crate) async fn export(
    State(state): State<AppState>,
    session: Session,
    Path(format): Path<String>,
    ApiQuery(query): ApiQuery<ReportQuery>,
) -> ApiResult<impl IntoResponse> {
    session.require_admin()?;
    let format = ReportFormat::parse(&format)
        .ok_or_else(|| ApiError::invalid_value("format", "expected xlsx, pdf or json"))?;
    let request = query.into_request()?;

    let (bytes, file_name) = tokio::task::spawn_blocking(move || -> ApiResult<_> {
        let report = build(&state, &request)?;
        let bytes = report::render(&report, format, &state.config().reports)?;
        Ok((bytes, report::file_name(format, report::report_date(&report))))
    })
    .await
    .map_err(ApiError::internal)??;

    info!(
        format = format.extension(),
        bytes = bytes.len(),
        by = %session.user.username,
        "Report exported"
    );

    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        bytes,
    ))
}
