//! Task handlers.
//!
//! Employees only see and move tasks assigned to them; a task outside the
//! caller's scope answers FORBIDDEN.

use super::AppState;
use super::extract::{ApiJson, ApiQuery};
use crate::auth::Session;
use crate::error::{ApiError, ApiResult};
use crate::types::{
    NewTask, Priority, TaskFilter, TaskHistoryEntry, TaskScope, TaskStatus, TaskUpdate, TaskView,
    non_empty,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::info;

/// Raw list query; enum values are parsed here so bad values get a
/// field-level error.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct TaskListQuery {
    #[serde(default)]
    search: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    priority: Option<String>,
    #[serde(default)]
    assigned_to: Option<String>,
}

impl TaskListQuery {
    fn into_filter(self) -> ApiResult<TaskFilter> {
        let status = non_empty(self.status.as_deref())
            .map(|s| {
                TaskStatus::parse(s).ok_or_else(|| {
                    ApiError::invalid_value("status", "expected open, in_progress or done")
                })
            })
            .transpose()?;
        let priority = non_empty(self.priority.as_deref())
            .map(|s| {
                Priority::parse(s).ok_or_else(|| {
                    ApiError::invalid_value("priority", "expected critical, high, medium or low")
                })
            })
            .transpose()?;

        Ok(TaskFilter {
            search: non_empty(self.search.as_deref()).map(str::to_string),
            status,
            priority,
            assigned_to: non_empty(self.assigned_to.as_deref()).map(str::to_string),
            ..Default::default()
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusChange {
    #[serde(default)]
    status: Option<String>,
}

/// Load a task the caller is allowed to see.
fn visible_task(state: &AppState, session: &Session, id: &str) -> ApiResult<TaskView> {
    let view = state
        .db()
        .get_task(id)?
        .ok_or_else(|| ApiError::task_not_found(id))?;
    if !TaskScope::for_user(&session.user).allows(&view.task) {
        return Err(ApiError::forbidden());
    }
    Ok(view)
}

pub(crate) async fn list_tasks(
    State(state): State<AppState>,
    session: Session,
    ApiQuery(query): ApiQuery<TaskListQuery>,
) -> ApiResult<Json<Vec<TaskView>>> {
    let filter = query.into_filter()?;
    let scope = TaskScope::for_user(&session.user);
    Ok(Json(state.db().list_tasks(&filter, &scope)?))
}

pub(crate) async fn my_tasks(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Json<Vec<TaskView>>> {
    Ok(Json(state.db().my_tasks(&session.user.id)?))
}

pub(crate) async fn get_task(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> ApiResult<Json<TaskView>> {
    Ok(Json(visible_task(&state, &session, &id)?))
}

pub(crate) async fn create_task(
    State(state): State<AppState>,
    session: Session,
    ApiJson(input): ApiJson<NewTask>,
) -> ApiResult<(StatusCode, Json<TaskView>)> {
    session.require_admin()?;
    let view = state.db().create_task(&input, Some(&session.user.id))?;
    info!(task_id = %view.task.id, by = %session.user.username, "Task created");
    Ok((StatusCode::CREATED, Json(view)))
}

pub(crate) async fn update_task(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<TaskUpdate>,
) -> ApiResult<Json<TaskView>> {
    session.require_admin()?;
    let view = state.db().update_task(&id, &update, Some(&session.user.id))?;
    info!(task_id = %id, status = %view.task.status, by = %session.user.username, "Task updated");
    Ok(Json(view))
}

pub(crate) async fn delete_task(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    session.require_admin()?;
    state.db().delete_task(&id)?;
    info!(task_id = %id, by = %session.user.username, "Task deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn change_status(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    ApiJson(change): ApiJson<StatusChange>,
) -> ApiResult<Json<TaskView>> {
    let raw =
        non_empty(change.status.as_deref()).ok_or_else(|| ApiError::missing_field("status"))?;
    let to = TaskStatus::parse(raw)
        .ok_or_else(|| ApiError::invalid_value("status", "expected open, in_progress or done"))?;

    let scope = TaskScope::for_user(&session.user);
    let view = state
        .db()
        .transition_task(&id, to, &scope, Some(&session.user.id))?;
    info!(
        task_id = %id,
        to = %view.task.status,
        by = %session.user.username,
        "Task status changed"
    );
    Ok(Json(view))
}

pub(crate) async fn task_history(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<TaskHistoryEntry>>> {
    visible_task(&state, &session, &id)?;
    Ok(Json(state.db().get_task_history(&id)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn list_query_parses_enums_and_drops_blanks() {
        let query = TaskListQuery {
            search: Some("  ".into()),
            status: Some("in_progress".into()),
            priority: Some("".into()),
            assigned_to: Some("e1".into()),
        };
        let filter = query.into_filter().unwrap();
        assert_eq!(filter.search, None);
        assert_eq!(filter.status, Some(TaskStatus::InProgress));
        assert_eq!(filter.priority, None);
        assert_eq!(filter.assigned_to.as_deref(), Some("e1"));
    }

    #[test]
    fn list_query_rejects_unknown_status() {
        let query = TaskListQuery {
            status: Some("closed".into()),
            ..Default::default()
        };
        let err = query.into_filter().unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidFieldValue);
        assert_eq!(err.field.as_deref(), Some("status"));
    }
}
