//! Task CRUD and listing.

use super::categories::require_active_category;
use super::companies::require_active_company;
use super::employees::require_active_employee;
use super::history::apply_transition;
use super::{Database, like_pattern, new_id, now_ms};
use crate::error::ApiError;
use crate::lifecycle::next_statuses;
use crate::types::{
    CategoryRef, CompanyRef, EmployeeRef, NewTask, Priority, Task, TaskFilter, TaskScope,
    TaskStatus, TaskUpdate, TaskView, non_empty,
};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::debug;

/// Tasks joined with company, category, assignee and reviewer.
const TASK_VIEW_SELECT: &str = "SELECT
        t.id AS id, t.company_id AS company_id, t.category_id AS category_id,
        t.description AS description, t.priority AS priority, t.status AS status,
        t.assigned_to AS assigned_to, t.reviewed_by AS reviewed_by, t.notes AS notes,
        t.created_by AS created_by, t.start_date AS start_date, t.end_date AS end_date,
        t.created_at AS created_at, t.updated_at AS updated_at,
        c.name_ar AS company_name_ar, c.name_en AS company_name_en,
        tc.classification AS category_classification, tc.task_type AS category_task_type,
        a.username AS assignee_username, a.full_name_ar AS assignee_full_name_ar,
        a.full_name_en AS assignee_full_name_en,
        r.username AS reviewer_username, r.full_name_ar AS reviewer_full_name_ar,
        r.full_name_en AS reviewer_full_name_en
    FROM tasks t
    LEFT JOIN companies c ON c.id = t.company_id
    LEFT JOIN task_categories tc ON tc.id = t.category_id
    LEFT JOIN employees a ON a.id = t.assigned_to
    LEFT JOIN employees r ON r.id = t.reviewed_by";

/// Priority rank for ORDER BY, most urgent first.
const PRIORITY_RANK_SQL: &str = "CASE t.priority
        WHEN 'critical' THEN 0 WHEN 'high' THEN 1 WHEN 'medium' THEN 2 ELSE 3 END";

pub(crate) fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get("id")?,
        company_id: row.get("company_id")?,
        category_id: row.get("category_id")?,
        description: row.get("description")?,
        priority: row.get("priority")?,
        status: row.get("status")?,
        assigned_to: row.get("assigned_to")?,
        reviewed_by: row.get("reviewed_by")?,
        notes: row.get("notes")?,
        created_by: row.get("created_by")?,
        start_date: row.get("start_date")?,
        end_date: row.get("end_date")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_employee_ref(
    row: &Row,
    id: Option<&String>,
    prefix: &str,
) -> rusqlite::Result<Option<EmployeeRef>> {
    let username: Option<String> = row.get(format!("{prefix}_username").as_str())?;
    let (Some(id), Some(username)) = (id, username) else {
        return Ok(None);
    };
    Ok(Some(EmployeeRef {
        id: id.clone(),
        username,
        full_name_ar: row.get(format!("{prefix}_full_name_ar").as_str())?,
        full_name_en: row.get(format!("{prefix}_full_name_en").as_str())?,
    }))
}

pub(crate) fn parse_task_view_row(row: &Row) -> rusqlite::Result<TaskView> {
    let task = parse_task_row(row)?;

    let company = row
        .get::<_, Option<String>>("company_name_ar")?
        .map(|name_ar| -> rusqlite::Result<CompanyRef> {
            Ok(CompanyRef {
                id: task.company_id.clone(),
                name_ar,
                name_en: row.get("company_name_en")?,
            })
        })
        .transpose()?;

    let category = match (
        row.get::<_, Option<String>>("category_classification")?,
        row.get::<_, Option<String>>("category_task_type")?,
    ) {
        (Some(classification), Some(task_type)) => Some(CategoryRef {
            id: task.category_id.clone(),
            classification,
            task_type,
        }),
        _ => None,
    };

    let assignee = parse_employee_ref(row, task.assigned_to.as_ref(), "assignee")?;
    let reviewer = parse_employee_ref(row, task.reviewed_by.as_ref(), "reviewer")?;

    Ok(TaskView {
        next_statuses: next_statuses(task.status),
        task,
        company,
        category,
        assignee,
        reviewer,
    })
}

pub(crate) fn get_task_internal(conn: &Connection, id: &str) -> Result<Option<Task>> {
    let task = conn
        .query_row(
            "SELECT id, company_id, category_id, description, priority, status, assigned_to,
                    reviewed_by, notes, created_by, start_date, end_date, created_at, updated_at
             FROM tasks WHERE id = ?1",
            params![id],
            parse_task_row,
        )
        .optional()?;
    Ok(task)
}

pub(crate) fn get_task_view_internal(conn: &Connection, id: &str) -> Result<Option<TaskView>> {
    let view = conn
        .query_row(
            &format!("{TASK_VIEW_SELECT} WHERE t.id = ?1"),
            params![id],
            parse_task_view_row,
        )
        .optional()?;
    Ok(view)
}

fn require_task_view(conn: &Connection, id: &str) -> Result<TaskView> {
    get_task_view_internal(conn, id)?.ok_or_else(|| ApiError::task_not_found(id).into())
}

/// Sort order for task queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TaskOrder {
    Newest,
    PriorityThenNewest,
}

/// Query task views matching `filter` within `scope`.
pub(crate) fn query_task_views(
    conn: &Connection,
    filter: &TaskFilter,
    scope: &TaskScope,
    order: TaskOrder,
    limit: Option<i64>,
) -> Result<Vec<TaskView>> {
    let mut sql = format!("{TASK_VIEW_SELECT} WHERE 1=1");
    let mut param_values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    if let TaskScope::AssignedTo(employee_id) = scope {
        sql.push_str(&format!(" AND t.assigned_to = ?{}", param_values.len() + 1));
        param_values.push(Box::new(employee_id.clone()));
    }

    if let Some(term) = non_empty(filter.search.as_deref()) {
        let n = param_values.len() + 1;
        sql.push_str(&format!(
            " AND (LOWER(COALESCE(c.name_ar, '')) LIKE ?{n} ESCAPE '\\'
                   OR LOWER(COALESCE(tc.task_type, '')) LIKE ?{n} ESCAPE '\\'
                   OR LOWER(COALESCE(t.description, '')) LIKE ?{n} ESCAPE '\\')"
        ));
        param_values.push(Box::new(like_pattern(term)));
    }

    if let Some(status) = filter.status {
        sql.push_str(&format!(" AND t.status = ?{}", param_values.len() + 1));
        param_values.push(Box::new(status));
    }

    if let Some(priority) = filter.priority {
        sql.push_str(&format!(" AND t.priority = ?{}", param_values.len() + 1));
        param_values.push(Box::new(priority));
    }

    if let Some(assignee) = non_empty(filter.assigned_to.as_deref()) {
        sql.push_str(&format!(" AND t.assigned_to = ?{}", param_values.len() + 1));
        param_values.push(Box::new(assignee.to_string()));
    }

    if let Some(from) = filter.created_from {
        sql.push_str(&format!(" AND t.created_at >= ?{}", param_values.len() + 1));
        param_values.push(Box::new(from));
    }

    if let Some(to) = filter.created_to {
        sql.push_str(&format!(" AND t.created_at <= ?{}", param_values.len() + 1));
        param_values.push(Box::new(to));
    }

    match order {
        TaskOrder::Newest => sql.push_str(" ORDER BY t.created_at DESC, t.id DESC"),
        TaskOrder::PriorityThenNewest => sql.push_str(&format!(
            " ORDER BY {PRIORITY_RANK_SQL}, t.created_at DESC, t.id DESC"
        )),
    }

    if let Some(limit) = limit {
        sql.push_str(&format!(" LIMIT ?{}", param_values.len() + 1));
        param_values.push(Box::new(limit));
    }

    debug!(%sql, params = param_values.len(), "Querying tasks");

    let params_refs: Vec<&dyn rusqlite::ToSql> =
        param_values.iter().map(|b| b.as_ref()).collect();
    let mut stmt = conn.prepare(&sql)?;
    let views = stmt
        .query_map(params_refs.as_slice(), parse_task_view_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(views)
}

/// Resolve an optional employee reference, rejecting unknown or inactive ids.
fn optional_employee(conn: &Connection, id: Option<&str>) -> Result<Option<String>> {
    match non_empty(id) {
        Some(id) => {
            require_active_employee(conn, id)?;
            Ok(Some(id.to_string()))
        }
        None => Ok(None),
    }
}

/// Like [`optional_employee`], but keeps the stored id without checking it,
/// so tasks of a deactivated employee stay editable.
fn changed_employee(
    conn: &Connection,
    id: Option<&str>,
    current: &Option<String>,
) -> Result<Option<String>> {
    match non_empty(id) {
        Some(id) if current.as_deref() == Some(id) => Ok(Some(id.to_string())),
        other => optional_employee(conn, other),
    }
}

fn optional_text(value: Option<&str>) -> Option<String> {
    non_empty(value).map(str::to_string)
}

impl Database {
    /// Create a task. New tasks always start `open`.
    pub fn create_task(&self, input: &NewTask, created_by: Option<&str>) -> Result<TaskView> {
        input.validate()?;
        let id = new_id();
        let now = now_ms();
        let company_id = input.company_id.trim();
        let category_id = input.category_id.trim();
        let priority = input.priority.unwrap_or(Priority::Medium);

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            require_active_company(&tx, company_id)?;
            require_active_category(&tx, category_id)?;
            let assigned_to = optional_employee(&tx, input.assigned_to.as_deref())?;
            let reviewed_by = optional_employee(&tx, input.reviewed_by.as_deref())?;

            tx.execute(
                "INSERT INTO tasks (
                    id, company_id, category_id, description, priority, status,
                    assigned_to, reviewed_by, notes, created_by, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
                params![
                    &id,
                    company_id,
                    category_id,
                    optional_text(input.description.as_deref()),
                    priority,
                    TaskStatus::Open,
                    assigned_to,
                    reviewed_by,
                    optional_text(input.notes.as_deref()),
                    created_by,
                    now,
                ],
            )?;

            let view = require_task_view(&tx, &id)?;
            tx.commit()?;
            Ok(view)
        })
    }

    pub fn get_task(&self, id: &str) -> Result<Option<TaskView>> {
        self.with_conn(|conn| get_task_view_internal(conn, id))
    }

    /// List tasks visible in `scope`, newest first.
    pub fn list_tasks(&self, filter: &TaskFilter, scope: &TaskScope) -> Result<Vec<TaskView>> {
        self.with_conn(|conn| query_task_views(conn, filter, scope, TaskOrder::Newest, None))
    }

    /// Tasks assigned to an employee, most urgent first.
    pub fn my_tasks(&self, employee_id: &str) -> Result<Vec<TaskView>> {
        let scope = TaskScope::AssignedTo(employee_id.to_string());
        self.with_conn(|conn| {
            query_task_views(
                conn,
                &TaskFilter::default(),
                &scope,
                TaskOrder::PriorityThenNewest,
                None,
            )
        })
    }

    /// Apply a partial update.
    ///
    /// A changed `status` is applied as a lifecycle transition after the
    /// other fields, inside the same transaction.
    pub fn update_task(
        &self,
        id: &str,
        update: &TaskUpdate,
        changed_by: Option<&str>,
    ) -> Result<TaskView> {
        let now = now_ms();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let current = get_task_internal(&tx, id)?.ok_or_else(|| ApiError::task_not_found(id))?;

            let company_id = match update.company_id.as_deref().map(str::trim) {
                Some("") => return Err(ApiError::missing_field("company_id").into()),
                Some(company_id) if company_id != current.company_id => {
                    require_active_company(&tx, company_id)?;
                    company_id.to_string()
                }
                _ => current.company_id.clone(),
            };
            let category_id = match update.category_id.as_deref().map(str::trim) {
                Some("") => return Err(ApiError::missing_field("category_id").into()),
                Some(category_id) if category_id != current.category_id => {
                    require_active_category(&tx, category_id)?;
                    category_id.to_string()
                }
                _ => current.category_id.clone(),
            };
            let assigned_to = match &update.assigned_to {
                Some(value) => changed_employee(&tx, value.as_deref(), &current.assigned_to)?,
                None => current.assigned_to.clone(),
            };
            let reviewed_by = match &update.reviewed_by {
                Some(value) => changed_employee(&tx, value.as_deref(), &current.reviewed_by)?,
                None => current.reviewed_by.clone(),
            };
            let description = match &update.description {
                Some(value) => optional_text(value.as_deref()),
                None => current.description.clone(),
            };
            let notes = match &update.notes {
                Some(value) => optional_text(value.as_deref()),
                None => current.notes.clone(),
            };
            let priority = update.priority.unwrap_or(current.priority);

            tx.execute(
                "UPDATE tasks SET company_id = ?1, category_id = ?2, description = ?3,
                    priority = ?4, assigned_to = ?5, reviewed_by = ?6, notes = ?7, updated_at = ?8
                 WHERE id = ?9",
                params![
                    company_id,
                    category_id,
                    description,
                    priority,
                    assigned_to,
                    reviewed_by,
                    notes,
                    now,
                    id
                ],
            )?;

            if let Some(status) = update.status
                && status != current.status
            {
                apply_transition(&tx, id, current.status, status, changed_by)?;
            }

            let view = require_task_view(&tx, id)?;
            tx.commit()?;
            Ok(view)
        })
    }

    /// Move a task to `to`, recording the change in its history.
    ///
    /// `scope` is checked against the row read inside the transaction, so a
    /// task reassigned away from the caller can no longer be moved by them.
    pub fn transition_task(
        &self,
        id: &str,
        to: TaskStatus,
        scope: &TaskScope,
        changed_by: Option<&str>,
    ) -> Result<TaskView> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let current = get_task_internal(&tx, id)?.ok_or_else(|| ApiError::task_not_found(id))?;
            if !scope.allows(&current) {
                return Err(ApiError::forbidden().into());
            }

            apply_transition(&tx, id, current.status, to, changed_by)?;

            let view = require_task_view(&tx, id)?;
            tx.commit()?;
            Ok(view)
        })
    }

    /// Delete a task and its history.
    pub fn delete_task(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
            if changed == 0 {
                return Err(ApiError::task_not_found(id).into());
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::types::{CategoryInput, NewCompany};

    fn setup() -> (Database, String, String) {
        let db = Database::open_in_memory().unwrap();
        let company = db
            .create_company(&NewCompany {
                name_ar: "شركة النور".into(),
                ..Default::default()
            })
            .unwrap();
        let category = db
            .create_category(&CategoryInput {
                classification: "إقرارات".into(),
                task_type: "ضريبة القيمة المضافة".into(),
            })
            .unwrap();
        (db, company.id, category.id)
    }

    fn new_task(company_id: &str, category_id: &str) -> NewTask {
        NewTask {
            company_id: company_id.to_string(),
            category_id: category_id.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn create_defaults_to_open_medium() {
        let (db, company_id, category_id) = setup();
        let view = db.create_task(&new_task(&company_id, &category_id), None).unwrap();

        assert_eq!(view.task.status, TaskStatus::Open);
        assert_eq!(view.task.priority, Priority::Medium);
        assert_eq!(view.task.start_date, None);
        assert_eq!(view.task.end_date, None);
        assert_eq!(view.company.unwrap().name_ar, "شركة النور");
        assert_eq!(view.category.unwrap().task_type, "ضريبة القيمة المضافة");
        assert!(view.assignee.is_none());
    }

    #[test]
    fn create_rejects_unknown_references() {
        let (db, company_id, category_id) = setup();

        let err: ApiError = db
            .create_task(&new_task("missing", &category_id), None)
            .unwrap_err()
            .into();
        assert_eq!(err.code, ErrorCode::NotFound);

        let mut input = new_task(&company_id, &category_id);
        input.assigned_to = Some("nobody".into());
        let err: ApiError = db.create_task(&input, None).unwrap_err().into();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[test]
    fn update_with_same_status_does_not_write_history() {
        let (db, company_id, category_id) = setup();
        let view = db.create_task(&new_task(&company_id, &category_id), None).unwrap();

        let updated = db
            .update_task(
                &view.task.id,
                &TaskUpdate {
                    status: Some(TaskStatus::Open),
                    priority: Some(Priority::Critical),
                    ..Default::default()
                },
                None,
            )
            .unwrap();

        assert_eq!(updated.task.priority, Priority::Critical);
        assert!(db.get_task_history(&view.task.id).unwrap().is_empty());
    }

    #[test]
    fn search_escapes_like_wildcards() {
        let (db, company_id, category_id) = setup();
        let mut input = new_task(&company_id, &category_id);
        input.description = Some("خصم 50% للعميل".into());
        db.create_task(&input, None).unwrap();
        db.create_task(&new_task(&company_id, &category_id), None).unwrap();

        let filter = TaskFilter {
            search: Some("50%".into()),
            ..Default::default()
        };
        assert_eq!(db.list_tasks(&filter, &TaskScope::All).unwrap().len(), 1);

        let filter = TaskFilter {
            search: Some("_".into()),
            ..Default::default()
        };
        assert!(db.list_tasks(&filter, &TaskScope::All).unwrap().is_empty());
    }

    #[test]
    fn delete_unknown_task_is_not_found() {
        let (db, _, _) = setup();
        let err: ApiError = db.delete_task("missing").unwrap_err().into();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
