//! Status transitions and the append-only task history.

use super::{Database, now_ms};
use crate::error::ApiError;
use crate::lifecycle::{TransitionPlan, plan_transition};
use crate::types::{TaskHistoryEntry, TaskStatus};
use anyhow::Result;
use rusqlite::{Connection, Row, params};

/// Apply a lifecycle transition inside the caller's transaction.
///
/// The status write is conditional on the task still being in `from`, so a
/// concurrent change surfaces as a conflict instead of being overwritten.
/// Exactly one history row is appended per accepted transition.
pub(crate) fn apply_transition(
    conn: &Connection,
    task_id: &str,
    from: TaskStatus,
    to: TaskStatus,
    changed_by: Option<&str>,
) -> Result<TransitionPlan> {
    let now = now_ms();
    let plan = plan_transition(from, to, now).map_err(ApiError::from)?;

    let changed = conn.execute(
        "UPDATE tasks SET status = ?1,
            start_date = COALESCE(?2, start_date),
            end_date = COALESCE(?3, end_date),
            updated_at = ?4
         WHERE id = ?5 AND status = ?6",
        params![plan.to, plan.start_date, plan.end_date, now, task_id, plan.from],
    )?;
    if changed == 0 {
        return Err(ApiError::conflict("تم تعديل حالة المهمة من مستخدم آخر")
            .with_details(format!("task {} is no longer {}", task_id, from))
            .into());
    }

    conn.execute(
        "INSERT INTO task_history (task_id, changed_by, old_status, new_status, changed_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![task_id, changed_by, plan.from, plan.to, now],
    )?;

    Ok(plan)
}

fn parse_history_row(row: &Row) -> rusqlite::Result<TaskHistoryEntry> {
    Ok(TaskHistoryEntry {
        id: row.get("id")?,
        task_id: row.get("task_id")?,
        changed_by: row.get("changed_by")?,
        old_status: row.get("old_status")?,
        new_status: row.get("new_status")?,
        changed_at: row.get("changed_at")?,
    })
}

impl Database {
    /// Status history of a task, oldest first.
    pub fn get_task_history(&self, task_id: &str) -> Result<Vec<TaskHistoryEntry>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, task_id, changed_by, old_status, new_status, changed_at
                 FROM task_history
                 WHERE task_id = ?1
                 ORDER BY id ASC",
            )?;
            let entries = stmt
                .query_map(params![task_id], parse_history_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(entries)
        })
    }
}
