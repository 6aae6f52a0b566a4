//! Aggregation queries for the dashboard.

use super::Database;
use super::tasks::{TaskOrder, query_task_views};
use crate::types::{TaskFilter, TaskScope, TaskStats, TaskView};
use anyhow::Result;
use rusqlite::params;

impl Database {
    /// Task counts over the tasks visible in `scope`.
    pub fn task_stats(&self, scope: &TaskScope) -> Result<TaskStats> {
        let assignee = match scope {
            TaskScope::All => None,
            TaskScope::AssignedTo(id) => Some(id.as_str()),
        };

        self.with_conn(|conn| {
            let stats = conn.query_row(
                "SELECT
                    COUNT(*) AS total,
                    COALESCE(SUM(CASE WHEN status = 'open' THEN 1 ELSE 0 END), 0) AS open,
                    COALESCE(SUM(CASE WHEN status = 'in_progress' THEN 1 ELSE 0 END), 0) AS in_progress,
                    COALESCE(SUM(CASE WHEN status = 'done' THEN 1 ELSE 0 END), 0) AS done,
                    COALESCE(SUM(CASE WHEN priority = 'critical' AND status != 'done' THEN 1 ELSE 0 END), 0) AS critical,
                    COALESCE(SUM(CASE WHEN priority = 'high' AND status != 'done' THEN 1 ELSE 0 END), 0) AS high
                 FROM tasks
                 WHERE ?1 IS NULL OR assigned_to = ?1",
                params![assignee],
                |row| {
                    let total: i64 = row.get("total")?;
                    let done: i64 = row.get("done")?;
                    Ok(TaskStats {
                        total,
                        open: row.get("open")?,
                        in_progress: row.get("in_progress")?,
                        done,
                        critical: row.get("critical")?,
                        high: row.get("high")?,
                        pending: total - done,
                    })
                },
            )?;
            Ok(stats)
        })
    }

    /// The most recently created tasks visible in `scope`.
    pub fn recent_tasks(&self, scope: &TaskScope, limit: i64) -> Result<Vec<TaskView>> {
        self.with_conn(|conn| {
            query_task_views(
                conn,
                &TaskFilter::default(),
                scope,
                TaskOrder::Newest,
                Some(limit),
            )
        })
    }
}
