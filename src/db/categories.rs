//! Task categories: a classification plus a task type label.

use super::{Database, like_pattern, new_id, now_ms};
use crate::error::ApiError;
use crate::types::{CategoryGroup, CategoryInput, TaskCategory, non_empty};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};

const CATEGORY_COLUMNS: &str = "id, classification, task_type, is_active, created_at";

fn parse_category_row(row: &Row) -> rusqlite::Result<TaskCategory> {
    Ok(TaskCategory {
        id: row.get("id")?,
        classification: row.get("classification")?,
        task_type: row.get("task_type")?,
        is_active: row.get("is_active")?,
        created_at: row.get("created_at")?,
    })
}

fn get_category_internal(conn: &Connection, id: &str) -> Result<Option<TaskCategory>> {
    let category = conn
        .query_row(
            &format!("SELECT {CATEGORY_COLUMNS} FROM task_categories WHERE id = ?1"),
            params![id],
            parse_category_row,
        )
        .optional()?;
    Ok(category)
}

pub(crate) fn require_active_category(conn: &Connection, id: &str) -> Result<()> {
    match get_category_internal(conn, id)? {
        Some(category) if category.is_active => Ok(()),
        _ => Err(ApiError::category_not_found(id).into()),
    }
}

/// Group categories by classification, keeping the input order.
pub fn group_by_classification(categories: Vec<TaskCategory>) -> Vec<CategoryGroup> {
    let mut groups: Vec<CategoryGroup> = Vec::new();
    for category in categories {
        match groups
            .iter_mut()
            .find(|g| g.classification == category.classification)
        {
            Some(group) => group.categories.push(category),
            None => groups.push(CategoryGroup {
                classification: category.classification.clone(),
                categories: vec![category],
            }),
        }
    }
    groups
}

impl Database {
    pub fn create_category(&self, input: &CategoryInput) -> Result<TaskCategory> {
        input.validate()?;
        let id = new_id();
        let now = now_ms();

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO task_categories (id, classification, task_type, is_active, created_at)
                 VALUES (?1, ?2, ?3, 1, ?4)",
                params![
                    &id,
                    input.classification.trim(),
                    input.task_type.trim(),
                    now
                ],
            )?;
            get_category_internal(conn, &id)?
                .ok_or_else(|| ApiError::category_not_found(&id).into())
        })
    }

    pub fn get_category(&self, id: &str) -> Result<Option<TaskCategory>> {
        self.with_conn(|conn| get_category_internal(conn, id))
    }

    /// List active categories ordered by classification then task type.
    pub fn list_categories(&self, search: Option<&str>) -> Result<Vec<TaskCategory>> {
        let pattern = non_empty(search).map(like_pattern);

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CATEGORY_COLUMNS} FROM task_categories
                 WHERE is_active = 1
                   AND (?1 IS NULL
                        OR LOWER(classification) LIKE ?1 ESCAPE '\\'
                        OR LOWER(task_type) LIKE ?1 ESCAPE '\\')
                 ORDER BY classification, task_type"
            ))?;
            let categories = stmt
                .query_map(params![pattern], parse_category_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(categories)
        })
    }

    /// Active categories grouped by classification.
    pub fn grouped_categories(&self) -> Result<Vec<CategoryGroup>> {
        Ok(group_by_classification(self.list_categories(None)?))
    }

    pub fn update_category(&self, id: &str, input: &CategoryInput) -> Result<TaskCategory> {
        input.validate()?;
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE task_categories SET classification = ?1, task_type = ?2 WHERE id = ?3",
                params![input.classification.trim(), input.task_type.trim(), id],
            )?;
            if changed == 0 {
                return Err(ApiError::category_not_found(id).into());
            }
            get_category_internal(conn, id)?.ok_or_else(|| ApiError::category_not_found(id).into())
        })
    }

    /// Delete a category. Categories still used by a task cannot be deleted.
    pub fn delete_category(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            let in_use: i64 = conn.query_row(
                "SELECT COUNT(*) FROM tasks WHERE category_id = ?1",
                params![id],
                |row| row.get(0),
            )?;
            if in_use > 0 {
                return Err(ApiError::conflict("لا يمكن حذف نوع مهمة مرتبط بمهام")
                    .with_details(format!("{} task(s) use category {}", in_use, id))
                    .into());
            }
            let changed = conn.execute("DELETE FROM task_categories WHERE id = ?1", params![id])?;
            if changed == 0 {
                return Err(ApiError::category_not_found(id).into());
            }
            Ok(())
        })
    }
}
