//! Employee accounts. Removal is a soft delete via `is_active`.

use super::{Database, like_pattern, new_id, now_ms};
use crate::error::ApiError;
use crate::types::{Employee, EmployeeUpdate, NewEmployee, Role};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};

const EMPLOYEE_COLUMNS: &str = "id, username, password_hash, full_name_ar, full_name_en, role, \
                                is_active, created_at, updated_at";

pub(crate) fn parse_employee_row(row: &Row) -> rusqlite::Result<Employee> {
    Ok(Employee {
        id: row.get("id")?,
        username: row.get("username")?,
        password_hash: row.get("password_hash")?,
        full_name_ar: row.get("full_name_ar")?,
        full_name_en: row.get("full_name_en")?,
        role: row.get("role")?,
        is_active: row.get("is_active")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

pub(crate) fn get_employee_internal(conn: &Connection, id: &str) -> Result<Option<Employee>> {
    let employee = conn
        .query_row(
            &format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?1"),
            params![id],
            parse_employee_row,
        )
        .optional()?;
    Ok(employee)
}

/// Ensure `id` names an active employee.
pub(crate) fn require_active_employee(conn: &Connection, id: &str) -> Result<()> {
    match get_employee_internal(conn, id)? {
        Some(employee) if employee.is_active => Ok(()),
        _ => Err(ApiError::employee_not_found(id).into()),
    }
}

fn username_exists(conn: &Connection, username: &str, except_id: Option<&str>) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM employees WHERE username = ?1 AND id != COALESCE(?2, '')",
        params![username, except_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

impl Database {
    /// Create an employee. The caller hashes the password.
    pub fn create_employee(&self, input: &NewEmployee, password_hash: &str) -> Result<Employee> {
        input.validate()?;
        let id = new_id();
        let now = now_ms();
        let username = input.username.trim();

        self.with_conn(|conn| {
            if username_exists(conn, username, None)? {
                return Err(ApiError::username_taken(username).into());
            }

            conn.execute(
                "INSERT INTO employees (
                    id, username, password_hash, full_name_ar, full_name_en, role,
                    is_active, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?7)",
                params![
                    &id,
                    username,
                    password_hash,
                    input.full_name_ar.trim(),
                    input.full_name_en.as_deref(),
                    input.role,
                    now,
                ],
            )?;

            get_employee_internal(conn, &id)?
                .ok_or_else(|| ApiError::employee_not_found(&id).into())
        })
    }

    /// Get an employee by id, active or not.
    pub fn get_employee(&self, id: &str) -> Result<Option<Employee>> {
        self.with_conn(|conn| get_employee_internal(conn, id))
    }

    /// Find the active employee with this username (login existence check).
    pub fn find_active_employee_by_username(&self, username: &str) -> Result<Option<Employee>> {
        self.with_conn(|conn| {
            let employee = conn
                .query_row(
                    &format!(
                        "SELECT {EMPLOYEE_COLUMNS} FROM employees
                         WHERE username = ?1 AND is_active = 1"
                    ),
                    params![username.trim()],
                    parse_employee_row,
                )
                .optional()?;
            Ok(employee)
        })
    }

    /// List active employees ordered by Arabic name, optionally filtered by a
    /// search term matching either name or the username.
    pub fn list_employees(&self, search: Option<&str>) -> Result<Vec<Employee>> {
        let pattern = crate::types::non_empty(search).map(like_pattern);

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {EMPLOYEE_COLUMNS} FROM employees
                 WHERE is_active = 1
                   AND (?1 IS NULL
                        OR LOWER(full_name_ar) LIKE ?1 ESCAPE '\\'
                        OR LOWER(COALESCE(full_name_en, '')) LIKE ?1 ESCAPE '\\'
                        OR LOWER(username) LIKE ?1 ESCAPE '\\')
                 ORDER BY full_name_ar, username"
            ))?;
            let employees = stmt
                .query_map(params![pattern], parse_employee_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(employees)
        })
    }

    /// Apply a partial update. `password_hash` replaces the stored hash when given.
    pub fn update_employee(
        &self,
        id: &str,
        update: &EmployeeUpdate,
        password_hash: Option<&str>,
    ) -> Result<Employee> {
        let now = now_ms();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let current = get_employee_internal(&tx, id)?
                .ok_or_else(|| ApiError::employee_not_found(id))?;

            let username = match update.username.as_deref().map(str::trim) {
                Some("") => return Err(ApiError::missing_field("username").into()),
                Some(username) => {
                    if username_exists(&tx, username, Some(id))? {
                        return Err(ApiError::username_taken(username).into());
                    }
                    username.to_string()
                }
                None => current.username,
            };

            let full_name_ar = match update.full_name_ar.as_deref().map(str::trim) {
                Some("") => return Err(ApiError::missing_field("full_name_ar").into()),
                Some(name) => name.to_string(),
                None => current.full_name_ar,
            };

            let full_name_en = match &update.full_name_en {
                Some(value) => value.clone(),
                None => current.full_name_en,
            };
            let role = update.role.unwrap_or(current.role);
            let password_hash = password_hash.unwrap_or(&current.password_hash);

            tx.execute(
                "UPDATE employees SET username = ?1, password_hash = ?2, full_name_ar = ?3,
                    full_name_en = ?4, role = ?5, updated_at = ?6
                 WHERE id = ?7",
                params![username, password_hash, full_name_ar, full_name_en, role, now, id],
            )?;

            // A demoted admin must log in again to pick up the new role.
            if role != current.role || password_hash != current.password_hash {
                tx.execute("DELETE FROM sessions WHERE employee_id = ?1", params![id])?;
            }

            let updated = get_employee_internal(&tx, id)?
                .ok_or_else(|| ApiError::employee_not_found(id))?;
            tx.commit()?;
            Ok(updated)
        })
    }

    /// Soft-delete an employee and end their sessions.
    pub fn deactivate_employee(&self, id: &str) -> Result<()> {
        let now = now_ms();
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let changed = tx.execute(
                "UPDATE employees SET is_active = 0, updated_at = ?1 WHERE id = ?2 AND is_active = 1",
                params![now, id],
            )?;
            if changed == 0 {
                return Err(ApiError::employee_not_found(id).into());
            }
            tx.execute("DELETE FROM sessions WHERE employee_id = ?1", params![id])?;
            tx.commit()?;
            Ok(())
        })
    }

    /// Number of active administrators.
    pub fn count_active_admins(&self) -> Result<i64> {
        self.with_conn(|conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM employees WHERE role = ?1 AND is_active = 1",
                params![Role::Admin],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }
}
