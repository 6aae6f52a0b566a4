//! Server-side login sessions.
//!
//! A session row is what makes a signed token usable: deleting the row
//! revokes the token even though its signature and expiry still verify.

use super::{Database, new_id, now_ms};
use anyhow::Result;
use rusqlite::{OptionalExtension, Row, params};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionRecord {
    pub id: String,
    pub employee_id: String,
    pub created_at: i64,
    pub expires_at: i64,
}

fn parse_session_row(row: &Row) -> rusqlite::Result<SessionRecord> {
    Ok(SessionRecord {
        id: row.get("id")?,
        employee_id: row.get("employee_id")?,
        created_at: row.get("created_at")?,
        expires_at: row.get("expires_at")?,
    })
}

impl Database {
    /// Open a session for an employee, valid for `ttl_ms`.
    pub fn create_session(&self, employee_id: &str, ttl_ms: i64) -> Result<SessionRecord> {
        let now = now_ms();
        let session = SessionRecord {
            id: new_id(),
            employee_id: employee_id.to_string(),
            created_at: now,
            expires_at: now + ttl_ms,
        };

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO sessions (id, employee_id, created_at, expires_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    &session.id,
                    &session.employee_id,
                    session.created_at,
                    session.expires_at
                ],
            )?;
            Ok(())
        })?;

        Ok(session)
    }

    /// Get a session that has not yet expired.
    pub fn get_active_session(&self, id: &str) -> Result<Option<SessionRecord>> {
        let now = now_ms();
        self.with_conn(|conn| {
            let session = conn
                .query_row(
                    "SELECT id, employee_id, created_at, expires_at FROM sessions
                     WHERE id = ?1 AND expires_at > ?2",
                    params![id, now],
                    parse_session_row,
                )
                .optional()?;
            Ok(session)
        })
    }

    /// Delete one session. Returns whether it existed.
    pub fn delete_session(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM sessions WHERE id = ?1", params![id])?;
            Ok(changed > 0)
        })
    }

    /// Delete every session of an employee.
    pub fn delete_sessions_for_employee(&self, employee_id: &str) -> Result<usize> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "DELETE FROM sessions WHERE employee_id = ?1",
                params![employee_id],
            )?;
            Ok(changed)
        })
    }

    /// Remove expired sessions.
    pub fn purge_expired_sessions(&self) -> Result<usize> {
        let now = now_ms();
        self.with_conn(|conn| {
            let changed =
                conn.execute("DELETE FROM sessions WHERE expires_at <= ?1", params![now])?;
            Ok(changed)
        })
    }
}
