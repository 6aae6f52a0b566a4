//! Client companies. Removal is a soft delete via `is_active`.

use super::{Database, like_pattern, new_id, now_ms};
use crate::error::ApiError;
use crate::types::{Company, CompanyUpdate, NewCompany, non_empty};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};

const COMPANY_COLUMNS: &str = "id, name_ar, name_en, legal_entity, sector, tax_authority, \
                               is_active, created_at, updated_at";

fn parse_company_row(row: &Row) -> rusqlite::Result<Company> {
    Ok(Company {
        id: row.get("id")?,
        name_ar: row.get("name_ar")?,
        name_en: row.get("name_en")?,
        legal_entity: row.get("legal_entity")?,
        sector: row.get("sector")?,
        tax_authority: row.get("tax_authority")?,
        is_active: row.get("is_active")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn get_company_internal(conn: &Connection, id: &str) -> Result<Option<Company>> {
    let company = conn
        .query_row(
            &format!("SELECT {COMPANY_COLUMNS} FROM companies WHERE id = ?1"),
            params![id],
            parse_company_row,
        )
        .optional()?;
    Ok(company)
}

/// Ensure `id` names an active company.
pub(crate) fn require_active_company(conn: &Connection, id: &str) -> Result<()> {
    match get_company_internal(conn, id)? {
        Some(company) if company.is_active => Ok(()),
        _ => Err(ApiError::company_not_found(id).into()),
    }
}

/// Normalize an optional text field: trimmed, empty becomes NULL.
fn optional_text(value: Option<&str>) -> Option<String> {
    non_empty(value).map(str::to_string)
}

impl Database {
    pub fn create_company(&self, input: &NewCompany) -> Result<Company> {
        let name_ar = input.name_ar.trim();
        if name_ar.is_empty() {
            return Err(ApiError::missing_field("name_ar").into());
        }
        let id = new_id();
        let now = now_ms();

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO companies (
                    id, name_ar, name_en, legal_entity, sector, tax_authority,
                    is_active, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?7)",
                params![
                    &id,
                    name_ar,
                    optional_text(input.name_en.as_deref()),
                    optional_text(input.legal_entity.as_deref()),
                    optional_text(input.sector.as_deref()),
                    optional_text(input.tax_authority.as_deref()),
                    now,
                ],
            )?;

            get_company_internal(conn, &id)?.ok_or_else(|| ApiError::company_not_found(&id).into())
        })
    }

    pub fn get_company(&self, id: &str) -> Result<Option<Company>> {
        self.with_conn(|conn| get_company_internal(conn, id))
    }

    /// List active companies ordered by Arabic name, optionally filtered by a
    /// search term matching either name.
    pub fn list_companies(&self, search: Option<&str>) -> Result<Vec<Company>> {
        let pattern = non_empty(search).map(like_pattern);

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COMPANY_COLUMNS} FROM companies
                 WHERE is_active = 1
                   AND (?1 IS NULL
                        OR LOWER(name_ar) LIKE ?1 ESCAPE '\\'
                        OR LOWER(COALESCE(name_en, '')) LIKE ?1 ESCAPE '\\')
                 ORDER BY name_ar"
            ))?;
            let companies = stmt
                .query_map(params![pattern], parse_company_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(companies)
        })
    }

    pub fn update_company(&self, id: &str, update: &CompanyUpdate) -> Result<Company> {
        let now = now_ms();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let current =
                get_company_internal(&tx, id)?.ok_or_else(|| ApiError::company_not_found(id))?;

            let name_ar = match update.name_ar.as_deref().map(str::trim) {
                Some("") => return Err(ApiError::missing_field("name_ar").into()),
                Some(name) => name.to_string(),
                None => current.name_ar,
            };
            let merge = |new: &Option<Option<String>>, old: Option<String>| match new {
                Some(value) => optional_text(value.as_deref()),
                None => old,
            };
            let name_en = merge(&update.name_en, current.name_en);
            let legal_entity = merge(&update.legal_entity, current.legal_entity);
            let sector = merge(&update.sector, current.sector);
            let tax_authority = merge(&update.tax_authority, current.tax_authority);

            tx.execute(
                "UPDATE companies SET name_ar = ?1, name_en = ?2, legal_entity = ?3, sector = ?4,
                    tax_authority = ?5, updated_at = ?6
                 WHERE id = ?7",
                params![name_ar, name_en, legal_entity, sector, tax_authority, now, id],
            )?;

            let updated =
                get_company_internal(&tx, id)?.ok_or_else(|| ApiError::company_not_found(id))?;
            tx.commit()?;
            Ok(updated)
        })
    }

    /// Soft-delete a company. Its tasks keep referencing it.
    pub fn deactivate_company(&self, id: &str) -> Result<()> {
        let now = now_ms();
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE companies SET is_active = 0, updated_at = ?1 WHERE id = ?2 AND is_active = 1",
                params![now, id],
            )?;
            if changed == 0 {
                return Err(ApiError::company_not_found(id).into());
            }
            Ok(())
        })
    }
}
