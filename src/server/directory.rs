//! Companies, employees and task categories.
//!
//! Any session may read these lists; writes are admin only.

use super::AppState;
use super::extract::{ApiJson, ApiQuery};
use crate::auth::Session;
use crate::error::{ApiError, ApiResult};
use crate::types::{
    CategoryGroup, CategoryInput, Company, CompanyUpdate, Employee, EmployeeUpdate, NewCompany,
    NewEmployee, Role, TaskCategory, non_empty,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SearchQuery {
    #[serde(default)]
    search: Option<String>,
}

impl SearchQuery {
    fn term(&self) -> Option<&str> {
        non_empty(self.search.as_deref())
    }
}

// ---------------------------------------------------------------------------
// Companies
// ---------------------------------------------------------------------------

pub(crate) async fn list_companies(
    State(state): State<AppState>,
    _session: Session,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> ApiResult<Json<Vec<Company>>> {
    Ok(Json(state.db().list_companies(query.term())?))
}

pub(crate) async fn get_company(
    State(state): State<AppState>,
    _session: Session,
    Path(id): Path<String>,
) -> ApiResult<Json<Company>> {
    let company = state
        .db()
        .get_company(&id)?
        .ok_or_else(|| ApiError::company_not_found(&id))?;
    Ok(Json(company))
}

pub(crate) async fn create_company(
    State(state): State<AppState>,
    session: Session,
    ApiJson(input): ApiJson<NewCompany>,
) -> ApiResult<(StatusCode, Json<Company>)> {
    session.require_admin()?;
    let company = state.db().create_company(&input)?;
    info!(company_id = %company.id, by = %session.user.username, "Company created");
    Ok((StatusCode::CREATED, Json(company)))
}

pub(crate) async fn update_company(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<CompanyUpdate>,
) -> ApiResult<Json<Company>> {
    session.require_admin()?;
    let company = state.db().update_company(&id, &update)?;
    info!(company_id = %id, by = %session.user.username, "Company updated");
    Ok(Json(company))
}

pub(crate) async fn delete_company(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    session.require_admin()?;
    state.db().deactivate_company(&id)?;
    info!(company_id = %id, by = %session.user.username, "Company deactivated");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Employees
// ---------------------------------------------------------------------------

pub(crate) async fn list_employees(
    State(state): State<AppState>,
    _session: Session,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> ApiResult<Json<Vec<Employee>>> {
    Ok(Json(state.db().list_employees(query.term())?))
}

pub(crate) async fn get_employee(
    State(state): State<AppState>,
    _session: Session,
    Path(id): Path<String>,
) -> ApiResult<Json<Employee>> {
    let employee = state
        .db()
        .get_employee(&id)?
        .ok_or_else(|| ApiError::employee_not_found(&id))?;
    Ok(Json(employee))
}

pub(crate) async fn create_employee(
    State(state): State<AppState>,
    session: Session,
    ApiJson(input): ApiJson<NewEmployee>,
) -> ApiResult<(StatusCode, Json<Employee>)> {
    session.require_admin()?;
    let auth = state.auth().clone();
    let employee = tokio::task::spawn_blocking(move || auth.create_employee(&input))
        .await
        .map_err(ApiError::internal)??;
    info!(
        employee_id = %employee.id,
        username = %employee.username,
        by = %session.user.username,
        "Employee created"
    );
    Ok((StatusCode::CREATED, Json(employee)))
}

pub(crate) async fn update_employee(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<EmployeeUpdate>,
) -> ApiResult<Json<Employee>> {
    session.require_admin()?;
    if id == session.user.id && update.role.is_some_and(|role| role != Role::Admin) {
        return Err(ApiError::conflict("لا يمكنك تغيير صلاحيتك").with_field("role"));
    }
    let auth = state.auth().clone();
    let employee = {
        let id = id.clone();
        tokio::task::spawn_blocking(move || auth.update_employee(&id, &update))
            .await
            .map_err(ApiError::internal)??
    };
    info!(employee_id = %id, by = %session.user.username, "Employee updated");
    Ok(Json(employee))
}

pub(crate) async fn delete_employee(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    session.require_admin()?;
    if id == session.user.id {
        return Err(ApiError::conflict("لا يمكنك تعطيل حسابك"));
    }
    state.db().deactivate_employee(&id)?;
    info!(employee_id = %id, by = %session.user.username, "Employee deactivated");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

pub(crate) async fn list_categories(
    State(state): State<AppState>,
    _session: Session,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> ApiResult<Json<Vec<TaskCategory>>> {
    Ok(Json(state.db().list_categories(query.term())?))
}

pub(crate) async fn grouped_categories(
    State(state): State<AppState>,
    _session: Session,
) -> ApiResult<Json<Vec<CategoryGroup>>> {
    Ok(Json(state.db().grouped_categories()?))
}

pub(crate) async fn create_category(
    State(state): State<AppState>,
    session: Session,
    ApiJson(input): ApiJson<CategoryInput>,
) -> ApiResult<(StatusCode, Json<TaskCategory>)> {
    session.require_admin()?;
    let category = state.db().create_category(&input)?;
    info!(category_id = %category.id, by = %session.user.username, "Category created");
    Ok((StatusCode::CREATED, Json(category)))
}

pub(crate) async fn update_category(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<CategoryInput>,
) -> ApiResult<Json<TaskCategory>> {
    session.require_admin()?;
    Ok(Json(state.db().update_category(&id, &input)?))
}

pub(crate) async fn delete_category(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    session.require_admin()?;
    state.db().delete_category(&id)?;
    info!(category_id = %id, by = %session.user.username, "Category deleted");
    Ok(StatusCode::NO_CONTENT)
}
