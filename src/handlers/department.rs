//! Department handlers
//!
//! Department aggregate CRUD plus the member listing endpoint

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;

use crate::entity::department::Department;
use crate::entity::employee::Employee;
use crate::error::{AppError, AppResult, OptionExt};
use crate::state::AppState;

/// Create department request
#[derive(Debug, Deserialize)]
pub struct CreateDepartmentRequest {
    pub name: String,
}

/// Query parameters for the member listing
#[derive(Debug, Deserialize)]
pub struct FullTimeQuery {
    #[serde(rename = "fullTime")]
    pub full_time: Option<bool>,
}

/// GET /departments
pub async fn get_departments(State(state): State<AppState>) -> AppResult<Json<Vec<Department>>> {
    Ok(Json(state.departments.find_all().await?))
}

/// GET /departments/:id
pub async fn get_department(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Department>> {
    let department = state
        .departments
        .find_by_id(id)
        .await?
        .ok_or_not_found(format!("Department not found. Id: {}", id))?;
    Ok(Json(department))
}

/// GET /departments/:id/employees
pub async fn get_department_employees(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<FullTimeQuery>,
) -> AppResult<Json<Vec<Employee>>> {
    let department = state
        .departments
        .find_by_id(id)
        .await?
        .ok_or_not_found(format!("Department not found. Id: {}", id))?;

    let employees = match query.full_time {
        Some(full_time) => department
            .employees
            .into_iter()
            .filter(|employee| employee.full_time == full_time)
            .collect(),
        None => department.employees,
    };
    Ok(Json(employees))
}

/// POST /departments
pub async fn create_department(
    State(state): State<AppState>,
    Json(req): Json<CreateDepartmentRequest>,
) -> AppResult<(StatusCode, Json<Department>)> {
    if req.name.trim().is_empty() {
        return Err(AppError::Validation("Name can not be empty".to_string()));
    }

    // Name uniqueness is enforced here, by lookup, not by the database
    if state.departments.find_by_name(&req.name).await?.is_some() {
        return Err(AppError::Conflict(format!(
            "Department with name \"{}\" already exists.",
            req.name
        )));
    }

    let department = state.departments.save(Department::new(req.name)).await?;
    Ok((StatusCode::CREATED, Json(department)))
}

/// PUT /departments/:id
///
/// Replaces the name and the member list; the manager is only replaced
/// when the request carries one.
pub async fn update_department(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<Department>,
) -> AppResult<Json<Department>> {
    let mut department = state
        .departments
        .find_by_id(id)
        .await?
        .ok_or_not_found(format!("Department not found. Id: {}", id))?;

    department.name = req.name;
    if req.manager.is_some() {
        department.manager = req.manager;
    }
    department.employees = req.employees;

    Ok(Json(state.departments.save(department).await?))
}

/// DELETE /departments/:id
pub async fn delete_department(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    let department = state
        .departments
        .find_by_id(id)
        .await?
        .ok_or_not_found(format!("Department not found. Id: {}", id))?;

    state.departments.delete(&department).await?;
    Ok(StatusCode::NO_CONTENT)
}
