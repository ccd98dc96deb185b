//! Employee handlers
//!
//! Single-table employee CRUD and attribute lookups

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;

use crate::entity::employee::Employee;
use crate::error::{AppError, AppResult, OptionExt};
use crate::state::AppState;

/// Create employee request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmployeeRequest {
    pub first_name: String,
    pub last_name: String,
    pub position: String,
    pub is_full_time: bool,
}

/// Employee list query parameters
#[derive(Debug, Deserialize)]
pub struct EmployeeQuery {
    pub position: Option<String>,
    #[serde(rename = "fullTime")]
    pub full_time: Option<bool>,
}

/// GET /employees
pub async fn get_employees(
    State(state): State<AppState>,
    Query(query): Query<EmployeeQuery>,
) -> AppResult<Json<Vec<Employee>>> {
    let employees = state
        .employees
        .find_all(query.position.as_deref(), query.full_time)
        .await?;
    Ok(Json(employees))
}

/// GET /employees/:id
pub async fn get_employee(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Employee>> {
    let employee = state
        .employees
        .find_by_id(id)
        .await?
        .ok_or_not_found(format!("Employee not found. Id: {}", id))?;
    Ok(Json(employee))
}

/// POST /employees
pub async fn create_employee(
    State(state): State<AppState>,
    Json(req): Json<CreateEmployeeRequest>,
) -> AppResult<(StatusCode, Json<Employee>)> {
    if req.first_name.trim().is_empty() || req.last_name.trim().is_empty() {
        return Err(AppError::Validation(
            "First and last name can not be empty".to_string(),
        ));
    }

    let employee = state
        .employees
        .save(Employee {
            id: None,
            first_name: req.first_name,
            last_name: req.last_name,
            position: req.position,
            full_time: req.is_full_time,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(employee)))
}

/// PUT /employees/:id
pub async fn update_employee(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<Employee>,
) -> AppResult<Json<Employee>> {
    state
        .employees
        .find_by_id(id)
        .await?
        .ok_or_not_found(format!("Employee not found. Id: {}", id))?;

    let employee = state.employees.save(Employee { id: Some(id), ..req }).await?;
    Ok(Json(employee))
}

/// DELETE /employees/:id
pub async fn delete_employee(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    state
        .employees
        .find_by_id(id)
        .await?
        .ok_or_not_found(format!("Employee not found. Id: {}", id))?;

    state.employees.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
