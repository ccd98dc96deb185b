use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::error::AppError;
use crate::handlers;
use crate::state::AppState;

pub mod health;

/// Create the main router
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Department routes
        .route("/departments", get(handlers::department::get_departments))
        .route("/departments", post(handlers::department::create_department))
        .route("/departments/:id", get(handlers::department::get_department))
        .route("/departments/:id", put(handlers::department::update_department))
        .route("/departments/:id", delete(handlers::department::delete_department))
        .route(
            "/departments/:id/employees",
            get(handlers::department::get_department_employees),
        )
        // Employee routes
        .route("/employees", get(handlers::employee::get_employees))
        .route("/employees", post(handlers::employee::create_employee))
        .route("/employees/:id", get(handlers::employee::get_employee))
        .route("/employees/:id", put(handlers::employee::update_employee))
        .route("/employees/:id", delete(handlers::employee::delete_employee))
        .fallback(fallback)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Fallback handler for 404
pub async fn fallback() -> AppError {
    AppError::NotFound("no such route".to_string())
}
