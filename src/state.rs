use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::config::Config;
use crate::repository::{DepartmentRepository, EmployeeRepository};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: DatabaseConnection,
    /// Department aggregate repository
    pub departments: DepartmentRepository,
    /// Employee repository
    pub employees: EmployeeRepository,
    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create new application state
    pub fn new(db: DatabaseConnection, config: Config) -> Self {
        Self {
            departments: DepartmentRepository::new(db.clone()),
            employees: EmployeeRepository::new(db.clone()),
            db,
            config: Arc::new(config),
        }
    }
}
