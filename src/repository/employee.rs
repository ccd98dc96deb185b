//! Employee repository
//!
//! Single-table reads and writes for employee records. The upsert doubles
//! as the delegate the department repository calls inside its own
//! transaction, so it runs on any connection.

use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set,
};

use crate::entity::employee::{self, Employee};
use crate::error::AppResult;

#[derive(Clone)]
pub struct EmployeeRepository {
    db: Arc<DatabaseConnection>,
}

impl EmployeeRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// All employees, optionally filtered by position and/or full-time
    /// status, ordered by id.
    pub async fn find_all(
        &self,
        position: Option<&str>,
        full_time: Option<bool>,
    ) -> AppResult<Vec<Employee>> {
        let mut query = employee::Entity::find();
        if let Some(position) = position {
            query = query.filter(employee::Column::Position.eq(position));
        }
        if let Some(full_time) = full_time {
            query = query.filter(employee::Column::IsFullTime.eq(full_time));
        }

        let models = query
            .order_by_asc(employee::Column::Id)
            .all(self.db.as_ref())
            .await?;
        Ok(models.into_iter().map(Employee::from).collect())
    }

    /// One employee by id, or None.
    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<Employee>> {
        let model = employee::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Employee::from))
    }

    /// Insert or update an employee on the pooled connection.
    pub async fn save(&self, employee: Employee) -> AppResult<Employee> {
        Ok(Self::upsert(self.db.as_ref(), employee).await?)
    }

    /// Delete an employee row by id.
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        employee::Entity::delete_by_id(id)
            .exec(self.db.as_ref())
            .await?;
        Ok(())
    }

    /// Inserts the employee when it has no id yet, updates it in place
    /// otherwise. Takes any connection so it can run inside an open
    /// transaction.
    pub(crate) async fn upsert<C: ConnectionTrait>(
        conn: &C,
        employee: Employee,
    ) -> Result<Employee, DbErr> {
        let model = match employee.id {
            None => {
                employee::ActiveModel {
                    first_name: Set(employee.first_name),
                    last_name: Set(employee.last_name),
                    position: Set(employee.position),
                    is_full_time: Set(employee.full_time),
                    ..Default::default()
                }
                .insert(conn)
                .await?
            }
            Some(id) => {
                employee::ActiveModel {
                    id: Set(id),
                    first_name: Set(employee.first_name),
                    last_name: Set(employee.last_name),
                    position: Set(employee.position),
                    is_full_time: Set(employee.full_time),
                }
                .update(conn)
                .await?
            }
        };
        Ok(model.into())
    }
}
