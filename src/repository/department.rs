//! Department aggregate repository
//!
//! Reads flatten a four-table left-outer join into department aggregates;
//! writes fan one aggregate back out over the department, employee, and
//! junction tables inside a single transaction.

use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    FromQueryResult, QueryFilter, Set, Statement, TransactionTrait,
};

use crate::entity::department::{self, Department};
use crate::entity::employee::Employee;
use crate::entity::{department_employee, department_manager};
use crate::error::{AppError, AppResult};
use crate::repository::employee::EmployeeRepository;

use super::runs::runs_by;

/// Left-outer join of departments with their manager and their member
/// employees. Manager and employee columns are independently nullable.
///
/// Every query built on this must keep rows for one department
/// contiguous; the repository appends `ORDER BY d.id` on each variant so
/// the run grouping downstream sees each department exactly once.
const SELECT_QUERY: &str = r#"
SELECT d.id AS d_id, d.name AS d_name,
    m.id AS m_id, m.first_name AS m_first_name, m.last_name AS m_last_name,
    m.position AS m_position, m.is_full_time AS m_is_full_time,
    e.id AS e_id, e.first_name AS e_first_name, e.last_name AS e_last_name,
    e.position AS e_position, e.is_full_time AS e_is_full_time
FROM departments d
LEFT JOIN department_managers dm ON dm.department_id = d.id
LEFT JOIN employees m ON m.id = dm.employee_id
LEFT JOIN department_employees de ON de.department_id = d.id
LEFT JOIN employees e ON e.id = de.employee_id
"#;

/// One joined row, decoded once at the query boundary.
#[derive(Debug, FromQueryResult)]
struct DepartmentRow {
    d_id: i64,
    d_name: String,
    m_id: Option<i64>,
    m_first_name: Option<String>,
    m_last_name: Option<String>,
    m_position: Option<String>,
    m_is_full_time: Option<bool>,
    e_id: Option<i64>,
    e_first_name: Option<String>,
    e_last_name: Option<String>,
    e_position: Option<String>,
    e_is_full_time: Option<bool>,
}

impl DepartmentRow {
    /// Manager carried on this row, if the manager join matched.
    fn manager(&self) -> Option<Employee> {
        self.m_id.map(|id| Employee {
            id: Some(id),
            first_name: self.m_first_name.clone().unwrap_or_default(),
            last_name: self.m_last_name.clone().unwrap_or_default(),
            position: self.m_position.clone().unwrap_or_default(),
            full_time: self.m_is_full_time.unwrap_or_default(),
        })
    }

    /// Member employee carried on this row, if the member join matched.
    fn member(&self) -> Option<Employee> {
        self.e_id.map(|id| Employee {
            id: Some(id),
            first_name: self.e_first_name.clone().unwrap_or_default(),
            last_name: self.e_last_name.clone().unwrap_or_default(),
            position: self.e_position.clone().unwrap_or_default(),
            full_time: self.e_is_full_time.unwrap_or_default(),
        })
    }
}

/// Maps one run of joined rows (one department) to its aggregate.
///
/// The department and manager columns repeat on every row of the run, so
/// both are read from the first row only; each row contributes at most
/// one member employee, in row order.
fn from_rows(rows: &[DepartmentRow]) -> AppResult<Department> {
    let first = rows
        .first()
        .ok_or_else(|| AppError::DataIntegrity("empty department row group".to_string()))?;

    Ok(Department {
        id: Some(first.d_id),
        name: first.d_name.clone(),
        manager: first.manager(),
        employees: rows.iter().filter_map(DepartmentRow::member).collect(),
    })
}

/// Rows that do not decode to the expected column types abort the read as
/// data-integrity failures rather than being dropped.
fn decode_error(err: DbErr) -> AppError {
    match err {
        DbErr::Type(msg) => AppError::DataIntegrity(msg),
        err @ DbErr::TryIntoErr { .. } => AppError::DataIntegrity(err.to_string()),
        err => AppError::Database(err),
    }
}

/// Repository for the department aggregate.
#[derive(Clone)]
pub struct DepartmentRepository {
    db: Arc<DatabaseConnection>,
}

impl DepartmentRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// All departments, ordered by id.
    pub async fn find_all(&self) -> AppResult<Vec<Department>> {
        let stmt = Statement::from_string(
            self.db.get_database_backend(),
            format!("{SELECT_QUERY} ORDER BY d.id"),
        );
        let rows = DepartmentRow::find_by_statement(stmt)
            .all(self.db.as_ref())
            .await
            .map_err(decode_error)?;

        runs_by(rows, |row| row.d_id)
            .map(|run| from_rows(&run))
            .collect()
    }

    /// One department by id, or None.
    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<Department>> {
        let sql = format!("{SELECT_QUERY} WHERE d.id = $1 ORDER BY d.id");
        let stmt =
            Statement::from_sql_and_values(self.db.get_database_backend(), &sql, [id.into()]);
        self.find_one(stmt).await
    }

    /// One department by name, or None. Backs the uniqueness check the
    /// service layer runs before create.
    pub async fn find_by_name(&self, name: &str) -> AppResult<Option<Department>> {
        let sql = format!("{SELECT_QUERY} WHERE d.name = $1 ORDER BY d.id");
        let stmt =
            Statement::from_sql_and_values(self.db.get_database_backend(), &sql, [name.into()]);
        self.find_one(stmt).await
    }

    async fn find_one(&self, stmt: Statement) -> AppResult<Option<Department>> {
        let rows = DepartmentRow::find_by_statement(stmt)
            .all(self.db.as_ref())
            .await
            .map_err(decode_error)?;

        runs_by(rows, |row| row.d_id)
            .map(|run| from_rows(&run))
            .next()
            .transpose()
    }

    /// Saves the aggregate atomically: department upsert, manager and
    /// member upserts, then a delete-then-insert rewrite of both junction
    /// tables. Returns the fully identified aggregate.
    ///
    /// Any statement failure rolls the whole transaction back; the error
    /// propagates unchanged.
    pub async fn save(&self, department: Department) -> AppResult<Department> {
        let department = self
            .db
            .transaction::<_, Department, AppError>(|txn| {
                Box::pin(async move {
                    let department = upsert_department(txn, department).await?;
                    let department = save_manager(txn, department).await?;
                    let department = save_employees(txn, department).await?;

                    let id = department.id.ok_or_else(|| {
                        AppError::DataIntegrity("department id missing after upsert".to_string())
                    })?;
                    let manager_id = department.manager.as_ref().and_then(|m| m.id);
                    let member_ids: Vec<i64> =
                        department.employees.iter().filter_map(|e| e.id).collect();

                    rewrite_links(txn, id, manager_id, &member_ids).await?;

                    Ok(department)
                })
            })
            .await?;

        Ok(department)
    }

    /// Deletes the aggregate atomically: both junction tables first, then
    /// the department row. Whether the department existed beforehand is
    /// the caller's concern.
    pub async fn delete(&self, department: &Department) -> AppResult<()> {
        let Some(id) = department.id else {
            return Err(AppError::BadRequest(
                "cannot delete a department that was never saved".to_string(),
            ));
        };

        self.db
            .transaction::<_, (), AppError>(|txn| {
                Box::pin(async move {
                    department_manager::Entity::delete_many()
                        .filter(department_manager::Column::DepartmentId.eq(id))
                        .exec(txn)
                        .await?;
                    department_employee::Entity::delete_many()
                        .filter(department_employee::Column::DepartmentId.eq(id))
                        .exec(txn)
                        .await?;
                    department::Entity::delete_by_id(id).exec(txn).await?;
                    Ok(())
                })
            })
            .await?;

        Ok(())
    }
}

/// Inserts the department row when the aggregate has no id yet, capturing
/// the generated id; updates the name in place otherwise.
async fn upsert_department<C: ConnectionTrait>(
    conn: &C,
    department: Department,
) -> AppResult<Department> {
    match department.id {
        None => {
            let model = department::ActiveModel {
                name: Set(department.name.clone()),
                ..Default::default()
            }
            .insert(conn)
            .await?;
            Ok(Department {
                id: Some(model.id),
                ..department
            })
        }
        Some(id) => {
            department::ActiveModel {
                id: Set(id),
                name: Set(department.name.clone()),
            }
            .update(conn)
            .await?;
            Ok(department)
        }
    }
}

/// Upserts the manager, if any, writing the identified employee back into
/// the aggregate.
async fn save_manager<C: ConnectionTrait>(
    conn: &C,
    mut department: Department,
) -> AppResult<Department> {
    if let Some(manager) = department.manager.take() {
        department.manager = Some(EmployeeRepository::upsert(conn, manager).await?);
    }
    Ok(department)
}

/// Upserts every member employee in list order, collecting the identified
/// results back in the same order.
async fn save_employees<C: ConnectionTrait>(
    conn: &C,
    mut department: Department,
) -> AppResult<Department> {
    let mut employees = Vec::with_capacity(department.employees.len());
    for employee in std::mem::take(&mut department.employees) {
        employees.push(EmployeeRepository::upsert(conn, employee).await?);
    }
    department.employees = employees;
    Ok(department)
}

/// Makes both junction tables match the aggregate exactly, with
/// delete-then-insert. Deletions are scoped to this department's id; a
/// manager shared with another department keeps that department's link.
async fn rewrite_links<C: ConnectionTrait>(
    conn: &C,
    department_id: i64,
    manager_id: Option<i64>,
    member_ids: &[i64],
) -> Result<(), DbErr> {
    department_manager::Entity::delete_many()
        .filter(department_manager::Column::DepartmentId.eq(department_id))
        .exec(conn)
        .await?;

    if let Some(employee_id) = manager_id {
        department_manager::ActiveModel {
            department_id: Set(department_id),
            employee_id: Set(employee_id),
            ..Default::default()
        }
        .insert(conn)
        .await?;
    }

    department_employee::Entity::delete_many()
        .filter(department_employee::Column::DepartmentId.eq(department_id))
        .exec(conn)
        .await?;

    if !member_ids.is_empty() {
        let links = member_ids
            .iter()
            .map(|&employee_id| department_employee::ActiveModel {
                department_id: Set(department_id),
                employee_id: Set(employee_id),
                ..Default::default()
            });
        department_employee::Entity::insert_many(links).exec(conn).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::employee::Model as EmployeeModel;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};
    use std::collections::BTreeMap;

    fn row(
        d_id: i64,
        d_name: &str,
        manager: Option<(i64, &str)>,
        member: Option<(i64, &str)>,
    ) -> DepartmentRow {
        DepartmentRow {
            d_id,
            d_name: d_name.to_string(),
            m_id: manager.map(|(id, _)| id),
            m_first_name: manager.map(|(_, name)| name.to_string()),
            m_last_name: manager.map(|_| "Smith".to_string()),
            m_position: manager.map(|_| "Manager".to_string()),
            m_is_full_time: manager.map(|_| true),
            e_id: member.map(|(id, _)| id),
            e_first_name: member.map(|(_, name)| name.to_string()),
            e_last_name: member.map(|_| "Smith".to_string()),
            e_position: member.map(|_| "Developer".to_string()),
            e_is_full_time: member.map(|_| true),
        }
    }

    fn string_value(value: Option<&str>) -> Value {
        Value::String(value.map(|v| Box::new(v.to_string())))
    }

    fn mock_row(
        d_id: i64,
        d_name: &str,
        manager: Option<(i64, &str)>,
        member: Option<(i64, &str)>,
    ) -> BTreeMap<&'static str, Value> {
        let mut map = BTreeMap::new();
        map.insert("d_id", Value::BigInt(Some(d_id)));
        map.insert("d_name", string_value(Some(d_name)));
        map.insert("m_id", Value::BigInt(manager.map(|(id, _)| id)));
        map.insert("m_first_name", string_value(manager.map(|(_, name)| name)));
        map.insert("m_last_name", string_value(manager.map(|_| "Smith")));
        map.insert("m_position", string_value(manager.map(|_| "Manager")));
        map.insert("m_is_full_time", Value::Bool(manager.map(|_| true)));
        map.insert("e_id", Value::BigInt(member.map(|(id, _)| id)));
        map.insert("e_first_name", string_value(member.map(|(_, name)| name)));
        map.insert("e_last_name", string_value(member.map(|_| "Smith")));
        map.insert("e_position", string_value(member.map(|_| "Developer")));
        map.insert("e_is_full_time", Value::Bool(member.map(|_| true)));
        map
    }

    fn employee_model(id: i64, first_name: &str) -> EmployeeModel {
        EmployeeModel {
            id,
            first_name: first_name.to_string(),
            last_name: "Smith".to_string(),
            position: "Developer".to_string(),
            is_full_time: true,
        }
    }

    #[test]
    fn test_maps_manager_and_members_from_run() {
        let rows = vec![
            row(10, "Eng", Some((1, "Meg")), Some((2, "Amy"))),
            row(10, "Eng", Some((1, "Meg")), Some((3, "Bob"))),
        ];

        let department = from_rows(&rows).unwrap();

        assert_eq!(department.id, Some(10));
        assert_eq!(department.name, "Eng");
        assert_eq!(department.manager.as_ref().and_then(|m| m.id), Some(1));
        let member_ids: Vec<_> = department.employees.iter().map(|e| e.id).collect();
        assert_eq!(member_ids, vec![Some(2), Some(3)]);
    }

    #[test]
    fn test_maps_bare_department_from_single_null_row() {
        let department = from_rows(&[row(7, "HR", None, None)]).unwrap();

        assert!(department.manager.is_none());
        assert!(department.employees.is_empty());
    }

    #[test]
    fn test_maps_manager_only_run() {
        let department = from_rows(&[row(7, "HR", Some((4, "Meg")), None)]).unwrap();

        assert_eq!(department.manager.as_ref().and_then(|m| m.id), Some(4));
        assert!(department.employees.is_empty());
    }

    #[test]
    fn test_empty_run_is_a_data_integrity_error() {
        assert!(matches!(from_rows(&[]), Err(AppError::DataIntegrity(_))));
    }

    #[tokio::test]
    async fn test_find_all_groups_fanned_out_rows() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![
                mock_row(10, "Eng", Some((1, "Meg")), Some((2, "Amy"))),
                mock_row(10, "Eng", Some((1, "Meg")), Some((3, "Bob"))),
                mock_row(20, "HR", None, None),
            ]])
            .into_connection();
        let repository = DepartmentRepository::new(Arc::new(db));

        let departments = repository.find_all().await.unwrap();

        assert_eq!(departments.len(), 2);
        assert_eq!(departments[0].id, Some(10));
        assert_eq!(departments[0].employees.len(), 2);
        assert_eq!(departments[1].id, Some(20));
        assert!(departments[1].manager.is_none());
        assert!(departments[1].employees.is_empty());
    }

    #[tokio::test]
    async fn test_find_by_id_empty_result_is_none() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![Vec::<BTreeMap<&'static str, Value>>::new()])
            .into_connection();
        let repository = DepartmentRepository::new(Arc::new(db));

        assert_eq!(repository.find_by_id(3).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_save_assigns_ids_through_the_pipeline() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            // department insert
            .append_query_results(vec![vec![department::Model {
                id: 3,
                name: "Accounting".to_string(),
            }]])
            // manager, then both members, in list order
            .append_query_results(vec![
                vec![employee_model(8, "Meg")],
                vec![employee_model(9, "Amy")],
                vec![employee_model(11, "Bob")],
            ])
            // junction deletes
            .append_exec_results(vec![
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                },
            ])
            // manager link insert
            .append_query_results(vec![vec![department_manager::Model {
                id: 1,
                department_id: 3,
                employee_id: 8,
            }]])
            // member link batch insert
            .append_query_results(vec![vec![BTreeMap::from([(
                "id",
                Value::BigInt(Some(2)),
            )])]])
            .into_connection();
        let repository = DepartmentRepository::new(Arc::new(db));

        let unsaved = |first_name: &str| Employee {
            id: None,
            first_name: first_name.to_string(),
            last_name: "Smith".to_string(),
            position: "Developer".to_string(),
            full_time: true,
        };
        let department = Department {
            id: None,
            name: "Accounting".to_string(),
            manager: Some(unsaved("Meg")),
            employees: vec![unsaved("Amy"), unsaved("Bob")],
        };

        let saved = repository.save(department).await.unwrap();

        assert_eq!(saved.id, Some(3));
        assert_eq!(saved.manager.as_ref().and_then(|m| m.id), Some(8));
        let member_ids: Vec<_> = saved.employees.iter().map(|e| e.id).collect();
        assert_eq!(member_ids, vec![Some(9), Some(11)]);
    }

    #[tokio::test]
    async fn test_save_update_rewrites_links_scoped_to_department() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            // department update
            .append_query_results(vec![vec![department::Model {
                id: 7,
                name: "Ops".to_string(),
            }]])
            // junction deletes; no links to insert for an empty aggregate
            .append_exec_results(vec![
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 2,
                },
            ])
            .into_connection();
        let db = Arc::new(db);
        let repository = DepartmentRepository::new(Arc::clone(&db));

        let saved = repository
            .save(Department {
                id: Some(7),
                name: "Ops".to_string(),
                manager: None,
                employees: vec![],
            })
            .await
            .unwrap();

        assert_eq!(saved.id, Some(7));
        assert_eq!(saved.name, "Ops");

        drop(repository);
        let log = format!("{:?}", Arc::try_unwrap(db).unwrap().into_transaction_log());
        // both junction deletes key on department_id alone
        assert!(log.contains("department_managers"));
        assert!(log.contains("department_employees"));
        assert!(!log.contains(" OR "));
    }

    #[tokio::test]
    async fn test_save_replaces_manager_with_a_single_link() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            // department update, then manager update
            .append_query_results(vec![vec![department::Model {
                id: 7,
                name: "Ops".to_string(),
            }]])
            .append_query_results(vec![vec![employee_model(8, "Meg")]])
            // junction deletes
            .append_exec_results(vec![
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                },
            ])
            // new manager link
            .append_query_results(vec![vec![department_manager::Model {
                id: 5,
                department_id: 7,
                employee_id: 8,
            }]])
            .into_connection();
        let db = Arc::new(db);
        let repository = DepartmentRepository::new(Arc::clone(&db));

        let saved = repository
            .save(Department {
                id: Some(7),
                name: "Ops".to_string(),
                manager: Some(Employee {
                    id: Some(8),
                    first_name: "Meg".to_string(),
                    last_name: "Smith".to_string(),
                    position: "Manager".to_string(),
                    full_time: true,
                }),
                employees: vec![],
            })
            .await
            .unwrap();

        assert_eq!(saved.manager.as_ref().and_then(|m| m.id), Some(8));

        drop(repository);
        let log = format!("{:?}", Arc::try_unwrap(db).unwrap().into_transaction_log());
        // old links go first, then exactly one link for the new manager
        assert_eq!(log.matches("INSERT INTO \"department_managers\"").count(), 1);
        let deleted_at = log.find("DELETE FROM \"department_managers\"").unwrap();
        let inserted_at = log.find("INSERT INTO \"department_managers\"").unwrap();
        assert!(deleted_at < inserted_at);
    }

    #[tokio::test]
    async fn test_delete_removes_links_then_department() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results(vec![
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 2,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
            ])
            .into_connection();
        let repository = DepartmentRepository::new(Arc::new(db));

        let department = Department {
            id: Some(7),
            name: "Ops".to_string(),
            manager: None,
            employees: vec![],
        };

        repository.delete(&department).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_requires_an_id() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let repository = DepartmentRepository::new(Arc::new(db));

        let result = repository.delete(&Department::new("Ops")).await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }
}
