//! DepartmentManager entity - manager link table
//!
//! Table: department_managers. At most one row per department.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "department_managers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub department_id: i64,

    pub employee_id: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
