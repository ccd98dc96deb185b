//! Department entity
//!
//! Table: departments

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::employee::Employee;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "departments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Department name, unique across departments (enforced by lookup
    /// before create, not by a database constraint)
    #[sea_orm(column_type = "String(Some(64))")]
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

// Manager and member relationships go through the junction tables and are
// resolved by manual queries.

impl ActiveModelBehavior for ActiveModel {}

/// Department aggregate: the department row together with its optional
/// manager and its ordered member list, treated as one unit for
/// persistence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub manager: Option<Employee>,
    #[serde(default)]
    pub employees: Vec<Employee>,
}

impl Department {
    /// A new, not yet persisted department with no manager and no members.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            manager: None,
            employees: Vec::new(),
        }
    }
}
