//! Employee entity
//!
//! Table: employees

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "employees")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    #[sea_orm(column_type = "String(Some(64))")]
    pub first_name: String,

    #[sea_orm(column_type = "String(Some(64))")]
    pub last_name: String,

    /// Position title, e.g. "Developer"
    #[sea_orm(column_type = "String(Some(64))")]
    pub position: String,

    pub is_full_time: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

// Department membership goes through the junction tables and is resolved
// by manual queries.

impl ActiveModelBehavior for ActiveModel {}

/// Employee as carried in aggregates and API payloads.
///
/// The id is absent until the record is first persisted; from then on it
/// is the employee's identity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    #[serde(default)]
    pub id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub position: String,
    pub full_time: bool,
}

impl From<Model> for Employee {
    fn from(model: Model) -> Self {
        Self {
            id: Some(model.id),
            first_name: model.first_name,
            last_name: model.last_name,
            position: model.position,
            full_time: model.is_full_time,
        }
    }
}
