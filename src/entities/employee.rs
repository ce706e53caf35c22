use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "employee_role")]
#[serde(rename_all = "snake_case")]
pub enum EmployeeRole {
    #[sea_orm(string_value = "admin")]
    Admin,
    #[sea_orm(string_value = "technician")]
    Technician,
    #[sea_orm(string_value = "viewer")]
    Viewer,
}

/// A system user authorized to handle tools. `user_id` is the identity
/// record in the external auth system; the link is one-to-one and an
/// employee cannot exist without it.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "employees")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub user_id: Uuid,
    pub full_name: String,
    pub role: EmployeeRole,
    pub phone: Option<String>,
    pub department: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::check_out::Entity")]
    CheckOuts,
    #[sea_orm(has_many = "super::check_in::Entity")]
    CheckIns,
}

impl Related<super::check_out::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CheckOuts.def()
    }
}

impl Related<super::check_in::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CheckIns.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
