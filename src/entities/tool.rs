use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of a tracked tool. Every transition goes through the
/// ledger services so that a custody or maintenance record and an audit
/// entry are written in the same transaction as the status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "tool_status")]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
    #[sea_orm(string_value = "available")]
    Available,
    #[sea_orm(string_value = "checked_out")]
    CheckedOut,
    #[sea_orm(string_value = "maintenance")]
    Maintenance,
    #[sea_orm(string_value = "lost")]
    Lost,
}

impl std::fmt::Display for ToolStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ToolStatus::Available => "available",
            ToolStatus::CheckedOut => "checked_out",
            ToolStatus::Maintenance => "maintenance",
            ToolStatus::Lost => "lost",
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tools")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub serial_number: String,
    pub category_id: Uuid,
    pub location_id: Option<Uuid>,
    pub description: Option<String>,
    pub status: ToolStatus,
    pub purchase_date: Option<NaiveDate>,
    pub value: Option<Decimal>,
    /// Opaque blob-storage reference; never dereferenced by the ledger.
    pub image_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Category,
    #[sea_orm(
        belongs_to = "super::location::Entity",
        from = "Column::LocationId",
        to = "super::location::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    Location,
    #[sea_orm(has_many = "super::check_out::Entity")]
    CheckOuts,
    #[sea_orm(has_many = "super::check_in::Entity")]
    CheckIns,
    #[sea_orm(has_many = "super::maintenance_record::Entity")]
    MaintenanceRecords,
    #[sea_orm(has_many = "super::attachment::Entity")]
    Attachments,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::location::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Location.def()
    }
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

impl Related<super::maintenance_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MaintenanceRecords.def()
    }
}

impl Related<super::attachment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attachments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
