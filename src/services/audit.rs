use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use strum::Display;
use uuid::Uuid;

use crate::{
    entities::audit_log::{self, Entity as AuditLogEntity},
    errors::ServiceError,
};

const DEFAULT_LIMIT: u64 = 20;
const MAX_LIMIT: u64 = 100;

/// Closed set of audit labels. Serialized snake_case into the `action`
/// column so the trail never depends on free-form strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum AuditAction {
    CheckOut,
    CheckIn,
    MaintenanceStart,
    MaintenanceComplete,
    ReportLost,
    Recover,
    ToolCreate,
    ToolUpdate,
    ToolDelete,
    CategoryCreate,
    CategoryUpdate,
    CategoryDelete,
    LocationCreate,
    LocationUpdate,
    LocationDelete,
    EmployeeCreate,
    EmployeeUpdate,
    EmployeeDelete,
    AttachmentAdd,
    AttachmentRemove,
}

/// Appends one audit row on the caller's connection. Every mutating
/// service passes its open transaction here so the trail commits or rolls
/// back together with the change it describes.
pub async fn record<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    action: AuditAction,
    tool_id: Option<Uuid>,
    details: impl Into<String>,
) -> Result<audit_log::Model, ServiceError> {
    let details = details.into();
    let entry = audit_log::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        action: Set(action.to_string()),
        tool_id: Set(tool_id),
        timestamp: Set(Utc::now()),
        details: Set(Some(details).filter(|d| !d.is_empty())),
    };

    entry.insert(conn).await.map_err(ServiceError::from)
}

#[derive(Debug, Clone)]
pub struct AuditPage {
    pub entries: Vec<audit_log::Model>,
    pub total: u64,
}

/// Read side of the audit trail.
#[derive(Clone)]
pub struct AuditLogService {
    db: Arc<DatabaseConnection>,
}

impl AuditLogService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// All audit entries still referencing the given tool, newest first.
    pub async fn for_tool(&self, tool_id: Uuid) -> Result<Vec<audit_log::Model>, ServiceError> {
        AuditLogEntity::find()
            .filter(audit_log::Column::ToolId.eq(tool_id))
            .order_by_desc(audit_log::Column::Timestamp)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    /// All audit entries recorded for the given acting identity, newest first.
    pub async fn for_user(&self, user_id: Uuid) -> Result<Vec<audit_log::Model>, ServiceError> {
        AuditLogEntity::find()
            .filter(audit_log::Column::UserId.eq(user_id))
            .order_by_desc(audit_log::Column::Timestamp)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    /// Paginated view over the whole trail, newest first.
    pub async fn recent(
        &self,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> Result<AuditPage, ServiceError> {
        let total = AuditLogEntity::find().count(&*self.db).await?;

        let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
        let offset = offset.unwrap_or(0);

        let entries = AuditLogEntity::find()
            .order_by_desc(audit_log::Column::Timestamp)
            .limit(limit)
            .offset(offset)
            .all(&*self.db)
            .await?;

        Ok(AuditPage { entries, total })
    }
}
