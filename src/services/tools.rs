use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{
        attachment, category, location,
        tool::{self, ToolStatus},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::audit::{self, AuditAction},
    services::categories::delete_tool_dependents,
};

const DEFAULT_LIMIT: u64 = 20;
const MAX_LIMIT: u64 = 100;

/// Catalog CRUD for tools plus the two lifecycle edges that do not go
/// through a custody or maintenance record: report_lost and recover.
#[derive(Clone)]
pub struct ToolService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl ToolService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, input), fields(serial_number = %input.serial_number))]
    pub async fn create(
        &self,
        input: CreateToolInput,
        acting_user: Uuid,
    ) -> Result<tool::Model, ServiceError> {
        input.validate()?;

        let txn = self.db.begin().await?;

        category::Entity::find_by_id(input.category_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Category", input.category_id))?;

        if let Some(location_id) = input.location_id {
            location::Entity::find_by_id(location_id)
                .one(&txn)
                .await?
                .ok_or_else(|| ServiceError::not_found("Location", location_id))?;
        }

        ensure_unique_serial(&txn, &input.serial_number, None).await?;

        let now = Utc::now();
        let tool = tool::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name.clone()),
            serial_number: Set(input.serial_number.clone()),
            category_id: Set(input.category_id),
            location_id: Set(input.location_id),
            description: Set(input.description.clone()),
            status: Set(ToolStatus::Available),
            purchase_date: Set(input.purchase_date),
            value: Set(input.value),
            image_path: Set(input.image_path.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let tool = tool.insert(&txn).await?;

        audit::record(
            &txn,
            acting_user,
            AuditAction::ToolCreate,
            Some(tool.id),
            format!("tool '{}' ({}) created", tool.name, tool.serial_number),
        )
        .await?;

        txn.commit().await?;

        self.event_sender.send_or_log(Event::ToolCreated(tool.id)).await;

        info!("Created tool: {}", tool.id);
        Ok(tool)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, tool_id: Uuid) -> Result<tool::Model, ServiceError> {
        tool::Entity::find_by_id(tool_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Tool", tool_id))
    }

    #[instrument(skip(self))]
    pub async fn get_by_serial(&self, serial_number: &str) -> Result<tool::Model, ServiceError> {
        tool::Entity::find()
            .filter(tool::Column::SerialNumber.eq(serial_number))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Tool with serial {} not found", serial_number))
            })
    }

    /// Filtered, paginated catalog listing.
    #[instrument(skip(self))]
    pub async fn list(&self, query: ToolListQuery) -> Result<ToolPage, ServiceError> {
        let mut db_query = tool::Entity::find();

        if let Some(status) = query.status {
            db_query = db_query.filter(tool::Column::Status.eq(status));
        }
        if let Some(category_id) = query.category_id {
            db_query = db_query.filter(tool::Column::CategoryId.eq(category_id));
        }
        if let Some(ref search) = query.search {
            let pattern = format!("%{}%", search);
            db_query = db_query.filter(
                tool::Column::Name
                    .like(&pattern)
                    .or(tool::Column::SerialNumber.like(&pattern)),
            );
        }

        let total = db_query.clone().count(&*self.db).await?;

        let limit = query.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
        let offset = query.offset.unwrap_or(0);

        let tools = db_query
            .order_by_asc(tool::Column::Name)
            .limit(limit)
            .offset(offset)
            .all(&*self.db)
            .await?;

        Ok(ToolPage { tools, total })
    }

    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        tool_id: Uuid,
        input: UpdateToolInput,
        acting_user: Uuid,
    ) -> Result<tool::Model, ServiceError> {
        input.validate()?;

        let txn = self.db.begin().await?;

        let tool = tool::Entity::find_by_id(tool_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Tool", tool_id))?;

        if let Some(ref serial) = input.serial_number {
            ensure_unique_serial(&txn, serial, Some(tool_id)).await?;
        }
        if let Some(category_id) = input.category_id {
            category::Entity::find_by_id(category_id)
                .one(&txn)
                .await?
                .ok_or_else(|| ServiceError::not_found("Category", category_id))?;
        }
        if let Some(location_id) = input.location_id {
            location::Entity::find_by_id(location_id)
                .one(&txn)
                .await?
                .ok_or_else(|| ServiceError::not_found("Location", location_id))?;
        }

        let mut active: tool::ActiveModel = tool.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(serial) = input.serial_number {
            active.serial_number = Set(serial);
        }
        if let Some(category_id) = input.category_id {
            active.category_id = Set(category_id);
        }
        if let Some(location_id) = input.location_id {
            active.location_id = Set(Some(location_id));
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description));
        }
        if let Some(purchase_date) = input.purchase_date {
            active.purchase_date = Set(Some(purchase_date));
        }
        if let Some(value) = input.value {
            active.value = Set(Some(value));
        }
        if let Some(image_path) = input.image_path {
            active.image_path = Set(Some(image_path));
        }
        active.updated_at = Set(Utc::now());

        let tool = active.update(&txn).await?;

        audit::record(
            &txn,
            acting_user,
            AuditAction::ToolUpdate,
            Some(tool.id),
            format!("tool '{}' ({}) updated", tool.name, tool.serial_number),
        )
        .await?;

        txn.commit().await?;

        self.event_sender.send_or_log(Event::ToolUpdated(tool.id)).await;

        info!("Updated tool: {}", tool.id);
        Ok(tool)
    }

    /// Deletes a tool and its attachments, maintenance and custody history.
    /// Refused while the tool is checked out; its audit entries survive with
    /// the tool reference cleared.
    #[instrument(skip(self))]
    pub async fn delete(&self, tool_id: Uuid, acting_user: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;

        let tool = tool::Entity::find_by_id(tool_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Tool", tool_id))?;

        if tool.status == ToolStatus::CheckedOut {
            return Err(ServiceError::ReferentialIntegrity(format!(
                "tool {} is currently checked out",
                tool.serial_number
            )));
        }

        delete_tool_dependents(&txn, &[tool_id]).await?;
        tool::Entity::delete_by_id(tool_id).exec(&txn).await?;

        audit::record(
            &txn,
            acting_user,
            AuditAction::ToolDelete,
            None,
            format!("tool '{}' ({}) deleted", tool.name, tool.serial_number),
        )
        .await?;

        txn.commit().await?;

        self.event_sender.send_or_log(Event::ToolDeleted(tool_id)).await;

        info!("Deleted tool: {}", tool_id);
        Ok(())
    }

    /// Marks a tool lost. Legal from any state: a checked-out or in-service
    /// tool can vanish too, and the custody trail already explains who had it.
    #[instrument(skip(self))]
    pub async fn report_lost(
        &self,
        tool_id: Uuid,
        acting_user: Uuid,
        remarks: Option<String>,
    ) -> Result<tool::Model, ServiceError> {
        let txn = self.db.begin().await?;

        let tool = tool::Entity::find_by_id(tool_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Tool", tool_id))?;

        let previous = tool.status;
        let mut active: tool::ActiveModel = tool.into();
        active.status = Set(ToolStatus::Lost);
        active.updated_at = Set(Utc::now());
        let tool = active.update(&txn).await?;

        let details = match remarks {
            Some(ref r) if !r.is_empty() => {
                format!("reported lost (was {}): {}", previous, r)
            }
            _ => format!("reported lost (was {})", previous),
        };
        audit::record(
            &txn,
            acting_user,
            AuditAction::ReportLost,
            Some(tool.id),
            details,
        )
        .await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::ToolReportedLost(tool.id))
            .await;

        warn!("Tool {} reported lost", tool.id);
        Ok(tool)
    }

    /// Returns a lost tool to circulation.
    #[instrument(skip(self))]
    pub async fn recover(
        &self,
        tool_id: Uuid,
        acting_user: Uuid,
    ) -> Result<tool::Model, ServiceError> {
        let txn = self.db.begin().await?;

        let tool = tool::Entity::find_by_id(tool_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Tool", tool_id))?;

        if tool.status != ToolStatus::Lost {
            return Err(ServiceError::InvalidTransition(format!(
                "tool {} is {}, only lost tools can be recovered",
                tool.serial_number, tool.status
            )));
        }

        let mut active: tool::ActiveModel = tool.into();
        active.status = Set(ToolStatus::Available);
        active.updated_at = Set(Utc::now());
        let tool = active.update(&txn).await?;

        audit::record(
            &txn,
            acting_user,
            AuditAction::Recover,
            Some(tool.id),
            "recovered from lost",
        )
        .await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::ToolRecovered(tool.id))
            .await;

        info!("Tool {} recovered", tool.id);
        Ok(tool)
    }

    #[instrument(skip(self, input))]
    pub async fn add_attachment(
        &self,
        tool_id: Uuid,
        input: AddAttachmentInput,
        acting_user: Uuid,
    ) -> Result<attachment::Model, ServiceError> {
        input.validate()?;

        let txn = self.db.begin().await?;

        tool::Entity::find_by_id(tool_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Tool", tool_id))?;

        let attachment = attachment::ActiveModel {
            id: Set(Uuid::new_v4()),
            tool_id: Set(tool_id),
            file_path: Set(input.file_path.clone()),
            description: Set(input.description.clone()),
            uploaded_at: Set(Utc::now()),
        };
        let attachment = attachment.insert(&txn).await?;

        audit::record(
            &txn,
            acting_user,
            AuditAction::AttachmentAdd,
            Some(tool_id),
            format!("attachment '{}' added", attachment.file_path),
        )
        .await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::AttachmentAdded {
                tool_id,
                attachment_id: attachment.id,
            })
            .await;

        Ok(attachment)
    }

    #[instrument(skip(self))]
    pub async fn list_attachments(
        &self,
        tool_id: Uuid,
    ) -> Result<Vec<attachment::Model>, ServiceError> {
        attachment::Entity::find()
            .filter(attachment::Column::ToolId.eq(tool_id))
            .order_by_asc(attachment::Column::UploadedAt)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn remove_attachment(
        &self,
        attachment_id: Uuid,
        acting_user: Uuid,
    ) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;

        let attachment = attachment::Entity::find_by_id(attachment_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Attachment", attachment_id))?;

        attachment::Entity::delete_by_id(attachment_id)
            .exec(&txn)
            .await?;

        audit::record(
            &txn,
            acting_user,
            AuditAction::AttachmentRemove,
            Some(attachment.tool_id),
            format!("attachment '{}' removed", attachment.file_path),
        )
        .await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::AttachmentRemoved {
                tool_id: attachment.tool_id,
                attachment_id,
            })
            .await;

        Ok(())
    }
}

async fn ensure_unique_serial<C: ConnectionTrait>(
    conn: &C,
    serial_number: &str,
    exclude_id: Option<Uuid>,
) -> Result<(), ServiceError> {
    let mut query = tool::Entity::find().filter(tool::Column::SerialNumber.eq(serial_number));
    if let Some(id) = exclude_id {
        query = query.filter(tool::Column::Id.ne(id));
    }

    if query.one(conn).await?.is_some() {
        return Err(ServiceError::UniquenessViolation(format!(
            "serial number {} already in use",
            serial_number
        )));
    }

    Ok(())
}

/// Input for registering a tool
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateToolInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    pub serial_number: String,
    pub category_id: Uuid,
    pub location_id: Option<Uuid>,
    pub description: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub value: Option<Decimal>,
    pub image_path: Option<String>,
}

/// Input for updating a tool. Status is deliberately absent: it only moves
/// through the lifecycle operations.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateToolInput {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub serial_number: Option<String>,
    pub category_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub description: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub value: Option<Decimal>,
    pub image_path: Option<String>,
}

/// Input for attaching a file reference to a tool
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AddAttachmentInput {
    #[validate(length(min = 1, max = 500))]
    pub file_path: String,
    #[validate(length(max = 255))]
    pub description: Option<String>,
}

/// Catalog listing filters
#[derive(Debug, Clone, Default)]
pub struct ToolListQuery {
    pub status: Option<ToolStatus>,
    pub category_id: Option<Uuid>,
    pub search: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct ToolPage {
    pub tools: Vec<tool::Model>,
    pub total: u64,
}
