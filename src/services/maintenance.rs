use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{
        employee, maintenance_record,
        tool::{self, ToolStatus},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::audit::{self, AuditAction},
};

/// Service history for tools. A record stays open until completed; an open
/// record pins its tool in the `maintenance` state.
#[derive(Clone)]
pub struct MaintenanceService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl MaintenanceService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Opens a maintenance record and moves the tool into `maintenance`.
    /// Only an available tool can enter service: a checked-out tool has to
    /// come back first, and a lost one has to be recovered.
    #[instrument(skip(self, input), fields(tool_id = %input.tool_id))]
    pub async fn start_maintenance(
        &self,
        input: StartMaintenanceInput,
        acting_user: Uuid,
    ) -> Result<maintenance_record::Model, ServiceError> {
        input.validate()?;

        let txn = self.db.begin().await?;

        let tool = tool::Entity::find_by_id(input.tool_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Tool", input.tool_id))?;

        if tool.status != ToolStatus::Available {
            return Err(ServiceError::InvalidTransition(format!(
                "tool {} is {}, it must be available to enter maintenance",
                tool.serial_number, tool.status
            )));
        }

        let record = maintenance_record::ActiveModel {
            id: Set(Uuid::new_v4()),
            tool_id: Set(tool.id),
            description: Set(input.description.clone()),
            scheduled_date: Set(input.scheduled_date),
            completed_date: Set(None),
            performed_by: Set(None),
            cost: Set(None),
            remarks: Set(input.remarks.clone()),
        };
        let record = record.insert(&txn).await?;

        let mut active: tool::ActiveModel = tool.into();
        active.status = Set(ToolStatus::Maintenance);
        active.updated_at = Set(Utc::now());
        let tool = active.update(&txn).await?;

        audit::record(
            &txn,
            acting_user,
            AuditAction::MaintenanceStart,
            Some(tool.id),
            format!("maintenance started: {}", record.description),
        )
        .await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::MaintenanceStarted {
                tool_id: tool.id,
                maintenance_id: record.id,
            })
            .await;

        info!("Maintenance {} started for tool {}", record.id, tool.id);
        Ok(record)
    }

    /// Closes an open maintenance record and returns the tool to
    /// `available`. A record can be completed exactly once.
    #[instrument(skip(self, input), fields(maintenance_id = %input.maintenance_id))]
    pub async fn complete_maintenance(
        &self,
        input: CompleteMaintenanceInput,
        acting_user: Uuid,
    ) -> Result<maintenance_record::Model, ServiceError> {
        input.validate()?;

        let txn = self.db.begin().await?;

        let record = maintenance_record::Entity::find_by_id(input.maintenance_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::not_found("Maintenance record", input.maintenance_id)
            })?;

        if !record.is_open() {
            return Err(ServiceError::InvalidTransition(format!(
                "maintenance record {} is already closed",
                record.id
            )));
        }

        let tool = tool::Entity::find_by_id(record.tool_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Tool", record.tool_id))?;

        if tool.status != ToolStatus::Maintenance {
            return Err(ServiceError::InvalidTransition(format!(
                "tool {} is {}, not in maintenance",
                tool.serial_number, tool.status
            )));
        }

        if let Some(performed_by) = input.performed_by {
            employee::Entity::find_by_id(performed_by)
                .one(&txn)
                .await?
                .ok_or_else(|| ServiceError::not_found("Employee", performed_by))?;
        }

        let mut active: maintenance_record::ActiveModel = record.into();
        active.completed_date = Set(Some(input.completed_date));
        if input.performed_by.is_some() {
            active.performed_by = Set(input.performed_by);
        }
        if input.cost.is_some() {
            active.cost = Set(input.cost);
        }
        if input.remarks.is_some() {
            active.remarks = Set(input.remarks.clone());
        }
        let record = active.update(&txn).await?;

        let mut tool_active: tool::ActiveModel = tool.into();
        tool_active.status = Set(ToolStatus::Available);
        tool_active.updated_at = Set(Utc::now());
        let tool = tool_active.update(&txn).await?;

        audit::record(
            &txn,
            acting_user,
            AuditAction::MaintenanceComplete,
            Some(tool.id),
            format!(
                "maintenance completed on {}: {}",
                input.completed_date, record.description
            ),
        )
        .await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::MaintenanceCompleted {
                tool_id: tool.id,
                maintenance_id: record.id,
            })
            .await;

        info!("Maintenance {} completed for tool {}", record.id, tool.id);
        Ok(record)
    }

    #[instrument(skip(self))]
    pub async fn get(
        &self,
        maintenance_id: Uuid,
    ) -> Result<maintenance_record::Model, ServiceError> {
        maintenance_record::Entity::find_by_id(maintenance_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Maintenance record", maintenance_id))
    }

    /// The open record for a tool, if any. At most one exists because a
    /// tool in maintenance cannot start another round.
    #[instrument(skip(self))]
    pub async fn open_for_tool(
        &self,
        tool_id: Uuid,
    ) -> Result<Option<maintenance_record::Model>, ServiceError> {
        maintenance_record::Entity::find()
            .filter(maintenance_record::Column::ToolId.eq(tool_id))
            .filter(maintenance_record::Column::CompletedDate.is_null())
            .one(&*self.db)
            .await
            .map_err(Into::into)
    }

    /// Full service history for a tool.
    #[instrument(skip(self))]
    pub async fn history_for_tool(
        &self,
        tool_id: Uuid,
    ) -> Result<Vec<maintenance_record::Model>, ServiceError> {
        tool::Entity::find_by_id(tool_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Tool", tool_id))?;

        maintenance_record::Entity::find()
            .filter(maintenance_record::Column::ToolId.eq(tool_id))
            .order_by_asc(maintenance_record::Column::ScheduledDate)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }
}

/// Input for opening a maintenance record
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StartMaintenanceInput {
    pub tool_id: Uuid,
    #[validate(length(min = 1, max = 2000))]
    pub description: String,
    pub scheduled_date: Option<NaiveDate>,
    #[validate(length(max = 2000))]
    pub remarks: Option<String>,
}

/// Input for closing a maintenance record
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CompleteMaintenanceInput {
    pub maintenance_id: Uuid,
    pub completed_date: NaiveDate,
    pub performed_by: Option<Uuid>,
    pub cost: Option<Decimal>,
    #[validate(length(max = 2000))]
    pub remarks: Option<String>,
}
