use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
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
        check_in, check_out, employee, location,
        tool::{self, ToolStatus},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::audit::{self, AuditAction},
};

/// Custody side of the ledger: the check_out/check_in transitions and the
/// append-only event rows that explain them. The status guard, the custody
/// row and the audit entry all commit in one transaction, so a concurrent
/// second check-out re-reads `checked_out` and fails.
#[derive(Clone)]
pub struct CheckoutService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl CheckoutService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Records a tool going out to an employee. Requires the tool to be
    /// available.
    #[instrument(skip(self, input), fields(tool_id = %input.tool_id, employee_id = %input.employee_id))]
    pub async fn check_out(
        &self,
        input: CheckOutInput,
        acting_user: Uuid,
    ) -> Result<tool::Model, ServiceError> {
        input.validate()?;

        let txn = self.db.begin().await?;

        let tool = tool::Entity::find_by_id(input.tool_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Tool", input.tool_id))?;

        let employee = employee::Entity::find_by_id(input.employee_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Employee", input.employee_id))?;

        if let Some(location_id) = input.location_id {
            location::Entity::find_by_id(location_id)
                .one(&txn)
                .await?
                .ok_or_else(|| ServiceError::not_found("Location", location_id))?;
        }

        if tool.status != ToolStatus::Available {
            return Err(ServiceError::InvalidTransition(format!(
                "tool {} is {}, it must be available to check out",
                tool.serial_number, tool.status
            )));
        }

        let now = Utc::now();
        let event_row = check_out::ActiveModel {
            id: Set(Uuid::new_v4()),
            tool_id: Set(tool.id),
            employee_id: Set(employee.id),
            location_id: Set(input.location_id),
            checked_out_at: Set(now),
            due_date: Set(input.due_date),
            remarks: Set(input.remarks.clone()),
        };
        event_row.insert(&txn).await?;

        let mut active: tool::ActiveModel = tool.into();
        active.status = Set(ToolStatus::CheckedOut);
        if input.location_id.is_some() {
            active.location_id = Set(input.location_id);
        }
        active.updated_at = Set(now);
        let tool = active.update(&txn).await?;

        let details = match input.due_date {
            Some(due) => format!("checked out to '{}', due {}", employee.full_name, due),
            None => format!("checked out to '{}'", employee.full_name),
        };
        audit::record(&txn, acting_user, AuditAction::CheckOut, Some(tool.id), details).await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::ToolCheckedOut {
                tool_id: tool.id,
                employee_id: employee.id,
                due_date: input.due_date,
            })
            .await;

        info!("Tool {} checked out to employee {}", tool.id, employee.id);
        Ok(tool)
    }

    /// Records a tool returning to the crib. Requires the tool to be
    /// checked out.
    #[instrument(skip(self, input), fields(tool_id = %input.tool_id, employee_id = %input.employee_id))]
    pub async fn check_in(
        &self,
        input: CheckInInput,
        acting_user: Uuid,
    ) -> Result<tool::Model, ServiceError> {
        input.validate()?;

        let txn = self.db.begin().await?;

        let tool = tool::Entity::find_by_id(input.tool_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Tool", input.tool_id))?;

        let employee = employee::Entity::find_by_id(input.employee_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Employee", input.employee_id))?;

        if let Some(location_id) = input.location_id {
            location::Entity::find_by_id(location_id)
                .one(&txn)
                .await?
                .ok_or_else(|| ServiceError::not_found("Location", location_id))?;
        }

        if tool.status != ToolStatus::CheckedOut {
            return Err(ServiceError::InvalidTransition(format!(
                "tool {} is {}, only a checked-out tool can be checked in",
                tool.serial_number, tool.status
            )));
        }

        let now = Utc::now();
        let event_row = check_in::ActiveModel {
            id: Set(Uuid::new_v4()),
            tool_id: Set(tool.id),
            employee_id: Set(employee.id),
            location_id: Set(input.location_id),
            checked_in_at: Set(now),
            remarks: Set(input.remarks.clone()),
        };
        event_row.insert(&txn).await?;

        let mut active: tool::ActiveModel = tool.into();
        active.status = Set(ToolStatus::Available);
        if input.location_id.is_some() {
            active.location_id = Set(input.location_id);
        }
        active.updated_at = Set(now);
        let tool = active.update(&txn).await?;

        audit::record(
            &txn,
            acting_user,
            AuditAction::CheckIn,
            Some(tool.id),
            format!("checked in by '{}'", employee.full_name),
        )
        .await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::ToolCheckedIn {
                tool_id: tool.id,
                employee_id: employee.id,
            })
            .await;

        info!("Tool {} checked in by employee {}", tool.id, employee.id);
        Ok(tool)
    }

    /// Chronological custody trail for one tool.
    #[instrument(skip(self))]
    pub async fn history_for_tool(
        &self,
        tool_id: Uuid,
    ) -> Result<Vec<CustodyEvent>, ServiceError> {
        tool::Entity::find_by_id(tool_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Tool", tool_id))?;

        let outs = check_out::Entity::find()
            .filter(check_out::Column::ToolId.eq(tool_id))
            .all(&*self.db)
            .await?;
        let ins = check_in::Entity::find()
            .filter(check_in::Column::ToolId.eq(tool_id))
            .all(&*self.db)
            .await?;

        Ok(merge_custody(outs, ins))
    }

    /// Chronological custody trail for one employee.
    #[instrument(skip(self))]
    pub async fn history_for_employee(
        &self,
        employee_id: Uuid,
    ) -> Result<Vec<CustodyEvent>, ServiceError> {
        employee::Entity::find_by_id(employee_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Employee", employee_id))?;

        let outs = check_out::Entity::find()
            .filter(check_out::Column::EmployeeId.eq(employee_id))
            .all(&*self.db)
            .await?;
        let ins = check_in::Entity::find()
            .filter(check_in::Column::EmployeeId.eq(employee_id))
            .all(&*self.db)
            .await?;

        Ok(merge_custody(outs, ins))
    }

    /// Tools still checked out whose most recent check-out carried a due
    /// date earlier than `as_of`.
    #[instrument(skip(self))]
    pub async fn overdue(&self, as_of: NaiveDate) -> Result<Vec<OverdueCheckOut>, ServiceError> {
        let tools = tool::Entity::find()
            .filter(tool::Column::Status.eq(ToolStatus::CheckedOut))
            .all(&*self.db)
            .await?;

        if tools.is_empty() {
            return Ok(Vec::new());
        }

        let tool_ids: Vec<Uuid> = tools.iter().map(|t| t.id).collect();
        let outs = check_out::Entity::find()
            .filter(check_out::Column::ToolId.is_in(tool_ids))
            .order_by_desc(check_out::Column::CheckedOutAt)
            .all(&*self.db)
            .await?;

        // First row per tool is the open check-out thanks to the ordering.
        let mut latest: HashMap<Uuid, check_out::Model> = HashMap::new();
        for out in outs {
            latest.entry(out.tool_id).or_insert(out);
        }

        let mut overdue: Vec<OverdueCheckOut> = tools
            .into_iter()
            .filter_map(|tool| {
                let out = latest.remove(&tool.id)?;
                match out.due_date {
                    Some(due) if due < as_of => Some(OverdueCheckOut {
                        tool,
                        check_out: out,
                    }),
                    _ => None,
                }
            })
            .collect();

        overdue.sort_by_key(|o| o.check_out.due_date);
        Ok(overdue)
    }
}

fn merge_custody(outs: Vec<check_out::Model>, ins: Vec<check_in::Model>) -> Vec<CustodyEvent> {
    let mut events: Vec<CustodyEvent> = outs
        .into_iter()
        .map(CustodyEvent::from)
        .chain(ins.into_iter().map(CustodyEvent::from))
        .collect();

    // Check-outs sort before check-ins at equal timestamps.
    events.sort_by(|a, b| {
        a.occurred_at
            .cmp(&b.occurred_at)
            .then_with(|| (a.kind == CustodyKind::CheckIn).cmp(&(b.kind == CustodyKind::CheckIn)))
    });
    events
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustodyKind {
    CheckOut,
    CheckIn,
}

/// One entry in a merged custody trail, either direction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustodyEvent {
    pub id: Uuid,
    pub kind: CustodyKind,
    pub tool_id: Uuid,
    pub employee_id: Uuid,
    pub location_id: Option<Uuid>,
    pub occurred_at: DateTime<Utc>,
    pub due_date: Option<NaiveDate>,
    pub remarks: Option<String>,
}

impl From<check_out::Model> for CustodyEvent {
    fn from(m: check_out::Model) -> Self {
        Self {
            id: m.id,
            kind: CustodyKind::CheckOut,
            tool_id: m.tool_id,
            employee_id: m.employee_id,
            location_id: m.location_id,
            occurred_at: m.checked_out_at,
            due_date: m.due_date,
            remarks: m.remarks,
        }
    }
}

impl From<check_in::Model> for CustodyEvent {
    fn from(m: check_in::Model) -> Self {
        Self {
            id: m.id,
            kind: CustodyKind::CheckIn,
            tool_id: m.tool_id,
            employee_id: m.employee_id,
            location_id: m.location_id,
            occurred_at: m.checked_in_at,
            due_date: None,
            remarks: m.remarks,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OverdueCheckOut {
    pub tool: tool::Model,
    pub check_out: check_out::Model,
}

/// Input for checking a tool out
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CheckOutInput {
    pub tool_id: Uuid,
    pub employee_id: Uuid,
    pub location_id: Option<Uuid>,
    pub due_date: Option<NaiveDate>,
    #[validate(length(max = 2000))]
    pub remarks: Option<String>,
}

/// Input for checking a tool back in
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CheckInInput {
    pub tool_id: Uuid,
    pub employee_id: Uuid,
    pub location_id: Option<Uuid>,
    #[validate(length(max = 2000))]
    pub remarks: Option<String>,
}
