use std::sync::Arc;

use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{
        check_in, check_out,
        employee::{self, EmployeeRole},
        maintenance_record,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::audit::{self, AuditAction},
};

/// Employees mirror records in the external identity system one-to-one;
/// `user_id` is that system's identifier and is unique here.
#[derive(Clone)]
pub struct EmployeeService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl EmployeeService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, input), fields(full_name = %input.full_name))]
    pub async fn create(
        &self,
        input: CreateEmployeeInput,
        acting_user: Uuid,
    ) -> Result<employee::Model, ServiceError> {
        input.validate()?;

        let txn = self.db.begin().await?;

        ensure_unique_user_id(&txn, input.user_id).await?;

        let employee = employee::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(input.user_id),
            full_name: Set(input.full_name.clone()),
            role: Set(input.role),
            phone: Set(input.phone.clone()),
            department: Set(input.department.clone()),
        };
        let employee = employee.insert(&txn).await?;

        audit::record(
            &txn,
            acting_user,
            AuditAction::EmployeeCreate,
            None,
            format!("employee '{}' created", employee.full_name),
        )
        .await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::EmployeeCreated(employee.id))
            .await;

        info!("Created employee: {}", employee.id);
        Ok(employee)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, employee_id: Uuid) -> Result<employee::Model, ServiceError> {
        employee::Entity::find_by_id(employee_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Employee", employee_id))
    }

    /// Looks an employee up by their identity-system id.
    #[instrument(skip(self))]
    pub async fn get_by_user(&self, user_id: Uuid) -> Result<employee::Model, ServiceError> {
        employee::Entity::find()
            .filter(employee::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Employee for user {} not found", user_id))
            })
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<employee::Model>, ServiceError> {
        employee::Entity::find()
            .order_by_asc(employee::Column::FullName)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        employee_id: Uuid,
        input: UpdateEmployeeInput,
        acting_user: Uuid,
    ) -> Result<employee::Model, ServiceError> {
        input.validate()?;

        let txn = self.db.begin().await?;

        let employee = employee::Entity::find_by_id(employee_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Employee", employee_id))?;

        if input.full_name.is_none()
            && input.role.is_none()
            && input.phone.is_none()
            && input.department.is_none()
        {
            return Ok(employee);
        }

        let mut active: employee::ActiveModel = employee.into();
        if let Some(full_name) = input.full_name {
            active.full_name = Set(full_name);
        }
        if let Some(role) = input.role {
            active.role = Set(role);
        }
        if let Some(phone) = input.phone {
            active.phone = Set(Some(phone));
        }
        if let Some(department) = input.department {
            active.department = Set(Some(department));
        }
        let employee = active.update(&txn).await?;

        audit::record(
            &txn,
            acting_user,
            AuditAction::EmployeeUpdate,
            None,
            format!("employee '{}' updated", employee.full_name),
        )
        .await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::EmployeeUpdated(employee.id))
            .await;

        info!("Updated employee: {}", employee.id);
        Ok(employee)
    }

    /// Deletes an employee along with their custody history. Tools they
    /// touched are untouched; maintenance they performed keeps the record
    /// with the performer reference cleared.
    #[instrument(skip(self))]
    pub async fn delete(&self, employee_id: Uuid, acting_user: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;

        let employee = employee::Entity::find_by_id(employee_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Employee", employee_id))?;

        check_out::Entity::delete_many()
            .filter(check_out::Column::EmployeeId.eq(employee_id))
            .exec(&txn)
            .await?;
        check_in::Entity::delete_many()
            .filter(check_in::Column::EmployeeId.eq(employee_id))
            .exec(&txn)
            .await?;
        maintenance_record::Entity::update_many()
            .col_expr(
                maintenance_record::Column::PerformedBy,
                Expr::value(None::<Uuid>),
            )
            .filter(maintenance_record::Column::PerformedBy.eq(employee_id))
            .exec(&txn)
            .await?;

        employee::Entity::delete_by_id(employee_id).exec(&txn).await?;

        audit::record(
            &txn,
            acting_user,
            AuditAction::EmployeeDelete,
            None,
            format!("employee '{}' deleted", employee.full_name),
        )
        .await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::EmployeeDeleted(employee_id))
            .await;

        info!("Deleted employee: {}", employee_id);
        Ok(())
    }
}

async fn ensure_unique_user_id<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
) -> Result<(), ServiceError> {
    if employee::Entity::find()
        .filter(employee::Column::UserId.eq(user_id))
        .one(conn)
        .await?
        .is_some()
    {
        return Err(ServiceError::UniquenessViolation(format!(
            "employee already exists for user {}",
            user_id
        )));
    }

    Ok(())
}

/// Input for creating an employee
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateEmployeeInput {
    pub user_id: Uuid,
    #[validate(length(min = 1, max = 150))]
    pub full_name: String,
    pub role: EmployeeRole,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    #[validate(length(max = 100))]
    pub department: Option<String>,
}

/// Input for updating an employee
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateEmployeeInput {
    #[validate(length(min = 1, max = 150))]
    pub full_name: Option<String>,
    pub role: Option<EmployeeRole>,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    #[validate(length(max = 100))]
    pub department: Option<String>,
}
