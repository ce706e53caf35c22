use std::sync::Arc;

use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{check_in, check_out, location, tool},
    errors::ServiceError,
    events::{Event, EventSender},
    services::audit::{self, AuditAction},
};

#[derive(Clone)]
pub struct LocationService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl LocationService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(
        &self,
        input: CreateLocationInput,
        acting_user: Uuid,
    ) -> Result<location::Model, ServiceError> {
        input.validate()?;

        let txn = self.db.begin().await?;

        let location = location::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name.clone()),
            address: Set(input.address.clone()),
        };
        let location = location.insert(&txn).await?;

        audit::record(
            &txn,
            acting_user,
            AuditAction::LocationCreate,
            None,
            format!("location '{}' created", location.name),
        )
        .await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::LocationCreated(location.id))
            .await;

        info!("Created location: {}", location.id);
        Ok(location)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, location_id: Uuid) -> Result<location::Model, ServiceError> {
        location::Entity::find_by_id(location_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Location", location_id))
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<location::Model>, ServiceError> {
        location::Entity::find()
            .order_by_asc(location::Column::Name)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        location_id: Uuid,
        input: UpdateLocationInput,
        acting_user: Uuid,
    ) -> Result<location::Model, ServiceError> {
        input.validate()?;

        let txn = self.db.begin().await?;

        let location = location::Entity::find_by_id(location_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Location", location_id))?;

        if input.name.is_none() && input.address.is_none() {
            return Ok(location);
        }

        let mut active: location::ActiveModel = location.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(address) = input.address {
            active.address = Set(Some(address));
        }
        let location = active.update(&txn).await?;

        audit::record(
            &txn,
            acting_user,
            AuditAction::LocationUpdate,
            None,
            format!("location '{}' updated", location.name),
        )
        .await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::LocationUpdated(location.id))
            .await;

        info!("Updated location: {}", location.id);
        Ok(location)
    }

    /// Deletes a location. Everything pointing at it keeps existing: the
    /// tool and custody rows just lose the reference.
    #[instrument(skip(self))]
    pub async fn delete(&self, location_id: Uuid, acting_user: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;

        let location = location::Entity::find_by_id(location_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Location", location_id))?;

        tool::Entity::update_many()
            .col_expr(tool::Column::LocationId, Expr::value(None::<Uuid>))
            .filter(tool::Column::LocationId.eq(location_id))
            .exec(&txn)
            .await?;
        check_out::Entity::update_many()
            .col_expr(check_out::Column::LocationId, Expr::value(None::<Uuid>))
            .filter(check_out::Column::LocationId.eq(location_id))
            .exec(&txn)
            .await?;
        check_in::Entity::update_many()
            .col_expr(check_in::Column::LocationId, Expr::value(None::<Uuid>))
            .filter(check_in::Column::LocationId.eq(location_id))
            .exec(&txn)
            .await?;

        location::Entity::delete_by_id(location_id).exec(&txn).await?;

        audit::record(
            &txn,
            acting_user,
            AuditAction::LocationDelete,
            None,
            format!("location '{}' deleted", location.name),
        )
        .await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::LocationDeleted(location_id))
            .await;

        info!("Deleted location: {}", location_id);
        Ok(())
    }
}

/// Input for creating a location
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateLocationInput {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub address: Option<String>,
}

/// Input for updating a location
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateLocationInput {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub address: Option<String>,
}
