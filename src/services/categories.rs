use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{
        attachment, category, check_in, check_out, maintenance_record,
        tool::{self, ToolStatus},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::audit::{self, AuditAction},
};

/// Categories own their tools outright: deleting one is destructive and
/// takes the whole subtree of tools and their history with it.
#[derive(Clone)]
pub struct CategoryService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl CategoryService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(
        &self,
        input: CreateCategoryInput,
        acting_user: Uuid,
    ) -> Result<category::Model, ServiceError> {
        input.validate()?;

        let txn = self.db.begin().await?;

        ensure_unique_name(&txn, &input.name, None).await?;

        let category = category::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name.clone()),
            description: Set(input.description.clone()),
        };
        let category = category.insert(&txn).await?;

        audit::record(
            &txn,
            acting_user,
            AuditAction::CategoryCreate,
            None,
            format!("category '{}' created", category.name),
        )
        .await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CategoryCreated(category.id))
            .await;

        info!("Created category: {}", category.id);
        Ok(category)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, category_id: Uuid) -> Result<category::Model, ServiceError> {
        category::Entity::find_by_id(category_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Category", category_id))
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<category::Model>, ServiceError> {
        category::Entity::find()
            .order_by_asc(category::Column::Name)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        category_id: Uuid,
        input: UpdateCategoryInput,
        acting_user: Uuid,
    ) -> Result<category::Model, ServiceError> {
        input.validate()?;

        let txn = self.db.begin().await?;

        let category = category::Entity::find_by_id(category_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Category", category_id))?;

        if input.name.is_none() && input.description.is_none() {
            return Ok(category);
        }

        if let Some(ref name) = input.name {
            ensure_unique_name(&txn, name, Some(category_id)).await?;
        }

        let mut active: category::ActiveModel = category.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description));
        }
        let category = active.update(&txn).await?;

        audit::record(
            &txn,
            acting_user,
            AuditAction::CategoryUpdate,
            None,
            format!("category '{}' updated", category.name),
        )
        .await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CategoryUpdated(category.id))
            .await;

        info!("Updated category: {}", category.id);
        Ok(category)
    }

    /// Deletes a category and every tool it owns, including the tools'
    /// attachments, maintenance history, and custody events. Refused while
    /// any owned tool is checked out, since that would erase live custody.
    #[instrument(skip(self))]
    pub async fn delete(&self, category_id: Uuid, acting_user: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;

        let category = category::Entity::find_by_id(category_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Category", category_id))?;

        let tools = tool::Entity::find()
            .filter(tool::Column::CategoryId.eq(category_id))
            .all(&txn)
            .await?;

        if let Some(out) = tools.iter().find(|t| t.status == ToolStatus::CheckedOut) {
            return Err(ServiceError::ReferentialIntegrity(format!(
                "category '{}' owns tool {} which is currently checked out",
                category.name, out.serial_number
            )));
        }

        let tool_ids: Vec<Uuid> = tools.iter().map(|t| t.id).collect();
        let tools_removed = tool_ids.len() as u64;

        if !tool_ids.is_empty() {
            delete_tool_dependents(&txn, &tool_ids).await?;
            tool::Entity::delete_many()
                .filter(tool::Column::Id.is_in(tool_ids))
                .exec(&txn)
                .await?;
        }

        category::Entity::delete_by_id(category_id).exec(&txn).await?;

        audit::record(
            &txn,
            acting_user,
            AuditAction::CategoryDelete,
            None,
            format!(
                "category '{}' deleted ({} owned tools removed)",
                category.name, tools_removed
            ),
        )
        .await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CategoryDeleted {
                category_id,
                tools_removed,
            })
            .await;

        info!(
            "Deleted category {} and {} owned tools",
            category_id, tools_removed
        );
        Ok(())
    }
}

async fn ensure_unique_name<C: ConnectionTrait>(
    conn: &C,
    name: &str,
    exclude_id: Option<Uuid>,
) -> Result<(), ServiceError> {
    let mut query = category::Entity::find().filter(category::Column::Name.eq(name));
    if let Some(id) = exclude_id {
        query = query.filter(category::Column::Id.ne(id));
    }

    if query.one(conn).await?.is_some() {
        return Err(ServiceError::UniquenessViolation(format!(
            "category name '{}' already exists",
            name
        )));
    }

    Ok(())
}

/// Removes every record hanging off the given tools. Audit rows are kept;
/// their tool reference is nulled so the trail survives the cascade.
pub(crate) async fn delete_tool_dependents<C: ConnectionTrait>(
    conn: &C,
    tool_ids: &[Uuid],
) -> Result<(), ServiceError> {
    use sea_orm::sea_query::Expr;

    attachment::Entity::delete_many()
        .filter(attachment::Column::ToolId.is_in(tool_ids.to_vec()))
        .exec(conn)
        .await?;
    maintenance_record::Entity::delete_many()
        .filter(maintenance_record::Column::ToolId.is_in(tool_ids.to_vec()))
        .exec(conn)
        .await?;
    check_out::Entity::delete_many()
        .filter(check_out::Column::ToolId.is_in(tool_ids.to_vec()))
        .exec(conn)
        .await?;
    check_in::Entity::delete_many()
        .filter(check_in::Column::ToolId.is_in(tool_ids.to_vec()))
        .exec(conn)
        .await?;
    crate::entities::audit_log::Entity::update_many()
        .col_expr(
            crate::entities::audit_log::Column::ToolId,
            Expr::value(None::<Uuid>),
        )
        .filter(crate::entities::audit_log::Column::ToolId.is_in(tool_ids.to_vec()))
        .exec(conn)
        .await?;

    Ok(())
}

/// Input for creating a category
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateCategoryInput {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub description: Option<String>,
}

/// Input for updating a category
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateCategoryInput {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub description: Option<String>,
}
