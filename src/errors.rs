use sea_orm::error::{DbErr, SqlErr};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Uniqueness violation: {0}")]
    UniquenessViolation(String),

    #[error("Referential integrity: {0}")]
    ReferentialIntegrity(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Event error: {0}")]
    EventError(String),

    #[error("Database error: {0}")]
    DatabaseError(DbErr),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

/// Driver-level constraint failures surface as the ledger's named kinds, so
/// callers see `UniquenessViolation` whether the duplicate was caught by the
/// service's pre-check or by the database index racing a concurrent writer.
impl From<DbErr> for ServiceError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(msg)) => ServiceError::UniquenessViolation(msg),
            Some(SqlErr::ForeignKeyConstraintViolation(msg)) => {
                ServiceError::ReferentialIntegrity(msg)
            }
            _ => match err {
                DbErr::RecordNotFound(msg) => ServiceError::NotFound(msg),
                other => ServiceError::DatabaseError(other),
            },
        }
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl ServiceError {
    pub fn not_found(entity: &str, id: Uuid) -> Self {
        ServiceError::NotFound(format!("{} {} not found", entity, id))
    }
}

// Alias kept for the db/bootstrap layer, which predates ServiceError's name.
pub type AppError = ServiceError;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_not_found_maps_to_not_found() {
        let err: ServiceError = DbErr::RecordNotFound("tool".into()).into();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[test]
    fn validation_errors_convert() {
        use validator::ValidationErrors;
        let err: ServiceError = ValidationErrors::new().into();
        assert!(matches!(err, ServiceError::ValidationError(_)));
    }

    #[test]
    fn not_found_message_names_the_entity() {
        let id = Uuid::new_v4();
        let err = ServiceError::not_found("Tool", id);
        assert_eq!(err.to_string(), format!("Not found: Tool {} not found", id));
    }
}
