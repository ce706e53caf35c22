// Lifecycle ledger
pub mod checkouts;
pub mod maintenance;

// Catalog
pub mod categories;
pub mod employees;
pub mod locations;
pub mod tools;

// Audit trail
pub mod audit;

use crate::events::EventSender;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// Services layer that encapsulates the ledger's business logic
#[derive(Clone)]
pub struct AppServices {
    pub categories: Arc<categories::CategoryService>,
    pub locations: Arc<locations::LocationService>,
    pub employees: Arc<employees::EmployeeService>,
    pub tools: Arc<tools::ToolService>,
    pub checkouts: Arc<checkouts::CheckoutService>,
    pub maintenance: Arc<maintenance::MaintenanceService>,
    pub audit: Arc<audit::AuditLogService>,
}

impl AppServices {
    /// Build the full service container over one shared connection pool.
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        let categories = Arc::new(categories::CategoryService::new(
            db.clone(),
            event_sender.clone(),
        ));
        let locations = Arc::new(locations::LocationService::new(
            db.clone(),
            event_sender.clone(),
        ));
        let employees = Arc::new(employees::EmployeeService::new(
            db.clone(),
            event_sender.clone(),
        ));
        let tools = Arc::new(tools::ToolService::new(db.clone(), event_sender.clone()));
        let checkouts = Arc::new(checkouts::CheckoutService::new(
            db.clone(),
            event_sender.clone(),
        ));
        let maintenance = Arc::new(maintenance::MaintenanceService::new(
            db.clone(),
            event_sender,
        ));
        let audit = Arc::new(audit::AuditLogService::new(db));

        Self {
            categories,
            locations,
            employees,
            tools,
            checkouts,
            maintenance,
            audit,
        }
    }
}
