use std::sync::Arc;

use tokio::sync::mpsc;
use toolcrib::{
    config::AppConfig,
    db,
    entities::{category, employee, employee::EmployeeRole, location, tool},
    events::{self, EventSender},
    services::{
        categories::CreateCategoryInput, employees::CreateEmployeeInput,
        locations::CreateLocationInput, tools::CreateToolInput,
    },
    AppState,
};
use uuid::Uuid;

/// Helper harness for spinning up an application state backed by an
/// in-memory SQLite database.
pub struct TestApp {
    pub state: AppState,
    /// Acting identity used for every seeded mutation.
    pub actor: Uuid,
    _event_task: tokio::task::JoinHandle<()>,
}

#[allow(dead_code)]
impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new("sqlite::memory:".to_string(), "test".to_string());
        cfg.auto_migrate = true;
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");

        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(cfg.event_channel_capacity);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let state = AppState::new(db_arc, cfg, event_sender);

        Self {
            state,
            actor: Uuid::new_v4(),
            _event_task: event_task,
        }
    }

    pub async fn seed_category(&self, name: &str) -> category::Model {
        self.state
            .services
            .categories
            .create(
                CreateCategoryInput {
                    name: name.to_string(),
                    description: None,
                },
                self.actor,
            )
            .await
            .expect("seed category for tests")
    }

    pub async fn seed_location(&self, name: &str) -> location::Model {
        self.state
            .services
            .locations
            .create(
                CreateLocationInput {
                    name: name.to_string(),
                    address: Some(format!("{} Crib Road", name)),
                },
                self.actor,
            )
            .await
            .expect("seed location for tests")
    }

    pub async fn seed_employee(&self, full_name: &str) -> employee::Model {
        self.state
            .services
            .employees
            .create(
                CreateEmployeeInput {
                    user_id: Uuid::new_v4(),
                    full_name: full_name.to_string(),
                    role: EmployeeRole::Technician,
                    phone: None,
                    department: Some("Shop Floor".to_string()),
                },
                self.actor,
            )
            .await
            .expect("seed employee for tests")
    }

    pub async fn seed_tool(&self, serial: &str, category_id: Uuid) -> tool::Model {
        self.state
            .services
            .tools
            .create(
                CreateToolInput {
                    name: format!("Tool {}", serial),
                    serial_number: serial.to_string(),
                    category_id,
                    location_id: None,
                    description: None,
                    purchase_date: None,
                    value: None,
                    image_path: None,
                },
                self.actor,
            )
            .await
            .expect("seed tool for tests")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}
