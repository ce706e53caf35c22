//! Toolcrib Inventory Ledger
//!
//! This crate maintains the authoritative status of every tracked tool and an
//! append-only history (check-out and check-in events, maintenance records,
//! audit entries) explaining how that status came to be. Identity, blob
//! storage, and any HTTP/CLI surface are external collaborators; callers embed
//! [`AppState`] and drive the services directly.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod migrator;
pub mod services;

use sea_orm::DatabaseConnection;
use std::sync::Arc;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: services::AppServices,
}

impl AppState {
    /// Wires up the full service container over one shared connection pool.
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
        event_sender: events::EventSender,
    ) -> Self {
        let services = services::AppServices::new(db.clone(), Arc::new(event_sender.clone()));
        Self {
            db,
            config,
            event_sender,
            services,
        }
    }

    pub fn checkout_service(&self) -> Arc<services::checkouts::CheckoutService> {
        self.services.checkouts.clone()
    }

    pub fn maintenance_service(&self) -> Arc<services::maintenance::MaintenanceService> {
        self.services.maintenance.clone()
    }

    pub fn tool_service(&self) -> Arc<services::tools::ToolService> {
        self.services.tools.clone()
    }

    pub fn audit_service(&self) -> Arc<services::audit::AuditLogService> {
        self.services.audit.clone()
    }
}
