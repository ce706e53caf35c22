use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when the channel is gone.
    /// Used after commit: the audit row is the durable record, the event is
    /// best-effort notification.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            error!("Failed to publish event: {}", e);
        }
    }
}

// The events the ledger can emit. Each is published after the transaction
// that produced it has committed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Tool lifecycle events
    ToolCheckedOut {
        tool_id: Uuid,
        employee_id: Uuid,
        due_date: Option<NaiveDate>,
    },
    ToolCheckedIn {
        tool_id: Uuid,
        employee_id: Uuid,
    },
    MaintenanceStarted {
        tool_id: Uuid,
        maintenance_id: Uuid,
    },
    MaintenanceCompleted {
        tool_id: Uuid,
        maintenance_id: Uuid,
    },
    ToolReportedLost(Uuid),
    ToolRecovered(Uuid),

    // Catalog events
    ToolCreated(Uuid),
    ToolUpdated(Uuid),
    ToolDeleted(Uuid),
    CategoryCreated(Uuid),
    CategoryUpdated(Uuid),
    CategoryDeleted {
        category_id: Uuid,
        tools_removed: u64,
    },
    LocationCreated(Uuid),
    LocationUpdated(Uuid),
    LocationDeleted(Uuid),
    EmployeeCreated(Uuid),
    EmployeeUpdated(Uuid),
    EmployeeDeleted(Uuid),
    AttachmentAdded {
        tool_id: Uuid,
        attachment_id: Uuid,
    },
    AttachmentRemoved {
        tool_id: Uuid,
        attachment_id: Uuid,
    },

    // Generic event for custom messages
    Generic {
        message: String,
        timestamp: DateTime<Utc>,
        metadata: serde_json::Value,
    },
}

impl Event {
    /// Create a generic event with string data
    pub fn with_data(data: String) -> Self {
        Event::Generic {
            message: data,
            timestamp: Utc::now(),
            metadata: serde_json::Value::Null,
        }
    }
}

// Consumes the event channel and logs what the ledger did. A deployment
// wanting webhooks or notifications swaps this consumer out.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match event {
            Event::ToolCheckedOut {
                tool_id,
                employee_id,
                due_date,
            } => match due_date {
                Some(due) => info!(
                    "Tool {} checked out to employee {} (due {})",
                    tool_id, employee_id, due
                ),
                None => info!("Tool {} checked out to employee {}", tool_id, employee_id),
            },
            Event::ToolCheckedIn {
                tool_id,
                employee_id,
            } => {
                info!("Tool {} checked in by employee {}", tool_id, employee_id);
            }
            Event::MaintenanceStarted {
                tool_id,
                maintenance_id,
            } => {
                info!(
                    "Maintenance {} started for tool {}",
                    maintenance_id, tool_id
                );
            }
            Event::MaintenanceCompleted {
                tool_id,
                maintenance_id,
            } => {
                info!(
                    "Maintenance {} completed for tool {}",
                    maintenance_id, tool_id
                );
            }
            Event::ToolReportedLost(tool_id) => {
                warn!("Tool {} reported lost", tool_id);
            }
            Event::ToolRecovered(tool_id) => {
                info!("Tool {} recovered", tool_id);
            }
            Event::CategoryDeleted {
                category_id,
                tools_removed,
            } => {
                if tools_removed > 0 {
                    warn!(
                        "Category {} deleted, removing {} owned tools",
                        category_id, tools_removed
                    );
                } else {
                    info!("Category {} deleted", category_id);
                }
            }
            other => {
                info!("No specific handler for event: {:?}", other);
            }
        }
    }

    warn!("Event processing loop has ended");
}
