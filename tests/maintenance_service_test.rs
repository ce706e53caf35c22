//! Integration tests for the maintenance half of the ledger: opening a
//! record pins the tool in `maintenance`, completing it releases the tool
//! and closes the record for good.

mod common;

use chrono::NaiveDate;
use common::TestApp;
use rust_decimal_macros::dec;
use toolcrib::{
    entities::tool::ToolStatus,
    errors::ServiceError,
    services::{
        checkouts::CheckOutInput,
        maintenance::{CompleteMaintenanceInput, StartMaintenanceInput},
    },
};
use uuid::Uuid;

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

#[tokio::test]
async fn start_and_complete_maintenance() {
    let app = TestApp::new().await;
    let category = app.seed_category("Grinders").await;
    let tool = app.seed_tool("SN-2001", category.id).await;
    let mechanic = app.seed_employee("Kai Tanner").await;

    let record = app
        .state
        .services
        .maintenance
        .start_maintenance(
            StartMaintenanceInput {
                tool_id: tool.id,
                description: "annual service".to_string(),
                scheduled_date: Some(day(2024, 3, 1)),
                remarks: None,
            },
            app.actor,
        )
        .await
        .expect("start maintenance");

    assert!(record.is_open());
    assert_eq!(record.tool_id, tool.id);

    let current = app
        .state
        .services
        .tools
        .get(tool.id)
        .await
        .expect("fetch tool");
    assert_eq!(current.status, ToolStatus::Maintenance);

    let open = app
        .state
        .services
        .maintenance
        .open_for_tool(tool.id)
        .await
        .expect("open query");
    assert_eq!(open.map(|r| r.id), Some(record.id));

    let record = app
        .state
        .services
        .maintenance
        .complete_maintenance(
            CompleteMaintenanceInput {
                maintenance_id: record.id,
                completed_date: day(2024, 3, 4),
                performed_by: Some(mechanic.id),
                cost: Some(dec!(145.50)),
                remarks: Some("replaced brushes".to_string()),
            },
            app.actor,
        )
        .await
        .expect("complete maintenance");

    assert!(!record.is_open());
    assert_eq!(record.completed_date, Some(day(2024, 3, 4)));
    assert_eq!(record.performed_by, Some(mechanic.id));
    assert_eq!(record.cost, Some(dec!(145.50)));

    let current = app
        .state
        .services
        .tools
        .get(tool.id)
        .await
        .expect("fetch tool");
    assert_eq!(current.status, ToolStatus::Available);

    let open = app
        .state
        .services
        .maintenance
        .open_for_tool(tool.id)
        .await
        .expect("open query");
    assert!(open.is_none());
}

#[tokio::test]
async fn start_maintenance_on_checked_out_tool_fails() {
    let app = TestApp::new().await;
    let category = app.seed_category("Saws").await;
    let tool = app.seed_tool("SN-2002", category.id).await;
    let employee = app.seed_employee("Lee Marsh").await;

    app.state
        .services
        .checkouts
        .check_out(
            CheckOutInput {
                tool_id: tool.id,
                employee_id: employee.id,
                location_id: None,
                due_date: None,
                remarks: None,
            },
            app.actor,
        )
        .await
        .expect("check out");

    let err = app
        .state
        .services
        .maintenance
        .start_maintenance(
            StartMaintenanceInput {
                tool_id: tool.id,
                description: "annual service".to_string(),
                scheduled_date: None,
                remarks: None,
            },
            app.actor,
        )
        .await
        .expect_err("maintenance on checked-out tool must fail");
    assert!(matches!(err, ServiceError::InvalidTransition(_)));

    let current = app
        .state
        .services
        .tools
        .get(tool.id)
        .await
        .expect("fetch tool");
    assert_eq!(current.status, ToolStatus::CheckedOut);

    let history = app
        .state
        .services
        .maintenance
        .history_for_tool(tool.id)
        .await
        .expect("history");
    assert!(history.is_empty());
}

#[tokio::test]
async fn start_maintenance_twice_fails() {
    let app = TestApp::new().await;
    let category = app.seed_category("Sanders").await;
    let tool = app.seed_tool("SN-2003", category.id).await;

    app.state
        .services
        .maintenance
        .start_maintenance(
            StartMaintenanceInput {
                tool_id: tool.id,
                description: "bearing swap".to_string(),
                scheduled_date: None,
                remarks: None,
            },
            app.actor,
        )
        .await
        .expect("first start");

    let err = app
        .state
        .services
        .maintenance
        .start_maintenance(
            StartMaintenanceInput {
                tool_id: tool.id,
                description: "second round".to_string(),
                scheduled_date: None,
                remarks: None,
            },
            app.actor,
        )
        .await
        .expect_err("tool already in maintenance");
    assert!(matches!(err, ServiceError::InvalidTransition(_)));
}

#[tokio::test]
async fn start_maintenance_on_lost_tool_fails() {
    let app = TestApp::new().await;
    let category = app.seed_category("Clamps").await;
    let tool = app.seed_tool("SN-2004", category.id).await;

    app.state
        .services
        .tools
        .report_lost(tool.id, app.actor, None)
        .await
        .expect("report lost");

    let err = app
        .state
        .services
        .maintenance
        .start_maintenance(
            StartMaintenanceInput {
                tool_id: tool.id,
                description: "inspection".to_string(),
                scheduled_date: None,
                remarks: None,
            },
            app.actor,
        )
        .await
        .expect_err("lost tool cannot enter maintenance");
    assert!(matches!(err, ServiceError::InvalidTransition(_)));
}

#[tokio::test]
async fn complete_maintenance_twice_fails() {
    let app = TestApp::new().await;
    let category = app.seed_category("Torque").await;
    let tool = app.seed_tool("SN-2005", category.id).await;

    let record = app
        .state
        .services
        .maintenance
        .start_maintenance(
            StartMaintenanceInput {
                tool_id: tool.id,
                description: "calibration".to_string(),
                scheduled_date: None,
                remarks: None,
            },
            app.actor,
        )
        .await
        .expect("start");

    app.state
        .services
        .maintenance
        .complete_maintenance(
            CompleteMaintenanceInput {
                maintenance_id: record.id,
                completed_date: day(2024, 5, 2),
                performed_by: None,
                cost: None,
                remarks: None,
            },
            app.actor,
        )
        .await
        .expect("first completion");

    let err = app
        .state
        .services
        .maintenance
        .complete_maintenance(
            CompleteMaintenanceInput {
                maintenance_id: record.id,
                completed_date: day(2024, 5, 3),
                performed_by: None,
                cost: None,
                remarks: None,
            },
            app.actor,
        )
        .await
        .expect_err("closed record cannot be completed again");
    assert!(matches!(err, ServiceError::InvalidTransition(_)));
}

#[tokio::test]
async fn complete_maintenance_requires_tool_in_maintenance() {
    let app = TestApp::new().await;
    let category = app.seed_category("Lifting").await;
    let tool = app.seed_tool("SN-2006", category.id).await;

    let record = app
        .state
        .services
        .maintenance
        .start_maintenance(
            StartMaintenanceInput {
                tool_id: tool.id,
                description: "hoist inspection".to_string(),
                scheduled_date: None,
                remarks: None,
            },
            app.actor,
        )
        .await
        .expect("start");

    // The tool disappears from the shop while the record is still open.
    app.state
        .services
        .tools
        .report_lost(tool.id, app.actor, None)
        .await
        .expect("report lost");

    let err = app
        .state
        .services
        .maintenance
        .complete_maintenance(
            CompleteMaintenanceInput {
                maintenance_id: record.id,
                completed_date: day(2024, 6, 1),
                performed_by: None,
                cost: None,
                remarks: None,
            },
            app.actor,
        )
        .await
        .expect_err("tool is no longer in maintenance");
    assert!(matches!(err, ServiceError::InvalidTransition(_)));
}

#[tokio::test]
async fn complete_maintenance_with_unknown_performer_fails() {
    let app = TestApp::new().await;
    let category = app.seed_category("Pneumatics").await;
    let tool = app.seed_tool("SN-2007", category.id).await;

    let record = app
        .state
        .services
        .maintenance
        .start_maintenance(
            StartMaintenanceInput {
                tool_id: tool.id,
                description: "seal replacement".to_string(),
                scheduled_date: None,
                remarks: None,
            },
            app.actor,
        )
        .await
        .expect("start");

    let err = app
        .state
        .services
        .maintenance
        .complete_maintenance(
            CompleteMaintenanceInput {
                maintenance_id: record.id,
                completed_date: day(2024, 7, 1),
                performed_by: Some(Uuid::new_v4()),
                cost: None,
                remarks: None,
            },
            app.actor,
        )
        .await
        .expect_err("unknown performer must fail");
    assert!(matches!(err, ServiceError::NotFound(_)));

    // Rolled back: record still open, tool still in maintenance.
    let record = app
        .state
        .services
        .maintenance
        .get(record.id)
        .await
        .expect("fetch record");
    assert!(record.is_open());

    let current = app
        .state
        .services
        .tools
        .get(tool.id)
        .await
        .expect("fetch tool");
    assert_eq!(current.status, ToolStatus::Maintenance);
}

#[tokio::test]
async fn maintenance_history_lists_all_rounds() {
    let app = TestApp::new().await;
    let category = app.seed_category("Routers").await;
    let tool = app.seed_tool("SN-2008", category.id).await;

    for (i, desc) in ["first service", "second service"].iter().enumerate() {
        let record = app
            .state
            .services
            .maintenance
            .start_maintenance(
                StartMaintenanceInput {
                    tool_id: tool.id,
                    description: desc.to_string(),
                    scheduled_date: Some(day(2024, 1 + i as u32, 1)),
                    remarks: None,
                },
                app.actor,
            )
            .await
            .expect("start");

        app.state
            .services
            .maintenance
            .complete_maintenance(
                CompleteMaintenanceInput {
                    maintenance_id: record.id,
                    completed_date: day(2024, 1 + i as u32, 5),
                    performed_by: None,
                    cost: None,
                    remarks: None,
                },
                app.actor,
            )
            .await
            .expect("complete");
    }

    let history = app
        .state
        .services
        .maintenance
        .history_for_tool(tool.id)
        .await
        .expect("history");
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].description, "first service");
    assert_eq!(history[1].description, "second service");
    assert!(history.iter().all(|r| !r.is_open()));
}
