//! Integration tests for catalog CRUD: uniqueness guards, ownership
//! cascades, weak location references, and the guards that refuse
//! destructive deletes while custody is live.

mod common;

use common::TestApp;
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use toolcrib::{
    entities::{
        check_out, employee::EmployeeRole, maintenance_record, tool, tool::ToolStatus, CheckIn,
        CheckOut, MaintenanceRecord, Tool,
    },
    errors::ServiceError,
    services::{
        categories::CreateCategoryInput,
        checkouts::{CheckInInput, CheckOutInput},
        employees::CreateEmployeeInput,
        maintenance::StartMaintenanceInput,
        tools::{AddAttachmentInput, CreateToolInput, ToolListQuery, UpdateToolInput},
    },
};
use uuid::Uuid;

#[tokio::test]
async fn duplicate_serial_number_is_rejected() {
    let app = TestApp::new().await;
    let category = app.seed_category("Power Tools").await;
    app.seed_tool("SN-3001", category.id).await;

    let err = app
        .state
        .services
        .tools
        .create(
            CreateToolInput {
                name: "Second Drill".to_string(),
                serial_number: "SN-3001".to_string(),
                category_id: category.id,
                location_id: None,
                description: None,
                purchase_date: None,
                value: None,
                image_path: None,
            },
            app.actor,
        )
        .await
        .expect_err("duplicate serial must fail");
    assert!(matches!(err, ServiceError::UniquenessViolation(_)));

    // The losing tool does not exist afterwards.
    let count = Tool::find()
        .filter(tool::Column::SerialNumber.eq("SN-3001"))
        .count(&*app.state.db)
        .await
        .expect("count tools");
    assert_eq!(count, 1);
}

#[tokio::test]
async fn tool_creation_requires_existing_category() {
    let app = TestApp::new().await;

    let err = app
        .state
        .services
        .tools
        .create(
            CreateToolInput {
                name: "Orphan".to_string(),
                serial_number: "SN-3002".to_string(),
                category_id: Uuid::new_v4(),
                location_id: None,
                description: None,
                purchase_date: None,
                value: None,
                image_path: None,
            },
            app.actor,
        )
        .await
        .expect_err("unknown category must fail");
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn duplicate_category_name_is_rejected() {
    let app = TestApp::new().await;
    app.seed_category("Electrical").await;

    let err = app
        .state
        .services
        .categories
        .create(
            CreateCategoryInput {
                name: "Electrical".to_string(),
                description: None,
            },
            app.actor,
        )
        .await
        .expect_err("duplicate name must fail");
    assert!(matches!(err, ServiceError::UniquenessViolation(_)));
}

#[tokio::test]
async fn duplicate_employee_user_id_is_rejected() {
    let app = TestApp::new().await;
    let user_id = Uuid::new_v4();

    app.state
        .services
        .employees
        .create(
            CreateEmployeeInput {
                user_id,
                full_name: "First Holder".to_string(),
                role: EmployeeRole::Technician,
                phone: None,
                department: None,
            },
            app.actor,
        )
        .await
        .expect("first employee");

    let err = app
        .state
        .services
        .employees
        .create(
            CreateEmployeeInput {
                user_id,
                full_name: "Second Holder".to_string(),
                role: EmployeeRole::Viewer,
                phone: None,
                department: None,
            },
            app.actor,
        )
        .await
        .expect_err("duplicate identity link must fail");
    assert!(matches!(err, ServiceError::UniquenessViolation(_)));
}

#[tokio::test]
async fn tool_update_changes_catalog_fields_only() {
    let app = TestApp::new().await;
    let category = app.seed_category("Fastening").await;
    let tool = app.seed_tool("SN-3003", category.id).await;

    let updated = app
        .state
        .services
        .tools
        .update(
            tool.id,
            UpdateToolInput {
                name: Some("Impact Driver".to_string()),
                value: Some(dec!(229.99)),
                description: Some("18V brushless".to_string()),
                ..Default::default()
            },
            app.actor,
        )
        .await
        .expect("update tool");

    assert_eq!(updated.name, "Impact Driver");
    assert_eq!(updated.value, Some(dec!(229.99)));
    assert_eq!(updated.status, ToolStatus::Available);
    assert!(updated.updated_at >= tool.updated_at);
}

#[tokio::test]
async fn list_filters_by_status_and_category() {
    let app = TestApp::new().await;
    let drills = app.seed_category("Drills").await;
    let saws = app.seed_category("Saws").await;
    let employee = app.seed_employee("Morgan Tsai").await;

    let d1 = app.seed_tool("SN-3004", drills.id).await;
    app.seed_tool("SN-3005", drills.id).await;
    app.seed_tool("SN-3006", saws.id).await;

    app.state
        .services
        .checkouts
        .check_out(
            CheckOutInput {
                tool_id: d1.id,
                employee_id: employee.id,
                location_id: None,
                due_date: None,
                remarks: None,
            },
            app.actor,
        )
        .await
        .expect("check out");

    let checked_out = app
        .state
        .services
        .tools
        .list(ToolListQuery {
            status: Some(ToolStatus::CheckedOut),
            ..Default::default()
        })
        .await
        .expect("list checked out");
    assert_eq!(checked_out.total, 1);
    assert_eq!(checked_out.tools[0].id, d1.id);

    let drill_page = app
        .state
        .services
        .tools
        .list(ToolListQuery {
            category_id: Some(drills.id),
            ..Default::default()
        })
        .await
        .expect("list drills");
    assert_eq!(drill_page.total, 2);

    let paged = app
        .state
        .services
        .tools
        .list(ToolListQuery {
            limit: Some(2),
            offset: Some(0),
            ..Default::default()
        })
        .await
        .expect("paged list");
    assert_eq!(paged.total, 3);
    assert_eq!(paged.tools.len(), 2);
}

#[tokio::test]
async fn deleting_checked_out_tool_is_refused() {
    let app = TestApp::new().await;
    let category = app.seed_category("Rigging").await;
    let tool = app.seed_tool("SN-3007", category.id).await;
    let employee = app.seed_employee("Casey Ford").await;

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
        .tools
        .delete(tool.id, app.actor)
        .await
        .expect_err("delete of checked-out tool must fail");
    assert!(matches!(err, ServiceError::ReferentialIntegrity(_)));

    assert!(app.state.services.tools.get(tool.id).await.is_ok());
}

#[tokio::test]
async fn deleting_tool_cascades_history_and_keeps_audit() {
    let app = TestApp::new().await;
    let category = app.seed_category("Polishers").await;
    let tool = app.seed_tool("SN-3008", category.id).await;
    let employee = app.seed_employee("Harper Quinn").await;

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
    app.state
        .services
        .checkouts
        .check_in(
            CheckInInput {
                tool_id: tool.id,
                employee_id: employee.id,
                location_id: None,
                remarks: None,
            },
            app.actor,
        )
        .await
        .expect("check in");
    app.state
        .services
        .tools
        .add_attachment(
            tool.id,
            AddAttachmentInput {
                file_path: "attachments/manual.pdf".to_string(),
                description: None,
            },
            app.actor,
        )
        .await
        .expect("add attachment");

    let audit_before = app
        .state
        .services
        .audit
        .recent(Some(100), None)
        .await
        .expect("audit before")
        .total;

    app.state
        .services
        .tools
        .delete(tool.id, app.actor)
        .await
        .expect("delete tool");

    assert!(matches!(
        app.state.services.tools.get(tool.id).await,
        Err(ServiceError::NotFound(_))
    ));

    let outs = CheckOut::find()
        .filter(check_out::Column::ToolId.eq(tool.id))
        .count(&*app.state.db)
        .await
        .expect("count outs");
    assert_eq!(outs, 0);

    let ins = CheckIn::find().count(&*app.state.db).await.expect("ins");
    assert_eq!(ins, 0);

    let attachments = app
        .state
        .services
        .tools
        .list_attachments(tool.id)
        .await
        .expect("attachments");
    assert!(attachments.is_empty());

    // The audit trail survives the cascade, plus the delete entry itself.
    let audit_after = app
        .state
        .services
        .audit
        .recent(Some(100), None)
        .await
        .expect("audit after")
        .total;
    assert_eq!(audit_after, audit_before + 1);
}

#[tokio::test]
async fn deleting_category_cascades_owned_tools() {
    let app = TestApp::new().await;
    let category = app.seed_category("Retiring").await;
    let tool_a = app.seed_tool("SN-3009", category.id).await;
    let tool_b = app.seed_tool("SN-3010", category.id).await;

    app.state
        .services
        .maintenance
        .start_maintenance(
            StartMaintenanceInput {
                tool_id: tool_a.id,
                description: "final inspection".to_string(),
                scheduled_date: None,
                remarks: None,
            },
            app.actor,
        )
        .await
        .expect("start maintenance");

    app.state
        .services
        .categories
        .delete(category.id, app.actor)
        .await
        .expect("delete category");

    for id in [tool_a.id, tool_b.id] {
        assert!(matches!(
            app.state.services.tools.get(id).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    let records = MaintenanceRecord::find()
        .filter(maintenance_record::Column::ToolId.eq(tool_a.id))
        .count(&*app.state.db)
        .await
        .expect("count maintenance");
    assert_eq!(records, 0);
}

#[tokio::test]
async fn deleting_category_with_checked_out_tool_is_refused() {
    let app = TestApp::new().await;
    let category = app.seed_category("Active").await;
    let tool = app.seed_tool("SN-3011", category.id).await;
    let employee = app.seed_employee("Rowan Ellis").await;

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
        .categories
        .delete(category.id, app.actor)
        .await
        .expect_err("category with live custody must not delete");
    assert!(matches!(err, ServiceError::ReferentialIntegrity(_)));

    assert!(app.state.services.categories.get(category.id).await.is_ok());
    assert!(app.state.services.tools.get(tool.id).await.is_ok());
}

#[tokio::test]
async fn deleting_location_clears_weak_references() {
    let app = TestApp::new().await;
    let category = app.seed_category("Mobile").await;
    let site = app.seed_location("Yard B").await;
    let tool = app.seed_tool("SN-3012", category.id).await;
    let employee = app.seed_employee("Sky Navarro").await;

    app.state
        .services
        .checkouts
        .check_out(
            CheckOutInput {
                tool_id: tool.id,
                employee_id: employee.id,
                location_id: Some(site.id),
                due_date: None,
                remarks: None,
            },
            app.actor,
        )
        .await
        .expect("check out");
    app.state
        .services
        .checkouts
        .check_in(
            CheckInInput {
                tool_id: tool.id,
                employee_id: employee.id,
                location_id: Some(site.id),
                remarks: None,
            },
            app.actor,
        )
        .await
        .expect("check in");

    app.state
        .services
        .locations
        .delete(site.id, app.actor)
        .await
        .expect("delete location");

    // Referencing rows survive with the pointer cleared.
    let current = app
        .state
        .services
        .tools
        .get(tool.id)
        .await
        .expect("fetch tool");
    assert_eq!(current.location_id, None);

    let history = app
        .state
        .services
        .checkouts
        .history_for_tool(tool.id)
        .await
        .expect("history");
    assert_eq!(history.len(), 2);
    assert!(history.iter().all(|e| e.location_id.is_none()));
}

#[tokio::test]
async fn deleting_employee_removes_custody_history_only() {
    let app = TestApp::new().await;
    let category = app.seed_category("Shared").await;
    let tool = app.seed_tool("SN-3013", category.id).await;
    let employee = app.seed_employee("Quinn Archer").await;

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
    app.state
        .services
        .checkouts
        .check_in(
            CheckInInput {
                tool_id: tool.id,
                employee_id: employee.id,
                location_id: None,
                remarks: None,
            },
            app.actor,
        )
        .await
        .expect("check in");

    app.state
        .services
        .employees
        .delete(employee.id, app.actor)
        .await
        .expect("delete employee");

    let history = app
        .state
        .services
        .checkouts
        .history_for_tool(tool.id)
        .await
        .expect("history");
    assert!(history.is_empty());

    let current = app
        .state
        .services
        .tools
        .get(tool.id)
        .await
        .expect("fetch tool");
    assert_eq!(current.status, ToolStatus::Available);
}

#[tokio::test]
async fn attachments_round_trip() {
    let app = TestApp::new().await;
    let category = app.seed_category("Documented").await;
    let tool = app.seed_tool("SN-3014", category.id).await;

    let attachment = app
        .state
        .services
        .tools
        .add_attachment(
            tool.id,
            AddAttachmentInput {
                file_path: "attachments/cal-cert.pdf".to_string(),
                description: Some("calibration certificate".to_string()),
            },
            app.actor,
        )
        .await
        .expect("add attachment");

    let listed = app
        .state
        .services
        .tools
        .list_attachments(tool.id)
        .await
        .expect("list attachments");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, attachment.id);

    app.state
        .services
        .tools
        .remove_attachment(attachment.id, app.actor)
        .await
        .expect("remove attachment");

    let listed = app
        .state
        .services
        .tools
        .list_attachments(tool.id)
        .await
        .expect("list attachments");
    assert!(listed.is_empty());
}

#[tokio::test]
async fn employee_lookup_by_identity() {
    let app = TestApp::new().await;
    let user_id = Uuid::new_v4();

    let employee = app
        .state
        .services
        .employees
        .create(
            CreateEmployeeInput {
                user_id,
                full_name: "Identity Linked".to_string(),
                role: EmployeeRole::Admin,
                phone: Some("555-0100".to_string()),
                department: None,
            },
            app.actor,
        )
        .await
        .expect("create employee");

    let found = app
        .state
        .services
        .employees
        .get_by_user(user_id)
        .await
        .expect("lookup by user");
    assert_eq!(found.id, employee.id);
    assert_eq!(found.role, EmployeeRole::Admin);

    assert!(matches!(
        app.state.services.employees.get_by_user(Uuid::new_v4()).await,
        Err(ServiceError::NotFound(_))
    ));
}
