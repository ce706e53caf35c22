use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_categories_table::Migration),
            Box::new(m20240101_000002_create_locations_table::Migration),
            Box::new(m20240101_000003_create_employees_table::Migration),
            Box::new(m20240101_000004_create_tools_table::Migration),
            Box::new(m20240101_000005_create_check_outs_table::Migration),
            Box::new(m20240101_000006_create_check_ins_table::Migration),
            Box::new(m20240101_000007_create_maintenance_records_table::Migration),
            Box::new(m20240101_000008_create_attachments_table::Migration),
            Box::new(m20240101_000009_create_audit_logs_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240101_000001_create_categories_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_categories_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Categories::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Categories::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Categories::Name)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Categories::Description).text().null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Categories::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Categories {
        Table,
        Id,
        Name,
        Description,
    }
}

mod m20240101_000002_create_locations_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_locations_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Locations::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Locations::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Locations::Name).string().not_null())
                        .col(ColumnDef::new(Locations::Address).text().null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Locations::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Locations {
        Table,
        Id,
        Name,
        Address,
    }
}

mod m20240101_000003_create_employees_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_employees_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Employees::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Employees::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Employees::UserId)
                                .uuid()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Employees::FullName).string().not_null())
                        .col(
                            ColumnDef::new(Employees::Role)
                                .string()
                                .not_null()
                                .default("technician"),
                        )
                        .col(ColumnDef::new(Employees::Phone).string().null())
                        .col(ColumnDef::new(Employees::Department).string().null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Employees::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Employees {
        Table,
        Id,
        UserId,
        FullName,
        Role,
        Phone,
        Department,
    }
}

mod m20240101_000004_create_tools_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_tools_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Tools::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Tools::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Tools::Name).string().not_null())
                        .col(
                            ColumnDef::new(Tools::SerialNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Tools::CategoryId).uuid().not_null())
                        .col(ColumnDef::new(Tools::LocationId).uuid().null())
                        .col(ColumnDef::new(Tools::Description).text().null())
                        .col(
                            ColumnDef::new(Tools::Status)
                                .string()
                                .not_null()
                                .default("available"),
                        )
                        .col(ColumnDef::new(Tools::PurchaseDate).date().null())
                        .col(ColumnDef::new(Tools::Value).decimal_len(10, 2).null())
                        .col(ColumnDef::new(Tools::ImagePath).string().null())
                        .col(
                            ColumnDef::new(Tools::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Tools::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_tools_category_id")
                                .from(Tools::Table, Tools::CategoryId)
                                .to(Categories::Table, Categories::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_tools_location_id")
                                .from(Tools::Table, Tools::LocationId)
                                .to(Locations::Table, Locations::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_tools_status")
                        .table(Tools::Table)
                        .col(Tools::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_tools_category_id")
                        .table(Tools::Table)
                        .col(Tools::CategoryId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Tools::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Tools {
        Table,
        Id,
        Name,
        SerialNumber,
        CategoryId,
        LocationId,
        Description,
        Status,
        PurchaseDate,
        Value,
        ImagePath,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Categories {
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    enum Locations {
        Table,
        Id,
    }
}

mod m20240101_000005_create_check_outs_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_check_outs_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(CheckOuts::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CheckOuts::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(CheckOuts::ToolId).uuid().not_null())
                        .col(ColumnDef::new(CheckOuts::EmployeeId).uuid().not_null())
                        .col(ColumnDef::new(CheckOuts::LocationId).uuid().null())
                        .col(
                            ColumnDef::new(CheckOuts::CheckedOutAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(CheckOuts::DueDate).date().null())
                        .col(ColumnDef::new(CheckOuts::Remarks).text().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_check_outs_tool_id")
                                .from(CheckOuts::Table, CheckOuts::ToolId)
                                .to(Tools::Table, Tools::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_check_outs_employee_id")
                                .from(CheckOuts::Table, CheckOuts::EmployeeId)
                                .to(Employees::Table, Employees::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_check_outs_location_id")
                                .from(CheckOuts::Table, CheckOuts::LocationId)
                                .to(Locations::Table, Locations::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_check_outs_tool_id")
                        .table(CheckOuts::Table)
                        .col(CheckOuts::ToolId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_check_outs_employee_id")
                        .table(CheckOuts::Table)
                        .col(CheckOuts::EmployeeId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_check_outs_due_date")
                        .table(CheckOuts::Table)
                        .col(CheckOuts::DueDate)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(CheckOuts::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum CheckOuts {
        Table,
        Id,
        ToolId,
        EmployeeId,
        LocationId,
        CheckedOutAt,
        DueDate,
        Remarks,
    }

    #[derive(DeriveIden)]
    enum Tools {
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    enum Employees {
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    enum Locations {
        Table,
        Id,
    }
}

mod m20240101_000006_create_check_ins_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000006_create_check_ins_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(CheckIns::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(CheckIns::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(CheckIns::ToolId).uuid().not_null())
                        .col(ColumnDef::new(CheckIns::EmployeeId).uuid().not_null())
                        .col(ColumnDef::new(CheckIns::LocationId).uuid().null())
                        .col(
                            ColumnDef::new(CheckIns::CheckedInAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(CheckIns::Remarks).text().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_check_ins_tool_id")
                                .from(CheckIns::Table, CheckIns::ToolId)
                                .to(Tools::Table, Tools::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_check_ins_employee_id")
                                .from(CheckIns::Table, CheckIns::EmployeeId)
                                .to(Employees::Table, Employees::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_check_ins_location_id")
                                .from(CheckIns::Table, CheckIns::LocationId)
                                .to(Locations::Table, Locations::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_check_ins_tool_id")
                        .table(CheckIns::Table)
                        .col(CheckIns::ToolId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_check_ins_employee_id")
                        .table(CheckIns::Table)
                        .col(CheckIns::EmployeeId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(CheckIns::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum CheckIns {
        Table,
        Id,
        ToolId,
        EmployeeId,
        LocationId,
        CheckedInAt,
        Remarks,
    }

    #[derive(DeriveIden)]
    enum Tools {
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    enum Employees {
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    enum Locations {
        Table,
        Id,
    }
}

mod m20240101_000007_create_maintenance_records_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000007_create_maintenance_records_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(MaintenanceRecords::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(MaintenanceRecords::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(MaintenanceRecords::ToolId).uuid().not_null())
                        .col(
                            ColumnDef::new(MaintenanceRecords::Description)
                                .text()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MaintenanceRecords::ScheduledDate)
                                .date()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(MaintenanceRecords::CompletedDate)
                                .date()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(MaintenanceRecords::PerformedBy)
                                .uuid()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(MaintenanceRecords::Cost)
                                .decimal_len(10, 2)
                                .null(),
                        )
                        .col(ColumnDef::new(MaintenanceRecords::Remarks).text().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_maintenance_records_tool_id")
                                .from(MaintenanceRecords::Table, MaintenanceRecords::ToolId)
                                .to(Tools::Table, Tools::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_maintenance_records_performed_by")
                                .from(MaintenanceRecords::Table, MaintenanceRecords::PerformedBy)
                                .to(Employees::Table, Employees::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_maintenance_records_tool_id")
                        .table(MaintenanceRecords::Table)
                        .col(MaintenanceRecords::ToolId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(MaintenanceRecords::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum MaintenanceRecords {
        Table,
        Id,
        ToolId,
        Description,
        ScheduledDate,
        CompletedDate,
        PerformedBy,
        Cost,
        Remarks,
    }

    #[derive(DeriveIden)]
    enum Tools {
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    enum Employees {
        Table,
        Id,
    }
}

mod m20240101_000008_create_attachments_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000008_create_attachments_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Attachments::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Attachments::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Attachments::ToolId).uuid().not_null())
                        .col(ColumnDef::new(Attachments::FilePath).string().not_null())
                        .col(ColumnDef::new(Attachments::Description).string().null())
                        .col(
                            ColumnDef::new(Attachments::UploadedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_attachments_tool_id")
                                .from(Attachments::Table, Attachments::ToolId)
                                .to(Tools::Table, Tools::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_attachments_tool_id")
                        .table(Attachments::Table)
                        .col(Attachments::ToolId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Attachments::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Attachments {
        Table,
        Id,
        ToolId,
        FilePath,
        Description,
        UploadedAt,
    }

    #[derive(DeriveIden)]
    enum Tools {
        Table,
        Id,
    }
}

mod m20240101_000009_create_audit_logs_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000009_create_audit_logs_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(AuditLogs::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(AuditLogs::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(AuditLogs::UserId).uuid().not_null())
                        .col(ColumnDef::new(AuditLogs::Action).string().not_null())
                        .col(ColumnDef::new(AuditLogs::ToolId).uuid().null())
                        .col(
                            ColumnDef::new(AuditLogs::Timestamp)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(AuditLogs::Details).text().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_audit_logs_tool_id")
                                .from(AuditLogs::Table, AuditLogs::ToolId)
                                .to(Tools::Table, Tools::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_audit_logs_tool_id")
                        .table(AuditLogs::Table)
                        .col(AuditLogs::ToolId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_audit_logs_user_id")
                        .table(AuditLogs::Table)
                        .col(AuditLogs::UserId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_audit_logs_timestamp")
                        .table(AuditLogs::Table)
                        .col(AuditLogs::Timestamp)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(AuditLogs::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum AuditLogs {
        Table,
        Id,
        UserId,
        Action,
        ToolId,
        Timestamp,
        Details,
    }

    #[derive(DeriveIden)]
    enum Tools {
        Table,
        Id,
    }
}
