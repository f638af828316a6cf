use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_users_table::Migration),
            Box::new(m20240101_000002_create_locations_table::Migration),
            Box::new(m20240101_000003_create_items_table::Migration),
            Box::new(m20240101_000004_create_inventory_records_table::Migration),
            Box::new(m20240101_000005_create_inventory_counts_table::Migration),
            Box::new(m20240101_000006_create_audit_events_table::Migration),
        ]
    }
}

mod m20240101_000001_create_users_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_users_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Users::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Users::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Users::Username)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Users::Email).string().not_null())
                        .col(
                            ColumnDef::new(Users::IsAdmin)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Users::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(ColumnDef::new(Users::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Users::DeletedAt).timestamp().null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Users::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Users {
        Table,
        Id,
        Username,
        Email,
        IsAdmin,
        IsActive,
        CreatedAt,
        DeletedAt,
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
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Locations::Name).string().not_null())
                        .col(ColumnDef::new(Locations::Description).text().null())
                        .col(ColumnDef::new(Locations::LocationType).string().not_null())
                        .col(ColumnDef::new(Locations::VehicleId).string().null())
                        .col(
                            ColumnDef::new(Locations::HasSections)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Locations::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(ColumnDef::new(Locations::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Locations::DeletedAt).timestamp().null())
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
    enum Locations {
        Table,
        Id,
        Name,
        Description,
        LocationType,
        VehicleId,
        HasSections,
        IsActive,
        CreatedAt,
        DeletedAt,
    }
}

mod m20240101_000003_create_items_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // item_number uniqueness is enforced among *active* items at the
            // command layer; the column itself stays nullable and unconstrained.
            manager
                .create_table(
                    Table::create()
                        .table(Items::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Items::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Items::Name).string().not_null())
                        .col(ColumnDef::new(Items::ItemNumber).string().null())
                        .col(ColumnDef::new(Items::Manufacturer).string().null())
                        .col(
                            ColumnDef::new(Items::IsRequired)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Items::RequiredQuantity)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Items::MinimumThreshold)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Items::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(ColumnDef::new(Items::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Items::DeletedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_items_item_number")
                        .table(Items::Table)
                        .col(Items::ItemNumber)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Items::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Items {
        Table,
        Id,
        Name,
        ItemNumber,
        Manufacturer,
        IsRequired,
        RequiredQuantity,
        MinimumThreshold,
        IsActive,
        CreatedAt,
        DeletedAt,
    }
}

mod m20240101_000004_create_inventory_records_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_inventory_records_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(InventoryRecords::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryRecords::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(InventoryRecords::ItemId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryRecords::LocationId)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryRecords::Section).string_len(5).null())
                        .col(
                            ColumnDef::new(InventoryRecords::Quantity)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(InventoryRecords::ExpirationDate)
                                .date()
                                .null(),
                        )
                        .col(ColumnDef::new(InventoryRecords::LotNumber).string().null())
                        .col(
                            ColumnDef::new(InventoryRecords::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(InventoryRecords::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryRecords::DeletedAt).timestamp().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_inventory_records_item_id")
                                .from(InventoryRecords::Table, InventoryRecords::ItemId)
                                .to(Items::Table, Items::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_inventory_records_location_id")
                                .from(InventoryRecords::Table, InventoryRecords::LocationId)
                                .to(Locations::Table, Locations::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_records_item_id")
                        .table(InventoryRecords::Table)
                        .col(InventoryRecords::ItemId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_records_location_id")
                        .table(InventoryRecords::Table)
                        .col(InventoryRecords::LocationId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InventoryRecords::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum InventoryRecords {
        Table,
        Id,
        ItemId,
        LocationId,
        Section,
        Quantity,
        ExpirationDate,
        LotNumber,
        IsActive,
        CreatedAt,
        DeletedAt,
    }

    #[derive(DeriveIden)]
    enum Items {
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    enum Locations {
        Table,
        Id,
    }
}

mod m20240101_000005_create_inventory_counts_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_inventory_counts_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(InventoryCounts::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryCounts::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(InventoryCounts::LocationId)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryCounts::UserId).integer().not_null())
                        .col(
                            ColumnDef::new(InventoryCounts::CountedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryCounts::Notes).text().null())
                        .col(
                            ColumnDef::new(InventoryCounts::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(InventoryCounts::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryCounts::DeletedAt).timestamp().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_inventory_counts_location_id")
                                .from(InventoryCounts::Table, InventoryCounts::LocationId)
                                .to(Locations::Table, Locations::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_counts_location_id")
                        .table(InventoryCounts::Table)
                        .col(InventoryCounts::LocationId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InventoryCounts::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum InventoryCounts {
        Table,
        Id,
        LocationId,
        UserId,
        CountedAt,
        Notes,
        IsActive,
        CreatedAt,
        DeletedAt,
    }

    #[derive(DeriveIden)]
    enum Locations {
        Table,
        Id,
    }
}

mod m20240101_000006_create_audit_events_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000006_create_audit_events_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Append-only; no deleted_at column on purpose.
            manager
                .create_table(
                    Table::create()
                        .table(AuditEvents::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(AuditEvents::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(AuditEvents::UserId).integer().null())
                        .col(ColumnDef::new(AuditEvents::Action).string().not_null())
                        .col(ColumnDef::new(AuditEvents::TableName).string().not_null())
                        .col(ColumnDef::new(AuditEvents::RecordId).integer().null())
                        .col(ColumnDef::new(AuditEvents::OldValues).text().null())
                        .col(ColumnDef::new(AuditEvents::NewValues).text().null())
                        .col(ColumnDef::new(AuditEvents::LoggedAt).timestamp().not_null())
                        .col(ColumnDef::new(AuditEvents::IpAddress).string().null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(AuditEvents::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum AuditEvents {
        Table,
        Id,
        UserId,
        Action,
        TableName,
        RecordId,
        OldValues,
        NewValues,
        LoggedAt,
        IpAddress,
    }
}
