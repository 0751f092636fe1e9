// `MigrationTrait` is an `async_trait` whose methods take an elided
// `&SchemaManager` lifetime; impls must match it textually (E0195), which
// conflicts with the crate-wide `rust_2018_idioms` deny.
#![allow(elided_lifetimes_in_paths)]

use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_items_table::Migration),
            Box::new(m20240101_000002_create_quotes_table::Migration),
            Box::new(m20240101_000003_create_quote_lines_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240101_000001_create_items_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // No unique index on `code`: uniqueness is only required among
            // non-archived items (case-insensitive) and is enforced by the
            // service-layer check, so an archived item may keep its old code.
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
                        .col(ColumnDef::new(Items::Code).string_len(50).not_null())
                        .col(ColumnDef::new(Items::Name).string_len(200).not_null())
                        .col(ColumnDef::new(Items::Description).text().null())
                        .col(
                            ColumnDef::new(Items::Unit)
                                .string_len(20)
                                .not_null()
                                .default("unit"),
                        )
                        .col(ColumnDef::new(Items::Category).string_len(100).null())
                        .col(
                            ColumnDef::new(Items::StockMin)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Items::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(ColumnDef::new(Items::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Items::UpdatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Items::DeletedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_items_code")
                        .table(Items::Table)
                        .col(Items::Code)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_items_deleted_at")
                        .table(Items::Table)
                        .col(Items::DeletedAt)
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

    #[derive(Iden)]
    pub enum Items {
        Table,
        Id,
        Code,
        Name,
        Description,
        Unit,
        Category,
        StockMin,
        Active,
        CreatedAt,
        UpdatedAt,
        DeletedAt,
    }
}

mod m20240101_000002_create_quotes_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_quotes_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Quotes::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Quotes::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Quotes::Number).string_len(50).not_null())
                        .col(ColumnDef::new(Quotes::CustomerId).integer().null())
                        .col(
                            ColumnDef::new(Quotes::CustomerName)
                                .string_len(200)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Quotes::CustomerEmail).string_len(200).null())
                        .col(
                            ColumnDef::new(Quotes::Status)
                                .string_len(16)
                                .not_null()
                                .default("DRAFT"),
                        )
                        .col(
                            ColumnDef::new(Quotes::TotalAmount)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Quotes::TaxAmount)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Quotes::TotalWithTax)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Quotes::ValidUntil).timestamp().not_null())
                        .col(ColumnDef::new(Quotes::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Quotes::UpdatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Quotes::DeletedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            // The unique index is the backstop for the numbering race: two
            // concurrent creates may compute the same candidate number and the
            // second insert must fail, not overwrite.
            manager
                .create_index(
                    Index::create()
                        .name("idx_quotes_number")
                        .table(Quotes::Table)
                        .col(Quotes::Number)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_quotes_status")
                        .table(Quotes::Table)
                        .col(Quotes::Status)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Quotes::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    pub enum Quotes {
        Table,
        Id,
        Number,
        CustomerId,
        CustomerName,
        CustomerEmail,
        Status,
        TotalAmount,
        TaxAmount,
        TotalWithTax,
        ValidUntil,
        CreatedAt,
        UpdatedAt,
        DeletedAt,
    }
}

mod m20240101_000003_create_quote_lines_table {

    use sea_orm_migration::prelude::*;

    use super::m20240101_000002_create_quotes_table::Quotes;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_quote_lines_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(QuoteLines::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(QuoteLines::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(QuoteLines::QuoteId).integer().not_null())
                        .col(ColumnDef::new(QuoteLines::ItemId).integer().not_null())
                        .col(
                            ColumnDef::new(QuoteLines::ItemCode)
                                .string_len(50)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(QuoteLines::ItemName)
                                .string_len(200)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(QuoteLines::Quantity)
                                .decimal_len(12, 3)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(QuoteLines::UnitPrice)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(QuoteLines::LineTotal)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_quote_lines_quote_id")
                                .from(QuoteLines::Table, QuoteLines::QuoteId)
                                .to(Quotes::Table, Quotes::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_quote_lines_quote_id")
                        .table(QuoteLines::Table)
                        .col(QuoteLines::QuoteId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(QuoteLines::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    pub enum QuoteLines {
        Table,
        Id,
        QuoteId,
        ItemId,
        ItemCode,
        ItemName,
        Quantity,
        UnitPrice,
        LineTotal,
    }
}
