use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PurchaseEvent::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PurchaseEvent::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PurchaseEvent::SessionId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PurchaseEvent::Amount).big_integer().not_null())
                    .col(ColumnDef::new(PurchaseEvent::Currency).string_len(3).not_null())
                    .col(ColumnDef::new(PurchaseEvent::Description).string().not_null())
                    .col(ColumnDef::new(PurchaseEvent::AdType).integer().not_null())
                    .col(ColumnDef::new(PurchaseEvent::Email).string().not_null())
                    .col(ColumnDef::new(PurchaseEvent::JobId).integer().not_null())
                    .col(
                        ColumnDef::new(PurchaseEvent::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(PurchaseEvent::CompletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_purchase_event_job_id")
                            .from(PurchaseEvent::Table, PurchaseEvent::JobId)
                            .to(Job::Table, Job::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_purchase_event_session_id")
                    .table(PurchaseEvent::Table)
                    .col(PurchaseEvent::SessionId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_purchase_event_job_id")
                    .table(PurchaseEvent::Table)
                    .col(PurchaseEvent::JobId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PurchaseEvent::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum PurchaseEvent {
    Table,
    Id,
    SessionId,
    Amount,
    Currency,
    Description,
    AdType,
    Email,
    JobId,
    CreatedAt,
    CompletedAt,
}

#[derive(DeriveIden)]
enum Job {
    Table,
    Id,
}
