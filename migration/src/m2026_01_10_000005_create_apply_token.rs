use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ApplyToken::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ApplyToken::Token)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ApplyToken::JobId).integer().not_null())
                    .col(ColumnDef::new(ApplyToken::Email).string().not_null())
                    .col(ColumnDef::new(ApplyToken::Cv).blob().not_null())
                    .col(
                        ColumnDef::new(ApplyToken::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ApplyToken::ConfirmedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_apply_token_job_id")
                            .from(ApplyToken::Table, ApplyToken::JobId)
                            .to(Job::Table, Job::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // Expiry sweep filters on creation time.
        manager
            .create_index(
                Index::create()
                    .name("idx_apply_token_created_at")
                    .table(ApplyToken::Table)
                    .col(ApplyToken::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ApplyToken::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ApplyToken {
    Table,
    Token,
    JobId,
    Email,
    Cv,
    CreatedAt,
    ConfirmedAt,
}

#[derive(DeriveIden)]
enum Job {
    Table,
    Id,
}
