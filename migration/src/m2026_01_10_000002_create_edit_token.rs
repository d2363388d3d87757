use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(EditToken::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EditToken::Token)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(EditToken::JobId).integer().not_null())
                    .col(
                        ColumnDef::new(EditToken::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_edit_token_job_id")
                            .from(EditToken::Table, EditToken::JobId)
                            .to(Job::Table, Job::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_edit_token_job_id")
                    .table(EditToken::Table)
                    .col(EditToken::JobId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EditToken::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum EditToken {
    Table,
    Token,
    JobId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Job {
    Table,
    Id,
}
