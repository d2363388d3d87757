use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(JobEvent::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(JobEvent::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(JobEvent::EventType).string_len(32).not_null())
                    .col(ColumnDef::new(JobEvent::JobId).integer().not_null())
                    .col(
                        ColumnDef::new(JobEvent::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_job_event_job_id")
                            .from(JobEvent::Table, JobEvent::JobId)
                            .to(Job::Table, Job::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_job_event_job_id_type")
                    .table(JobEvent::Table)
                    .col(JobEvent::JobId)
                    .col(JobEvent::EventType)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(JobEvent::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum JobEvent {
    Table,
    Id,
    EventType,
    JobId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Job {
    Table,
    Id,
}
