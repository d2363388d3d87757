use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Job::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Job::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Job::ExternalId).string().not_null())
                    .col(ColumnDef::new(Job::JobTitle).string().not_null())
                    .col(ColumnDef::new(Job::Company).string().not_null())
                    .col(ColumnDef::new(Job::CompanyUrl).string().null())
                    .col(ColumnDef::new(Job::CompanyEmail).string().not_null())
                    .col(ColumnDef::new(Job::Location).string().not_null())
                    .col(
                        ColumnDef::new(Job::SalaryMin)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Job::SalaryMax)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Job::SalaryCurrency).string().not_null())
                    .col(ColumnDef::new(Job::SalaryRange).string().not_null())
                    .col(ColumnDef::new(Job::Description).text().not_null())
                    .col(ColumnDef::new(Job::Perks).text().null())
                    .col(ColumnDef::new(Job::InterviewProcess).text().null())
                    .col(ColumnDef::new(Job::HowToApply).text().not_null())
                    .col(ColumnDef::new(Job::Slug).string().not_null())
                    .col(
                        ColumnDef::new(Job::AdType)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Job::CompanyIconId).string().null())
                    .col(
                        ColumnDef::new(Job::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Job::ApprovedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_job_slug")
                    .table(Job::Table)
                    .col(Job::Slug)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_job_external_id")
                    .table(Job::Table)
                    .col(Job::ExternalId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Listing queries filter on approval and tier, then sort by recency.
        manager
            .create_index(
                Index::create()
                    .name("idx_job_listing")
                    .table(Job::Table)
                    .col(Job::ApprovedAt)
                    .col(Job::AdType)
                    .col(Job::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Job::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Job {
    Table,
    Id,
    ExternalId,
    JobTitle,
    Company,
    CompanyUrl,
    CompanyEmail,
    Location,
    SalaryMin,
    SalaryMax,
    SalaryCurrency,
    SalaryRange,
    Description,
    Perks,
    InterviewProcess,
    HowToApply,
    Slug,
    AdType,
    CompanyIconId,
    CreatedAt,
    ApprovedAt,
}
