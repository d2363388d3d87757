//! Database migrations for the job board.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2026_01_10_000001_create_job;
mod m2026_01_10_000002_create_edit_token;
mod m2026_01_10_000003_create_purchase_event;
mod m2026_01_10_000004_create_job_event;
mod m2026_01_10_000005_create_apply_token;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2026_01_10_000001_create_job::Migration),
            Box::new(m2026_01_10_000002_create_edit_token::Migration),
            Box::new(m2026_01_10_000003_create_purchase_event::Migration),
            Box::new(m2026_01_10_000004_create_job_event::Migration),
            Box::new(m2026_01_10_000005_create_apply_token::Migration),
        ]
    }
}
