pub use sea_orm_migration::prelude::*;

mod m20261001_000000_till;
mod m20261005_000000_reconciliations;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261001_000000_till::Migration),
            Box::new(m20261005_000000_reconciliations::Migration),
        ]
    }
}
