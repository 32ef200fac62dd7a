//! Schema tool for the till database.
//!
//! `DATABASE_URL=sqlite:./till.db?mode=rwc cargo run -p migration -- up`
//! (also `down`, `fresh`, `refresh`, `reset`, `status`).
use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    cli::run_cli(migration::Migrator).await;
}
