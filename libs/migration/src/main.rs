//! `cargo run -p migration -- up` applies the catalog schema and seed data.
//! Reads `DATABASE_URL`.

use sea_orm_migration::cli;

#[tokio::main]
async fn main() {
    cli::run_cli(migration::Migrator).await;
}
