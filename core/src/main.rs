//! Symphony core binary
//!
//! Connects to the database and makes sure the schema exists. In demo mode it
//! runs against an in-memory SQLite database and walks through a sample
//! scenario, logging each step.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use symphony_core::adapters::{connect, create_schema, SqlUnitOfWorkFactory};
use symphony_core::{Config, Services};

mod demo;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,symphony_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Symphony core...");

    let config = Config::from_env().context("Failed to load configuration")?;
    if config.demo_mode {
        tracing::info!(url = %config.database.url, "Demo mode enabled");
    }

    tracing::info!("Connecting to database...");
    let db = connect(&config.database)
        .await
        .context("Failed to connect to database")?;
    create_schema(&db)
        .await
        .context("Failed to create database schema")?;

    let uow = Arc::new(SqlUnitOfWorkFactory::new(db));
    let services = Services::new(uow, config.limits);

    if config.demo_mode {
        demo::run(&services).await?;
    }

    tracing::info!("Symphony core ready");
    Ok(())
}
