//! Long-running worker process: consumes note-processing jobs from the
//! durable queue and drives the extraction pipeline.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use mindsift_crypto::{Vault, VaultConfig};
use mindsift_db::Database;
use mindsift_inference::ClientFactory;
use mindsift_jobs::{JobWorker, WorkerConfig};
use mindsift_pipeline::NoteProcessor;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is not set"))?;

    let db = Database::connect(&database_url).await?;
    db.migrate().await?;
    info!("Database ready");

    let vault = Arc::new(Vault::new(&VaultConfig::from_env()?)?);
    let clients = Arc::new(ClientFactory::from_env(vault));

    let processor = Arc::new(NoteProcessor::new(
        db.notes.clone(),
        db.ideas.clone(),
        db.tags.clone(),
        db.settings.clone(),
        clients,
    ));

    let worker = JobWorker::new(db.jobs.clone(), processor, WorkerConfig::from_env());
    let handle = worker.start();

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");
    handle.shutdown().await?;

    Ok(())
}
