//! Offline balance repair job.
//!
//! Recomputes every user balance and project spend total from the full
//! allocation and expense history and overwrites the cached fields. Run
//! manually after suspected drift, partial failures or manual data edits,
//! never concurrently with heavy write traffic.

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use viatix_db::RepairRepository;
use viatix_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "viatix=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load()?;

    // Connect to database
    let db = viatix_db::connect(&config.database.url).await?;
    info!("Connected to database");

    let report = RepairRepository::new(db).repair().await?;

    info!(
        users = report.users.len(),
        drifted_users = report.drifted_users(),
        projects = report.projects.len(),
        drifted_projects = report.drifted_projects(),
        "repair complete"
    );

    Ok(())
}
