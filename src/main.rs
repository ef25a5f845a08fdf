//! Quill maintenance binary
//!
//! Connects to the configured database, applies migrations, seeds the
//! administrator account and logs a statistics snapshot.

use anyhow::Result;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quill::{
    config::Config,
    db::{
        self,
        repositories::{SqlxStatsRepository, SqlxUserRepository},
    },
    services::{seed_admin, StatsService},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quill=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {:?}", config.database.driver);

    // Run migrations
    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    match &config.admin {
        Some(admin) => {
            let users = SqlxUserRepository::new(pool.clone());
            seed_admin(&users, admin).await?;
        }
        None => tracing::info!("No admin account configured, skipping seed"),
    }

    let stats = StatsService::new(SqlxStatsRepository::boxed(pool.clone()))
        .get_stats()
        .await?;
    tracing::info!(
        "{} posts ({} published, {} draft, {} archived), {} views, {} comments ({} approved, {} rejected), {} admins, {} users",
        stats.post_count,
        stats.published_posts,
        stats.draft_posts,
        stats.archived_posts,
        stats.total_views,
        stats.total_comments,
        stats.approved_comments,
        stats.rejected_comments,
        stats.total_admins,
        stats.total_users
    );

    pool.close().await;
    Ok(())
}
