//! Statistics repository
//!
//! All ten figures come from one statement of scalar subqueries executed in
//! a transaction, so they describe the same database state.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySql, Sqlite};

use crate::db::{Backend, DynDatabasePool};
use crate::models::Stats;

/// Statistics repository trait
#[async_trait]
pub trait StatsRepository: Send + Sync {
    /// Read every aggregate as one snapshot
    async fn snapshot(&self) -> Result<Stats>;
}

/// SQLx-based statistics repository implementation
pub struct SqlxStatsRepository {
    pool: DynDatabasePool,
}

impl SqlxStatsRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn StatsRepository> {
        Arc::new(Self::new(pool))
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StatsRow {
    post_count: i64,
    published_posts: i64,
    draft_posts: i64,
    archived_posts: i64,
    total_views: i64,
    total_comments: i64,
    approved_comments: i64,
    rejected_comments: i64,
    total_admins: i64,
    total_users: i64,
}

impl From<StatsRow> for Stats {
    fn from(row: StatsRow) -> Self {
        Stats {
            post_count: row.post_count,
            published_posts: row.published_posts,
            draft_posts: row.draft_posts,
            archived_posts: row.archived_posts,
            total_views: row.total_views,
            total_comments: row.total_comments,
            approved_comments: row.approved_comments,
            rejected_comments: row.rejected_comments,
            total_admins: row.total_admins,
            total_users: row.total_users,
        }
    }
}

/// Build the snapshot statement around a backend-specific views sum
fn snapshot_sql(total_views: &str) -> String {
    format!(
        "SELECT \
         (SELECT COUNT(*) FROM posts) AS post_count, \
         (SELECT COUNT(*) FROM posts WHERE status = 'published') AS published_posts, \
         (SELECT COUNT(*) FROM posts WHERE status = 'draft') AS draft_posts, \
         (SELECT COUNT(*) FROM posts WHERE status = 'archived') AS archived_posts, \
         ({}) AS total_views, \
         (SELECT COUNT(*) FROM comments) AS total_comments, \
         (SELECT COUNT(*) FROM comments WHERE status = 'approved') AS approved_comments, \
         (SELECT COUNT(*) FROM comments WHERE status = 'rejected') AS rejected_comments, \
         (SELECT COUNT(*) FROM users WHERE role = 'admin') AS total_admins, \
         (SELECT COUNT(*) FROM users WHERE role = 'user') AS total_users",
        total_views
    )
}

#[async_trait]
impl StatsRepository for SqlxStatsRepository {
    async fn snapshot(&self) -> Result<Stats> {
        let row = match self.pool.backend() {
            Backend::Sqlite(pool) => {
                let sql = snapshot_sql("SELECT COALESCE(SUM(views), 0) FROM posts");
                let mut tx = pool.begin().await?;
                let row = sqlx::query_as::<Sqlite, StatsRow>(&sql)
                    .fetch_one(&mut *tx)
                    .await
                    .context("Failed to read statistics")?;
                tx.commit().await?;
                row
            }
            Backend::Mysql(pool) => {
                // SUM over BIGINT yields DECIMAL on MySQL
                let sql =
                    snapshot_sql("SELECT CAST(COALESCE(SUM(views), 0) AS SIGNED) FROM posts");
                let mut tx = pool.begin().await?;
                let row = sqlx::query_as::<MySql, StatsRow>(&sql)
                    .fetch_one(&mut *tx)
                    .await
                    .context("Failed to read statistics")?;
                tx.commit().await?;
                row
            }
        };
        Ok(row.into())
    }
}
