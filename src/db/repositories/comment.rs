//! Comment repository
//!
//! Author edits and deletes are scoped to the author in the statement itself,
//! and moderation only writes when the stored status is still the one the
//! caller observed. A write that matches no row reports that back instead of
//! failing.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySql, MySqlConnection, MySqlPool, Sqlite, SqliteConnection, SqlitePool};

use super::args::now;
use crate::db::{Backend, DynDatabasePool};
use crate::models::{
    AuthorComment, Comment, CommentStatus, CommentWithPost, CreateCommentInput, PostRef,
    PostSummary,
};

/// Comment repository trait
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Insert a comment; the stored status is the schema default (pending)
    async fn create(&self, author_id: i64, input: &CreateCommentInput) -> Result<Comment>;

    /// Get a comment by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Comment>>;

    /// Get a comment with its post's id and title
    async fn get_with_post(&self, id: i64) -> Result<Option<CommentWithPost>>;

    /// Every comment by `author_id`, newest first, plus the total
    async fn list_by_author(&self, author_id: i64) -> Result<(Vec<AuthorComment>, i64)>;

    /// Replace the content if the comment exists and belongs to `author_id`.
    ///
    /// Status is never written here; it only moves through [`Self::set_status_if`].
    async fn update_owned(&self, id: i64, author_id: i64, content: &str) -> Result<Option<Comment>>;

    /// Delete the comment if it exists and belongs to `author_id`
    async fn delete_owned(&self, id: i64, author_id: i64) -> Result<bool>;

    /// Move a comment from `expected` to `target`.
    ///
    /// Returns `None` if the comment is gone or its status is no longer `expected`.
    async fn set_status_if(
        &self,
        id: i64,
        expected: CommentStatus,
        target: CommentStatus,
    ) -> Result<Option<Comment>>;
}

/// SQLx-based comment repository implementation
pub struct SqlxCommentRepository {
    pool: DynDatabasePool,
}

impl SqlxCommentRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CommentRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CommentRepository for SqlxCommentRepository {
    async fn create(&self, author_id: i64, input: &CreateCommentInput) -> Result<Comment> {
        let now = now();
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                let mut tx = pool.begin().await?;
                let id = sqlx::query(INSERT_COMMENT)
                    .bind(&input.content)
                    .bind(author_id)
                    .bind(input.post_id)
                    .bind(input.parent_id)
                    .bind(now)
                    .bind(now)
                    .execute(&mut *tx)
                    .await
                    .context("Failed to insert comment")?
                    .last_insert_rowid();
                let comment = fetch_comment_sqlite(&mut tx, id).await?;
                tx.commit().await?;
                comment.with_context(|| format!("Comment {} missing after insert", id))
            }
            Backend::Mysql(pool) => {
                let mut tx = pool.begin().await?;
                let id = sqlx::query(INSERT_COMMENT)
                    .bind(&input.content)
                    .bind(author_id)
                    .bind(input.post_id)
                    .bind(input.parent_id)
                    .bind(now)
                    .bind(now)
                    .execute(&mut *tx)
                    .await
                    .context("Failed to insert comment")?
                    .last_insert_id() as i64;
                let comment = fetch_comment_mysql(&mut tx, id).await?;
                tx.commit().await?;
                comment.with_context(|| format!("Comment {} missing after insert", id))
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Comment>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                let mut conn = pool.acquire().await?;
                fetch_comment_sqlite(&mut conn, id).await
            }
            Backend::Mysql(pool) => {
                let mut conn = pool.acquire().await?;
                fetch_comment_mysql(&mut conn, id).await
            }
        }
    }

    async fn get_with_post(&self, id: i64) -> Result<Option<CommentWithPost>> {
        let sql = format!(
            "{} JOIN posts p ON p.id = c.post_id WHERE c.id = ?",
            SELECT_COMMENT_WITH_POST
        );
        let row = match self.pool.backend() {
            Backend::Sqlite(pool) => {
                sqlx::query_as::<Sqlite, CommentWithPostRow>(&sql)
                    .bind(id)
                    .fetch_optional(pool)
                    .await
            }
            Backend::Mysql(pool) => {
                sqlx::query_as::<MySql, CommentWithPostRow>(&sql)
                    .bind(id)
                    .fetch_optional(pool)
                    .await
            }
        }
        .with_context(|| format!("Failed to load comment {}", id))?;

        row.map(|row| -> Result<CommentWithPost> {
            let comment = row.comment.into_comment()?;
            Ok(CommentWithPost {
                post: PostRef {
                    id: comment.post_id,
                    title: row.post_title,
                },
                comment,
            })
        })
        .transpose()
    }

    async fn list_by_author(&self, author_id: i64) -> Result<(Vec<AuthorComment>, i64)> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => list_by_author_sqlite(pool, author_id).await,
            Backend::Mysql(pool) => list_by_author_mysql(pool, author_id).await,
        }
    }

    async fn update_owned(&self, id: i64, author_id: i64, content: &str) -> Result<Option<Comment>> {
        let now = now();
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                let mut tx = pool.begin().await?;
                let matched = sqlx::query(UPDATE_OWNED)
                    .bind(content)
                    .bind(now)
                    .bind(id)
                    .bind(author_id)
                    .execute(&mut *tx)
                    .await
                    .with_context(|| format!("Failed to update comment {}", id))?
                    .rows_affected();
                if matched == 0 {
                    return Ok(None);
                }
                let comment = fetch_comment_sqlite(&mut tx, id).await?;
                tx.commit().await?;
                Ok(comment)
            }
            Backend::Mysql(pool) => {
                let mut tx = pool.begin().await?;
                let matched = sqlx::query(UPDATE_OWNED)
                    .bind(content)
                    .bind(now)
                    .bind(id)
                    .bind(author_id)
                    .execute(&mut *tx)
                    .await
                    .with_context(|| format!("Failed to update comment {}", id))?
                    .rows_affected();
                if matched == 0 {
                    return Ok(None);
                }
                let comment = fetch_comment_mysql(&mut tx, id).await?;
                tx.commit().await?;
                Ok(comment)
            }
        }
    }

    async fn delete_owned(&self, id: i64, author_id: i64) -> Result<bool> {
        let deleted = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query(DELETE_OWNED)
                .bind(id)
                .bind(author_id)
                .execute(pool)
                .await
                .map(|r| r.rows_affected()),
            Backend::Mysql(pool) => sqlx::query(DELETE_OWNED)
                .bind(id)
                .bind(author_id)
                .execute(pool)
                .await
                .map(|r| r.rows_affected()),
        }
        .with_context(|| format!("Failed to delete comment {}", id))?;
        Ok(deleted > 0)
    }

    async fn set_status_if(
        &self,
        id: i64,
        expected: CommentStatus,
        target: CommentStatus,
    ) -> Result<Option<Comment>> {
        let now = now();
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                let mut tx = pool.begin().await?;
                let matched = sqlx::query(SET_STATUS_IF)
                    .bind(target.as_str())
                    .bind(now)
                    .bind(id)
                    .bind(expected.as_str())
                    .execute(&mut *tx)
                    .await
                    .with_context(|| format!("Failed to moderate comment {}", id))?
                    .rows_affected();
                if matched == 0 {
                    return Ok(None);
                }
                let comment = fetch_comment_sqlite(&mut tx, id).await?;
                tx.commit().await?;
                Ok(comment)
            }
            Backend::Mysql(pool) => {
                let mut tx = pool.begin().await?;
                let matched = sqlx::query(SET_STATUS_IF)
                    .bind(target.as_str())
                    .bind(now)
                    .bind(id)
                    .bind(expected.as_str())
                    .execute(&mut *tx)
                    .await
                    .with_context(|| format!("Failed to moderate comment {}", id))?
                    .rows_affected();
                if matched == 0 {
                    return Ok(None);
                }
                let comment = fetch_comment_mysql(&mut tx, id).await?;
                tx.commit().await?;
                Ok(comment)
            }
        }
    }
}

const SELECT_COMMENT: &str = "SELECT c.id, c.content, c.status, c.author_id, c.post_id, \
     c.parent_id, c.created_at, c.updated_at FROM comments c";

const SELECT_COMMENT_WITH_POST: &str = "SELECT c.id, c.content, c.status, c.author_id, \
     c.post_id, c.parent_id, c.created_at, c.updated_at, p.title AS post_title FROM comments c";

const SELECT_AUTHOR_COMMENTS: &str = "SELECT c.id, c.content, c.status, c.author_id, \
     c.post_id, c.parent_id, c.created_at, c.updated_at, \
     p.title AS post_title, p.content AS post_content, \
     (SELECT COUNT(*) FROM comments r WHERE r.parent_id = c.id) AS reply_count \
     FROM comments c JOIN posts p ON p.id = c.post_id \
     WHERE c.author_id = ? ORDER BY c.created_at DESC, c.id DESC";

const COUNT_AUTHOR_COMMENTS: &str = "SELECT COUNT(*) FROM comments WHERE author_id = ?";

const INSERT_COMMENT: &str = "INSERT INTO comments \
     (content, author_id, post_id, parent_id, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)";

const UPDATE_OWNED: &str =
    "UPDATE comments SET content = ?, updated_at = ? WHERE id = ? AND author_id = ?";

const DELETE_OWNED: &str = "DELETE FROM comments WHERE id = ? AND author_id = ?";

const SET_STATUS_IF: &str =
    "UPDATE comments SET status = ?, updated_at = ? WHERE id = ? AND status = ?";

/// Comment columns as stored
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct CommentRow {
    id: i64,
    content: String,
    status: String,
    author_id: i64,
    post_id: i64,
    parent_id: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CommentRow {
    pub(crate) fn into_comment(self) -> Result<Comment> {
        Ok(Comment {
            id: self.id,
            content: self.content,
            status: self.status.parse().map_err(anyhow::Error::msg)?,
            author_id: self.author_id,
            post_id: self.post_id,
            parent_id: self.parent_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CommentWithPostRow {
    #[sqlx(flatten)]
    comment: CommentRow,
    post_title: String,
}

#[derive(Debug, sqlx::FromRow)]
struct AuthorCommentRow {
    #[sqlx(flatten)]
    comment: CommentRow,
    post_title: String,
    post_content: String,
    reply_count: i64,
}

impl AuthorCommentRow {
    fn into_author_comment(self) -> Result<AuthorComment> {
        let comment = self.comment.into_comment()?;
        Ok(AuthorComment {
            post: PostSummary {
                id: comment.post_id,
                title: self.post_title,
                content: self.post_content,
            },
            comment,
            reply_count: self.reply_count,
        })
    }
}

// SQLite implementations

async fn fetch_comment_sqlite(conn: &mut SqliteConnection, id: i64) -> Result<Option<Comment>> {
    sqlx::query_as::<Sqlite, CommentRow>(&format!("{} WHERE c.id = ?", SELECT_COMMENT))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .with_context(|| format!("Failed to load comment {}", id))?
        .map(CommentRow::into_comment)
        .transpose()
}

async fn list_by_author_sqlite(
    pool: &SqlitePool,
    author_id: i64,
) -> Result<(Vec<AuthorComment>, i64)> {
    let mut tx = pool.begin().await?;
    let rows = sqlx::query_as::<Sqlite, AuthorCommentRow>(SELECT_AUTHOR_COMMENTS)
        .bind(author_id)
        .fetch_all(&mut *tx)
        .await
        .context("Failed to list author comments")?;
    let (total,) = sqlx::query_as::<Sqlite, (i64,)>(COUNT_AUTHOR_COMMENTS)
        .bind(author_id)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to count author comments")?;
    tx.commit().await?;

    let comments = rows
        .into_iter()
        .map(AuthorCommentRow::into_author_comment)
        .collect::<Result<Vec<_>>>()?;
    Ok((comments, total))
}

// MySQL implementations

async fn fetch_comment_mysql(conn: &mut MySqlConnection, id: i64) -> Result<Option<Comment>> {
    sqlx::query_as::<MySql, CommentRow>(&format!("{} WHERE c.id = ?", SELECT_COMMENT))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .with_context(|| format!("Failed to load comment {}", id))?
        .map(CommentRow::into_comment)
        .transpose()
}

async fn list_by_author_mysql(
    pool: &MySqlPool,
    author_id: i64,
) -> Result<(Vec<AuthorComment>, i64)> {
    let mut tx = pool.begin().await?;
    let rows = sqlx::query_as::<MySql, AuthorCommentRow>(SELECT_AUTHOR_COMMENTS)
        .bind(author_id)
        .fetch_all(&mut *tx)
        .await
        .context("Failed to list author comments")?;
    let (total,) = sqlx::query_as::<MySql, (i64,)>(COUNT_AUTHOR_COMMENTS)
        .bind(author_id)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to count author comments")?;
    tx.commit().await?;

    let comments = rows
        .into_iter()
        .map(AuthorCommentRow::into_author_comment)
        .collect::<Result<Vec<_>>>()?;
    Ok((comments, total))
}
