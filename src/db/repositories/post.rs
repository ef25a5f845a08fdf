//! Post repository
//!
//! Database operations for posts and their tags.
//!
//! This module provides:
//! - `PostRepository` trait defining the interface for post data access
//! - `SqlxPostRepository` implementing the trait for SQLite and MySQL
//!
//! Multi-statement operations (page + count, view increment + read,
//! update + tag replacement) each run inside one transaction.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySql, MySqlConnection, MySqlPool, Sqlite, SqliteConnection, SqlitePool};

use super::args::{bind_args, escape_like, now, placeholders, SqlArg};
use super::comment::CommentRow;
use crate::db::{Backend, DynDatabasePool};
use crate::models::{
    normalize_tags, Comment, CommentStatus, CreatePostInput, PageRequest, Post, PostClause,
    PostPredicate, PostWithCommentCount, Sort, UpdatePostInput,
};

/// A post read for display, with its approved comments and total comment count
#[derive(Debug, Clone)]
pub struct PostThreadRecord {
    pub post: Post,
    /// Approved comments of every depth, oldest first
    pub comments: Vec<Comment>,
    /// Comments on the post in any status
    pub comment_count: i64,
}

/// Post repository trait
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Create a post owned by `author_id`
    async fn create(&self, author_id: i64, input: &CreatePostInput) -> Result<Post>;

    /// Get a post by ID without touching its view counter
    async fn get_by_id(&self, id: i64) -> Result<Option<Post>>;

    /// Owner of a post, or `None` if the post does not exist
    async fn get_author_id(&self, id: i64) -> Result<Option<i64>>;

    /// One page of posts matching `predicate`, plus the total match count
    async fn list(&self, predicate: &PostPredicate, page: &PageRequest)
        -> Result<(Vec<Post>, i64)>;

    /// Increment the view counter and read the post with its comments.
    ///
    /// Returns `None` if the post does not exist.
    async fn view(&self, id: i64) -> Result<Option<PostThreadRecord>>;

    /// Every post by `author_id`, newest first, with comment counts, plus the total
    async fn list_by_author(&self, author_id: i64)
        -> Result<(Vec<PostWithCommentCount>, i64)>;

    /// Apply `input` to a post.
    ///
    /// With `owner` set, the write only matches if the post still belongs to
    /// that user. Returns `None` when no row matched.
    async fn update(
        &self,
        id: i64,
        owner: Option<i64>,
        input: &UpdatePostInput,
    ) -> Result<Option<Post>>;

    /// Delete a post; `owner` scopes the delete like in [`PostRepository::update`]
    async fn delete(&self, id: i64, owner: Option<i64>) -> Result<bool>;
}

/// SQLx-based post repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxPostRepository {
    pool: DynDatabasePool,
}

impl SqlxPostRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn PostRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl PostRepository for SqlxPostRepository {
    async fn create(&self, author_id: i64, input: &CreatePostInput) -> Result<Post> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => create_post_sqlite(pool, author_id, input).await,
            Backend::Mysql(pool) => create_post_mysql(pool, author_id, input).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Post>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                let mut conn = pool.acquire().await?;
                get_post_sqlite(&mut conn, id).await
            }
            Backend::Mysql(pool) => {
                let mut conn = pool.acquire().await?;
                get_post_mysql(&mut conn, id).await
            }
        }
    }

    async fn get_author_id(&self, id: i64) -> Result<Option<i64>> {
        let row: Option<(i64,)> = match self.pool.backend() {
            Backend::Sqlite(pool) => {
                sqlx::query_as::<Sqlite, (i64,)>(SELECT_AUTHOR_ID)
                    .bind(id)
                    .fetch_optional(pool)
                    .await
            }
            Backend::Mysql(pool) => {
                sqlx::query_as::<MySql, (i64,)>(SELECT_AUTHOR_ID)
                    .bind(id)
                    .fetch_optional(pool)
                    .await
            }
        }
        .context("Failed to look up post owner")?;
        Ok(row.map(|(author_id,)| author_id))
    }

    async fn list(
        &self,
        predicate: &PostPredicate,
        page: &PageRequest,
    ) -> Result<(Vec<Post>, i64)> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => list_posts_sqlite(pool, predicate, page).await,
            Backend::Mysql(pool) => list_posts_mysql(pool, predicate, page).await,
        }
    }

    async fn view(&self, id: i64) -> Result<Option<PostThreadRecord>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => view_post_sqlite(pool, id).await,
            Backend::Mysql(pool) => view_post_mysql(pool, id).await,
        }
    }

    async fn list_by_author(&self, author_id: i64) -> Result<(Vec<PostWithCommentCount>, i64)> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => list_by_author_sqlite(pool, author_id).await,
            Backend::Mysql(pool) => list_by_author_mysql(pool, author_id).await,
        }
    }

    async fn update(
        &self,
        id: i64,
        owner: Option<i64>,
        input: &UpdatePostInput,
    ) -> Result<Option<Post>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => update_post_sqlite(pool, id, owner, input).await,
            Backend::Mysql(pool) => update_post_mysql(pool, id, owner, input).await,
        }
    }

    async fn delete(&self, id: i64, owner: Option<i64>) -> Result<bool> {
        let (sql, args) = owner_scoped("DELETE FROM posts WHERE id = ?", id, owner);
        let result = match self.pool.backend() {
            Backend::Sqlite(pool) => bind_args!(sqlx::query::<Sqlite>(&sql), &args)
                .execute(pool)
                .await
                .map(|r| r.rows_affected()),
            Backend::Mysql(pool) => bind_args!(sqlx::query::<MySql>(&sql), &args)
                .execute(pool)
                .await
                .map(|r| r.rows_affected()),
        }
        .with_context(|| format!("Failed to delete post {}", id))?;
        Ok(result > 0)
    }
}

// ============================================================================
// Shared SQL
// ============================================================================

const SELECT_POST: &str = "SELECT p.id, p.title, p.content, p.is_featured, p.status, p.views, \
     p.author_id, p.created_at, p.updated_at FROM posts p";

const SELECT_POST_WITH_COUNT: &str = "SELECT p.id, p.title, p.content, p.is_featured, p.status, \
     p.views, p.author_id, p.created_at, p.updated_at, \
     (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comment_count FROM posts p";

const SELECT_AUTHOR_ID: &str = "SELECT author_id FROM posts WHERE id = ?";

const SELECT_TAGS: &str = "SELECT tag FROM post_tags WHERE post_id = ?";

const INSERT_TAG: &str = "INSERT INTO post_tags (post_id, tag) VALUES (?, ?)";

const DELETE_TAGS: &str = "DELETE FROM post_tags WHERE post_id = ?";

const INCREMENT_VIEWS: &str = "UPDATE posts SET views = views + 1 WHERE id = ?";

const SELECT_THREAD_COMMENTS: &str = "SELECT c.id, c.content, c.status, c.author_id, c.post_id, \
     c.parent_id, c.created_at, c.updated_at FROM comments c \
     WHERE c.post_id = ? AND c.status = ? ORDER BY c.created_at ASC, c.id ASC";

const COUNT_POST_COMMENTS: &str = "SELECT COUNT(*) FROM comments WHERE post_id = ?";

const COUNT_AUTHOR_POSTS: &str = "SELECT COUNT(*) FROM posts WHERE author_id = ?";

const INSERT_POST: &str = "INSERT INTO posts \
     (title, content, is_featured, status, views, author_id, created_at, updated_at) \
     VALUES (?, ?, ?, ?, 0, ?, ?, ?)";

#[derive(Debug, sqlx::FromRow)]
struct PostRow {
    id: i64,
    title: String,
    content: String,
    is_featured: bool,
    status: String,
    views: i64,
    author_id: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PostRow {
    fn into_post(self, mut tags: Vec<String>) -> Result<Post> {
        tags.sort();
        Ok(Post {
            id: self.id,
            title: self.title,
            content: self.content,
            tags,
            is_featured: self.is_featured,
            status: self.status.parse().map_err(anyhow::Error::msg)?,
            views: self.views,
            author_id: self.author_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PostCountRow {
    #[sqlx(flatten)]
    post: PostRow,
    comment_count: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct TagRow {
    post_id: i64,
    tag: String,
}

/// Render a predicate as a ` WHERE ...` fragment over `posts p`.
///
/// Clauses are joined with AND. An empty predicate renders as an empty string.
pub(crate) fn render_predicate(predicate: &PostPredicate) -> (String, Vec<SqlArg>) {
    let mut conditions: Vec<String> = Vec::new();
    let mut args = Vec::new();

    for clause in predicate.clauses() {
        match clause {
            PostClause::Search(term) => {
                let lowered = term.to_lowercase();
                let pattern = format!("%{}%", escape_like(&lowered));
                conditions.push(
                    "(LOWER(p.title) LIKE ? ESCAPE '!' OR LOWER(p.content) LIKE ? ESCAPE '!' \
                     OR EXISTS (SELECT 1 FROM post_tags st WHERE st.post_id = p.id AND LOWER(st.tag) = ?))"
                        .to_string(),
                );
                args.push(SqlArg::Text(pattern.clone()));
                args.push(SqlArg::Text(pattern));
                args.push(SqlArg::Text(lowered));
            }
            PostClause::HasAllTags(tags) => {
                if tags.is_empty() {
                    continue;
                }
                conditions.push(format!(
                    "(SELECT COUNT(*) FROM post_tags tt WHERE tt.post_id = p.id AND tt.tag IN ({})) = ?",
                    placeholders(tags.len())
                ));
                args.extend(tags.iter().cloned().map(SqlArg::Text));
                args.push(SqlArg::Int(tags.len() as i64));
            }
            PostClause::Featured(flag) => {
                conditions.push("p.is_featured = ?".to_string());
                args.push(SqlArg::Bool(*flag));
            }
            PostClause::Status(status) => {
                conditions.push("p.status = ?".to_string());
                args.push(SqlArg::Text(status.as_str().to_string()));
            }
            PostClause::Author(author_id) => {
                conditions.push("p.author_id = ?".to_string());
                args.push(SqlArg::Int(*author_id));
            }
        }
    }

    if conditions.is_empty() {
        (String::new(), args)
    } else {
        (format!(" WHERE {}", conditions.join(" AND ")), args)
    }
}

/// ` ORDER BY ...` with the id as tie-breaker in the same direction
fn order_clause(sort: &Sort) -> String {
    let direction = sort.order.as_sql();
    format!(
        " ORDER BY p.{} {}, p.id {}",
        sort.field.column(),
        direction,
        direction
    )
}

/// Append `AND author_id = ?` when the write is scoped to an owner
fn owner_scoped(base: &str, id: i64, owner: Option<i64>) -> (String, Vec<SqlArg>) {
    let mut args = vec![SqlArg::Int(id)];
    let sql = match owner {
        Some(author_id) => {
            args.push(SqlArg::Int(author_id));
            format!("{} AND author_id = ?", base)
        }
        None => base.to_string(),
    };
    (sql, args)
}

/// `UPDATE posts SET ...` for the fields present in `input`; `updated_at` always moves
fn update_statement(
    id: i64,
    owner: Option<i64>,
    input: &UpdatePostInput,
    now: DateTime<Utc>,
) -> (String, Vec<SqlArg>) {
    let mut assignments = Vec::new();
    let mut args = Vec::new();

    if let Some(title) = &input.title {
        assignments.push("title = ?");
        args.push(SqlArg::Text(title.clone()));
    }
    if let Some(content) = &input.content {
        assignments.push("content = ?");
        args.push(SqlArg::Text(content.clone()));
    }
    if let Some(is_featured) = input.is_featured {
        assignments.push("is_featured = ?");
        args.push(SqlArg::Bool(is_featured));
    }
    if let Some(status) = input.status {
        assignments.push("status = ?");
        args.push(SqlArg::Text(status.as_str().to_string()));
    }
    assignments.push("updated_at = ?");
    args.push(SqlArg::Time(now));

    let (scope, scope_args) = owner_scoped(
        &format!("UPDATE posts SET {} WHERE id = ?", assignments.join(", ")),
        id,
        owner,
    );
    args.extend(scope_args);
    (scope, args)
}

fn attach_tags(rows: Vec<PostRow>, tags: Vec<TagRow>) -> Result<Vec<Post>> {
    let mut by_post: HashMap<i64, Vec<String>> = HashMap::new();
    for row in tags {
        by_post.entry(row.post_id).or_default().push(row.tag);
    }
    rows.into_iter()
        .map(|row| {
            let tags = by_post.remove(&row.id).unwrap_or_default();
            row.into_post(tags)
        })
        .collect()
}

fn tags_for_posts_sql(count: usize) -> String {
    format!(
        "SELECT post_id, tag FROM post_tags WHERE post_id IN ({})",
        placeholders(count)
    )
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_post_sqlite(
    pool: &SqlitePool,
    author_id: i64,
    input: &CreatePostInput,
) -> Result<Post> {
    let now = now();
    let status = input.status.unwrap_or_default();
    let tags = normalize_tags(&input.tags);

    let mut tx = pool.begin().await?;
    let result = sqlx::query(INSERT_POST)
        .bind(&input.title)
        .bind(&input.content)
        .bind(input.is_featured)
        .bind(status.as_str())
        .bind(author_id)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .context("Failed to insert post")?;
    let id = result.last_insert_rowid();
    insert_tags_sqlite(&mut tx, id, &tags).await?;
    tx.commit().await?;

    Ok(Post {
        id,
        title: input.title.clone(),
        content: input.content.clone(),
        tags,
        is_featured: input.is_featured,
        status,
        views: 0,
        author_id,
        created_at: now,
        updated_at: now,
    })
}

async fn insert_tags_sqlite(conn: &mut SqliteConnection, post_id: i64, tags: &[String]) -> Result<()> {
    for tag in tags {
        sqlx::query(INSERT_TAG)
            .bind(post_id)
            .bind(tag)
            .execute(&mut *conn)
            .await
            .with_context(|| format!("Failed to tag post {} with {}", post_id, tag))?;
    }
    Ok(())
}

async fn get_post_sqlite(conn: &mut SqliteConnection, id: i64) -> Result<Option<Post>> {
    let row = sqlx::query_as::<Sqlite, PostRow>(&format!("{} WHERE p.id = ?", SELECT_POST))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .context("Failed to load post")?;
    let Some(row) = row else {
        return Ok(None);
    };
    let tags: Vec<(String,)> = sqlx::query_as(SELECT_TAGS)
        .bind(id)
        .fetch_all(&mut *conn)
        .await
        .context("Failed to load post tags")?;
    row.into_post(tags.into_iter().map(|(tag,)| tag).collect())
        .map(Some)
}

async fn load_tags_sqlite(conn: &mut SqliteConnection, rows: Vec<PostRow>) -> Result<Vec<Post>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<SqlArg> = rows.iter().map(|r| SqlArg::Int(r.id)).collect();
    let sql = tags_for_posts_sql(ids.len());
    let tags = bind_args!(sqlx::query_as::<Sqlite, TagRow>(&sql), &ids)
        .fetch_all(&mut *conn)
        .await
        .context("Failed to load post tags")?;
    attach_tags(rows, tags)
}

async fn list_posts_sqlite(
    pool: &SqlitePool,
    predicate: &PostPredicate,
    page: &PageRequest,
) -> Result<(Vec<Post>, i64)> {
    let (filter, mut args) = render_predicate(predicate);
    let count_sql = format!("SELECT COUNT(*) FROM posts p{}", filter);
    let page_sql = format!(
        "{}{}{} LIMIT ? OFFSET ?",
        SELECT_POST,
        filter,
        order_clause(&page.sort)
    );

    let mut tx = pool.begin().await?;
    let (total,) = bind_args!(sqlx::query_as::<Sqlite, (i64,)>(&count_sql), &args)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to count posts")?;

    args.push(SqlArg::Int(i64::from(page.limit)));
    args.push(SqlArg::Int(page.skip()));
    let rows = bind_args!(sqlx::query_as::<Sqlite, PostRow>(&page_sql), &args)
        .fetch_all(&mut *tx)
        .await
        .context("Failed to list posts")?;
    let posts = load_tags_sqlite(&mut tx, rows).await?;
    tx.commit().await?;

    Ok((posts, total))
}

async fn view_post_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<PostThreadRecord>> {
    let mut tx = pool.begin().await?;
    let bumped = sqlx::query(INCREMENT_VIEWS)
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to increment views")?
        .rows_affected();
    if bumped == 0 {
        return Ok(None);
    }

    let post = get_post_sqlite(&mut tx, id)
        .await?
        .with_context(|| format!("Post {} vanished while being read", id))?;
    let comments = sqlx::query_as::<Sqlite, CommentRow>(SELECT_THREAD_COMMENTS)
        .bind(id)
        .bind(CommentStatus::Approved.as_str())
        .fetch_all(&mut *tx)
        .await
        .context("Failed to load comments")?
        .into_iter()
        .map(CommentRow::into_comment)
        .collect::<Result<Vec<_>>>()?;
    let (comment_count,) = sqlx::query_as::<Sqlite, (i64,)>(COUNT_POST_COMMENTS)
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to count comments")?;
    tx.commit().await?;

    Ok(Some(PostThreadRecord {
        post,
        comments,
        comment_count,
    }))
}

async fn list_by_author_sqlite(
    pool: &SqlitePool,
    author_id: i64,
) -> Result<(Vec<PostWithCommentCount>, i64)> {
    let sql = format!(
        "{} WHERE p.author_id = ? ORDER BY p.created_at DESC, p.id DESC",
        SELECT_POST_WITH_COUNT
    );

    let mut tx = pool.begin().await?;
    let rows = sqlx::query_as::<Sqlite, PostCountRow>(&sql)
        .bind(author_id)
        .fetch_all(&mut *tx)
        .await
        .context("Failed to list author posts")?;
    let (total,) = sqlx::query_as::<Sqlite, (i64,)>(COUNT_AUTHOR_POSTS)
        .bind(author_id)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to count author posts")?;

    let counts: Vec<i64> = rows.iter().map(|r| r.comment_count).collect();
    let posts = load_tags_sqlite(&mut tx, rows.into_iter().map(|r| r.post).collect()).await?;
    tx.commit().await?;

    Ok((with_counts(posts, counts), total))
}

async fn update_post_sqlite(
    pool: &SqlitePool,
    id: i64,
    owner: Option<i64>,
    input: &UpdatePostInput,
) -> Result<Option<Post>> {
    let (sql, args) = update_statement(id, owner, input, now());

    let mut tx = pool.begin().await?;
    let matched = bind_args!(sqlx::query::<Sqlite>(&sql), &args)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("Failed to update post {}", id))?
        .rows_affected();
    if matched == 0 {
        return Ok(None);
    }

    if let Some(tags) = &input.tags {
        sqlx::query(DELETE_TAGS)
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to clear post tags")?;
        insert_tags_sqlite(&mut tx, id, &normalize_tags(tags)).await?;
    }

    let post = get_post_sqlite(&mut tx, id).await?;
    tx.commit().await?;
    Ok(post)
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_post_mysql(
    pool: &MySqlPool,
    author_id: i64,
    input: &CreatePostInput,
) -> Result<Post> {
    let now = now();
    let status = input.status.unwrap_or_default();
    let tags = normalize_tags(&input.tags);

    let mut tx = pool.begin().await?;
    let result = sqlx::query(INSERT_POST)
        .bind(&input.title)
        .bind(&input.content)
        .bind(input.is_featured)
        .bind(status.as_str())
        .bind(author_id)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .context("Failed to insert post")?;
    let id = result.last_insert_id() as i64;
    insert_tags_mysql(&mut tx, id, &tags).await?;
    tx.commit().await?;

    Ok(Post {
        id,
        title: input.title.clone(),
        content: input.content.clone(),
        tags,
        is_featured: input.is_featured,
        status,
        views: 0,
        author_id,
        created_at: now,
        updated_at: now,
    })
}

async fn insert_tags_mysql(conn: &mut MySqlConnection, post_id: i64, tags: &[String]) -> Result<()> {
    for tag in tags {
        sqlx::query(INSERT_TAG)
            .bind(post_id)
            .bind(tag)
            .execute(&mut *conn)
            .await
            .with_context(|| format!("Failed to tag post {} with {}", post_id, tag))?;
    }
    Ok(())
}

async fn get_post_mysql(conn: &mut MySqlConnection, id: i64) -> Result<Option<Post>> {
    let row = sqlx::query_as::<MySql, PostRow>(&format!("{} WHERE p.id = ?", SELECT_POST))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .context("Failed to load post")?;
    let Some(row) = row else {
        return Ok(None);
    };
    let tags: Vec<(String,)> = sqlx::query_as(SELECT_TAGS)
        .bind(id)
        .fetch_all(&mut *conn)
        .await
        .context("Failed to load post tags")?;
    row.into_post(tags.into_iter().map(|(tag,)| tag).collect())
        .map(Some)
}

async fn load_tags_mysql(conn: &mut MySqlConnection, rows: Vec<PostRow>) -> Result<Vec<Post>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<SqlArg> = rows.iter().map(|r| SqlArg::Int(r.id)).collect();
    let sql = tags_for_posts_sql(ids.len());
    let tags = bind_args!(sqlx::query_as::<MySql, TagRow>(&sql), &ids)
        .fetch_all(&mut *conn)
        .await
        .context("Failed to load post tags")?;
    attach_tags(rows, tags)
}

async fn list_posts_mysql(
    pool: &MySqlPool,
    predicate: &PostPredicate,
    page: &PageRequest,
) -> Result<(Vec<Post>, i64)> {
    let (filter, mut args) = render_predicate(predicate);
    let count_sql = format!("SELECT COUNT(*) FROM posts p{}", filter);
    let page_sql = format!(
        "{}{}{} LIMIT ? OFFSET ?",
        SELECT_POST,
        filter,
        order_clause(&page.sort)
    );

    let mut tx = pool.begin().await?;
    let (total,) = bind_args!(sqlx::query_as::<MySql, (i64,)>(&count_sql), &args)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to count posts")?;

    args.push(SqlArg::Int(i64::from(page.limit)));
    args.push(SqlArg::Int(page.skip()));
    let rows = bind_args!(sqlx::query_as::<MySql, PostRow>(&page_sql), &args)
        .fetch_all(&mut *tx)
        .await
        .context("Failed to list posts")?;
    let posts = load_tags_mysql(&mut tx, rows).await?;
    tx.commit().await?;

    Ok((posts, total))
}

async fn view_post_mysql(pool: &MySqlPool, id: i64) -> Result<Option<PostThreadRecord>> {
    let mut tx = pool.begin().await?;
    let bumped = sqlx::query(INCREMENT_VIEWS)
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to increment views")?
        .rows_affected();
    if bumped == 0 {
        return Ok(None);
    }

    let post = get_post_mysql(&mut tx, id)
        .await?
        .with_context(|| format!("Post {} vanished while being read", id))?;
    let comments = sqlx::query_as::<MySql, CommentRow>(SELECT_THREAD_COMMENTS)
        .bind(id)
        .bind(CommentStatus::Approved.as_str())
        .fetch_all(&mut *tx)
        .await
        .context("Failed to load comments")?
        .into_iter()
        .map(CommentRow::into_comment)
        .collect::<Result<Vec<_>>>()?;
    let (comment_count,) = sqlx::query_as::<MySql, (i64,)>(COUNT_POST_COMMENTS)
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to count comments")?;
    tx.commit().await?;

    Ok(Some(PostThreadRecord {
        post,
        comments,
        comment_count,
    }))
}

async fn list_by_author_mysql(
    pool: &MySqlPool,
    author_id: i64,
) -> Result<(Vec<PostWithCommentCount>, i64)> {
    let sql = format!(
        "{} WHERE p.author_id = ? ORDER BY p.created_at DESC, p.id DESC",
        SELECT_POST_WITH_COUNT
    );

    let mut tx = pool.begin().await?;
    let rows = sqlx::query_as::<MySql, PostCountRow>(&sql)
        .bind(author_id)
        .fetch_all(&mut *tx)
        .await
        .context("Failed to list author posts")?;
    let (total,) = sqlx::query_as::<MySql, (i64,)>(COUNT_AUTHOR_POSTS)
        .bind(author_id)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to count author posts")?;

    let counts: Vec<i64> = rows.iter().map(|r| r.comment_count).collect();
    let posts = load_tags_mysql(&mut tx, rows.into_iter().map(|r| r.post).collect()).await?;
    tx.commit().await?;

    Ok((with_counts(posts, counts), total))
}

async fn update_post_mysql(
    pool: &MySqlPool,
    id: i64,
    owner: Option<i64>,
    input: &UpdatePostInput,
) -> Result<Option<Post>> {
    let (sql, args) = update_statement(id, owner, input, now());

    let mut tx = pool.begin().await?;
    let matched = bind_args!(sqlx::query::<MySql>(&sql), &args)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("Failed to update post {}", id))?
        .rows_affected();
    if matched == 0 {
        return Ok(None);
    }

    if let Some(tags) = &input.tags {
        sqlx::query(DELETE_TAGS)
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to clear post tags")?;
        insert_tags_mysql(&mut tx, id, &normalize_tags(tags)).await?;
    }

    let post = get_post_mysql(&mut tx, id).await?;
    tx.commit().await?;
    Ok(post)
}

fn with_counts(posts: Vec<Post>, counts: Vec<i64>) -> Vec<PostWithCommentCount> {
    posts
        .into_iter()
        .zip(counts)
        .map(|(post, comment_count)| PostWithCommentCount {
            post,
            comment_count,
        })
        .collect()
}
