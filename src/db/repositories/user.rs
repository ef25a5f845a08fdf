//! User repository
//!
//! Database operations for the local mirror of user accounts.
//!
//! This module provides:
//! - `UserRepository` trait defining the interface for user data access
//! - `SqlxUserRepository` implementing the trait for SQLite and MySQL

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySql, Sqlite};

use super::args::now;
use crate::db::{Backend, DynDatabasePool};
use crate::models::{CreateUserInput, User, UserStatus};

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user; new users are active
    async fn create(&self, input: &CreateUserInput) -> Result<User>;

    /// Get user by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Get user by email
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Change a user's account status; returns false if the user does not exist
    async fn set_status(&self, id: i64, status: UserStatus) -> Result<bool>;
}

/// SQLx-based user repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxUserRepository {
    pool: DynDatabasePool,
}

impl SqlxUserRepository {
    /// Create a new SQLx user repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }
}

const SELECT_USER: &str =
    "SELECT id, name, email, email_verified, role, status, created_at FROM users";

const INSERT_USER: &str = "INSERT INTO users (name, email, email_verified, role, status, created_at) \
     VALUES (?, ?, ?, ?, ?, ?)";

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    name: String,
    email: String,
    email_verified: bool,
    role: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> Result<User> {
        Ok(User {
            id: self.id,
            name: self.name,
            email: self.email,
            email_verified: self.email_verified,
            role: self.role.parse()?,
            status: self.status.parse()?,
            created_at: self.created_at,
        })
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, input: &CreateUserInput) -> Result<User> {
        let now = now();
        let status = UserStatus::Active;
        let id = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query(INSERT_USER)
                .bind(&input.name)
                .bind(&input.email)
                .bind(input.email_verified)
                .bind(input.role.as_str())
                .bind(status.as_str())
                .bind(now)
                .execute(pool)
                .await
                .map(|r| r.last_insert_rowid()),
            Backend::Mysql(pool) => sqlx::query(INSERT_USER)
                .bind(&input.name)
                .bind(&input.email)
                .bind(input.email_verified)
                .bind(input.role.as_str())
                .bind(status.as_str())
                .bind(now)
                .execute(pool)
                .await
                .map(|r| r.last_insert_id() as i64),
        }
        .with_context(|| format!("Failed to create user {}", input.email))?;

        Ok(User {
            id,
            name: input.name.clone(),
            email: input.email.clone(),
            email_verified: input.email_verified,
            role: input.role,
            status,
            created_at: now,
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let sql = format!("{} WHERE id = ?", SELECT_USER);
        let row = match self.pool.backend() {
            Backend::Sqlite(pool) => {
                sqlx::query_as::<Sqlite, UserRow>(&sql)
                    .bind(id)
                    .fetch_optional(pool)
                    .await
            }
            Backend::Mysql(pool) => {
                sqlx::query_as::<MySql, UserRow>(&sql)
                    .bind(id)
                    .fetch_optional(pool)
                    .await
            }
        }
        .with_context(|| format!("Failed to load user {}", id))?;
        row.map(UserRow::into_user).transpose()
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let sql = format!("{} WHERE email = ?", SELECT_USER);
        let row = match self.pool.backend() {
            Backend::Sqlite(pool) => {
                sqlx::query_as::<Sqlite, UserRow>(&sql)
                    .bind(email)
                    .fetch_optional(pool)
                    .await
            }
            Backend::Mysql(pool) => {
                sqlx::query_as::<MySql, UserRow>(&sql)
                    .bind(email)
                    .fetch_optional(pool)
                    .await
            }
        }
        .context("Failed to look up user by email")?;
        row.map(UserRow::into_user).transpose()
    }

    async fn set_status(&self, id: i64, status: UserStatus) -> Result<bool> {
        let sql = "UPDATE users SET status = ? WHERE id = ?";
        let updated = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query(sql)
                .bind(status.as_str())
                .bind(id)
                .execute(pool)
                .await
                .map(|r| r.rows_affected()),
            Backend::Mysql(pool) => sqlx::query(sql)
                .bind(status.as_str())
                .bind(id)
                .execute(pool)
                .await
                .map(|r| r.rows_affected()),
        }
        .with_context(|| format!("Failed to update status of user {}", id))?;
        Ok(updated > 0)
    }
}
