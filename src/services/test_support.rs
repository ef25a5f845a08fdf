//! Shared fixture for service tests: a migrated in-memory database with an
//! administrator and two regular users.

use std::sync::Arc;

use super::authz::Actor;
use super::comment::CommentService;
use super::pagination::PaginationNormalizer;
use super::post::PostService;
use super::stats::StatsService;
use crate::db::repositories::{
    CommentRepository, PostRepository, SqlxCommentRepository, SqlxPostRepository,
    SqlxStatsRepository, SqlxUserRepository, UserRepository,
};
use crate::db::{create_test_pool, migrations, DynDatabasePool};
use crate::models::{CreatePostInput, CreateUserInput, Post, UserRole};

pub(crate) struct Harness {
    pub pool: DynDatabasePool,
    pub post_repo: Arc<dyn PostRepository>,
    pub comment_repo: Arc<dyn CommentRepository>,
    pub user_repo: Arc<dyn UserRepository>,
    pub posts: PostService,
    pub comments: CommentService,
    pub stats: StatsService,
    pub admin: Actor,
    pub alice: Actor,
    pub bob: Actor,
}

impl Harness {
    pub async fn new() -> Self {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let post_repo = SqlxPostRepository::boxed(pool.clone());
        let comment_repo = SqlxCommentRepository::boxed(pool.clone());
        let user_repo = SqlxUserRepository::boxed(pool.clone());

        let mut actors = Vec::new();
        for (name, role) in [
            ("admin", UserRole::Admin),
            ("alice", UserRole::User),
            ("bob", UserRole::User),
        ] {
            let user = user_repo
                .create(&CreateUserInput::new(
                    name,
                    format!("{}@example.com", name),
                    role,
                ))
                .await
                .expect("Failed to create user");
            actors.push(Actor::new(user.id, user.role));
        }

        Self {
            posts: PostService::new(
                post_repo.clone(),
                user_repo.clone(),
                PaginationNormalizer::default(),
            ),
            comments: CommentService::new(comment_repo.clone(), post_repo.clone()),
            stats: StatsService::new(SqlxStatsRepository::boxed(pool.clone())),
            pool,
            post_repo,
            comment_repo,
            user_repo,
            admin: actors[0],
            alice: actors[1],
            bob: actors[2],
        }
    }

    /// Create a post through the service, panicking on failure
    pub async fn post_as(&self, actor: &Actor, input: CreatePostInput) -> Post {
        self.posts
            .create(input, actor)
            .await
            .expect("Failed to create post")
    }
}
