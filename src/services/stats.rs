//! Statistics aggregator

use std::sync::Arc;

use tracing::debug;

use super::error::ServiceResult;
use crate::db::repositories::StatsRepository;
use crate::models::Stats;

/// Statistics service
pub struct StatsService {
    repo: Arc<dyn StatsRepository>,
}

impl StatsService {
    pub fn new(repo: Arc<dyn StatsRepository>) -> Self {
        Self { repo }
    }

    /// All ten counts as one snapshot; any failed read fails the whole call
    pub async fn get_stats(&self) -> ServiceResult<Stats> {
        let stats = self.repo.snapshot().await?;
        debug!("Statistics snapshot: {:?}", stats);
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CommentStatus, CreateCommentInput, CreatePostInput, PostStatus};
    use crate::services::test_support::Harness;
    use crate::services::ServiceError;

    #[tokio::test]
    async fn test_counts_match_seeded_rows() {
        let h = Harness::new().await;
        let mut post_ids = Vec::new();
        for (status, n) in [
            (PostStatus::Published, 3),
            (PostStatus::Draft, 2),
            (PostStatus::Archived, 1),
        ] {
            for _ in 0..n {
                let post = h
                    .post_as(&h.alice, CreatePostInput::new("t", "c").with_status(status))
                    .await;
                post_ids.push(post.id);
            }
        }
        for (status, n) in [(CommentStatus::Approved, 5), (CommentStatus::Rejected, 2)] {
            for _ in 0..n {
                let comment = h
                    .comments
                    .create(CreateCommentInput::new(post_ids[0], "c"), &h.bob)
                    .await
                    .unwrap();
                h.comments.moderate(comment.id, status).await.unwrap();
            }
        }
        h.posts.get_by_id(post_ids[0]).await.unwrap();
        h.posts.get_by_id(post_ids[1]).await.unwrap();

        let stats = h.stats.get_stats().await.unwrap();
        assert_eq!(
            stats,
            Stats {
                post_count: 6,
                published_posts: 3,
                draft_posts: 2,
                archived_posts: 1,
                total_views: 2,
                total_comments: 7,
                approved_comments: 5,
                rejected_comments: 2,
                total_admins: 1,
                total_users: 2,
            }
        );
    }

    #[tokio::test]
    async fn test_failure_aborts_whole_snapshot() {
        let h = Harness::new().await;
        h.pool
            .execute("DROP TABLE comments")
            .await
            .expect("Failed to drop table");
        let err = h.stats.get_stats().await.unwrap_err();
        assert!(matches!(err, ServiceError::Internal(_)));
    }
}
