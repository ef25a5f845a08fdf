//! Comment thread service
//!
//! Comment edits and deletes are strictly owner-only; there is no admin
//! override here. Administrators act on comments through [`CommentService::moderate`].

use std::sync::Arc;

use tracing::info;

use super::authz::Actor;
use super::error::{ServiceError, ServiceResult};
use super::moderation;
use crate::db::repositories::{CommentRepository, PostRepository};
use crate::models::{
    AuthorComments, Comment, CommentStatus, CommentWithPost, CreateCommentInput,
    UpdateCommentInput,
};

/// Comment service
pub struct CommentService {
    comments: Arc<dyn CommentRepository>,
    posts: Arc<dyn PostRepository>,
}

impl CommentService {
    pub fn new(comments: Arc<dyn CommentRepository>, posts: Arc<dyn PostRepository>) -> Self {
        Self { comments, posts }
    }

    /// Add a comment or reply; it starts out pending
    pub async fn create(&self, input: CreateCommentInput, actor: &Actor) -> ServiceResult<Comment> {
        ensure_content(&input.content)?;

        if self.posts.get_author_id(input.post_id).await?.is_none() {
            return Err(ServiceError::not_found("Post", input.post_id));
        }

        if let Some(parent_id) = input.parent_id {
            let parent = self
                .comments
                .get_by_id(parent_id)
                .await?
                .ok_or_else(|| ServiceError::not_found("Comment", parent_id))?;
            if parent.post_id != input.post_id {
                return Err(ServiceError::InvalidInput(format!(
                    "Comment {} belongs to post {}, not post {}",
                    parent_id, parent.post_id, input.post_id
                )));
            }
        }

        // A post or parent deleted since the checks above fails the foreign
        // key and surfaces as NotFound.
        let comment = self.comments.create(actor.id, &input).await?;
        info!(
            "Comment {} added to post {} by user {}",
            comment.id, comment.post_id, actor.id
        );
        Ok(comment)
    }

    /// A comment with its post's id and title
    pub async fn get_by_id(&self, id: i64) -> ServiceResult<CommentWithPost> {
        self.comments
            .get_with_post(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Comment", id))
    }

    /// Every comment written by `author_id`, newest first
    pub async fn list_by_author(&self, author_id: i64) -> ServiceResult<AuthorComments> {
        let (comments, total) = self.comments.list_by_author(author_id).await?;
        Ok(AuthorComments { comments, total })
    }

    /// Edit the actor's own comment.
    ///
    /// The patch may carry the comment's current status but cannot change it.
    pub async fn update(
        &self,
        id: i64,
        input: UpdateCommentInput,
        actor: &Actor,
    ) -> ServiceResult<Comment> {
        if let Some(content) = &input.content {
            ensure_content(content)?;
        }

        if let Some(status) = input.status {
            let current = self.owned(id, actor).await?;
            if status != current.status {
                return Err(ServiceError::InvalidInput(format!(
                    "Comment {} is {}; status changes require moderation",
                    id, current.status
                )));
            }
        }

        let Some(content) = input.content else {
            return self.owned(id, actor).await;
        };

        let comment = self
            .comments
            .update_owned(id, actor.id, &content)
            .await?
            .ok_or_else(|| not_owned(id, actor))?;
        info!("Comment {} updated by user {}", id, actor.id);
        Ok(comment)
    }

    pub async fn delete(&self, id: i64, actor: &Actor) -> ServiceResult<()> {
        if !self.comments.delete_owned(id, actor.id).await? {
            return Err(not_owned(id, actor));
        }
        info!("Comment {} deleted by user {}", id, actor.id);
        Ok(())
    }

    /// Move a comment to `status`. Callers gate this to administrators.
    pub async fn moderate(&self, id: i64, status: CommentStatus) -> ServiceResult<Comment> {
        let current = self
            .comments
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Comment", id))?;
        let target = moderation::transition(id, current.status, status)?;

        let comment = self
            .comments
            .set_status_if(id, current.status, target)
            .await?
            .ok_or_else(|| {
                ServiceError::Conflict(format!("Comment {} changed during moderation", id))
            })?;
        info!("Comment {} moved from {} to {}", id, current.status, target);
        Ok(comment)
    }

    async fn owned(&self, id: i64, actor: &Actor) -> ServiceResult<Comment> {
        self.comments
            .get_by_id(id)
            .await?
            .filter(|c| c.author_id == actor.id)
            .ok_or_else(|| not_owned(id, actor))
    }
}

fn ensure_content(content: &str) -> ServiceResult<()> {
    if content.trim().is_empty() {
        return Err(ServiceError::InvalidInput(
            "Comment content cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn not_owned(id: i64, actor: &Actor) -> ServiceError {
    ServiceError::InvalidInput(format!(
        "No comment with ID {} owned by user {}",
        id, actor.id
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreatePostInput;
    use crate::services::test_support::Harness;

    async fn harness_with_post() -> (Harness, i64) {
        let h = Harness::new().await;
        let post = h.post_as(&h.alice, CreatePostInput::new("t", "c")).await;
        (h, post.id)
    }

    #[tokio::test]
    async fn test_create_on_missing_post() {
        let (h, _) = harness_with_post().await;
        let err = h
            .comments
            .create(CreateCommentInput::new(404, "hi"), &h.bob)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_create_with_missing_parent() {
        let (h, post_id) = harness_with_post().await;
        let err = h
            .comments
            .create(CreateCommentInput::new(post_id, "hi").reply_to(404), &h.bob)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_reply_parent_must_be_on_same_post() {
        let (h, post_id) = harness_with_post().await;
        let other = h.post_as(&h.bob, CreatePostInput::new("other", "c")).await;
        let parent = h
            .comments
            .create(CreateCommentInput::new(other.id, "elsewhere"), &h.bob)
            .await
            .unwrap();

        let err = h
            .comments
            .create(
                CreateCommentInput::new(post_id, "hi").reply_to(parent.id),
                &h.bob,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let (h, post_id) = harness_with_post().await;
        let comment = h
            .comments
            .create(CreateCommentInput::new(post_id, "hi"), &h.bob)
            .await
            .unwrap();

        let found = h.comments.get_by_id(comment.id).await.unwrap();
        assert_eq!(found.post.id, post_id);
        assert_eq!(found.post.title, "t");

        let err = h.comments.get_by_id(comment.id + 1).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_by_author() {
        let (h, post_id) = harness_with_post().await;
        for text in ["first", "second"] {
            h.comments
                .create(CreateCommentInput::new(post_id, text), &h.bob)
                .await
                .unwrap();
        }
        h.comments
            .create(CreateCommentInput::new(post_id, "not bob"), &h.alice)
            .await
            .unwrap();

        let listed = h.comments.list_by_author(h.bob.id).await.unwrap();
        assert_eq!(listed.total, 2);
        assert_eq!(listed.comments[0].comment.content, "second");
        assert_eq!(listed.comments[0].post.title, "t");
    }

    #[tokio::test]
    async fn test_non_owner_update_and_delete_rejected() {
        let (h, post_id) = harness_with_post().await;
        let comment = h
            .comments
            .create(CreateCommentInput::new(post_id, "mine"), &h.bob)
            .await
            .unwrap();
        let patch = UpdateCommentInput {
            content: Some("hijacked".to_string()),
            status: None,
        };

        for actor in [h.alice, h.admin] {
            let err = h
                .comments
                .update(comment.id, patch.clone(), &actor)
                .await
                .unwrap_err();
            assert!(matches!(err, ServiceError::InvalidInput(_)));
            let err = h.comments.delete(comment.id, &actor).await.unwrap_err();
            assert!(matches!(err, ServiceError::InvalidInput(_)));
        }

        let stored = h.comment_repo.get_by_id(comment.id).await.unwrap().unwrap();
        assert_eq!(stored, comment);

        let edited = h.comments.update(comment.id, patch, &h.bob).await.unwrap();
        assert_eq!(edited.content, "hijacked");
        h.comments.delete(comment.id, &h.bob).await.unwrap();
    }

    #[tokio::test]
    async fn test_author_cannot_change_status() {
        let (h, post_id) = harness_with_post().await;
        let comment = h
            .comments
            .create(CreateCommentInput::new(post_id, "approve me"), &h.bob)
            .await
            .unwrap();

        let patch = UpdateCommentInput {
            content: Some("edited".to_string()),
            status: Some(CommentStatus::Approved),
        };
        let err = h
            .comments
            .update(comment.id, patch, &h.bob)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        let stored = h.comment_repo.get_by_id(comment.id).await.unwrap().unwrap();
        assert_eq!(stored, comment);
        let detail = h.posts.get_by_id(post_id).await.unwrap();
        assert!(detail.comments.is_empty());

        // Restating the current status is allowed
        let patch = UpdateCommentInput {
            content: Some("edited".to_string()),
            status: Some(CommentStatus::Pending),
        };
        let edited = h.comments.update(comment.id, patch, &h.bob).await.unwrap();
        assert_eq!(edited.content, "edited");
        assert_eq!(edited.status, CommentStatus::Pending);
    }

    #[tokio::test]
    async fn test_blank_content_update_rejected() {
        let (h, post_id) = harness_with_post().await;
        let comment = h
            .comments
            .create(CreateCommentInput::new(post_id, "hi"), &h.bob)
            .await
            .unwrap();

        let patch = UpdateCommentInput {
            content: Some("  ".to_string()),
            status: None,
        };
        let err = h
            .comments
            .update(comment.id, patch, &h.bob)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
        let stored = h.comment_repo.get_by_id(comment.id).await.unwrap().unwrap();
        assert_eq!(stored.content, "hi");
    }

    #[tokio::test]
    async fn test_empty_patch_writes_nothing() {
        let (h, post_id) = harness_with_post().await;
        let comment = h
            .comments
            .create(CreateCommentInput::new(post_id, "hi"), &h.bob)
            .await
            .unwrap();

        let unchanged = h
            .comments
            .update(comment.id, UpdateCommentInput::default(), &h.bob)
            .await
            .unwrap();
        assert_eq!(unchanged, comment);

        let err = h
            .comments
            .update(comment.id, UpdateCommentInput::default(), &h.alice)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_moderate_to_same_status_is_noop() {
        let (h, post_id) = harness_with_post().await;
        let comment = h
            .comments
            .create(CreateCommentInput::new(post_id, "hi"), &h.bob)
            .await
            .unwrap();

        let err = h
            .comments
            .moderate(comment.id, CommentStatus::Pending)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NoOp { .. }));
        let stored = h.comment_repo.get_by_id(comment.id).await.unwrap().unwrap();
        assert_eq!(stored.status, CommentStatus::Pending);

        let rejected = h
            .comments
            .moderate(comment.id, CommentStatus::Rejected)
            .await
            .unwrap();
        assert_eq!(rejected.status, CommentStatus::Rejected);
        let approved = h
            .comments
            .moderate(comment.id, CommentStatus::Approved)
            .await
            .unwrap();
        assert_eq!(approved.status, CommentStatus::Approved);
    }

    #[tokio::test]
    async fn test_moderate_missing_comment() {
        let (h, _) = harness_with_post().await;
        let err = h
            .comments
            .moderate(404, CommentStatus::Approved)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_deleting_post_removes_comments() {
        let (h, post_id) = harness_with_post().await;
        let comment = h
            .comments
            .create(CreateCommentInput::new(post_id, "hi"), &h.bob)
            .await
            .unwrap();
        h.posts.delete(post_id, &h.alice).await.unwrap();
        assert!(h.comment_repo.get_by_id(comment.id).await.unwrap().is_none());
    }
}
