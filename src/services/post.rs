//! Post retrieval service
//!
//! Listing, single-post reads with their comment thread, per-author listings
//! and owner/admin-guarded mutations.

use std::sync::Arc;

use tracing::{debug, info};

use super::authz::{ensure_can_mutate, strip_privileged_create, strip_privileged_update, Actor};
use super::error::{ServiceError, ServiceResult};
use super::pagination::PaginationNormalizer;
use super::query::build_post_predicate;
use crate::db::repositories::{PostRepository, UserRepository};
use crate::models::{
    assemble_thread, normalize_tags, AuthorPosts, CreatePostInput, ListQuery, PagedResult, Post,
    PostDetail, PostFilter, UpdatePostInput, MAX_TAG_LEN,
};

/// Post service
pub struct PostService {
    posts: Arc<dyn PostRepository>,
    users: Arc<dyn UserRepository>,
    pagination: PaginationNormalizer,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        users: Arc<dyn UserRepository>,
        pagination: PaginationNormalizer,
    ) -> Self {
        Self {
            posts,
            users,
            pagination,
        }
    }

    /// Create a post owned by `actor`
    pub async fn create(&self, mut input: CreatePostInput, actor: &Actor) -> ServiceResult<Post> {
        ensure_title(&input.title)?;
        ensure_tags(&input.tags)?;
        strip_privileged_create(actor, &mut input);

        let post = self.posts.create(actor.id, &input).await?;
        info!("Post {} created by user {}", post.id, actor.id);
        Ok(post)
    }

    /// One page of posts matching `filter`
    pub async fn list(&self, filter: &PostFilter, query: &ListQuery) -> ServiceResult<PagedResult<Post>> {
        let predicate = build_post_predicate(filter);
        let page = self.pagination.normalize(query);
        let (posts, total) = self.posts.list(&predicate, &page).await?;
        debug!(
            "Listed {} of {} posts (page {}, limit {})",
            posts.len(),
            total,
            page.page,
            page.limit
        );
        Ok(PagedResult::new(posts, total, &page))
    }

    /// Count a view and return the post with its approved comment thread
    pub async fn get_by_id(&self, id: i64) -> ServiceResult<PostDetail> {
        let record = self
            .posts
            .view(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Post", id))?;

        Ok(PostDetail {
            post: record.post,
            comments: assemble_thread(record.comments),
            comment_count: record.comment_count,
        })
    }

    /// Every post by an active author, with comment counts
    pub async fn get_mine(&self, author_id: i64) -> ServiceResult<AuthorPosts> {
        let author = self
            .users
            .get_by_id(author_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", author_id))?;
        if !author.is_active() {
            return Err(ServiceError::InactiveUser(author_id));
        }

        let (posts, total) = self.posts.list_by_author(author_id).await?;
        Ok(AuthorPosts { posts, total })
    }

    /// Apply a patch; non-admins may only touch their own posts and never the featured flag
    pub async fn update(&self, id: i64, mut input: UpdatePostInput, actor: &Actor) -> ServiceResult<Post> {
        if let Some(title) = &input.title {
            ensure_title(title)?;
        }
        if let Some(tags) = &input.tags {
            ensure_tags(tags)?;
        }
        let owner_id = self.require_owner(id).await?;
        ensure_can_mutate(actor, owner_id, &format!("post {}", id))?;
        strip_privileged_update(actor, &mut input);

        if !input.has_changes() {
            debug!("Post {} patch is empty after stripping, nothing to write", id);
            return self
                .posts
                .get_by_id(id)
                .await?
                .ok_or_else(|| ServiceError::not_found("Post", id));
        }

        let post = self
            .posts
            .update(id, actor.owner_scope(), &input)
            .await?
            .ok_or_else(|| ServiceError::Conflict(format!("Post {} changed during update", id)))?;
        info!("Post {} updated by user {}", id, actor.id);
        Ok(post)
    }

    /// Delete a post together with its comments
    pub async fn delete(&self, id: i64, actor: &Actor) -> ServiceResult<()> {
        let owner_id = self.require_owner(id).await?;
        ensure_can_mutate(actor, owner_id, &format!("post {}", id))?;

        if !self.posts.delete(id, actor.owner_scope()).await? {
            return Err(ServiceError::Conflict(format!(
                "Post {} changed during delete",
                id
            )));
        }
        info!("Post {} deleted by user {}", id, actor.id);
        Ok(())
    }

    async fn require_owner(&self, id: i64) -> ServiceResult<i64> {
        self.posts
            .get_author_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Post", id))
    }
}

fn ensure_title(title: &str) -> ServiceResult<()> {
    if title.trim().is_empty() {
        return Err(ServiceError::InvalidInput("Title cannot be empty".to_string()));
    }
    Ok(())
}

fn ensure_tags(tags: &[String]) -> ServiceResult<()> {
    match normalize_tags(tags)
        .into_iter()
        .find(|t| t.chars().count() > MAX_TAG_LEN)
    {
        Some(tag) => Err(ServiceError::InvalidInput(format!(
            "Tag {:?} is longer than {} characters",
            tag, MAX_TAG_LEN
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CommentStatus, CreateCommentInput, PostStatus, UserStatus};
    use crate::services::test_support::Harness;

    #[tokio::test]
    async fn test_list_filters_by_status() {
        let h = Harness::new().await;
        for status in [PostStatus::Published, PostStatus::Draft, PostStatus::Published] {
            h.post_as(&h.alice, CreatePostInput::new("t", "c").with_status(status))
                .await;
        }

        let filter = PostFilter {
            status: Some(PostStatus::Published),
            ..Default::default()
        };
        let page = h.posts.list(&filter, &ListQuery::default()).await.unwrap();
        assert_eq!(page.total, 2);
        assert!(page.items.iter().all(|p| p.status == PostStatus::Published));

        let all = h
            .posts
            .list(&PostFilter::default(), &ListQuery::default())
            .await
            .unwrap();
        assert_eq!(all.total, 3);
    }

    #[tokio::test]
    async fn test_second_page_of_twelve() {
        let h = Harness::new().await;
        for i in 0..12 {
            h.post_as(&h.alice, CreatePostInput::new(format!("post {}", i), "c"))
                .await;
        }
        let everything = h
            .posts
            .list(&PostFilter::default(), &ListQuery::default().limit(12))
            .await
            .unwrap();

        let page = h
            .posts
            .list(&PostFilter::default(), &ListQuery::default().page(2).limit(5))
            .await
            .unwrap();
        assert_eq!(page.len(), 5);
        assert_eq!(page.total, 12);
        assert_eq!(page.total_pages, 3);
        let ids: Vec<i64> = page.items.iter().map(|p| p.id).collect();
        let expected: Vec<i64> = everything.items[5..10].iter().map(|p| p.id).collect();
        assert_eq!(ids, expected);
    }

    #[tokio::test]
    async fn test_get_by_id_missing_is_not_found() {
        let h = Harness::new().await;
        let err = h.posts.get_by_id(404).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_concurrent_reads_do_not_lose_views() {
        let h = Harness::new().await;
        let post = h.post_as(&h.alice, CreatePostInput::new("t", "c")).await;
        for _ in 0..4 {
            h.posts.get_by_id(post.id).await.unwrap();
        }

        let (a, b) = tokio::join!(h.posts.get_by_id(post.id), h.posts.get_by_id(post.id));
        let mut seen = vec![a.unwrap().post.views, b.unwrap().post.views];
        seen.sort();
        assert_eq!(seen, vec![5, 6]);

        let stored = h.post_repo.get_by_id(post.id).await.unwrap().unwrap();
        assert_eq!(stored.views, 6);
    }

    #[tokio::test]
    async fn test_pending_top_level_hidden_with_its_replies() {
        let h = Harness::new().await;
        let post = h.post_as(&h.alice, CreatePostInput::new("t", "c")).await;
        let root = h
            .comments
            .create(CreateCommentInput::new(post.id, "root"), &h.bob)
            .await
            .unwrap();
        let reply = h
            .comments
            .create(CreateCommentInput::new(post.id, "reply").reply_to(root.id), &h.bob)
            .await
            .unwrap();
        h.comments
            .moderate(reply.id, CommentStatus::Approved)
            .await
            .unwrap();

        let detail = h.posts.get_by_id(post.id).await.unwrap();
        assert!(detail.comments.is_empty());
        assert_eq!(detail.comment_count, 2);
    }

    #[tokio::test]
    async fn test_non_admin_cannot_feature() {
        let h = Harness::new().await;
        let post = h.post_as(&h.alice, CreatePostInput::new("t", "c").featured()).await;
        assert!(!post.is_featured);

        let updated = h
            .posts
            .update(
                post.id,
                UpdatePostInput::new().with_title("renamed").with_featured(true),
                &h.alice,
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "renamed");
        assert!(!updated.is_featured);

        let featured = h
            .posts
            .update(post.id, UpdatePostInput::new().with_featured(true), &h.admin)
            .await
            .unwrap();
        assert!(featured.is_featured);
    }

    #[tokio::test]
    async fn test_non_owner_is_forbidden() {
        let h = Harness::new().await;
        let post = h.post_as(&h.alice, CreatePostInput::new("t", "c")).await;

        let err = h
            .posts
            .update(post.id, UpdatePostInput::new().with_title("x"), &h.bob)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
        let err = h.posts.delete(post.id, &h.bob).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        let stored = h.post_repo.get_by_id(post.id).await.unwrap().unwrap();
        assert_eq!(stored.title, "t");

        h.posts.delete(post.id, &h.admin).await.unwrap();
        let err = h.posts.delete(post.id, &h.admin).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_get_mine() {
        let h = Harness::new().await;
        let post = h.post_as(&h.alice, CreatePostInput::new("mine", "c")).await;
        h.post_as(&h.bob, CreatePostInput::new("theirs", "c")).await;
        h.comments
            .create(CreateCommentInput::new(post.id, "hi"), &h.bob)
            .await
            .unwrap();

        let mine = h.posts.get_mine(h.alice.id).await.unwrap();
        assert_eq!(mine.total, 1);
        assert_eq!(mine.posts[0].post.title, "mine");
        assert_eq!(mine.posts[0].comment_count, 1);

        h.user_repo
            .set_status(h.alice.id, UserStatus::Inactive)
            .await
            .unwrap();
        let err = h.posts.get_mine(h.alice.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::InactiveUser(id) if id == h.alice.id));

        let err = h.posts.get_mine(9999).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_blank_title_rejected() {
        let h = Harness::new().await;
        let err = h
            .posts
            .create(CreatePostInput::new("  ", "c"), &h.alice)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_blank_title_update_rejected() {
        let h = Harness::new().await;
        let post = h.post_as(&h.alice, CreatePostInput::new("t", "c")).await;
        let err = h
            .posts
            .update(post.id, UpdatePostInput::new().with_title("   "), &h.alice)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        let stored = h.post_repo.get_by_id(post.id).await.unwrap().unwrap();
        assert_eq!(stored.title, "t");
    }

    #[tokio::test]
    async fn test_overlong_tag_rejected() {
        let h = Harness::new().await;
        let long_tag = "x".repeat(MAX_TAG_LEN + 1);

        let err = h
            .posts
            .create(CreatePostInput::new("t", "c").with_tags([long_tag.clone()]), &h.alice)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        let post = h
            .post_as(&h.alice, CreatePostInput::new("t", "c").with_tags(["x".repeat(MAX_TAG_LEN)]))
            .await;
        let err = h
            .posts
            .update(post.id, UpdatePostInput::new().with_tags([long_tag]), &h.alice)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_stripped_patch_leaves_post_untouched() {
        let h = Harness::new().await;
        let post = h.post_as(&h.alice, CreatePostInput::new("t", "c")).await;

        let unchanged = h
            .posts
            .update(post.id, UpdatePostInput::new().with_featured(true), &h.alice)
            .await
            .unwrap();
        assert_eq!(unchanged.updated_at, post.updated_at);
        assert!(!unchanged.is_featured);

        let stored = h.post_repo.get_by_id(post.id).await.unwrap().unwrap();
        assert_eq!(stored.updated_at, post.updated_at);
    }

    #[tokio::test]
    async fn test_list_sorted_by_allowed_fields() {
        let h = Harness::new().await;
        let mut ids = Vec::new();
        for (title, views) in [("banana", 2), ("apple", 0), ("cherry", 1)] {
            let post = h.post_as(&h.alice, CreatePostInput::new(title, "c")).await;
            for _ in 0..views {
                h.posts.get_by_id(post.id).await.unwrap();
            }
            ids.push(post.id);
        }

        let by_views = h
            .posts
            .list(&PostFilter::default(), &ListQuery::default().sort("views", "asc"))
            .await
            .unwrap();
        let views: Vec<i64> = by_views.items.iter().map(|p| p.views).collect();
        assert_eq!(views, vec![0, 1, 2]);
        assert_eq!(by_views.items[0].id, ids[1]);

        let by_title = h
            .posts
            .list(&PostFilter::default(), &ListQuery::default().sort("title", "asc"))
            .await
            .unwrap();
        let titles: Vec<&str> = by_title.items.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["apple", "banana", "cherry"]);

        let by_title_desc = h
            .posts
            .list(&PostFilter::default(), &ListQuery::default().sort("title", "desc"))
            .await
            .unwrap();
        assert_eq!(by_title_desc.items[0].title, "cherry");
    }

    #[tokio::test]
    async fn test_huge_page_and_limit_do_not_overflow() {
        let h = Harness::new().await;
        h.post_as(&h.alice, CreatePostInput::new("t", "c")).await;

        let page = h
            .posts
            .list(
                &PostFilter::default(),
                &ListQuery::default().page(u32::MAX).limit(u32::MAX),
            )
            .await
            .unwrap();
        assert!(page.is_empty());
        assert_eq!(page.total, 1);
        assert_eq!(page.total_pages, 1);
    }

    #[tokio::test]
    async fn test_views_and_moderation_scenario() {
        let h = Harness::new().await;
        let post = h.post_as(&h.alice, CreatePostInput::new("t", "c")).await;
        assert_eq!(post.status, PostStatus::Draft);
        assert_eq!(post.views, 0);

        h.posts.get_by_id(post.id).await.unwrap();
        let second = h.posts.get_by_id(post.id).await.unwrap();
        assert_eq!(second.post.views, 2);
        assert!(second.comments.is_empty());

        let comment = h
            .comments
            .create(CreateCommentInput::new(post.id, "nice"), &h.bob)
            .await
            .unwrap();
        assert_eq!(comment.status, CommentStatus::Pending);
        h.comments
            .moderate(comment.id, CommentStatus::Approved)
            .await
            .unwrap();

        let third = h.posts.get_by_id(post.id).await.unwrap();
        assert_eq!(third.post.views, 3);
        assert_eq!(third.comments.len(), 1);
        assert_eq!(third.comments[0].comment.id, comment.id);
    }
}
