//! Post model
//!
//! This module provides:
//! - `Post` entity representing a blog post
//! - `PostStatus` enum for publication states
//! - Input types for creating, updating and filtering posts
//! - Read shapes returned by the post service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::thread::TopLevelComment;

/// Post entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// Unique identifier
    pub id: i64,
    /// Post title
    pub title: String,
    /// Body content
    pub content: String,
    /// Tag set, sorted and deduplicated
    #[serde(default)]
    pub tags: Vec<String>,
    /// Whether the post is featured (admin-controlled)
    #[serde(default)]
    pub is_featured: bool,
    /// Publication status
    pub status: PostStatus,
    /// View counter, bumped by single-post reads only
    #[serde(default)]
    pub views: i64,
    /// Author user ID
    pub author_id: i64,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Post publication status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    /// Draft - not visible to public
    #[default]
    Draft,
    /// Published - visible to public
    Published,
    /// Archived - hidden but not deleted
    Archived,
}

impl PostStatus {
    /// All statuses, in display order
    pub const ALL: [PostStatus; 3] = [Self::Draft, Self::Published, Self::Archived];

    /// Convert status to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
            PostStatus::Archived => "archived",
        }
    }
}

impl std::fmt::Display for PostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PostStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            "archived" => Ok(Self::Archived),
            _ => Err(format!("Invalid post status: {}", s)),
        }
    }
}

/// Longest tag the schema stores, in characters
pub const MAX_TAG_LEN: usize = 100;

/// Normalize a tag list into a sorted, lowercase set with blanks removed
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let set: std::collections::BTreeSet<String> = tags
        .into_iter()
        .map(|t| t.as_ref().trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();
    set.into_iter().collect()
}

/// Input for creating a new post
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatePostInput {
    /// Post title
    pub title: String,
    /// Body content
    pub content: String,
    /// Tags (duplicates are dropped)
    #[serde(default)]
    pub tags: Vec<String>,
    /// Featured flag; ignored for non-admin authors
    #[serde(default)]
    pub is_featured: bool,
    /// Publication status (defaults to Draft)
    #[serde(default)]
    pub status: Option<PostStatus>,
}

impl CreatePostInput {
    /// Create a new CreatePostInput
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    /// Set the tags
    pub fn with_tags<S: Into<String>>(mut self, tags: impl IntoIterator<Item = S>) -> Self {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Set the status
    pub fn with_status(mut self, status: PostStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Request the featured flag
    pub fn featured(mut self) -> Self {
        self.is_featured = true;
        self
    }
}

/// Partial update for an existing post
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdatePostInput {
    pub title: Option<String>,
    pub content: Option<String>,
    /// Replaces the whole tag set when present
    pub tags: Option<Vec<String>>,
    pub is_featured: Option<bool>,
    pub status: Option<PostStatus>,
}

impl UpdatePostInput {
    /// Create a new empty UpdatePostInput
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_tags<S: Into<String>>(mut self, tags: impl IntoIterator<Item = S>) -> Self {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_featured(mut self, is_featured: bool) -> Self {
        self.is_featured = Some(is_featured);
        self
    }

    pub fn with_status(mut self, status: PostStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Check if any field is set
    pub fn has_changes(&self) -> bool {
        self.title.is_some()
            || self.content.is_some()
            || self.tags.is_some()
            || self.is_featured.is_some()
            || self.status.is_some()
    }
}

/// Optional filters for listing posts. Every field narrows the result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostFilter {
    /// Case-insensitive match on title, content or a tag
    #[serde(default)]
    pub search: Option<String>,
    /// Posts must carry every one of these tags
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_featured: Option<bool>,
    #[serde(default)]
    pub status: Option<PostStatus>,
    #[serde(default)]
    pub author_id: Option<i64>,
}

/// A post together with the number of comments on it (all statuses)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostWithCommentCount {
    #[serde(flatten)]
    pub post: Post,
    pub comment_count: i64,
}

/// A single post with its approved comment thread
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: Post,
    /// Approved top-level comments, newest first
    pub comments: Vec<TopLevelComment>,
    /// Comments on the post at any depth and in any status
    pub comment_count: i64,
}

/// Posts owned by one author
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorPosts {
    pub posts: Vec<PostWithCommentCount>,
    pub total: i64,
}
