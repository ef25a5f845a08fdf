//! Comment model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Comment moderation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentStatus {
    /// Awaiting moderation (initial state)
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl CommentStatus {
    pub const ALL: [CommentStatus; 3] = [Self::Pending, Self::Approved, Self::Rejected];

    /// Only approved comments appear in public threads
    pub fn is_public(&self) -> bool {
        matches!(self, Self::Approved)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for CommentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for CommentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(format!("Invalid comment status: {}", s)),
        }
    }
}

/// Comment entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub content: String,
    pub status: CommentStatus,
    pub author_id: i64,
    pub post_id: i64,
    /// Set for replies; `None` for a top-level comment
    pub parent_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a comment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCommentInput {
    pub content: String,
    pub post_id: i64,
    #[serde(default)]
    pub parent_id: Option<i64>,
}

impl CreateCommentInput {
    /// A top-level comment on a post
    pub fn new(post_id: i64, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            post_id,
            parent_id: None,
        }
    }

    /// Make this a reply to another comment
    pub fn reply_to(mut self, parent_id: i64) -> Self {
        self.parent_id = Some(parent_id);
        self
    }
}

/// Partial update applied by a comment's author.
///
/// `status` may only restate the current status; changes go through moderation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateCommentInput {
    pub content: Option<String>,
    pub status: Option<CommentStatus>,
}

/// Minimal post reference attached to a single comment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRef {
    pub id: i64,
    pub title: String,
}

/// Post summary attached to an author's comment listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    pub id: i64,
    pub title: String,
    pub content: String,
}

/// A comment with its parent post's id and title
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentWithPost {
    #[serde(flatten)]
    pub comment: Comment,
    pub post: PostRef,
}

/// One entry of an author's comment listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorComment {
    #[serde(flatten)]
    pub comment: Comment,
    pub post: PostSummary,
    /// Direct replies, any status
    pub reply_count: i64,
}

/// All comments written by one author, newest first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorComments {
    pub comments: Vec<AuthorComment>,
    pub total: i64,
}
