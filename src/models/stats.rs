//! Aggregate statistics snapshot

use serde::{Deserialize, Serialize};

/// Counts across posts, comments and users, read as one snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub post_count: i64,
    pub published_posts: i64,
    pub draft_posts: i64,
    pub archived_posts: i64,
    /// Sum of every post's view counter
    pub total_views: i64,
    pub total_comments: i64,
    pub approved_comments: i64,
    pub rejected_comments: i64,
    pub total_admins: i64,
    pub total_users: i64,
}
