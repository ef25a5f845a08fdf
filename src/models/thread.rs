//! Comment thread shapes
//!
//! A post's public thread has a fixed depth: top-level comments, their
//! replies, and the replies to those replies. Anything deeper is not
//! materialized.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::comment::Comment;

/// A top-level comment with its replies (newest-first among siblings)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopLevelComment {
    #[serde(flatten)]
    pub comment: Comment,
    /// Direct replies, oldest first
    pub replies: Vec<Reply>,
}

/// A first-level reply with its own replies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    #[serde(flatten)]
    pub comment: Comment,
    /// Second-level replies, oldest first
    pub replies: Vec<Comment>,
}

/// Build the public thread for one post.
///
/// Only `Approved` comments are kept. A comment whose parent is not part of
/// the kept set (pending, rejected, or deeper than two reply levels) is
/// dropped together with its subtree.
pub fn assemble_thread(comments: Vec<Comment>) -> Vec<TopLevelComment> {
    let mut approved: Vec<Comment> = comments
        .into_iter()
        .filter(|c| c.status.is_public())
        .collect();
    approved.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

    let mut children: HashMap<i64, Vec<Comment>> = HashMap::new();
    let mut roots = Vec::new();
    for comment in approved {
        match comment.parent_id {
            Some(parent) => children.entry(parent).or_default().push(comment),
            None => roots.push(comment),
        }
    }

    // Roots are newest first; replies keep the oldest-first order from above
    roots.reverse();

    roots
        .into_iter()
        .map(|root| {
            let replies = children
                .remove(&root.id)
                .unwrap_or_default()
                .into_iter()
                .map(|reply| Reply {
                    replies: children.remove(&reply.id).unwrap_or_default(),
                    comment: reply,
                })
                .collect();
            TopLevelComment {
                comment: root,
                replies,
            }
        })
        .collect()
}
