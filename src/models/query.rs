//! Normalized post predicate
//!
//! A predicate is a conjunction of independent clauses. An empty predicate
//! matches every post.

use super::post::PostStatus;

/// One independent condition on a post
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostClause {
    /// Case-insensitive match on title OR content OR tag membership
    Search(String),
    /// Post's tag set is a superset of these (sorted, deduplicated) tags
    HasAllTags(Vec<String>),
    Featured(bool),
    Status(PostStatus),
    Author(i64),
}

/// Conjunction of clauses, combined with AND by the storage layer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostPredicate {
    clauses: Vec<PostClause>,
}

impl PostPredicate {
    pub fn new(clauses: Vec<PostClause>) -> Self {
        Self { clauses }
    }

    pub fn clauses(&self) -> &[PostClause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Evaluate the predicate against an in-memory post
    pub fn matches(&self, post: &super::Post) -> bool {
        self.clauses.iter().all(|clause| match clause {
            PostClause::Search(term) => {
                let term = term.to_lowercase();
                post.title.to_lowercase().contains(&term)
                    || post.content.to_lowercase().contains(&term)
                    || post.tags.iter().any(|t| t.to_lowercase() == term)
            }
            PostClause::HasAllTags(tags) => tags.iter().all(|t| post.tags.contains(t)),
            PostClause::Featured(flag) => post.is_featured == *flag,
            PostClause::Status(status) => post.status == *status,
            PostClause::Author(id) => post.author_id == *id,
        })
    }
}
