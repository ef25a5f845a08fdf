//! Services layer - Business logic
//!
//! Services apply the content rules on top of the repositories:
//! - Building query predicates and normalizing pagination
//! - Authorization of mutations and moderation transitions
//! - Translating storage failures into [`ServiceError`]

pub mod authz;
pub mod comment;
pub mod error;
pub mod moderation;
pub mod pagination;
pub mod post;
pub mod query;
pub mod seed;
pub mod stats;

#[cfg(test)]
pub(crate) mod test_support;

pub use authz::{can_mutate, ensure_can_mutate, Actor};
pub use comment::CommentService;
pub use error::{ServiceError, ServiceResult};
pub use moderation::transition;
pub use pagination::PaginationNormalizer;
pub use post::PostService;
pub use query::build_post_predicate;
pub use seed::seed_admin;
pub use stats::StatsService;
