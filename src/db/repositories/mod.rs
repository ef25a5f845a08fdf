//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles the storage operations for one entity.

mod args;
pub mod comment;
pub mod post;
pub mod stats;
pub mod user;

pub use comment::{CommentRepository, SqlxCommentRepository};
pub use post::{PostRepository, PostThreadRecord, SqlxPostRepository};
pub use stats::{SqlxStatsRepository, StatsRepository};
pub use user::{SqlxUserRepository, UserRepository};
