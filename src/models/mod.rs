//! Data models
//!
//! Plain data structures used throughout Quill:
//! - Database entities (Post, Comment, User)
//! - Input, filter and pagination types
//! - Read shapes returned by services (threads, listings, statistics)

mod comment;
mod pagination;
mod post;
mod query;
mod stats;
mod thread;
mod user;

pub use comment::{
    AuthorComment, AuthorComments, Comment, CommentStatus, CommentWithPost, CreateCommentInput,
    PostRef, PostSummary, UpdateCommentInput,
};
pub use pagination::{ListQuery, PageRequest, PagedResult, Sort, SortField, SortOrder};
pub use post::{
    normalize_tags, AuthorPosts, CreatePostInput, Post, PostDetail, PostFilter, PostStatus,
    PostWithCommentCount, UpdatePostInput, MAX_TAG_LEN,
};
pub use query::{PostClause, PostPredicate};
pub use stats::Stats;
pub use thread::{assemble_thread, Reply, TopLevelComment};
pub use user::{CreateUserInput, User, UserRole, UserStatus};
