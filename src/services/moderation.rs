//! Comment moderation state machine
//!
//! `Pending` is the initial state. Any state may move to any other distinct
//! state; moving to the current state is refused as a no-op. Visibility is
//! decided by [`CommentStatus::is_public`].

use super::error::{ServiceError, ServiceResult};
use crate::models::CommentStatus;

/// Validate a moderation step for comment `id`, returning the target status
pub fn transition(
    id: i64,
    current: CommentStatus,
    target: CommentStatus,
) -> ServiceResult<CommentStatus> {
    if current == target {
        return Err(ServiceError::NoOp {
            id,
            status: current.to_string(),
        });
    }
    Ok(target)
}
