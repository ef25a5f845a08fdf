//! Authorization guard
//!
//! Decides whether an actor may mutate a resource, and removes fields that
//! only administrators may set.

use serde::{Deserialize, Serialize};

use super::error::{ServiceError, ServiceResult};
use crate::models::{CreatePostInput, UserRole, UpdatePostInput};

/// The authenticated caller of a mutating operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: i64,
    pub role: UserRole,
}

impl Actor {
    pub fn new(id: i64, role: UserRole) -> Self {
        Self { id, role }
    }

    pub fn admin(id: i64) -> Self {
        Self::new(id, UserRole::Admin)
    }

    pub fn user(id: i64) -> Self {
        Self::new(id, UserRole::User)
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Owner filter for conditional writes; admins are not scoped
    pub fn owner_scope(&self) -> Option<i64> {
        match self.role {
            UserRole::Admin => None,
            UserRole::User => Some(self.id),
        }
    }
}

/// Admins may mutate anything; everyone else only what they own
pub fn can_mutate(actor: &Actor, owner_id: i64) -> bool {
    match actor.role {
        UserRole::Admin => true,
        UserRole::User => actor.id == owner_id,
    }
}

/// [`can_mutate`] as a `Forbidden` error
pub fn ensure_can_mutate(actor: &Actor, owner_id: i64, resource: &str) -> ServiceResult<()> {
    if can_mutate(actor, owner_id) {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(format!(
            "User {} may not modify {}",
            actor.id, resource
        )))
    }
}

/// Drop a featured-flag change requested by a non-admin
pub fn strip_privileged_update(actor: &Actor, input: &mut UpdatePostInput) {
    if !actor.is_admin() && input.is_featured.take().is_some() {
        tracing::debug!("Dropped featured flag from update by user {}", actor.id);
    }
}

/// Non-admin authors never create featured posts
pub fn strip_privileged_create(actor: &Actor, input: &mut CreatePostInput) {
    if !actor.is_admin() && input.is_featured {
        input.is_featured = false;
        tracing::debug!("Dropped featured flag from post created by user {}", actor.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_matrix() {
        for role in UserRole::ALL {
            for (actor_id, owner_id) in [(1, 1), (1, 2)] {
                let actor = Actor::new(actor_id, role);
                let expected = role == UserRole::Admin || actor_id == owner_id;
                assert_eq!(can_mutate(&actor, owner_id), expected, "{:?}", actor);
            }
        }
    }

    #[test]
    fn test_ensure_can_mutate_is_forbidden() {
        let err = ensure_can_mutate(&Actor::user(1), 2, "post 5").unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
        assert!(ensure_can_mutate(&Actor::admin(1), 2, "post 5").is_ok());
    }

    #[test]
    fn test_owner_scope() {
        assert_eq!(Actor::user(4).owner_scope(), Some(4));
        assert_eq!(Actor::admin(4).owner_scope(), None);
    }

    #[test]
    fn test_strip_featured_keeps_other_fields() {
        let mut input = UpdatePostInput::new().with_title("t").with_featured(true);
        strip_privileged_update(&Actor::user(1), &mut input);
        assert_eq!(input.is_featured, None);
        assert_eq!(input.title.as_deref(), Some("t"));

        let mut input = UpdatePostInput::new().with_featured(true);
        strip_privileged_update(&Actor::admin(1), &mut input);
        assert_eq!(input.is_featured, Some(true));
    }

    #[test]
    fn test_strip_featured_on_create() {
        let mut input = CreatePostInput::new("t", "c").featured();
        strip_privileged_create(&Actor::user(1), &mut input);
        assert!(!input.is_featured);

        let mut input = CreatePostInput::new("t", "c").featured();
        strip_privileged_create(&Actor::admin(1), &mut input);
        assert!(input.is_featured);
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn users_only_mutate_their_own(actor_id in 1i64..50, owner_id in 1i64..50) {
            prop_assert_eq!(can_mutate(&Actor::user(actor_id), owner_id), actor_id == owner_id);
            prop_assert!(can_mutate(&Actor::admin(actor_id), owner_id));
        }
    }
}
