//! Access gate in front of the services
//!
//! Identity is owned by an external authentication provider. Mutating
//! operations require a verified session whose role is on the operation's
//! allow-list; reads are public.

use async_trait::async_trait;

use crate::models::UserRole;
use crate::services::Actor;

/// What the authentication provider knows about a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClaims {
    pub user_id: i64,
    pub email_verified: bool,
    pub role: UserRole,
}

/// Verified-session lookup offered by the authentication provider
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Claims for `token`, or `None` if the token names no live session
    async fn verified_session(&self, token: &str) -> anyhow::Result<Option<SessionClaims>>;
}

/// Callable operations, each with its own role allow-list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListPosts,
    GetPost,
    CreatePost,
    UpdatePost,
    DeletePost,
    MyPosts,
    GetComment,
    ListAuthorComments,
    CreateComment,
    UpdateComment,
    DeleteComment,
    ModerateComment,
    Stats,
}

const ANY_ROLE: &[UserRole] = &[UserRole::Admin, UserRole::User];
const ADMIN_ONLY: &[UserRole] = &[UserRole::Admin];

impl Operation {
    /// Roles allowed to call this operation; `None` means public
    pub fn allowed_roles(&self) -> Option<&'static [UserRole]> {
        match self {
            Self::ListPosts | Self::GetPost | Self::GetComment | Self::ListAuthorComments => None,
            Self::CreatePost
            | Self::UpdatePost
            | Self::DeletePost
            | Self::MyPosts
            | Self::CreateComment
            | Self::UpdateComment
            | Self::DeleteComment => Some(ANY_ROLE),
            Self::ModerateComment | Self::Stats => Some(ADMIN_ONLY),
        }
    }
}

/// Error types for the access gate
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Email address not verified")]
    EmailNotVerified,

    #[error("Role {role} may not perform {operation:?}")]
    RoleNotAllowed { role: UserRole, operation: Operation },

    #[error("Session lookup failed: {0}")]
    Provider(#[from] anyhow::Error),
}

/// Checks a caller's session against an operation's requirements
pub struct AccessGate<P: AuthProvider> {
    provider: P,
}

impl<P: AuthProvider> AccessGate<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Authorize `operation` for the bearer of `token`.
    ///
    /// Public operations succeed with `None` without consulting the provider.
    pub async fn authorize(
        &self,
        token: Option<&str>,
        operation: Operation,
    ) -> Result<Option<Actor>, AccessError> {
        let Some(allowed) = operation.allowed_roles() else {
            return Ok(None);
        };

        let token = token.ok_or(AccessError::Unauthenticated)?;
        let claims = self
            .provider
            .verified_session(token)
            .await?
            .ok_or(AccessError::Unauthenticated)?;

        if !claims.email_verified {
            return Err(AccessError::EmailNotVerified);
        }
        if !allowed.contains(&claims.role) {
            tracing::warn!(
                "User {} with role {} denied {:?}",
                claims.user_id,
                claims.role,
                operation
            );
            return Err(AccessError::RoleNotAllowed {
                role: claims.role,
                operation,
            });
        }

        Ok(Some(Actor::new(claims.user_id, claims.role)))
    }
}
