//! Administrator seeding

use tracing::info;

use super::error::ServiceResult;
use crate::config::AdminSeedConfig;
use crate::db::repositories::UserRepository;
use crate::models::{CreateUserInput, User, UserRole};

/// Create the configured administrator unless a user with that email exists.
///
/// Returns the created user, or `None` when seeding was skipped.
pub async fn seed_admin(
    users: &dyn UserRepository,
    config: &AdminSeedConfig,
) -> ServiceResult<Option<User>> {
    if let Some(existing) = users.get_by_email(&config.email).await? {
        info!(
            "Admin seed skipped: {} already exists as user {}",
            config.email, existing.id
        );
        return Ok(None);
    }

    let input = CreateUserInput::new(config.name.clone(), config.email.clone(), UserRole::Admin);
    let admin = users.create(&input).await?;
    info!("Seeded administrator {} ({})", admin.id, admin.email);
    Ok(Some(admin))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxUserRepository;
    use crate::db::{create_test_pool, migrations};

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let users = SqlxUserRepository::new(pool);
        let config = AdminSeedConfig {
            name: "root".to_string(),
            email: "root@example.com".to_string(),
        };

        let admin = seed_admin(&users, &config).await.unwrap().expect("Admin not created");
        assert!(admin.is_admin());
        assert!(admin.email_verified);
        assert!(admin.is_active());

        assert!(seed_admin(&users, &config).await.unwrap().is_none());
    }
}
