use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{ServiceError, ServiceResult};
use crate::auth::{self, Claims};
use crate::config;
use crate::database::manager::DatabaseManager;
use crate::database::models::{RefreshToken, Tenant, User};

/// Token pair returned by login/refresh
#[derive(Debug, serde::Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

pub struct AuthService {
    pool: PgPool,
}

impl AuthService {
    pub async fn new() -> ServiceResult<Self> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self { pool })
    }

    /// Create a tenant and its owning user in one transaction. The first
    /// user of a tenant is always the owner.
    pub async fn signup(
        &self,
        tenant_name: &str,
        tenant_slug: &str,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> ServiceResult<(Tenant, User, TokenPair)> {
        validate_slug(tenant_slug)?;
        validate_email(email)?;
        if password.len() < 8 {
            return Err(ServiceError::Invalid("Password must be at least 8 characters".into()));
        }

        let existing: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM tenants WHERE slug = $1 AND deleted_at IS NULL")
                .bind(tenant_slug)
                .fetch_optional(&self.pool)
                .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!("Tenant '{}' already exists", tenant_slug)));
        }

        let password_hash = hash_password(password)?;

        let mut tx = self.pool.begin().await?;

        let tenant = sqlx::query_as::<_, Tenant>(
            r#"
            INSERT INTO tenants (name, slug)
            VALUES ($1, $2)
            RETURNING id, name, slug, created_at, updated_at, deleted_at
            "#,
        )
        .bind(tenant_name)
        .bind(tenant_slug)
        .fetch_one(&mut *tx)
        .await?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (tenant_id, email, password_hash, display_name, role)
            VALUES ($1, $2, $3, $4, 'owner')
            RETURNING id, tenant_id, email, password_hash, display_name, role,
                      created_at, updated_at, deleted_at
            "#,
        )
        .bind(tenant.id)
        .bind(email)
        .bind(&password_hash)
        .bind(display_name)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        let tokens = self.issue_tokens(&user).await?;
        Ok((tenant, user, tokens))
    }

    /// Verify credentials against the tenant-scoped user row
    pub async fn login(
        &self,
        tenant_slug: &str,
        email: &str,
        password: &str,
    ) -> ServiceResult<(User, TokenPair)> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.tenant_id, u.email, u.password_hash, u.display_name, u.role,
                   u.created_at, u.updated_at, u.deleted_at
            FROM users u
            JOIN tenants t ON t.id = u.tenant_id
            WHERE t.slug = $1 AND u.email = $2
              AND u.deleted_at IS NULL AND t.deleted_at IS NULL
            "#,
        )
        .bind(tenant_slug)
        .bind(email)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ServiceError::Credentials)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(ServiceError::Credentials);
        }

        let tokens = self.issue_tokens(&user).await?;
        Ok((user, tokens))
    }

    /// Rotate a refresh token: revoke the presented row and issue a fresh
    /// pair. Sequential revoke + insert inside one transaction.
    pub async fn refresh(&self, raw_token: &str) -> ServiceResult<(User, TokenPair)> {
        let token_hash = auth::hash_refresh_token(raw_token);
        let now = Utc::now();

        let stored = sqlx::query_as::<_, RefreshToken>(
            r#"
            SELECT id, tenant_id, user_id, token_hash, expires_at, revoked_at, created_at
            FROM refresh_tokens
            WHERE token_hash = $1
            "#,
        )
        .bind(&token_hash)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Refresh token not recognized".into()))?;

        if !stored.is_usable(now) {
            return Err(ServiceError::Forbidden("Refresh token expired or revoked".into()));
        }

        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, tenant_id, email, password_hash, display_name, role,
                   created_at, updated_at, deleted_at
            FROM users
            WHERE tenant_id = $1 AND id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(stored.tenant_id)
        .bind(stored.user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::NotFound("User no longer exists".into()))?;

        let new_raw = auth::new_refresh_token();
        let new_hash = auth::hash_refresh_token(&new_raw);
        let expires_at = now + Duration::days(config::config().security.refresh_expiry_days);

        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE refresh_tokens SET revoked_at = $1 WHERE id = $2")
            .bind(now)
            .bind(stored.id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (tenant_id, user_id, token_hash, expires_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(user.tenant_id)
        .bind(user.id)
        .bind(&new_hash)
        .bind(expires_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        let access_token = self.mint_access_token(&user)?;
        let pair = TokenPair {
            access_token,
            refresh_token: new_raw,
            expires_in: config::config().security.jwt_expiry_hours as i64 * 3600,
        };
        Ok((user, pair))
    }

    /// Revoke a refresh token, scoped to the calling user
    pub async fn logout(&self, tenant_id: Uuid, user_id: Uuid, raw_token: &str) -> ServiceResult<()> {
        let token_hash = auth::hash_refresh_token(raw_token);

        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens SET revoked_at = now()
            WHERE tenant_id = $1 AND user_id = $2 AND token_hash = $3 AND revoked_at IS NULL
            "#,
        )
        .bind(tenant_id)
        .bind(user_id)
        .bind(&token_hash)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound("Refresh token not found".into()));
        }
        Ok(())
    }

    async fn issue_tokens(&self, user: &User) -> ServiceResult<TokenPair> {
        let access_token = self.mint_access_token(user)?;

        let raw = auth::new_refresh_token();
        let hash = auth::hash_refresh_token(&raw);
        let expires_at = Utc::now() + Duration::days(config::config().security.refresh_expiry_days);

        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (tenant_id, user_id, token_hash, expires_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(user.tenant_id)
        .bind(user.id)
        .bind(&hash)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(TokenPair {
            access_token,
            refresh_token: raw,
            expires_in: config::config().security.jwt_expiry_hours as i64 * 3600,
        })
    }

    fn mint_access_token(&self, user: &User) -> ServiceResult<String> {
        let claims = Claims::new(
            user.id,
            user.tenant_id,
            user.email.clone(),
            vec![user.role.clone()],
        );
        auth::generate_access_token(&claims)
            .map_err(|e| ServiceError::Invalid(format!("Could not mint token: {}", e)))
    }
}

pub fn hash_password(password: &str) -> ServiceResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| ServiceError::Hashing(e.to_string()))
}

pub fn verify_password(password: &str, stored_hash: &str) -> ServiceResult<bool> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| ServiceError::Hashing(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

fn validate_slug(slug: &str) -> ServiceResult<()> {
    if slug.len() < 2 || slug.len() > 64 {
        return Err(ServiceError::Invalid("Tenant slug must be 2-64 characters".into()));
    }
    if !slug.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        return Err(ServiceError::Invalid(
            "Tenant slug can only contain letters, numbers, hyphens, and underscores".into(),
        ));
    }
    Ok(())
}

fn validate_email(email: &str) -> ServiceResult<()> {
    let valid = email.contains('@') && !email.starts_with('@') && !email.ends_with('@');
    if !valid {
        return Err(ServiceError::Invalid("Invalid email address".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(verify_password("correct horse battery", &hash).unwrap());
        assert!(!verify_password("wrong password", &hash).unwrap());
    }

    #[test]
    fn slug_validation() {
        assert!(validate_slug("acme-inc").is_ok());
        assert!(validate_slug("a").is_err());
        assert!(validate_slug("has spaces").is_err());
    }

    #[test]
    fn email_validation() {
        assert!(validate_email("a@b.co").is_ok());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("@leading").is_err());
    }
}
