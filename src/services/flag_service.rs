use murmur3::murmur3_32;
use sqlx::PgPool;
use std::io::Cursor;
use uuid::Uuid;

use super::{ServiceError, ServiceResult};
use crate::database::manager::DatabaseManager;
use crate::database::models::FeatureFlag;
use crate::middleware::response::PageParams;

pub struct FlagService {
    pool: PgPool,
}

#[derive(Debug, serde::Deserialize)]
pub struct FlagCreate {
    pub key: String,
    pub description: Option<String>,
    pub enabled: Option<bool>,
    pub rollout_percentage: Option<i32>,
}

#[derive(Debug, Default, serde::Deserialize)]
pub struct FlagUpdate {
    pub description: Option<String>,
    pub enabled: Option<bool>,
    pub rollout_percentage: Option<i32>,
}

#[derive(Debug, PartialEq, Eq, serde::Serialize)]
pub struct Evaluation {
    pub key: String,
    pub enabled: bool,
    pub reason: &'static str,
}

impl FlagService {
    pub async fn new() -> ServiceResult<Self> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self { pool })
    }

    pub async fn create(&self, tenant_id: Uuid, create: FlagCreate) -> ServiceResult<FeatureFlag> {
        validate_key(&create.key)?;
        let rollout = create.rollout_percentage.unwrap_or(100);
        validate_rollout(rollout)?;

        let flag = sqlx::query_as::<_, FeatureFlag>(
            r#"
            INSERT INTO feature_flags (tenant_id, key, description, enabled, rollout_percentage)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, tenant_id, key, description, enabled, rollout_percentage,
                      created_at, updated_at
            "#,
        )
        .bind(tenant_id)
        .bind(&create.key)
        .bind(&create.description)
        .bind(create.enabled.unwrap_or(false))
        .bind(rollout)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db) = &e {
                if db.is_unique_violation() {
                    return ServiceError::Conflict(format!("Flag '{}' already exists", create.key));
                }
            }
            ServiceError::from(e)
        })?;

        Ok(flag)
    }

    pub async fn list(
        &self,
        tenant_id: Uuid,
        params: &PageParams,
    ) -> ServiceResult<(Vec<FeatureFlag>, i64)> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM feature_flags WHERE tenant_id = $1")
                .bind(tenant_id)
                .fetch_one(&self.pool)
                .await?;

        let flags = sqlx::query_as::<_, FeatureFlag>(
            r#"
            SELECT id, tenant_id, key, description, enabled, rollout_percentage,
                   created_at, updated_at
            FROM feature_flags
            WHERE tenant_id = $1
            ORDER BY key ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(tenant_id)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((flags, total))
    }

    pub async fn get(&self, tenant_id: Uuid, key: &str) -> ServiceResult<FeatureFlag> {
        sqlx::query_as::<_, FeatureFlag>(
            r#"
            SELECT id, tenant_id, key, description, enabled, rollout_percentage,
                   created_at, updated_at
            FROM feature_flags
            WHERE tenant_id = $1 AND key = $2
            "#,
        )
        .bind(tenant_id)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Flag not found".into()))
    }

    pub async fn update(
        &self,
        tenant_id: Uuid,
        key: &str,
        update: FlagUpdate,
    ) -> ServiceResult<FeatureFlag> {
        if let Some(rollout) = update.rollout_percentage {
            validate_rollout(rollout)?;
        }

        sqlx::query_as::<_, FeatureFlag>(
            r#"
            UPDATE feature_flags
            SET description = COALESCE($3, description),
                enabled = COALESCE($4, enabled),
                rollout_percentage = COALESCE($5, rollout_percentage),
                updated_at = now()
            WHERE tenant_id = $1 AND key = $2
            RETURNING id, tenant_id, key, description, enabled, rollout_percentage,
                      created_at, updated_at
            "#,
        )
        .bind(tenant_id)
        .bind(key)
        .bind(update.description)
        .bind(update.enabled)
        .bind(update.rollout_percentage)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Flag not found".into()))
    }

    pub async fn delete(&self, tenant_id: Uuid, key: &str) -> ServiceResult<()> {
        let result = sqlx::query("DELETE FROM feature_flags WHERE tenant_id = $1 AND key = $2")
            .bind(tenant_id)
            .bind(key)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound("Flag not found".into()));
        }
        Ok(())
    }

    pub async fn evaluate(&self, tenant_id: Uuid, key: &str, user_id: Uuid) -> ServiceResult<Evaluation> {
        let flag = self.get(tenant_id, key).await?;
        Ok(evaluate_flag(&flag, user_id))
    }
}

/// Deterministic rollout decision for a (flag, user) pair
pub fn evaluate_flag(flag: &FeatureFlag, user_id: Uuid) -> Evaluation {
    if !flag.enabled {
        return Evaluation { key: flag.key.clone(), enabled: false, reason: "disabled" };
    }
    if flag.rollout_percentage >= 100 {
        return Evaluation { key: flag.key.clone(), enabled: true, reason: "full" };
    }

    let in_bucket = in_rollout(&flag.key, user_id, flag.rollout_percentage as u32);
    Evaluation {
        key: flag.key.clone(),
        enabled: in_bucket,
        reason: if in_bucket { "rollout" } else { "bucketed_out" },
    }
}

/// Consistent hash bucketing: a user's bucket for a flag never changes, so
/// raising the percentage only ever adds users.
fn in_rollout(flag_key: &str, user_id: Uuid, percentage: u32) -> bool {
    let input = format!("{}.{}", flag_key, user_id);
    let hash = murmur3_32(&mut Cursor::new(input.as_bytes()), 0).unwrap_or(0);
    let bucket = hash % 100;
    bucket < percentage
}

fn validate_key(key: &str) -> ServiceResult<()> {
    if key.is_empty() || key.len() > 128 {
        return Err(ServiceError::Invalid("Flag key must be 1-128 characters".into()));
    }
    if !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.') {
        return Err(ServiceError::Invalid(
            "Flag key can only contain letters, numbers, hyphens, underscores, and dots".into(),
        ));
    }
    Ok(())
}

fn validate_rollout(percentage: i32) -> ServiceResult<()> {
    if !(0..=100).contains(&percentage) {
        return Err(ServiceError::Invalid("Rollout percentage must be 0-100".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn flag(enabled: bool, rollout: i32) -> FeatureFlag {
        FeatureFlag {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            key: "new-board-view".to_string(),
            description: None,
            enabled,
            rollout_percentage: rollout,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn disabled_flag_is_off_for_everyone() {
        let f = flag(false, 100);
        let eval = evaluate_flag(&f, Uuid::new_v4());
        assert!(!eval.enabled);
        assert_eq!(eval.reason, "disabled");
    }

    #[test]
    fn full_rollout_is_on_for_everyone() {
        let f = flag(true, 100);
        assert!(evaluate_flag(&f, Uuid::new_v4()).enabled);
    }

    #[test]
    fn zero_rollout_is_off_for_everyone() {
        let f = flag(true, 0);
        for _ in 0..50 {
            assert!(!evaluate_flag(&f, Uuid::new_v4()).enabled);
        }
    }

    #[test]
    fn bucketing_is_deterministic_per_user() {
        let f = flag(true, 50);
        let user = Uuid::new_v4();
        let first = evaluate_flag(&f, user).enabled;
        for _ in 0..10 {
            assert_eq!(evaluate_flag(&f, user).enabled, first);
        }
    }

    #[test]
    fn rollout_fraction_is_roughly_honored() {
        let f = flag(true, 30);
        let hits = (0..1000)
            .filter(|_| evaluate_flag(&f, Uuid::new_v4()).enabled)
            .count();
        // 30% of 1000 with generous slack for hash variance
        assert!((150..=450).contains(&hits), "unexpected hit count: {}", hits);
    }

    #[test]
    fn raising_percentage_never_drops_users() {
        let users: Vec<Uuid> = (0..200).map(|_| Uuid::new_v4()).collect();
        let low = flag(true, 20);
        let high = flag(true, 60);
        for user in &users {
            if evaluate_flag(&low, *user).enabled {
                assert!(evaluate_flag(&high, *user).enabled);
            }
        }
    }
}
