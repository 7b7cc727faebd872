use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::activity_service;
use super::workspace_service::WorkspaceService;
use super::{ServiceError, ServiceResult};
use crate::database::manager::DatabaseManager;
use crate::database::models::invite::{INVITE_ACCEPTED, INVITE_DECLINED};
use crate::database::models::{Invite, WorkspaceMember};
use crate::jobs::queue::{self, Job};
use crate::middleware::response::PageParams;

const INVITE_EXPIRY_DAYS: i64 = 7;

pub struct InviteService {
    pool: PgPool,
}

impl InviteService {
    pub async fn new() -> ServiceResult<Self> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn create(
        &self,
        tenant_id: Uuid,
        actor_id: Uuid,
        workspace_id: Uuid,
        email: &str,
        role: &str,
    ) -> ServiceResult<Invite> {
        role.parse::<crate::authz::Role>().map_err(ServiceError::Invalid)?;
        if !email.contains('@') {
            return Err(ServiceError::Invalid("Invalid invite email".into()));
        }

        let workspace_exists: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM workspaces WHERE tenant_id = $1 AND id = $2")
                .bind(tenant_id)
                .bind(workspace_id)
                .fetch_optional(&self.pool)
                .await?;
        if workspace_exists.is_none() {
            return Err(ServiceError::NotFound("Workspace not found".into()));
        }

        let pending: Option<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT id FROM invites
            WHERE tenant_id = $1 AND resource_id = $2 AND email = $3 AND status = 'pending'
            "#,
        )
        .bind(tenant_id)
        .bind(workspace_id)
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        if pending.is_some() {
            return Err(ServiceError::Conflict("An invite for this email is already pending".into()));
        }

        let expires_at = Utc::now() + Duration::days(INVITE_EXPIRY_DAYS);

        let invite = sqlx::query_as::<_, Invite>(
            r#"
            INSERT INTO invites (tenant_id, email, resource_type, resource_id, role,
                                 invited_by, expires_at)
            VALUES ($1, $2, 'workspace', $3, $4, $5, $6)
            RETURNING id, tenant_id, email, resource_type, resource_id, role, status,
                      invited_by, expires_at, accepted_at, declined_at, created_at
            "#,
        )
        .bind(tenant_id)
        .bind(email)
        .bind(workspace_id)
        .bind(role)
        .bind(actor_id)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;

        activity_service::record(
            &self.pool,
            tenant_id,
            actor_id,
            "invite.created",
            "invite",
            invite.id,
            Some(serde_json::json!({ "workspace_id": workspace_id, "role": role })),
        )
        .await;

        queue::enqueue(Job::InviteEmail { tenant_id, invite_id: invite.id });

        Ok(invite)
    }

    /// Pending invites addressed to the authenticated email
    pub async fn list_for_email(
        &self,
        tenant_id: Uuid,
        email: &str,
        params: &PageParams,
    ) -> ServiceResult<(Vec<Invite>, i64)> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM invites WHERE tenant_id = $1 AND email = $2 AND status = 'pending'",
        )
        .bind(tenant_id)
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        let invites = sqlx::query_as::<_, Invite>(
            r#"
            SELECT id, tenant_id, email, resource_type, resource_id, role, status,
                   invited_by, expires_at, accepted_at, declined_at, created_at
            FROM invites
            WHERE tenant_id = $1 AND email = $2 AND status = 'pending'
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(tenant_id)
        .bind(email)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((invites, total))
    }

    pub async fn list_for_workspace(
        &self,
        tenant_id: Uuid,
        workspace_id: Uuid,
        params: &PageParams,
    ) -> ServiceResult<(Vec<Invite>, i64)> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM invites WHERE tenant_id = $1 AND resource_id = $2",
        )
        .bind(tenant_id)
        .bind(workspace_id)
        .fetch_one(&self.pool)
        .await?;

        let invites = sqlx::query_as::<_, Invite>(
            r#"
            SELECT id, tenant_id, email, resource_type, resource_id, role, status,
                   invited_by, expires_at, accepted_at, declined_at, created_at
            FROM invites
            WHERE tenant_id = $1 AND resource_id = $2
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(tenant_id)
        .bind(workspace_id)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((invites, total))
    }

    /// Accept a pending invite: flips status and creates the membership row
    /// in one transaction. The authenticated email must match the invite.
    pub async fn accept(
        &self,
        tenant_id: Uuid,
        invite_id: Uuid,
        user_id: Uuid,
        user_email: &str,
    ) -> ServiceResult<(Invite, WorkspaceMember)> {
        let invite = self.load_pending(tenant_id, invite_id).await?;

        if !invite.email.eq_ignore_ascii_case(user_email) {
            return Err(ServiceError::Forbidden("Invite was issued to a different email".into()));
        }

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        // The status predicate makes the transition race-safe: a concurrent
        // accept/decline loses and affects zero rows.
        let updated = sqlx::query_as::<_, Invite>(
            r#"
            UPDATE invites
            SET status = $3, accepted_at = $4
            WHERE tenant_id = $1 AND id = $2 AND status = 'pending'
            RETURNING id, tenant_id, email, resource_type, resource_id, role, status,
                      invited_by, expires_at, accepted_at, declined_at, created_at
            "#,
        )
        .bind(tenant_id)
        .bind(invite_id)
        .bind(INVITE_ACCEPTED)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Invite is not pending".into()))?;

        let workspace_service = WorkspaceService::new().await?;
        let member = workspace_service
            .add_member(&mut tx, tenant_id, updated.resource_id, user_id, &updated.role)
            .await?;

        tx.commit().await?;

        activity_service::record(
            &self.pool,
            tenant_id,
            user_id,
            "invite.accepted",
            "invite",
            updated.id,
            Some(serde_json::json!({ "workspace_id": updated.resource_id })),
        )
        .await;

        Ok((updated, member))
    }

    /// Decline a pending invite; terminal, no membership is created
    pub async fn decline(
        &self,
        tenant_id: Uuid,
        invite_id: Uuid,
        user_id: Uuid,
        user_email: &str,
    ) -> ServiceResult<Invite> {
        let invite = self.load_pending(tenant_id, invite_id).await?;

        if !invite.email.eq_ignore_ascii_case(user_email) {
            return Err(ServiceError::Forbidden("Invite was issued to a different email".into()));
        }

        let updated = sqlx::query_as::<_, Invite>(
            r#"
            UPDATE invites
            SET status = $3, declined_at = $4
            WHERE tenant_id = $1 AND id = $2 AND status = 'pending'
            RETURNING id, tenant_id, email, resource_type, resource_id, role, status,
                      invited_by, expires_at, accepted_at, declined_at, created_at
            "#,
        )
        .bind(tenant_id)
        .bind(invite_id)
        .bind(INVITE_DECLINED)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Invite is not pending".into()))?;

        activity_service::record(
            &self.pool,
            tenant_id,
            user_id,
            "invite.declined",
            "invite",
            updated.id,
            None,
        )
        .await;

        Ok(updated)
    }

    async fn load_pending(&self, tenant_id: Uuid, invite_id: Uuid) -> ServiceResult<Invite> {
        let invite = sqlx::query_as::<_, Invite>(
            r#"
            SELECT id, tenant_id, email, resource_type, resource_id, role, status,
                   invited_by, expires_at, accepted_at, declined_at, created_at
            FROM invites
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(invite_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Invite not found".into()))?;

        if !invite.is_pending() {
            return Err(ServiceError::NotFound("Invite is not pending".into()));
        }
        if invite.is_expired(Utc::now()) {
            return Err(ServiceError::Invalid("Invite has expired".into()));
        }

        Ok(invite)
    }
}
