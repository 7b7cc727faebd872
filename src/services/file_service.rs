use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::activity_service;
use super::{ServiceError, ServiceResult};
use crate::auth;
use crate::config;
use crate::database::manager::DatabaseManager;
use crate::database::models::attachment::{SCAN_BLOCKED, SCAN_CLEAN, SCAN_PENDING};
use crate::database::models::Attachment;
use crate::middleware::response::PageParams;

const MAX_UPLOAD_BYTES: i64 = 100 * 1024 * 1024;

pub struct FileService {
    pool: PgPool,
}

/// Everything the client needs to PUT the file to storage
#[derive(Debug, serde::Serialize)]
pub struct PresignedUpload {
    pub upload_url: String,
    pub key: String,
    pub expires_at: DateTime<Utc>,
    pub attachment: Attachment,
}

impl FileService {
    pub async fn new() -> ServiceResult<Self> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self { pool })
    }

    /// Issue a presigned upload URL and record the attachment as pending
    /// scan. The upload itself goes straight to storage; this API only
    /// brokers the URL.
    pub async fn presign(
        &self,
        tenant_id: Uuid,
        actor_id: Uuid,
        file_name: &str,
        content_type: &str,
        size_bytes: i64,
    ) -> ServiceResult<PresignedUpload> {
        if file_name.trim().is_empty() {
            return Err(ServiceError::Invalid("File name is required".into()));
        }
        if size_bytes <= 0 || size_bytes > MAX_UPLOAD_BYTES {
            return Err(ServiceError::Invalid(format!(
                "File size must be between 1 and {} bytes",
                MAX_UPLOAD_BYTES
            )));
        }

        let key = format!("{}/{}/{}", tenant_id, Uuid::new_v4(), sanitize_file_name(file_name));

        let attachment = sqlx::query_as::<_, Attachment>(
            r#"
            INSERT INTO attachments (tenant_id, file_name, content_type, size_bytes,
                                     upload_key, scan_status, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, tenant_id, task_id, file_name, content_type, size_bytes,
                      upload_key, scan_status, created_by, created_at, updated_at
            "#,
        )
        .bind(tenant_id)
        .bind(file_name)
        .bind(content_type)
        .bind(size_bytes)
        .bind(&key)
        .bind(SCAN_PENDING)
        .bind(actor_id)
        .fetch_one(&self.pool)
        .await?;

        let storage = &config::config().storage;
        let expires_at = Utc::now() + chrono::Duration::seconds(storage.upload_url_ttl_secs);
        let signature = auth::sign_upload_key(&key, expires_at.timestamp());
        let upload_url = format!(
            "{}/{}?expires={}&signature={}",
            storage.upload_base_url.trim_end_matches('/'),
            key,
            expires_at.timestamp(),
            signature
        );

        activity_service::record(
            &self.pool,
            tenant_id,
            actor_id,
            "file.presigned",
            "attachment",
            attachment.id,
            None,
        )
        .await;

        Ok(PresignedUpload { upload_url, key, expires_at, attachment })
    }

    /// Scanner callback: records clean/blocked and optionally attaches the
    /// artifact to a task. Authenticated by the presign signature rather
    /// than a user session.
    pub async fn scan_callback(
        &self,
        key: &str,
        expires: i64,
        signature: &str,
        verdict: &str,
        task_id: Option<Uuid>,
    ) -> ServiceResult<Attachment> {
        if !auth::verify_upload_signature(key, expires, signature) {
            return Err(ServiceError::Forbidden("Invalid or expired upload signature".into()));
        }

        let status = match verdict {
            "clean" => SCAN_CLEAN,
            "blocked" => SCAN_BLOCKED,
            other => {
                return Err(ServiceError::Invalid(format!("Unknown scan verdict: {}", other)))
            }
        };

        let attachment = sqlx::query_as::<_, Attachment>(
            r#"
            UPDATE attachments SET scan_status = $2, updated_at = now()
            WHERE upload_key = $1
            RETURNING id, tenant_id, task_id, file_name, content_type, size_bytes,
                      upload_key, scan_status, created_by, created_at, updated_at
            "#,
        )
        .bind(key)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Attachment not found".into()))?;

        // Only clean artifacts attach, and only to tasks in the same tenant
        if let (Some(task_id), SCAN_CLEAN) = (task_id, status) {
            let task: Option<(Uuid,)> =
                sqlx::query_as("SELECT id FROM tasks WHERE tenant_id = $1 AND id = $2")
                    .bind(attachment.tenant_id)
                    .bind(task_id)
                    .fetch_optional(&self.pool)
                    .await?;
            if task.is_none() {
                return Err(ServiceError::NotFound("Task not found".into()));
            }

            let attached = sqlx::query_as::<_, Attachment>(
                r#"
                UPDATE attachments SET task_id = $2, updated_at = now()
                WHERE id = $1
                RETURNING id, tenant_id, task_id, file_name, content_type, size_bytes,
                          upload_key, scan_status, created_by, created_at, updated_at
                "#,
            )
            .bind(attachment.id)
            .bind(task_id)
            .fetch_one(&self.pool)
            .await?;

            return Ok(attached);
        }

        Ok(attachment)
    }

    pub async fn list(
        &self,
        tenant_id: Uuid,
        params: &PageParams,
    ) -> ServiceResult<(Vec<Attachment>, i64)> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM attachments WHERE tenant_id = $1")
                .bind(tenant_id)
                .fetch_one(&self.pool)
                .await?;

        let attachments = sqlx::query_as::<_, Attachment>(
            r#"
            SELECT id, tenant_id, task_id, file_name, content_type, size_bytes,
                   upload_key, scan_status, created_by, created_at, updated_at
            FROM attachments
            WHERE tenant_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(tenant_id)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((attachments, total))
    }
}

fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_are_sanitized() {
        assert_eq!(sanitize_file_name("report q3.pdf"), "report_q3.pdf");
        assert_eq!(sanitize_file_name("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_file_name("ok-name_1.txt"), "ok-name_1.txt");
    }
}
