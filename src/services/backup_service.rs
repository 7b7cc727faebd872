//! Mocked backup pipeline: serialize per-table row counts into a JSON
//! artifact, checksum it, and keep a manifest alongside. Restore validates
//! the checksum before reporting what it would load.

use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::{ServiceError, ServiceResult};
use crate::database::manager::DatabaseManager;

const BACKED_UP_TABLES: &[&str] = &[
    "tenants",
    "users",
    "workspaces",
    "workspace_members",
    "projects",
    "tasks",
    "comments",
    "invites",
    "activity_logs",
    "attachments",
    "feature_flags",
];

#[derive(Debug, Serialize, Deserialize)]
pub struct BackupArtifact {
    pub created_at: DateTime<Utc>,
    pub tables: BTreeMap<String, i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BackupManifest {
    pub artifact: String,
    pub checksum: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct RestorePlan {
    pub artifact: String,
    pub tables: BTreeMap<String, i64>,
    pub total_rows: i64,
}

pub struct BackupService {
    pool: PgPool,
}

impl BackupService {
    pub async fn new() -> ServiceResult<Self> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self { pool })
    }

    /// Snapshot row counts for every backed-up table and write the artifact
    /// plus its manifest under `dir`.
    pub async fn run_backup(&self, dir: &Path) -> ServiceResult<BackupManifest> {
        let counts = try_join_all(BACKED_UP_TABLES.iter().map(|table| {
            let pool = self.pool.clone();
            async move {
                // Table names come from the fixed list above, never from input
                let count: i64 =
                    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
                        .fetch_one(&pool)
                        .await?;
                Ok::<_, sqlx::Error>((table.to_string(), count))
            }
        }))
        .await?;

        let artifact = BackupArtifact {
            created_at: Utc::now(),
            tables: counts.into_iter().collect(),
        };

        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| ServiceError::Invalid(format!("Cannot create backup dir: {}", e)))?;

        let stamp = artifact.created_at.format("%Y%m%dT%H%M%SZ");
        let artifact_path = dir.join(format!("backup-{}.json", stamp));
        let manifest_path = dir.join(format!("backup-{}.manifest.json", stamp));

        let bytes = serde_json::to_vec_pretty(&artifact)
            .map_err(|e| ServiceError::Invalid(format!("Serialize failed: {}", e)))?;
        tokio::fs::write(&artifact_path, &bytes)
            .await
            .map_err(|e| ServiceError::Invalid(format!("Write failed: {}", e)))?;

        let manifest = BackupManifest {
            artifact: artifact_path.to_string_lossy().into_owned(),
            checksum: checksum(&bytes),
            created_at: artifact.created_at,
        };
        let manifest_bytes = serde_json::to_vec_pretty(&manifest)
            .map_err(|e| ServiceError::Invalid(format!("Serialize failed: {}", e)))?;
        tokio::fs::write(&manifest_path, &manifest_bytes)
            .await
            .map_err(|e| ServiceError::Invalid(format!("Write failed: {}", e)))?;

        tracing::info!(
            "Backup written: {} ({} tables)",
            manifest.artifact,
            artifact.tables.len()
        );
        Ok(manifest)
    }
}

/// Recompute the artifact checksum and compare against the manifest
pub async fn verify_backup(manifest_path: &Path) -> ServiceResult<BackupManifest> {
    let manifest = read_manifest(manifest_path).await?;

    let bytes = tokio::fs::read(&manifest.artifact)
        .await
        .map_err(|e| ServiceError::NotFound(format!("Backup artifact missing: {}", e)))?;

    if checksum(&bytes) != manifest.checksum {
        return Err(ServiceError::Invalid(
            "Backup checksum mismatch; artifact is corrupt".into(),
        ));
    }

    Ok(manifest)
}

/// Validate the artifact, then report what a restore would load
pub async fn restore_backup(manifest_path: &Path) -> ServiceResult<RestorePlan> {
    let manifest = verify_backup(manifest_path).await?;

    let bytes = tokio::fs::read(&manifest.artifact)
        .await
        .map_err(|e| ServiceError::NotFound(format!("Backup artifact missing: {}", e)))?;
    let artifact: BackupArtifact = serde_json::from_slice(&bytes)
        .map_err(|e| ServiceError::Invalid(format!("Backup artifact unreadable: {}", e)))?;

    let total_rows = artifact.tables.values().sum();
    Ok(RestorePlan {
        artifact: manifest.artifact,
        tables: artifact.tables,
        total_rows,
    })
}

/// Most recent manifest in a backup directory, if any
pub async fn latest_manifest(dir: &Path) -> ServiceResult<Option<PathBuf>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(_) => return Ok(None),
    };

    let mut manifests: Vec<PathBuf> = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| ServiceError::Invalid(format!("Cannot read backup dir: {}", e)))?
    {
        let path = entry.path();
        if path.to_string_lossy().ends_with(".manifest.json") {
            manifests.push(path);
        }
    }

    manifests.sort();
    Ok(manifests.pop())
}

async fn read_manifest(path: &Path) -> ServiceResult<BackupManifest> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ServiceError::NotFound(format!("Manifest missing: {}", e)))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| ServiceError::Invalid(format!("Manifest unreadable: {}", e)))
}

fn checksum(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn write_fixture(dir: &Path) -> PathBuf {
        let artifact = BackupArtifact {
            created_at: Utc::now(),
            tables: [("tasks".to_string(), 42i64)].into_iter().collect(),
        };
        let bytes = serde_json::to_vec_pretty(&artifact).unwrap();
        let artifact_path = dir.join("backup-test.json");
        tokio::fs::write(&artifact_path, &bytes).await.unwrap();

        let manifest = BackupManifest {
            artifact: artifact_path.to_string_lossy().into_owned(),
            checksum: checksum(&bytes),
            created_at: artifact.created_at,
        };
        let manifest_path = dir.join("backup-test.manifest.json");
        tokio::fs::write(&manifest_path, serde_json::to_vec_pretty(&manifest).unwrap())
            .await
            .unwrap();
        manifest_path
    }

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("taskdeck-backup-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn verify_accepts_untouched_artifact() {
        let dir = temp_dir();
        let manifest_path = write_fixture(&dir).await;

        let manifest = verify_backup(&manifest_path).await.unwrap();
        assert!(!manifest.checksum.is_empty());

        let plan = restore_backup(&manifest_path).await.unwrap();
        assert_eq!(plan.tables.get("tasks"), Some(&42));
        assert_eq!(plan.total_rows, 42);
    }

    #[tokio::test]
    async fn verify_rejects_corrupted_artifact() {
        let dir = temp_dir();
        let manifest_path = write_fixture(&dir).await;

        let manifest = read_manifest(&manifest_path).await.unwrap();
        let mut bytes = tokio::fs::read(&manifest.artifact).await.unwrap();
        bytes[0] ^= 0xff;
        tokio::fs::write(&manifest.artifact, &bytes).await.unwrap();

        assert!(verify_backup(&manifest_path).await.is_err());
    }

    #[tokio::test]
    async fn latest_manifest_finds_newest() {
        let dir = temp_dir();
        assert!(latest_manifest(&dir).await.unwrap().is_none());

        write_fixture(&dir).await;
        let found = latest_manifest(&dir).await.unwrap();
        assert!(found.is_some());
    }
}
