use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub jobs: JobsConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enable_rate_limiting: bool,
    pub rate_limit_requests: u32,
    pub rate_limit_window_secs: u64,
    pub default_page_limit: i64,
    pub max_page_limit: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub refresh_expiry_days: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsConfig {
    pub enable_scheduler: bool,
    pub retention_interval_hours: u64,
    pub backup_interval_hours: u64,
    pub activity_retention_days: i64,
    pub backup_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub upload_base_url: String,
    pub upload_url_ttl_secs: i64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout =
                v.parse().unwrap_or(self.database.connection_timeout);
        }

        // API overrides
        if let Ok(v) = env::var("API_ENABLE_RATE_LIMITING") {
            self.api.enable_rate_limiting = v.parse().unwrap_or(self.api.enable_rate_limiting);
        }
        if let Ok(v) = env::var("API_RATE_LIMIT_REQUESTS") {
            self.api.rate_limit_requests = v.parse().unwrap_or(self.api.rate_limit_requests);
        }
        if let Ok(v) = env::var("API_RATE_LIMIT_WINDOW_SECS") {
            self.api.rate_limit_window_secs =
                v.parse().unwrap_or(self.api.rate_limit_window_secs);
        }
        if let Ok(v) = env::var("API_DEFAULT_PAGE_LIMIT") {
            self.api.default_page_limit = v.parse().unwrap_or(self.api.default_page_limit);
        }
        if let Ok(v) = env::var("API_MAX_PAGE_LIMIT") {
            self.api.max_page_limit = v.parse().unwrap_or(self.api.max_page_limit);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_REFRESH_EXPIRY_DAYS") {
            self.security.refresh_expiry_days =
                v.parse().unwrap_or(self.security.refresh_expiry_days);
        }

        // Jobs overrides
        if let Ok(v) = env::var("JOBS_ENABLE_SCHEDULER") {
            self.jobs.enable_scheduler = v.parse().unwrap_or(self.jobs.enable_scheduler);
        }
        if let Ok(v) = env::var("JOBS_RETENTION_INTERVAL_HOURS") {
            self.jobs.retention_interval_hours =
                v.parse().unwrap_or(self.jobs.retention_interval_hours);
        }
        if let Ok(v) = env::var("JOBS_BACKUP_INTERVAL_HOURS") {
            self.jobs.backup_interval_hours =
                v.parse().unwrap_or(self.jobs.backup_interval_hours);
        }
        if let Ok(v) = env::var("JOBS_ACTIVITY_RETENTION_DAYS") {
            self.jobs.activity_retention_days =
                v.parse().unwrap_or(self.jobs.activity_retention_days);
        }
        if let Ok(v) = env::var("JOBS_BACKUP_DIR") {
            self.jobs.backup_dir = v;
        }

        // Storage overrides
        if let Ok(v) = env::var("STORAGE_UPLOAD_BASE_URL") {
            self.storage.upload_base_url = v;
        }
        if let Ok(v) = env::var("STORAGE_UPLOAD_URL_TTL_SECS") {
            self.storage.upload_url_ttl_secs =
                v.parse().unwrap_or(self.storage.upload_url_ttl_secs);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig { max_connections: 10, connection_timeout: 30 },
            api: ApiConfig {
                enable_rate_limiting: false,
                rate_limit_requests: 1000,
                rate_limit_window_secs: 60,
                default_page_limit: 25,
                max_page_limit: 200,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ],
                jwt_secret: "dev-secret-change-me".to_string(),
                jwt_expiry_hours: 24,
                refresh_expiry_days: 30,
            },
            jobs: JobsConfig {
                enable_scheduler: false,
                retention_interval_hours: 24,
                backup_interval_hours: 24,
                activity_retention_days: 90,
                backup_dir: "./backups".to_string(),
            },
            storage: StorageConfig {
                upload_base_url: "http://localhost:3000/uploads".to_string(),
                upload_url_ttl_secs: 900,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig { max_connections: 20, connection_timeout: 10 },
            api: ApiConfig {
                enable_rate_limiting: true,
                rate_limit_requests: 100,
                rate_limit_window_secs: 60,
                default_page_limit: 25,
                max_page_limit: 100,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.taskdeck.example.com".to_string()],
                jwt_secret: String::new(),
                jwt_expiry_hours: 8,
                refresh_expiry_days: 14,
            },
            jobs: JobsConfig {
                enable_scheduler: true,
                retention_interval_hours: 24,
                backup_interval_hours: 24,
                activity_retention_days: 60,
                backup_dir: "/var/lib/taskdeck/backups".to_string(),
            },
            storage: StorageConfig {
                upload_base_url: "https://uploads.staging.taskdeck.example.com".to_string(),
                upload_url_ttl_secs: 600,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig { max_connections: 50, connection_timeout: 5 },
            api: ApiConfig {
                enable_rate_limiting: true,
                rate_limit_requests: 60,
                rate_limit_window_secs: 60,
                default_page_limit: 25,
                max_page_limit: 100,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://app.taskdeck.example.com".to_string()],
                jwt_secret: String::new(),
                jwt_expiry_hours: 4,
                refresh_expiry_days: 7,
            },
            jobs: JobsConfig {
                enable_scheduler: true,
                retention_interval_hours: 24,
                backup_interval_hours: 24,
                activity_retention_days: 30,
                backup_dir: "/var/lib/taskdeck/backups".to_string(),
            },
            storage: StorageConfig {
                upload_base_url: "https://uploads.taskdeck.example.com".to_string(),
                upload_url_ttl_secs: 300,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_defaults() {
        let config = AppConfig::development();
        assert!(!config.api.enable_rate_limiting);
        assert_eq!(config.api.default_page_limit, 25);
        assert!(!config.security.jwt_secret.is_empty());
        assert!(!config.jobs.enable_scheduler);
    }

    #[test]
    fn production_defaults() {
        let config = AppConfig::production();
        assert!(config.api.enable_rate_limiting);
        assert!(config.jobs.enable_scheduler);
        // Production refuses to mint tokens until JWT_SECRET is provided
        assert!(config.security.jwt_secret.is_empty());
    }
}
