//! Resource services. Every read/write takes the caller's tenant id as an
//! explicit argument and folds it into the query predicate; no method may
//! omit that filter. The elevated tenant service is the one deliberate
//! exception and is role-gated at the route layer.

pub mod activity_service;
pub mod auth_service;
pub mod backup_service;
pub mod comment_service;
pub mod file_service;
pub mod flag_service;
pub mod invite_service;
pub mod project_service;
pub mod task_service;
pub mod tenant_service;
pub mod user_service;
pub mod workspace_service;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Invalid(String),

    #[error("invalid credentials")]
    Credentials,

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Manager(#[from] crate::database::manager::DatabaseError),

    #[error("hashing error: {0}")]
    Hashing(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;
