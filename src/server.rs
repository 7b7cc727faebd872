use axum::{
    middleware::from_fn,
    routing::{delete, get, patch, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::authz;
use crate::handlers::{elevated, protected, public};
use crate::middleware as mw;

/// Build the full application router. Public routes carry no guards;
/// protected routes run authentication then the tenant guard; elevated
/// routes additionally pass the admin role gate.
pub fn app() -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(public_routes())
        .merge(protected_routes())
        .merge(elevated_routes())
        // Global middleware
        .layer(from_fn(mw::rate_limit::rate_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

pub async fn serve() -> anyhow::Result<()> {
    let app = app();

    // Allow tests or deployments to override port via env
    let port = std::env::var("TASKDECK_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!("taskdeck-api listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}

fn public_routes() -> Router {
    use public::{auth, files};

    Router::new()
        .route("/api/v1/auth/signup", post(auth::signup))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/refresh", post(auth::refresh))
        // Signature-authenticated callback from the scanning service
        .route("/api/v1/files/scan-callback", post(files::scan_callback))
}

fn protected_routes() -> Router {
    use protected::{
        activity, auth, comments, files, flags, invites, monitoring, projects, tasks, users,
        workspaces,
    };

    Router::new()
        // Session
        .route("/api/v1/auth/me", get(auth::me))
        .route("/api/v1/auth/logout", delete(auth::logout))
        // Users
        .route("/api/v1/users", get(users::list))
        .route(
            "/api/v1/users/:id",
            get(users::get).patch(users::update).delete(users::delete),
        )
        // Workspaces and membership
        .route("/api/v1/workspaces", get(workspaces::list).post(workspaces::create))
        .route(
            "/api/v1/workspaces/:id",
            get(workspaces::get)
                .patch(workspaces::update)
                .delete(workspaces::delete),
        )
        .route("/api/v1/workspaces/:id/members", get(workspaces::members))
        .route(
            "/api/v1/workspaces/:id/members/:user_id",
            delete(workspaces::remove_member),
        )
        // Projects
        .route("/api/v1/projects", get(projects::list).post(projects::create))
        .route(
            "/api/v1/projects/:id",
            get(projects::get).patch(projects::update).delete(projects::delete),
        )
        // Tasks and nested comments
        .route("/api/v1/tasks", get(tasks::list).post(tasks::create))
        .route(
            "/api/v1/tasks/:id",
            get(tasks::get).patch(tasks::update).delete(tasks::delete),
        )
        .route(
            "/api/v1/tasks/:id/comments",
            get(comments::list).post(comments::create),
        )
        .route(
            "/api/v1/comments/:id",
            patch(comments::update).delete(comments::delete),
        )
        // Invites
        .route("/api/v1/invites", get(invites::list).post(invites::create))
        .route("/api/v1/invites/:id/accept", post(invites::accept))
        .route("/api/v1/invites/:id/decline", post(invites::decline))
        // Activity
        .route("/api/v1/activity", get(activity::list))
        // Files
        .route("/api/v1/files", get(files::list))
        .route("/api/v1/files/presign", post(files::presign))
        // Feature flags
        .route("/api/v1/flags", get(flags::list).post(flags::create))
        .route(
            "/api/v1/flags/:key",
            get(flags::get).patch(flags::update).delete(flags::delete),
        )
        .route("/api/v1/flags/:key/evaluate", get(flags::evaluate))
        // Monitoring
        .route("/api/v1/monitoring/metrics", get(monitoring::metrics))
        // Guard chain: authentication resolves the context, then the
        // tenant guard requires it (layers run outermost-last)
        .layer(from_fn(mw::tenant::require_tenant))
        .layer(from_fn(mw::auth::require_auth))
}

fn elevated_routes() -> Router {
    use elevated::tenants;

    Router::new()
        .route("/api/v1/tenants", get(tenants::list))
        .route("/api/v1/tenants/:id", get(tenants::get).delete(tenants::delete))
        .route("/api/v1/tenants/:id/stats", get(tenants::stats))
        .layer(from_fn(authz::require_admin))
        .layer(from_fn(mw::tenant::require_tenant))
        .layer(from_fn(mw::auth::require_auth))
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "taskdeck-api",
            "version": version,
            "description": "Multi-tenant task management REST API",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "auth": "/api/v1/auth/* (signup, login, refresh public; me, logout protected)",
                "users": "/api/v1/users (protected)",
                "workspaces": "/api/v1/workspaces (protected)",
                "projects": "/api/v1/projects (protected)",
                "tasks": "/api/v1/tasks (protected)",
                "comments": "/api/v1/tasks/:id/comments (protected)",
                "invites": "/api/v1/invites (protected)",
                "activity": "/api/v1/activity (protected)",
                "files": "/api/v1/files/* (protected; scan-callback is signature-authenticated)",
                "flags": "/api/v1/flags (protected)",
                "monitoring": "/api/v1/monitoring/* (protected)",
                "tenants": "/api/v1/tenants (restricted, admin role required)",
            }
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match crate::database::manager::DatabaseManager::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
