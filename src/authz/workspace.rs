//! Workspace-membership guard: resolve which workspace a request targets,
//! then check the caller's membership row against a required role set.

use serde_json::Value;
use sqlx::PgPool;
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

use super::{member_role_allows, Role};
use crate::database::models::WorkspaceMember;
use crate::error::ApiError;
use crate::middleware::auth::TenantContext;

/// Resolve the workspace id a request refers to. Aliases are checked in a
/// fixed precedence order; the first hit wins:
/// path id, body workspace_id, path workspaceId, query workspace_id,
/// body workspaceId, query workspaceId.
pub fn extract_workspace_id(
    path: &HashMap<String, String>,
    body: Option<&Value>,
    query: &HashMap<String, String>,
) -> Option<Uuid> {
    let from_path = |key: &str| path.get(key).and_then(|v| Uuid::parse_str(v).ok());
    let from_query = |key: &str| query.get(key).and_then(|v| Uuid::parse_str(v).ok());
    let from_body = |key: &str| {
        body.and_then(|b| b.get(key))
            .and_then(|v| v.as_str())
            .and_then(|v| Uuid::parse_str(v).ok())
    };

    from_path("id")
        .or_else(|| from_body("workspace_id"))
        .or_else(|| from_path("workspaceId"))
        .or_else(|| from_query("workspace_id"))
        .or_else(|| from_body("workspaceId"))
        .or_else(|| from_query("workspaceId"))
}

/// Look up the caller's membership row for a workspace. Absence is a 403,
/// not a 404: the workspace may exist, the caller just isn't in it.
pub async fn require_membership(
    pool: &PgPool,
    ctx: &TenantContext,
    workspace_id: Uuid,
    required: &[Role],
) -> Result<WorkspaceMember, ApiError> {
    let member = sqlx::query_as::<_, WorkspaceMember>(
        r#"
        SELECT id, tenant_id, workspace_id, user_id, role, created_at
        FROM workspace_members
        WHERE tenant_id = $1 AND workspace_id = $2 AND user_id = $3
        "#,
    )
    .bind(ctx.tenant_id)
    .bind(workspace_id)
    .bind(ctx.user_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| {
        tracing::error!("Membership lookup failed: {}", e);
        ApiError::internal_server_error("Failed to check workspace membership")
    })?
    .ok_or_else(|| ApiError::forbidden("Not a member of this workspace"))?;

    let member_role = Role::from_str(&member.role)
        .map_err(|_| ApiError::internal_server_error("Corrupt membership role"))?;

    if member_role_allows(member_role, required) {
        Ok(member)
    } else {
        Err(ApiError::forbidden("Workspace role does not permit this operation"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path_of(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn path_id_wins_over_everything() {
        let path_id = Uuid::new_v4();
        let body_id = Uuid::new_v4();
        let path = path_of(&[("id", &path_id.to_string())]);
        let body = json!({ "workspace_id": body_id.to_string() });

        let got = extract_workspace_id(&path, Some(&body), &HashMap::new());
        assert_eq!(got, Some(path_id));
    }

    #[test]
    fn body_snake_case_beats_query() {
        let body_id = Uuid::new_v4();
        let query_id = Uuid::new_v4();
        let body = json!({ "workspace_id": body_id.to_string() });
        let query = path_of(&[("workspace_id", &query_id.to_string())]);

        let got = extract_workspace_id(&HashMap::new(), Some(&body), &query);
        assert_eq!(got, Some(body_id));
    }

    #[test]
    fn query_snake_case_beats_body_camel_case() {
        let body_id = Uuid::new_v4();
        let query_id = Uuid::new_v4();
        let body = json!({ "workspaceId": body_id.to_string() });
        let query = path_of(&[("workspace_id", &query_id.to_string())]);

        let got = extract_workspace_id(&HashMap::new(), Some(&body), &query);
        assert_eq!(got, Some(query_id));
    }

    #[test]
    fn camel_case_fallbacks_apply_in_order() {
        let body_id = Uuid::new_v4();
        let query_id = Uuid::new_v4();
        let body = json!({ "workspaceId": body_id.to_string() });
        let query = path_of(&[("workspaceId", &query_id.to_string())]);

        let got = extract_workspace_id(&HashMap::new(), Some(&body), &query);
        assert_eq!(got, Some(body_id));

        let got = extract_workspace_id(&HashMap::new(), None, &query);
        assert_eq!(got, Some(query_id));
    }

    #[test]
    fn garbage_values_are_skipped() {
        let query_id = Uuid::new_v4();
        let body = json!({ "workspace_id": "not-a-uuid" });
        let query = path_of(&[("workspace_id", &query_id.to_string())]);

        let got = extract_workspace_id(&HashMap::new(), Some(&body), &query);
        assert_eq!(got, Some(query_id));
    }

    #[test]
    fn nothing_resolves_to_none() {
        assert_eq!(extract_workspace_id(&HashMap::new(), None, &HashMap::new()), None);
    }
}
