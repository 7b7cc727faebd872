//! Role model and authorization predicates.
//!
//! Tenant-level roles ride in the access token; workspace-level roles live
//! in workspace_members rows. Both use the same hierarchy:
//! owner > admin > member.

pub mod workspace;

use axum::{extract::Request, middleware::Next, response::Response};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ApiError;
use crate::middleware::auth::TenantContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Admin,
    Member,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Admin => "admin",
            Role::Member => "member",
        }
    }

    /// Roles whose required-role checks this role satisfies
    pub fn permits(&self) -> &'static [Role] {
        match self {
            Role::Owner => &[Role::Owner, Role::Admin, Role::Member],
            Role::Admin => &[Role::Admin, Role::Member],
            Role::Member => &[Role::Member],
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(Role::Owner),
            "admin" => Ok(Role::Admin),
            "member" => Ok(Role::Member),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// Route-level role check. An empty required list means the route has no
/// role restriction; otherwise the held set must intersect it.
pub fn roles_allow(required: &[Role], held: &[Role]) -> bool {
    if required.is_empty() {
        return true;
    }
    held.iter().any(|r| required.contains(r))
}

/// Hierarchy-aware check for workspace membership roles: the member's role
/// expands to its permitted set before intersecting with the requirement.
pub fn member_role_allows(member_role: Role, required: &[Role]) -> bool {
    if required.is_empty() {
        return true;
    }
    member_role.permits().iter().any(|r| required.contains(r))
}

/// Predicate form used by handlers; failure is fatal to the request.
pub fn require_roles(ctx: &TenantContext, required: &[Role]) -> Result<(), ApiError> {
    if roles_allow(required, &ctx.roles) {
        Ok(())
    } else {
        Err(ApiError::forbidden("Insufficient role for this operation"))
    }
}

/// Middleware gate for the elevated admin surface. The only place tenant
/// scoping is deliberately bypassed, so it is separately role-gated.
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let ctx = request
        .extensions()
        .get::<TenantContext>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    require_roles(ctx, &[Role::Admin, Role::Owner])?;
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_required_always_allows() {
        assert!(roles_allow(&[], &[Role::Member]));
        assert!(roles_allow(&[], &[]));
    }

    #[test]
    fn disjoint_role_sets_deny() {
        assert!(!roles_allow(&[Role::Admin], &[Role::Member]));
        assert!(!roles_allow(&[Role::Owner, Role::Admin], &[]));
    }

    #[test]
    fn intersection_allows() {
        assert!(roles_allow(&[Role::Admin, Role::Member], &[Role::Member]));
    }

    #[test]
    fn hierarchy_owner_passes_everything() {
        assert!(member_role_allows(Role::Owner, &[Role::Owner]));
        assert!(member_role_allows(Role::Owner, &[Role::Admin]));
        assert!(member_role_allows(Role::Owner, &[Role::Member]));
    }

    #[test]
    fn hierarchy_admin_covers_admin_and_member() {
        assert!(member_role_allows(Role::Admin, &[Role::Admin]));
        assert!(member_role_allows(Role::Admin, &[Role::Member]));
        assert!(!member_role_allows(Role::Admin, &[Role::Owner]));
    }

    #[test]
    fn hierarchy_member_only_member() {
        assert!(member_role_allows(Role::Member, &[Role::Member]));
        assert!(!member_role_allows(Role::Member, &[Role::Admin]));
        assert!(!member_role_allows(Role::Member, &[Role::Owner]));
    }

    #[test]
    fn role_parse_round_trip() {
        for role in [Role::Owner, Role::Admin, Role::Member] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("superuser".parse::<Role>().is_err());
    }
}
