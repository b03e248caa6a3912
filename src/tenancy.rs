//! Multi-tenancy guard
//!
//! A tenant is an admin account. Agents work inside their admin's tenant, so
//! every lead, import batch, status, reminder and activity is stamped with the
//! admin's id regardless of which of the two created it.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Role carried by the caller's session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    SuperAdmin,
    Admin,
    Agent,
}

impl Role {
    pub fn parse(s: &str) -> Option<Role> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SUPER_ADMIN" | "SUPERADMIN" => Some(Role::SuperAdmin),
            "ADMIN" => Some(Role::Admin),
            "AGENT" => Some(Role::Agent),
            _ => None,
        }
    }
}

/// Tenant identifier: the owning admin's user id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct TenantId(pub Uuid);

impl TenantId {
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Authenticated caller, as asserted by the session token
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: Uuid,
    /// Raw role string; unknown roles are rejected by the guard, not the parser.
    pub role: String,
    /// The admin an agent belongs to
    pub admin_id: Option<Uuid>,
}

impl Session {
    pub fn role(&self) -> Option<Role> {
        Role::parse(&self.role)
    }

    pub fn is_super_admin(&self) -> bool {
        self.role() == Some(Role::SuperAdmin)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TenancyError {
    #[error("Role '{0}' cannot act inside a tenant")]
    InvalidRole(String),

    #[error("Agent {0} has no admin association")]
    MissingAdminAssociation(Uuid),

    #[error("Role '{0}' cannot use platform-wide operations")]
    PlatformRoleRequired(String),
}

/// Resolved tenant plus the acting user, passed to every scoped operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantContext {
    pub tenant_id: TenantId,
    pub user_id: Uuid,
    pub role: Role,
}

/// Derive the tenant a session acts in.
///
/// Admins own their tenant. Agents act in their admin's tenant and must
/// carry an admin association. Every other role is refused.
pub fn resolve_tenant_context(session: &Session) -> Result<TenantContext, TenancyError> {
    match session.role() {
        Some(Role::Admin) => Ok(TenantContext {
            tenant_id: TenantId(session.user_id),
            user_id: session.user_id,
            role: Role::Admin,
        }),
        Some(Role::Agent) => {
            let admin_id = session
                .admin_id
                .ok_or(TenancyError::MissingAdminAssociation(session.user_id))?;
            Ok(TenantContext {
                tenant_id: TenantId(admin_id),
                user_id: session.user_id,
                role: Role::Agent,
            })
        }
        _ => Err(TenancyError::InvalidRole(session.role.clone())),
    }
}

/// Gate for the cross-tenant overview: only a super admin passes.
pub fn require_super_admin(session: &Session) -> Result<(), TenancyError> {
    if session.is_super_admin() {
        Ok(())
    } else {
        Err(TenancyError::PlatformRoleRequired(session.role.clone()))
    }
}
