//! Session token validation
//!
//! Tokens are issued by the external session provider; the worker only
//! validates them and turns their claims into a [`Session`].

use anyhow::{anyhow, Result};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CrmError;
use crate::tenancy::{resolve_tenant_context, Session, TenantContext};
use crate::types::Request;

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// User email
    pub email: String,
    /// User role (SUPER_ADMIN, ADMIN, AGENT)
    pub role: String,
    /// Admin ID (for agents - the admin they work under)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_id: Option<String>,
    /// Issued at (unix timestamp)
    pub iat: usize,
    /// Expiration (unix timestamp)
    pub exp: usize,
}

/// Validate a JWT token and return claims
pub fn validate_token(token: &str, secret: &str) -> Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| anyhow!("Invalid token: {}", e))?;

    Ok(token_data.claims)
}

/// Turn a raw token into a session.
pub fn session_from_token(token: &str, secret: &str) -> Result<Session> {
    let claims = validate_token(token, secret)?;
    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|e| anyhow!("Invalid user_id in token: {}", e))?;
    let admin_id = claims
        .admin_id
        .as_deref()
        .map(Uuid::parse_str)
        .transpose()
        .map_err(|e| anyhow!("Invalid admin_id in token: {}", e))?;

    Ok(Session {
        user_id,
        role: claims.role,
        admin_id,
    })
}

/// Extract the session from a NATS request. A missing or invalid token is an error.
pub fn extract_session<T>(request: &Request<T>, jwt_secret: &str) -> Result<Session> {
    match request.token {
        Some(ref token) => session_from_token(token, jwt_secret),
        None => Err(anyhow!("No authentication provided — session token is required")),
    }
}

/// Authenticate and resolve the tenant in one step, as every scoped handler needs.
pub fn authorize<T>(request: &Request<T>, jwt_secret: &str) -> Result<TenantContext, CrmError> {
    let session = extract_session(request, jwt_secret).map_err(|e| {
        tracing::debug!("Rejected session: {}", e);
        CrmError::Unauthorized
    })?;
    Ok(resolve_tenant_context(&session)?)
}

/// Issue a token the way the session provider does. Test-only.
#[cfg(test)]
pub fn generate_token(user_id: Uuid, role: &str, admin_id: Option<Uuid>, secret: &str) -> String {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let now = chrono::Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: user_id.to_string(),
        email: format!("{}@example.com", role.to_lowercase()),
        role: role.to_string(),
        admin_id: admin_id.map(|id| id.to_string()),
        iat: now,
        exp: now + 60 * 60,
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
        .expect("token encodes")
}
