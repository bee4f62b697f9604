//! Session resolution and lead-level access control.
//!
//! Operator sessions are compact signed tokens: hex-encoded JSON claims
//! plus an HMAC-SHA256 signature, with an embedded expiry. Expired or
//! tampered tokens resolve to "no session" rather than an error, and the
//! scope predicate is enforced server-side on every list/detail/mutate
//! path, not just reflected in the UI.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::leads::domain::LeadRecord;

type HmacSha256 = Hmac<Sha256>;

/// Operator role tiers. `Admin` and `Manager` are management and see all
/// leads; `Agent` is scoped to its fixed assignee name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Manager,
    Agent,
}

impl Role {
    pub const fn is_management(self) -> bool {
        matches!(self, Role::Admin | Role::Manager)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Agent => "agent",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "manager" => Some(Role::Manager),
            "agent" => Some(Role::Agent),
            _ => None,
        }
    }
}

/// Resolved caller identity for one request. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub name: String,
    pub role: Role,
    /// Fixed assignee scope for non-management roles.
    pub assignee: Option<String>,
    pub can_export: bool,
    pub can_assign: bool,
}

impl Principal {
    fn from_claims(claims: SessionClaims) -> Option<Self> {
        let role = Role::parse(&claims.role)?;
        let management = role.is_management();
        Some(Principal {
            name: claims.sub,
            role,
            assignee: claims.assignee,
            can_export: management,
            can_assign: management,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    sub: String,
    role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    assignee: Option<String>,
    exp: i64,
}

/// Issue a signed session token for an operator.
pub fn sign_session(
    secret: &str,
    name: &str,
    role: Role,
    assignee: Option<&str>,
    expires_at: DateTime<Utc>,
) -> Result<String, serde_json::Error> {
    let claims = SessionClaims {
        sub: name.to_string(),
        role: role.label().to_string(),
        assignee: assignee.map(str::to_string),
        exp: expires_at.timestamp(),
    };
    let payload = serde_json::to_vec(&claims)?;
    let signature = sign_bytes(secret, &payload);
    Ok(format!("{}.{}", hex::encode(&payload), signature))
}

/// Resolve a token into a principal. Any defect (malformed encoding,
/// signature mismatch, unknown role, expiry) yields `None`.
pub fn verify_session(secret: &str, token: &str, now: DateTime<Utc>) -> Option<Principal> {
    let (payload_hex, signature_hex) = token.trim().split_once('.')?;
    let payload = hex::decode(payload_hex).ok()?;
    let signature = hex::decode(signature_hex).ok()?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(&payload);
    mac.verify_slice(&signature).ok()?;

    let claims: SessionClaims = serde_json::from_slice(&payload).ok()?;
    if claims.exp <= now.timestamp() {
        return None;
    }
    Principal::from_claims(claims)
}

fn sign_bytes(secret: &str, payload: &[u8]) -> String {
    // HMAC accepts keys of any length, so construction cannot fail here.
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).unwrap_or_else(|_| unreachable!());
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// The lead visibility predicate. Management sees everything; scoped
/// roles see only leads assigned to their own fixed assignee name.
pub fn can_access_lead(principal: &Principal, lead: &LeadRecord) -> bool {
    if principal.role.is_management() {
        return true;
    }
    match (&principal.assignee, &lead.assigned_to) {
        (Some(scope), Some(owner)) => scope.eq_ignore_ascii_case(owner),
        _ => false,
    }
}
