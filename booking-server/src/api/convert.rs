//! Request payload conversions shared by handlers

use serde::Deserialize;
use shared::reservation::{Actor, ActorRole};

use crate::utils::{AppError, AppResult};
use crate::utils::time::parse_rfc3339_millis;

/// Actor identification carried by mutating requests.
///
/// Identity/permission *resolution* belongs to the surrounding application;
/// the engine trusts the declared role and only uses it for its own gates
/// (staff-only operations, client cutoff rules) and for audit stamps.
#[derive(Debug, Clone, Deserialize)]
pub struct ActorPayload {
    pub actor_id: i64,
    pub actor_role: ActorRole,
    #[serde(default)]
    pub actor_name: Option<String>,
}

impl ActorPayload {
    pub fn into_actor(self) -> Actor {
        Actor {
            user_id: self.actor_id,
            role: self.actor_role,
            name: self.actor_name.unwrap_or_else(|| "unknown".to_string()),
        }
    }
}

/// Parse an RFC 3339 timestamp field into Unix millis
pub fn parse_timestamp(field: &str, value: &str) -> AppResult<i64> {
    parse_rfc3339_millis(value)
        .map_err(|e| AppError::validation(format!("{field}: {e}")))
}
