use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::auth::Actor;

/// One audit record, emitted as a JSON line on the `audit` log target.
#[derive(Debug, Serialize)]
pub struct AuditEntry<'a> {
    pub at: DateTime<Utc>,
    pub actor: &'a str,
    pub role: &'a str,
    pub action: &'a str,
    pub target_type: &'a str,
    pub target_id: &'a str,
    pub details: Value,
}

pub fn log(actor: &Actor, action: &str, target_type: &str, target_id: &str, details: Value) {
    let entry = AuditEntry {
        at: Utc::now(),
        actor: &actor.name,
        role: &actor.role,
        action,
        target_type,
        target_id,
        details,
    };
    match serde_json::to_string(&entry) {
        Ok(line) => log::info!(target: "audit", "{line}"),
        Err(e) => log::error!("Failed to serialize audit entry for {action}: {e}"),
    }
}
