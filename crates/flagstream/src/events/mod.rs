//! Analytics event payloads
//!
//! Only the pieces the streaming client itself needs: identify events and
//! private-attribute redaction of user payloads. Event delivery is a
//! separate subsystem.

mod redaction;

pub use redaction::scrub_user;

use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use serde_json::Value;

use crate::config::Config;
use crate::user::User;

/// Milliseconds since the Unix epoch, the service's event timestamp format
fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Sent when the active user changes
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyEvent {
    kind: &'static str,
    creation_date: u64,
    key: String,
    user: Value,
}

impl IdentifyEvent {
    pub fn new(user: &User, config: &Config) -> Self {
        Self {
            kind: "identify",
            creation_date: now_millis(),
            key: user.key().to_string(),
            user: scrub_user(user, config),
        }
    }
}
