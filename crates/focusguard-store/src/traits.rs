//! Store trait definitions

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::{AuditEvent, StoreResult};

/// Keys of the persisted state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateKey {
    #[serde(rename = "blocklist")]
    Blocklist,
    #[serde(rename = "session")]
    Session,
    #[serde(rename = "customContent")]
    CustomContent,
    #[serde(rename = "blockGroups")]
    BlockGroups,
    #[serde(rename = "stats")]
    Stats,
}

impl StateKey {
    pub const ALL: [StateKey; 5] = [
        StateKey::Blocklist,
        StateKey::Session,
        StateKey::CustomContent,
        StateKey::BlockGroups,
        StateKey::Stats,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StateKey::Blocklist => "blocklist",
            StateKey::Session => "session",
            StateKey::CustomContent => "customContent",
            StateKey::BlockGroups => "blockGroups",
            StateKey::Stats => "stats",
        }
    }
}

impl std::fmt::Display for StateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Published after every successful write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreChange {
    pub key: StateKey,
}

/// Main store trait
pub trait Store: Send + Sync {
    // Keyed state

    /// Read the raw value under `key`; `None` if it was never written
    fn get(&self, key: StateKey) -> StoreResult<Option<serde_json::Value>>;

    /// Overwrite the value under `key` and notify subscribers
    fn set(&self, key: StateKey, value: &serde_json::Value) -> StoreResult<()>;

    /// Receive a [`StoreChange`] for every subsequent write
    fn subscribe(&self) -> broadcast::Receiver<StoreChange>;

    // Audit log

    /// Append an audit event
    fn append_audit(&self, event: AuditEvent) -> StoreResult<()>;

    /// Get recent audit events, newest first
    fn get_recent_audits(&self, limit: usize) -> StoreResult<Vec<AuditEvent>>;

    // Health

    /// Check if store is healthy
    fn is_healthy(&self) -> bool;
}
