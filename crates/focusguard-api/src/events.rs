//! Event types for focusguardd -> client streaming

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::{Session, SessionEndReason, Stats, API_VERSION};

/// Event envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub api_version: u32,
    pub timestamp: DateTime<Local>,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(payload: EventPayload) -> Self {
        Self {
            api_version: API_VERSION,
            timestamp: focusguard_util::now(),
            payload,
        }
    }
}

/// All possible events from the service to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    /// A focus session began
    SessionStarted { session: Session },

    /// The focus session ended
    SessionEnded {
        reason: SessionEndReason,
        /// Minutes credited to today's focus time
        focus_minutes: u32,
    },

    /// The rule table was reconciled
    RulesSynchronized {
        session_active: bool,
        rule_count: usize,
    },

    /// Usage statistics changed
    StatsChanged { stats: Stats },

    /// Service is shutting down
    Shutdown,
}
