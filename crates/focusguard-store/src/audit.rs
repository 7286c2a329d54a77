//! Audit event types

use chrono::{DateTime, Local};
use focusguard_api::SessionEndReason;
use serde::{Deserialize, Serialize};

/// Types of audit events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEventType {
    /// Service started
    ServiceStarted,

    /// Service stopped
    ServiceStopped,

    /// First-run defaults written for keys that were absent
    DefaultsSeeded { keys: Vec<String> },

    /// Session started
    SessionStarted {
        duration_minutes: u32,
        hard_mode: bool,
    },

    /// Session ended
    SessionEnded {
        reason: SessionEndReason,
        focus_minutes: u32,
    },

    /// Early stop refused because the phrase did not match
    StopRejected,

    /// Rule table reconciled
    RulesSynchronized {
        session_active: bool,
        rule_count: usize,
    },

    /// Client connected
    ClientConnected {
        client_id: String,
        uid: Option<u32>,
    },

    /// Client disconnected
    ClientDisconnected { client_id: String },
}

/// Full audit event with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event ID
    pub id: i64,

    /// Event timestamp
    pub timestamp: DateTime<Local>,

    /// Event type and details
    pub event: AuditEventType,
}

impl AuditEvent {
    pub fn new(event: AuditEventType) -> Self {
        Self {
            id: 0, // Will be set by store
            timestamp: focusguard_util::now(),
            event,
        }
    }
}
