//! Core events emitted by the engine

use focusguard_api::{Session, SessionEndReason, Stats};

/// Events emitted by the core engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreEvent {
    /// Session started successfully
    SessionStarted { session: Session },

    /// Session has ended
    SessionEnded {
        reason: SessionEndReason,
        focus_minutes: u32,
    },

    /// A synchronization pass completed
    RulesSynchronized {
        session_active: bool,
        rule_count: usize,
    },

    /// Stats record was rewritten
    StatsChanged { stats: Stats },
}
