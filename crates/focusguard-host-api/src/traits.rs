//! Host interface traits

use async_trait::async_trait;
use focusguard_util::RuleId;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::CompiledRule;

/// Errors from host operations
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Rule table update rejected: {0}")]
    RuleTable(String),

    #[error("Scheduler error: {0}")]
    Scheduler(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type HostResult<T> = Result<T, HostError>;

/// A named alarm reached its deadline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmEvent {
    pub name: String,
}

/// The external rule table that enforces blocking.
///
/// `replace` is applied as one update: ids in `remove` are dropped and `add`
/// is inserted together, or the table is left untouched on error.
#[async_trait]
pub trait RuleTable: Send + Sync {
    /// Ids of every rule currently installed
    async fn list_rule_ids(&self) -> HostResult<Vec<RuleId>>;

    /// Remove `remove` and insert `add` in a single update
    async fn replace(&self, remove: &[RuleId], add: Vec<CompiledRule>) -> HostResult<()>;

    /// Optional: check if the rule table is reachable
    fn is_healthy(&self) -> bool {
        true
    }
}

/// Named one-shot alarms.
///
/// At most one alarm exists per name; creating a name that is already armed
/// replaces the earlier one.
#[async_trait]
pub trait AlarmScheduler: Send + Sync {
    /// Arm `name` to fire once after `delay`
    async fn create(&self, name: &str, delay: Duration) -> HostResult<()>;

    /// Disarm `name`; returns whether an alarm was armed
    async fn clear(&self, name: &str) -> HostResult<bool>;

    /// Take the stream of fired alarms (may only be taken once)
    fn subscribe(&self) -> Option<mpsc::UnboundedReceiver<AlarmEvent>>;
}
