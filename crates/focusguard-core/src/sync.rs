//! Rule synchronizer: makes the rule table match the derived block set

use focusguard_config::RuleSettings;
use focusguard_host_api::RuleTable;
use focusguard_store::{AuditEvent, AuditEventType};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::blocklist::collect_patterns;
use crate::rules::compile_rules;
use crate::state::StateAccess;
use crate::{CoreError, CoreResult};

/// Result of one synchronization pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOutcome {
    pub session_active: bool,
    /// Rules removed from the table
    pub removed: usize,
    /// Rules installed by this pass
    pub rule_count: usize,
}

/// Owns the dynamic rule set of the rule table.
///
/// Passes are serialized: two triggers arriving together run one after the
/// other, each leaving a complete table behind.
pub struct RuleSynchronizer {
    table: Arc<dyn RuleTable>,
    state: StateAccess,
    settings: RuleSettings,
    pass_lock: Mutex<()>,
}

impl RuleSynchronizer {
    pub fn new(table: Arc<dyn RuleTable>, state: StateAccess, settings: RuleSettings) -> Self {
        Self {
            table,
            state,
            settings,
            pass_lock: Mutex::new(()),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.table.is_healthy()
    }

    /// Reconcile the table for the given session state
    pub async fn synchronize(&self, session_active: bool) -> CoreResult<SyncOutcome> {
        let _pass = self.pass_lock.lock().await;
        self.run_pass(session_active).await
    }

    /// Reconcile using the persisted session flag, read inside the pass so a
    /// queued pass never applies a stale flag
    pub async fn synchronize_current(&self) -> CoreResult<SyncOutcome> {
        let _pass = self.pass_lock.lock().await;
        let session_active = self.state.session()?.active;
        self.run_pass(session_active).await
    }

    async fn run_pass(&self, session_active: bool) -> CoreResult<SyncOutcome> {
        let existing = self
            .table
            .list_rule_ids()
            .await
            .map_err(CoreError::RuleTable)?;

        let rules = if session_active {
            let patterns = collect_patterns(&self.state);
            if patterns.is_empty() {
                warn!("No websites to block, leaving rule table empty");
            }
            compile_rules(&patterns, self.settings.id_offset, &self.settings)
        } else {
            Vec::new()
        };

        let outcome = SyncOutcome {
            session_active,
            removed: existing.len(),
            rule_count: rules.len(),
        };

        if existing.is_empty() && rules.is_empty() {
            debug!(session_active, "Rule table already empty");
            return Ok(outcome);
        }

        // One combined update so the table is never seen half-applied
        self.table
            .replace(&existing, rules)
            .await
            .map_err(CoreError::RuleTable)?;

        let _ = self
            .state
            .store()
            .append_audit(AuditEvent::new(AuditEventType::RulesSynchronized {
                session_active,
                rule_count: outcome.rule_count,
            }));

        info!(
            session_active,
            removed = outcome.removed,
            rule_count = outcome.rule_count,
            "Rules synchronized"
        );

        Ok(outcome)
    }
}
