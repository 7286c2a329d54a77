//! Change reactor: keeps the rule table in step with storage writes

use focusguard_store::{StateKey, StoreChange};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};

use crate::sync::{RuleSynchronizer, SyncOutcome};
use crate::{CoreEvent, CoreResult};

/// Resynchronizes whenever a key that feeds the block set is written,
/// whatever wrote it.
pub struct ChangeReactor {
    sync: Arc<RuleSynchronizer>,
    events: broadcast::Sender<CoreEvent>,
}

impl ChangeReactor {
    pub fn new(sync: Arc<RuleSynchronizer>, events: broadcast::Sender<CoreEvent>) -> Self {
        Self { sync, events }
    }

    /// Keys whose writes can change the rule table
    pub fn watches(key: StateKey) -> bool {
        matches!(
            key,
            StateKey::Blocklist | StateKey::BlockGroups | StateKey::Session
        )
    }

    /// React to one write. Returns `None` for keys that don't matter.
    pub async fn handle_change(&self, change: StoreChange) -> Option<CoreResult<SyncOutcome>> {
        if !Self::watches(change.key) {
            return None;
        }
        debug!(key = %change.key, "Relevant state changed, resynchronizing");
        Some(self.resync().await)
    }

    /// Consume the store's change stream until it closes
    pub async fn run(self, mut changes: broadcast::Receiver<StoreChange>) {
        info!("Change reactor started");
        loop {
            let result = match changes.recv().await {
                Ok(change) => self.handle_change(change).await,
                Err(RecvError::Lagged(missed)) => {
                    // Whatever was missed, one pass against current state covers it
                    warn!(missed, "Change stream lagged");
                    Some(self.resync().await)
                }
                Err(RecvError::Closed) => break,
            };

            if let Some(Err(e)) = result {
                warn!(error = %e, "Resynchronization after change failed");
            }
        }
        info!("Change reactor stopped");
    }

    async fn resync(&self) -> CoreResult<SyncOutcome> {
        let outcome = self.sync.synchronize_current().await?;
        let _ = self.events.send(CoreEvent::RulesSynchronized {
            session_active: outcome.session_active,
            rule_count: outcome.rule_count,
        });
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::StateAccess;
    use focusguard_api::Session;
    use focusguard_config::RuleSettings;
    use focusguard_host_api::MockRuleTable;
    use focusguard_store::{SqliteStore, Store};
    use serde_json::json;
    use std::time::Duration;

    fn setup() -> (Arc<SqliteStore>, Arc<MockRuleTable>, ChangeReactor) {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let table = Arc::new(MockRuleTable::new());
        let sync = Arc::new(RuleSynchronizer::new(
            table.clone(),
            StateAccess::new(store.clone()),
            RuleSettings::default(),
        ));
        let (tx, _) = broadcast::channel(16);
        (store, table, ChangeReactor::new(sync, tx))
    }

    #[tokio::test]
    async fn irrelevant_keys_ignored() {
        let (_, table, reactor) = setup();

        let result = reactor
            .handle_change(StoreChange {
                key: StateKey::Stats,
            })
            .await;

        assert!(result.is_none());
        assert_eq!(table.replace_calls(), 0);
    }

    #[tokio::test]
    async fn blocklist_write_during_session_applied() {
        let (store, table, reactor) = setup();
        StateAccess::new(store.clone())
            .set_session(&Session::started(focusguard_util::now(), 25, None))
            .unwrap();
        store.set(StateKey::Blocklist, &json!(["a.com", "b.com"])).unwrap();

        let outcome = reactor
            .handle_change(StoreChange {
                key: StateKey::Blocklist,
            })
            .await
            .unwrap()
            .unwrap();

        assert!(outcome.session_active);
        assert_eq!(table.rule_count(), 2);
    }

    #[tokio::test]
    async fn run_follows_store_writes() {
        let (store, table, reactor) = setup();
        let handle = tokio::spawn(reactor.run(store.subscribe()));

        StateAccess::new(store.clone())
            .set_session(&Session::started(focusguard_util::now(), 25, None))
            .unwrap();
        store
            .set(
                StateKey::BlockGroups,
                &json!([{"name": "g", "websites": ["c.com"], "active": true}]),
            )
            .unwrap();

        let mut converged = false;
        for _ in 0..50 {
            if table.url_filters() == vec!["*://*.c.com/*".to_string()] {
                converged = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(converged);

        handle.abort();
    }
}
