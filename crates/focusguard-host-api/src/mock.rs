//! Mock rule table and scheduler for testing

use async_trait::async_trait;
use focusguard_util::RuleId;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::{
    AlarmEvent, AlarmScheduler, CompiledRule, HostError, HostResult, RuleTable,
};

/// In-memory rule table with the same all-or-nothing update semantics as a
/// real one
pub struct MockRuleTable {
    rules: Arc<Mutex<BTreeMap<RuleId, CompiledRule>>>,
    replace_calls: AtomicUsize,

    /// Configure listing to fail
    pub fail_list: Arc<Mutex<bool>>,

    /// Configure updates to fail
    pub fail_replace: Arc<Mutex<bool>>,

    /// Delay applied inside every update (simulates a slow host)
    pub replace_delay: Arc<Mutex<Option<Duration>>>,
}

impl MockRuleTable {
    pub fn new() -> Self {
        Self {
            rules: Arc::new(Mutex::new(BTreeMap::new())),
            replace_calls: AtomicUsize::new(0),
            fail_list: Arc::new(Mutex::new(false)),
            fail_replace: Arc::new(Mutex::new(false)),
            replace_delay: Arc::new(Mutex::new(None)),
        }
    }

    /// Install rules directly, bypassing failure flags
    pub fn preload(&self, rules: Vec<CompiledRule>) {
        let mut table = self.rules.lock().unwrap();
        for rule in rules {
            table.insert(rule.id, rule);
        }
    }

    /// Installed rules ordered by id
    pub fn rules(&self) -> Vec<CompiledRule> {
        self.rules.lock().unwrap().values().cloned().collect()
    }

    /// Installed url filters ordered by rule id
    pub fn url_filters(&self) -> Vec<String> {
        self.rules()
            .iter()
            .map(|r| r.url_filter().to_string())
            .collect()
    }

    pub fn rule_count(&self) -> usize {
        self.rules.lock().unwrap().len()
    }

    /// Number of `replace` calls that reached the table
    pub fn replace_calls(&self) -> usize {
        self.replace_calls.load(Ordering::SeqCst)
    }
}

impl Default for MockRuleTable {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RuleTable for MockRuleTable {
    async fn list_rule_ids(&self) -> HostResult<Vec<RuleId>> {
        if *self.fail_list.lock().unwrap() {
            return Err(HostError::RuleTable("Mock list failure".into()));
        }
        Ok(self.rules.lock().unwrap().keys().copied().collect())
    }

    async fn replace(&self, remove: &[RuleId], add: Vec<CompiledRule>) -> HostResult<()> {
        self.replace_calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.replace_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if *self.fail_replace.lock().unwrap() {
            return Err(HostError::RuleTable("Mock replace failure".into()));
        }

        let mut table = self.rules.lock().unwrap();
        let mut next = table.clone();
        for id in remove {
            next.remove(id);
        }
        for rule in add {
            if next.contains_key(&rule.id) {
                return Err(HostError::RuleTable(format!(
                    "Rule with id {} already exists",
                    rule.id
                )));
            }
            next.insert(rule.id, rule);
        }
        *table = next;
        Ok(())
    }
}

/// Scheduler that records armed alarms and fires them on demand
pub struct MockScheduler {
    alarms: Arc<Mutex<HashMap<String, Duration>>>,
    event_tx: mpsc::UnboundedSender<AlarmEvent>,
    event_rx: Arc<Mutex<Option<mpsc::UnboundedReceiver<AlarmEvent>>>>,

    /// Configure create to fail
    pub fail_create: Arc<Mutex<bool>>,
}

impl MockScheduler {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        Self {
            alarms: Arc::new(Mutex::new(HashMap::new())),
            event_tx: tx,
            event_rx: Arc::new(Mutex::new(Some(rx))),
            fail_create: Arc::new(Mutex::new(false)),
        }
    }

    /// Delay `name` was armed with, if it is armed
    pub fn armed(&self, name: &str) -> Option<Duration> {
        self.alarms.lock().unwrap().get(name).copied()
    }

    pub fn armed_count(&self) -> usize {
        self.alarms.lock().unwrap().len()
    }

    /// Simulate `name` reaching its deadline. Returns false if it was not armed.
    pub fn fire(&self, name: &str) -> bool {
        let armed = self.alarms.lock().unwrap().remove(name).is_some();
        if armed {
            let _ = self.event_tx.send(AlarmEvent { name: name.to_string() });
        }
        armed
    }
}

impl Default for MockScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AlarmScheduler for MockScheduler {
    async fn create(&self, name: &str, delay: Duration) -> HostResult<()> {
        if *self.fail_create.lock().unwrap() {
            return Err(HostError::Scheduler("Mock create failure".into()));
        }
        self.alarms.lock().unwrap().insert(name.to_string(), delay);
        Ok(())
    }

    async fn clear(&self, name: &str) -> HostResult<bool> {
        Ok(self.alarms.lock().unwrap().remove(name).is_some())
    }

    fn subscribe(&self) -> Option<mpsc::UnboundedReceiver<AlarmEvent>> {
        self.event_rx.lock().unwrap().take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ResourceType, RuleAction, RuleCondition};

    fn rule(id: u32, filter: &str) -> CompiledRule {
        CompiledRule {
            id: RuleId::new(id),
            priority: 1,
            action: RuleAction::redirect_to("/blocked.html"),
            condition: RuleCondition {
                url_filter: filter.into(),
                resource_types: vec![ResourceType::MainFrame],
            },
        }
    }

    #[tokio::test]
    async fn replace_removes_then_adds() {
        let table = MockRuleTable::new();
        table.preload(vec![rule(1, "*://*.a.com/*"), rule(2, "*://*.b.com/*")]);

        let ids = table.list_rule_ids().await.unwrap();
        table
            .replace(&ids, vec![rule(1000, "*://*.c.com/*")])
            .await
            .unwrap();

        assert_eq!(table.url_filters(), vec!["*://*.c.com/*"]);
        assert_eq!(table.replace_calls(), 1);
    }

    #[tokio::test]
    async fn duplicate_id_leaves_table_untouched() {
        let table = MockRuleTable::new();
        table.preload(vec![rule(1000, "*://*.a.com/*")]);

        let result = table.replace(&[], vec![rule(1000, "*://*.b.com/*")]).await;

        assert!(result.is_err());
        assert_eq!(table.url_filters(), vec!["*://*.a.com/*"]);
    }

    #[tokio::test]
    async fn failing_replace() {
        let table = MockRuleTable::new();
        table.preload(vec![rule(1, "*://*.a.com/*")]);
        *table.fail_replace.lock().unwrap() = true;

        assert!(table.replace(&[RuleId::new(1)], Vec::new()).await.is_err());
        assert_eq!(table.rule_count(), 1);
    }

    #[tokio::test]
    async fn scheduler_replaces_same_name() {
        let scheduler = MockScheduler::new();
        let mut rx = scheduler.subscribe().unwrap();
        assert!(scheduler.subscribe().is_none());

        scheduler.create("sessionEnd", Duration::from_secs(60)).await.unwrap();
        scheduler.create("sessionEnd", Duration::from_secs(120)).await.unwrap();
        assert_eq!(scheduler.armed_count(), 1);
        assert_eq!(scheduler.armed("sessionEnd"), Some(Duration::from_secs(120)));

        assert!(scheduler.fire("sessionEnd"));
        assert_eq!(rx.recv().await.unwrap().name, "sessionEnd");
        assert!(!scheduler.fire("sessionEnd"));
    }

    #[tokio::test]
    async fn scheduler_clear() {
        let scheduler = MockScheduler::new();
        scheduler.create("sessionEnd", Duration::from_secs(60)).await.unwrap();

        assert!(scheduler.clear("sessionEnd").await.unwrap());
        assert!(!scheduler.clear("sessionEnd").await.unwrap());
        assert!(scheduler.armed("sessionEnd").is_none());
    }
}
