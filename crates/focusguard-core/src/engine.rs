//! Core engine: the single entry point the service drives

use chrono::{DateTime, Local};
use focusguard_api::{
    BlocklistEntry, BlocklistItem, CustomContent, Group, HealthStatus, Session, Stats,
};
use focusguard_config::Policy;
use focusguard_host_api::{AlarmScheduler, RuleTable};
use focusguard_store::Store;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::groups::GroupManager;
use crate::reactor::ChangeReactor;
use crate::seed::seed_defaults;
use crate::session::{ResumeOutcome, SessionManager, StopOutcome};
use crate::state::StateAccess;
use crate::stats::StatsTracker;
use crate::sync::{RuleSynchronizer, SyncOutcome};
use crate::{CoreEvent, CoreResult};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// The focus-session engine.
///
/// All methods take `&self`; the pieces that need mutual exclusion (session
/// transitions, synchronization passes, group edits) serialize internally, so
/// the engine is shared as `Arc<CoreEngine>`.
pub struct CoreEngine {
    policy: Policy,
    state: StateAccess,
    sync: Arc<RuleSynchronizer>,
    sessions: SessionManager,
    groups: GroupManager,
    stats: StatsTracker,
    events: broadcast::Sender<CoreEvent>,
}

impl CoreEngine {
    pub fn new(
        policy: Policy,
        store: Arc<dyn Store>,
        rule_table: Arc<dyn RuleTable>,
        scheduler: Arc<dyn AlarmScheduler>,
    ) -> Self {
        let state = StateAccess::new(store);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let sync = Arc::new(RuleSynchronizer::new(
            rule_table,
            state.clone(),
            policy.rules.clone(),
        ));
        let sessions = SessionManager::new(
            state.clone(),
            sync.clone(),
            scheduler,
            policy.session.clone(),
            events.clone(),
        );

        info!(
            max_duration_minutes = policy.session.max_duration_minutes,
            rule_id_offset = policy.rules.id_offset,
            "Core engine initialized"
        );

        Self {
            groups: GroupManager::new(state.clone()),
            stats: StatsTracker::new(state.clone()),
            policy,
            state,
            sync,
            sessions,
            events,
        }
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<CoreEvent> {
        self.events.subscribe()
    }

    /// Reactor to run on the store's change stream
    pub fn change_reactor(&self) -> ChangeReactor {
        ChangeReactor::new(self.sync.clone(), self.events.clone())
    }

    /// Startup: write first-run defaults, then bring the rule table and the
    /// session alarm in line with whatever session was persisted
    pub async fn initialize(&self, now: DateTime<Local>) -> CoreResult<ResumeOutcome> {
        seed_defaults(&self.state, &self.policy, now)?;
        self.sessions.resume(now).await
    }

    // Session lifecycle

    pub async fn start_session(
        &self,
        duration_minutes: u32,
        hard_mode: bool,
        now: DateTime<Local>,
    ) -> CoreResult<Session> {
        self.sessions.start(duration_minutes, hard_mode, now).await
    }

    pub async fn stop_session(
        &self,
        verification_phrase: Option<&str>,
        now: DateTime<Local>,
    ) -> CoreResult<StopOutcome> {
        self.sessions.stop(verification_phrase, now).await
    }

    /// The session alarm fired
    pub async fn expire_session(&self, now: DateTime<Local>) -> CoreResult<StopOutcome> {
        self.sessions.expire(now).await
    }

    pub fn session_status(&self, now: DateTime<Local>) -> CoreResult<Session> {
        self.sessions.get_status(now)
    }

    pub fn verification_phrase(&self) -> CoreResult<Option<String>> {
        self.sessions.get_verification_phrase()
    }

    pub fn stats(&self) -> CoreResult<Stats> {
        self.stats.current()
    }

    // Block sources

    pub fn blocklist(&self) -> CoreResult<Vec<BlocklistEntry>> {
        self.state.blocklist()
    }

    /// Replace the flat blocklist; resynchronizes if a session is running.
    /// Blank entries are dropped.
    pub async fn update_blocklist(&self, items: Vec<BlocklistItem>) -> CoreResult<()> {
        let entries: Vec<BlocklistEntry> = items
            .into_iter()
            .map(BlocklistEntry::from)
            .filter_map(|mut entry| {
                entry.url_pattern = entry.url_pattern.trim().to_string();
                (!entry.url_pattern.is_empty()).then_some(entry)
            })
            .collect();

        self.state.set_blocklist(&entries)?;
        info!(entries = entries.len(), "Blocklist updated");

        self.resync_if_active().await?;
        Ok(())
    }

    /// Groups were edited elsewhere; resynchronizes if a session is running
    pub async fn update_block_groups(&self) -> CoreResult<Option<SyncOutcome>> {
        self.resync_if_active().await
    }

    pub fn list_groups(&self) -> CoreResult<Vec<Group>> {
        self.groups.list()
    }

    pub async fn create_group(
        &self,
        name: &str,
        websites: &[String],
        time_limit: Option<u32>,
        now: DateTime<Local>,
    ) -> CoreResult<Group> {
        let time_limit = time_limit.unwrap_or(focusguard_api::DEFAULT_TIME_LIMIT_MINUTES);
        self.groups.create(name, websites, time_limit, now).await
    }

    pub async fn toggle_group(&self, name: &str) -> CoreResult<bool> {
        self.groups.toggle(name).await
    }

    pub async fn delete_group(&self, name: &str) -> CoreResult<Group> {
        self.groups.delete(name).await
    }

    // Interstitial content

    pub fn custom_content(&self) -> CoreResult<CustomContent> {
        Ok(self.state.custom_content()?.unwrap_or_else(|| {
            CustomContent::message(self.policy.interstitial.default_message.clone())
        }))
    }

    pub fn set_custom_content(&self, content: &CustomContent) -> CoreResult<()> {
        self.state.set_custom_content(content)?;
        debug!(content_type = ?content.content_type, "Interstitial content updated");
        Ok(())
    }

    pub fn health(&self) -> HealthStatus {
        HealthStatus {
            live: true,
            store_ok: self.state.store().is_healthy(),
            rule_table_ok: self.sync.is_healthy(),
            session_active: self.state.session().map(|s| s.active).unwrap_or(false),
        }
    }

    async fn resync_if_active(&self) -> CoreResult<Option<SyncOutcome>> {
        if !self.state.session()?.active {
            return Ok(None);
        }
        let outcome = self.sync.synchronize(true).await?;
        let _ = self.events.send(CoreEvent::RulesSynchronized {
            session_active: outcome.session_active,
            rule_count: outcome.rule_count,
        });
        Ok(Some(outcome))
    }
}
