//! Session manager: the Idle/Active state machine

use chrono::{DateTime, Local};
use focusguard_api::{Session, SessionEndReason};
use focusguard_config::SessionSettings;
use focusguard_host_api::AlarmScheduler;
use focusguard_store::{AuditEvent, AuditEventType};
use rand::seq::SliceRandom;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::blocklist::collect_patterns;
use crate::pattern::is_valid_pattern;
use crate::state::StateAccess;
use crate::stats::StatsTracker;
use crate::sync::{RuleSynchronizer, SyncOutcome};
use crate::{CoreError, CoreEvent, CoreResult};

/// Name of the one-shot alarm that ends a session
pub const SESSION_END_ALARM: &str = "sessionEnd";

/// How early an expiry may arrive before the session's end and still count
const EXPIRY_TOLERANCE_SECS: i64 = 5;

/// Result of ending (or trying to end) a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopOutcome {
    /// Whether a session was actually running
    pub was_active: bool,
    pub reason: SessionEndReason,
    /// Minutes credited to today's focus time
    pub focus_minutes: u32,
}

/// What happened to a persisted session when the service came up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeOutcome {
    /// No session was running; the rule table was cleared
    Idle,
    /// Session still running; rules reinstalled and alarm re-armed
    Resumed { remaining: Duration },
    /// Session ran out while the service was down
    Expired(StopOutcome),
}

/// Owns the persisted Session record.
///
/// Transitions are serialized so each one reads and writes the full record
/// without interleaving with another.
pub struct SessionManager {
    state: StateAccess,
    sync: Arc<RuleSynchronizer>,
    scheduler: Arc<dyn AlarmScheduler>,
    stats: StatsTracker,
    settings: SessionSettings,
    events: broadcast::Sender<CoreEvent>,
    transition: Mutex<()>,
}

impl SessionManager {
    pub fn new(
        state: StateAccess,
        sync: Arc<RuleSynchronizer>,
        scheduler: Arc<dyn AlarmScheduler>,
        settings: SessionSettings,
        events: broadcast::Sender<CoreEvent>,
    ) -> Self {
        Self {
            stats: StatsTracker::new(state.clone()),
            state,
            sync,
            scheduler,
            settings,
            events,
            transition: Mutex::new(()),
        }
    }

    /// Begin blocking for `duration_minutes`
    pub async fn start(
        &self,
        duration_minutes: u32,
        hard_mode: bool,
        now: DateTime<Local>,
    ) -> CoreResult<Session> {
        let _transition = self.transition.lock().await;

        if self.state.session()?.active {
            debug!("Start rejected: session already active");
            return Err(CoreError::SessionAlreadyActive);
        }

        if duration_minutes == 0 || duration_minutes > self.settings.max_duration_minutes {
            debug!(duration_minutes, "Start rejected: invalid duration");
            return Err(CoreError::InvalidDuration {
                minutes: duration_minutes,
                max: self.settings.max_duration_minutes,
            });
        }

        if !collect_patterns(&self.state)
            .iter()
            .any(|p| is_valid_pattern(p))
        {
            info!("Start rejected: no websites to block");
            return Err(CoreError::NoWebsitesToBlock);
        }

        let phrase = if hard_mode {
            let phrase = self
                .settings
                .verification_phrases
                .choose(&mut rand::thread_rng())
                .ok_or(CoreError::NoPhrasesConfigured)?;
            Some(phrase.clone())
        } else {
            None
        };

        let session = Session::started(now, duration_minutes, phrase);
        self.state.set_session(&session)?;

        match self.stats.on_session_start(&now) {
            Ok(stats) => self.publish(CoreEvent::StatsChanged { stats }),
            Err(e) => warn!(error = %e, "Failed to update stats for session start"),
        }

        let _ = self
            .state
            .store()
            .append_audit(AuditEvent::new(AuditEventType::SessionStarted {
                duration_minutes,
                hard_mode,
            }));

        info!(duration_minutes, hard_mode, "Session started");
        self.publish(CoreEvent::SessionStarted {
            session: session.clone(),
        });

        // Arm the alarm even if the rule table refused the update, so the
        // session still ends on time
        let synced = self.sync.synchronize(true).await;
        self.publish_sync(&synced);
        let armed = self
            .scheduler
            .create(SESSION_END_ALARM, minutes(duration_minutes))
            .await;

        synced?;
        armed.map_err(CoreError::Scheduler)?;
        Ok(session)
    }

    /// End the session at the user's request. A hard-mode session requires
    /// the exact phrase it was started with.
    pub async fn stop(
        &self,
        supplied_phrase: Option<&str>,
        now: DateTime<Local>,
    ) -> CoreResult<StopOutcome> {
        let _transition = self.transition.lock().await;
        let current = self.state.session()?;

        if let Some(required) = current.required_phrase()
            && supplied_phrase != Some(required)
        {
            let _ = self
                .state
                .store()
                .append_audit(AuditEvent::new(AuditEventType::StopRejected));
            info!("Stop rejected: incorrect verification phrase");
            return Err(CoreError::IncorrectPhrase);
        }

        self.end_session(current, SessionEndReason::UserStop, now).await
    }

    /// End the session because its time ran out. Never checks the phrase.
    pub async fn expire(&self, now: DateTime<Local>) -> CoreResult<StopOutcome> {
        let _transition = self.transition.lock().await;
        self.expire_locked(now).await
    }

    /// Reconcile a persisted session with reality after a restart
    pub async fn resume(&self, now: DateTime<Local>) -> CoreResult<ResumeOutcome> {
        let _transition = self.transition.lock().await;
        let current = self.state.session()?;

        if !current.active {
            let synced = self.sync.synchronize(false).await;
            self.publish_sync(&synced);
            synced?;
            return Ok(ResumeOutcome::Idle);
        }

        let remaining = current
            .ends_at()
            .and_then(|end| end.signed_duration_since(now).to_std().ok())
            .filter(|remaining| !remaining.is_zero());

        match remaining {
            Some(remaining) => {
                let synced = self.sync.synchronize(true).await;
                self.publish_sync(&synced);
                let armed = self.scheduler.create(SESSION_END_ALARM, remaining).await;
                synced?;
                armed.map_err(CoreError::Scheduler)?;

                info!(remaining_secs = remaining.as_secs(), "Resumed running session");
                Ok(ResumeOutcome::Resumed { remaining })
            }
            None => {
                info!("Session ended while service was down");
                Ok(ResumeOutcome::Expired(self.expire_locked(now).await?))
            }
        }
    }

    /// Current session with `remaining_time` projected to `now`
    pub fn get_status(&self, now: DateTime<Local>) -> CoreResult<Session> {
        let mut session = self.state.session()?;
        if session.active {
            session.remaining_time = session.remaining_seconds(now);
        }
        Ok(session)
    }

    /// The phrase needed to stop early; only for an active hard-mode session
    pub fn get_verification_phrase(&self) -> CoreResult<Option<String>> {
        let session = self.state.session()?;
        Ok(session
            .required_phrase()
            .filter(|p| !p.is_empty())
            .map(str::to_string))
    }

    async fn expire_locked(&self, now: DateTime<Local>) -> CoreResult<StopOutcome> {
        let current = self.state.session()?;
        let ignored = StopOutcome {
            was_active: false,
            reason: SessionEndReason::Expired,
            focus_minutes: 0,
        };
        if !current.active {
            debug!("Expiry with no active session, ignoring");
            return Ok(ignored);
        }

        // An alarm left over from a session that has since been replaced
        if let Some(end) = current.ends_at()
            && (end - now).num_seconds() > EXPIRY_TOLERANCE_SECS
        {
            let remaining = (end - now).to_std().unwrap_or_default();
            info!(
                remaining_secs = remaining.as_secs(),
                "Expiry arrived before session end, re-arming"
            );
            self.scheduler
                .create(SESSION_END_ALARM, remaining)
                .await
                .map_err(CoreError::Scheduler)?;
            return Ok(ignored);
        }

        self.end_session(current, SessionEndReason::Expired, now).await
    }

    async fn end_session(
        &self,
        previous: Session,
        reason: SessionEndReason,
        now: DateTime<Local>,
    ) -> CoreResult<StopOutcome> {
        self.state.set_session(&Session::inactive())?;

        let synced = self.sync.synchronize(false).await;
        self.publish_sync(&synced);
        let cleared = self.scheduler.clear(SESSION_END_ALARM).await;

        let mut focus_minutes = 0;
        if previous.active {
            if let Some(started) = previous.start_time {
                match self.stats.on_session_stop(&started, &now) {
                    Ok((stats, minutes)) => {
                        focus_minutes = minutes;
                        self.publish(CoreEvent::StatsChanged { stats });
                    }
                    Err(e) => warn!(error = %e, "Failed to update stats for session stop"),
                }
            }

            let _ = self
                .state
                .store()
                .append_audit(AuditEvent::new(AuditEventType::SessionEnded {
                    reason,
                    focus_minutes,
                }));

            info!(reason = ?reason, focus_minutes, "Session ended");
            self.publish(CoreEvent::SessionEnded {
                reason,
                focus_minutes,
            });
        } else {
            debug!("Stop with no active session");
        }

        synced?;
        cleared.map_err(CoreError::Scheduler)?;

        Ok(StopOutcome {
            was_active: previous.active,
            reason,
            focus_minutes,
        })
    }

    fn publish(&self, event: CoreEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    fn publish_sync(&self, result: &CoreResult<SyncOutcome>) {
        match result {
            Ok(outcome) => self.publish(CoreEvent::RulesSynchronized {
                session_active: outcome.session_active,
                rule_count: outcome.rule_count,
            }),
            Err(e) => warn!(error = %e, "Rule synchronization failed"),
        }
    }
}

fn minutes(m: u32) -> Duration {
    Duration::from_secs(u64::from(m) * 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use focusguard_config::Policy;
    use focusguard_host_api::{MockRuleTable, MockScheduler};
    use focusguard_store::{SqliteStore, StateKey, Store};
    use serde_json::json;

    struct Fixture {
        store: Arc<SqliteStore>,
        table: Arc<MockRuleTable>,
        scheduler: Arc<MockScheduler>,
        manager: SessionManager,
        events: broadcast::Receiver<CoreEvent>,
    }

    fn fixture() -> Fixture {
        let policy = Policy::default();
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let table = Arc::new(MockRuleTable::new());
        let scheduler = Arc::new(MockScheduler::new());
        let state = StateAccess::new(store.clone());
        let sync = Arc::new(RuleSynchronizer::new(
            table.clone(),
            state.clone(),
            policy.rules.clone(),
        ));
        let (tx, rx) = broadcast::channel(64);
        let manager = SessionManager::new(state, sync, scheduler.clone(), policy.session, tx);

        Fixture {
            store,
            table,
            scheduler,
            manager,
            events: rx,
        }
    }

    fn with_blocklist(f: &Fixture, sites: serde_json::Value) {
        f.store.set(StateKey::Blocklist, &sites).unwrap();
    }

    fn persisted_session(f: &Fixture) -> Session {
        serde_json::from_value(f.store.get(StateKey::Session).unwrap().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn start_requires_websites() {
        let f = fixture();
        f.store
            .set(
                StateKey::BlockGroups,
                &json!([{"name": "g", "websites": ["a.com"], "active": false}]),
            )
            .unwrap();

        let result = f.manager.start(25, false, focusguard_util::now()).await;

        assert!(matches!(result, Err(CoreError::NoWebsitesToBlock)));
        assert!(!f.manager.get_status(focusguard_util::now()).unwrap().active);
        assert!(f.store.get(StateKey::Session).unwrap().is_none());
        assert_eq!(f.scheduler.armed_count(), 0);
    }

    #[tokio::test]
    async fn start_installs_rules_and_alarm() {
        let f = fixture();
        with_blocklist(&f, json!(["a.com", "b.com"]));
        let now = focusguard_util::now();

        let session = f.manager.start(25, false, now).await.unwrap();

        assert!(session.active);
        assert_eq!(session.remaining_time, 1500);
        assert_eq!(session.verification_phrase, "");
        assert_eq!(persisted_session(&f), session);
        assert_eq!(f.table.rule_count(), 2);
        assert_eq!(
            f.scheduler.armed(SESSION_END_ALARM),
            Some(Duration::from_secs(1500))
        );
    }

    #[tokio::test]
    async fn hard_mode_phrase_from_catalog() {
        let f = fixture();
        with_blocklist(&f, json!(["a.com"]));

        f.manager.start(25, true, focusguard_util::now()).await.unwrap();

        let phrase = f.manager.get_verification_phrase().unwrap().unwrap();
        assert!(!phrase.is_empty());
        assert!(Policy::default()
            .session
            .verification_phrases
            .contains(&phrase));
    }

    #[tokio::test]
    async fn soft_mode_has_no_phrase() {
        let f = fixture();
        with_blocklist(&f, json!(["a.com"]));

        f.manager.start(25, false, focusguard_util::now()).await.unwrap();

        assert_eq!(f.manager.get_verification_phrase().unwrap(), None);
    }

    #[tokio::test]
    async fn second_start_rejected() {
        let f = fixture();
        with_blocklist(&f, json!(["a.com"]));
        let now = focusguard_util::now();

        let first = f.manager.start(25, false, now).await.unwrap();
        let result = f.manager.start(50, false, now).await;

        assert!(matches!(result, Err(CoreError::SessionAlreadyActive)));
        assert_eq!(persisted_session(&f), first);
    }

    #[tokio::test]
    async fn invalid_duration_rejected() {
        let f = fixture();
        with_blocklist(&f, json!(["a.com"]));

        for minutes in [0, 721] {
            let result = f.manager.start(minutes, false, focusguard_util::now()).await;
            assert!(matches!(result, Err(CoreError::InvalidDuration { .. })));
        }
        assert!(f.store.get(StateKey::Session).unwrap().is_none());
    }

    #[tokio::test]
    async fn wrong_phrase_keeps_session() {
        let f = fixture();
        with_blocklist(&f, json!(["a.com"]));
        let now = focusguard_util::now();
        f.manager.start(25, true, now).await.unwrap();

        let result = f.manager.stop(Some("let me out"), now).await;
        assert!(matches!(result, Err(CoreError::IncorrectPhrase)));

        let result = f.manager.stop(None, now).await;
        assert!(matches!(result, Err(CoreError::IncorrectPhrase)));

        assert!(persisted_session(&f).active);
        assert_eq!(f.table.rule_count(), 1);
        assert!(f.scheduler.armed(SESSION_END_ALARM).is_some());
    }

    #[tokio::test]
    async fn correct_phrase_stops_and_clears() {
        let f = fixture();
        with_blocklist(&f, json!(["a.com"]));
        let now = focusguard_util::now();
        f.manager.start(25, true, now).await.unwrap();
        let phrase = f.manager.get_verification_phrase().unwrap().unwrap();

        let outcome = f.manager.stop(Some(&phrase), now).await.unwrap();

        assert!(outcome.was_active);
        assert_eq!(outcome.reason, SessionEndReason::UserStop);
        assert_eq!(persisted_session(&f), Session::inactive());
        assert_eq!(f.table.rule_count(), 0);
        assert!(f.scheduler.armed(SESSION_END_ALARM).is_none());
    }

    #[tokio::test]
    async fn expiry_bypasses_phrase() {
        let f = fixture();
        with_blocklist(&f, json!(["a.com"]));
        let start = focusguard_util::now();
        f.manager.start(25, true, start).await.unwrap();

        let outcome = f
            .manager
            .expire(start + chrono::Duration::minutes(25))
            .await
            .unwrap();

        assert!(outcome.was_active);
        assert_eq!(outcome.reason, SessionEndReason::Expired);
        assert_eq!(outcome.focus_minutes, 25);
        assert_eq!(persisted_session(&f), Session::inactive());
        assert_eq!(f.table.rule_count(), 0);
    }

    #[tokio::test]
    async fn stop_credits_stats() {
        let f = fixture();
        with_blocklist(&f, json!(["a.com"]));
        let start = focusguard_util::now();
        f.manager.start(25, false, start).await.unwrap();

        f.manager
            .stop(None, start + chrono::Duration::minutes(10))
            .await
            .unwrap();

        let stats: focusguard_api::Stats =
            serde_json::from_value(f.store.get(StateKey::Stats).unwrap().unwrap()).unwrap();
        assert_eq!(stats.focus_time_today, 10);
        assert_eq!(stats.blocked_count, 1);
        assert_eq!(stats.streak, 1);
    }

    #[tokio::test]
    async fn stop_when_idle_is_harmless() {
        let f = fixture();
        let outcome = f.manager.stop(None, focusguard_util::now()).await.unwrap();

        assert!(!outcome.was_active);
        assert!(f.store.get(StateKey::Stats).unwrap().is_none());
    }

    #[tokio::test]
    async fn late_expiry_after_stop_is_ignored() {
        let f = fixture();
        with_blocklist(&f, json!(["a.com"]));
        let now = focusguard_util::now();
        f.manager.start(25, false, now).await.unwrap();
        f.manager.stop(None, now).await.unwrap();

        let outcome = f.manager.expire(now).await.unwrap();
        assert!(!outcome.was_active);
    }

    #[tokio::test]
    async fn stale_alarm_leaves_replacement_session_running() {
        let f = fixture();
        with_blocklist(&f, json!(["a.com"]));
        let start = focusguard_util::now();

        f.manager.start(1, false, start).await.unwrap();
        // The first alarm has fired but nobody has handled it yet
        assert!(f.scheduler.fire(SESSION_END_ALARM));
        let later = start + chrono::Duration::minutes(1);
        f.manager.stop(None, later).await.unwrap();
        f.manager.start(30, false, later).await.unwrap();

        let outcome = f.manager.expire(later).await.unwrap();

        assert!(!outcome.was_active);
        let session = persisted_session(&f);
        assert!(session.active);
        assert_eq!(session.duration, 30);
        assert_eq!(f.table.rule_count(), 1);
        assert_eq!(
            f.scheduler.armed(SESSION_END_ALARM),
            Some(Duration::from_secs(30 * 60))
        );
    }

    #[tokio::test]
    async fn expiry_within_tolerance_ends_session() {
        let f = fixture();
        with_blocklist(&f, json!(["a.com"]));
        let start = focusguard_util::now();
        f.manager.start(25, false, start).await.unwrap();

        let outcome = f
            .manager
            .expire(start + chrono::Duration::minutes(25) - chrono::Duration::seconds(2))
            .await
            .unwrap();

        assert!(outcome.was_active);
        assert!(!persisted_session(&f).active);
    }

    #[tokio::test]
    async fn start_rejects_unusable_patterns() {
        let f = fixture();
        with_blocklist(&f, json!(["/", "***"]));

        let result = f.manager.start(25, false, focusguard_util::now()).await;

        assert!(matches!(result, Err(CoreError::NoWebsitesToBlock)));
        assert!(f.store.get(StateKey::Session).unwrap().is_none());
        assert_eq!(f.table.replace_calls(), 0);
        assert_eq!(f.scheduler.armed_count(), 0);
    }

    #[tokio::test]
    async fn status_projects_remaining_time() {
        let f = fixture();
        with_blocklist(&f, json!(["a.com"]));
        let start = focusguard_util::now();
        f.manager.start(25, false, start).await.unwrap();

        let status = f
            .manager
            .get_status(start + chrono::Duration::minutes(5))
            .unwrap();
        assert_eq!(status.remaining_time, 1200);
        // Persisted record is untouched
        assert_eq!(persisted_session(&f).remaining_time, 1500);
    }

    #[tokio::test]
    async fn rule_table_failure_still_arms_alarm() {
        let f = fixture();
        with_blocklist(&f, json!(["a.com"]));
        *f.table.fail_replace.lock().unwrap() = true;

        let result = f.manager.start(25, false, focusguard_util::now()).await;

        assert!(matches!(result, Err(CoreError::RuleTable(_))));
        assert!(persisted_session(&f).active);
        assert!(f.scheduler.armed(SESSION_END_ALARM).is_some());
    }

    #[tokio::test]
    async fn resume_running_session() {
        let f = fixture();
        with_blocklist(&f, json!(["a.com"]));
        let start = focusguard_util::now();
        f.store
            .set(
                StateKey::Session,
                &serde_json::to_value(Session::started(start, 30, None)).unwrap(),
            )
            .unwrap();

        let outcome = f
            .manager
            .resume(start + chrono::Duration::minutes(10))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ResumeOutcome::Resumed {
                remaining: Duration::from_secs(20 * 60)
            }
        );
        assert_eq!(f.table.rule_count(), 1);
        assert_eq!(
            f.scheduler.armed(SESSION_END_ALARM),
            Some(Duration::from_secs(20 * 60))
        );
    }

    #[tokio::test]
    async fn resume_overdue_session_expires() {
        let f = fixture();
        with_blocklist(&f, json!(["a.com"]));
        let start = focusguard_util::now();
        f.store
            .set(
                StateKey::Session,
                &serde_json::to_value(Session::started(start, 30, Some("x".into()))).unwrap(),
            )
            .unwrap();

        let outcome = f
            .manager
            .resume(start + chrono::Duration::minutes(45))
            .await
            .unwrap();

        assert!(matches!(outcome, ResumeOutcome::Expired(StopOutcome { was_active: true, .. })));
        assert_eq!(persisted_session(&f), Session::inactive());
    }

    #[tokio::test]
    async fn lifecycle_events_published() {
        let mut f = fixture();
        with_blocklist(&f, json!(["a.com"]));
        let now = focusguard_util::now();

        f.manager.start(25, false, now).await.unwrap();
        f.manager.stop(None, now).await.unwrap();

        let mut seen = Vec::new();
        while let Ok(event) = f.events.try_recv() {
            seen.push(event);
        }

        assert!(seen.iter().any(|e| matches!(e, CoreEvent::SessionStarted { .. })));
        assert!(seen.iter().any(|e| matches!(
            e,
            CoreEvent::RulesSynchronized { session_active: true, rule_count: 1 }
        )));
        assert!(seen.iter().any(|e| matches!(
            e,
            CoreEvent::SessionEnded { reason: SessionEndReason::UserStop, .. }
        )));
    }
}
