//! Stats tracker

use chrono::{DateTime, Local};
use focusguard_api::Stats;
use focusguard_util::{day_key, whole_minutes_between};
use tracing::debug;

use crate::state::StateAccess;
use crate::CoreResult;

/// Account for a session starting at `now`.
///
/// The first start on a new calendar day grows the streak and resets today's
/// focus time. Later starts on the same day change nothing but the date.
pub fn record_session_start(stats: &mut Stats, now: &DateTime<Local>) {
    let today = day_key(now);
    if stats.last_active_date.as_deref() != Some(today.as_str()) {
        stats.streak += 1;
        stats.focus_time_today = 0;
    }
    stats.last_active_date = Some(today);
}

/// Account for a session that started at `started` ending at `now`.
/// Returns the whole minutes credited.
pub fn record_session_stop(stats: &mut Stats, started: &DateTime<Local>, now: &DateTime<Local>) -> u32 {
    let minutes = whole_minutes_between(started, now);
    stats.focus_time_today = stats.focus_time_today.saturating_add(minutes);
    stats.blocked_count = stats.blocked_count.saturating_add(1);
    minutes
}

/// Read-modify-write of the persisted stats record
pub struct StatsTracker {
    state: StateAccess,
}

impl StatsTracker {
    pub fn new(state: StateAccess) -> Self {
        Self { state }
    }

    pub fn current(&self) -> CoreResult<Stats> {
        self.state.stats()
    }

    pub fn on_session_start(&self, now: &DateTime<Local>) -> CoreResult<Stats> {
        let mut stats = self.state.stats()?;
        record_session_start(&mut stats, now);
        self.state.set_stats(&stats)?;
        debug!(streak = stats.streak, "Stats updated for session start");
        Ok(stats)
    }

    /// Returns the updated stats and the minutes credited
    pub fn on_session_stop(
        &self,
        started: &DateTime<Local>,
        now: &DateTime<Local>,
    ) -> CoreResult<(Stats, u32)> {
        let mut stats = self.state.stats()?;
        let minutes = record_session_stop(&mut stats, started, now);
        self.state.set_stats(&stats)?;
        debug!(
            focus_minutes = minutes,
            focus_time_today = stats.focus_time_today,
            "Stats updated for session stop"
        );
        Ok((stats, minutes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use focusguard_store::SqliteStore;
    use std::sync::Arc;

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 3, day, hour, minute, 0).unwrap()
    }

    #[test]
    fn new_day_grows_streak_and_resets_focus() {
        let mut stats = Stats {
            focus_time_today: 40,
            blocked_count: 3,
            streak: 2,
            last_active_date: Some("2025-03-09".into()),
        };

        record_session_start(&mut stats, &at(10, 9, 0));
        assert_eq!(stats.streak, 3);
        assert_eq!(stats.focus_time_today, 0);
        assert_eq!(stats.last_active_date.as_deref(), Some("2025-03-10"));

        record_session_start(&mut stats, &at(10, 15, 0));
        assert_eq!(stats.streak, 3);
        assert_eq!(stats.blocked_count, 3);
    }

    #[test]
    fn first_ever_start() {
        let mut stats = Stats::default();
        record_session_start(&mut stats, &at(10, 9, 0));
        assert_eq!(stats.streak, 1);
    }

    #[test]
    fn stop_credits_whole_minutes() {
        let mut stats = Stats {
            focus_time_today: 5,
            ..Stats::default()
        };
        let start = at(10, 9, 0);

        let credited = record_session_stop(&mut stats, &start, &(start + chrono::Duration::minutes(10)));
        assert_eq!(credited, 10);
        assert_eq!(stats.focus_time_today, 15);
        assert_eq!(stats.blocked_count, 1);

        let credited = record_session_stop(&mut stats, &start, &(start + chrono::Duration::seconds(119)));
        assert_eq!(credited, 1);
        assert_eq!(stats.blocked_count, 2);
    }

    #[test]
    fn tracker_persists() {
        let state = StateAccess::new(Arc::new(SqliteStore::in_memory().unwrap()));
        let tracker = StatsTracker::new(state.clone());
        let start = at(10, 9, 0);

        tracker.on_session_start(&start).unwrap();
        let (stats, minutes) = tracker
            .on_session_stop(&start, &(start + chrono::Duration::minutes(25)))
            .unwrap();

        assert_eq!(minutes, 25);
        assert_eq!(state.stats().unwrap(), stats);
        assert_eq!(stats.streak, 1);
        assert_eq!(stats.focus_time_today, 25);
    }
}
