//! Human-readable rendering of service replies

use focusguard_api::{
    BlocklistEntry, ContentType, CustomContent, EventPayload, Group, HealthStatus, ResponsePayload,
    Session, SessionEndReason, Stats,
};
use focusguard_util::{format_countdown, format_duration};
use std::time::Duration;

pub fn payload(payload: &ResponsePayload) -> String {
    match payload {
        ResponsePayload::Session { session } => session_status(session),
        ResponsePayload::Phrase { phrase: Some(p) } => p.clone(),
        ResponsePayload::Phrase { phrase: None } => "No verification phrase required".into(),
        ResponsePayload::Stopped => "Session stopped".into(),
        ResponsePayload::Updated => "Updated".into(),
        ResponsePayload::Stats { stats: s } => stats(s),
        ResponsePayload::Blocklist { blocklist: b } => blocklist(b),
        ResponsePayload::Groups { groups: g } => groups(g),
        ResponsePayload::GroupCreated { group } => {
            format!("Created group '{}' ({} sites)", group.name, group.websites.len())
        }
        ResponsePayload::GroupToggled { name, active } => format!(
            "Group '{}' is now {}",
            name,
            if *active { "enabled" } else { "disabled" }
        ),
        ResponsePayload::GroupDeleted { name } => format!("Deleted group '{}'", name),
        ResponsePayload::CustomContent { content } => custom_content(content),
        ResponsePayload::Subscribed { client_id } => format!("Subscribed as {}", client_id),
        ResponsePayload::Unsubscribed => "Unsubscribed".into(),
        ResponsePayload::Health(h) => health(h),
        ResponsePayload::Pong => "pong".into(),
    }
}

pub fn session_status(session: &Session) -> String {
    if !session.active {
        return "No focus session running".into();
    }

    let mut out = format!(
        "Focus session active: {} remaining of {} min",
        format_countdown(session.remaining_time),
        session.duration
    );
    if session.is_hard_mode {
        out.push_str(" (hard mode)");
    }
    out
}

pub fn stats(stats: &Stats) -> String {
    let focus = format_duration(Duration::from_secs(u64::from(stats.focus_time_today) * 60));
    format!(
        "Focus today:     {}\nSessions:        {}\nStreak:          {} day(s)\nLast active:     {}",
        focus,
        stats.blocked_count,
        stats.streak,
        stats.last_active_date.as_deref().unwrap_or("never")
    )
}

pub fn blocklist(entries: &[BlocklistEntry]) -> String {
    if entries.is_empty() {
        return "Blocklist is empty".into();
    }
    entries
        .iter()
        .map(|e| format!("{}  ({} min)", e.url_pattern, e.time_limit))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn groups(groups: &[Group]) -> String {
    if groups.is_empty() {
        return "No groups".into();
    }
    groups
        .iter()
        .map(|g| {
            format!(
                "[{}] {}{}  {} sites",
                if g.active { "x" } else { " " },
                g.name,
                if g.is_predefined { " (predefined)" } else { "" },
                g.websites.len()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn custom_content(content: &CustomContent) -> String {
    let kind = match content.content_type {
        ContentType::Message => "message",
        ContentType::Image => "image",
        ContentType::Video => "video",
    };
    format!("{}: {}", kind, content.content)
}

pub fn health(health: &HealthStatus) -> String {
    let flag = |ok: bool| if ok { "ok" } else { "FAILING" };
    format!(
        "store: {}\nrule table: {}\nsession active: {}",
        flag(health.store_ok),
        flag(health.rule_table_ok),
        health.session_active
    )
}

pub fn event(payload: &EventPayload) -> String {
    match payload {
        EventPayload::SessionStarted { session } => format!(
            "session started: {} min{}",
            session.duration,
            if session.is_hard_mode { ", hard mode" } else { "" }
        ),
        EventPayload::SessionEnded {
            reason,
            focus_minutes,
        } => {
            let why = match reason {
                SessionEndReason::Expired => "time is up",
                SessionEndReason::UserStop => "stopped",
            };
            format!("session ended ({}), {} min credited", why, focus_minutes)
        }
        EventPayload::RulesSynchronized {
            session_active,
            rule_count,
        } => format!(
            "rules synchronized: {} rule(s), session {}",
            rule_count,
            if *session_active { "active" } else { "idle" }
        ),
        EventPayload::StatsChanged { stats } => format!(
            "stats: {} min today, streak {}",
            stats.focus_time_today, stats.streak
        ),
        EventPayload::Shutdown => "service shutting down".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_and_active_status() {
        assert_eq!(
            session_status(&Session::inactive()),
            "No focus session running"
        );

        let mut session = Session::started(focusguard_util::now(), 25, Some("x".into()));
        session.remaining_time = 61;
        assert_eq!(
            session_status(&session),
            "Focus session active: 00:01:01 remaining of 25 min (hard mode)"
        );
    }

    #[test]
    fn stats_layout() {
        let text = stats(&Stats {
            focus_time_today: 90,
            blocked_count: 3,
            streak: 2,
            last_active_date: None,
        });
        assert!(text.contains("1h 30m 0s"));
        assert!(text.contains("never"));
    }

    #[test]
    fn group_markers() {
        let group: Group = serde_json::from_value(serde_json::json!({
            "name": "Gaming",
            "websites": ["steam.com"],
            "timeLimit": 60,
            "active": true,
            "created": "2025-01-06T09:00:00+00:00",
            "isPredefined": true
        }))
        .unwrap();
        assert_eq!(groups(&[group]), "[x] Gaming (predefined)  1 sites");
    }
}
