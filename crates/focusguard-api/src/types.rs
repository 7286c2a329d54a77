//! Persisted data model shared by the service and its clients

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Deserializer, Serialize};

/// Advisory time limit given to bare-string blocklist entries
pub const DEFAULT_TIME_LIMIT_MINUTES: u32 = 60;

/// The single focus session record.
///
/// Inactive sessions always take the canonical shape produced by
/// [`Session::inactive`]. While active, `verification_phrase` is non-empty
/// exactly when `is_hard_mode` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub active: bool,
    pub start_time: Option<DateTime<Local>>,
    /// Seconds left, as of the last projection
    pub remaining_time: u64,
    /// Session length in minutes
    pub duration: u32,
    pub is_hard_mode: bool,
    pub verification_phrase: String,
}

impl Session {
    /// Canonical inactive session
    pub fn inactive() -> Self {
        Self {
            active: false,
            start_time: None,
            remaining_time: 0,
            duration: 0,
            is_hard_mode: false,
            verification_phrase: String::new(),
        }
    }

    /// A freshly started session
    pub fn started(
        start_time: DateTime<Local>,
        duration_minutes: u32,
        verification_phrase: Option<String>,
    ) -> Self {
        let is_hard_mode = verification_phrase.is_some();
        Self {
            active: true,
            start_time: Some(start_time),
            remaining_time: u64::from(duration_minutes) * 60,
            duration: duration_minutes,
            is_hard_mode,
            verification_phrase: verification_phrase.unwrap_or_default(),
        }
    }

    /// When an active session is due to end
    pub fn ends_at(&self) -> Option<DateTime<Local>> {
        let start = self.start_time?;
        Some(start + chrono::Duration::minutes(i64::from(self.duration)))
    }

    /// Seconds remaining at `now` (zero when inactive or overdue)
    pub fn remaining_seconds(&self, now: DateTime<Local>) -> u64 {
        if !self.active {
            return 0;
        }
        match self.ends_at() {
            Some(end) => u64::try_from(end.signed_duration_since(now).num_seconds()).unwrap_or(0),
            None => 0,
        }
    }

    /// The phrase a hard-mode session requires, if any
    pub fn required_phrase(&self) -> Option<&str> {
        (self.active && self.is_hard_mode).then_some(self.verification_phrase.as_str())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::inactive()
    }
}

/// Usage statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    /// Minutes of completed focus accrued today
    #[serde(default)]
    pub focus_time_today: u32,
    /// Completed focus sessions
    #[serde(default)]
    pub blocked_count: u32,
    #[serde(default)]
    pub streak: u32,
    /// Calendar day (`YYYY-MM-DD`) of the last session start
    #[serde(default)]
    pub last_active_date: Option<String>,
}

/// One entry of the flat blocklist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlocklistEntry {
    pub url_pattern: String,
    /// Advisory only; not used for enforcement
    #[serde(default = "default_time_limit")]
    pub time_limit: u32,
}

impl BlocklistEntry {
    pub fn new(url_pattern: impl Into<String>) -> Self {
        Self {
            url_pattern: url_pattern.into(),
            time_limit: DEFAULT_TIME_LIMIT_MINUTES,
        }
    }
}

fn default_time_limit() -> u32 {
    DEFAULT_TIME_LIMIT_MINUTES
}

/// A blocklist entry as clients may send it: a bare pattern or a full record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlocklistItem {
    Pattern(String),
    Entry(BlocklistEntry),
}

impl From<BlocklistItem> for BlocklistEntry {
    fn from(item: BlocklistItem) -> Self {
        match item {
            BlocklistItem::Pattern(pattern) => BlocklistEntry::new(pattern),
            BlocklistItem::Entry(entry) => entry,
        }
    }
}

/// A named, toggleable bundle of websites
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub name: String,
    pub websites: Vec<String>,
    #[serde(default = "default_time_limit")]
    pub time_limit: u32,
    #[serde(default)]
    pub active: bool,
    /// Written as RFC 3339; epoch milliseconds are accepted on read
    #[serde(default, deserialize_with = "deserialize_created")]
    pub created: DateTime<Local>,
    #[serde(default)]
    pub is_predefined: bool,
}

fn deserialize_created<'de, D>(deserializer: D) -> Result<DateTime<Local>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Created {
        Text(DateTime<Local>),
        Millis(i64),
    }

    match Created::deserialize(deserializer)? {
        Created::Text(created) => Ok(created),
        Created::Millis(ms) => Local.timestamp_millis_opt(ms).single().ok_or_else(|| {
            serde::de::Error::custom(format!("creation time out of range: {}", ms))
        }),
    }
}

/// Kind of payload shown on the interstitial page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Message,
    Image,
    Video,
}

/// Display payload for the interstitial page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomContent {
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub content: String,
}

impl CustomContent {
    pub fn message(content: impl Into<String>) -> Self {
        Self {
            content_type: ContentType::Message,
            content: content.into(),
        }
    }
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEndReason {
    /// The scheduled end was reached
    Expired,
    /// The user stopped the session early
    UserStop,
}

/// Health status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub live: bool,
    pub store_ok: bool,
    pub rule_table_ok: bool,
    pub session_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn inactive_session_wire_shape() {
        let json = serde_json::to_value(Session::inactive()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "active": false,
                "startTime": null,
                "remainingTime": 0,
                "duration": 0,
                "isHardMode": false,
                "verificationPhrase": ""
            })
        );
    }

    #[test]
    fn started_session_fields() {
        let start = Local.with_ymd_and_hms(2025, 1, 6, 9, 0, 0).unwrap();
        let session = Session::started(start, 25, Some("Stay on task".into()));

        assert!(session.active);
        assert!(session.is_hard_mode);
        assert_eq!(session.remaining_time, 1500);
        assert_eq!(session.required_phrase(), Some("Stay on task"));
        assert_eq!(session.ends_at(), Some(start + chrono::Duration::minutes(25)));
    }

    #[test]
    fn remaining_seconds_counts_down() {
        let start = Local.with_ymd_and_hms(2025, 1, 6, 9, 0, 0).unwrap();
        let session = Session::started(start, 25, None);

        assert_eq!(session.remaining_seconds(start), 1500);
        assert_eq!(session.remaining_seconds(start + chrono::Duration::minutes(5)), 1200);
        assert_eq!(session.remaining_seconds(start + chrono::Duration::hours(1)), 0);
        assert_eq!(session.required_phrase(), None);
    }

    #[test]
    fn blocklist_item_accepts_both_shapes() {
        let items: Vec<BlocklistItem> = serde_json::from_value(serde_json::json!([
            "facebook.com",
            { "urlPattern": "*://*.youtube.com/*", "timeLimit": 30 },
            { "urlPattern": "reddit.com" }
        ]))
        .unwrap();

        let entries: Vec<BlocklistEntry> = items.into_iter().map(Into::into).collect();
        assert_eq!(entries[0], BlocklistEntry::new("facebook.com"));
        assert_eq!(entries[1].time_limit, 30);
        assert_eq!(entries[2].time_limit, DEFAULT_TIME_LIMIT_MINUTES);
    }

    #[test]
    fn group_without_predefined_flag_defaults_false() {
        let group: Group = serde_json::from_value(serde_json::json!({
            "name": "Work",
            "websites": ["slack.com"],
            "timeLimit": 30,
            "active": true,
            "created": "2025-01-06T09:00:00+00:00"
        }))
        .unwrap();

        assert!(group.active);
        assert!(!group.is_predefined);
    }

    #[test]
    fn group_created_accepts_epoch_millis() {
        let group: Group = serde_json::from_value(serde_json::json!({
            "name": "Legacy",
            "websites": ["a.com"],
            "timeLimit": 60,
            "active": true,
            "created": 1_700_000_000_000_i64
        }))
        .unwrap();

        assert_eq!(group.created, Local.timestamp_millis_opt(1_700_000_000_000).unwrap());
    }

    #[test]
    fn group_without_created_still_parses() {
        let group: Group = serde_json::from_value(serde_json::json!({
            "name": "Old",
            "websites": ["a.com"]
        }))
        .unwrap();

        assert_eq!(group.time_limit, DEFAULT_TIME_LIMIT_MINUTES);
        assert!(!group.active);
    }

    #[test]
    fn custom_content_type_tag() {
        let json = serde_json::to_value(CustomContent::message("Back to work")).unwrap();
        assert_eq!(json["type"], "message");
        assert_eq!(json["content"], "Back to work");
    }
}
