//! Blocklist aggregation: flat blocklist plus active groups

use focusguard_store::StateKey;
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::pattern::normalize_pattern;
use crate::state::StateAccess;

/// Canonical patterns that should be blocked while a session is active.
///
/// A storage read failure yields an empty list: blocking fails open rather
/// than failing the caller.
pub fn collect_patterns(state: &StateAccess) -> Vec<String> {
    let blocklist = state.raw(StateKey::Blocklist);
    let groups = state.raw(StateKey::BlockGroups);

    match (blocklist, groups) {
        (Ok(blocklist), Ok(groups)) => aggregate(blocklist.as_ref(), groups.as_ref()),
        (Err(e), _) | (_, Err(e)) => {
            warn!(error = %e, "Failed to read block sources, treating as empty");
            Vec::new()
        }
    }
}

/// Union of blocklist patterns and active groups' websites, normalized and
/// deduplicated in first-seen order
pub fn aggregate(blocklist: Option<&Value>, groups: Option<&Value>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut patterns = Vec::new();

    let mut push = |raw: &str| {
        let raw = raw.trim();
        if raw.is_empty() {
            return;
        }
        let pattern = normalize_pattern(raw);
        if seen.insert(pattern.clone()) {
            patterns.push(pattern);
        }
    };

    for entry in as_array(blocklist, "blocklist") {
        match entry_pattern(entry) {
            Some(pattern) => push(pattern),
            None => warn!(entry = %entry, "Invalid blocklist entry"),
        }
    }

    for group in as_array(groups, "blockGroups") {
        if group.get("active").and_then(Value::as_bool) != Some(true) {
            continue;
        }
        let Some(websites) = group.get("websites").and_then(Value::as_array) else {
            warn!(group = %group, "Active group has no website list");
            continue;
        };
        for site in websites {
            match site.as_str() {
                Some(site) => push(site),
                None => warn!(entry = %site, "Invalid group website"),
            }
        }
    }

    debug!(count = patterns.len(), "Aggregated block patterns");
    patterns
}

fn as_array<'a>(value: Option<&'a Value>, key: &str) -> &'a [Value] {
    match value {
        None | Some(Value::Null) => &[],
        Some(Value::Array(items)) => items,
        Some(other) => {
            warn!(key, value = %other, "Stored list is not an array");
            &[]
        }
    }
}

fn entry_pattern(entry: &Value) -> Option<&str> {
    match entry {
        Value::String(s) => Some(s.as_str()),
        Value::Object(map) => map.get("urlPattern").and_then(Value::as_str),
        _ => None,
    }
}
