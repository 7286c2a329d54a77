//! First-run defaults

use chrono::{DateTime, Local};
use focusguard_api::{CustomContent, Group, Session, Stats};
use focusguard_config::Policy;
use focusguard_store::{AuditEvent, AuditEventType, StateKey};
use tracing::{debug, info};

use crate::state::StateAccess;
use crate::CoreResult;

/// Write defaults for every key that has never been written.
///
/// Keys already present are left alone, even when empty: a user who deleted
/// every group does not get the catalog back. Returns the keys written.
pub fn seed_defaults(
    state: &StateAccess,
    policy: &Policy,
    now: DateTime<Local>,
) -> CoreResult<Vec<StateKey>> {
    let mut seeded = Vec::new();

    for key in StateKey::ALL {
        if state.is_present(key)? {
            continue;
        }

        match key {
            StateKey::Blocklist => state.set_blocklist(&[])?,
            StateKey::Session => state.set_session(&Session::inactive())?,
            StateKey::CustomContent => state.set_custom_content(&CustomContent::message(
                policy.interstitial.default_message.clone(),
            ))?,
            StateKey::BlockGroups => state.set_groups(&predefined_groups(policy, now))?,
            StateKey::Stats => state.set_stats(&Stats::default())?,
        }
        seeded.push(key);
    }

    if seeded.is_empty() {
        debug!("All state keys present, nothing to seed");
        return Ok(seeded);
    }

    let _ = state
        .store()
        .append_audit(AuditEvent::new(AuditEventType::DefaultsSeeded {
            keys: seeded.iter().map(|k| k.as_str().to_string()).collect(),
        }));
    info!(keys = ?seeded, "Seeded default state");

    Ok(seeded)
}

fn predefined_groups(policy: &Policy, now: DateTime<Local>) -> Vec<Group> {
    policy
        .predefined_groups
        .iter()
        .map(|g| Group {
            name: g.name.clone(),
            websites: g.websites.clone(),
            time_limit: g.time_limit_minutes,
            active: false,
            created: now,
            is_predefined: true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use focusguard_api::ContentType;
    use focusguard_store::{SqliteStore, Store};
    use serde_json::json;
    use std::sync::Arc;

    fn state() -> StateAccess {
        StateAccess::new(Arc::new(SqliteStore::in_memory().unwrap()))
    }

    #[test]
    fn first_run_writes_everything() {
        let state = state();
        let policy = Policy::default();

        let seeded = seed_defaults(&state, &policy, focusguard_util::now()).unwrap();
        assert_eq!(seeded.len(), StateKey::ALL.len());

        let groups = state.groups().unwrap();
        assert_eq!(groups.len(), policy.predefined_groups.len());
        assert!(groups.iter().all(|g| g.is_predefined && !g.active));

        let content = state.custom_content().unwrap().unwrap();
        assert_eq!(content.content_type, ContentType::Message);
        assert_eq!(content.content, policy.interstitial.default_message);

        assert_eq!(state.session().unwrap(), Session::inactive());
        assert_eq!(state.raw(StateKey::Blocklist).unwrap(), Some(json!([])));
    }

    #[test]
    fn existing_keys_untouched() {
        let state = state();
        state.store().set(StateKey::Blocklist, &json!(["a.com"])).unwrap();

        let seeded = seed_defaults(&state, &Policy::default(), focusguard_util::now()).unwrap();

        assert!(!seeded.contains(&StateKey::Blocklist));
        assert_eq!(state.raw(StateKey::Blocklist).unwrap(), Some(json!(["a.com"])));
    }

    #[test]
    fn emptied_group_list_not_reseeded() {
        let state = state();
        let policy = Policy::default();
        seed_defaults(&state, &policy, focusguard_util::now()).unwrap();

        state.set_groups(&[]).unwrap();
        let seeded = seed_defaults(&state, &policy, focusguard_util::now()).unwrap();

        assert!(seeded.is_empty());
        assert!(state.groups().unwrap().is_empty());
    }
}
