//! Block group management

use chrono::{DateTime, Local};
use focusguard_api::Group;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::pattern::clean_domain;
use crate::state::StateAccess;
use crate::{CoreError, CoreResult};

/// Edits the persisted group list.
///
/// Each operation is a full read-modify-write of `blockGroups`; edits are
/// serialized so two of them never overwrite each other. Entries that do not
/// parse are written back untouched. The rule table catches up through the
/// change reactor.
pub struct GroupManager {
    state: StateAccess,
    edit_lock: Mutex<()>,
}

impl GroupManager {
    pub fn new(state: StateAccess) -> Self {
        Self {
            state,
            edit_lock: Mutex::new(()),
        }
    }

    pub fn list(&self) -> CoreResult<Vec<Group>> {
        self.state.groups()
    }

    pub async fn create(
        &self,
        name: &str,
        websites: &[String],
        time_limit: u32,
        now: DateTime<Local>,
    ) -> CoreResult<Group> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::InvalidGroup("name must not be empty".into()));
        }
        if time_limit == 0 {
            return Err(CoreError::InvalidGroup(
                "time limit must be at least one minute".into(),
            ));
        }
        let websites = clean_websites(websites)?;

        let _edit = self.edit_lock.lock().await;
        let mut entries = self.state.raw_groups()?;
        if find(&entries, name).is_some() {
            return Err(CoreError::GroupExists(name.to_string()));
        }

        let group = Group {
            name: name.to_string(),
            websites,
            time_limit,
            active: false,
            created: now,
            is_predefined: false,
        };
        entries.push(to_entry(&group)?);
        self.state.set_raw_groups(entries)?;

        info!(group = %group.name, sites = group.websites.len(), "Group created");
        Ok(group)
    }

    /// Flip a group's `active` flag, returning the new value
    pub async fn toggle(&self, name: &str) -> CoreResult<bool> {
        let _edit = self.edit_lock.lock().await;
        let mut entries = self.state.raw_groups()?;
        let (idx, mut group) =
            find(&entries, name).ok_or_else(|| CoreError::GroupNotFound(name.trim().to_string()))?;

        group.active = !group.active;
        debug!(group = %group.name, active = group.active, "Group toggled");

        entries[idx] = to_entry(&group)?;
        self.state.set_raw_groups(entries)?;
        Ok(group.active)
    }

    pub async fn delete(&self, name: &str) -> CoreResult<Group> {
        let _edit = self.edit_lock.lock().await;
        let mut entries = self.state.raw_groups()?;
        let (idx, group) =
            find(&entries, name).ok_or_else(|| CoreError::GroupNotFound(name.trim().to_string()))?;

        if group.is_predefined {
            return Err(CoreError::GroupProtected(group.name));
        }

        entries.remove(idx);
        self.state.set_raw_groups(entries)?;

        info!(group = %group.name, "Group deleted");
        Ok(group)
    }
}

/// Position and parsed form of the entry named `name`
fn find(entries: &[Value], name: &str) -> Option<(usize, Group)> {
    let name = name.trim();
    entries.iter().enumerate().find_map(|(idx, entry)| {
        serde_json::from_value::<Group>(entry.clone())
            .ok()
            .filter(|g| g.name.eq_ignore_ascii_case(name))
            .map(|g| (idx, g))
    })
}

fn to_entry(group: &Group) -> CoreResult<Value> {
    Ok(serde_json::to_value(group).map_err(focusguard_store::StoreError::from)?)
}

fn clean_websites(websites: &[String]) -> CoreResult<Vec<String>> {
    let mut cleaned: Vec<String> = Vec::with_capacity(websites.len());
    for site in websites.iter().filter(|s| !s.trim().is_empty()) {
        let domain = clean_domain(site)
            .ok_or_else(|| CoreError::InvalidGroup(format!("invalid website: {}", site.trim())))?;
        if !cleaned.contains(&domain) {
            cleaned.push(domain);
        }
    }

    if cleaned.is_empty() {
        return Err(CoreError::InvalidGroup(
            "at least one website is required".into(),
        ));
    }
    Ok(cleaned)
}
