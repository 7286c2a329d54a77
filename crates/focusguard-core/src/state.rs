//! Typed access to the persisted state keys
//!
//! Reads are lenient: values that do not parse are logged and replaced by
//! their canonical default (or skipped per entry for lists) instead of failing
//! the operation. Writes always store the full canonical record.

use focusguard_api::{BlocklistEntry, CustomContent, Group, Session, Stats};
use focusguard_store::{StateKey, Store};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::warn;

use crate::CoreResult;

#[derive(Clone)]
pub struct StateAccess {
    store: Arc<dyn Store>,
}

impl StateAccess {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Raw value under `key`
    pub fn raw(&self, key: StateKey) -> CoreResult<Option<serde_json::Value>> {
        Ok(self.store.get(key)?)
    }

    /// Whether `key` has ever been written
    pub fn is_present(&self, key: StateKey) -> CoreResult<bool> {
        Ok(self.store.get(key)?.is_some())
    }

    pub fn session(&self) -> CoreResult<Session> {
        Ok(self.read_record(StateKey::Session)?.unwrap_or_default())
    }

    pub fn set_session(&self, session: &Session) -> CoreResult<()> {
        self.write(StateKey::Session, session)
    }

    pub fn stats(&self) -> CoreResult<Stats> {
        Ok(self.read_record(StateKey::Stats)?.unwrap_or_default())
    }

    pub fn set_stats(&self, stats: &Stats) -> CoreResult<()> {
        self.write(StateKey::Stats, stats)
    }

    /// Persisted blocklist; bare-string entries get the default time limit
    pub fn blocklist(&self) -> CoreResult<Vec<BlocklistEntry>> {
        let items: Vec<focusguard_api::BlocklistItem> = self.read_list(StateKey::Blocklist)?;
        Ok(items.into_iter().map(Into::into).collect())
    }

    pub fn set_blocklist(&self, entries: &[BlocklistEntry]) -> CoreResult<()> {
        self.write(StateKey::Blocklist, &entries)
    }

    pub fn groups(&self) -> CoreResult<Vec<Group>> {
        self.read_list(StateKey::BlockGroups)
    }

    pub fn set_groups(&self, groups: &[Group]) -> CoreResult<()> {
        self.write(StateKey::BlockGroups, &groups)
    }

    /// Stored group entries as-is, including ones that do not parse
    pub fn raw_groups(&self) -> CoreResult<Vec<serde_json::Value>> {
        match self.store.get(StateKey::BlockGroups)? {
            None => Ok(Vec::new()),
            Some(serde_json::Value::Array(items)) => Ok(items),
            Some(other) => {
                warn!(value = %other, "Persisted group list is not an array, ignoring");
                Ok(Vec::new())
            }
        }
    }

    pub fn set_raw_groups(&self, entries: Vec<serde_json::Value>) -> CoreResult<()> {
        self.store
            .set(StateKey::BlockGroups, &serde_json::Value::Array(entries))?;
        Ok(())
    }

    pub fn custom_content(&self) -> CoreResult<Option<CustomContent>> {
        self.read_record(StateKey::CustomContent)
    }

    pub fn set_custom_content(&self, content: &CustomContent) -> CoreResult<()> {
        self.write(StateKey::CustomContent, content)
    }

    fn write<T: Serialize + ?Sized>(&self, key: StateKey, value: &T) -> CoreResult<()> {
        let json = serde_json::to_value(value).map_err(focusguard_store::StoreError::from)?;
        self.store.set(key, &json)?;
        Ok(())
    }

    fn read_record<T: DeserializeOwned>(&self, key: StateKey) -> CoreResult<Option<T>> {
        let Some(value) = self.store.get(key)? else {
            return Ok(None);
        };
        match serde_json::from_value(value) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                warn!(key = %key, error = %e, "Malformed persisted record, using default");
                Ok(None)
            }
        }
    }

    fn read_list<T: DeserializeOwned>(&self, key: StateKey) -> CoreResult<Vec<T>> {
        let items = match self.store.get(key)? {
            None => return Ok(Vec::new()),
            Some(serde_json::Value::Array(items)) => items,
            Some(other) => {
                warn!(key = %key, value = %other, "Persisted list is not an array, ignoring");
                return Ok(Vec::new());
            }
        };

        Ok(items
            .into_iter()
            .filter_map(|item| match serde_json::from_value(item.clone()) {
                Ok(parsed) => Some(parsed),
                Err(e) => {
                    warn!(key = %key, entry = %item, error = %e, "Skipping malformed entry");
                    None
                }
            })
            .collect())
    }
}
