//! Rule table backed by a JSON file

use async_trait::async_trait;
use focusguard_host_api::{CompiledRule, HostError, HostResult, RuleTable};
use focusguard_util::RuleId;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Rule table written to disk as a JSON array of rules.
///
/// Every update rewrites the whole file through a temporary file and a
/// rename, so readers only ever see a complete table.
pub struct JsonFileRuleTable {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileRuleTable {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rules currently on disk, ordered by id
    pub async fn load(&self) -> HostResult<Vec<CompiledRule>> {
        Ok(self.read_table().await?.into_values().collect())
    }

    async fn read_table(&self) -> HostResult<BTreeMap<RuleId, CompiledRule>> {
        let content = match tokio::fs::read(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };

        let rules: Vec<CompiledRule> = serde_json::from_slice(&content).map_err(|e| {
            HostError::RuleTable(format!("{} is not a rule table: {}", self.path.display(), e))
        })?;

        Ok(rules.into_iter().map(|r| (r.id, r)).collect())
    }

    async fn write_table(&self, table: &BTreeMap<RuleId, CompiledRule>) -> HostResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let rules: Vec<&CompiledRule> = table.values().collect();
        let json = serde_json::to_vec_pretty(&rules)
            .map_err(|e| HostError::Internal(e.to_string()))?;

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl RuleTable for JsonFileRuleTable {
    async fn list_rule_ids(&self) -> HostResult<Vec<RuleId>> {
        Ok(self.read_table().await?.into_keys().collect())
    }

    async fn replace(&self, remove: &[RuleId], add: Vec<CompiledRule>) -> HostResult<()> {
        let _guard = self.write_lock.lock().await;

        let mut table = self.read_table().await?;
        for id in remove {
            table.remove(id);
        }

        let added = add.len();
        for rule in add {
            if table.contains_key(&rule.id) {
                return Err(HostError::RuleTable(format!(
                    "Rule with id {} already exists",
                    rule.id
                )));
            }
            table.insert(rule.id, rule);
        }

        self.write_table(&table).await?;

        debug!(
            path = %self.path.display(),
            removed = remove.len(),
            added,
            "Rule file updated"
        );
        if table.is_empty() {
            info!(path = %self.path.display(), "Rule file cleared");
        }
        Ok(())
    }

    fn is_healthy(&self) -> bool {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.is_dir(),
            _ => true,
        }
    }
}
