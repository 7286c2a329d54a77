//! URL-match rule records as held by the rule table

use focusguard_util::RuleId;
use serde::{Deserialize, Serialize};

/// Request kinds a rule applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    MainFrame,
    SubFrame,
}

/// What a matching request is rewritten to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleAction {
    Redirect { redirect: RedirectTarget },
}

impl RuleAction {
    pub fn redirect_to(path: impl Into<String>) -> Self {
        RuleAction::Redirect {
            redirect: RedirectTarget {
                extension_path: path.into(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectTarget {
    pub extension_path: String,
}

/// Which requests a rule matches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleCondition {
    pub url_filter: String,
    pub resource_types: Vec<ResourceType>,
}

/// One compiled blocking rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledRule {
    pub id: RuleId,
    pub priority: u32,
    pub action: RuleAction,
    pub condition: RuleCondition,
}

impl CompiledRule {
    pub fn url_filter(&self) -> &str {
        &self.condition.url_filter
    }
}
