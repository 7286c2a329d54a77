//! Rule compiler: canonical patterns to rule-table records

use focusguard_config::RuleSettings;
use focusguard_host_api::{CompiledRule, ResourceType, RuleAction, RuleCondition};
use focusguard_util::RuleId;
use tracing::warn;

use crate::pattern::is_valid_pattern;

/// Compile `patterns` into redirect rules with ids counting up from
/// `id_offset`.
///
/// Ids are assigned to emitted rules only, so skipped patterns leave no gaps.
/// They are positional and carry no meaning across compiles.
pub fn compile_rules(
    patterns: &[String],
    id_offset: u32,
    settings: &RuleSettings,
) -> Vec<CompiledRule> {
    let mut rules = Vec::with_capacity(patterns.len());

    for pattern in patterns {
        if !is_valid_pattern(pattern) {
            warn!(pattern = %pattern, "Skipping invalid match pattern");
            continue;
        }

        let Some(id) = u32::try_from(rules.len())
            .ok()
            .and_then(|n| id_offset.checked_add(n))
        else {
            warn!(pattern = %pattern, "Rule id range exhausted");
            break;
        };

        rules.push(CompiledRule {
            id: RuleId::new(id),
            priority: settings.priority,
            action: RuleAction::redirect_to(settings.redirect_path.clone()),
            condition: RuleCondition {
                url_filter: pattern.clone(),
                resource_types: vec![ResourceType::MainFrame, ResourceType::SubFrame],
            },
        });
    }

    rules
}
