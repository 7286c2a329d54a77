//! Configuration validation

use crate::policy::SESSION_RULE_ID_FLOOR;
use crate::schema::{RawConfig, RawGroup};
use std::collections::HashSet;
use thiserror::Error;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Group '{group}': {message}")]
    GroupError { group: String, message: String },

    #[error("Duplicate group name: {0}")]
    DuplicateGroupName(String),

    #[error("Session config error: {0}")]
    SessionError(String),

    #[error("Rule id offset {0} is below the session rule range ({SESSION_RULE_ID_FLOOR})")]
    RuleIdOffsetTooLow(u32),

    #[error("Rules config error: {0}")]
    RulesError(String),
}

/// Validate a raw configuration, collecting every problem found
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    validate_session(config, &mut errors);
    validate_rules(config, &mut errors);

    if let Some(groups) = &config.predefined_groups {
        let mut seen = HashSet::new();
        for group in groups {
            if !seen.insert(group.name.trim().to_lowercase()) {
                errors.push(ValidationError::DuplicateGroupName(group.name.clone()));
            }
            errors.extend(validate_group(group));
        }
    }

    errors
}

fn validate_session(config: &RawConfig, errors: &mut Vec<ValidationError>) {
    let session = &config.session;

    if session.default_duration_minutes == Some(0) {
        errors.push(ValidationError::SessionError(
            "default_duration_minutes must be at least 1".into(),
        ));
    }
    if session.max_duration_minutes == Some(0) {
        errors.push(ValidationError::SessionError(
            "max_duration_minutes must be at least 1".into(),
        ));
    }
    if let (Some(default), Some(max)) =
        (session.default_duration_minutes, session.max_duration_minutes)
        && default > max
    {
        errors.push(ValidationError::SessionError(format!(
            "default_duration_minutes ({}) exceeds max_duration_minutes ({})",
            default, max
        )));
    }

    if let Some(phrases) = &session.verification_phrases {
        if phrases.is_empty() {
            errors.push(ValidationError::SessionError(
                "verification_phrases cannot be empty".into(),
            ));
        }
        if phrases.iter().any(|p| p.trim().is_empty()) {
            errors.push(ValidationError::SessionError(
                "verification_phrases cannot contain blank phrases".into(),
            ));
        }
    }
}

fn validate_rules(config: &RawConfig, errors: &mut Vec<ValidationError>) {
    let rules = &config.rules;

    if let Some(offset) = rules.id_offset
        && offset < SESSION_RULE_ID_FLOOR
    {
        errors.push(ValidationError::RuleIdOffsetTooLow(offset));
    }

    if let Some(path) = &rules.redirect_path
        && !path.starts_with('/')
    {
        errors.push(ValidationError::RulesError(format!(
            "redirect_path '{}' must start with '/'",
            path
        )));
    }
}

fn validate_group(group: &RawGroup) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let name = group.name.clone();

    if group.name.trim().is_empty() {
        errors.push(ValidationError::GroupError {
            group: name.clone(),
            message: "name cannot be empty".into(),
        });
    }

    if group.websites.is_empty() {
        errors.push(ValidationError::GroupError {
            group: name.clone(),
            message: "at least one website is required".into(),
        });
    }

    if group.websites.iter().any(|w| w.trim().is_empty()) {
        errors.push(ValidationError::GroupError {
            group: name.clone(),
            message: "websites cannot be blank".into(),
        });
    }

    if group.time_limit_minutes == Some(0) {
        errors.push(ValidationError::GroupError {
            group: name,
            message: "time_limit_minutes must be at least 1".into(),
        });
    }

    errors
}
