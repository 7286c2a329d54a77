//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Service-level settings
    #[serde(default)]
    pub service: RawServiceConfig,

    #[serde(default)]
    pub session: RawSessionConfig,

    #[serde(default)]
    pub rules: RawRulesConfig,

    #[serde(default)]
    pub interstitial: RawInterstitialConfig,

    /// Group catalog seeded on first run. `None` means the built-in catalog.
    #[serde(default)]
    pub predefined_groups: Option<Vec<RawGroup>>,
}

/// Service-level settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawServiceConfig {
    /// IPC socket path
    pub socket_path: Option<PathBuf>,

    /// Data directory for the store
    pub data_dir: Option<PathBuf>,

    /// File the local rule table is written to
    pub rules_path: Option<PathBuf>,
}

/// Session bounds and hard mode
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawSessionConfig {
    pub default_duration_minutes: Option<u32>,

    pub max_duration_minutes: Option<u32>,

    /// Catalog a hard-mode phrase is drawn from
    pub verification_phrases: Option<Vec<String>>,
}

/// Rule compilation settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawRulesConfig {
    /// First rule id used for live-session rules
    pub id_offset: Option<u32>,

    /// Interstitial path blocked navigations redirect to
    pub redirect_path: Option<String>,

    pub priority: Option<u32>,
}

/// Interstitial page defaults
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawInterstitialConfig {
    pub default_message: Option<String>,
}

/// Predefined group definition
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawGroup {
    pub name: String,

    #[serde(default)]
    pub websites: Vec<String>,

    pub time_limit_minutes: Option<u32>,
}
