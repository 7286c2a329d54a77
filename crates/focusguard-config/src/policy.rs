//! Validated policy structures

use crate::schema::{RawConfig, RawGroup, RawRulesConfig, RawServiceConfig, RawSessionConfig};
use focusguard_util::{default_data_dir, default_socket_path, rules_path_in};
use std::path::PathBuf;

/// Lowest rule id available to live-session rules
pub const SESSION_RULE_ID_FLOOR: u32 = 1000;

pub const DEFAULT_SESSION_MINUTES: u32 = 25;
pub const MAX_SESSION_MINUTES: u32 = 720;
pub const DEFAULT_REDIRECT_PATH: &str = "/blocked.html";
pub const DEFAULT_RULE_PRIORITY: u32 = 1;
pub const DEFAULT_GROUP_TIME_LIMIT: u32 = 60;
pub const DEFAULT_INTERSTITIAL_MESSAGE: &str = "Stay focused on your goals!";

const DEFAULT_PHRASES: &[&str] = &[
    "I am staying focused and productive",
    "My goals are more important than distractions",
    "Success requires dedication and discipline",
    "I choose productivity over procrastination",
    "Every minute counts towards my success",
];

const DEFAULT_GROUPS: &[(&str, &[&str])] = &[
    (
        "Social Media",
        &[
            "facebook.com",
            "twitter.com",
            "instagram.com",
            "tiktok.com",
            "snapchat.com",
            "linkedin.com",
            "pinterest.com",
            "reddit.com",
            "tumblr.com",
            "whatsapp.com",
        ],
    ),
    (
        "Video Streaming",
        &[
            "youtube.com",
            "netflix.com",
            "twitch.tv",
            "hulu.com",
            "disney.com",
            "vimeo.com",
            "dailymotion.com",
            "hbomax.com",
            "primevideo.com",
            "peacocktv.com",
        ],
    ),
    (
        "Gaming",
        &[
            "steam.com",
            "epicgames.com",
            "roblox.com",
            "minecraft.net",
            "blizzard.com",
            "leagueoflegends.com",
            "ea.com",
            "ubisoft.com",
            "playstation.com",
            "xbox.com",
        ],
    ),
    (
        "News & Media",
        &[
            "cnn.com",
            "bbc.com",
            "nytimes.com",
            "foxnews.com",
            "reuters.com",
            "bloomberg.com",
            "washingtonpost.com",
            "theguardian.com",
            "huffpost.com",
            "buzzfeed.com",
        ],
    ),
    (
        "Shopping",
        &[
            "amazon.com",
            "ebay.com",
            "walmart.com",
            "aliexpress.com",
            "etsy.com",
            "target.com",
            "bestbuy.com",
            "wish.com",
            "shopify.com",
            "wayfair.com",
        ],
    ),
];

/// Validated policy ready for use by the core
#[derive(Debug, Clone)]
pub struct Policy {
    pub service: ServiceConfig,
    pub session: SessionSettings,
    pub rules: RuleSettings,
    /// Catalog seeded into the group list on first run
    pub predefined_groups: Vec<PredefinedGroup>,
    pub interstitial: InterstitialSettings,
}

impl Policy {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        let predefined_groups = match raw.predefined_groups {
            Some(groups) => groups.into_iter().map(PredefinedGroup::from_raw).collect(),
            None => default_groups(),
        };

        Self {
            service: ServiceConfig::from_raw(raw.service),
            session: SessionSettings::from_raw(raw.session),
            rules: RuleSettings::from_raw(raw.rules),
            predefined_groups,
            interstitial: InterstitialSettings {
                default_message: raw
                    .interstitial
                    .default_message
                    .unwrap_or_else(|| DEFAULT_INTERSTITIAL_MESSAGE.into()),
            },
        }
    }
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            service: ServiceConfig::from_raw(RawServiceConfig::default()),
            session: SessionSettings::from_raw(RawSessionConfig::default()),
            rules: RuleSettings::from_raw(RawRulesConfig::default()),
            predefined_groups: default_groups(),
            interstitial: InterstitialSettings {
                default_message: DEFAULT_INTERSTITIAL_MESSAGE.into(),
            },
        }
    }
}

/// Paths the service works with
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub socket_path: PathBuf,
    pub data_dir: PathBuf,
    pub rules_path: PathBuf,
}

impl ServiceConfig {
    fn from_raw(raw: RawServiceConfig) -> Self {
        let data_dir = raw.data_dir.unwrap_or_else(default_data_dir);
        let rules_path = raw.rules_path.unwrap_or_else(|| rules_path_in(&data_dir));
        Self {
            socket_path: raw.socket_path.unwrap_or_else(default_socket_path),
            data_dir,
            rules_path,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub default_duration_minutes: u32,
    pub max_duration_minutes: u32,
    /// Never empty once validated
    pub verification_phrases: Vec<String>,
}

impl SessionSettings {
    fn from_raw(raw: RawSessionConfig) -> Self {
        Self {
            default_duration_minutes: raw
                .default_duration_minutes
                .unwrap_or(DEFAULT_SESSION_MINUTES),
            max_duration_minutes: raw.max_duration_minutes.unwrap_or(MAX_SESSION_MINUTES),
            verification_phrases: raw
                .verification_phrases
                .unwrap_or_else(|| DEFAULT_PHRASES.iter().map(|p| p.to_string()).collect()),
        }
    }
}

/// How session rules are compiled
#[derive(Debug, Clone)]
pub struct RuleSettings {
    pub id_offset: u32,
    pub redirect_path: String,
    pub priority: u32,
}

impl RuleSettings {
    fn from_raw(raw: RawRulesConfig) -> Self {
        Self {
            id_offset: raw.id_offset.unwrap_or(SESSION_RULE_ID_FLOOR),
            redirect_path: raw
                .redirect_path
                .unwrap_or_else(|| DEFAULT_REDIRECT_PATH.into()),
            priority: raw.priority.unwrap_or(DEFAULT_RULE_PRIORITY),
        }
    }
}

impl Default for RuleSettings {
    fn default() -> Self {
        Self::from_raw(RawRulesConfig::default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredefinedGroup {
    pub name: String,
    pub websites: Vec<String>,
    pub time_limit_minutes: u32,
}

impl PredefinedGroup {
    fn from_raw(raw: RawGroup) -> Self {
        Self {
            name: raw.name.trim().to_string(),
            websites: raw.websites,
            time_limit_minutes: raw.time_limit_minutes.unwrap_or(DEFAULT_GROUP_TIME_LIMIT),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InterstitialSettings {
    pub default_message: String,
}

fn default_groups() -> Vec<PredefinedGroup> {
    DEFAULT_GROUPS
        .iter()
        .map(|(name, sites)| PredefinedGroup {
            name: name.to_string(),
            websites: sites.iter().map(|s| s.to_string()).collect(),
            time_limit_minutes: DEFAULT_GROUP_TIME_LIMIT,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_shape() {
        let policy = Policy::default();
        assert_eq!(policy.predefined_groups.len(), 5);
        for group in &policy.predefined_groups {
            assert_eq!(group.websites.len(), 10);
            assert_eq!(group.time_limit_minutes, 60);
        }
        assert_eq!(policy.predefined_groups[0].name, "Social Media");
        assert_eq!(policy.rules.priority, 1);
        assert_eq!(policy.session.max_duration_minutes, 720);
        assert_eq!(policy.interstitial.default_message, "Stay focused on your goals!");
    }

    #[test]
    fn configured_groups_replace_catalog() {
        let raw: RawConfig = toml::from_str(
            r#"
            config_version = 1

            [[predefined_groups]]
            name = " Forums "
            websites = ["lobste.rs"]
            "#,
        )
        .unwrap();

        let policy = Policy::from_raw(raw);
        assert_eq!(policy.predefined_groups.len(), 1);
        assert_eq!(policy.predefined_groups[0].name, "Forums");
        assert_eq!(policy.predefined_groups[0].time_limit_minutes, 60);
    }

    #[test]
    fn rules_path_follows_data_dir() {
        let raw: RawConfig = toml::from_str(
            r#"
            config_version = 1

            [service]
            data_dir = "/tmp/fg-data"
            "#,
        )
        .unwrap();

        let policy = Policy::from_raw(raw);
        assert_eq!(policy.service.rules_path, rules_path_in(&PathBuf::from("/tmp/fg-data")));
    }
}
