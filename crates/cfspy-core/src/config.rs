use std::time::Duration;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{CfspyError, Result};

pub const DEFAULT_PREFIX: &str = "c;";
pub const DEFAULT_NAME: &str = "CFSpy";
pub const DEFAULT_DESCRIPTION: &str =
    "Codeforces Spy watches for Codeforces links and shows a preview.";
pub const DEFAULT_WIDGET_LIFETIME_SECS: u64 = 60;
pub const DEFAULT_ERROR_MESSAGE_TTL_SECS: u64 = 30;

/// Env var naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "CFSPY_CONFIG";

/// Top-level config (cfspy.toml + CFSPY_* env overrides).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CfspyConfig {
    #[serde(default)]
    pub discord: DiscordConfig,
    #[serde(default)]
    pub widget: WidgetSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    /// Override with env var: CFSPY_DISCORD_BOT_TOKEN
    #[serde(default)]
    pub bot_token: String,
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_description")]
    pub description: String,
    /// Linked from internal error messages when set.
    pub support_url: Option<String>,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            prefix: default_prefix(),
            name: default_name(),
            description: default_description(),
            support_url: None,
        }
    }
}

/// Widget timing knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WidgetSettings {
    /// How long a preview reacts to its controls.
    #[serde(default = "default_lifetime_secs")]
    pub lifetime_secs: u64,
    /// How long error replies stay before being deleted.
    #[serde(default = "default_error_message_ttl_secs")]
    pub error_message_ttl_secs: u64,
}

impl Default for WidgetSettings {
    fn default() -> Self {
        Self {
            lifetime_secs: default_lifetime_secs(),
            error_message_ttl_secs: default_error_message_ttl_secs(),
        }
    }
}

impl WidgetSettings {
    pub fn lifetime(&self) -> Duration {
        Duration::from_secs(self.lifetime_secs)
    }

    pub fn error_message_ttl(&self) -> Duration {
        Duration::from_secs(self.error_message_ttl_secs)
    }
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}
fn default_name() -> String {
    DEFAULT_NAME.to_string()
}
fn default_description() -> String {
    DEFAULT_DESCRIPTION.to_string()
}
fn default_lifetime_secs() -> u64 {
    DEFAULT_WIDGET_LIFETIME_SECS
}
fn default_error_message_ttl_secs() -> u64 {
    DEFAULT_ERROR_MESSAGE_TTL_SECS
}

impl CfspyConfig {
    /// Load config from a TOML file with CFSPY_* env var overrides.
    ///
    /// The file is picked in order:
    ///   1. Explicit path argument
    ///   2. $CFSPY_CONFIG
    ///   3. ~/.cfspy/cfspy.toml
    ///
    /// A missing file is not an error; every field has a default. Env keys
    /// split on the first underscore only, so `CFSPY_DISCORD_BOT_TOKEN` sets
    /// `discord.bot_token`.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let path = config_path
            .map(String::from)
            .or_else(|| std::env::var(CONFIG_PATH_ENV).ok())
            .unwrap_or_else(default_config_path);

        let config: CfspyConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(
                Env::prefixed("CFSPY_")
                    .ignore(&["config"])
                    .map(|key| key.as_str().replacen('_', ".", 1).into()),
            )
            .extract()
            .map_err(|e| CfspyError::Config(e.to_string()))?;

        tracing::info!(path = %path, "config loaded");
        Ok(config)
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.cfspy/cfspy.toml", home)
}
