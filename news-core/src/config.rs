use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::delivery::DeliveryPolicy;
use crate::error::{ConfigError, StorageError};
use crate::feed::ChatId;

/// Environment variable holding the chat API token.
pub const TOKEN_ENV: &str = "BOT_TOKEN";
/// Environment variable overriding the configuration file location.
pub const CONFIG_ENV: &str = "NEWSBOT_CONFIG";
/// Upper bound on the poll interval: one week.
pub const MAX_INTERVAL_MINUTES: u64 = 7 * 24 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub poll: PollSettings,
    /// Directory holding feed lists, keywords and the subscriber stores.
    pub resources_dir: PathBuf,
    /// Chats allowed to trigger a cycle or publish an article by hand.
    pub admins: Vec<ChatId>,
    /// Tell every subscriber when the bot starts and stops.
    pub notify_on_server_status: bool,
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollSettings {
    pub interval_minutes: u64,
    pub request_timeout_seconds: u64,
    pub persist_watermarks: bool,
    pub delivery_policy: DeliveryPolicy,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            poll: PollSettings::default(),
            resources_dir: PathBuf::from("./resources"),
            admins: Vec::new(),
            notify_on_server_status: false,
            log_level: "info".to_string(),
        }
    }
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval_minutes: 10,
            request_timeout_seconds: 20,
            persist_watermarks: false,
            delivery_policy: DeliveryPolicy::FailFast,
        }
    }
}

impl PollSettings {
    /// Configured interval clamped to `1..=MAX_INTERVAL_MINUTES` minutes.
    pub fn interval(&self) -> Duration {
        let minutes = self.interval_minutes.clamp(1, MAX_INTERVAL_MINUTES);
        Duration::from_secs(minutes * 60)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds.max(1))
    }
}

impl BotConfig {
    /// `$NEWSBOT_CONFIG`, else `<config dir>/newsbot/config.json`.
    pub fn config_file_path() -> Result<PathBuf, ConfigError> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Ok(PathBuf::from(path));
        }
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("newsbot").join("config.json"))
    }

    /// Loads the configuration file. A missing file is replaced by the
    /// defaults, which are written out for the next start; failing to write
    /// them is reported as an error so the caller can log it.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_or_create(&Self::config_file_path()?)
    }

    pub fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let default_config = Self::default();
            default_config.save_to(path)?;
            return Ok(default_config);
        }
        Ok(Self::load_from_file(path)?)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, StorageError> {
        let content = std::fs::read(path).map_err(|source| StorageError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&content).map_err(|source| StorageError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save_to(&self, path: &Path) -> Result<(), StorageError> {
        let io_err = |source| StorageError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_vec_pretty(self).map_err(|source| StorageError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json).map_err(io_err)
    }

    /// The chat API token. Its absence is fatal at startup.
    pub fn bot_token() -> Result<String, ConfigError> {
        std::env::var(TOKEN_ENV)
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::Missing(TOKEN_ENV))
    }

    /// Whether `chat_id` may run the admin-only commands.
    pub fn is_admin(&self, chat_id: ChatId) -> bool {
        self.admins.contains(&chat_id)
    }

    pub fn watermarks_path(&self) -> PathBuf {
        self.resources_dir.join("watermarks.json")
    }

    pub fn help_path(&self) -> PathBuf {
        self.resources_dir.join("help.md")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_fills_defaults() {
        let config: BotConfig =
            serde_json::from_str(r#"{ "admins": [42], "poll": { "interval_minutes": 5 } }"#)
                .unwrap();
        assert_eq!(config.admins, vec![42]);
        assert_eq!(config.poll.interval(), Duration::from_secs(300));
        assert_eq!(config.poll.request_timeout_seconds, 20);
        assert_eq!(config.poll.delivery_policy, DeliveryPolicy::FailFast);
        assert_eq!(config.resources_dir, PathBuf::from("./resources"));
    }

    #[test]
    fn delivery_policy_uses_snake_case() {
        let settings: PollSettings =
            serde_json::from_str(r#"{ "delivery_policy": "independent" }"#).unwrap();
        assert_eq!(settings.delivery_policy, DeliveryPolicy::Independent);
    }

    #[test]
    fn huge_interval_is_clamped_instead_of_overflowing() {
        let settings = PollSettings {
            interval_minutes: u64::MAX,
            ..PollSettings::default()
        };
        assert_eq!(
            settings.interval(),
            Duration::from_secs(MAX_INTERVAL_MINUTES * 60)
        );

        let zero = PollSettings {
            interval_minutes: 0,
            ..PollSettings::default()
        };
        assert_eq!(zero.interval(), Duration::from_secs(60));
    }

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = std::env::temp_dir().join(format!("newsbot_config_{}", std::process::id()));
        let path = dir.join("config.json");
        let _ = std::fs::remove_dir_all(&dir);

        let config = BotConfig::load_or_create(&path).unwrap();
        assert_eq!(config.poll.interval_minutes, 10);
        assert!(path.exists());
        assert_eq!(BotConfig::load_from_file(&path).unwrap().log_level, "info");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn unwritable_default_config_is_an_error() {
        let blocker = std::env::temp_dir().join(format!("newsbot_blocker_{}", std::process::id()));
        std::fs::write(&blocker, b"not a directory").unwrap();

        let result = BotConfig::load_or_create(&blocker.join("config.json"));
        assert!(matches!(result, Err(ConfigError::Storage(_))));

        let _ = std::fs::remove_file(&blocker);
    }
}
