//! Bot-level configuration

use serde::{Deserialize, Serialize};

const CONFIG_FILE_PATH: &str = "botconfig.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Rows per page on paginated inline keyboards.
    #[serde(default = "default_items_per_page")]
    pub items_per_page: usize,
    /// This bot's username, stamped onto updates as `me` by transport adapters.
    #[serde(default)]
    pub bot_username: Option<String>,
}

fn default_items_per_page() -> usize {
    5
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            items_per_page: default_items_per_page(),
            bot_username: None,
        }
    }
}

impl BotConfig {
    /// Load from `botconfig.toml` in the working directory when present, then
    /// apply environment overrides.
    pub fn load() -> Self {
        let mut config = BotConfig::default();

        if std::path::Path::new(CONFIG_FILE_PATH).exists() {
            if let Ok(content) = std::fs::read_to_string(CONFIG_FILE_PATH) {
                if let Ok(file_config) = toml::from_str::<BotConfig>(&content) {
                    config = file_config;
                }
            }
        }

        if let Ok(per_page) = std::env::var("ITEMS_PER_PAGE") {
            if let Ok(per_page) = per_page.trim().parse() {
                config.items_per_page = per_page;
            }
        }
        if let Ok(username) = std::env::var("BOT_USERNAME") {
            config.bot_username = Some(username);
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BotConfig::default();
        assert_eq!(config.items_per_page, 5);
        assert!(config.bot_username.is_none());
    }

    #[test]
    fn test_parse_toml() {
        let config: BotConfig =
            toml::from_str("items_per_page = 3\nbot_username = \"finbot\"").unwrap();
        assert_eq!(config.items_per_page, 3);
        assert_eq!(config.bot_username.as_deref(), Some("finbot"));
    }

    #[test]
    fn test_parse_toml_defaults_missing_fields() {
        let config: BotConfig = toml::from_str("").unwrap();
        assert_eq!(config.items_per_page, 5);
    }
}
