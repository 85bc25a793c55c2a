use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::correlator::CardExpectation;
use crate::error::{CheckError, Result};
use crate::keywords::SystemKeywords;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub gmail: GmailConfig,

    #[serde(default)]
    pub trello: TrelloConfig,

    /// Browser-driven board collection
    #[serde(default)]
    pub ui: UiConfig,

    #[serde(default)]
    pub checks: ChecksConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GmailConfig {
    /// Authorized-user secret (client id, secret, refresh token)
    #[serde(default = "default_token_file")]
    pub token_file: PathBuf,

    #[serde(default = "default_user_id")]
    pub user_id: String,

    /// Upper bound on messages listed per run
    #[serde(default = "default_max_messages")]
    pub max_messages: u32,

    #[serde(default = "default_gmail_api_base")]
    pub api_base: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrelloConfig {
    #[serde(default)]
    pub api_key: String,

    #[serde(default)]
    pub api_token: String,

    #[serde(default)]
    pub board_id: String,

    #[serde(default = "default_trello_api_base")]
    pub api_base: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// WebDriver server (chromedriver, geckodriver)
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    #[serde(default)]
    pub board_url: String,

    #[serde(default = "default_browser")]
    pub browser: String,

    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Seconds to wait for an element to show up
    #[serde(default = "default_wait_timeout")]
    pub wait_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecksConfig {
    #[serde(default)]
    pub system_keywords: SystemKeywords,

    #[serde(default = "default_urgent_keyword")]
    pub urgent_keyword: String,

    #[serde(default = "default_urgent_label")]
    pub urgent_label: String,

    #[serde(default)]
    pub expected_cards: Vec<CardExpectation>,
}

fn default_token_file() -> PathBuf {
    PathBuf::from("token.json")
}

fn default_user_id() -> String {
    "me".to_string()
}

fn default_max_messages() -> u32 {
    100
}

fn default_gmail_api_base() -> String {
    "https://gmail.googleapis.com/gmail/v1".to_string()
}

fn default_trello_api_base() -> String {
    "https://api.trello.com/1".to_string()
}

fn default_webdriver_url() -> String {
    "http://localhost:9515".to_string()
}

fn default_browser() -> String {
    "chrome".to_string()
}

fn default_headless() -> bool {
    true
}

fn default_wait_timeout() -> u64 {
    10
}

fn default_urgent_keyword() -> String {
    "urgent".to_string()
}

fn default_urgent_label() -> String {
    "Urgent".to_string()
}

impl Default for GmailConfig {
    fn default() -> Self {
        Self {
            token_file: default_token_file(),
            user_id: default_user_id(),
            max_messages: default_max_messages(),
            api_base: default_gmail_api_base(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            webdriver_url: default_webdriver_url(),
            board_url: String::new(),
            browser: default_browser(),
            headless: default_headless(),
            wait_timeout_secs: default_wait_timeout(),
        }
    }
}

impl Default for ChecksConfig {
    fn default() -> Self {
        Self {
            system_keywords: SystemKeywords::default(),
            urgent_keyword: default_urgent_keyword(),
            urgent_label: default_urgent_label(),
            expected_cards: Vec::new(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Load the file when it exists, fall back to defaults otherwise,
    /// then apply environment overrides
    pub fn load_or_default(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            Self::load(path)?
        } else {
            tracing::info!("No config at {}, using defaults", path.display());
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Secrets and ids from the environment win over the file
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("TRELLO_API_KEY") {
            self.trello.api_key = v;
        }
        if let Some(v) = lookup("TRELLO_API_TOKEN") {
            self.trello.api_token = v;
        }
        if let Some(v) = lookup("TRELLO_BOARD_ID") {
            self.trello.board_id = v;
        }
        if let Some(v) = lookup("GMAIL_TOKEN_FILE") {
            self.gmail.token_file = PathBuf::from(v);
        }
        if let Some(v) = lookup("WEBDRIVER_URL") {
            self.ui.webdriver_url = v;
        }
    }

    /// Board API settings needed by the Trello client
    pub fn require_trello(&self) -> Result<()> {
        if self.trello.api_key.is_empty() {
            return Err(CheckError::missing("trello.api_key (or TRELLO_API_KEY)"));
        }
        if self.trello.api_token.is_empty() {
            return Err(CheckError::missing("trello.api_token (or TRELLO_API_TOKEN)"));
        }
        if self.trello.board_id.is_empty() {
            return Err(CheckError::missing("trello.board_id (or TRELLO_BOARD_ID)"));
        }
        Ok(())
    }

    pub fn require_ui(&self) -> Result<()> {
        if self.ui.board_url.is_empty() {
            return Err(CheckError::missing("ui.board_url"));
        }
        Ok(())
    }

    pub fn example() -> Self {
        Config {
            gmail: GmailConfig::default(),
            trello: TrelloConfig {
                api_key: "your-trello-api-key".to_string(),
                api_token: "your-trello-api-token".to_string(),
                board_id: "your-board-id".to_string(),
                api_base: default_trello_api_base(),
            },
            ui: UiConfig {
                board_url: "https://trello.com/b/BOARD/your-board".to_string(),
                ..UiConfig::default()
            },
            checks: ChecksConfig {
                expected_cards: vec![CardExpectation {
                    title: "summarize the meeting".to_string(),
                    description: Some("For all of us Please do so".to_string()),
                    status: Some("To Do".to_string()),
                    label: Some("New".to_string()),
                }],
                ..ChecksConfig::default()
            },
        }
    }
}
