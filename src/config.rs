use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::dataset::TemplateType;
use crate::service::sink::HANDOFF_FILE_NAME;
use crate::template::DEFAULT_SIGNATURE;

pub const DEFAULT_API_BASE_URL: &str = "https://sms-8kiu.onrender.com";

/// Overrides [`AppConfig::api_base_url`] when set.
pub const API_URL_ENV: &str = "SMS_FORMAT_API_URL";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub api_base_url: String,
    /// Template used when the command line does not name one
    pub default_template: TemplateType,
    /// Whether a fresh preview starts with every row selected (default: true)
    pub select_all_on_preview: bool,
    pub request_timeout_secs: u64,
    /// Where exports are saved; platform download directory when unset
    pub output_dir: Option<PathBuf>,
    /// Where the handoff payload is written; app data directory when unset
    pub handoff_path: Option<PathBuf>,
    /// Maximum number of rows printed by `preview` (default: 20)
    pub preview_row_limit: usize,
    /// Footer line of locally rendered messages
    pub signature: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_owned(),
            default_template: TemplateType::default(),
            select_all_on_preview: true,
            request_timeout_secs: 60,
            output_dir: None,
            handoff_path: None,
            preview_row_limit: 20,
            signature: DEFAULT_SIGNATURE.to_owned(),
        }
    }
}

impl AppConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| crate::utils::standard_paths().output_dir)
    }

    pub fn handoff_path(&self) -> PathBuf {
        self.handoff_path.clone().unwrap_or_else(|| {
            crate::utils::standard_paths()
                .handoff_dir
                .join(HANDOFF_FILE_NAME)
        })
    }

    fn apply_env(&mut self, api_url: Option<String>) {
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            self.api_base_url = url.trim().to_owned();
        }
    }
}

pub fn get_config_path() -> PathBuf {
    crate::utils::standard_paths().base_dir.join("config.json")
}

fn read_config(path: &std::path::Path) -> Option<AppConfig> {
    let content = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str::<AppConfig>(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!("Ignoring unreadable config {}: {e}", path.display());
            None
        }
    }
}

/// Load the saved configuration, or defaults when there is none. The API URL
/// environment override is applied either way.
pub fn load_app_config() -> AppConfig {
    let mut config = read_config(&get_config_path()).unwrap_or_default();
    config.apply_env(std::env::var(API_URL_ENV).ok());
    config
}

/// Write `config` as pretty JSON to [`get_config_path`].
///
/// # Errors
///
/// Returns error if the config directory or file cannot be written
pub fn save_app_config(config: &AppConfig) -> Result<()> {
    save_app_config_to(config, &get_config_path())
}

fn save_app_config_to(config: &AppConfig, path: &std::path::Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
    }
    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write config: {}", path.display()))?;
    Ok(())
}
