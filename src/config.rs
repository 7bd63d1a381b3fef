// src/config.rs
// App configuration: env var path override -> config/insights.toml -> built-in
// defaults. A missing file is normal (defaults apply); a broken file is logged
// and replaced by defaults rather than failing startup.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::warn;

const ENV_PATH: &str = "INSIGHTS_CONFIG_PATH";
const DEFAULT_PATH: &str = "config/insights.toml";

fn default_identity_cache_path() -> PathBuf {
    PathBuf::from("cache/ingested.json")
}
fn default_poll_interval_secs() -> u64 {
    300
}
fn default_provider() -> String {
    "openai".to_string()
}
fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_api_key() -> String {
    // "ENV" means: resolve from OPENAI_API_KEY at build time of the client.
    "ENV".to_string()
}
fn default_timeout_secs() -> u64 {
    15
}
fn default_per_page() -> u32 {
    25
}
fn default_window_hours() -> u64 {
    24
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub identity_cache_path: PathBuf,
    pub poll_interval_secs: u64,
    pub extractor: ExtractorConfig,
    pub collectors: CollectorsConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            identity_cache_path: default_identity_cache_path(),
            poll_interval_secs: default_poll_interval_secs(),
            extractor: ExtractorConfig::default(),
            collectors: CollectorsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    pub enabled: bool,
    /// Currently only "openai"; anything else disables extraction.
    pub provider: String,
    pub model: String,
    /// "ENV" reads OPENAI_API_KEY; any other value is used verbatim.
    pub api_key: String,
    /// Upper bound for one collaborator call, so a hung call cannot stall the
    /// drain indefinitely.
    pub timeout_secs: u64,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: default_provider(),
            model: default_model(),
            api_key: default_api_key(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CollectorsConfig {
    pub github: Option<GitHubConfig>,
    pub stackoverflow: Option<StackOverflowConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubConfig {
    pub owner: String,
    pub repo: String,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StackOverflowConfig {
    pub tag: String,
    #[serde(default = "default_window_hours")]
    pub window_hours: u64,
    #[serde(default = "default_per_page")]
    pub page_size: u32,
}

impl AppConfig {
    /// Load using $INSIGHTS_CONFIG_PATH, falling back to config/insights.toml,
    /// falling back to defaults. Never fails startup.
    pub fn load_default() -> Self {
        let path = std::env::var(ENV_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_PATH));
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "config unreadable; using defaults");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let cfg: AppConfig = toml::from_str(&content)
            .with_context(|| format!("parsing config from {}", path.display()))?;
        Ok(cfg)
    }
}
