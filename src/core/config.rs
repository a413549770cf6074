use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::core::leads::dispatch::{DEFAULT_CHANNEL_BASE_URL, DEFAULT_PLACEHOLDER};
use crate::core::leads::export::{
    DEFAULT_TIMESTAMP_PATTERN, TimestampFormat, is_valid_pattern, offset_from_minutes,
};
use crate::core::leads::normalizer::HeaderPolicy;
use crate::core::leads::EngineSettings;
use crate::platform::{NativePlatform, Platform};

pub const CONFIG_FILE: &str = "config.toml";

/// Settings read from `config.toml` in the data directory. Every field is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_placeholder")]
    pub placeholder: String,

    #[serde(default = "default_channel_base_url")]
    pub channel_base_url: String,

    /// Offset applied to exported timestamps.
    #[serde(default)]
    pub utc_offset_minutes: i32,

    /// chrono `strftime` pattern for exported timestamps.
    #[serde(default = "default_timestamp_format")]
    pub timestamp_format: String,

    /// Read header-less sheets as name / label / phone instead of rejecting them.
    #[serde(default)]
    pub legacy_sheet_layout: bool,

    #[serde(default)]
    pub copy: CopyConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CopyConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
}

fn default_placeholder() -> String {
    DEFAULT_PLACEHOLDER.to_string()
}
fn default_channel_base_url() -> String {
    DEFAULT_CHANNEL_BASE_URL.to_string()
}
fn default_timestamp_format() -> String {
    DEFAULT_TIMESTAMP_PATTERN.to_string()
}
fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}
fn default_timeout_secs() -> u64 {
    15
}
fn default_temperature() -> f32 {
    0.7
}
fn default_top_p() -> f32 {
    0.9
}

impl Default for CopyConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            timeout_secs: default_timeout_secs(),
            temperature: default_temperature(),
            top_p: default_top_p(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            placeholder: default_placeholder(),
            channel_base_url: default_channel_base_url(),
            utc_offset_minutes: 0,
            timestamp_format: default_timestamp_format(),
            legacy_sheet_layout: false,
            copy: CopyConfig::default(),
        }
    }
}

impl AppConfig {
    pub async fn load<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let path = data_dir.as_ref().join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = tokio::fs::read_to_string(&path).await?;
        let mut config: AppConfig = toml::from_str(&content)
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        if config.placeholder.trim().is_empty() {
            config.placeholder = default_placeholder();
        }
        config
            .validate()
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        info!(
            "Loaded config: placeholder={}, utc_offset={}min, legacy_layout={}",
            config.placeholder, config.utc_offset_minutes, config.legacy_sheet_layout
        );
        Ok(config)
    }

    pub async fn save<P: AsRef<Path>>(&self, data_dir: P) -> Result<()> {
        let path = data_dir.as_ref().join(CONFIG_FILE);
        let content = toml::to_string_pretty(self)?;
        tokio::fs::write(&path, content)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        NativePlatform::restrict_file_permissions(&path);
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if !is_valid_pattern(&self.timestamp_format) {
            bail!(
                "timestamp_format '{}' is not a valid strftime pattern",
                self.timestamp_format
            );
        }
        if offset_from_minutes(self.utc_offset_minutes).is_none() {
            bail!(
                "utc_offset_minutes {} is out of range (must be between -1439 and 1439)",
                self.utc_offset_minutes
            );
        }
        Ok(())
    }

    /// Engine settings, with `legacy_layout` forcing the fixed sheet layout.
    pub fn engine_settings(&self, legacy_layout: bool) -> EngineSettings {
        EngineSettings {
            placeholder: self.placeholder.clone(),
            header_policy: if legacy_layout || self.legacy_sheet_layout {
                HeaderPolicy::LegacyLayout
            } else {
                HeaderPolicy::Strict
            },
            timestamps: TimestampFormat::new(self.utc_offset_minutes, &self.timestamp_format),
        }
    }
}
