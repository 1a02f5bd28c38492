use crate::overlay::OverlayOptions;
use anyhow::{Context, Result};
use chrono::format::{Item, StrftimeItems};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const ENV_FILE: &str = ".env";
const RESOURCE_NAME_VAR: &str = "NUI_RESOURCE_NAME";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub host: HostConfig,
    #[serde(default)]
    pub overlay: OverlayConfig,
    #[serde(default)]
    pub images: ImagesConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HostConfig {
    pub resource_name: String,
    /// Defaults to `https://<resource_name>`.
    pub callback_base: Option<String>,
    /// Send no callbacks at all; outbound actions become no-ops.
    #[serde(default)]
    pub offline: bool,
    pub feed_url: Option<String>,
    pub replay_file: Option<PathBuf>,
    #[serde(default = "default_replay_interval")]
    pub replay_interval_ms: u64,
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_s: u64,
}

fn default_replay_interval() -> u64 { 1500 }
fn default_reconnect_delay() -> u64 { 2 }

impl HostConfig {
    /// Resource name, with `NUI_RESOURCE_NAME` taking precedence.
    pub fn resource_name(&self) -> String {
        match std::env::var(RESOURCE_NAME_VAR) {
            Ok(name) if !sanitize_key(&name).is_empty() => sanitize_key(&name),
            _ => self.resource_name.clone(),
        }
    }

    pub fn callback_base(&self) -> String {
        match &self.callback_base {
            Some(base) if !base.trim().is_empty() => base.trim().to_string(),
            _ => format!("https://{}", self.resource_name()),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct OverlayConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_excerpt_chars")]
    pub excerpt_chars: usize,
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

fn default_title() -> String { "The Valentine Times".to_string() }
fn default_excerpt_chars() -> usize { 100 }
fn default_placeholder() -> String { "No news yet, partner!".to_string() }
fn default_date_format() -> String { "%x".to_string() }

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            excerpt_chars: default_excerpt_chars(),
            placeholder: default_placeholder(),
            date_format: default_date_format(),
        }
    }
}

impl OverlayConfig {
    pub fn options(&self) -> OverlayOptions {
        OverlayOptions {
            excerpt_chars: self.excerpt_chars,
            placeholder: self.placeholder.clone(),
            date_format: self.date_format.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ImagesConfig {
    /// Fetch rendered image links in the background and hide the broken ones.
    #[serde(default = "default_true")]
    pub probe: bool,
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_ms: u64,
}

fn default_true() -> bool { true }
fn default_probe_timeout() -> u64 { 5000 }

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            probe: true,
            probe_timeout_ms: default_probe_timeout(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_file")]
    pub file: PathBuf,
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_file() -> PathBuf { PathBuf::from("newspaper-overlay.log") }
fn default_log_filter() -> String { "newspaper_overlay=info".to_string() }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: default_log_file(),
            filter: default_log_filter(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).with_context(|| "Failed to parse config TOML")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let format = &self.overlay.date_format;
        if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
            anyhow::bail!("overlay.date_format is not a valid strftime string: {:?}", format);
        }
        Ok(())
    }

    /// Load .env file into process environment. Real env vars take precedence.
    pub fn load_env_file() {
        let path = Path::new(ENV_FILE);
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return,
        };
        // Strip BOM if present (common on Windows-created files)
        let content = content.strip_prefix('\u{feff}').unwrap_or(&content);
        for line in content.lines() {
            let line = line.trim().trim_matches('\r');
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim();
                let value = value.trim().trim_matches('"').trim_matches('\'');
                if std::env::var(key).is_err() {
                    std::env::set_var(key, value);
                }
            }
        }
    }
}

/// Strip carriage returns, BOM, and other invisible chars from an env value.
fn sanitize_key(raw: &str) -> String {
    raw.replace(['\r', '\u{feff}', '\u{200b}'], "")
        .trim()
        .to_string()
}
