use anyhow::{anyhow, Result};
use log::{info, LevelFilter};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::backend::MockLatency;

/// Mock backend round-trip times in milliseconds
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct LatencySettings {
    pub fetch_contacts_ms: u64,
    pub fetch_messages_ms: u64,
    pub send_message_ms: u64,
    pub mark_as_read_ms: u64,
}

impl Default for LatencySettings {
    fn default() -> Self {
        let latency = MockLatency::default();
        LatencySettings {
            fetch_contacts_ms: latency.fetch_contacts.as_millis() as u64,
            fetch_messages_ms: latency.fetch_messages.as_millis() as u64,
            send_message_ms: latency.send_message.as_millis() as u64,
            mark_as_read_ms: latency.mark_as_read.as_millis() as u64,
        }
    }
}

impl LatencySettings {
    pub fn to_latency(&self) -> MockLatency {
        MockLatency {
            fetch_contacts: Duration::from_millis(self.fetch_contacts_ms),
            fetch_messages: Duration::from_millis(self.fetch_messages_ms),
            send_message: Duration::from_millis(self.send_message_ms),
            mark_as_read: Duration::from_millis(self.mark_as_read_ms),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub latency: LatencySettings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    pub failure_rate: f64,
    pub log_level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixture: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            latency: LatencySettings::default(),
            timeout_ms: None,
            failure_rate: 0.0,
            log_level: "info".to_string(),
            log_file: None,
            fixture: None,
        }
    }
}

impl Settings {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    pub fn level_filter(&self) -> Result<LevelFilter> {
        self.log_level
            .parse::<LevelFilter>()
            .map_err(|_| anyhow!("Unknown log level '{}'", self.log_level))
    }

    /// Reject values the mock backend cannot honour
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.failure_rate) {
            return Err(anyhow!("failure_rate must be between 0 and 1, got {}", self.failure_rate));
        }
        if self.timeout_ms == Some(0) {
            return Err(anyhow!("timeout_ms must be greater than zero"));
        }
        self.level_filter()?;
        Ok(())
    }
}

static CONFIG_PATH_OVERRIDE: OnceCell<PathBuf> = OnceCell::new();

/// Use `path` instead of the per-user settings file. Only the first call wins.
pub fn set_config_path_override(path: PathBuf) -> bool {
    CONFIG_PATH_OVERRIDE.set(path).is_ok()
}

pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| anyhow!("Could not determine config directory"))?
        .join("chatsync");

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

fn get_config_path() -> Result<PathBuf> {
    if let Some(path) = CONFIG_PATH_OVERRIDE.get() {
        return Ok(path.clone());
    }
    Ok(get_config_dir()?.join("settings.json"))
}

/// Load settings from the configured location, defaults when there is no file
pub fn load_settings() -> Result<Settings> {
    load_settings_from(&get_config_path()?)
}

pub fn load_settings_from(path: &Path) -> Result<Settings> {
    if !path.exists() {
        info!("No settings at {}, using defaults", path.display());
        return Ok(Settings::default());
    }

    let mut file = File::open(path)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;

    let settings: Settings = serde_json::from_str(&contents)?;
    settings.validate()?;
    info!("Loaded settings from {}", path.display());

    Ok(settings)
}

pub fn save_settings_to(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, settings)?;

    info!("Settings saved to {}", path.display());
    Ok(())
}
