//! Configuration management

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, TimeZone};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;
use crate::filter::QualityFilter;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuideConfig {
    /// Maximum entries kept in watch history
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    /// Hours added to "now" before guide lookups, for feeds with skewed clocks
    #[serde(default)]
    pub epg_time_offset: f32,
    #[serde(default)]
    pub default_quality: QualityFilter,
}

fn default_history_limit() -> usize { 100 }

impl Default for GuideConfig {
    fn default() -> Self {
        Self {
            history_limit: 100,
            epg_time_offset: 0.0,
            default_quality: QualityFilter::All,
        }
    }
}

impl GuideConfig {
    fn config_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("iptv_guide");
        path.push("config.json");
        path
    }

    /// Load from the user config dir, falling back to defaults
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable config");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Apply the configured EPG offset to a wall-clock instant
    pub fn adjusted_now<Tz: TimeZone>(&self, now: DateTime<Tz>) -> DateTime<Tz> {
        let offset_secs = (self.epg_time_offset * 3600.0).round() as i64;
        now + Duration::seconds(offset_secs)
    }
}
