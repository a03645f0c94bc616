// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration for the synchronization loop

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds, DurationSeconds};
use thiserror::Error;

/// Poll interval used until the CMS advertises one
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Granularity at which a sleeping or downloading loop notices a stop request
pub const DEFAULT_STOP_TICK: Duration = Duration::from_millis(250);

/// Configuration for the display synchronization loop
///
/// Built once at startup and never reloaded during a run.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// CMS endpoint URL
    pub cms_url: String,

    /// Hardware key identifying this display to the CMS
    pub hardware_key: String,

    /// Human readable display name
    pub display_name: String,

    /// Local storage directory for manifests and downloaded files
    pub save_dir: PathBuf,

    /// strftime-style format of schedule times sent by the CMS
    pub time_format: String,

    /// Offset of the CMS local time from UTC, in seconds
    pub cms_tz_offset: i64,

    /// File extension appended to downloaded resources
    pub resource_ext: String,

    /// File extension appended to downloaded layouts
    pub layout_ext: String,

    /// Poll interval until the CMS advertises one
    #[serde_as(as = "DurationSeconds<u64>")]
    pub poll_interval: Duration,

    /// Stop-request polling granularity
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub stop_tick: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            cms_url: "http://localhost/xmds.php".to_string(),
            hardware_key: String::new(),
            display_name: "signage-player".to_string(),
            save_dir: PathBuf::from("./res"),
            time_format: "%Y-%m-%d %H:%M:%S".to_string(),
            cms_tz_offset: 0,
            resource_ext: ".html".to_string(),
            layout_ext: ".xlf".to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            stop_tick: DEFAULT_STOP_TICK,
        }
    }
}

impl SyncConfig {
    /// Parse a JSON configuration document and validate it.
    ///
    /// Missing fields take their default values.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: SyncConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Configure the storage directory
    pub fn with_save_dir(mut self, save_dir: impl Into<PathBuf>) -> Self {
        self.save_dir = save_dir.into();
        self
    }

    /// Configure the CMS timezone offset (seconds east of UTC)
    pub fn with_cms_tz_offset(mut self, offset_secs: i64) -> Self {
        self.cms_tz_offset = offset_secs;
        self
    }

    /// Configure the initial poll interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Configure the stop-request polling granularity
    pub fn with_stop_tick(mut self, tick: Duration) -> Self {
        self.stop_tick = tick;
        self
    }

    /// Check that the configuration can drive a loop
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.save_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("save_dir must not be empty".into()));
        }
        if self.time_format.trim().is_empty() {
            return Err(ConfigError::Invalid("time_format must not be empty".into()));
        }
        if self.stop_tick.is_zero() {
            return Err(ConfigError::Invalid("stop_tick must be positive".into()));
        }
        Ok(())
    }
}

/// Errors from loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A field holds an unusable value
    #[error("invalid configuration: {0}")]
    Invalid(String),

    /// The document is not valid JSON for this schema
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
