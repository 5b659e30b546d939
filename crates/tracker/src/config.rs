//! Tracker configuration.

use crate::{TrackerError, TrackerResult};
use batch_emitter::EmitterConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Platform code sent as `p`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Platform {
    #[serde(rename = "web")]
    Web,
    #[serde(rename = "mob")]
    Mobile,
    #[serde(rename = "pc")]
    Desktop,
    #[default]
    #[serde(rename = "srv")]
    Server,
    #[serde(rename = "app")]
    General,
    #[serde(rename = "tv")]
    ConnectedTv,
    #[serde(rename = "cnsl")]
    GameConsole,
    #[serde(rename = "iot")]
    InternetOfThings,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::Mobile => "mob",
            Self::Desktop => "pc",
            Self::Server => "srv",
            Self::General => "app",
            Self::ConnectedTv => "tv",
            Self::GameConsole => "cnsl",
            Self::InternetOfThings => "iot",
        }
    }
}

/// Properties stamped on every event a tracker sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Tracker namespace (`tna`), also the registry key.
    pub namespace: String,
    /// Application id (`aid`).
    pub app_id: String,
    #[serde(default)]
    pub platform: Platform,
    /// Base64-encode contexts and self-describing bodies (`cx`, `ue_px`).
    #[serde(default = "default_base64_encode")]
    pub base64_encode: bool,
}

fn default_base64_encode() -> bool {
    true
}

impl TrackerConfig {
    pub fn new(namespace: impl Into<String>, app_id: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            app_id: app_id.into(),
            platform: Platform::default(),
            base64_encode: true,
        }
    }

    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn base64_encode(mut self, base64_encode: bool) -> Self {
        self.base64_encode = base64_encode;
        self
    }

    pub fn validate(&self) -> TrackerResult<()> {
        if self.namespace.trim().is_empty() {
            return Err(TrackerError::Config("namespace cannot be empty".to_string()));
        }
        Ok(())
    }
}

/// Tracker and emitter configuration read together from one JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerSettings {
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub emitter: EmitterConfig,
}

impl TrackerSettings {
    /// Load settings from a JSON file, then apply `TRACKER_*` environment overrides.
    pub fn load_from_file(path: &Path) -> TrackerResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut settings: TrackerSettings = serde_json::from_str(&content)?;
        settings.emitter.apply_env()?;
        Ok(settings)
    }
}
