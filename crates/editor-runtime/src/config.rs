//! Runtime configuration
//!
//! Stored as `bridge.json` in the host's config directory. Every section is
//! optional; missing fields take their defaults.

use std::path::{Path, PathBuf};

use editor_commands::RouterPolicy;
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::constants::{backing_scale, defaults};
use crate::error::{BridgeError, Result};
use crate::logging::LoggingConfig;

const CONFIG_FILE_NAME: &str = "bridge.json";

/// Top-level runtime configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Multiplier applied to the device pixel ratio before clamping
    pub render_scale_multiplier: f64,
    /// Frame pump period for `IntervalFrameClock`
    pub frame_interval_ms: u64,
    /// Wheel routing heuristics
    pub router: RouterPolicy,
    pub logging: LoggingConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            render_scale_multiplier: defaults::RENDER_SCALE_MULTIPLIER,
            frame_interval_ms: defaults::FRAME_INTERVAL_MS,
            router: RouterPolicy::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl BridgeConfig {
    /// Path of the config file inside `config_dir`
    pub fn file_path(config_dir: &Path) -> PathBuf {
        config_dir.join(CONFIG_FILE_NAME)
    }

    /// Load configuration from `config_dir`, or defaults if no file exists
    pub async fn load(config_dir: &Path) -> Result<Self> {
        let config_path = Self::file_path(config_dir);

        if !fs::try_exists(&config_path).await? {
            log::debug!("No config at {:?}, using defaults", config_path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&config_path).await?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;

        log::info!("Configuration loaded from {:?}", config_path);
        Ok(config)
    }

    /// Save configuration into `config_dir`, creating it if needed
    pub async fn save(&self, config_dir: &Path) -> Result<()> {
        self.validate()?;
        fs::create_dir_all(config_dir).await?;

        let config_path = Self::file_path(config_dir);
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(&config_path, contents).await?;

        log::info!("Configuration saved to {:?}", config_path);
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !self.render_scale_multiplier.is_finite() || self.render_scale_multiplier <= 0.0 {
            return Err(BridgeError::Config(format!(
                "render_scale_multiplier must be a positive number, got {}",
                self.render_scale_multiplier
            )));
        }
        if self.render_scale_multiplier > backing_scale::MAX {
            log::warn!(
                "render_scale_multiplier {} exceeds the backing scale cap of {}",
                self.render_scale_multiplier,
                backing_scale::MAX
            );
        }
        if self.frame_interval_ms == 0 {
            return Err(BridgeError::Config(
                "frame_interval_ms must be at least 1".to_string(),
            ));
        }
        let router = &self.router;
        if !(router.zoom_sensitivity.is_finite() && router.zoom_sensitivity > 0.0) {
            return Err(BridgeError::Config(format!(
                "router.zoom_sensitivity must be a positive number, got {}",
                router.zoom_sensitivity
            )));
        }
        if !(router.zoom_delta_clamp.is_finite() && router.zoom_delta_clamp > 0.0) {
            return Err(BridgeError::Config(format!(
                "router.zoom_delta_clamp must be a positive number, got {}",
                router.zoom_delta_clamp
            )));
        }
        Ok(())
    }
}
