use anyhow::{Context, Result};
use common::{DEFAULT_HIDE_DELAY_MS, is_allowed_rate};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Controller configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub playback: PlaybackSettings,

    #[serde(default)]
    pub controls: ControlsSettings,
}

/// Initial playback settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaybackSettings {
    /// Attempt playback as soon as metadata loads. The platform may still
    /// reject the attempt; the session then stays paused.
    #[serde(default)]
    pub autoplay: bool,

    #[serde(default = "default_volume")]
    pub initial_volume: u8,

    #[serde(default = "default_rate")]
    pub initial_rate: f64,

    /// Step used by skip-forward/backward shortcuts, in seconds.
    #[serde(default = "default_skip_step")]
    pub skip_step_seconds: f64,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            autoplay: false,
            initial_volume: default_volume(),
            initial_rate: default_rate(),
            skip_step_seconds: default_skip_step(),
        }
    }
}

/// On-screen controls settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ControlsSettings {
    /// Inactivity window before the controls auto-hide during playback.
    #[serde(default = "default_hide_delay")]
    pub hide_delay_ms: u64,
}

impl Default for ControlsSettings {
    fn default() -> Self {
        Self {
            hide_delay_ms: default_hide_delay(),
        }
    }
}

fn default_volume() -> u8 {
    100
}
fn default_rate() -> f64 {
    1.0
}
fn default_skip_step() -> f64 {
    10.0
}
fn default_hide_delay() -> u64 {
    DEFAULT_HIDE_DELAY_MS
}

impl Config {
    /// Default config file location.
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not determine config directory")?;
        Ok(config_dir.join("playback-controller").join("config.toml"))
    }

    /// Load from the default location, falling back to defaults when the
    /// file does not exist.
    pub fn load() -> Result<Self> {
        let path = Self::default_config_path()?;
        if !path.exists() {
            log::info!("No config file at {}, using defaults", path.display());
            return Ok(Self::default().sanitize());
        }
        Self::load_from(&path)
    }

    /// Load and validate a config file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config.sanitize())
    }

    /// Clamp out-of-range values back to their defaults, logging each
    /// adjustment.
    pub fn sanitize(mut self) -> Self {
        if self.controls.hide_delay_ms == 0 {
            log::warn!(
                "hide_delay_ms must be positive, using default {}ms",
                DEFAULT_HIDE_DELAY_MS
            );
            self.controls.hide_delay_ms = DEFAULT_HIDE_DELAY_MS;
        }

        if self.playback.initial_volume > 100 {
            log::warn!(
                "initial_volume {} out of range, clamping to 100",
                self.playback.initial_volume
            );
            self.playback.initial_volume = 100;
        }

        if !is_allowed_rate(self.playback.initial_rate) {
            log::warn!(
                "initial_rate {} is not an allowed rate, using 1.0",
                self.playback.initial_rate
            );
            self.playback.initial_rate = default_rate();
        }

        if self.playback.skip_step_seconds <= 0.0 {
            log::warn!(
                "skip_step_seconds must be positive, using default {}s",
                default_skip_step()
            );
            self.playback.skip_step_seconds = default_skip_step();
        }

        self
    }
}
