use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

pub const MULTITHREADING_ENV_VAR: &str = "ISOVIEW_MULTITHREADING";
pub const PAINT_THREADS_ENV_VAR: &str = "ISOVIEW_PAINT_THREADS";

pub const DEFAULT_MAX_VIEWPORTS: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeightUnits {
    #[default]
    Units,
    Imperial,
    Metric,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub multithreading: bool,
    /// Worker count for the paint pool; `None` lets rayon pick.
    pub paint_threads: Option<usize>,
    pub always_show_gridlines: bool,
    pub render_weather_gloom: bool,
    pub max_viewports: usize,
    pub height_units: HeightUnits,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            multithreading: false,
            paint_threads: None,
            always_show_gridlines: false,
            render_weather_gloom: true,
            max_viewports: DEFAULT_MAX_VIEWPORTS,
            height_units: HeightUnits::Units,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read render config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse render config: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("invalid render config value for {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}

impl RenderConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: RenderConfig = serde_json::from_str(raw).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_viewports == 0 {
            return Err(ConfigError::Invalid {
                field: "max_viewports",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.paint_threads == Some(0) {
            return Err(ConfigError::Invalid {
                field: "paint_threads",
                reason: "must be at least 1 when set".to_string(),
            });
        }
        Ok(())
    }

    /// Applies `ISOVIEW_*` environment overrides. Unparseable values are
    /// logged and the configured value is kept.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(value) = read_env_override(MULTITHREADING_ENV_VAR) {
            match parse_bool(&value) {
                Some(enabled) => self.multithreading = enabled,
                None => warn!(
                    env_var = MULTITHREADING_ENV_VAR,
                    value = value.as_str(),
                    "invalid multithreading env var value; falling back to config"
                ),
            }
        }
        if let Some(value) = read_env_override(PAINT_THREADS_ENV_VAR) {
            match value.parse::<usize>() {
                Ok(threads) if threads > 0 => self.paint_threads = Some(threads),
                _ => warn!(
                    env_var = PAINT_THREADS_ENV_VAR,
                    value = value.as_str(),
                    "invalid paint thread env var value; falling back to config"
                ),
            }
        }
        self
    }

    /// Sprite offset for height marker labels in the configured unit.
    pub fn height_marker_offset(&self) -> i32 {
        match self.height_units {
            HeightUnits::Units => 0,
            HeightUnits::Imperial => 256,
            HeightUnits::Metric => 2 * 256,
        }
    }
}

fn read_env_override(var: &'static str) -> Option<String> {
    match env::var(var) {
        Ok(value) => Some(value),
        Err(env::VarError::NotPresent) => None,
        Err(err) => {
            warn!(
                env_var = var,
                error = %err,
                "unable to read render config env var; falling back to config"
            );
            None
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}
