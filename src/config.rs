// src/config.rs

//! Configuration for device lookups, mode selection and the headless driver.
//!
//! Every struct deserializes with `#[serde(default)]`, so a configuration file
//! only needs to name the settings it changes. The file is JSON and its path
//! is taken from the `DISPLAY_MODES_CONFIG` environment variable; without it
//! the defaults below are used.

use serde::{Deserialize, Serialize};
use std::path::Path;

use anyhow::{Context, Result};
use log::{info, warn};
use once_cell::sync::Lazy;

use crate::geometry::Rect;
use crate::resolution::Resolution;

/// Environment variable naming the JSON configuration file.
pub const CONFIG_PATH_ENV: &str = "DISPLAY_MODES_CONFIG";

/// Process-wide configuration, loaded on first use.
pub static CONFIG: Lazy<Config> = Lazy::new(Config::load);

// --- Top-Level Configuration Structure ---

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Device lookup and mode selection settings.
    pub registry: RegistryConfig,
    /// Simulated displays served by the headless driver.
    pub headless: HeadlessConfig,
}

impl Config {
    /// Loads the file named by `DISPLAY_MODES_CONFIG`, falling back to
    /// defaults when the variable is unset or the file is unusable.
    pub fn load() -> Self {
        let Some(path) = std::env::var_os(CONFIG_PATH_ENV) else {
            info!("{} not set, using default configuration", CONFIG_PATH_ENV);
            return Config::default();
        };
        match Config::from_path(Path::new(&path)) {
            Ok(config) => {
                info!("Loaded configuration from {:?}", path);
                config
            }
            Err(e) => {
                warn!("Ignoring configuration file {:?}: {:#}", path, e);
                Config::default()
            }
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Config::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Failed to parse display configuration")
    }
}

// --- Registry Configuration ---

/// When the registry re-reads the primary display from the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryResync {
    /// Resolve once on first access, then only on `DisplayRegistry::refresh`
    /// or when the cached primary device is no longer enumerated.
    #[default]
    OnRefresh,
    /// Adopt the driver's reported primary on every enumeration.
    EveryQuery,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Number of display indices `find_device_containing_point` probes.
    pub max_point_search: usize,
    /// Tolerance, in Hz, when matching a requested refresh rate.
    /// Matches are strict: `|actual - requested| < tolerance`.
    pub refresh_tolerance_hz: f32,
    pub primary_resync: PrimaryResync,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        RegistryConfig {
            max_point_search: 6,
            refresh_tolerance_hz: 1.0,
            primary_resync: PrimaryResync::OnRefresh,
        }
    }
}

// --- Headless Driver Configuration ---

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HeadlessConfig {
    /// Displays in enumeration order. Empty means a single 1920x1080 primary.
    pub displays: Vec<HeadlessDisplayConfig>,
}

/// One simulated display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadlessDisplayConfig {
    pub id: String,
    /// Defaults to the current mode's origin and size.
    #[serde(default)]
    pub bounds: Option<Rect>,
    pub current: Resolution,
    /// Modes the display accepts. The current mode is always accepted.
    #[serde(default)]
    pub modes: Vec<Resolution>,
    #[serde(default)]
    pub primary: bool,
}
