//! JSON configuration file loading (§6).
//!
//! A missing or invalid config file is **non-fatal** (§7):
//! [`AdcConfig::load`] always returns a usable config, warning and falling
//! back to [`AdcConfig::default`] rather than propagating the error.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::constants::DEFAULT_BUS_INDEX;

/// The single configuration key this core consumes: which bus hardware
/// index `find_devices` should open (§9 design note: this MUST come from
/// config, not a hard-coded literal, since the index is environment
/// specific).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdcConfig {
    /// Index into `BusDriver::list_bus_hardware()` to open.
    #[serde(default = "default_bus_index")]
    pub selected_bus_index: u32,
}

fn default_bus_index() -> u32 {
    DEFAULT_BUS_INDEX
}

impl Default for AdcConfig {
    fn default() -> Self {
        Self {
            selected_bus_index: DEFAULT_BUS_INDEX,
        }
    }
}

impl AdcConfig {
    /// Loads configuration from `path`, falling back to
    /// [`AdcConfig::default`] (and logging a warning) if the file is
    /// missing, unreadable, or fails to parse.
    #[must_use]
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::try_load(path) {
            Ok(config) => config,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "config load failed, using defaults");
                Self::default()
            }
        }
    }

    fn try_load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        Ok(config)
    }
}

/// Failure reading or parsing the configuration file.
///
/// Never surfaced to callers of [`AdcConfig::load`] directly; kept as a
/// named type so `try_load` reads the same as the rest of this workspace's
/// `thiserror` enums (see §7).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read (including "does not exist").
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
    /// The config file's contents were not valid JSON for [`AdcConfig`].
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}
