//! TOML configuration file

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use maxproui_core::config::{MachineConfig, MenuItemConfig};
use maxproui_core::{CatalogError, MenuCatalog};

use crate::panel::BaudRate;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("[panel] baud {0} is not a supported rate")]
    UnsupportedBaud(u32),
    #[error("{section} {key} must be greater than zero")]
    Zero {
        section: &'static str,
        key: &'static str,
    },
    #[error("[[menu]] {0}")]
    Menu(CatalogError),
    #[error("[machine] safe_z must be a finite, non-negative height")]
    SafeZ,
}

/// `[panel]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PanelConfig {
    /// Serial device wired to the panel
    pub device: PathBuf,
    #[serde(default = "default_baud")]
    pub baud: u32,
    #[serde(default = "default_cmd_delay_ms")]
    pub cmd_delay_ms: u64,
    #[serde(default = "default_startup_delay_ms")]
    pub startup_delay_ms: u64,
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

/// `[klipper]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KlipperConfig {
    /// Klipper API unix socket
    #[serde(default = "default_socket")]
    pub socket: PathBuf,
    /// Directory holding printable files
    pub sdcard_dir: PathBuf,
    #[serde(default = "default_poll_ms")]
    pub poll_ms: u64,
}

/// Complete configuration file
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BridgeConfig {
    pub panel: PanelConfig,
    pub klipper: KlipperConfig,
    #[serde(default)]
    pub machine: MachineConfig,
    #[serde(default)]
    pub menu: Vec<MenuItemConfig>,
}

fn default_baud() -> u32 {
    115_200
}

fn default_cmd_delay_ms() -> u64 {
    10
}

fn default_startup_delay_ms() -> u64 {
    5_000
}

fn default_tick_ms() -> u64 {
    1_000
}

fn default_poll_ms() -> u64 {
    1_000
}

fn default_socket() -> PathBuf {
    PathBuf::from("/tmp/klippy_uds")
}

impl BridgeConfig {
    /// Build the special menu catalog
    pub fn catalog(&self) -> Result<MenuCatalog, ConfigError> {
        MenuCatalog::build(&self.menu).map_err(ConfigError::Menu)
    }

    /// Check values serde cannot
    fn validate(&self) -> Result<(), ConfigError> {
        BaudRate::from_u32(self.panel.baud).ok_or(ConfigError::UnsupportedBaud(self.panel.baud))?;
        if self.panel.tick_ms == 0 {
            return Err(ConfigError::Zero {
                section: "[panel]",
                key: "tick_ms",
            });
        }
        if self.klipper.poll_ms == 0 {
            return Err(ConfigError::Zero {
                section: "[klipper]",
                key: "poll_ms",
            });
        }
        let safe_z = self.machine.safe_z;
        if !safe_z.is_finite() || safe_z < 0.0 {
            return Err(ConfigError::SafeZ);
        }
        self.catalog()?;
        Ok(())
    }
}

/// Replace a leading `~` with `$HOME`
fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), std::env::var_os("HOME")) {
        (Ok(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => path.to_path_buf(),
    }
}

/// Parse and validate configuration text
pub fn parse_config(text: &str) -> Result<BridgeConfig, ConfigError> {
    let mut config: BridgeConfig = toml::from_str(text)?;
    config.klipper.sdcard_dir = expand_home(&config.klipper.sdcard_dir);
    config.klipper.socket = expand_home(&config.klipper.socket);
    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
pub fn load_config(path: &Path) -> Result<BridgeConfig, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&text)
}
