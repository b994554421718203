//! Shared network configuration
//!
//! Configuration is stored as YAML. Default location:
//! `~/.config/tourne/network.yaml`, overridable per daemon with a CLI
//! argument. The file maps destination names to endpoints, declares the
//! router's routing rules in evaluation order, and carries the listen
//! ports and smoothing overrides of each daemon.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::smoothing::{DEFAULT_BUFFER_SIZE, LED_ALPHA, PIPELINE_ALPHA};

/// Root network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Router inbound address
    pub router: ListenConfig,
    /// Named outbound destinations, immutable after startup
    pub destinations: Vec<Destination>,
    /// Routing rules, evaluated top to bottom
    pub routes: Vec<RouteRule>,
    /// Conditioning pipeline settings
    pub signal: SignalConfig,
    /// LED driver settings
    pub led: LedConfig,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            router: ListenConfig {
                host: String::from("127.0.0.1"),
                port: 5005,
            },
            destinations: Vec::new(),
            routes: Vec::new(),
            signal: SignalConfig::default(),
            led: LedConfig::default(),
        }
    }
}

/// A UDP listen address
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListenConfig {
    pub host: String,
    pub port: u16,
}

impl ListenConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// A named outbound destination
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Destination {
    /// Logical name referenced by routing rules
    pub name: String,
    pub host: String,
    pub port: u16,
}

impl Destination {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// One routing rule: either an exact topic or a topic prefix, never both.
///
/// Prefixes must end with `/`; the declared order of prefix rules is the
/// tie-break order when several could match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteRule {
    /// Exact topic to match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    /// Topic prefix to match (must end with `/`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    /// Destination names, in send order
    pub to: Vec<String>,
}

/// Conditioning pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    /// Inbound address for raw samples
    pub listen: ListenConfig,
    /// EMA coefficient (very small: multiple seconds at 10 Hz)
    pub alpha: f32,
    /// Ring buffer capacity
    pub buffer_size: usize,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            listen: ListenConfig {
                host: String::from("127.0.0.1"),
                port: 9001,
            },
            alpha: PIPELINE_ALPHA,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

/// LED driver settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedConfig {
    /// Inbound address for smoothed color triples
    pub listen: ListenConfig,
    /// Local EMA coefficient (fast: hardware step-change protection only)
    pub alpha: f32,
    /// Ring buffer capacity for the local stage
    pub buffer_size: usize,
    /// BCM pin number of the strip's clock line
    pub clk_pin: u8,
    /// BCM pin number of the strip's data line
    pub dat_pin: u8,
}

impl Default for LedConfig {
    fn default() -> Self {
        Self {
            listen: ListenConfig {
                host: String::from("127.0.0.1"),
                port: 9002,
            },
            alpha: LED_ALPHA,
            buffer_size: DEFAULT_BUFFER_SIZE,
            clk_pin: 16,
            dat_pin: 20,
        }
    }
}

/// Default config file path: `~/.config/tourne/network.yaml`
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tourne")
        .join("network.yaml")
}

/// Load configuration from a YAML file.
///
/// A missing or malformed file is an error; callers decide whether that is
/// fatal (the router) or a reason to fall back to defaults (other daemons).
pub fn load_config(path: &Path) -> Result<NetworkConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {:?}", path))?;
    let config: NetworkConfig = serde_yaml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {:?}", path))?;
    Ok(config)
}

/// Load configuration, falling back to defaults when the file is absent or
/// broken. Used by the non-router daemons, which can run standalone.
pub fn load_config_or_default(path: &Path) -> NetworkConfig {
    match load_config(path) {
        Ok(config) => config,
        Err(e) => {
            log::warn!("Using default network config: {:#}", e);
            NetworkConfig::default()
        }
    }
}
