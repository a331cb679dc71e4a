use anyhow::Context;
use serde::Deserialize;
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::{Path, PathBuf},
    time::Duration,
};

pub const DEFAULT_PORT: u16 = 22212;
pub const DEFAULT_METADATA_PATH: &str = "/tmp/shairport-sync-metadata";

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Config {
    pub control: ControlConfig,
    pub metadata: MetadataConfig,
    pub display: DisplayConfig,
    pub remote: RemoteConfig,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Config> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.to_string_lossy()))?;
        toml::from_str(&contents).with_context(|| "Failed to parse config TOML")
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ControlConfig {
    pub bind_addr: IpAddr,
    pub port: u16,
}

impl ControlConfig {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MetadataConfig {
    pub path: PathBuf,
    /// Receive datagrams on this port instead of reading `path`.
    pub udp_port: Option<u16>,
    pub follow: bool,
    pub poll_interval_ms: u64,
}

impl MetadataConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_METADATA_PATH),
            udp_port: None,
            follow: true,
            poll_interval_ms: 250,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct DisplayConfig {
    pub show_album: bool,
    pub show_playback_stop: bool,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RemoteConfig {
    pub discovery_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl RemoteConfig {
    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_secs(self.discovery_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            discovery_timeout_secs: 5,
            request_timeout_secs: 5,
        }
    }
}
