use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    Read(String, #[source] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct GlobalConfig {
    pub instance_id: u32,
    #[serde(default = "default_workers")]
    pub static_workers: usize,
    #[serde(default)]
    pub log_dir: Option<String>,
    #[serde(default)]
    pub enable_log: bool,
    #[serde(default)]
    pub script_dir: Option<String>,
    #[serde(default)]
    pub debug_output: bool,
    #[serde(default)]
    pub debug_connector_input: bool,
}

fn default_workers() -> usize {
    2
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Inet {
    Ipv4,
    Ipv6,
    Local,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SockKind {
    Tcp,
    Udp,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DataTypeConfig {
    Stream,
    Packet,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_inet")]
    pub inet: Inet,
    #[serde(default = "default_sock")]
    pub sock: SockKind,
    pub addr: String,
    pub port: u16,
    #[serde(default)]
    pub heartbeat_check: Option<u64>,
    #[serde(default = "default_max_clients")]
    pub max_clients: usize,
    #[serde(default = "default_max_packet_length")]
    pub max_packet_length: u64,
    #[serde(default)]
    pub websocket: bool,
    #[serde(default = "default_data_type")]
    pub data_type: DataTypeConfig,
    #[serde(default)]
    pub debug_input: bool,
    #[serde(default)]
    pub debug_output: bool,
}

fn default_inet() -> Inet {
    Inet::Ipv4
}
fn default_sock() -> SockKind {
    SockKind::Tcp
}
fn default_max_clients() -> usize {
    1024
}
fn default_max_packet_length() -> u64 {
    1 << 20
}
fn default_data_type() -> DataTypeConfig {
    DataTypeConfig::Stream
}

#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeConfig {
    pub global: GlobalConfig,
    #[serde(default)]
    pub modules: Vec<String>,
    #[serde(default)]
    pub servers: HashMap<String, ServerSettings>,
}

impl RuntimeConfig {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(path.display().to_string(), e))?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_config() {
        let json = r#"{
            "global": { "instance_id": 1 },
            "servers": {
                "game": { "addr": "0.0.0.0", "port": 7000 }
            }
        }"#;
        let cfg: RuntimeConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.global.instance_id, 1);
        assert_eq!(cfg.global.static_workers, 2);
        let srv = &cfg.servers["game"];
        assert_eq!(srv.port, 7000);
        assert_eq!(srv.inet, Inet::Ipv4);
        assert_eq!(srv.sock, SockKind::Tcp);
        assert_eq!(srv.max_clients, 1024);
    }
}
