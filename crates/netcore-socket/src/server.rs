use crate::client::{ClientKind, DataType};

/// Listening-socket configuration and accept policy. The listener itself
/// (a `mio::net::TcpListener` or `mio::net::UdpSocket`) is owned by the
/// runtime that wires this into the fd registry and worker dispatch; this
/// struct only carries the policy a fresh `Client` is built from.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub id: u32,
    pub default_client_kind: ClientKind,
    pub default_data_type: DataType,
    pub max_clients: usize,
    pub max_packet_length: u64,
    pub heartbeat_check: Option<std::time::Duration>,
}

impl ServerConfig {
    pub fn accepts_more(&self, current_clients: usize) -> bool {
        current_clients < self.max_clients
    }
}
