mod client;
mod connector;
mod server;
mod socket;
mod state;
mod udp;

pub use client::{Client, ClientKind, DataType};
pub use connector::Connector;
pub use server::ServerConfig;
pub use socket::{DriveError, Socket};
pub use state::SocketState;
pub use udp::{DatagramEngine, UDP_PACKET_MAX_LEN};
