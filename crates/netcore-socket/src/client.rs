use std::time::Instant;

use netcore_proto::Negotiation;

use crate::socket::Socket;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientKind {
    Data,
    WebSocketHandshake,
    WebSocketData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Stream,
    Packet,
}

/// A connected socket attached to a `Server`.
pub struct Client<S> {
    pub socket: Socket<S>,
    pub server_id: u32,
    pub client_kind: ClientKind,
    pub data_type: DataType,
    pub negotiation: Negotiation,
    pub last_heartbeat: Instant,
    pub online_key: Option<String>,
    pub coroutine: Option<netcore_script::CoroutineHandle>,
}

impl<S> Client<S> {
    pub fn new(socket: Socket<S>, server_id: u32, client_kind: ClientKind, data_type: DataType) -> Self {
        Self {
            socket,
            server_id,
            client_kind,
            data_type,
            negotiation: Negotiation::default(),
            last_heartbeat: Instant::now(),
            online_key: None,
            coroutine: None,
        }
    }

    pub fn touch_heartbeat(&mut self) {
        self.last_heartbeat = Instant::now();
    }
}
