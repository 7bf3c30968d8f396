use netcore_proto::Negotiation;
use netcore_time::{Duration, Repeater};

use crate::socket::Socket;

/// A locally-initiated client-role socket, not attached to a `Server`.
/// Carries its own reconnect cadence since nothing else owns its lifecycle.
pub struct Connector<S> {
    pub socket: Socket<S>,
    pub negotiation: Negotiation,
    pub peer: std::net::SocketAddr,
    reconnect: Repeater,
}

impl<S> Connector<S> {
    pub fn new(socket: Socket<S>, peer: std::net::SocketAddr, reconnect_interval: Duration) -> Self {
        Self { socket, negotiation: Negotiation::default(), peer, reconnect: Repeater::every(reconnect_interval) }
    }

    /// True once the reconnect interval has elapsed since the last attempt
    /// (or construction); resets the interval's clock as a side effect.
    pub fn should_attempt_reconnect(&mut self) -> bool {
        self.reconnect.fired()
    }
}
