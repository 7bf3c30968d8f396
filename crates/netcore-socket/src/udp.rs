use std::io;
use std::net::SocketAddr;

use mio::net::UdpSocket;

/// Matches the original project's conservative MTU budget for a single UDP
/// datagram: large enough for typical payloads, small enough to stay under
/// common path MTUs without fragmenting at the IP layer.
pub const UDP_PACKET_MAX_LEN: usize = 520;

/// A single bound UDP fd shared by every peer it talks to. Unlike the TCP
/// `Socket` state machine, there is no per-peer read buffer: each
/// `recv_from` already yields one complete datagram, and each `send_to`
/// emits exactly one.
pub struct DatagramEngine {
    socket: UdpSocket,
    scratch: [u8; UDP_PACKET_MAX_LEN],
}

impl DatagramEngine {
    pub fn new(socket: UdpSocket) -> Self {
        Self { socket, scratch: [0; UDP_PACKET_MAX_LEN] }
    }

    pub fn inner(&self) -> &UdpSocket {
        &self.socket
    }

    /// Drains every pending datagram, invoking `on_packet(peer, bytes)` for
    /// each. Stops at the first `WouldBlock`.
    pub fn recv_loop(&mut self, mut on_packet: impl FnMut(SocketAddr, &[u8])) -> io::Result<()> {
        loop {
            match self.socket.recv_from(&mut self.scratch) {
                Ok((n, peer)) => on_packet(peer, &self.scratch[..n]),
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    /// Splits `payload` into `UDP_PACKET_MAX_LEN`-sized chunks and sends
    /// each as its own datagram, so a logically large write never coalesces
    /// into (or relies on) IP fragmentation.
    pub fn send_fragmented(&self, peer: SocketAddr, payload: &[u8]) -> io::Result<()> {
        for chunk in payload.chunks(UDP_PACKET_MAX_LEN) {
            self.socket.send_to(chunk, peer)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::UdpSocket as StdUdpSocket;

    #[test]
    fn fragments_large_payload_into_max_len_chunks() {
        let server_std = StdUdpSocket::bind("127.0.0.1:0").unwrap();
        server_std.set_nonblocking(true).unwrap();
        let server_addr = server_std.local_addr().unwrap();
        let mut server = DatagramEngine::new(UdpSocket::from_std(server_std));

        let client_std = StdUdpSocket::bind("127.0.0.1:0").unwrap();
        client_std.set_nonblocking(true).unwrap();
        let client = UdpSocket::from_std(client_std);

        let payload = vec![7u8; UDP_PACKET_MAX_LEN * 2 + 13];
        let engine = DatagramEngine::new(client);
        engine.send_fragmented(server_addr, &payload).unwrap();

        std::thread::sleep(std::time::Duration::from_millis(20));
        let mut received = 0usize;
        let mut packets = 0usize;
        server
            .recv_loop(|_peer, bytes| {
                received += bytes.len();
                packets += 1;
                assert!(bytes.len() <= UDP_PACKET_MAX_LEN);
            })
            .unwrap();

        assert_eq!(received, payload.len());
        assert_eq!(packets, 3);
    }
}
