use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use sha1::{Digest, Sha1};

use crate::error::WsError;

const WS_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

pub struct HandshakeRequest {
    pub key: String,
    pub protocol: Option<String>,
    pub origin: Option<String>,
    pub header_len: usize,
}

/// Parses an HTTP/1.1 upgrade request out of the front of `buf`. Returns
/// `Ok(None)` if the header terminator hasn't arrived yet (caller should
/// wait for more bytes, same "return 0" convention as the packet codec).
pub fn parse_request(buf: &[u8]) -> Result<Option<HandshakeRequest>, WsError> {
    let Some(term) = find_subslice(buf, b"\r\n\r\n") else {
        return Ok(None);
    };
    let header_len = term + 4;
    let text = std::str::from_utf8(&buf[..term]).map_err(|_| WsError::InvalidHandshake)?;

    let mut lines = text.split("\r\n");
    let request_line = lines.next().ok_or(WsError::InvalidHandshake)?;
    if !request_line.starts_with("GET ") {
        return Err(WsError::InvalidHandshake);
    }

    let mut upgrade = false;
    let mut connection_upgrade = false;
    let mut key = None;
    let mut protocol = None;
    let mut origin = None;

    for line in lines {
        let Some((name, value)) = line.split_once(':') else { continue };
        let name = name.trim().to_ascii_lowercase();
        let value = value.trim();
        match name.as_str() {
            "upgrade" => upgrade = value.eq_ignore_ascii_case("websocket"),
            "connection" => {
                connection_upgrade =
                    value.to_ascii_lowercase().split(',').any(|t| t.trim() == "upgrade")
            }
            "sec-websocket-key" => key = Some(value.to_string()),
            "sec-websocket-protocol" => protocol = Some(value.to_string()),
            "origin" => origin = Some(value.to_string()),
            _ => {}
        }
    }

    if !upgrade || !connection_upgrade {
        return Err(WsError::InvalidHandshake);
    }
    let key = key.ok_or(WsError::MissingKey)?;

    Ok(Some(HandshakeRequest { key, protocol, origin, header_len }))
}

pub fn accept_key(client_key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(client_key.as_bytes());
    hasher.update(WS_GUID.as_bytes());
    STANDARD.encode(hasher.finalize())
}

pub fn build_response(req: &HandshakeRequest) -> Vec<u8> {
    let accept = accept_key(&req.key);
    let mut response = format!(
        "HTTP/1.1 101 Switching Protocols\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Accept: {accept}\r\n"
    );
    if let Some(protocol) = &req.protocol {
        response.push_str(&format!("Sec-WebSocket-Protocol: {protocol}\r\n"));
    }
    response.push_str("\r\n");
    response.into_bytes()
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
