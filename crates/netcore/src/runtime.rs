use std::collections::HashMap;
use std::os::fd::{AsRawFd, RawFd};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use mio::net::{TcpListener, TcpStream, UdpSocket};
use mio::{Events, Interest, Token};
use netcore_io::{EXIT_TOKEN, FdRegistry, Kind, NOTIFY_TOKEN, Worker, WorkerHandle, least_loaded_handle};
use netcore_proto::{Decoded, DecodedEvent, Negotiation};
use netcore_registry::OnlineRegistry;
use netcore_script::{CallOutcome, Coroutine, CoroutineHandle, Interpreter, Value};
use netcore_socket::{Client, ClientKind, DataType, ServerConfig, Socket};
use tracing::{debug, info, warn};

use crate::config::{DataTypeConfig, RuntimeConfig, SockKind};
use crate::signals;

const SCRATCH_LEN: usize = 256 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("fd registry error: {0}")]
    FdRegistry(#[from] netcore_io::FdRegistryError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

struct ListenerCtx {
    id: u32,
    config: ServerConfig,
}

struct ClientConn<C> {
    client: Client<TcpStream>,
    coroutine: C,
    coroutine_handle: CoroutineHandle,
    max_packet_length: u64,
    ws_inbound: Vec<u8>,
    /// Whether this fd's readiness registration currently includes
    /// `Interest::WRITABLE`, kept in sync by [`drive_client`] so a
    /// backpressured send queue gets re-armed for EPOLLOUT and a drained one
    /// falls back to read-only without redundant `reregister` calls.
    write_armed: bool,
}

struct NewConn<C> {
    fd: RawFd,
    conn: ClientConn<C>,
}

/// Orchestrates the worker pool, listeners, and packet/WebSocket dispatch
/// described by a [`RuntimeConfig`]. Generic over the scripting interpreter
/// so tests can inject a recording double; production callers default to
/// [`netcore_script::NullInterpreter`].
///
/// The interpreter is shared behind one mutex rather than instantiated once
/// per worker, unlike the tile/spine pattern this is grounded on: with no
/// real embedded interpreter in this codebase, a per-worker instance buys
/// nothing but complexity, and a single lock around `new_coroutine`/`call`/
/// `release_coroutine` is enough to prove the I/O stack dispatches
/// correctly end to end. See DESIGN.md.
pub struct Runtime<I: Interpreter> {
    config: RuntimeConfig,
    fd_registry: Arc<FdRegistry>,
    online: Arc<OnlineRegistry>,
    interpreter: Arc<Mutex<I>>,
    script_failures: Arc<AtomicU64>,
}

impl<I> Runtime<I>
where
    I: Interpreter + Send + 'static,
    I::Coroutine: Send + 'static,
{
    pub fn new(config: RuntimeConfig, interpreter: I) -> Self {
        Self {
            config,
            fd_registry: Arc::new(FdRegistry::from_rlimit()),
            online: Arc::new(OnlineRegistry::new()),
            interpreter: Arc::new(Mutex::new(interpreter)),
            script_failures: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn script_failure_count(&self) -> u64 {
        self.script_failures.load(Ordering::Relaxed)
    }

    /// Stages the bootstrap script (plus any configured modules, already
    /// concatenated by the caller) before the event loop starts. Mirrors
    /// `bsp_load_script`: must be called, if at all, before `run`.
    pub fn load_script(&self, bytes: &[u8]) -> Result<(), String> {
        self.interpreter.lock().expect("interpreter mutex poisoned").load_script(bytes)
    }

    pub fn run(self) -> Result<(), RuntimeError> {
        let stop = signals::install()?;
        let worker_count = self.config.global.static_workers.max(1);

        let mut workers: Vec<Worker> = (0..worker_count).map(Worker::new).collect::<Result<_, _>>()?;
        let handles: Vec<WorkerHandle> =
            workers.iter().map(Worker::handle).collect::<Result<_, _>>()?;

        let mut listeners: HashMap<RawFd, (TcpListener, ListenerCtx)> = HashMap::new();
        let mut datagrams: Vec<(UdpSocket, ListenerCtx)> = Vec::new();

        for (name, settings) in &self.config.servers {
            let id = fnv_hash(name);
            let addr = format!("{}:{}", settings.addr, settings.port);
            let sockaddr: std::net::SocketAddr = addr
                .parse()
                .unwrap_or_else(|_| panic!("invalid server address for {name}: {addr}"));
            match settings.sock {
                SockKind::Tcp => {
                    let listener = TcpListener::bind(sockaddr)?;
                    let fd = listener.as_raw_fd();
                    self.fd_registry.register(fd, Kind::Server)?;
                    workers[0].register_fd(fd, Token(fd as usize), Interest::READABLE)?;
                    let config = ServerConfig {
                        id,
                        default_client_kind: if settings.websocket {
                            ClientKind::WebSocketHandshake
                        } else {
                            ClientKind::Data
                        },
                        default_data_type: match settings.data_type {
                            DataTypeConfig::Stream => DataType::Stream,
                            DataTypeConfig::Packet => DataType::Packet,
                        },
                        max_clients: settings.max_clients,
                        max_packet_length: settings.max_packet_length,
                        heartbeat_check: settings.heartbeat_check.map(Duration::from_secs),
                    };
                    info!(server = %name, %addr, "listening (tcp)");
                    listeners.insert(fd, (listener, ListenerCtx { id, config }));
                }
                SockKind::Udp => {
                    let socket = UdpSocket::bind(sockaddr)?;
                    let fd = socket.as_raw_fd();
                    self.fd_registry.register(fd, Kind::Server)?;
                    workers[0].register_fd(fd, Token(fd as usize), Interest::READABLE)?;
                    let config = ServerConfig {
                        id,
                        default_client_kind: ClientKind::Data,
                        default_data_type: DataType::Packet,
                        max_clients: settings.max_clients,
                        max_packet_length: settings.max_packet_length,
                        heartbeat_check: None,
                    };
                    info!(server = %name, %addr, "listening (udp)");
                    datagrams.push((socket, ListenerCtx { id, config }));
                }
            }
        }

        let client_counts: Arc<Vec<AtomicU64>> =
            Arc::new(listeners.values().map(|_| AtomicU64::new(0)).collect());
        let server_idx: HashMap<u32, usize> =
            listeners.values().enumerate().map(|(i, (_, ctx))| (ctx.id, i)).collect();

        let (senders, receivers): (Vec<Sender<NewConn<I::Coroutine>>>, Vec<Receiver<NewConn<I::Coroutine>>>) =
            (0..worker_count).map(|_| channel()).unzip();
        let mut receivers: Vec<Option<Receiver<NewConn<I::Coroutine>>>> =
            receivers.into_iter().map(Some).collect();

        let acceptor_worker = workers.remove(0);
        let acceptor_rx = receivers[0].take().unwrap();

        std::thread::scope(|scope| {
            let mut io_handles = Vec::new();
            for (idx, worker) in workers.into_iter().enumerate() {
                let worker_id = idx + 1;
                let rx = receivers[worker_id].take().unwrap();
                let fd_registry = Arc::clone(&self.fd_registry);
                let online = Arc::clone(&self.online);
                let interpreter = Arc::clone(&self.interpreter);
                let script_failures = Arc::clone(&self.script_failures);
                io_handles.push(scope.spawn(move || {
                    run_io_worker(worker, rx, fd_registry, online, interpreter, script_failures)
                }));
            }

            run_acceptor_worker(
                acceptor_worker,
                acceptor_rx,
                &listeners,
                &datagrams,
                &handles,
                &senders,
                &client_counts,
                &server_idx,
                &self.fd_registry,
                &self.online,
                &self.interpreter,
                &self.script_failures,
                &stop,
            )?;

            for h in io_handles {
                let _ = h.join();
            }
            Ok(())
        })
    }
}

fn fnv_hash(s: &str) -> u32 {
    let mut hash: u32 = 2_166_136_261;
    for b in s.as_bytes() {
        hash ^= u32::from(*b);
        hash = hash.wrapping_mul(16_777_619);
    }
    hash
}

#[allow(clippy::too_many_arguments)]
fn run_acceptor_worker<I>(
    mut worker: Worker,
    rx: Receiver<NewConn<I::Coroutine>>,
    listeners: &HashMap<RawFd, (TcpListener, ListenerCtx)>,
    datagrams: &[(UdpSocket, ListenerCtx)],
    handles: &[WorkerHandle],
    senders: &[Sender<NewConn<I::Coroutine>>],
    client_counts: &Arc<Vec<AtomicU64>>,
    server_idx: &HashMap<u32, usize>,
    fd_registry: &Arc<FdRegistry>,
    online: &Arc<OnlineRegistry>,
    interpreter: &Arc<Mutex<I>>,
    script_failures: &Arc<AtomicU64>,
    stop: &signals::StopFlag,
) -> Result<(), RuntimeError>
where
    I: Interpreter,
    I::Coroutine: Send + 'static,
{
    let mut events = Events::with_capacity(1024);
    let mut scratch = vec![0u8; SCRATCH_LEN];
    let mut local: HashMap<RawFd, ClientConn<I::Coroutine>> = HashMap::new();
    let mut timers: HashMap<RawFd, netcore_timer::Timer> = HashMap::new();
    let mut udp_scratch = [0u8; netcore_socket::UDP_PACKET_MAX_LEN];

    loop {
        worker.poll(&mut events, Some(Duration::from_millis(200)))?;

        for event in &events {
            match event.token() {
                NOTIFY_TOKEN => {
                    worker.drain_notify()?;
                    while let Ok(new_conn) = rx.try_recv() {
                        local.insert(new_conn.fd, new_conn.conn);
                    }
                }
                EXIT_TOKEN => {
                    worker.drain_exit()?;
                    return Ok(());
                }
                Token(raw) => {
                    let fd = raw as RawFd;
                    if let Some((listener, ctx)) = listeners.get(&fd) {
                        accept_loop(
                            listener,
                            ctx,
                            fd_registry,
                            handles,
                            senders,
                            client_counts,
                            server_idx,
                            interpreter,
                            &mut local,
                        )?;
                    } else if let Some((socket, ctx)) =
                        datagrams.iter().find(|(s, _)| s.as_raw_fd() == fd)
                    {
                        udp_recv_loop(socket, ctx, &mut udp_scratch);
                    } else if timers.contains_key(&fd) {
                        fire_timer(fd, &mut timers, &worker, fd_registry);
                    } else if let Some(conn) = local.get_mut(&fd) {
                        if drive_client(fd, conn, event, &mut scratch, &worker, online, script_failures).is_err()
                        {
                            teardown(fd, &mut local, &worker, fd_registry, online, interpreter);
                        }
                    }
                }
            }
        }

        if stop.is_set() {
            for h in handles {
                let _ = h.notify();
            }
            worker.request_exit()?;
            break;
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn accept_loop<I>(
    listener: &TcpListener,
    ctx: &ListenerCtx,
    fd_registry: &Arc<FdRegistry>,
    handles: &[WorkerHandle],
    senders: &[Sender<NewConn<I::Coroutine>>],
    client_counts: &Arc<Vec<AtomicU64>>,
    server_idx: &HashMap<u32, usize>,
    interpreter: &Arc<Mutex<I>>,
    acceptor_local: &mut HashMap<RawFd, ClientConn<I::Coroutine>>,
) -> Result<(), RuntimeError>
where
    I: Interpreter,
    I::Coroutine: Send + 'static,
{
    loop {
        match listener.accept() {
            Ok((stream, peer)) => {
                let count_idx = server_idx[&ctx.id];
                let current = client_counts[count_idx].load(Ordering::Relaxed) as usize;
                if !ctx.config.accepts_more(current) {
                    debug!(%peer, server = ctx.id, "rejecting connection, server at max_clients");
                    drop(stream);
                    continue;
                }

                let fd = stream.as_raw_fd();
                fd_registry.register(fd, Kind::Client)?;
                let target = least_loaded_handle(handles);
                fd_registry.set_worker(fd, target);

                let (mut coroutine, coroutine_handle) =
                    interpreter.lock().expect("interpreter mutex poisoned").new_coroutine();
                if matches!(coroutine.call("on_connect", &[]), CallOutcome::Failed) {
                    warn!(%peer, "on_connect script call failed");
                }

                let mut client = Client::new(
                    Socket::new(stream),
                    ctx.id,
                    ctx.config.default_client_kind,
                    ctx.config.default_data_type,
                );
                client.coroutine = Some(coroutine_handle);
                let conn = ClientConn {
                    client,
                    coroutine,
                    coroutine_handle,
                    max_packet_length: ctx.config.max_packet_length,
                    ws_inbound: Vec::new(),
                    write_armed: false,
                };

                // Registering before sending/inserting guarantees the fd is
                // live in the target worker's readiness set by the time it
                // observes either the channel message or the notify wakeup.
                handles[target].register_fd(fd, Token(fd as usize), Interest::READABLE)?;
                client_counts[count_idx].fetch_add(1, Ordering::Relaxed);

                if target == 0 {
                    acceptor_local.insert(fd, conn);
                } else if senders[target].send(NewConn { fd, conn }).is_err() {
                    warn!(worker = target, "failed to dispatch new connection, receiver gone");
                }
                if handles[target].notify().is_err() {
                    warn!(worker = target, "failed to notify worker of new connection");
                }
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => break,
            Err(ref e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(err) => {
                warn!(?err, "accept failed");
                break;
            }
        }
    }
    Ok(())
}

fn udp_recv_loop(
    socket: &UdpSocket,
    ctx: &ListenerCtx,
    scratch: &mut [u8; netcore_socket::UDP_PACKET_MAX_LEN],
) {
    loop {
        match socket.recv_from(scratch) {
            Ok((n, peer)) => {
                debug!(server = ctx.id, %peer, bytes = n, "udp datagram received");
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => break,
            Err(ref e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(err) => {
                warn!(?err, "udp recv failed");
                break;
            }
        }
    }
}

fn run_io_worker<I>(
    mut worker: Worker,
    rx: Receiver<NewConn<I::Coroutine>>,
    fd_registry: Arc<FdRegistry>,
    online: Arc<OnlineRegistry>,
    interpreter: Arc<Mutex<I>>,
    script_failures: Arc<AtomicU64>,
) where
    I: Interpreter,
    I::Coroutine: Send + 'static,
{
    let mut events = Events::with_capacity(1024);
    let mut scratch = vec![0u8; SCRATCH_LEN];
    let mut local: HashMap<RawFd, ClientConn<I::Coroutine>> = HashMap::new();
    let mut timers: HashMap<RawFd, netcore_timer::Timer> = HashMap::new();

    loop {
        if worker.poll(&mut events, Some(Duration::from_millis(200))).is_err() {
            return;
        }

        for event in &events {
            match event.token() {
                NOTIFY_TOKEN => {
                    let _ = worker.drain_notify();
                    while let Ok(new_conn) = rx.try_recv() {
                        local.insert(new_conn.fd, new_conn.conn);
                    }
                }
                EXIT_TOKEN => {
                    let _ = worker.drain_exit();
                    return;
                }
                Token(raw) => {
                    let fd = raw as RawFd;
                    if timers.contains_key(&fd) {
                        fire_timer(fd, &mut timers, &worker, &fd_registry);
                    } else if let Some(conn) = local.get_mut(&fd) {
                        if drive_client(fd, conn, event, &mut scratch, &worker, &online, &script_failures)
                            .is_err()
                        {
                            teardown(fd, &mut local, &worker, &fd_registry, &online, &interpreter);
                        }
                    }
                }
            }
        }
    }
}

/// Drives one readiness event for a registered timer fd (§4.2 TIMER case):
/// drain the expiration counter, invoke `on_tick` once regardless of the
/// coalesced count, and tear down the timer once it reports completion.
fn fire_timer(
    fd: RawFd,
    timers: &mut HashMap<RawFd, netcore_timer::Timer>,
    worker: &Worker,
    fd_registry: &Arc<FdRegistry>,
) {
    let done = match timers.get_mut(&fd).expect("checked by caller").fire() {
        Ok(done) => done,
        Err(err) => {
            warn!(fd, ?err, "timer fire failed");
            true
        }
    };
    if done {
        timers.remove(&fd);
        let _ = worker.deregister_fd(fd);
        fd_registry.unregister(fd);
    }
}

fn teardown<I>(
    fd: RawFd,
    local: &mut HashMap<RawFd, ClientConn<I::Coroutine>>,
    worker: &Worker,
    fd_registry: &Arc<FdRegistry>,
    online: &Arc<OnlineRegistry>,
    interpreter: &Arc<Mutex<I>>,
) where
    I: Interpreter,
{
    if let Some(mut conn) = local.remove(&fd) {
        if matches!(conn.coroutine.call("on_close", &[]), CallOutcome::Failed) {
            warn!(fd, "on_close script call failed");
        }
        interpreter.lock().expect("interpreter mutex poisoned").release_coroutine(conn.coroutine_handle);
    }
    online.remove_by_fd(fd);
    let _ = worker.deregister_fd(fd);
    fd_registry.unregister(fd);
}

/// Drives one readiness event through a client's socket state machine and
/// the packet/WebSocket decode pipeline. `negotiation`/`client_kind` are
/// copied out into plain locals before the `drive` call so the decode
/// closure can mutate them without overlapping the socket's own borrow.
///
/// After the drive, re-arms or disarms `Interest::WRITABLE` on `fd` to match
/// whether the send queue still has bytes pending (§4.2 `modify`): without
/// this, a backpressured client with nothing left to read would never get
/// another readiness event to flush the rest of its queue.
fn drive_client<C: Coroutine>(
    fd: RawFd,
    conn: &mut ClientConn<C>,
    event: &mio::event::Event,
    scratch: &mut [u8],
    worker: &Worker,
    online: &Arc<OnlineRegistry>,
    script_failures: &Arc<AtomicU64>,
) -> Result<(), ()> {
    let max_len = conn.max_packet_length;
    let data_type = conn.client.data_type;
    let mut negotiation = conn.client.negotiation;
    let mut client_kind = conn.client.client_kind;
    let mut pending: Vec<Vec<u8>> = Vec::new();
    let mut disconnect = false;

    let result = conn.client.socket.drive(
        event.is_readable(),
        event.is_writable(),
        event.is_write_closed(),
        event.is_read_closed(),
        event.is_error(),
        scratch,
        |data| {
            handle_inbound(
                data,
                &mut client_kind,
                data_type,
                &mut negotiation,
                max_len,
                &mut conn.ws_inbound,
                &mut conn.coroutine,
                online,
                script_failures,
                &mut pending,
                &mut disconnect,
            )
        },
    );

    conn.client.negotiation = negotiation;
    conn.client.client_kind = client_kind;

    if !pending.is_empty() {
        for buf in pending.drain(..) {
            conn.client.socket.append_send(buf);
        }
        // Try to flush immediately rather than waiting for the next
        // readiness event; if the kernel buffer is full this just re-queues.
        let _ = conn.client.socket.drive(false, true, false, false, false, scratch, |_| 0);
    }

    if disconnect {
        conn.client.socket.set_pre_close();
    }

    let has_pending = conn.client.socket.has_pending_writes();
    if has_pending != conn.write_armed {
        let interest =
            if has_pending { Interest::READABLE | Interest::WRITABLE } else { Interest::READABLE };
        if let Err(err) = worker.reregister_fd(fd, Token(fd as usize), interest) {
            warn!(fd, ?err, "failed to toggle write readiness");
        } else {
            conn.write_armed = has_pending;
        }
    }

    match result {
        Ok(()) if !disconnect => Ok(()),
        _ => Err(()),
    }
}

#[allow(clippy::too_many_arguments)]
fn handle_inbound<C: Coroutine>(
    data: &[u8],
    client_kind: &mut ClientKind,
    data_type: DataType,
    negotiation: &mut Negotiation,
    max_packet_length: u64,
    ws_inbound: &mut Vec<u8>,
    coroutine: &mut C,
    online: &Arc<OnlineRegistry>,
    script_failures: &Arc<AtomicU64>,
    pending: &mut Vec<Vec<u8>>,
    disconnect: &mut bool,
) -> usize {
    match *client_kind {
        ClientKind::Data if data_type == DataType::Stream => {
            // STREAM mode bypasses the packet codec entirely: every read is
            // delivered verbatim as a single DATA_RAW event (§4.4).
            if data.is_empty() {
                0
            } else {
                dispatch_event(DecodedEvent::Raw(data.to_vec()), coroutine, online, script_failures);
                data.len()
            }
        }
        ClientKind::Data => decode_packet_stream(
            data,
            negotiation,
            max_packet_length,
            coroutine,
            online,
            script_failures,
            pending,
            disconnect,
        ),
        ClientKind::WebSocketHandshake => match netcore_ws::parse_request(data) {
            Ok(Some(req)) => {
                pending.push(netcore_ws::build_response(&req));
                *client_kind = ClientKind::WebSocketData;
                req.header_len
            }
            Ok(None) => 0,
            Err(err) => {
                debug!(?err, "invalid websocket handshake");
                *disconnect = true;
                data.len()
            }
        },
        ClientKind::WebSocketData => {
            let mut consumed = 0;
            while !*disconnect {
                match netcore_ws::decode_frame(&data[consumed..]) {
                    Ok(netcore_ws::Decoded::NeedMore) => break,
                    Ok(netcore_ws::Decoded::Consumed { consumed: c, frame }) => {
                        if c == 0 {
                            break;
                        }
                        consumed += c;
                        match frame.opcode {
                            netcore_ws::Opcode::Text | netcore_ws::Opcode::Binary => {
                                ws_inbound.extend_from_slice(&frame.payload);
                            }
                            netcore_ws::Opcode::Ping => {
                                pending.push(netcore_ws::encode_frame(
                                    netcore_ws::Opcode::Pong,
                                    &frame.payload,
                                ));
                            }
                            netcore_ws::Opcode::Pong => {}
                            netcore_ws::Opcode::Close => {
                                pending.push(netcore_ws::encode_frame(netcore_ws::Opcode::Close, &[]));
                                *disconnect = true;
                            }
                        }
                    }
                    Err(err) => {
                        debug!(?err, "websocket frame error");
                        *disconnect = true;
                        consumed = data.len();
                    }
                }
            }

            if !ws_inbound.is_empty() {
                let ws_consumed = decode_packet_stream(
                    ws_inbound,
                    negotiation,
                    max_packet_length,
                    coroutine,
                    online,
                    script_failures,
                    pending,
                    disconnect,
                );
                ws_inbound.drain(..ws_consumed);
            }

            consumed
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn decode_packet_stream<C: Coroutine>(
    data: &[u8],
    negotiation: &mut Negotiation,
    max_packet_length: u64,
    coroutine: &mut C,
    online: &Arc<OnlineRegistry>,
    script_failures: &Arc<AtomicU64>,
    pending: &mut Vec<Vec<u8>>,
    disconnect: &mut bool,
) -> usize {
    let mut total = 0;
    loop {
        match netcore_proto::decode_one(&data[total..], max_packet_length, negotiation) {
            Ok(Decoded::NeedMore) => break,
            Ok(Decoded::TooLarge) => {
                warn!("declared packet length exceeds max_packet_length, dropping connection");
                *disconnect = true;
                total = data.len();
                break;
            }
            Ok(Decoded::Consumed { consumed, reply, event }) => {
                if consumed == 0 {
                    break;
                }
                total += consumed;
                if let Some(r) = reply {
                    pending.push(r);
                }
                if let Some(event) = event {
                    dispatch_event(event, coroutine, online, script_failures);
                }
            }
            Err(err) => {
                debug!(?err, "protocol decode error, dropping connection");
                *disconnect = true;
                total = data.len();
                break;
            }
        }
    }
    total
}

fn dispatch_event<C: Coroutine>(
    event: DecodedEvent,
    coroutine: &mut C,
    online: &Arc<OnlineRegistry>,
    script_failures: &Arc<AtomicU64>,
) {
    let _ = online;
    let outcome = match event {
        DecodedEvent::Raw(bytes) => coroutine.call("on_data", &[Value::Bytes(&bytes)]),
        DecodedEvent::Obj(value) => {
            let bytes = serde_json::to_vec(&value).unwrap_or_default();
            coroutine.call("on_data", &[Value::OwnedBytes(bytes)])
        }
        DecodedEvent::Cmd(id, value) => {
            let bytes = serde_json::to_vec(&value).unwrap_or_default();
            coroutine.call("on_cmd", &[Value::I32(id), Value::OwnedBytes(bytes)])
        }
    };
    if matches!(outcome, CallOutcome::Failed) {
        script_failures.fetch_add(1, Ordering::Relaxed);
        warn!("script call failed for dispatched event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fnv_hash_is_deterministic() {
        assert_eq!(fnv_hash("game"), fnv_hash("game"));
        assert_ne!(fnv_hash("game"), fnv_hash("chat"));
    }
}
