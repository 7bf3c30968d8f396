use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::TcpStream;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use netcore::config::{DataTypeConfig, GlobalConfig, Inet, RuntimeConfig, ServerSettings, SockKind};
use netcore::Runtime;
use netcore_script::{CallOutcome, Coroutine, CoroutineHandle, Interpreter, Value};

/// Counts `on_connect`/`on_close` calls and records every `on_data` payload
/// across every coroutine the runtime creates, so a single test can assert
/// the dispatch wiring reaches the scripting layer without needing a real
/// embedded interpreter.
#[derive(Clone, Default)]
struct Counters {
    on_connect: Arc<AtomicUsize>,
    on_close: Arc<AtomicUsize>,
    raw_data: Arc<Mutex<Vec<Vec<u8>>>>,
}

struct RecordingInterpreter {
    counters: Counters,
    next_id: u64,
}

struct RecordingCoroutine {
    counters: Counters,
}

impl Coroutine for RecordingCoroutine {
    fn call(&mut self, entry: &str, params: &[Value<'_>]) -> CallOutcome {
        match entry {
            "on_connect" => {
                self.counters.on_connect.fetch_add(1, Ordering::SeqCst);
            }
            "on_close" => {
                self.counters.on_close.fetch_add(1, Ordering::SeqCst);
            }
            "on_data" => match params.first() {
                Some(Value::Bytes(bytes)) => self.counters.raw_data.lock().unwrap().push(bytes.to_vec()),
                Some(Value::OwnedBytes(bytes)) => self.counters.raw_data.lock().unwrap().push(bytes.clone()),
                _ => {}
            },
            _ => {}
        }
        CallOutcome::Ok
    }
}

impl Interpreter for RecordingInterpreter {
    type Coroutine = RecordingCoroutine;

    fn load_script(&mut self, _bytes: &[u8]) -> Result<(), String> {
        Ok(())
    }

    fn new_coroutine(&mut self) -> (Self::Coroutine, CoroutineHandle) {
        self.next_id += 1;
        (RecordingCoroutine { counters: self.counters.clone() }, CoroutineHandle(self.next_id))
    }

    fn release_coroutine(&mut self, _handle: CoroutineHandle) {}

    fn last_error(&self) -> Option<String> {
        None
    }
}

fn config(port: u16, data_type: DataTypeConfig) -> RuntimeConfig {
    let mut servers = HashMap::new();
    servers.insert(
        "game".to_string(),
        ServerSettings {
            inet: Inet::Ipv4,
            sock: SockKind::Tcp,
            addr: "127.0.0.1".to_string(),
            port,
            heartbeat_check: None,
            max_clients: 16,
            max_packet_length: 1 << 16,
            websocket: false,
            data_type,
            debug_input: false,
            debug_output: false,
        },
    );
    RuntimeConfig {
        global: GlobalConfig {
            instance_id: 1,
            static_workers: 1,
            log_dir: None,
            enable_log: false,
            script_dir: None,
            debug_output: false,
            debug_connector_input: false,
        },
        modules: Vec::new(),
        servers,
    }
}

#[test]
fn heartbeat_echoes_and_dispatches_connect_and_close() {
    let port = 18_453;
    let counters = Counters::default();
    let interpreter = RecordingInterpreter { counters: counters.clone(), next_id: 0 };
    let runtime = Runtime::new(config(port, DataTypeConfig::Packet), interpreter);

    std::thread::spawn(move || {
        let _ = runtime.run();
    });

    let mut stream = connect_with_retry(port);
    stream.write_all(&[0xE0]).unwrap();

    let mut echo = [0u8; 1];
    stream.read_exact(&mut echo).unwrap();
    assert_eq!(echo[0], 0xE0);

    drop(stream);
    std::thread::sleep(Duration::from_millis(300));

    assert_eq!(counters.on_connect.load(Ordering::SeqCst), 1);
    assert_eq!(counters.on_close.load(Ordering::SeqCst), 1);
}

/// In STREAM mode the packet codec is bypassed entirely: every read is
/// handed to `on_data` verbatim, with no REP/HEARTBEAT negotiation and no
/// automatic reply, unlike the `Packet` mode exercised above.
#[test]
fn stream_mode_delivers_raw_bytes_without_codec_framing() {
    let port = 18_454;
    let counters = Counters::default();
    let interpreter = RecordingInterpreter { counters: counters.clone(), next_id: 0 };
    let runtime = Runtime::new(config(port, DataTypeConfig::Stream), interpreter);

    std::thread::spawn(move || {
        let _ = runtime.run();
    });

    let mut stream = connect_with_retry(port);
    // 0xE0 would be decoded as a HEARTBEAT packet type under the packet
    // codec; in STREAM mode it is just a raw byte handed straight through.
    stream.write_all(&[0xE0, 0x01, 0x02]).unwrap();

    for _ in 0..50 {
        if !counters.raw_data.lock().unwrap().is_empty() {
            break;
        }
        std::thread::sleep(Duration::from_millis(20));
    }

    let received = counters.raw_data.lock().unwrap().clone();
    assert_eq!(received, vec![vec![0xE0, 0x01, 0x02]]);
}

fn connect_with_retry(port: u16) -> TcpStream {
    for _ in 0..50 {
        if let Ok(stream) = TcpStream::connect(("127.0.0.1", port)) {
            return stream;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    panic!("runtime never started listening on port {port}");
}
