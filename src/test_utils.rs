//! Test utilities: loopback trainer peers, ports and reference frames
//!
//! These helpers stand in for the external trainer process so client and
//! bridge behaviour can be exercised over real loopback sockets.

#![cfg(any(test, feature = "benchmark"))]

use std::io::{self, Read};
use std::net::{TcpListener, TcpStream};
use std::time::Duration;

use crate::codec::RecordTerminator;
use crate::config::BridgeConfig;
use crate::types::Frame;

/// A frame with distinct, exactly representable values in every field.
pub fn sample_frame() -> Frame {
    Frame {
        track_progress: 0.375,
        speed_kmh: 187.25,
        world_location: [-1204.5, 12.25, 388.0],
        throttle: 0.75,
        brake: 0.0,
        steer: -0.125,
        lap_time: 83_412,
        lap_invalid: false,
        lap_count: 4,
    }
}

/// A loopback port with nothing listening on it.
///
/// The port was bound and released, so a handshake is refused.
pub fn unused_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .and_then(|listener| listener.local_addr())
        .map(|addr| addr.port())
        .expect("Failed to reserve a loopback port")
}

/// Configuration pointing at `127.0.0.1:port` with short timeouts.
pub fn config_for_port(port: u16) -> BridgeConfig {
    BridgeConfig {
        host: "127.0.0.1".to_string(),
        port,
        connect_timeout_ms: 500,
        write_timeout_ms: 500,
        record_terminator: RecordTerminator::None,
        ..BridgeConfig::default()
    }
}

/// Listening stand-in for the trainer process.
pub struct LoopbackTrainer {
    listener: TcpListener,
}

impl LoopbackTrainer {
    pub fn bind() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind loopback trainer");
        Self { listener }
    }

    pub fn port(&self) -> u16 {
        self.listener.local_addr().expect("Loopback trainer has no address").port()
    }

    pub fn config(&self) -> BridgeConfig {
        config_for_port(self.port())
    }

    /// Accept the client's connection, with reads bounded by `read_timeout`.
    pub fn accept(&self, read_timeout: Duration) -> TcpStream {
        let (stream, _) = self.listener.accept().expect("Failed to accept client");
        stream.set_read_timeout(Some(read_timeout)).expect("Failed to set read timeout");
        stream
    }
}

/// Read whatever arrives on `stream` until it goes quiet for one read timeout.
///
/// Returns everything read; an empty vector means nothing was written.
pub fn drain(stream: &mut TcpStream) -> Vec<u8> {
    let mut received = Vec::new();
    let mut buf = [0u8; 1024];

    loop {
        match stream.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => received.extend_from_slice(&buf[..n]),
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                break;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => panic!("Unexpected read error from client: {e}"),
        }
    }

    received
}
