//! Outbound TCP connection to the trainer
//!
//! [`Connection`] owns at most one socket. Opening is a single blocking
//! handshake bounded by the configured connect timeout; there is no internal
//! retry. Writes are whole-record `write_all` calls bounded by the write
//! timeout. Any socket error drops the stream so that the owner can decide
//! whether to reconnect.

use std::io::{self, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, trace};

use crate::config::BridgeConfig;
use crate::{BridgeError, Result};

/// Single logical stream endpoint: host, port and the socket handle.
#[derive(Debug)]
pub struct Connection {
    host: String,
    port: u16,
    endpoint: String,
    connect_timeout: Duration,
    write_timeout: Duration,
    stream: Option<TcpStream>,
}

impl Connection {
    /// Create a disconnected endpoint.
    pub fn new(
        host: impl Into<String>,
        port: u16,
        connect_timeout: Duration,
        write_timeout: Duration,
    ) -> Self {
        let host = host.into();
        let endpoint = format!("{}:{}", host, port);
        Self { host, port, endpoint, connect_timeout, write_timeout, stream: None }
    }

    /// Create a disconnected endpoint from bridge configuration.
    pub fn from_config(config: &BridgeConfig) -> Self {
        Self::new(
            config.host.clone(),
            config.port,
            config.connect_timeout(),
            config.write_timeout(),
        )
    }

    /// `host:port` of the trainer.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Whether a socket is currently held. Does not probe the peer.
    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    /// Perform one blocking handshake.
    ///
    /// Every resolved address is tried once, in order; the first successful
    /// handshake wins. An already-open socket is replaced.
    pub fn open(&mut self) -> Result<()> {
        self.stream = None;

        let addrs: Vec<SocketAddr> = (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| BridgeError::connection_io(self.endpoint.clone(), e))?
            .collect();

        let mut last_error = None;
        for addr in addrs {
            trace!("Attempting handshake with {}", addr);
            match TcpStream::connect_timeout(&addr, self.connect_timeout) {
                Ok(stream) => {
                    self.configure(&stream)
                        .map_err(|e| BridgeError::connection_io(self.endpoint.clone(), e))?;
                    debug!("Connected to {} ({})", self.endpoint, addr);
                    self.stream = Some(stream);
                    return Ok(());
                }
                Err(e) => last_error = Some(e),
            }
        }

        Err(match last_error {
            Some(e) => BridgeError::connection_io(self.endpoint.clone(), e),
            None => BridgeError::connection_failed(self.endpoint.clone(), "host did not resolve"),
        })
    }

    fn configure(&self, stream: &TcpStream) -> io::Result<()> {
        // Records are small and latency matters more than packet count
        stream.set_nodelay(true)?;
        stream.set_write_timeout(Some(self.write_timeout))?;
        Ok(())
    }

    /// Check whether the peer is still there, dropping the socket if it is not.
    ///
    /// The probe is a non-blocking one-byte peek: end-of-stream or a hard
    /// socket error means the trainer closed its side.
    pub fn is_alive(&mut self) -> bool {
        let Some(stream) = self.stream.as_ref() else {
            return false;
        };

        if peer_closed(stream) {
            debug!("Peer {} closed the connection", self.endpoint);
            self.stream = None;
            return false;
        }
        true
    }

    /// Write one complete record.
    ///
    /// On failure the socket is dropped; the next [`open`](Self::open) starts fresh.
    pub fn send(&mut self, record: &[u8]) -> Result<usize> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(BridgeError::send_failed(
                self.endpoint.clone(),
                io::Error::new(io::ErrorKind::NotConnected, "socket is not connected"),
            ));
        };

        match stream.write_all(record) {
            Ok(()) => Ok(record.len()),
            Err(e) => {
                self.stream = None;
                Err(BridgeError::send_failed(self.endpoint.clone(), e))
            }
        }
    }

    /// Close the socket if one is held. Safe to call repeatedly.
    pub fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            // The peer may already be gone
            let _ = stream.shutdown(Shutdown::Both);
            debug!("Closed connection to {}", self.endpoint);
        }
    }
}

fn peer_closed(stream: &TcpStream) -> bool {
    if stream.set_nonblocking(true).is_err() {
        return true;
    }

    let mut buf = [0u8; 1];
    let closed = match stream.peek(&mut buf) {
        Ok(0) => true,
        // The trainer never replies, but unread bytes still mean the peer is up
        Ok(_) => false,
        Err(e) => !matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted),
    };

    if stream.set_nonblocking(false).is_err() {
        return true;
    }
    closed
}
