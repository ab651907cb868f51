//! TCP MessagePack-RPC client for the XFLR5-RPC server.
//!
//! Opens one TCP connection and exchanges one request/response pair at a
//! time. Responses carrying an unexpected msgid are discarded.
//!
//! A call that times out drops the connection: the cancelled exchange may
//! have left half a request on the stream. Later calls fail with
//! `NotConnected` until the session reconnects.
//!
//! # Thread Safety
//!
//! The client uses a tokio `Mutex` to serialize access to the TCP stream and
//! its read buffer, so concurrent callers are queued rather than interleaved.

use super::protocol::{decode_response, FrameScanner, RpcRequest};
use super::RpcTransport;
use crate::config::ConnectionConfig;
use crate::{Result, XflrError};
use bytes::BytesMut;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::{debug, warn};

struct Connection {
    stream: TcpStream,
    buffer: BytesMut,
    scanner: FrameScanner,
}

/// MessagePack-RPC client bound to one server address.
pub struct MsgpackRpcClient {
    conn: Mutex<Option<Connection>>,
    addr: SocketAddr,
    timeout: Duration,
    next_id: AtomicU32,
}

impl std::fmt::Debug for MsgpackRpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MsgpackRpcClient")
            .field("addr", &self.addr)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl MsgpackRpcClient {
    /// Connect to the server at `address` (`host:port`).
    ///
    /// `timeout` bounds the TCP connect and every later call.
    pub async fn connect(address: &str, timeout: Duration) -> Result<Self> {
        let stream = tokio::time::timeout(timeout, TcpStream::connect(address))
            .await
            .map_err(|_| XflrError::Timeout(timeout))?
            .map_err(|e| XflrError::transport(format!("Could not connect to {}", address), e))?;
        let addr = stream
            .peer_addr()
            .map_err(|e| XflrError::transport("Could not read peer address", e))?;
        stream
            .set_nodelay(true)
            .map_err(|e| XflrError::transport("Could not configure socket", e))?;

        debug!("RPC client connected to {}", addr);

        Ok(Self {
            conn: Mutex::new(Some(Connection {
                stream,
                buffer: BytesMut::with_capacity(ConnectionConfig::READ_CHUNK_SIZE),
                scanner: FrameScanner::new(),
            })),
            addr,
            timeout,
            next_id: AtomicU32::new(0),
        })
    }

    /// Get the address of the connected server.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    async fn exchange(conn: &mut Connection, request: &RpcRequest) -> Result<Value> {
        let bytes = request.encode()?;
        conn.stream
            .write_all(&bytes)
            .await
            .map_err(|e| XflrError::transport("Failed to send request", e))?;
        conn.stream
            .flush()
            .await
            .map_err(|e| XflrError::transport("Failed to send request", e))?;

        loop {
            // Only decode once the scanner has seen a whole frame
            if let Some(frame) = conn.scanner.scan(&conn.buffer)? {
                let bytes = conn.buffer.split_to(frame);
                let (response, _) =
                    decode_response(&bytes)?.ok_or_else(|| XflrError::Protocol {
                        message: "Truncated response frame".to_string(),
                    })?;
                if response.msgid() != request.msgid() {
                    warn!(
                        "Discarding stale response {} while waiting for {}",
                        response.msgid(),
                        request.msgid()
                    );
                    continue;
                }
                return response.into_result(request.method());
            }

            let read = conn
                .stream
                .read_buf(&mut conn.buffer)
                .await
                .map_err(|e| XflrError::transport("Failed to read response", e))?;
            if read == 0 {
                return Err(XflrError::Transport {
                    message: "Server closed the connection".to_string(),
                    source: None,
                });
            }
        }
    }
}

#[async_trait::async_trait]
impl RpcTransport for MsgpackRpcClient {
    async fn call(&self, method: &str, args: Vec<Value>) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest::new(id, method, args);

        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or(XflrError::NotConnected)?;

        let outcome = tokio::time::timeout(self.timeout, Self::exchange(conn, &request)).await;
        match outcome {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    "Call '{}' timed out after {:?}, dropping connection to {}",
                    method, self.timeout, self.addr
                );
                *guard = None;
                Err(XflrError::Timeout(self.timeout))
            }
        }
    }

    async fn close(&self) -> Result<()> {
        if let Some(mut conn) = self.conn.lock().await.take() {
            // Peer may already be gone; the socket is dropped either way.
            let _ = conn.stream.shutdown().await;
            debug!("RPC client disconnected from {}", self.addr);
        }
        Ok(())
    }

    fn peer(&self) -> String {
        self.addr.to_string()
    }
}
