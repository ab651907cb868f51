//! Transport channel to the XFLR5-RPC server.
//!
//! The server speaks MessagePack-RPC over TCP. Requests and responses are
//! plain msgpack arrays written back to back on the stream, without any
//! length prefix:
//!
//! ```text
//! request:  [0, msgid, method, params]
//! response: [1, msgid, error, result]
//! ```
//!
//! # Architecture
//!
//! - **Protocol**: request/response types and incremental decoding
//! - **Client**: the TCP transport used by [`crate::Session::connect`]
//! - **RpcTransport**: the seam the session calls through, so tests can run
//!   the whole object model against an in-process server

pub mod client;
pub mod protocol;

pub use client::MsgpackRpcClient;
pub use protocol::{RpcRequest, RpcResponse};

use crate::Result;
use serde_json::Value;

/// A synchronous-per-call request/response channel.
///
/// Each `call` completes (or fails) before the caller can issue the next one,
/// which is what keeps mutate-then-refresh pairs strictly ordered.
#[async_trait::async_trait]
pub trait RpcTransport: Send + Sync + 'static {
    /// Invoke `method` with positional `args` and return the decoded result.
    async fn call(&self, method: &str, args: Vec<Value>) -> Result<Value>;

    /// Release the underlying connection.
    async fn close(&self) -> Result<()> {
        Ok(())
    }

    /// Human readable peer description, used in logs.
    fn peer(&self) -> String;
}
