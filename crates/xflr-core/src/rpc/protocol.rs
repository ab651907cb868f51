//! MessagePack-RPC message types and stream decoding.
//!
//! Messages are msgpack arrays with no framing of their own. A reader
//! either attempts a decode and asks for more bytes when the buffer ends
//! mid-message, or walks element headers with a `FrameScanner` to find the
//! frame boundary first.
//!
//! ```text
//! [0, msgid, method, params]   request
//! [1, msgid, error, result]    response
//! ```

use crate::config::ConnectionConfig;
use crate::{Result, XflrError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::{Cursor, ErrorKind};

/// Message type tag of a request.
pub const REQUEST_TYPE: u8 = 0;
/// Message type tag of a response.
pub const RESPONSE_TYPE: u8 = 1;

/// MessagePack-RPC request.
#[derive(Debug, Clone, Serialize)]
pub struct RpcRequest(pub u8, pub u32, pub String, pub Vec<Value>);

impl RpcRequest {
    /// Create a new request.
    pub fn new(msgid: u32, method: impl Into<String>, params: Vec<Value>) -> Self {
        Self(REQUEST_TYPE, msgid, method.into(), params)
    }

    pub fn msgid(&self) -> u32 {
        self.1
    }

    pub fn method(&self) -> &str {
        &self.2
    }

    /// Encode as a msgpack array.
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(rmp_serde::to_vec(self)?)
    }
}

/// MessagePack-RPC response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse(pub u8, pub u32, pub Value, pub Value);

impl RpcResponse {
    /// Create a success response.
    pub fn success(msgid: u32, result: Value) -> Self {
        Self(RESPONSE_TYPE, msgid, Value::Null, result)
    }

    /// Create an error response.
    pub fn error(msgid: u32, error: Value) -> Self {
        Self(RESPONSE_TYPE, msgid, error, Value::Null)
    }

    pub fn msgid(&self) -> u32 {
        self.1
    }

    /// Split into the server's error or result.
    pub fn into_result(self, method: &str) -> Result<Value> {
        if self.0 != RESPONSE_TYPE {
            return Err(XflrError::Protocol {
                message: format!("Unexpected message type {} in response", self.0),
            });
        }
        match self.2 {
            Value::Null => Ok(self.3),
            Value::String(message) => Err(XflrError::Remote {
                method: method.to_string(),
                message,
            }),
            other => Err(XflrError::Remote {
                method: method.to_string(),
                message: other.to_string(),
            }),
        }
    }

    /// Encode as a msgpack array.
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(rmp_serde::to_vec(self)?)
    }
}

/// Try to decode one response from the front of `buf`.
///
/// Returns the response and the number of bytes it occupied, or `None` if
/// `buf` holds only part of a message.
pub fn decode_response(buf: &[u8]) -> Result<Option<(RpcResponse, usize)>> {
    decode_message(buf)
}

/// Try to decode one request from the front of `buf`.
pub fn decode_request(buf: &[u8]) -> Result<Option<((u8, u32, String, Vec<Value>), usize)>> {
    decode_message(buf)
}

/// Incremental frame boundary finder.
///
/// Walks msgpack element headers without decoding values, and remembers
/// how far it got, so feeding it a growing buffer costs time linear in the
/// frame size. String and binary payloads are skipped by length.
#[derive(Debug, Clone)]
pub struct FrameScanner {
    pos: usize,
    pending: usize,
}

impl Default for FrameScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameScanner {
    pub fn new() -> Self {
        Self { pos: 0, pending: 1 }
    }

    /// Length of the first complete message in `buf`, or `None` if more
    /// bytes are needed.
    ///
    /// `buf` must start at the same frame on every call until one is
    /// returned; the scanner then resets for the next frame.
    pub fn scan(&mut self, buf: &[u8]) -> Result<Option<usize>> {
        while self.pending > 0 {
            let Some(&marker) = buf.get(self.pos) else {
                return incomplete(buf);
            };
            let Some((len, children)) = element_extent(marker, &buf[self.pos + 1..])? else {
                return incomplete(buf);
            };
            let end = self.pos.saturating_add(len);
            if buf.len() < end {
                return incomplete(buf);
            }
            self.pos = end;
            self.pending = (self.pending - 1).saturating_add(children);
        }

        let frame = self.pos;
        *self = Self::new();
        Ok(Some(frame))
    }
}

/// Encoded size of the element starting with `marker` (header plus any
/// inline payload) and the number of child elements that follow it.
/// `None` while the length field itself is still incomplete.
fn element_extent(marker: u8, rest: &[u8]) -> Result<Option<(usize, usize)>> {
    let length = |width: usize| -> Option<usize> {
        rest.get(..width)
            .map(|b| b.iter().fold(0usize, |acc, &x| (acc << 8) | x as usize))
    };
    let payload =
        |width: usize, extra: usize| length(width).map(|n| (n.saturating_add(1 + width + extra), 0));

    let extent = match marker {
        0x00..=0x7f | 0xe0..=0xff | 0xc0 | 0xc2 | 0xc3 => Some((1, 0)),
        0x80..=0x8f => Some((1, 2 * (marker & 0x0f) as usize)),
        0x90..=0x9f => Some((1, (marker & 0x0f) as usize)),
        0xa0..=0xbf => Some((1 + (marker & 0x1f) as usize, 0)),
        0xc1 => {
            return Err(XflrError::Protocol {
                message: "invalid msgpack marker 0xc1".to_string(),
            })
        }
        // bin and str
        0xc4 | 0xd9 => payload(1, 0),
        0xc5 | 0xda => payload(2, 0),
        0xc6 | 0xdb => payload(4, 0),
        // ext carries a type byte after the length
        0xc7 => payload(1, 1),
        0xc8 => payload(2, 1),
        0xc9 => payload(4, 1),
        0xca => Some((5, 0)),
        0xcb => Some((9, 0)),
        0xcc | 0xd0 => Some((2, 0)),
        0xcd | 0xd1 => Some((3, 0)),
        0xce | 0xd2 => Some((5, 0)),
        0xcf | 0xd3 => Some((9, 0)),
        // fixext 1, 2, 4, 8, 16
        0xd4 => Some((3, 0)),
        0xd5 => Some((4, 0)),
        0xd6 => Some((6, 0)),
        0xd7 => Some((10, 0)),
        0xd8 => Some((18, 0)),
        0xdc => length(2).map(|n| (3, n)),
        0xdd => length(4).map(|n| (5, n)),
        0xde => length(2).map(|n| (3, n.saturating_mul(2))),
        0xdf => length(4).map(|n| (5, n.saturating_mul(2))),
    };
    Ok(extent)
}

fn incomplete(buf: &[u8]) -> Result<Option<usize>> {
    if buf.len() > ConnectionConfig::MAX_MESSAGE_SIZE {
        return Err(XflrError::Protocol {
            message: format!(
                "message exceeds maximum size {}",
                ConnectionConfig::MAX_MESSAGE_SIZE
            ),
        });
    }
    Ok(None)
}

fn decode_message<T: serde::de::DeserializeOwned>(buf: &[u8]) -> Result<Option<(T, usize)>> {
    if buf.is_empty() {
        return Ok(None);
    }

    let mut cursor = Cursor::new(buf);
    let decoded = {
        let mut de = rmp_serde::Deserializer::new(&mut cursor);
        T::deserialize(&mut de)
    };

    match decoded {
        Ok(message) => Ok(Some((message, cursor.position() as usize))),
        Err(e) if is_incomplete(&e) => incomplete(buf).map(|_| None),
        Err(e) => Err(e.into()),
    }
}

fn is_incomplete(err: &rmp_serde::decode::Error) -> bool {
    match err {
        rmp_serde::decode::Error::InvalidMarkerRead(e)
        | rmp_serde::decode::Error::InvalidDataRead(e) => e.kind() == ErrorKind::UnexpectedEof,
        _ => false,
    }
}
