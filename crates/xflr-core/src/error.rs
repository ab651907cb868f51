//! Error types for the XFLR5-RPC client.
//!
//! Every locally detected condition is raised at the call site that detects
//! it; nothing here is retried or aggregated. Transport failures are surfaced
//! unchanged apart from being wrapped in [`XflrError::Transport`] or
//! [`XflrError::Timeout`].

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Main error type for the XFLR5-RPC client.
#[derive(Debug, Error)]
pub enum XflrError {
    // Connection state errors
    #[error("Client is not connected")]
    NotConnected,

    #[error("Client already connected to {address}")]
    AlreadyConnected { address: String },

    // Transport errors
    #[error("Transport error: {message}")]
    Transport {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Request timeout after {0:?}")]
    Timeout(Duration),

    #[error("Server rejected '{method}': {message}")]
    Remote { method: String, message: String },

    #[error("Protocol error: {message}")]
    Protocol { message: String },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    #[error("Malformed {kind} payload: {message}")]
    Wire { kind: &'static str, message: String },

    // Identity errors
    #[error("No {kind} named '{key}'")]
    NotFound { kind: &'static str, key: String },

    #[error("{kind} index {index} out of range (len {len})")]
    IndexOutOfRange {
        kind: &'static str,
        index: usize,
        len: usize,
    },

    // Input validation errors
    #[error("Invalid foil path \"{path}\": {reason}")]
    InvalidFoilPath { path: String, reason: String },

    #[error("NACA code must be a positive value of at most 4 digits, got '{value}'")]
    InvalidNacaCode { value: String },

    #[error("Unknown polar result field code: {code}")]
    InvalidResultField { code: i64 },

    #[error("Validation error for {field}: {message}")]
    Validation { field: String, message: String },

    // Post-deletion access errors
    #[error("Analysis '{polar}' of foil '{foil}' has been deleted")]
    AnalysisDeleted { foil: String, polar: String },

    #[error("Foil '{name}' has been deleted")]
    FoilDeleted { name: String },

    #[error("Cannot initialize analysis: {message}")]
    AnalysisIdentity { message: String },

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    // Generic errors
    #[error("{0}")]
    Other(String),
}

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, XflrError>;

impl From<std::io::Error> for XflrError {
    fn from(err: std::io::Error) -> Self {
        XflrError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for XflrError {
    fn from(err: serde_json::Error) -> Self {
        XflrError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<rmp_serde::encode::Error> for XflrError {
    fn from(err: rmp_serde::encode::Error) -> Self {
        XflrError::Protocol {
            message: format!("Failed to encode request: {}", err),
        }
    }
}

impl From<rmp_serde::decode::Error> for XflrError {
    fn from(err: rmp_serde::decode::Error) -> Self {
        XflrError::Protocol {
            message: format!("Failed to decode response: {}", err),
        }
    }
}

impl XflrError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        XflrError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Create a transport error from a socket failure.
    pub fn transport(message: impl Into<String>, source: std::io::Error) -> Self {
        XflrError::Transport {
            message: message.into(),
            source: Some(source),
        }
    }

    /// True for errors caused by the connection itself rather than the request.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            XflrError::NotConnected | XflrError::Transport { .. } | XflrError::Timeout(_)
        )
    }

    /// True for failed lookups in a remote collection.
    pub fn is_identity_error(&self) -> bool {
        matches!(
            self,
            XflrError::NotFound { .. } | XflrError::IndexOutOfRange { .. }
        )
    }

    /// True when an operation was attempted on a proxy whose entity is gone.
    pub fn is_deleted_error(&self) -> bool {
        matches!(
            self,
            XflrError::AnalysisDeleted { .. } | XflrError::FoilDeleted { .. }
        )
    }
}
