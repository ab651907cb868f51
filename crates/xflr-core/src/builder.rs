//! Builder for configuring the client connection.

use crate::config::ConnectionConfig;
use crate::error::Result;
use crate::XflrClient;
use std::time::Duration;

/// Builder for a connected [`XflrClient`].
///
/// # Example
///
/// ```rust,ignore
/// use xflr_core::XflrClient;
/// use std::time::Duration;
///
/// let client = XflrClient::builder()
///     .host("192.168.1.20")
///     .port(8080)
///     .timeout(Duration::from_secs(60))
///     .connect()
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct XflrClientBuilder {
    host: String,
    port: u16,
    timeout: Duration,
}

impl Default for XflrClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl XflrClientBuilder {
    pub fn new() -> Self {
        Self {
            host: ConnectionConfig::DEFAULT_HOST.to_string(),
            port: ConnectionConfig::DEFAULT_PORT,
            timeout: ConnectionConfig::CONNECT_TIMEOUT,
        }
    }

    /// Server host name or IP.
    ///
    /// Default: `127.0.0.1`
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Default: `8080`
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Per-call timeout. Batch analyses and long sweeps keep a call open
    /// while the server computes, so keep this generous.
    ///
    /// Default: 300 seconds
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `host:port` the client will connect to.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Connect and return the client.
    pub async fn connect(self) -> Result<XflrClient> {
        let client = XflrClient::new();
        client.session().connect(&self.address(), self.timeout).await?;
        Ok(client)
    }
}
