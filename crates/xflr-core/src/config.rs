//! Centralized configuration for the XFLR5-RPC client.
//!
//! Connection defaults match the stock XFLR5-RPC server build; the remaining
//! constants encode input rules the client checks before issuing a call.

use std::time::Duration;

/// Connection and transport configuration.
pub struct ConnectionConfig;

impl ConnectionConfig {
    pub const DEFAULT_HOST: &'static str = "127.0.0.1";
    pub const DEFAULT_PORT: u16 = 8080;
    /// Per-call limit. Batch analyses and long sweeps hold a call open
    /// while the server computes.
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(300);
    pub const READ_CHUNK_SIZE: usize = 8192;
    pub const MAX_MESSAGE_SIZE: usize = 64 * 1024 * 1024; // 64MB

    /// Default `host:port` address string.
    pub fn default_address() -> String {
        format!("{}:{}", Self::DEFAULT_HOST, Self::DEFAULT_PORT)
    }
}

/// Foil input rules.
pub struct FoilConfig;

impl FoilConfig {
    pub const DAT_EXTENSION: &'static str = ".dat";
    pub const NACA_MIN: i64 = 1;
    pub const NACA_MAX: i64 = 9999;
    pub const NACA_NAME_PREFIX: &'static str = "NACA ";
}

/// Project file rules.
pub struct ProjectConfig;

impl ProjectConfig {
    pub const PROJECT_EXTENSION: &'static str = ".xfl";
}

/// Analysis defaults.
pub struct AnalysisConfig;

impl AnalysisConfig {
    pub const DEFAULT_REYNOLDS: f64 = 100_000.0;
    pub const DEFAULT_NCRIT: f64 = 9.0;
    pub const DEFAULT_BATCH_SWEEP: (f64, f64, f64) = (-15.0, 15.0, 0.25);
    /// 0 lets the server pick its thread count.
    pub const AUTO_THREAD_COUNT: u32 = 0;
}
