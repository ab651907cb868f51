//! The shared handle to the XFLR5-RPC server.
//!
//! A [`Session`] is the single gateway to the server: every manager and
//! entity proxy holds a clone of it and issues its calls through
//! [`Session::call`]. Clones share one connection handle, one server-state
//! mirror and one set of call counters.
//!
//! # Lifecycle
//!
//! - Created unconnected with [`Session::new`].
//! - [`Session::connect`] (TCP) or [`Session::attach`] (any transport)
//!   installs the connection handle, probes liveness and performs the first
//!   state sync. Installing a second handle fails with `AlreadyConnected`.
//! - [`Session::close`] releases the handle. Call counters survive close and
//!   reconnect so total RPC cost can be profiled across cycles.
//!
//! # Thread Safety
//!
//! Internal state is behind std locks that are never held across an await.
//! The model is single-caller: concurrent callers are not corrupted, but
//! nothing orders their calls relative to each other.

use crate::modes::AppMode;
use crate::rpc::{MsgpackRpcClient, RpcTransport};
use crate::wire::decode;
use crate::{Result, XflrError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Server snapshot as returned by `getState`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerState {
    #[serde(default)]
    pub project_path: String,
    #[serde(default)]
    pub project_name: String,
    pub app: AppMode,
    #[serde(default)]
    pub saved: bool,
    #[serde(default)]
    pub display: Value,
}

/// Project metadata mirrored from the last state sync.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProjectState {
    pub project_name: Option<String>,
    pub project_path: Option<String>,
    pub saved: Option<bool>,
    pub synced_at: Option<DateTime<Utc>>,
}

impl ProjectState {
    fn from_server(state: &ServerState) -> Self {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
        Self {
            project_name: non_empty(&state.project_name),
            project_path: non_empty(&state.project_path),
            saved: Some(state.saved),
            synced_at: Some(Utc::now()),
        }
    }
}

/// Read-only summary returned by [`Session::state`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStatus {
    pub connected: bool,
    pub display: Value,
}

/// Count and cumulative time of one remote procedure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MethodStats {
    pub count: u64,
    pub total_time: Duration,
}

/// Process-lifetime call statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CallStats {
    pub total_calls: u64,
    pub methods: BTreeMap<String, MethodStats>,
}

impl CallStats {
    fn record(&mut self, method: &str, elapsed: Duration) {
        self.total_calls += 1;
        let entry = self.methods.entry(method.to_string()).or_default();
        entry.count += 1;
        entry.total_time += elapsed;
    }

    /// Number of calls made to `method`.
    pub fn count(&self, method: &str) -> u64 {
        self.methods.get(method).map(|m| m.count).unwrap_or(0)
    }

    /// Cumulative time spent in `method`.
    pub fn total_time(&self, method: &str) -> Duration {
        self.methods
            .get(method)
            .map(|m| m.total_time)
            .unwrap_or_default()
    }
}

struct SessionInner {
    transport: RwLock<Option<Arc<dyn RpcTransport>>>,
    address: RwLock<Option<String>>,
    mode: RwLock<Option<AppMode>>,
    project: RwLock<ProjectState>,
    display: RwLock<Value>,
    stats: Mutex<CallStats>,
    call_seq: AtomicU64,
}

/// Shared handle to the server. Cheap to clone.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Create an unconnected session.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SessionInner {
                transport: RwLock::new(None),
                address: RwLock::new(None),
                mode: RwLock::new(None),
                project: RwLock::new(ProjectState::default()),
                display: RwLock::new(Value::Null),
                stats: Mutex::new(CallStats::default()),
                call_seq: AtomicU64::new(0),
            }),
        }
    }

    /// Open a TCP connection to `address` and attach it.
    pub async fn connect(&self, address: &str, timeout: Duration) -> Result<()> {
        self.ensure_detached()?;
        let client = MsgpackRpcClient::connect(address, timeout).await?;
        self.attach(Arc::new(client)).await?;

        // Keep the address as the caller spelled it, not the resolved peer
        *self.inner.address.write().expect("address lock poisoned") = Some(address.to_string());
        Ok(())
    }

    /// Install `transport` as the connection handle.
    ///
    /// Probes liveness and performs one state sync. If either fails the
    /// handle is released again and the error returned, so a session is
    /// never left half-configured.
    pub async fn attach(&self, transport: Arc<dyn RpcTransport>) -> Result<()> {
        {
            let mut slot = self.inner.transport.write().expect("transport lock poisoned");
            if let Some(existing) = slot.as_ref() {
                return Err(XflrError::AlreadyConnected {
                    address: existing.peer(),
                });
            }
            *slot = Some(transport.clone());
        }
        let ready = match self.call("ping", Vec::new()).await {
            Ok(Value::Bool(true)) => self.sync_state().await,
            Ok(other) => Err(XflrError::Protocol {
                message: format!("Unexpected ping response: {}", other),
            }),
            Err(e) => Err(e),
        };

        if let Err(e) = ready {
            warn!(
                "Could not reach the XFLR5 server at {}: {}. Is the application running?",
                transport.peer(),
                e
            );
            self.release().await;
            return Err(e);
        }

        *self.inner.address.write().expect("address lock poisoned") = Some(transport.peer());
        info!("Connected to XFLR5 server at {}", transport.peer());
        Ok(())
    }

    /// Invoke a remote procedure.
    ///
    /// The only path to the server. Counts the call globally and per method,
    /// times it, and returns the transport's decoded result unchanged.
    pub async fn call(&self, method: &str, args: Vec<Value>) -> Result<Value> {
        let transport = self.transport()?;
        let call_id = self.inner.call_seq.fetch_add(1, Ordering::SeqCst) + 1;

        debug!("RPC call {} started: {}", call_id, method);
        let start = Instant::now();
        let result = transport.call(method, args).await;
        let elapsed = start.elapsed();

        self.inner
            .stats
            .lock()
            .expect("stats lock poisoned")
            .record(method, elapsed);
        debug!(
            "RPC call {} complete: {} in {:.3}s",
            call_id,
            method,
            elapsed.as_secs_f64()
        );
        result
    }

    /// Liveness check. Performs a real `ping` round trip when a handle exists.
    pub async fn is_connected(&self) -> bool {
        if !self.has_transport() {
            return false;
        }
        match self.call("ping", Vec::new()).await {
            Ok(value) => value.as_bool().unwrap_or(false),
            Err(e) => {
                debug!("Liveness probe failed: {}", e);
                false
            }
        }
    }

    /// Synchronize with the server and summarize the connection.
    pub async fn state(&self) -> Result<SessionStatus> {
        self.transport()?;
        self.sync_state().await?;
        let connected = self.is_connected().await;
        let display = self.inner.display.read().expect("display lock poisoned").clone();
        Ok(SessionStatus { connected, display })
    }

    /// Fetch the server snapshot and distribute it to the local mirrors.
    ///
    /// Must run after any operation whose result could change the active
    /// mode or the project metadata.
    pub async fn sync_state(&self) -> Result<ServerState> {
        let raw = self.call("getState", Vec::new()).await?;
        let state: ServerState = decode("server state", raw)?;

        *self.inner.mode.write().expect("mode lock poisoned") = Some(state.app);
        *self.inner.project.write().expect("project lock poisoned") =
            ProjectState::from_server(&state);
        *self.inner.display.write().expect("display lock poisoned") = state.display.clone();

        debug!(
            "Synced server state: mode={}, project='{}', saved={}",
            state.app, state.project_name, state.saved
        );
        Ok(state)
    }

    /// Release the connection handle. Counters are kept.
    pub async fn close(&self) -> Result<()> {
        let transport = self
            .inner
            .transport
            .write()
            .expect("transport lock poisoned")
            .take()
            .ok_or(XflrError::NotConnected)?;
        transport.close().await?;
        info!("Closed connection to {}", transport.peer());
        Ok(())
    }

    /// Snapshot of the cumulative call statistics.
    pub fn call_stats(&self) -> CallStats {
        self.inner.stats.lock().expect("stats lock poisoned").clone()
    }

    /// Number of calls issued through this session so far.
    pub fn call_count(&self) -> u64 {
        self.inner.call_seq.load(Ordering::SeqCst)
    }

    /// Address of the last successful connection.
    pub fn address(&self) -> Option<String> {
        self.inner.address.read().expect("address lock poisoned").clone()
    }

    /// Mode confirmed by the last sync.
    pub fn active_mode(&self) -> Option<AppMode> {
        *self.inner.mode.read().expect("mode lock poisoned")
    }

    /// Project metadata from the last sync.
    pub fn project_state(&self) -> ProjectState {
        self.inner.project.read().expect("project lock poisoned").clone()
    }

    /// Whether a connection handle is installed. No round trip.
    pub fn has_transport(&self) -> bool {
        self.inner
            .transport
            .read()
            .expect("transport lock poisoned")
            .is_some()
    }

    fn transport(&self) -> Result<Arc<dyn RpcTransport>> {
        self.inner
            .transport
            .read()
            .expect("transport lock poisoned")
            .clone()
            .ok_or(XflrError::NotConnected)
    }

    fn ensure_detached(&self) -> Result<()> {
        match self.inner.transport.read().expect("transport lock poisoned").as_ref() {
            Some(existing) => Err(XflrError::AlreadyConnected {
                address: existing.peer(),
            }),
            None => Ok(()),
        }
    }

    async fn release(&self) {
        let transport = self
            .inner
            .transport
            .write()
            .expect("transport lock poisoned")
            .take();
        if let Some(transport) = transport {
            if let Err(e) = transport.close().await {
                debug!("Error closing transport: {}", e);
            }
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("address", &self.address())
            .field("attached", &self.has_transport())
            .field("calls", &self.call_count())
            .finish()
    }
}

impl std::fmt::Display for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = if self.has_transport() {
            "attached"
        } else {
            "detached"
        };
        write!(
            f,
            "<XFLRClient>(server:{}, status:{})",
            self.address().unwrap_or_else(|| "-".to_string()),
            status
        )
    }
}
