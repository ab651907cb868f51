//! XFLR5-RPC client - typed object model over a running XFLR5 application.
//!
//! The XFLR5 process owns every foil, polar and plane and does all of the
//! computation. This crate presents that server state as local objects:
//! managers list and look up entities, proxies wrap snapshots of single
//! entities and issue the calls that change them, and a mode gate switches
//! the server's single active application when an operation needs it.
//!
//! # Example
//!
//! ```rust,ignore
//! use xflr_core::{RemoteCollection, SequenceType, Sweep, XflrClient};
//!
//! #[tokio::main]
//! async fn main() -> xflr_core::Result<()> {
//!     let client = XflrClient::connect_default().await?;
//!
//!     let foil = client.foils().create_naca(2412, None).await?;
//!     let analysis = foil.analyses()?.create("", Default::default()).await?;
//!     let result = analysis
//!         // An empty field list returns every column
//!         .run_analysis(SequenceType::Alpha, Sweep::new(0.0, 15.0, 0.25), &[])
//!         .await?;
//!     println!("{}", result);
//!
//!     client.close().await
//! }
//! ```

pub mod analysis;
pub mod builder;
pub mod collection;
pub mod config;
pub mod error;
pub mod foil;
pub mod models;
pub mod modes;
pub mod plane;
pub mod project;
pub mod rpc;
pub mod session;
pub mod wire;

pub use analysis::{Analysis, AnalysisManager};
pub use builder::XflrClientBuilder;
pub use collection::{CollectionKey, RemoteCollection, Snapshot};
pub use config::{AnalysisConfig, ConnectionConfig, FoilConfig, ProjectConfig};
pub use error::{Result, XflrError};
pub use foil::{Foil, FoilGeometry, FoilManager, NacaCode};
pub use models::{
    AnalysisMethod, AnalysisSettings2D, AnalysisSettings3D, BatchAnalysisSettings, FoilData,
    LineStyle, OpPoint, PlaneData, PlaneDetail, PlaneQuantity, Point, PointStyle, PolarData,
    PolarResult, PolarResultField, PolarSpec, PolarType, RefDimension, SequenceType,
    StippleType, Sweep, WPolar, WPolarResult, WPolarResultField, WPolarSpec, Wing, WingSection,
    WingType,
};
pub use modes::{AppMode, ModeGate};
pub use plane::{Plane, PlaneManager};
pub use project::ProjectManager;
pub use rpc::{MsgpackRpcClient, RpcTransport};
pub use session::{CallStats, MethodStats, ProjectState, ServerState, Session, SessionStatus};
pub use wire::{Extra, WireEntity};

use std::sync::Arc;
use std::time::Duration;

/// Entry point bundling one session with its managers.
///
/// All managers share the session, so they see one connection, one state
/// mirror and one set of call counters.
///
/// The single-handle rule is per session, not per process. Clones of a
/// client share its session; two clients built with `new` or `connect`
/// hold independent handles, and nothing stops both from talking to the
/// same server. Share one client (or its `Session`) to keep one handle.
#[derive(Debug, Clone)]
pub struct XflrClient {
    session: Session,
    foils: FoilManager,
    planes: PlaneManager,
    modes: ModeGate,
    project: ProjectManager,
}

impl Default for XflrClient {
    fn default() -> Self {
        Self::new()
    }
}

impl XflrClient {
    /// Create an unconnected client.
    pub fn new() -> Self {
        let session = Session::new();
        Self {
            foils: FoilManager::new(session.clone()),
            planes: PlaneManager::new(session.clone()),
            modes: ModeGate::new(session.clone()),
            project: ProjectManager::new(session.clone()),
            session,
        }
    }

    /// Create a builder for host, port and timeout.
    pub fn builder() -> XflrClientBuilder {
        XflrClientBuilder::new()
    }

    /// Connect to `address` (`host:port`).
    pub async fn connect(address: &str, timeout: Duration) -> Result<Self> {
        let client = Self::new();
        client.session.connect(address, timeout).await?;
        Ok(client)
    }

    /// Connect to the default local server.
    pub async fn connect_default() -> Result<Self> {
        Self::builder().connect().await
    }

    /// Run over an already established transport.
    pub async fn with_transport(transport: Arc<dyn RpcTransport>) -> Result<Self> {
        let client = Self::new();
        client.session.attach(transport).await?;
        Ok(client)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn foils(&self) -> &FoilManager {
        &self.foils
    }

    pub fn planes(&self) -> &PlaneManager {
        &self.planes
    }

    pub fn modes(&self) -> &ModeGate {
        &self.modes
    }

    pub fn project(&self) -> &ProjectManager {
        &self.project
    }

    /// Liveness check with a `ping` round trip.
    pub async fn is_connected(&self) -> bool {
        self.session.is_connected().await
    }

    pub async fn state(&self) -> Result<SessionStatus> {
        self.session.state().await
    }

    /// Cumulative RPC statistics for this client.
    pub fn call_stats(&self) -> CallStats {
        self.session.call_stats()
    }

    pub async fn close(&self) -> Result<()> {
        self.session.close().await
    }
}

impl std::fmt::Display for XflrClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.session, f)
    }
}
