//! The server's exclusive application mode and the gate that switches it.
//!
//! Exactly one mode is active on the server at a time. The client only
//! mirrors it, and only after a confirmed `getState` round trip: [`ModeGate::set`]
//! requests the switch and then re-synchronizes, never assuming success.

use crate::session::Session;
use crate::wire::wire_enum;
use crate::Result;
use serde_json::json;
use tracing::debug;

wire_enum! {
    /// Design application active on the server.
    pub enum AppMode {
        #[default]
        NoApp = 0,
        DirectAnalysis = 1,
        FoilDesign = 2,
        InverseDesign = 3,
        PlaneDesign = 4,
    }
}

impl AppMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppMode::NoApp => "no-app",
            AppMode::DirectAnalysis => "direct-analysis",
            AppMode::FoilDesign => "foil-design",
            AppMode::InverseDesign => "inverse-design",
            AppMode::PlaneDesign => "plane-design",
        }
    }
}

impl std::fmt::Display for AppMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Switches the server's active mode.
#[derive(Debug, Clone)]
pub struct ModeGate {
    session: Session,
}

impl ModeGate {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// Mode confirmed by the last state sync; `None` before the first one.
    pub fn active(&self) -> Option<AppMode> {
        self.session.active_mode()
    }

    /// Make `target` the active mode.
    ///
    /// No call is issued when the mirror already shows `target`. The mirror
    /// is resynchronized whether or not the switch succeeds.
    pub async fn set(&self, target: AppMode) -> Result<()> {
        if self.active() == Some(target) {
            return Ok(());
        }
        debug!("Switching server mode to {}", target);
        let switched = self.session.call("setApp", vec![json!(target.code())]).await;
        // Resync even when the switch failed
        self.session.sync_state().await?;
        switched.map(|_| ())
    }
}
