//! Planes and 3D analyses.

use crate::collection::{unique_by_name, RemoteCollection, Snapshot};
use crate::models::{
    AnalysisSettings3D, PlaneData, PlaneDetail, WPolar, WPolarResult, WPolarResultField,
};
use crate::modes::{AppMode, ModeGate};
use crate::session::Session;
use crate::wire::{decode, WireEntity};
use crate::{Result, XflrError};
use serde_json::{json, Value};
use tracing::debug;

/// Handle to one server plane.
#[derive(Debug, Clone)]
pub struct Plane {
    session: Session,
    data: PlaneData,
}

impl Plane {
    pub(crate) fn new(session: Session, data: PlaneData) -> Self {
        Self { session, data }
    }

    pub fn name(&self) -> &str {
        &self.data.name
    }

    /// Geometry snapshot from the listing this handle came from.
    pub fn data(&self) -> &PlaneData {
        &self.data
    }

    /// Derived quantities (span, area, mass...) computed by the server.
    pub async fn detail(&self) -> Result<PlaneDetail> {
        let raw = self
            .session
            .call("getPlaneData", vec![json!(self.data.name)])
            .await?;
        let text: String = decode("plane detail", raw)?;
        Ok(PlaneDetail::parse(&text))
    }
}

impl std::fmt::Display for Plane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<Plane \"{}\">", self.data.name)
    }
}

/// The server's planes and the 3D analyses run on them.
#[derive(Debug, Clone)]
pub struct PlaneManager {
    session: Session,
    modes: ModeGate,
}

impl PlaneManager {
    pub fn new(session: Session) -> Self {
        let modes = ModeGate::new(session.clone());
        Self { session, modes }
    }

    pub async fn get(&self, name: &str) -> Result<Plane> {
        self.get_by_key(name).await
    }

    /// Define a 3D polar on the server.
    pub async fn define_analysis(&self, polar: &WPolar) -> Result<()> {
        if polar.plane_name.is_empty() {
            return Err(XflrError::Validation {
                field: "plane_name".to_string(),
                message: "a 3D polar needs the plane it belongs to".to_string(),
            });
        }
        self.modes.set(AppMode::PlaneDesign).await?;
        self.session
            .call("defineAnalysis3D", vec![polar.to_wire()?])
            .await?;
        debug!(
            "Defined 3D polar '{}' on plane '{}'",
            polar.name, polar.plane_name
        );
        Ok(())
    }

    /// Run a previously defined 3D polar and return the requested columns.
    /// An empty `fields` requests every column.
    pub async fn analyze(
        &self,
        polar_name: &str,
        plane_name: &str,
        settings: &AnalysisSettings3D,
        fields: &[WPolarResultField],
    ) -> Result<WPolarResult> {
        self.modes.set(AppMode::PlaneDesign).await?;
        let fields = if fields.is_empty() {
            WPolarResultField::ALL
        } else {
            fields
        };
        let codes: Vec<Value> = fields.iter().map(|f| json!(f.code())).collect();
        let raw = self
            .session
            .call(
                "analyzeWPolar",
                vec![
                    json!(polar_name),
                    json!(plane_name),
                    serde_json::to_value(settings)?,
                    Value::Array(codes),
                ],
            )
            .await?;
        WPolarResult::from_wire(raw)
    }
}

#[async_trait::async_trait]
impl RemoteCollection for PlaneManager {
    type Item = Plane;
    const KIND: &'static str = "plane";

    async fn fetch(&self) -> Result<Snapshot<Plane>> {
        let raw = self.session.call("getPlanes", Vec::new()).await?;
        let items = PlaneData::from_wire_list(raw)?
            .into_iter()
            .map(|data| (data.name.clone(), Plane::new(self.session.clone(), data)));
        Ok(unique_by_name(Self::KIND, items))
    }
}
