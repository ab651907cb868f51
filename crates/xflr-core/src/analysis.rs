//! 2D analyses (polars) of a foil.
//!
//! An [`Analysis`] is identified by its foil name and polar name. It is either
//! live, carrying the polar definition the server confirmed, or deleted.
//! Every remote operation on a deleted analysis fails with
//! `AnalysisDeleted` before any call is made.

use crate::collection::{unique_by_name, RemoteCollection, Snapshot};
use crate::models::{
    AnalysisSettings2D, OpPoint, PolarData, PolarResult, PolarResultField, PolarSpec,
    SequenceType, Sweep,
};
use crate::modes::{AppMode, ModeGate};
use crate::session::Session;
use crate::wire::WireEntity;
use crate::{Result, XflrError};
use serde_json::{json, Value};
use tracing::debug;

#[derive(Debug, Clone)]
enum AnalysisState {
    Live(PolarData),
    Deleted { polar: String },
}

/// Handle to one polar of one foil.
#[derive(Debug, Clone)]
pub struct Analysis {
    session: Session,
    foil_name: String,
    state: AnalysisState,
}

impl Analysis {
    /// Define a new polar on the server and wrap the identity it returns.
    pub async fn define(
        session: &Session,
        foil_name: &str,
        name: &str,
        spec: PolarSpec,
    ) -> Result<Self> {
        let request = PolarData {
            name: name.to_string(),
            foil_name: foil_name.to_string(),
            spec,
            ..Default::default()
        };
        let raw = session
            .call("defineAnalysis2D", vec![request.to_wire()?])
            .await?;
        let polar = PolarData::from_wire(raw)?;
        debug!("Defined polar '{}' on foil '{}'", polar.name, polar.foil_name);
        Ok(Self::from_polar(session.clone(), polar))
    }

    /// Bind to an existing polar.
    ///
    /// At least one of `foil_name` and `polar` is required; when both are
    /// given they must name the same foil.
    pub fn bind(session: Session, foil_name: Option<&str>, polar: Option<PolarData>) -> Result<Self> {
        match (foil_name, polar) {
            (None, None) => Err(XflrError::AnalysisIdentity {
                message: "need either a foil name or a polar".to_string(),
            }),
            (Some(foil), Some(polar)) if polar.foil_name != foil => {
                Err(XflrError::AnalysisIdentity {
                    message: format!(
                        "foil '{}' does not match polar foil '{}'",
                        foil, polar.foil_name
                    ),
                })
            }
            (_, Some(polar)) => Ok(Self::from_polar(session, polar)),
            (Some(foil), None) => Ok(Self::from_polar(
                session,
                PolarData {
                    foil_name: foil.to_string(),
                    ..Default::default()
                },
            )),
        }
    }

    pub(crate) fn from_polar(session: Session, polar: PolarData) -> Self {
        Self {
            session,
            foil_name: polar.foil_name.clone(),
            state: AnalysisState::Live(polar),
        }
    }

    pub fn foil_name(&self) -> &str {
        &self.foil_name
    }

    pub fn name(&self) -> &str {
        match &self.state {
            AnalysisState::Live(polar) => &polar.name,
            AnalysisState::Deleted { polar } => polar,
        }
    }

    pub fn is_deleted(&self) -> bool {
        matches!(self.state, AnalysisState::Deleted { .. })
    }

    fn live(&self) -> Result<&PolarData> {
        match &self.state {
            AnalysisState::Live(polar) => Ok(polar),
            AnalysisState::Deleted { polar } => Err(XflrError::AnalysisDeleted {
                foil: self.foil_name.clone(),
                polar: polar.clone(),
            }),
        }
    }

    fn identity(&self) -> Result<Vec<Value>> {
        let polar = self.live()?;
        Ok(vec![json!(self.foil_name), json!(polar.name)])
    }

    /// Polar definition as the server holds it. Also makes the polar the
    /// server's current one.
    pub async fn parameters(&self) -> Result<PolarData> {
        let mut args = self.identity()?;
        args.extend([json!(true), json!(true)]);
        let raw = self.session.call("getPolar", args).await?;
        PolarData::from_wire(raw)
    }

    /// Every column of the stored result.
    pub async fn polar(&self) -> Result<PolarResult> {
        self.polar_fields(&PolarResultField::all()).await
    }

    /// The requested columns of the stored result. Empty means all.
    pub async fn polar_fields(&self, fields: &[PolarResultField]) -> Result<PolarResult> {
        let mut args = self.identity()?;
        args.push(field_codes(fields));
        let raw = self.session.call("getPolarResult", args).await?;
        PolarResult::from_wire(raw)
    }

    pub async fn op_points(&self) -> Result<Vec<OpPoint>> {
        let raw = self.session.call("getOpPoints", self.identity()?).await?;
        OpPoint::from_wire_list(raw)
    }

    /// Number of computed points, from the alpha column alone.
    pub async fn point_count(&self) -> Result<usize> {
        Ok(self.polar_fields(&[PolarResultField::Alpha]).await?.len())
    }

    /// Run the polar over `sweep` and return the requested columns.
    ///
    /// An empty `fields` requests every column. Switches the server to direct analysis first.
    pub async fn run_analysis(
        &self,
        sequence_type: SequenceType,
        sweep: Sweep,
        fields: &[PolarResultField],
    ) -> Result<PolarResult> {
        let polar = self.live()?.to_wire()?;
        let settings = AnalysisSettings2D::new(sequence_type, sweep);

        ModeGate::new(self.session.clone())
            .set(AppMode::DirectAnalysis)
            .await?;
        debug!(
            "Analyzing polar '{}' of '{}' over {:?}",
            self.name(),
            self.foil_name,
            sweep
        );
        let raw = self
            .session
            .call(
                "analyzePolar",
                vec![polar, serde_json::to_value(&settings)?, field_codes(fields)],
            )
            .await?;
        PolarResult::from_wire(raw)
    }

    /// Delete the polar on the server.
    ///
    /// The handle is marked deleted whatever the outcome of the call.
    pub async fn delete(&mut self) -> Result<()> {
        let args = self.identity()?;
        let name = self.name().to_string();
        self.state = AnalysisState::Deleted { polar: name };
        self.session.call("deletePolar", args).await?;
        Ok(())
    }

    /// One-line description, read fresh from the server.
    pub async fn describe(&self) -> Result<String> {
        let parameters = self.parameters().await?;
        Ok(format!(
            "{} Type:{:?} Analysis",
            parameters.name, parameters.spec.polar_type
        ))
    }
}

impl std::fmt::Display for Analysis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<XflrPolar>(foil:{} name:{})", self.foil_name, self.name())?;
        if self.is_deleted() {
            write!(f, " deleted")?;
        }
        Ok(())
    }
}

/// An empty selection means every column.
fn field_codes(fields: &[PolarResultField]) -> Value {
    let fields = if fields.is_empty() {
        PolarResultField::ALL
    } else {
        fields
    };
    Value::Array(fields.iter().map(|f| json!(f.code())).collect())
}

/// The polars of one foil.
#[derive(Debug, Clone)]
pub struct AnalysisManager {
    session: Session,
    foil_name: String,
}

impl AnalysisManager {
    pub fn new(session: Session, foil_name: impl Into<String>) -> Self {
        Self {
            session,
            foil_name: foil_name.into(),
        }
    }

    pub fn foil_name(&self) -> &str {
        &self.foil_name
    }

    /// Define a new polar on this foil. An empty name lets the server pick one.
    pub async fn create(&self, name: &str, spec: PolarSpec) -> Result<Analysis> {
        Analysis::define(&self.session, &self.foil_name, name, spec).await
    }
}

#[async_trait::async_trait]
impl RemoteCollection for AnalysisManager {
    type Item = Analysis;
    const KIND: &'static str = "analysis";

    async fn fetch(&self) -> Result<Snapshot<Analysis>> {
        let raw = self
            .session
            .call("polarList", vec![json!(self.foil_name)])
            .await?;
        let items = PolarData::from_wire_list(raw)?.into_iter().map(|polar| {
            (
                polar.name.clone(),
                Analysis::from_polar(self.session.clone(), polar),
            )
        });
        Ok(unique_by_name(Self::KIND, items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_requires_an_identity() {
        let err = Analysis::bind(Session::new(), None, None).unwrap_err();
        assert!(matches!(err, XflrError::AnalysisIdentity { .. }));
    }

    #[test]
    fn test_bind_rejects_mismatched_foil() {
        let polar = PolarData {
            name: "T1".into(),
            foil_name: "NACA 0012".into(),
            ..Default::default()
        };
        let err = Analysis::bind(Session::new(), Some("NACA 2412"), Some(polar)).unwrap_err();
        assert!(matches!(err, XflrError::AnalysisIdentity { .. }));
    }

    #[test]
    fn test_bind_with_foil_only() {
        let analysis = Analysis::bind(Session::new(), Some("NACA 0012"), None).unwrap();
        assert_eq!(analysis.foil_name(), "NACA 0012");
        assert_eq!(analysis.name(), "");
        assert!(!analysis.is_deleted());
    }

    #[tokio::test]
    async fn test_deleted_analysis_fails_before_any_call() {
        let session = Session::new();
        let polar = PolarData {
            name: "T1".into(),
            foil_name: "NACA 0012".into(),
            ..Default::default()
        };
        let mut analysis = Analysis::bind(session.clone(), None, Some(polar)).unwrap();

        // Not connected: the call fails, yet the handle is marked deleted.
        assert!(analysis.delete().await.is_err());
        assert!(analysis.is_deleted());
        let calls = session.call_count();

        for _ in 0..2 {
            assert!(matches!(
                analysis.parameters().await,
                Err(XflrError::AnalysisDeleted { .. })
            ));
            assert!(matches!(
                analysis.describe().await,
                Err(XflrError::AnalysisDeleted { .. })
            ));
        }
        assert!(matches!(
            analysis.point_count().await,
            Err(XflrError::AnalysisDeleted { .. })
        ));
        assert!(matches!(
            analysis
                .run_analysis(SequenceType::Alpha, Sweep::default(), &[])
                .await,
            Err(XflrError::AnalysisDeleted { .. })
        ));
        assert_eq!(session.call_count(), calls);
        assert_eq!(analysis.to_string(), "<XflrPolar>(foil:NACA 0012 name:T1) deleted");
    }
}
