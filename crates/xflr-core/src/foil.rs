//! Foil proxies and the foil manager.
//!
//! A [`Foil`] is a snapshot of one server foil plus the session it came
//! from. Reads of the snapshot never talk to the server; every mutation
//! issues exactly one mutating call and then refreshes the whole snapshot
//! by name, so a proxy reflects the server as of its last mutation or
//! [`Foil::refresh`]. Other proxies for the same foil are not updated.

use crate::analysis::AnalysisManager;
use crate::collection::{unique_by_name, RemoteCollection, Snapshot};
use crate::config::FoilConfig;
use crate::models::foil::render_dat;
use crate::models::{BatchAnalysisSettings, FoilData, LineStyle, Point};
use crate::modes::{AppMode, ModeGate};
use crate::session::Session;
use crate::wire::{decode, value_kind, WireEntity};
use crate::{Result, XflrError};
use serde_json::{json, Value};
use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Shape parameters accepted by `setGeom`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FoilGeometry {
    pub camber: f64,
    pub camber_x: f64,
    pub thickness: f64,
    pub thickness_x: f64,
}

impl From<&FoilData> for FoilGeometry {
    fn from(data: &FoilData) -> Self {
        Self {
            camber: data.camber,
            camber_x: data.camber_x,
            thickness: data.thickness,
            thickness_x: data.thickness_x,
        }
    }
}

#[derive(Debug, Clone)]
enum FoilState {
    Live(FoilData),
    Deleted { name: String },
}

/// Handle to one server foil.
#[derive(Debug, Clone)]
pub struct Foil {
    session: Session,
    state: FoilState,
}

impl Foil {
    pub(crate) fn new(session: Session, data: FoilData) -> Self {
        Self {
            session,
            state: FoilState::Live(data),
        }
    }

    /// Fetch the foil called `name` with `getFoil`.
    pub(crate) async fn fetch(session: &Session, name: &str) -> Result<Self> {
        let raw = session.call("getFoil", vec![json!(name)]).await?;
        Ok(Self::new(session.clone(), FoilData::from_wire(raw)?))
    }

    pub fn name(&self) -> &str {
        match &self.state {
            FoilState::Live(data) => &data.name,
            FoilState::Deleted { name } => name,
        }
    }

    /// Snapshot from the last refresh.
    pub fn data(&self) -> Result<&FoilData> {
        match &self.state {
            FoilState::Live(data) => Ok(data),
            FoilState::Deleted { name } => Err(XflrError::FoilDeleted { name: name.clone() }),
        }
    }

    pub fn is_deleted(&self) -> bool {
        matches!(self.state, FoilState::Deleted { .. })
    }

    /// Current shape parameters, a starting point for [`Foil::set_geometry`].
    pub fn geometry(&self) -> Result<FoilGeometry> {
        Ok(FoilGeometry::from(self.data()?))
    }

    /// Re-read the whole snapshot from the server.
    pub async fn refresh(&mut self) -> Result<()> {
        let name = self.data()?.name.clone();
        self.refresh_as(&name).await
    }

    async fn refresh_as(&mut self, name: &str) -> Result<()> {
        let raw = self.session.call("getFoil", vec![json!(name)]).await?;
        self.state = FoilState::Live(FoilData::from_wire(raw)?);
        Ok(())
    }

    pub async fn rename(&mut self, new_name: &str) -> Result<()> {
        let old = self.data()?.name.clone();
        self.session
            .call("renameFoil", vec![json!(old), json!(new_name)])
            .await?;
        debug!("Renamed foil '{}' to '{}'", old, new_name);
        self.refresh_as(new_name).await
    }

    /// Copy the foil under `new_name` and return a proxy for the copy.
    pub async fn duplicate(&self, new_name: &str) -> Result<Foil> {
        let name = self.data()?.name.clone();
        let raw = self
            .session
            .call("duplicateFoil", vec![json!(name), json!(new_name)])
            .await?;
        Ok(Foil::new(self.session.clone(), FoilData::from_wire(raw)?))
    }

    /// Delete the foil on the server.
    ///
    /// The proxy is marked deleted whatever the outcome of the call; later
    /// operations on it fail with `FoilDeleted`.
    pub async fn delete(&mut self) -> Result<()> {
        let name = self.data()?.name.clone();
        self.state = FoilState::Deleted { name: name.clone() };
        self.session.call("deleteFoil", vec![json!(name)]).await?;
        Ok(())
    }

    /// Replace the outline.
    pub async fn set_coordinates(&mut self, points: &[Point], update_gui: bool) -> Result<()> {
        let name = self.data()?.name.clone();
        self.session
            .call(
                "setFoilCoords",
                vec![json!(name), json!(points), json!(update_gui)],
            )
            .await?;
        self.refresh_as(&name).await
    }

    /// Regenerate the outline from shape parameters.
    pub async fn set_geometry(&mut self, geometry: FoilGeometry) -> Result<()> {
        let name = self.data()?.name.clone();
        self.session
            .call(
                "setGeom",
                vec![
                    json!(name),
                    json!(geometry.camber),
                    json!(geometry.camber_x),
                    json!(geometry.thickness),
                    json!(geometry.thickness_x),
                ],
            )
            .await?;
        self.refresh_as(&name).await
    }

    pub async fn normalize(&mut self) -> Result<()> {
        self.mutate("normalizeFoil").await
    }

    pub async fn derotate(&mut self) -> Result<()> {
        self.mutate("derotateFoil").await
    }

    async fn mutate(&mut self, method: &str) -> Result<()> {
        let name = self.data()?.name.clone();
        self.session.call(method, vec![json!(name)]).await?;
        self.refresh_as(&name).await
    }

    /// Outline points, fetched fresh.
    pub async fn coordinates(&self) -> Result<Vec<Point>> {
        let name = self.data()?.name.clone();
        let raw = self.session.call("getFoilCoords", vec![json!(name)]).await?;
        decode("foil coordinates", raw)
    }

    /// Have the server write the foil to `path` on its file system.
    pub async fn export(&self, path: &str) -> Result<()> {
        let name = self.data()?.name.clone();
        self.session
            .call("exportFoil", vec![json!(name), json!(path)])
            .await?;
        Ok(())
    }

    /// Render the foil as `.dat` text from freshly fetched coordinates.
    pub async fn to_dat(&self, newline: &str) -> Result<String> {
        let points = self.coordinates().await?;
        Ok(render_dat(self.name(), &points, newline))
    }

    /// Make the foil the server's current foil. Nothing is sent unless
    /// `set_current` is true.
    pub async fn select(&self, set_current: bool, select_in_gui: bool) -> Result<()> {
        let name = self.data()?.name.clone();
        if set_current {
            self.session
                .call("setCurFoil", vec![json!(name), json!(select_in_gui)])
                .await?;
        }
        Ok(())
    }

    pub async fn style(&self) -> Result<LineStyle> {
        let name = self.data()?.name.clone();
        let raw = self.session.call("getLineStyle", vec![json!(name)]).await?;
        LineStyle::from_wire(raw)
    }

    pub async fn set_style(&self, style: &LineStyle) -> Result<()> {
        let name = self.data()?.name.clone();
        self.session
            .call("setLineStyle", vec![json!(name), style.to_wire()?])
            .await?;
        Ok(())
    }

    pub async fn is_visible(&self) -> Result<bool> {
        Ok(self.style().await?.visible)
    }

    pub async fn show(&self) -> Result<()> {
        self.set_visibility(true).await
    }

    pub async fn hide(&self) -> Result<()> {
        self.set_visibility(false).await
    }

    async fn set_visibility(&self, visible: bool) -> Result<()> {
        let name = self.data()?.name.clone();
        self.session
            .call("showFoil", vec![json!(name), json!(visible)])
            .await?;
        Ok(())
    }

    /// Same shape: equal parameters, point count and full coordinate
    /// sequence. Names are not compared.
    pub async fn equals(&self, other: &Foil) -> Result<bool> {
        if !self.data()?.same_parameters(other.data()?) {
            return Ok(false);
        }
        Ok(self.coordinates().await? == other.coordinates().await?)
    }

    /// Polars defined on this foil.
    pub fn analyses(&self) -> Result<AnalysisManager> {
        let name = self.data()?.name.clone();
        Ok(AnalysisManager::new(self.session.clone(), name))
    }
}

impl std::fmt::Display for Foil {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.state {
            FoilState::Live(data) => write!(f, "<Foil {}, {} coordinates>", data.name, data.n),
            FoilState::Deleted { name } => write!(f, "<Foil {}, deleted>", name),
        }
    }
}

/// NACA designation given as a number or as text.
#[derive(Debug, Clone, PartialEq)]
pub enum NacaCode {
    Number(i64),
    Text(String),
}

impl NacaCode {
    /// Validated 1 to 4 digit value.
    pub fn digits(&self) -> Result<i64> {
        let invalid = || XflrError::InvalidNacaCode {
            value: self.to_string(),
        };
        let digits = match self {
            NacaCode::Number(n) => *n,
            NacaCode::Text(s) => s.trim().parse::<i64>().map_err(|_| invalid())?,
        };
        if !(FoilConfig::NACA_MIN..=FoilConfig::NACA_MAX).contains(&digits) {
            return Err(invalid());
        }
        Ok(digits)
    }

    /// Name the server gives the foil by default, e.g. `NACA 0012`.
    pub fn default_name(digits: i64) -> String {
        format!("{}{:04}", FoilConfig::NACA_NAME_PREFIX, digits)
    }
}

impl std::fmt::Display for NacaCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NacaCode::Number(n) => write!(f, "{}", n),
            NacaCode::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for NacaCode {
    fn from(n: i64) -> Self {
        NacaCode::Number(n)
    }
}

impl From<&str> for NacaCode {
    fn from(s: &str) -> Self {
        NacaCode::Text(s.to_string())
    }
}

impl From<String> for NacaCode {
    fn from(s: String) -> Self {
        NacaCode::Text(s)
    }
}

/// Manages the server's foils: listing, loading, NACA generation and
/// fan-out operations over every foil.
#[derive(Debug, Clone)]
pub struct FoilManager {
    session: Session,
    modes: ModeGate,
}

impl FoilManager {
    pub fn new(session: Session) -> Self {
        let modes = ModeGate::new(session.clone());
        Self { session, modes }
    }

    /// Fetch one foil by name. Absent names fail with `NotFound`.
    pub async fn get(&self, name: &str) -> Result<Foil> {
        if !self.contains(name).await? {
            return Err(XflrError::NotFound {
                kind: Self::KIND,
                key: name.to_string(),
            });
        }
        Foil::fetch(&self.session, name).await
    }

    /// Load `.dat` files that live on the server's file system.
    ///
    /// All paths are checked first: a wrong extension or a path the server
    /// cannot see aborts the whole load before anything is loaded. Valid
    /// lists are then loaded one `loadProject` call per path, in order.
    pub async fn load<P: AsRef<str>>(&self, paths: &[P]) -> Result<()> {
        self.modes.set(AppMode::FoilDesign).await?;

        let paths: Vec<&str> = paths.iter().map(|p| p.as_ref()).collect();
        for path in &paths {
            if !has_dat_extension(path) {
                return Err(XflrError::InvalidFoilPath {
                    path: path.to_string(),
                    reason: format!("not a {} file", FoilConfig::DAT_EXTENSION),
                });
            }
        }

        let valid = self.validate_file_paths(&paths).await?;
        if let Some((path, _)) = paths.iter().zip(&valid).find(|(_, ok)| !**ok) {
            return Err(XflrError::InvalidFoilPath {
                path: path.to_string(),
                reason: "file does not exist on the server".to_string(),
            });
        }

        for path in &paths {
            self.session
                .call("loadProject", vec![json!([path])])
                .await?;
        }
        info!("Loaded {} foil file(s)", paths.len());
        Ok(())
    }

    /// Load every regular file directly inside `dir`.
    ///
    /// Files rejected as invalid foil paths are skipped. Returns the loaded
    /// paths in file-name order.
    pub async fn load_folder(&self, dir: impl AsRef<Path>) -> Result<Vec<String>> {
        let dir = dir.as_ref();
        self.modes.set(AppMode::FoilDesign).await?;

        let mut loaded = Vec::new();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| XflrError::Io {
                message: e.to_string(),
                path: Some(dir.to_path_buf()),
                source: None,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path().to_string_lossy().into_owned();
            match self.load(&[path.as_str()]).await {
                Ok(()) => loaded.push(path),
                Err(XflrError::InvalidFoilPath { path, reason }) => {
                    warn!("Skipping {}: {}", path, reason);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(loaded)
    }

    /// Generate a NACA 4-digit foil and return it.
    ///
    /// An existing foil with the same name is overwritten by the server.
    pub async fn create_naca(
        &self,
        code: impl Into<NacaCode>,
        name: Option<&str>,
    ) -> Result<Foil> {
        let code: NacaCode = code.into();
        let digits = code.digits()?;
        let name = match name {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => NacaCode::default_name(digits),
        };
        self.modes.set(AppMode::FoilDesign).await?;
        self.session
            .call("createNACAFoil", vec![json!(digits), json!(name)])
            .await?;
        self.get(&name).await
    }

    /// Delete every foil, one call per foil.
    pub async fn delete_all(&self) -> Result<()> {
        for mut foil in self.to_list().await? {
            foil.delete().await?;
        }
        Ok(())
    }

    pub async fn show_all(&self) -> Result<()> {
        for foil in self.to_list().await? {
            foil.show().await?;
        }
        Ok(())
    }

    pub async fn hide_all(&self) -> Result<()> {
        for foil in self.to_list().await? {
            foil.hide().await?;
        }
        Ok(())
    }

    /// Run a batch analysis. An empty foil list means every foil.
    pub async fn run_batch_analysis(&self, mut settings: BatchAnalysisSettings) -> Result<()> {
        if settings.foil_names.is_empty() {
            settings.foil_names = self.names().await?;
        }
        debug!(
            "Batch analysis of {} foil(s) at {} Reynolds number(s)",
            settings.foil_names.len(),
            settings.re_list.len()
        );
        self.session
            .call("batchAnalyze", vec![serde_json::to_value(&settings)?])
            .await?;
        Ok(())
    }

    /// One `validateFilePaths` round trip. The server answers one entry per
    /// path, each a sequence whose first element is the verdict.
    async fn validate_file_paths(&self, paths: &[&str]) -> Result<Vec<bool>> {
        let raw = self
            .session
            .call("validateFilePaths", vec![json!(paths)])
            .await?;
        let entries = match raw {
            Value::Array(entries) => entries,
            other => {
                return Err(XflrError::Protocol {
                    message: format!(
                        "validateFilePaths returned a {}",
                        value_kind(&other)
                    ),
                })
            }
        };
        if entries.len() != paths.len() {
            return Err(XflrError::Protocol {
                message: format!(
                    "validateFilePaths returned {} verdicts for {} paths",
                    entries.len(),
                    paths.len()
                ),
            });
        }
        Ok(entries
            .iter()
            .map(|entry| match entry {
                Value::Array(items) => items.first().and_then(Value::as_bool).unwrap_or(false),
                other => other.as_bool().unwrap_or(false),
            })
            .collect())
    }
}

#[async_trait::async_trait]
impl RemoteCollection for FoilManager {
    type Item = Foil;
    const KIND: &'static str = "foil";

    async fn fetch(&self) -> Result<Snapshot<Foil>> {
        let raw = self.session.call("foilList", Vec::new()).await?;
        let items = FoilData::from_wire_list(raw)?
            .into_iter()
            .map(|data| (data.name.clone(), Foil::new(self.session.clone(), data)));
        Ok(unique_by_name(Self::KIND, items))
    }
}

fn has_dat_extension(path: &str) -> bool {
    let ext = FoilConfig::DAT_EXTENSION;
    path.len() >= ext.len()
        && path
            .get(path.len() - ext.len()..)
            .is_some_and(|tail| tail.eq_ignore_ascii_case(ext))
}
