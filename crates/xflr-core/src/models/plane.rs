//! Plane geometry, plane detail and 3D polar types.

use crate::models::polar::{PolarType, Sweep};
use crate::wire::{wire_enum, Extra, WireEntity};
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::warn;

wire_enum! {
    pub enum WingType {
        #[default]
        Main = 0,
        Second = 1,
        Elevator = 2,
        Fin = 3,
    }
}

wire_enum! {
    /// Solver used for a 3D analysis.
    pub enum AnalysisMethod {
        Llt = 0,
        #[default]
        Vlm = 1,
        Panel4 = 2,
        TriLinear = 3,
        TriUniform = 4,
    }
}

wire_enum! {
    /// How reference area, chord and span are derived.
    pub enum RefDimension {
        Planform = 0,
        #[default]
        Projected = 1,
        Manual = 2,
    }
}

wire_enum! {
    /// Columns that can be requested from a 3D polar result.
    pub enum WPolarResultField {
        #[default]
        Alpha = 0,
        Cl = 1,
        XCpCl = 2,
        Cd = 3,
        Cdp = 4,
        Cm = 5,
        ICd = 6,
        Sm = 7,
        Fx = 8,
        Fy = 9,
        ClCd = 10,
        Cl32Cd = 11,
        Fz = 12,
        QInf = 13,
    }
}

/// One spanwise segment of a wing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WingSection {
    /// Spanwise position (m).
    pub y_position: f64,
    /// Length in the longitudinal direction (m).
    pub chord: f64,
    /// Leading edge x position (m).
    pub offset: f64,
    /// Dihedral up to the next section (deg).
    pub dihedral: f64,
    /// Twist about the longitudinal axis (deg).
    pub twist: f64,
    pub right_foil_name: String,
    pub left_foil_name: String,
    pub n_x_panels: u32,
    pub x_panel_dist: i64,
    pub n_y_panels: u32,
    pub y_panel_dist: i64,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Default for WingSection {
    fn default() -> Self {
        Self {
            y_position: 0.0,
            chord: 0.1,
            offset: 0.05,
            dihedral: 0.0,
            twist: 0.0,
            right_foil_name: String::new(),
            left_foil_name: String::new(),
            n_x_panels: 7,
            x_panel_dist: 0,
            n_y_panels: 7,
            y_panel_dist: 0,
            extra: Extra::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Wing {
    #[serde(rename = "type")]
    pub wing_type: WingType,
    pub sections: Vec<WingSection>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Wing {
    pub fn new(wing_type: WingType) -> Self {
        Self {
            wing_type,
            ..Default::default()
        }
    }

    /// Half span, from the outermost section.
    pub fn semi_span(&self) -> f64 {
        self.sections
            .iter()
            .map(|s| s.y_position)
            .fold(0.0, f64::max)
    }
}

fn main_wing() -> Wing {
    Wing::new(WingType::Main)
}

fn second_wing() -> Wing {
    Wing::new(WingType::Second)
}

fn elevator() -> Wing {
    Wing::new(WingType::Elevator)
}

fn fin() -> Wing {
    Wing::new(WingType::Fin)
}

/// Plane snapshot as reported by `getPlanes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaneData {
    #[serde(default)]
    pub name: String,
    #[serde(default = "main_wing")]
    pub wing: Wing,
    #[serde(default = "second_wing")]
    pub wing2: Wing,
    #[serde(default = "elevator")]
    pub elevator: Wing,
    #[serde(default = "fin")]
    pub fin: Wing,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Default for PlaneData {
    fn default() -> Self {
        Self {
            name: String::new(),
            wing: main_wing(),
            wing2: second_wing(),
            elevator: elevator(),
            fin: fin(),
            extra: Extra::new(),
        }
    }
}

impl WireEntity for PlaneData {
    const KIND: &'static str = "plane";
}

/// One quantity of a plane detail report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaneQuantity {
    pub value: f64,
    pub unit: String,
}

/// Parsed `getPlaneData` report: one quantity per `key = value unit` line,
/// in server order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlaneDetail {
    pub quantities: IndexMap<String, PlaneQuantity>,
}

/// `key = value unit` line of a plane detail report.
static QUANTITY_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([^=]+?)\s*=\s*(-?[0-9]*\.?[0-9]+(?:[eE][-+]?[0-9]+)?)\s*(.*?)\s*$")
        .unwrap()
});

impl PlaneDetail {
    /// Parse the report. Blank lines are ignored; lines that do not match
    /// `key = value unit` are logged and skipped.
    pub fn parse(text: &str) -> Self {
        let mut quantities = IndexMap::new();
        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let parsed = QUANTITY_LINE.captures(line).and_then(|caps| {
                let value = caps[2].parse::<f64>().ok()?;
                Some((
                    caps[1].to_string(),
                    PlaneQuantity {
                        value,
                        unit: caps[3].to_string(),
                    },
                ))
            });
            match parsed {
                Some((key, quantity)) => {
                    quantities.insert(key, quantity);
                }
                None => warn!("Skipping unparseable plane detail line: {:?}", line),
            }
        }
        Self { quantities }
    }

    pub fn get(&self, key: &str) -> Option<&PlaneQuantity> {
        self.quantities.get(key)
    }

    pub fn value(&self, key: &str) -> Option<f64> {
        self.get(key).map(|q| q.value)
    }

    pub fn len(&self) -> usize {
        self.quantities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quantities.is_empty()
    }
}

/// Definition of a 3D polar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WPolarSpec {
    pub polar_type: PolarType,
    /// m/s
    pub free_stream_speed: f64,
    /// Angle of attack (deg).
    pub alpha: f64,
    /// Sideslip angle (deg).
    pub beta: f64,
    pub analysis_method: AnalysisMethod,
    pub is_viscous: bool,
    // Field name matches the server's spelling.
    pub use_plane_intertia: bool,
    /// kg
    pub plane_mass: f64,
    pub x_cog: f64,
    pub z_cog: f64,
    pub ref_dimension: RefDimension,
    pub ref_area: f64,
    pub ref_chord: f64,
    pub ref_span: f64,
    /// kg/m3
    pub density: f64,
    /// m2/s
    pub kinematic_viscosity: f64,
    pub is_ground_effect: bool,
    /// Height above ground (m), used with ground effect.
    pub height: f64,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Default for WPolarSpec {
    fn default() -> Self {
        Self {
            polar_type: PolarType::FixedSpeed,
            free_stream_speed: 10.0,
            alpha: 0.0,
            beta: 0.0,
            analysis_method: AnalysisMethod::Vlm,
            is_viscous: true,
            use_plane_intertia: true,
            plane_mass: 0.0,
            x_cog: 0.0,
            z_cog: 0.0,
            ref_dimension: RefDimension::Projected,
            ref_area: 0.0,
            ref_chord: 0.0,
            ref_span: 0.0,
            density: 1.225,
            kinematic_viscosity: 1.5e-5,
            is_ground_effect: false,
            height: 0.0,
            extra: Extra::new(),
        }
    }
}

impl WireEntity for WPolarSpec {
    const KIND: &'static str = "wpolar spec";
}

/// Columns of a computed 3D polar.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WPolarResult {
    pub alpha: Vec<f64>,
    pub beta: Vec<f64>,
    #[serde(rename = "Q_inf")]
    pub q_inf: Vec<f64>,
    #[serde(rename = "Cl")]
    pub cl: Vec<f64>,
    #[serde(rename = "ClCd")]
    pub cl_cd: Vec<f64>,
    #[serde(rename = "Cl32Cd")]
    pub cl32_cd: Vec<f64>,
    /// Total drag.
    #[serde(rename = "TCd")]
    pub tcd: Vec<f64>,
    /// Induced drag.
    #[serde(rename = "ICd")]
    pub icd: Vec<f64>,
    /// Profile drag.
    #[serde(rename = "PCd")]
    pub pcd: Vec<f64>,
    #[serde(rename = "Cm")]
    pub cm: Vec<f64>,
    #[serde(rename = "ICm")]
    pub icm: Vec<f64>,
    #[serde(rename = "IYm")]
    pub iym: Vec<f64>,
    #[serde(rename = "VCm")]
    pub vcm: Vec<f64>,
    #[serde(rename = "FZ")]
    pub fz: Vec<f64>,
    #[serde(rename = "FX")]
    pub fx: Vec<f64>,
    #[serde(rename = "FY")]
    pub fy: Vec<f64>,
    #[serde(rename = "Rm")]
    pub rm: Vec<f64>,
    #[serde(rename = "Pm")]
    pub pm: Vec<f64>,
    pub max_bending: Vec<f64>,
    /// Neutral point.
    #[serde(rename = "XCpCl")]
    pub xcp_cl: Vec<f64>,
    /// Static margin.
    #[serde(rename = "SM")]
    pub sm: Vec<f64>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl WireEntity for WPolarResult {
    const KIND: &'static str = "wpolar result";
}

impl WPolarResult {
    pub fn len(&self) -> usize {
        self.alpha.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alpha.is_empty()
    }
}

/// A 3D polar: identity, definition and (possibly empty) result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WPolar {
    pub name: String,
    pub plane_name: String,
    pub spec: WPolarSpec,
    pub result: WPolarResult,
    #[serde(flatten)]
    pub extra: Extra,
}

impl WireEntity for WPolar {
    const KIND: &'static str = "wpolar";
}

impl WPolar {
    pub fn new(name: impl Into<String>, plane_name: impl Into<String>, spec: WPolarSpec) -> Self {
        Self {
            name: name.into(),
            plane_name: plane_name.into(),
            spec,
            ..Default::default()
        }
    }
}

/// Settings for one `analyzeWPolar` run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSettings3D {
    pub sequence: Sweep,
    pub is_sequence: bool,
    #[serde(rename = "init_LLT")]
    pub init_llt: bool,
    pub store_opp: bool,
}

impl AnalysisSettings3D {
    pub fn new(sequence: Sweep) -> Self {
        Self {
            sequence,
            is_sequence: sequence.is_sequence(),
            init_llt: true,
            store_opp: true,
        }
    }
}

impl Default for AnalysisSettings3D {
    fn default() -> Self {
        Self::new(Sweep::default())
    }
}
