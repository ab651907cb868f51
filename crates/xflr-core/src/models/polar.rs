//! 2D polar types: specification, run settings, results and operating points.

use crate::config::AnalysisConfig;
use crate::wire::{wire_enum, Extra, WireEntity};
use crate::{Result, XflrError};
use serde::{Deserialize, Serialize};

wire_enum! {
    pub enum PolarType {
        #[default]
        FixedSpeed = 0,
        FixedLift = 1,
        RubberChord = 2,
        FixedAoa = 3,
        Stability = 4,
        Beta = 5,
    }
}

wire_enum! {
    /// Variable swept by an analysis.
    pub enum SequenceType {
        #[default]
        Alpha = 0,
        Cl = 1,
        Reynolds = 2,
    }
}

wire_enum! {
    /// Columns that can be requested from a polar result.
    pub enum PolarResultField {
        #[default]
        Alpha = 0,
        Cl = 1,
        XCp = 2,
        Cd = 3,
        Cdp = 4,
        Cm = 5,
        XTr1 = 6,
        XTr2 = 7,
        HMom = 8,
        Cpmn = 9,
        ClCd = 10,
        Cl32Cd = 11,
        RtCl = 12,
        Re = 13,
    }
}

impl PolarResultField {
    /// Validate a raw field code.
    pub fn from_code(code: i64) -> Result<Self> {
        Self::try_from(code).map_err(|_| XflrError::InvalidResultField { code })
    }

    /// Validate a list of raw field codes; the first unknown code fails the list.
    pub fn from_codes(codes: &[i64]) -> Result<Vec<Self>> {
        codes.iter().map(|&c| Self::from_code(c)).collect()
    }

    /// Every field, the default request.
    pub fn all() -> Vec<Self> {
        Self::ALL.to_vec()
    }
}

/// Sweep of operating points: `start` to `end` by `increment`.
///
/// Travels as a 3-element sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64, f64)", into = "(f64, f64, f64)")]
pub struct Sweep {
    pub start: f64,
    pub end: f64,
    pub increment: f64,
}

impl Sweep {
    pub fn new(start: f64, end: f64, increment: f64) -> Self {
        Self {
            start,
            end,
            increment,
        }
    }

    /// A single operating point.
    pub fn single(value: f64) -> Self {
        Self::new(value, value, 0.0)
    }

    /// The server treats a sweep as a sequence only when both the end and the
    /// increment are non-zero.
    pub fn is_sequence(&self) -> bool {
        self.end != 0.0 && self.increment != 0.0
    }

    /// Points the sweep asks for, endpoints included. A zero span or zero
    /// increment asks for one point. The solver may return fewer when points
    /// fail to converge.
    pub fn nominal_point_count(&self) -> usize {
        let span = (self.end - self.start).abs();
        let step = self.increment.abs();
        if span == 0.0 || step == 0.0 {
            return 1;
        }
        // Tolerate float noise such as 15 / 0.25 landing just under 60.
        (span / step + 1e-9).floor() as usize + 1
    }
}

impl From<(f64, f64, f64)> for Sweep {
    fn from((start, end, increment): (f64, f64, f64)) -> Self {
        Self::new(start, end, increment)
    }
}

impl From<Sweep> for (f64, f64, f64) {
    fn from(sweep: Sweep) -> Self {
        (sweep.start, sweep.end, sweep.increment)
    }
}

/// Definition of a 2D polar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolarSpec {
    pub polar_type: PolarType,
    #[serde(rename = "Re_type")]
    pub re_type: i64,
    pub ma_type: i64,
    pub aoa: f64,
    pub mach: f64,
    pub ncrit: f64,
    pub xtop: f64,
    pub xbot: f64,
    pub reynolds: f64,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Default for PolarSpec {
    fn default() -> Self {
        Self {
            polar_type: PolarType::FixedSpeed,
            re_type: 1,
            ma_type: 1,
            aoa: 0.0,
            mach: 0.0,
            ncrit: AnalysisConfig::DEFAULT_NCRIT,
            xtop: 1.0,
            xbot: 1.0,
            reynolds: AnalysisConfig::DEFAULT_REYNOLDS,
            extra: Extra::new(),
        }
    }
}

impl WireEntity for PolarSpec {
    const KIND: &'static str = "polar spec";
}

impl PolarSpec {
    pub fn with_type(mut self, polar_type: PolarType) -> Self {
        self.polar_type = polar_type;
        self
    }

    pub fn with_reynolds(mut self, reynolds: f64) -> Self {
        self.reynolds = reynolds;
        self
    }

    pub fn with_mach(mut self, mach: f64) -> Self {
        self.mach = mach;
        self
    }

    pub fn with_ncrit(mut self, ncrit: f64) -> Self {
        self.ncrit = ncrit;
        self
    }

    /// Forced transition points on the top and bottom surfaces.
    pub fn with_transition(mut self, xtop: f64, xbot: f64) -> Self {
        self.xtop = xtop;
        self.xbot = xbot;
        self
    }
}

/// Server identity and definition of one polar.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolarData {
    pub name: String,
    pub foil_name: String,
    pub spec: PolarSpec,
    #[serde(flatten)]
    pub extra: Extra,
}

impl WireEntity for PolarData {
    const KIND: &'static str = "polar";
}

/// Settings for one `analyzePolar` run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSettings2D {
    pub sequence_type: SequenceType,
    pub sequence: Sweep,
    pub is_sequence: bool,
    #[serde(rename = "init_BL")]
    pub init_bl: bool,
    pub store_opp: bool,
    pub viscous: bool,
    pub keep_open_on_error: bool,
}

impl AnalysisSettings2D {
    pub fn new(sequence_type: SequenceType, sequence: Sweep) -> Self {
        Self {
            sequence_type,
            sequence,
            is_sequence: sequence.is_sequence(),
            init_bl: true,
            store_opp: true,
            viscous: true,
            keep_open_on_error: false,
        }
    }
}

impl Default for AnalysisSettings2D {
    fn default() -> Self {
        Self::new(SequenceType::Alpha, Sweep::default())
    }
}

/// Columns of a computed polar. Each requested column holds one value per
/// operating point; columns that were not requested are empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolarResult {
    pub alpha: Vec<f64>,
    #[serde(rename = "Cl")]
    pub cl: Vec<f64>,
    #[serde(rename = "XCp")]
    pub xcp: Vec<f64>,
    #[serde(rename = "Cd")]
    pub cd: Vec<f64>,
    #[serde(rename = "Cdp")]
    pub cdp: Vec<f64>,
    #[serde(rename = "Cm")]
    pub cm: Vec<f64>,
    #[serde(rename = "XTr1")]
    pub xtr1: Vec<f64>,
    #[serde(rename = "XTr2")]
    pub xtr2: Vec<f64>,
    #[serde(rename = "HMom")]
    pub hmom: Vec<f64>,
    #[serde(rename = "Cpmn")]
    pub cpmn: Vec<f64>,
    #[serde(rename = "ClCd")]
    pub cl_cd: Vec<f64>,
    #[serde(rename = "Cl32Cd")]
    pub cl32_cd: Vec<f64>,
    #[serde(rename = "RtCl")]
    pub rt_cl: Vec<f64>,
    #[serde(rename = "Re")]
    pub re: Vec<f64>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl WireEntity for PolarResult {
    const KIND: &'static str = "polar result";
}

impl PolarResult {
    /// Number of operating points.
    pub fn len(&self) -> usize {
        self.alpha.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alpha.is_empty()
    }

    pub fn column(&self, field: PolarResultField) -> &[f64] {
        match field {
            PolarResultField::Alpha => &self.alpha,
            PolarResultField::Cl => &self.cl,
            PolarResultField::XCp => &self.xcp,
            PolarResultField::Cd => &self.cd,
            PolarResultField::Cdp => &self.cdp,
            PolarResultField::Cm => &self.cm,
            PolarResultField::XTr1 => &self.xtr1,
            PolarResultField::XTr2 => &self.xtr2,
            PolarResultField::HMom => &self.hmom,
            PolarResultField::Cpmn => &self.cpmn,
            PolarResultField::ClCd => &self.cl_cd,
            PolarResultField::Cl32Cd => &self.cl32_cd,
            PolarResultField::RtCl => &self.rt_cl,
            PolarResultField::Re => &self.re,
        }
    }

    /// Fields that carry data.
    pub fn available_fields(&self) -> Vec<PolarResultField> {
        PolarResultField::ALL
            .iter()
            .copied()
            .filter(|f| !self.column(*f).is_empty())
            .collect()
    }
}

impl std::fmt::Display for PolarResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fields: Vec<String> = self
            .available_fields()
            .iter()
            .map(|field| format!("{:?}", field))
            .collect();
        write!(f, "PolarResult - {} points: {}", self.len(), fields.join(", "))
    }
}

/// One computed operating point.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpPoint {
    pub alpha: f64,
    pub polar_name: String,
    pub foil_name: String,
    #[serde(rename = "Cl")]
    pub cl: f64,
    #[serde(rename = "XCp")]
    pub xcp: f64,
    #[serde(rename = "Cd")]
    pub cd: f64,
    #[serde(rename = "Cdp")]
    pub cdp: f64,
    #[serde(rename = "Cm")]
    pub cm: f64,
    #[serde(rename = "XTr1")]
    pub xtr1: f64,
    #[serde(rename = "XTr2")]
    pub xtr2: f64,
    #[serde(rename = "HMom")]
    pub hmom: f64,
    #[serde(rename = "Cpmn")]
    pub cpmn: f64,
    #[serde(rename = "Re")]
    pub re: f64,
    pub mach: f64,
    #[serde(flatten)]
    pub extra: Extra,
}

impl WireEntity for OpPoint {
    const KIND: &'static str = "operating point";
}

/// Settings for `batchAnalyze`: one sweep over many foils and Reynolds numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchAnalysisSettings {
    pub foil_names: Vec<String>,
    pub re_list: Vec<f64>,
    pub mach: f64,
    pub ncrit: f64,
    pub polar_type: PolarType,
    pub transition_top: f64,
    pub transition_bot: f64,
    /// Sweep alpha when true, Cl otherwise.
    pub range_type_alpha: bool,
    pub min: f64,
    pub max: f64,
    pub increment: f64,
    pub from_zero: bool,
    pub init_bl: bool,
    pub store_op_point: bool,
    pub update_polar_view: bool,
    pub thread_count: u32,
}

impl BatchAnalysisSettings {
    /// Settings for the given Reynolds numbers; the foil list is filled in by
    /// the manager when left empty.
    pub fn new(re_list: Vec<f64>) -> Self {
        let (min, max, increment) = AnalysisConfig::DEFAULT_BATCH_SWEEP;
        Self {
            foil_names: Vec::new(),
            re_list,
            mach: 0.0,
            ncrit: AnalysisConfig::DEFAULT_NCRIT,
            polar_type: PolarType::FixedLift,
            transition_top: 1.0,
            transition_bot: 1.0,
            range_type_alpha: true,
            min,
            max,
            increment,
            from_zero: true,
            init_bl: true,
            store_op_point: false,
            update_polar_view: false,
            thread_count: AnalysisConfig::AUTO_THREAD_COUNT,
        }
    }

    pub fn with_foils<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.foil_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_sweep(mut self, sweep: Sweep) -> Self {
        self.min = sweep.start;
        self.max = sweep.end;
        self.increment = sweep.increment;
        self
    }

    pub fn with_polar_type(mut self, polar_type: PolarType) -> Self {
        self.polar_type = polar_type;
        self
    }

    pub fn sweep(&self) -> Sweep {
        Sweep::new(self.min, self.max, self.increment)
    }
}
