//! Value types mirrored from the server.
//!
//! These are plain snapshots: they carry no connection and never talk to the
//! server themselves. The proxies in [`crate::foil`], [`crate::analysis`] and
//! [`crate::plane`] wrap them with a session.

pub mod foil;
pub mod plane;
pub mod polar;
pub mod style;

pub use foil::{FoilData, Point};
pub use plane::{
    AnalysisMethod, AnalysisSettings3D, PlaneData, PlaneDetail, PlaneQuantity, RefDimension,
    WPolar, WPolarResult, WPolarResultField, WPolarSpec, Wing, WingSection, WingType,
};
pub use polar::{
    AnalysisSettings2D, BatchAnalysisSettings, OpPoint, PolarData, PolarResult,
    PolarResultField, PolarSpec, PolarType, SequenceType, Sweep,
};
pub use style::{LineStyle, PointStyle, StippleType};
