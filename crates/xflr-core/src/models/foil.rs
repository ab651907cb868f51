//! Airfoil snapshot.

use crate::wire::{Extra, WireEntity};
use serde::{Deserialize, Serialize};

/// One `(x, y)` coordinate of a foil outline.
pub type Point = [f64; 2];

/// Foil fields as reported by `getFoil` / `foilList`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FoilData {
    pub name: String,
    /// Maximum camber, fraction of chord.
    pub camber: f64,
    /// Chordwise position of maximum camber.
    pub camber_x: f64,
    /// Maximum thickness, fraction of chord.
    pub thickness: f64,
    /// Chordwise position of maximum thickness.
    pub thickness_x: f64,
    /// Number of outline points.
    pub n: u32,
    #[serde(flatten)]
    pub extra: Extra,
}

impl WireEntity for FoilData {
    const KIND: &'static str = "foil";
}

impl FoilData {
    /// Whether the shape parameters match. Coordinates are compared
    /// separately since they are not part of the snapshot.
    pub fn same_parameters(&self, other: &FoilData) -> bool {
        self.camber == other.camber
            && self.camber_x == other.camber_x
            && self.thickness == other.thickness
            && self.thickness_x == other.thickness_x
            && self.n == other.n
    }
}

/// Render a foil in Selig `.dat` format: name line, then one `x y` pair per line.
pub fn render_dat(name: &str, points: &[Point], newline: &str) -> String {
    let mut text = String::with_capacity(name.len() + points.len() * 24);
    text.push_str(name);
    text.push_str(newline);
    for [x, y] in points {
        text.push_str(&format!("  {:.6}  {:.6}{}", x, y, newline));
    }
    text
}
