//! Curve display style.

use crate::wire::{wire_enum, Extra, WireEntity};
use serde::{Deserialize, Serialize};

wire_enum! {
    pub enum StippleType {
        #[default]
        Solid = 0,
        Dash = 1,
        Dot = 2,
        DashDot = 3,
        DashDotDot = 4,
        NoLine = 5,
    }
}

wire_enum! {
    pub enum PointStyle {
        #[default]
        NoSymbol = 0,
        LittleCircle = 1,
        BigCircle = 2,
        LittleSquare = 3,
        BigSquare = 4,
        Triangle = 5,
        TriangleInv = 6,
        LittleCircleFilled = 7,
        BigCircleFilled = 8,
        LittleSquareFilled = 9,
        BigSquareFilled = 10,
        TriangleFilled = 11,
        TriangleInvFilled = 12,
        LittleCross = 13,
        BigCross = 14,
    }
}

/// Line style of a foil curve (`getLineStyle` / `setLineStyle`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineStyle {
    pub visible: bool,
    pub stipple: StippleType,
    pub point_style: PointStyle,
    pub width: u32,
    /// RGB(A) components; empty lets the server choose.
    pub color: Vec<u8>,
    pub tag: String,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            visible: true,
            stipple: StippleType::Solid,
            point_style: PointStyle::NoSymbol,
            width: 1,
            color: Vec::new(),
            tag: String::new(),
            extra: Extra::new(),
        }
    }
}

impl WireEntity for LineStyle {
    const KIND: &'static str = "line style";
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_style_codes_round_trip_as_integers() {
        let style = LineStyle {
            visible: false,
            stipple: StippleType::DashDot,
            point_style: PointStyle::BigCross,
            ..Default::default()
        };
        let wire = style.to_wire().unwrap();
        assert_eq!(wire["stipple"], json!(3));
        assert_eq!(wire["point_style"], json!(14));
        assert_eq!(wire["visible"], json!(false));
    }

    #[test]
    fn test_defaults_are_visible_solid() {
        let style = LineStyle::from_wire(json!({})).unwrap();
        assert!(style.visible);
        assert_eq!(style.stipple, StippleType::Solid);
        assert_eq!(style.width, 1);
    }
}
