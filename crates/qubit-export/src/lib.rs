//! qubit-export: Serialize qubit layout polygons into field-solver input decks
//!
//! This crate provides:
//! - Ear-clipping triangulation of simple layout polygons
//! - FastHenry inductance decks (node + element convention)
//! - FasterCap 3-D capacitance decks (triangle patches)
//! - FasterCap 2-D capacitance decks (segments + file references)
//! - Collision-free numbered output files that are never overwritten
//!
//! The layout layer hands over flat lists of polygons; every deck is written
//! once to a fresh file and never read back.

pub mod allocate;
pub mod cpw;
pub mod deck;
pub mod error;
pub mod fastercap;
pub mod fasthenry;
pub mod geometry;
pub mod triangulate;

pub use allocate::{Allocation, FileAllocator, NamePattern, MAX_ATTEMPTS};
pub use cpw::{CoplanarWaveguide, CpwProperties};
pub use deck::{Deck, DeckFormat};
pub use error::{ExportError, Result};
pub use fastercap::{render_fastercap_2d, render_fastercap_3d, write_fastercap_2d, write_fastercap_3d};
pub use fasthenry::{render_fasthenry, write_fasthenry};
pub use geometry::{Conductor, Polygon, PolygonScene, SceneEntry, Vertex};
pub use triangulate::{triangulate, Triangle};

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Configuration for FastHenry inductance decks
#[derive(Debug, Clone)]
pub struct InductanceConfig {
    /// Length unit declared in the `.units` directive (default: µm)
    pub units: LengthUnit,
    /// Default conductor width `w`
    pub line_width: f64,
    /// Default conductor height `h`
    pub line_height: f64,
    /// Filaments across the width (`nwinc`)
    pub width_discretization: u32,
    /// Filaments across the height (`nhinc`)
    pub height_discretization: u32,
}

impl Default for InductanceConfig {
    fn default() -> Self {
        Self {
            units: LengthUnit::Micrometer,
            line_width: 2.0,
            line_height: 0.1,
            width_discretization: 7,
            height_discretization: 7,
        }
    }
}

/// Configuration for FasterCap 3-D decks
#[derive(Debug, Clone)]
pub struct CapacitanceConfig {
    /// z coordinate of every triangle vertex; the layout sits on one plane
    pub elevation: f64,
}

impl Default for CapacitanceConfig {
    fn default() -> Self {
        Self { elevation: 10.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LengthUnit {
    #[serde(rename = "km")]
    Kilometer,
    #[serde(rename = "m")]
    Meter,
    #[serde(rename = "cm")]
    Centimeter,
    #[serde(rename = "mm")]
    Millimeter,
    #[default]
    #[serde(rename = "um")]
    Micrometer,
    #[serde(rename = "nm")]
    Nanometer,
    #[serde(rename = "in")]
    Inch,
    #[serde(rename = "mils")]
    Mil,
}

impl LengthUnit {
    fn meters_per_unit(&self) -> f64 {
        match self {
            LengthUnit::Kilometer => 1e3,
            LengthUnit::Meter => 1.0,
            LengthUnit::Centimeter => 1e-2,
            LengthUnit::Millimeter => 1e-3,
            LengthUnit::Micrometer => 1e-6,
            LengthUnit::Nanometer => 1e-9,
            LengthUnit::Inch => 0.0254,
            LengthUnit::Mil => 0.0254e-3,
        }
    }

    /// Convert from this unit to meters
    pub fn to_meters(&self, value: f64) -> f64 {
        value * self.meters_per_unit()
    }

    /// Convert from meters to this unit
    pub fn from_meters(&self, value: f64) -> f64 {
        value / self.meters_per_unit()
    }

    /// Get scale factor to convert from one unit to another
    pub fn scale_to(&self, target: &LengthUnit) -> f64 {
        target.from_meters(self.to_meters(1.0))
    }

    /// Keyword accepted by FastHenry's `.units` directive, if it has one
    pub fn fasthenry_keyword(&self) -> Option<&'static str> {
        match self {
            LengthUnit::Kilometer => Some("km"),
            LengthUnit::Meter => Some("m"),
            LengthUnit::Centimeter => Some("cm"),
            LengthUnit::Millimeter => Some("mm"),
            LengthUnit::Micrometer => Some("um"),
            LengthUnit::Inch => Some("in"),
            LengthUnit::Mil => Some("mils"),
            LengthUnit::Nanometer => None,
        }
    }
}

impl FromStr for LengthUnit {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "km" | "kilometer" | "kilometers" => Ok(LengthUnit::Kilometer),
            "m" | "meter" | "meters" => Ok(LengthUnit::Meter),
            "cm" | "centimeter" | "centimeters" => Ok(LengthUnit::Centimeter),
            "mm" | "millimeter" | "millimeters" => Ok(LengthUnit::Millimeter),
            "um" | "µm" | "micrometer" | "micrometers" => Ok(LengthUnit::Micrometer),
            "nm" | "nanometer" | "nanometers" => Ok(LengthUnit::Nanometer),
            "in" | "inch" | "inches" => Ok(LengthUnit::Inch),
            "mil" | "mils" => Ok(LengthUnit::Mil),
            _ => Err(ExportError::InvalidParameter(format!(
                "unknown unit: {}. Use: km, m, cm, mm, um, nm, in or mils",
                s
            ))),
        }
    }
}
