//! Unit conversion utilities
//!
//! Board coordinates are integer nanometres. Handles parsing of values with
//! a unit suffix (`mm`, `um`, `nm`, `mil`, `in`) and formatting for display
//! in the metric or imperial system.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Board coordinate in nanometres
pub type Coord = i64;

/// Nanometres per millimetre
pub const NM_PER_MM: f64 = 1_000_000.0;

/// Nanometres per mil (1/1000 inch)
pub const NM_PER_MIL: f64 = 25_400.0;

/// Converts millimetres to board coordinates.
pub fn mm(value: f64) -> Coord {
    (value * NM_PER_MM).round() as Coord
}

/// Converts mils to board coordinates.
pub fn mil(value: f64) -> Coord {
    (value * NM_PER_MIL).round() as Coord
}

/// Measurement system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementSystem {
    /// Metric system (mm)
    #[default]
    Metric,
    /// Imperial system (mil)
    Imperial,
}

impl fmt::Display for MeasurementSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Metric => write!(f, "Metric"),
            Self::Imperial => write!(f, "Imperial"),
        }
    }
}

impl FromStr for MeasurementSystem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "metric" | "mm" => Ok(Self::Metric),
            "imperial" | "mil" | "inch" | "in" => Ok(Self::Imperial),
            _ => Err(format!("Unknown measurement system: {}", s)),
        }
    }
}

/// Format a coordinate for display
///
/// * `value` - Value in nanometres
/// * `system` - Target measurement system
pub fn format_coord(value: Coord, system: MeasurementSystem) -> String {
    match system {
        MeasurementSystem::Metric => format!("{:.4}mm", value as f64 / NM_PER_MM),
        MeasurementSystem::Imperial => format!("{:.2}mil", value as f64 / NM_PER_MIL),
    }
}

/// Parse a coordinate string with an optional unit suffix.
///
/// A bare number is taken as nanometres. Returns `None` when the number or
/// the unit cannot be understood.
pub fn parse_coord(input: &str) -> Option<Coord> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    let split = input
        .find(|c: char| c.is_ascii_alphabetic())
        .unwrap_or(input.len());
    let (number, unit) = input.split_at(split);
    let value: f64 = number.trim().parse().ok()?;

    let scale = match unit.trim().to_lowercase().as_str() {
        "" | "nm" => 1.0,
        "um" => 1_000.0,
        "mm" => NM_PER_MM,
        "cm" => NM_PER_MM * 10.0,
        "mil" => NM_PER_MIL,
        "in" | "inch" => NM_PER_MIL * 1000.0,
        _ => return None,
    };

    let nm = value * scale;
    if !nm.is_finite() || nm.abs() > Coord::MAX as f64 {
        return None;
    }
    Some(nm.round() as Coord)
}

/// Get the unit label for the given system ("mm" or "mil")
pub fn get_unit_label(system: MeasurementSystem) -> &'static str {
    match system {
        MeasurementSystem::Metric => "mm",
        MeasurementSystem::Imperial => "mil",
    }
}
