//! Shared primitive types used across the entire simulation.

use chrono::NaiveDate;

/// A simulated calendar day. Always interpreted as UTC midnight.
pub type SimDate = NaiveDate;

/// Stable identifiers from the static configuration tables.
pub type LocationId = String;
pub type SupplierId = String;
pub type ComponentId = String;
pub type ModelId = String;

/// Direction of a regime (market periods) or a scripted story beat
/// (supplier quality periods).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Stable => "stable",
        }
    }
}
