//! Component failure rates.
//!
//! adjusted = baseline × 2^((1 − quality) × 10)
//!
//! Quality 1.0 leaves the baseline untouched; every 0.1 below doubles it.

use crate::types::{ComponentId, SupplierId};
use serde::{Deserialize, Serialize};

const PENALTY_BASE: f64 = 2.0;
const PENALTY_SCALE: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentFailureReport {
    pub supplier_id:           SupplierId,
    pub component_id:          ComponentId,
    pub quality_index:         f64,
    pub baseline_failure_rate: f64,
    pub failure_rate:          f64,
}

pub fn adjusted_failure_rate(baseline: f64, quality: f64) -> f64 {
    baseline * PENALTY_BASE.powf((1.0 - quality) * PENALTY_SCALE)
}
