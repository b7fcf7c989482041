//! Supplier quality generator — scripted piecewise trends per supplier.
//!
//! The calendar is split into exactly STORY_LENGTH equal periods. Each
//! period follows one beat of the supplier's story (up/down/stable) from
//! its start quality to a sampled target, interpolated linearly in the
//! elapsed-day fraction with smoothed noise and a small seasonal term.
//!
//! Efficiency is derived from quality (rescaled into its own band plus a
//! fixed supplier bias and residual noise), never simulated on its own.

use crate::{
    config::{SupplierConfig, STORY_LENGTH},
    error::{SimError, SimResult},
    rng::SeededRng,
    types::{SimDate, SupplierId, Trend},
};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

pub const QUALITY_MIN: f64 = 0.7;
pub const QUALITY_MAX: f64 = 1.3;
pub const EFFICIENCY_MIN: f64 = 0.8;
pub const EFFICIENCY_MAX: f64 = 1.2;

const STABLE_DRIFT: f64 = 0.01;
const TREND_MOVE_MIN: f64 = 0.08;
const TREND_MOVE_MAX: f64 = 0.18;
/// Trend targets stop this far short of the quality bounds.
const BOUND_MARGIN: f64 = 0.02;
const SEASONAL_SCALE: f64 = 0.01;
const EFFICIENCY_NOISE: f64 = 0.005;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SupplierQualityPoint {
    pub date:             SimDate,
    pub quality_index:    f64,
    pub efficiency_index: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityPeriod {
    pub start:         SimDate,
    /// Inclusive.
    pub end:           SimDate,
    pub trend:         Trend,
    pub start_quality: f64,
    pub end_quality:   f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierQualitySeries {
    pub supplier_id: SupplierId,
    pub periods:     Vec<QualityPeriod>,
    pub points:      Vec<SupplierQualityPoint>,
}

/// Target quality at the end of a period that starts at `current`.
pub fn period_target(trend: Trend, current: f64, rng: &mut SeededRng) -> f64 {
    let target = match trend {
        Trend::Stable => current + rng.symmetric(STABLE_DRIFT),
        Trend::Up => {
            let headroom = (QUALITY_MAX - BOUND_MARGIN - current).max(0.0);
            current + rng.range_f64(TREND_MOVE_MIN, TREND_MOVE_MAX).min(headroom)
        }
        Trend::Down => {
            let headroom = (current - QUALITY_MIN - BOUND_MARGIN).max(0.0);
            current - rng.range_f64(TREND_MOVE_MIN, TREND_MOVE_MAX).min(headroom)
        }
    };
    target.clamp(QUALITY_MIN, QUALITY_MAX)
}

/// Efficiency derived from a quality value.
pub fn derive_efficiency(quality: f64, bias: f64, noise: f64) -> f64 {
    let scaled = EFFICIENCY_MIN
        + (quality - QUALITY_MIN) / (QUALITY_MAX - QUALITY_MIN) * (EFFICIENCY_MAX - EFFICIENCY_MIN);
    (scaled + bias + noise).clamp(EFFICIENCY_MIN, EFFICIENCY_MAX)
}

fn seasonal_term(date: SimDate, strength: f64) -> f64 {
    let phase = 2.0 * PI * date.ordinal0() as f64 / 365.25;
    phase.sin() * strength * SEASONAL_SCALE
}

/// Period boundaries `[start, end)` splitting `n` days into STORY_LENGTH parts.
pub fn period_bounds(n: usize) -> Vec<(usize, usize)> {
    (0..STORY_LENGTH)
        .map(|i| (i * n / STORY_LENGTH, (i + 1) * n / STORY_LENGTH))
        .collect()
}

pub struct SupplierQualityGenerator<'a> {
    supplier: &'a SupplierConfig,
}

impl<'a> SupplierQualityGenerator<'a> {
    pub fn new(supplier: &'a SupplierConfig) -> Self {
        Self { supplier }
    }

    pub fn generate(
        &self,
        dates: &[SimDate],
        rng: &mut SeededRng,
    ) -> SimResult<SupplierQualitySeries> {
        let s = self.supplier;
        if s.story.len() != STORY_LENGTH {
            return Err(SimError::Config(format!(
                "supplier '{}' story has {} beats, expected {STORY_LENGTH}",
                s.id,
                s.story.len()
            )));
        }
        if dates.len() < STORY_LENGTH {
            return Err(SimError::Config(format!(
                "quality generation needs at least {STORY_LENGTH} days, got {}",
                dates.len()
            )));
        }

        let mut periods = Vec::with_capacity(STORY_LENGTH);
        let mut points = Vec::with_capacity(dates.len());
        let mut current = s.starting_quality.clamp(QUALITY_MIN, QUALITY_MAX);
        let mut noise = 0.0_f64;

        for ((start, end), &trend) in period_bounds(dates.len()).into_iter().zip(&s.story) {
            let target = period_target(trend, current, rng);
            let len = end - start;
            let noise_scale = match trend {
                Trend::Stable => s.quality_volatility,
                Trend::Up | Trend::Down => s.quality_volatility * 2.0,
            };

            for (i, &date) in dates[start..end].iter().enumerate() {
                let fraction = (i + 1) as f64 / len as f64;
                let base = current + (target - current) * fraction;
                noise = s.momentum * noise + (1.0 - s.momentum) * rng.symmetric(noise_scale);
                let quality = (base + noise + seasonal_term(date, s.seasonal_strength))
                    .clamp(QUALITY_MIN, QUALITY_MAX);
                let efficiency =
                    derive_efficiency(quality, s.efficiency_bias, rng.symmetric(EFFICIENCY_NOISE));
                points.push(SupplierQualityPoint {
                    date,
                    quality_index: quality,
                    efficiency_index: efficiency,
                });
            }

            periods.push(QualityPeriod {
                start: dates[start],
                end: dates[end - 1],
                trend,
                start_quality: current,
                end_quality: target,
            });
            current = target;
        }

        log::info!(
            "quality: supplier={} story=[{}] final_quality={current:.3}",
            s.id,
            s.story.iter().map(Trend::as_str).collect::<Vec<_>>().join(",")
        );
        Ok(SupplierQualitySeries {
            supplier_id: s.id.clone(),
            periods,
            points,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_tile_the_range() {
        let bounds = period_bounds(730);
        assert_eq!(bounds.len(), STORY_LENGTH);
        assert_eq!(bounds[0].0, 0);
        assert_eq!(bounds[STORY_LENGTH - 1].1, 730);
        for pair in bounds.windows(2) {
            assert_eq!(pair[0].1, pair[1].0);
        }
    }

    #[test]
    fn efficiency_maps_quality_band_onto_its_own() {
        assert!((derive_efficiency(QUALITY_MIN, 0.0, 0.0) - EFFICIENCY_MIN).abs() < 1e-12);
        assert!((derive_efficiency(QUALITY_MAX, 0.0, 0.0) - EFFICIENCY_MAX).abs() < 1e-12);
        assert!((derive_efficiency(1.0, 0.0, 0.0) - 1.0).abs() < 1e-12);
        assert_eq!(derive_efficiency(QUALITY_MAX, 0.05, 0.0), EFFICIENCY_MAX);
    }

    #[test]
    fn trend_targets_never_cross_bounds() {
        let mut rng = SeededRng::new("targets", Default::default());
        for _ in 0..1000 {
            let up = period_target(Trend::Up, 1.25, &mut rng);
            assert!(up <= QUALITY_MAX - BOUND_MARGIN + 1e-12);
            let down = period_target(Trend::Down, 0.75, &mut rng);
            assert!(down >= QUALITY_MIN + BOUND_MARGIN - 1e-12);
            let stable = period_target(Trend::Stable, 1.0, &mut rng);
            assert!((stable - 1.0).abs() <= STABLE_DRIFT);
        }
    }
}
