//! Market trend generator — the shared, location-independent MTI.
//!
//! Two layers:
//!   1. Regime layer: tiles the calendar with MarketPeriods (60–120 days),
//!      each with a direction, volatility and momentum. Direction choice
//!      is biased toward mean reversion by the prior period's end index.
//!   2. Daily layer: walks each period one day at a time, combining a
//!      directional drift, noise, momentum, mean reversion and a boundary
//!      force, then clamps into [MTI_MIN, MTI_MAX].
//!
//! The step is limited to ±max_daily_change before the band clamp, and the
//! band clamp only ever shortens the step, so no day-to-day jump can exceed it.

use crate::{
    config::MarketTrendParams,
    rng::SeededRng,
    types::{SimDate, Trend},
};
use serde::{Deserialize, Serialize};

pub const MTI_MIN: f64 = 0.35;
pub const MTI_MAX: f64 = 0.95;
pub const MTI_CENTER: f64 = 0.65;

/// Width of the outer band where noise is doubled and momentum halved.
const EDGE_ZONE: f64 = (MTI_MAX - MTI_MIN) * 0.10;
/// Distance from a bound at which the repelling force starts.
const REPEL_ZONE: f64 = 0.10;
const REPEL_STRENGTH: f64 = 0.2;
/// Extra fixed push applied within 0.02 of either bound.
const HARD_PUSH_LOW: f64 = 0.37;
const HARD_PUSH_HIGH: f64 = 0.93;
const HARD_PUSH: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketTrendPoint {
    pub date:  SimDate,
    pub index: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketPeriod {
    pub start:      SimDate,
    /// Inclusive.
    pub end:        SimDate,
    pub trend:      Trend,
    pub volatility: f64,
    pub momentum:   f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketTrend {
    pub periods: Vec<MarketPeriod>,
    pub points:  Vec<MarketTrendPoint>,
}

impl MarketTrend {
    pub fn indices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.index).collect()
    }
}

impl Trend {
    /// Small constant drift per day.
    fn base_change(&self) -> f64 {
        match self {
            Self::Up => 0.002,
            Self::Down => -0.002,
            Self::Stable => 0.0,
        }
    }

    fn volatility_multiplier(&self) -> f64 {
        match self {
            Self::Up => 1.0,
            Self::Down => 1.3,
            Self::Stable => 0.7,
        }
    }

    fn momentum_multiplier(&self) -> f64 {
        match self {
            Self::Up => 1.0,
            Self::Down => 1.0,
            Self::Stable => 0.5,
        }
    }
}

/// Regime probabilities (up, down, stable) after mean-reversion bias.
pub fn regime_probabilities(previous_end_index: f64) -> (f64, f64, f64) {
    let (mut up, mut down, stable) = (0.35_f64, 0.35_f64, 0.30_f64);
    if previous_end_index > 0.8 {
        down += 0.2;
        up -= 0.2;
    } else if previous_end_index < 0.5 {
        up += 0.2;
        down -= 0.2;
    }
    (up.clamp(0.1, 0.6), down.clamp(0.1, 0.6), stable.clamp(0.1, 0.6))
}

fn pick_trend(previous_end_index: f64, rng: &mut SeededRng) -> Trend {
    let (up, down, stable) = regime_probabilities(previous_end_index);
    let roll = rng.next_f64() * (up + down + stable);
    if roll < up {
        Trend::Up
    } else if roll < up + down {
        Trend::Down
    } else {
        Trend::Stable
    }
}

fn near_edge(index: f64) -> bool {
    index < MTI_MIN + EDGE_ZONE || index > MTI_MAX - EDGE_ZONE
}

/// Force pushing the index away from the band edges.
pub fn boundary_force(index: f64) -> f64 {
    let mut force = 0.0;
    if index < MTI_MIN + REPEL_ZONE {
        force += (MTI_MIN + REPEL_ZONE - index) * REPEL_STRENGTH;
    }
    if index > MTI_MAX - REPEL_ZONE {
        force -= (index - (MTI_MAX - REPEL_ZONE)) * REPEL_STRENGTH;
    }
    if index < HARD_PUSH_LOW {
        force += HARD_PUSH;
    }
    if index > HARD_PUSH_HIGH {
        force -= HARD_PUSH;
    }
    force
}

/// Daily-layer state carried between consecutive days.
#[derive(Debug, Clone, Copy)]
struct DailyState {
    index:           f64,
    previous_change: f64,
}

pub struct MarketTrendGenerator<'a> {
    params: &'a MarketTrendParams,
}

impl<'a> MarketTrendGenerator<'a> {
    pub fn new(params: &'a MarketTrendParams) -> Self {
        Self { params }
    }

    /// One point per date in `dates`, which must be consecutive calendar days.
    pub fn generate(&self, dates: &[SimDate], rng: &mut SeededRng) -> MarketTrend {
        let p = self.params;
        let mut periods = Vec::new();
        let mut points = Vec::with_capacity(dates.len());
        if dates.is_empty() {
            return MarketTrend { periods, points };
        }

        let mut state = DailyState {
            index: rng.range_f64(p.initial_index_min, p.initial_index_max),
            previous_change: 0.0,
        };

        let mut cursor = 0usize;
        while cursor < dates.len() {
            let length = rng.range_inclusive(p.period_min_days, p.period_max_days) as usize;
            let end = (cursor + length).min(dates.len()) - 1;
            let trend = pick_trend(state.index, rng);
            let volatility =
                rng.range_f64(p.volatility_min, p.volatility_max) * trend.volatility_multiplier();
            let momentum =
                rng.range_f64(p.momentum_min, p.momentum_max) * trend.momentum_multiplier();

            let period = MarketPeriod {
                start: dates[cursor],
                end: dates[end],
                trend,
                volatility,
                momentum,
            };

            for &date in &dates[cursor..=end] {
                state = self.step(state, &period, rng);
                points.push(MarketTrendPoint {
                    date,
                    index: state.index,
                });
            }

            log::debug!(
                "market: period {}..={} trend={} vol={:.4} mom={:.3} end_index={:.3}",
                period.start,
                period.end,
                period.trend.as_str(),
                period.volatility,
                period.momentum,
                state.index
            );
            periods.push(period);
            cursor = end + 1;
        }

        log::info!(
            "market: generated {} periods over {} days",
            periods.len(),
            points.len()
        );
        MarketTrend { periods, points }
    }

    fn step(&self, state: DailyState, period: &MarketPeriod, rng: &mut SeededRng) -> DailyState {
        let current = state.index;
        let edge = near_edge(current);

        let base_change = period.trend.base_change();
        let noise_scale = if edge { period.volatility * 2.0 } else { period.volatility };
        let random_change = rng.symmetric(noise_scale);
        let momentum = if edge { period.momentum * 0.5 } else { period.momentum };
        let momentum_change = state.previous_change * momentum;
        let mean_reversion_change = (MTI_CENTER - current) * self.params.mean_reversion_strength;

        let total = (base_change
            + random_change
            + momentum_change
            + mean_reversion_change
            + boundary_force(current))
        .clamp(-self.params.max_daily_change, self.params.max_daily_change);

        let next = (current + total).clamp(MTI_MIN, MTI_MAX);
        DailyState {
            index: next,
            previous_change: next - current,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probabilities_lean_against_extremes() {
        let (up, down, _) = regime_probabilities(0.9);
        assert!(down > up);
        let (up, down, _) = regime_probabilities(0.4);
        assert!(up > down);
        let (up, down, stable) = regime_probabilities(0.65);
        assert_eq!((up, down, stable), (0.35, 0.35, 0.30));
    }

    #[test]
    fn probabilities_clamped() {
        for idx in [0.35, 0.45, 0.65, 0.85, 0.95] {
            let (up, down, stable) = regime_probabilities(idx);
            for p in [up, down, stable] {
                assert!((0.1..=0.6).contains(&p));
            }
        }
    }

    #[test]
    fn boundary_force_repels() {
        assert!(boundary_force(MTI_MIN) > 0.0);
        assert!(boundary_force(MTI_MAX) < 0.0);
        assert_eq!(boundary_force(MTI_CENTER), 0.0);
        assert!(boundary_force(0.36) > boundary_force(0.40));
    }
}
