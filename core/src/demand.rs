//! Model demand — the boundary to the demand generator.
//!
//! The simulator only consumes daily integer counts per (location, model).
//! `DemandSource` is the seam; `SensitivityDemand` is the stock
//! implementation driven by MTI, inflation and location preference.

use crate::{
    config::{LocationConfig, ModelConfig},
    market_trend::MTI_CENTER,
    rng::SeededRng,
};

/// Inflation level at which price sensitivity has no effect.
pub const NEUTRAL_INFLATION: f64 = 0.02;
const DEMAND_NOISE: f64 = 0.2;

pub trait DemandSource {
    /// Daily demand counts, one per entry of `market` / `inflation`
    /// (which are the same length).
    fn daily_demand(
        &self,
        location: &LocationConfig,
        model: &ModelConfig,
        market: &[f64],
        inflation: &[f64],
        rng: &mut SeededRng,
    ) -> Vec<u32>;
}

/// Demand scaled by market and price sensitivities and the location's
/// preference for the model, with ±20% noise and stochastic rounding.
#[derive(Debug, Clone, Copy, Default)]
pub struct SensitivityDemand;

impl SensitivityDemand {
    pub fn expected(model: &ModelConfig, preference: f64, mti: f64, inflation: f64) -> f64 {
        let market_factor = 1.0 + model.market_sensitivity * (mti - MTI_CENTER);
        let price_factor = 1.0 - model.price_sensitivity * (inflation - NEUTRAL_INFLATION) * 10.0;
        (model.base_daily_demand * preference * market_factor * price_factor).max(0.0)
    }
}

impl DemandSource for SensitivityDemand {
    fn daily_demand(
        &self,
        location: &LocationConfig,
        model: &ModelConfig,
        market: &[f64],
        inflation: &[f64],
        rng: &mut SeededRng,
    ) -> Vec<u32> {
        let preference = location.preference(&model.id);
        if preference <= 0.0 {
            return vec![0; market.len()];
        }
        market
            .iter()
            .zip(inflation)
            .map(|(&mti, &rate)| {
                let expected = Self::expected(model, preference, mti, rate);
                let noisy = expected * (1.0 + rng.symmetric(DEMAND_NOISE));
                let whole = noisy.floor();
                let count = if rng.chance(noisy - whole) { whole + 1.0 } else { whole };
                count.max(0.0) as u32
            })
            .collect()
    }
}
