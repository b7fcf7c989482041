//! Inflation generator — per-location rate lagged against the MTI.
//!
//! Each location tiles the calendar with ~quarterly InflationPeriods.
//! Daily rate = period.base_rate
//!            + MTI[day - lag_days] × mti_influence
//!            + uniform noise in ±period.volatility
//!            + period.seasonal_adjustment
//!
//! No clamp is applied: the 0–10% range follows from input magnitudes.

use crate::{
    calendar::quarter_of,
    config::InflationParams,
    rng::SeededRng,
    types::SimDate,
};
use serde::{Deserialize, Serialize};

/// Extra noise on each quarter's seasonal adjustment.
const SEASONAL_NOISE: f64 = 0.0005;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InflationPeriod {
    pub start:               SimDate,
    /// Inclusive.
    pub end:                 SimDate,
    pub base_rate:           f64,
    pub volatility:          f64,
    pub seasonal_adjustment: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InflationRate {
    pub date: SimDate,
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InflationSeries {
    pub location_id: String,
    pub periods:     Vec<InflationPeriod>,
    pub rates:       Vec<InflationRate>,
}

/// Seasonal bias of the calendar quarter a period starts in.
pub fn seasonal_bias(quarter: u32) -> f64 {
    match quarter {
        1 => 0.004,
        2 => 0.001,
        3 => -0.003,
        _ => 0.002,
    }
}

/// Market index `lag` days before `day`; days before the first use the first.
pub fn lagged_index(market: &[f64], day: usize, lag: usize) -> f64 {
    if market.is_empty() {
        return 0.0;
    }
    let idx = day.saturating_sub(lag).min(market.len() - 1);
    market[idx]
}

pub struct InflationGenerator<'a> {
    params: &'a InflationParams,
}

impl<'a> InflationGenerator<'a> {
    pub fn new(params: &'a InflationParams) -> Self {
        Self { params }
    }

    /// `market` holds one MTI value per entry of `dates`.
    pub fn generate(
        &self,
        location_id: &str,
        dates: &[SimDate],
        market: &[f64],
        rng: &mut SeededRng,
    ) -> InflationSeries {
        let p = self.params;
        let mut periods = Vec::new();
        let mut rates = Vec::with_capacity(dates.len());

        let mut cursor = 0usize;
        while cursor < dates.len() {
            let length = rng.range_inclusive(p.period_min_days, p.period_max_days) as usize;
            let end = (cursor + length).min(dates.len()) - 1;
            let period = InflationPeriod {
                start: dates[cursor],
                end: dates[end],
                base_rate: p.base_rate + rng.symmetric(p.base_rate_spread),
                volatility: rng.range_f64(p.volatility_min, p.volatility_max),
                seasonal_adjustment: seasonal_bias(quarter_of(dates[cursor]))
                    + rng.symmetric(SEASONAL_NOISE),
            };

            for day in cursor..=end {
                let market_effect = lagged_index(market, day, p.lag_days) * p.mti_influence;
                let noise = rng.symmetric(period.volatility);
                rates.push(InflationRate {
                    date: dates[day],
                    rate: period.base_rate + market_effect + noise + period.seasonal_adjustment,
                });
            }

            periods.push(period);
            cursor = end + 1;
        }

        log::info!(
            "inflation: location={location_id} generated {} periods over {} days",
            periods.len(),
            rates.len()
        );
        InflationSeries {
            location_id: location_id.to_string(),
            periods,
            rates,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lag_before_start_uses_first_index() {
        let market = [0.5, 0.6, 0.7, 0.8];
        assert_eq!(lagged_index(&market, 0, 30), 0.5);
        assert_eq!(lagged_index(&market, 2, 30), 0.5);
        assert_eq!(lagged_index(&market, 3, 1), 0.7);
        assert_eq!(lagged_index(&market, 3, 0), 0.8);
    }

    #[test]
    fn seasonal_bias_by_quarter() {
        assert_eq!(seasonal_bias(1), 0.004);
        assert_eq!(seasonal_bias(2), 0.001);
        assert_eq!(seasonal_bias(3), -0.003);
        assert_eq!(seasonal_bias(4), 0.002);
    }
}
