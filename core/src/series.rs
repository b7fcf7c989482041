//! Time-series assembly — merges every generator into one date-indexed
//! structure the location simulators consume day by day.
//!
//! Generation order (fixed; each step draws from its own keyed stream):
//!   1. Calendar
//!   2. Market trend          `{seed}-market`
//!   3. Inflation per location `{seed}-inflation-{location}`
//!   4. Quality per supplier   `{seed}-quality-{supplier}`
//!   5. Demand per (location, model) `{seed}-demand-{location}-{model}`
//!
//! Locations, suppliers and models are visited in declaration order.

use crate::{
    calendar::calendar_days,
    config::SimConfig,
    demand::DemandSource,
    error::{SimError, SimResult},
    inflation::{InflationGenerator, InflationSeries},
    market_trend::{MarketTrend, MarketTrendGenerator},
    rng::RngBank,
    supplier_quality::{SupplierQualityGenerator, SupplierQualitySeries},
    types::{LocationId, ModelId, SimDate, SupplierId},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualitySample {
    pub quality_index:    f64,
    pub efficiency_index: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierQualityEntry {
    pub supplier_id: SupplierId,
    pub sample:      QualitySample,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDemand {
    pub model_id: ModelId,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationDayData {
    pub location_id:      LocationId,
    pub inflation_rate:   f64,
    /// Eligible suppliers, in the location's declared order.
    pub supplier_quality: Vec<SupplierQualityEntry>,
    /// Every configured model, in declaration order.
    pub model_demand:     Vec<ModelDemand>,
}

impl LocationDayData {
    pub fn quality_of(&self, supplier: &str) -> Option<QualitySample> {
        self.supplier_quality
            .iter()
            .find(|e| e.supplier_id == supplier)
            .map(|e| e.sample)
    }

    pub fn demand_of(&self, model: &str) -> u32 {
        self.model_demand
            .iter()
            .find(|d| d.model_id == model)
            .map(|d| d.quantity)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayData {
    pub date:         SimDate,
    pub market_trend: f64,
    pub locations:    Vec<LocationDayData>,
}

impl DayData {
    pub fn location(&self, id: &str) -> Option<&LocationDayData> {
        self.locations.iter().find(|l| l.location_id == id)
    }
}

/// The full generated history, plus the generator internals (periods)
/// returned explicitly for downstream inspection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoricalSeries {
    days:          BTreeMap<SimDate, DayData>,
    pub market:    Option<MarketTrend>,
    pub inflation: Vec<InflationSeries>,
    pub quality:   Vec<SupplierQualitySeries>,
}

impl HistoricalSeries {
    /// An empty series; fill with `insert` (used by tests and replay tooling).
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, day: DayData) {
        self.days.insert(day.date, day);
    }

    pub fn day(&self, date: SimDate) -> Option<&DayData> {
        self.days.get(&date)
    }

    pub fn first_date(&self) -> Option<SimDate> {
        self.days.keys().next().copied()
    }

    pub fn last_date(&self) -> Option<SimDate> {
        self.days.keys().next_back().copied()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Days in date order.
    pub fn iter(&self) -> impl Iterator<Item = &DayData> {
        self.days.values()
    }
}

/// Demand sources are external; a short series is missing day data.
fn check_demand_length(location: &str, model: &str, counts: &[u32], dates: &[SimDate]) -> SimResult<()> {
    match dates.get(counts.len()) {
        Some(&date) => Err(SimError::MissingDayData {
            location: location.to_string(),
            date,
        }),
        None if counts.len() > dates.len() => Err(SimError::Config(format!(
            "demand for model '{model}' at '{location}' has {} days, calendar has {}",
            counts.len(),
            dates.len()
        ))),
        None => Ok(()),
    }
}

/// Run every generator and merge the results.
pub fn assemble(config: &SimConfig, demand: &dyn DemandSource) -> SimResult<HistoricalSeries> {
    config.validate()?;
    let generation = &config.generation;
    let dates = calendar_days(generation.start_date, generation.years)?;
    let bank = RngBank::new(generation.seed.clone(), generation.rng_algorithm);

    let market = MarketTrendGenerator::new(&config.market).generate(&dates, &mut bank.market());
    let mti = market.indices();

    let inflation_gen = InflationGenerator::new(&config.inflation);
    let inflation: Vec<InflationSeries> = config
        .locations
        .iter()
        .map(|loc| inflation_gen.generate(&loc.id, &dates, &mti, &mut bank.inflation(&loc.id)))
        .collect();

    let quality = config
        .suppliers
        .iter()
        .map(|s| SupplierQualityGenerator::new(s).generate(&dates, &mut bank.quality(&s.id)))
        .collect::<SimResult<Vec<_>>>()?;

    // demand[location][model][day]
    let mut demand_tables: Vec<Vec<Vec<u32>>> = Vec::with_capacity(config.locations.len());
    for (loc, series) in config.locations.iter().zip(&inflation) {
        let rates: Vec<f64> = series.rates.iter().map(|r| r.rate).collect();
        let mut per_model = Vec::with_capacity(config.models.len());
        for m in &config.models {
            let counts = demand.daily_demand(loc, m, &mti, &rates, &mut bank.demand(&loc.id, &m.id));
            check_demand_length(&loc.id, &m.id, &counts, &dates)?;
            per_model.push(counts);
        }
        demand_tables.push(per_model);
    }

    let mut out = HistoricalSeries::new();
    for (day, &date) in dates.iter().enumerate() {
        let mut locations = Vec::with_capacity(config.locations.len());
        for (li, loc) in config.locations.iter().enumerate() {
            let supplier_quality = loc
                .suppliers
                .iter()
                .map(|sid| -> SimResult<SupplierQualityEntry> {
                    let series = quality.iter().find(|q| &q.supplier_id == sid).ok_or_else(|| {
                        SimError::MissingSupplierQuality {
                            location: loc.id.clone(),
                            supplier: sid.clone(),
                            date,
                        }
                    })?;
                    let point = series.points[day];
                    Ok(SupplierQualityEntry {
                        supplier_id: sid.clone(),
                        sample: QualitySample {
                            quality_index: point.quality_index,
                            efficiency_index: point.efficiency_index,
                        },
                    })
                })
                .collect::<SimResult<Vec<_>>>()?;

            let model_demand = config
                .models
                .iter()
                .zip(&demand_tables[li])
                .map(|(m, counts)| ModelDemand {
                    model_id: m.id.clone(),
                    quantity: counts[day],
                })
                .collect();

            locations.push(LocationDayData {
                location_id: loc.id.clone(),
                inflation_rate: inflation[li].rates[day].rate,
                supplier_quality,
                model_demand,
            });
        }
        out.insert(DayData {
            date,
            market_trend: mti[day],
            locations,
        });
    }

    log::info!(
        "series: assembled {} days for {} locations ({}..={})",
        out.len(),
        config.locations.len(),
        generation.start_date,
        out.last_date().unwrap_or(generation.start_date)
    );

    out.market = Some(market);
    out.inflation = inflation;
    out.quality = quality;
    Ok(out)
}
