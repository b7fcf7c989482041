//! Static configuration tables.
//!
//! RULE: Tables are kept in declaration order (Vec, never HashMap).
//! Every generator iterates components, suppliers, locations and models
//! in this order, and the order of RNG draws follows it. Reordering a
//! table changes the generated history even with the same seed.

use crate::{
    error::{SimError, SimResult},
    rng::RngAlgorithm,
    types::{ComponentId, LocationId, ModelId, SimDate, SupplierId, Trend},
};
use serde::{Deserialize, Serialize};

/// Number of story beats (quality periods) per supplier.
pub const STORY_LENGTH: usize = 6;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComponentConfig {
    pub id:                    ComponentId,
    pub name:                  String,
    /// Failure rate of a unit from a supplier at quality 1.0.
    pub baseline_failure_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SupplierConfig {
    pub id:                  SupplierId,
    pub name:                String,
    pub base_lead_time_days: u32,
    /// Components this supplier can deliver.
    pub components:          Vec<ComponentId>,
    pub starting_quality:    f64,
    pub quality_volatility:  f64,
    pub seasonal_strength:   f64,
    /// Persistence of daily quality noise, 0 = white noise, <1 = smoother.
    pub momentum:            f64,
    /// Fixed offset applied to the derived efficiency index.
    pub efficiency_bias:     f64,
    /// Exactly STORY_LENGTH beats, one per quality period.
    pub story:               Vec<Trend>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelPreference {
    pub model:      ModelId,
    pub multiplier: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocationConfig {
    pub id:                LocationId,
    pub name:              String,
    /// Eligible suppliers, in draw order.
    pub suppliers:         Vec<SupplierId>,
    pub model_preferences: Vec<ModelPreference>,
}

impl LocationConfig {
    /// Demand multiplier for a model at this location; 0.0 if not sold here.
    pub fn preference(&self, model: &str) -> f64 {
        self.model_preferences
            .iter()
            .find(|p| p.model == model)
            .map(|p| p.multiplier)
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BomLine {
    pub component: ComponentId,
    pub quantity:  u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelConfig {
    pub id:                 ModelId,
    pub name:               String,
    pub base_daily_demand:  f64,
    /// Demand response to the market trend index around its 0.65 centre.
    pub market_sensitivity: f64,
    /// Demand response to inflation above 2%.
    pub price_sensitivity:  f64,
    pub components:         Vec<BomLine>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationConfig {
    pub start_date:    SimDate,
    pub years:         u32,
    pub seed:          String,
    #[serde(default)]
    pub rng_algorithm: RngAlgorithm,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MarketTrendParams {
    pub initial_index_min:       f64,
    pub initial_index_max:       f64,
    pub period_min_days:         u64,
    pub period_max_days:         u64,
    pub volatility_min:          f64,
    pub volatility_max:          f64,
    pub momentum_min:            f64,
    pub momentum_max:            f64,
    pub max_daily_change:        f64,
    pub mean_reversion_strength: f64,
}

impl Default for MarketTrendParams {
    fn default() -> Self {
        Self {
            initial_index_min: 0.55,
            initial_index_max: 0.75,
            period_min_days: 60,
            period_max_days: 120,
            volatility_min: 0.004,
            volatility_max: 0.012,
            momentum_min: 0.2,
            momentum_max: 0.5,
            max_daily_change: 0.15,
            mean_reversion_strength: 0.02,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InflationParams {
    /// Days between a market move and its effect on local inflation.
    pub lag_days:         usize,
    pub mti_influence:    f64,
    pub period_min_days:  u64,
    pub period_max_days:  u64,
    pub base_rate:        f64,
    pub base_rate_spread: f64,
    pub volatility_min:   f64,
    pub volatility_max:   f64,
}

impl Default for InflationParams {
    fn default() -> Self {
        Self {
            lag_days: 30,
            mti_influence: 0.01,
            period_min_days: 90,
            period_max_days: 100,
            base_rate: 0.02,
            base_rate_spread: 0.005,
            volatility_min: 0.001,
            volatility_max: 0.003,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InventoryParams {
    /// Days of expected demand held as the target inventory level.
    pub target_days_of_cover: f64,
    /// Floor for any component's target level at a location.
    pub minimum_units:        u64,
}

impl Default for InventoryParams {
    fn default() -> Self {
        Self {
            target_days_of_cover: 60.0,
            minimum_units: 50,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct GenerationFile {
    generation: GenerationConfig,
    #[serde(default)]
    market:     MarketTrendParams,
    #[serde(default)]
    inflation:  InflationParams,
    #[serde(default)]
    inventory:  InventoryParams,
}

#[derive(Debug, Clone, Deserialize)]
struct ComponentsFile {
    components: Vec<ComponentConfig>,
}

#[derive(Debug, Clone, Deserialize)]
struct SuppliersFile {
    suppliers: Vec<SupplierConfig>,
}

#[derive(Debug, Clone, Deserialize)]
struct LocationsFile {
    locations: Vec<LocationConfig>,
}

#[derive(Debug, Clone, Deserialize)]
struct ModelsFile {
    models: Vec<ModelConfig>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    pub generation: GenerationConfig,
    pub components: Vec<ComponentConfig>,
    pub suppliers:  Vec<SupplierConfig>,
    pub locations:  Vec<LocationConfig>,
    pub models:     Vec<ModelConfig>,
    pub market:     MarketTrendParams,
    pub inflation:  InflationParams,
    pub inventory:  InventoryParams,
}

fn check_days(table: &str, min: u64, max: u64) -> SimResult<()> {
    if min == 0 {
        return Err(SimError::Config(format!("{table}.period_min_days must be at least 1")));
    }
    if min > max {
        return Err(SimError::Config(format!(
            "{table}.period_min_days {min} exceeds period_max_days {max}"
        )));
    }
    Ok(())
}

fn check_range(name: &str, min: f64, max: f64) -> SimResult<()> {
    if min > max {
        return Err(SimError::Config(format!("{name}_min {min} exceeds {name}_max {max}")));
    }
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &str) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
    serde_json::from_str(&content).map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))
}

impl SimConfig {
    /// Load from the data/ directory.
    /// In tests, use SimConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let generation: GenerationFile = read_json(&format!("{data_dir}/generation.json"))?;
        let components: ComponentsFile = read_json(&format!("{data_dir}/components.json"))?;
        let suppliers: SuppliersFile = read_json(&format!("{data_dir}/suppliers.json"))?;
        let locations: LocationsFile = read_json(&format!("{data_dir}/locations.json"))?;
        let models: ModelsFile = read_json(&format!("{data_dir}/models.json"))?;

        let config = Self {
            generation: generation.generation,
            components: components.components,
            suppliers: suppliers.suppliers,
            locations: locations.locations,
            models: models.models,
            market: generation.market,
            inflation: generation.inflation,
            inventory: generation.inventory,
        };
        config.validate()?;
        log::info!(
            "config: loaded {} components, {} suppliers, {} locations, {} models from {data_dir}",
            config.components.len(),
            config.suppliers.len(),
            config.locations.len(),
            config.models.len()
        );
        Ok(config)
    }

    pub fn component(&self, id: &str) -> Option<&ComponentConfig> {
        self.components.iter().find(|c| c.id == id)
    }

    pub fn supplier(&self, id: &str) -> Option<&SupplierConfig> {
        self.suppliers.iter().find(|s| s.id == id)
    }

    pub fn model(&self, id: &str) -> Option<&ModelConfig> {
        self.models.iter().find(|m| m.id == id)
    }

    /// Suppliers eligible at `location` that deliver `component`, in the
    /// location's declared order.
    pub fn suppliers_for<'a>(
        &'a self,
        location: &'a LocationConfig,
        component: &'a str,
    ) -> impl Iterator<Item = &'a SupplierConfig> + 'a {
        location
            .suppliers
            .iter()
            .filter_map(move |id| self.supplier(id))
            .filter(move |s| s.components.iter().any(|c| c == component))
    }

    /// Reject tables that would make the run inconsistent.
    pub fn validate(&self) -> SimResult<()> {
        if self.generation.years == 0 {
            return Err(SimError::Config("generation.years must be at least 1".into()));
        }
        if self.generation.seed.is_empty() {
            return Err(SimError::Config("generation.seed must not be empty".into()));
        }
        self.validate_tunables()?;

        for s in &self.suppliers {
            if s.story.len() != STORY_LENGTH {
                return Err(SimError::Config(format!(
                    "supplier '{}' story has {} beats, expected {STORY_LENGTH}",
                    s.id,
                    s.story.len()
                )));
            }
            if !(0.0..1.0).contains(&s.momentum) {
                return Err(SimError::Config(format!(
                    "supplier '{}' momentum {} outside [0, 1)",
                    s.id, s.momentum
                )));
            }
            if s.base_lead_time_days == 0 {
                return Err(SimError::Config(format!(
                    "supplier '{}' base lead time must be at least 1 day",
                    s.id
                )));
            }
            if !(0.7..=1.3).contains(&s.starting_quality) {
                return Err(SimError::Config(format!(
                    "supplier '{}' starting quality {} outside [0.7, 1.3]",
                    s.id, s.starting_quality
                )));
            }
            for c in &s.components {
                if self.component(c).is_none() {
                    return Err(SimError::Config(format!(
                        "supplier '{}' references unknown component '{c}'",
                        s.id
                    )));
                }
            }
        }

        for m in &self.models {
            for line in &m.components {
                if self.component(&line.component).is_none() {
                    return Err(SimError::Config(format!(
                        "model '{}' references unknown component '{}'",
                        m.id, line.component
                    )));
                }
            }
        }

        for loc in &self.locations {
            for s in &loc.suppliers {
                if self.supplier(s).is_none() {
                    return Err(SimError::Config(format!(
                        "location '{}' references unknown supplier '{s}'",
                        loc.id
                    )));
                }
            }
            for pref in &loc.model_preferences {
                let model = self.model(&pref.model).ok_or_else(|| {
                    SimError::Config(format!(
                        "location '{}' references unknown model '{}'",
                        loc.id, pref.model
                    ))
                })?;
                if pref.multiplier <= 0.0 {
                    continue;
                }
                for line in &model.components {
                    if self.suppliers_for(loc, &line.component).next().is_none() {
                        return Err(SimError::Config(format!(
                            "location '{}' sells model '{}' but has no supplier for '{}'",
                            loc.id, model.id, line.component
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Generator tunables: every sampled range must be non-empty and every
    /// period at least one day long.
    fn validate_tunables(&self) -> SimResult<()> {
        let m = &self.market;
        check_days("market", m.period_min_days, m.period_max_days)?;
        check_range("market.volatility", m.volatility_min, m.volatility_max)?;
        check_range("market.momentum", m.momentum_min, m.momentum_max)?;
        check_range("market.initial_index", m.initial_index_min, m.initial_index_max)?;
        if m.max_daily_change.is_nan() || m.max_daily_change <= 0.0 {
            return Err(SimError::Config(format!(
                "market.max_daily_change must be positive, got {}",
                m.max_daily_change
            )));
        }

        let i = &self.inflation;
        check_days("inflation", i.period_min_days, i.period_max_days)?;
        check_range("inflation.volatility", i.volatility_min, i.volatility_max)?;
        Ok(())
    }

    /// Config with hardcoded defaults for use in unit tests.
    pub fn default_test() -> Self {
        use Trend::{Down, Stable, Up};

        let components = vec![
            ComponentConfig {
                id: "ENGINE-A".into(),
                name: "Diesel Engine A".into(),
                baseline_failure_rate: 0.02,
            },
            ComponentConfig {
                id: "TRANS-B".into(),
                name: "Transmission B".into(),
                baseline_failure_rate: 0.015,
            },
            ComponentConfig {
                id: "HYD-C".into(),
                name: "Hydraulic Pump C".into(),
                baseline_failure_rate: 0.03,
            },
        ];

        let suppliers = vec![
            SupplierConfig {
                id: "SUP-PREMIUM".into(),
                name: "Premium Components".into(),
                base_lead_time_days: 10,
                components: vec!["ENGINE-A".into(), "TRANS-B".into(), "HYD-C".into()],
                starting_quality: 1.05,
                quality_volatility: 0.01,
                seasonal_strength: 0.3,
                momentum: 0.6,
                efficiency_bias: 0.02,
                story: vec![Stable, Up, Stable, Up, Stable, Stable],
            },
            SupplierConfig {
                id: "SUP-VOLUME".into(),
                name: "Volume Parts".into(),
                base_lead_time_days: 7,
                components: vec!["ENGINE-A".into(), "HYD-C".into()],
                starting_quality: 0.95,
                quality_volatility: 0.015,
                seasonal_strength: 0.5,
                momentum: 0.5,
                efficiency_bias: 0.0,
                story: vec![Down, Down, Up, Up, Stable, Up],
            },
            SupplierConfig {
                id: "SUP-BUDGET".into(),
                name: "Budget Supply".into(),
                base_lead_time_days: 5,
                components: vec!["ENGINE-A".into(), "TRANS-B".into()],
                starting_quality: 0.9,
                quality_volatility: 0.02,
                seasonal_strength: 0.8,
                momentum: 0.4,
                efficiency_bias: -0.02,
                story: vec![Stable, Down, Stable, Up, Down, Stable],
            },
        ];

        let locations = vec![
            LocationConfig {
                id: "LOC-NORTH".into(),
                name: "Northern Plant".into(),
                suppliers: vec![
                    "SUP-PREMIUM".into(),
                    "SUP-VOLUME".into(),
                    "SUP-BUDGET".into(),
                ],
                model_preferences: vec![
                    ModelPreference { model: "TR-100".into(), multiplier: 1.2 },
                    ModelPreference { model: "TR-200".into(), multiplier: 0.8 },
                ],
            },
            LocationConfig {
                id: "LOC-SOUTH".into(),
                name: "Southern Plant".into(),
                suppliers: vec!["SUP-PREMIUM".into(), "SUP-BUDGET".into()],
                model_preferences: vec![
                    ModelPreference { model: "TR-100".into(), multiplier: 0.9 },
                    ModelPreference { model: "TR-200".into(), multiplier: 1.3 },
                ],
            },
        ];

        let models = vec![
            ModelConfig {
                id: "TR-100".into(),
                name: "Compact Tractor".into(),
                base_daily_demand: 4.0,
                market_sensitivity: 1.2,
                price_sensitivity: 0.8,
                components: vec![
                    BomLine { component: "ENGINE-A".into(), quantity: 1 },
                    BomLine { component: "HYD-C".into(), quantity: 2 },
                ],
            },
            ModelConfig {
                id: "TR-200".into(),
                name: "Utility Tractor".into(),
                base_daily_demand: 2.5,
                market_sensitivity: 0.8,
                price_sensitivity: 0.5,
                components: vec![
                    BomLine { component: "ENGINE-A".into(), quantity: 1 },
                    BomLine { component: "TRANS-B".into(), quantity: 1 },
                ],
            },
        ];

        Self {
            generation: GenerationConfig {
                start_date: SimDate::from_ymd_opt(2021, 1, 1).expect("valid date"),
                years: 2,
                seed: "test-seed".into(),
                rng_algorithm: RngAlgorithm::Pcg64Mcg,
            },
            components,
            suppliers,
            locations,
            models,
            market: MarketTrendParams::default(),
            inflation: InflationParams::default(),
            inventory: InventoryParams::default(),
        }
    }
}
