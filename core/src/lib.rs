//! Deterministic supply-chain history generator.
//!
//! Produces a seed-reproducible, multi-year history (market trend,
//! inflation, supplier quality, demand) and replays it through a
//! per-location inventory / order / delivery / failure simulator.

pub mod calendar;
pub mod config;
pub mod delivery;
pub mod demand;
pub mod engine;
pub mod error;
pub mod failure;
pub mod inflation;
pub mod inventory;
pub mod market_trend;
pub mod rng;
pub mod series;
pub mod simulator;
pub mod sink;
pub mod supplier_quality;
pub mod types;
