//! Deterministic random number generation.
//!
//! RULE: Nothing in the generator may call any platform RNG.
//! All randomness flows through SeededRng instances derived
//! from the single seed string in the generation config.
//!
//! Each stream is keyed by a composite string such as
//! `{seed}-quality-{supplier}`. The key is hashed with SHA-256, so:
//!   - Adding a new stream never changes existing streams.
//!   - Each stream is fully reproducible in isolation.
//!   - The mapping is identical on every platform and toolchain.

use rand::{RngCore, SeedableRng};
use rand_pcg::{Pcg32, Pcg64Mcg};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Which PCG variant backs a stream. Part of the reproducibility key:
/// the same seed under a different algorithm yields a different sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RngAlgorithm {
    #[default]
    Pcg64Mcg,
    Pcg32,
}

enum Inner {
    Pcg64Mcg(Pcg64Mcg),
    Pcg32(Pcg32),
}

/// A named, deterministic RNG for a single generation stream.
pub struct SeededRng {
    pub key: String,
    inner:   Inner,
}

impl SeededRng {
    /// Create a stream from its full composite key.
    pub fn new(key: impl Into<String>, algorithm: RngAlgorithm) -> Self {
        let key = key.into();
        let seed = hash_key(&key);
        let inner = match algorithm {
            RngAlgorithm::Pcg64Mcg => Inner::Pcg64Mcg(Pcg64Mcg::seed_from_u64(seed)),
            RngAlgorithm::Pcg32 => Inner::Pcg32(Pcg32::seed_from_u64(seed)),
        };
        Self { key, inner }
    }

    /// Draw a raw u64 (full range).
    pub fn next_u64(&mut self) -> u64 {
        match &mut self.inner {
            Inner::Pcg64Mcg(r) => r.next_u64(),
            Inner::Pcg32(r) => r.next_u64(),
        }
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        let bits = self.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Roll a u64 in [0, n).
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        assert!(n > 0, "n must be > 0");
        self.next_u64() % n
    }

    /// Roll a u64 in [low, high], both inclusive.
    pub fn range_inclusive(&mut self, low: u64, high: u64) -> u64 {
        assert!(low <= high, "empty range {low}..={high}");
        low + self.next_u64_below(high - low + 1)
    }

    /// Roll a float in [low, high).
    pub fn range_f64(&mut self, low: f64, high: f64) -> f64 {
        low + self.next_f64() * (high - low)
    }

    /// Uniform noise in [-scale, scale).
    pub fn symmetric(&mut self, scale: f64) -> f64 {
        (self.next_f64() * 2.0 - 1.0) * scale
    }

    /// Bernoulli trial: returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

/// Hands out streams for one generation run, all derived from one seed string.
#[derive(Debug, Clone)]
pub struct RngBank {
    seed:      String,
    algorithm: RngAlgorithm,
}

impl RngBank {
    pub fn new(seed: impl Into<String>, algorithm: RngAlgorithm) -> Self {
        Self {
            seed: seed.into(),
            algorithm,
        }
    }

    /// Stream keyed `{seed}-{stream}-{parts...}`.
    pub fn stream(&self, stream: Stream, parts: &[&str]) -> SeededRng {
        let mut key = format!("{}-{}", self.seed, stream.name());
        for part in parts {
            key.push('-');
            key.push_str(part);
        }
        SeededRng::new(key, self.algorithm)
    }

    pub fn market(&self) -> SeededRng {
        self.stream(Stream::Market, &[])
    }

    pub fn inflation(&self, location: &str) -> SeededRng {
        self.stream(Stream::Inflation, &[location])
    }

    pub fn quality(&self, supplier: &str) -> SeededRng {
        self.stream(Stream::Quality, &[supplier])
    }

    pub fn demand(&self, location: &str, model: &str) -> SeededRng {
        self.stream(Stream::Demand, &[location, model])
    }

    pub fn inventory(&self, location: &str) -> SeededRng {
        self.stream(Stream::Inventory, &[location])
    }

    pub fn simulation(&self, location: &str) -> SeededRng {
        self.stream(Stream::Simulation, &[location])
    }
}

/// Stable stream names. Renaming one changes every draw in that stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stream {
    Market,
    Inflation,
    Quality,
    Demand,
    Inventory,
    Simulation,
}

impl Stream {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Market => "market",
            Self::Inflation => "inflation",
            Self::Quality => "quality",
            Self::Demand => "demand",
            Self::Inventory => "inventory",
            Self::Simulation => "simulation",
        }
    }
}

fn hash_key(key: &str) -> u64 {
    let digest = Sha256::digest(key.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_key_same_sequence() {
        let mut a = SeededRng::new("test-seed", RngAlgorithm::Pcg64Mcg);
        let mut b = SeededRng::new("test-seed", RngAlgorithm::Pcg64Mcg);
        for _ in 0..1000 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn algorithm_is_part_of_the_key() {
        let mut a = SeededRng::new("test-seed", RngAlgorithm::Pcg64Mcg);
        let mut b = SeededRng::new("test-seed", RngAlgorithm::Pcg32);
        let xs: Vec<u64> = (0..8).map(|_| a.next_u64()).collect();
        let ys: Vec<u64> = (0..8).map(|_| b.next_u64()).collect();
        assert_ne!(xs, ys);
    }

    #[test]
    fn bank_streams_are_independent() {
        let bank = RngBank::new("test-seed", RngAlgorithm::default());
        let mut loc_a = bank.simulation("LOC-A");
        let mut loc_b = bank.simulation("LOC-B");
        assert_eq!(loc_a.key, "test-seed-simulation-LOC-A");
        assert_ne!(loc_a.next_u64(), loc_b.next_u64());
    }

    #[test]
    fn ranges_stay_in_bounds() {
        let mut rng = SeededRng::new("bounds", RngAlgorithm::Pcg32);
        for _ in 0..10_000 {
            let x = rng.range_inclusive(60, 120);
            assert!((60..=120).contains(&x));
            let f = rng.symmetric(0.5);
            assert!((-0.5..0.5).contains(&f));
        }
    }
}
