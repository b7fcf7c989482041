//! Delivery timing model.
//!
//! 70% of orders arrive on the supplier's base lead time. The rest roll
//! early or late. The odds depend on the supplier's quality normalized over
//! [0.7, 1.3]: better suppliers are more often early, worse ones are more
//! often late and by more.
//!
//! Early and late outcomes are ordered (threshold, day adjustment) ladders.
//! A roll walks the ladder top-down and takes the first rung whose scaled
//! threshold it falls under.

use crate::{
    rng::SeededRng,
    supplier_quality::{QUALITY_MAX, QUALITY_MIN},
};

pub const ON_TIME_SHARE: f64 = 0.70;
pub const MIN_LEAD_TIME_DAYS: i64 = 1;

/// Scaled by `0.5 + normalized quality`. Falls through to one day early.
pub const EARLY_LADDER: [(f64, i64); 2] = [(0.35, -2), (1.0, -1)];
const EARLY_FALLBACK: i64 = -1;

/// Scaled by `lateness_factor`. Falls through to one day late.
pub const LATE_LADDER: [(f64, i64); 4] = [(0.03, 7), (0.08, 5), (0.20, 3), (0.40, 2)];
const LATE_FALLBACK: i64 = 1;

const EARLY_BASE: f64 = 0.15;
const EARLY_QUALITY_WEIGHT: f64 = 0.5;
const LATENESS_EXPONENT: f64 = 1.5;

pub fn normalized_quality(quality: f64) -> f64 {
    ((quality - QUALITY_MIN) / (QUALITY_MAX - QUALITY_MIN)).clamp(0.0, 1.0)
}

/// Chance an off-schedule order is early rather than late.
pub fn early_probability(normalized: f64) -> f64 {
    EARLY_BASE + EARLY_QUALITY_WEIGHT * normalized
}

/// 1.0 for the best supplier, rising exponentially as quality falls.
pub fn lateness_factor(normalized: f64) -> f64 {
    ((1.0 - normalized) * LATENESS_EXPONENT).exp()
}

/// First rung whose scaled threshold exceeds `roll`.
pub fn resolve_ladder(ladder: &[(f64, i64)], roll: f64, scale: f64) -> Option<i64> {
    ladder
        .iter()
        .find(|(threshold, _)| roll < (threshold * scale).min(1.0))
        .map(|&(_, days)| days)
}

/// Days added to (or removed from) the base lead time for one order.
pub fn lead_time_adjustment(quality: f64, rng: &mut SeededRng) -> i64 {
    if rng.next_f64() < ON_TIME_SHARE {
        return 0;
    }
    let nq = normalized_quality(quality);
    if rng.chance(early_probability(nq)) {
        resolve_ladder(&EARLY_LADDER, rng.next_f64(), 0.5 + nq).unwrap_or(EARLY_FALLBACK)
    } else {
        resolve_ladder(&LATE_LADDER, rng.next_f64(), lateness_factor(nq)).unwrap_or(LATE_FALLBACK)
    }
}

/// Actual lead time for one order, floored at one day.
pub fn lead_time_days(base_lead_time: u32, quality: f64, rng: &mut SeededRng) -> i64 {
    (base_lead_time as i64 + lead_time_adjustment(quality, rng)).max(MIN_LEAD_TIME_DAYS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::RngAlgorithm;

    #[test]
    fn ladder_takes_first_matching_rung() {
        assert_eq!(resolve_ladder(&LATE_LADDER, 0.01, 1.0), Some(7));
        assert_eq!(resolve_ladder(&LATE_LADDER, 0.05, 1.0), Some(5));
        assert_eq!(resolve_ladder(&LATE_LADDER, 0.10, 1.0), Some(3));
        assert_eq!(resolve_ladder(&LATE_LADDER, 0.30, 1.0), Some(2));
        assert_eq!(resolve_ladder(&LATE_LADDER, 0.50, 1.0), None);
    }

    #[test]
    fn lateness_scaling_promotes_severity() {
        // 0.05 is a 5-day roll for a perfect supplier, 7 days for the worst.
        assert_eq!(resolve_ladder(&LATE_LADDER, 0.05, lateness_factor(1.0)), Some(5));
        assert_eq!(resolve_ladder(&LATE_LADDER, 0.05, lateness_factor(0.0)), Some(7));
    }

    #[test]
    fn scaled_thresholds_cap_at_one() {
        assert_eq!(resolve_ladder(&LATE_LADDER, 0.999, 10.0), Some(3));
    }

    #[test]
    fn quality_normalization() {
        assert_eq!(normalized_quality(0.7), 0.0);
        assert_eq!(normalized_quality(1.3), 1.0);
        assert!((normalized_quality(1.0) - 0.5).abs() < 1e-12);
        assert_eq!(normalized_quality(2.0), 1.0);
    }

    #[test]
    fn early_odds_rise_with_quality() {
        assert!(early_probability(1.0) > early_probability(0.0));
        assert!(lateness_factor(0.0) > lateness_factor(1.0));
        assert_eq!(lateness_factor(1.0), 1.0);
    }

    #[test]
    fn lead_time_stays_within_ladder_range() {
        let mut rng = SeededRng::new("lead-times", RngAlgorithm::Pcg64Mcg);
        let mut on_time = 0;
        for _ in 0..10_000 {
            let days = lead_time_days(5, 0.8, &mut rng);
            assert!((3..=12).contains(&days), "lead time {days} out of range");
            if days == 5 {
                on_time += 1;
            }
        }
        assert!(on_time > 6_500, "expected ~70% on time, got {on_time}");
    }

    #[test]
    fn lead_time_floors_at_one_day() {
        let mut rng = SeededRng::new("floor", RngAlgorithm::Pcg64Mcg);
        for _ in 0..10_000 {
            assert!(lead_time_days(1, 1.3, &mut rng) >= MIN_LEAD_TIME_DAYS);
        }
    }

    #[test]
    fn better_suppliers_are_late_less_often() {
        let late_share = |quality: f64| {
            let mut rng = SeededRng::new("late-share", RngAlgorithm::Pcg64Mcg);
            (0..20_000)
                .filter(|_| lead_time_adjustment(quality, &mut rng) > 0)
                .count()
        };
        assert!(late_share(1.25) < late_share(0.75));
    }
}
