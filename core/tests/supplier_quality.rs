//! Supplier quality: scripted six-period stories, bounds, derived efficiency.

use supplychain_core::{
    calendar::calendar_days,
    config::{SimConfig, STORY_LENGTH},
    error::SimError,
    rng::{RngAlgorithm, SeededRng},
    supplier_quality::{
        derive_efficiency, SupplierQualityGenerator, EFFICIENCY_MAX, EFFICIENCY_MIN,
        QUALITY_MAX, QUALITY_MIN,
    },
    types::{SimDate, Trend},
};

fn dates(years: u32) -> Vec<SimDate> {
    calendar_days(SimDate::from_ymd_opt(2020, 1, 1).unwrap(), years).unwrap()
}

fn rng(supplier: &str) -> SeededRng {
    SeededRng::new(format!("test-seed-quality-{supplier}"), RngAlgorithm::Pcg64Mcg)
}

#[test]
fn every_point_within_bounds() {
    let config = SimConfig::default_test();
    let dates = dates(6);
    for supplier in &config.suppliers {
        let series = SupplierQualityGenerator::new(supplier)
            .generate(&dates, &mut rng(&supplier.id))
            .unwrap();
        assert_eq!(series.points.len(), dates.len());
        for p in &series.points {
            assert!(
                (QUALITY_MIN..=QUALITY_MAX).contains(&p.quality_index),
                "{} {}: quality {}", supplier.id, p.date, p.quality_index
            );
            assert!(
                (EFFICIENCY_MIN..=EFFICIENCY_MAX).contains(&p.efficiency_index),
                "{} {}: efficiency {}", supplier.id, p.date, p.efficiency_index
            );
        }
    }
}

#[test]
fn exactly_six_equal_periods_following_the_story() {
    let config = SimConfig::default_test();
    let dates = dates(3);
    for supplier in &config.suppliers {
        let series = SupplierQualityGenerator::new(supplier)
            .generate(&dates, &mut rng(&supplier.id))
            .unwrap();
        assert_eq!(series.periods.len(), STORY_LENGTH);
        assert_eq!(series.periods[0].start, dates[0]);
        assert_eq!(series.periods[STORY_LENGTH - 1].end, *dates.last().unwrap());

        let lengths: Vec<i64> = series
            .periods
            .iter()
            .map(|p| (p.end - p.start).num_days() + 1)
            .collect();
        let (min, max) = (lengths.iter().min().unwrap(), lengths.iter().max().unwrap());
        assert!(max - min <= 1, "{}: uneven periods {lengths:?}", supplier.id);

        for (period, beat) in series.periods.iter().zip(&supplier.story) {
            assert_eq!(period.trend, *beat);
            let delta = period.end_quality - period.start_quality;
            match beat {
                Trend::Up => assert!(delta >= 0.0, "{}: up period fell {delta}", supplier.id),
                Trend::Down => assert!(delta <= 0.0, "{}: down period rose {delta}", supplier.id),
                Trend::Stable => assert!(delta.abs() <= 0.01 + 1e-12),
            }
        }
        for pair in series.periods.windows(2) {
            assert_eq!(pair[0].end_quality, pair[1].start_quality);
        }
    }
}

#[test]
fn trend_moves_are_meaningful_away_from_bounds() {
    let config = SimConfig::default_test();
    let volume = config.supplier("SUP-VOLUME").unwrap();
    let series = SupplierQualityGenerator::new(volume)
        .generate(&dates(6), &mut rng(&volume.id))
        .unwrap();
    // Starts at 0.95 and falls twice: the first fall has full room to move.
    let first = &series.periods[0];
    let drop = first.start_quality - first.end_quality;
    assert!((0.08..=0.18).contains(&drop), "first down move was {drop}");
}

#[test]
fn efficiency_tracks_quality() {
    let config = SimConfig::default_test();
    let premium = config.supplier("SUP-PREMIUM").unwrap();
    let series = SupplierQualityGenerator::new(premium)
        .generate(&dates(2), &mut rng(&premium.id))
        .unwrap();
    for p in &series.points {
        let expected = derive_efficiency(p.quality_index, premium.efficiency_bias, 0.0);
        assert!(
            (p.efficiency_index - expected).abs() <= 0.005 + 1e-12,
            "{}: efficiency {} vs derived {expected}", p.date, p.efficiency_index
        );
    }
}

#[test]
fn bad_story_length_is_a_config_error() {
    let mut supplier = SimConfig::default_test().suppliers[0].clone();
    supplier.story.pop();
    let err = SupplierQualityGenerator::new(&supplier)
        .generate(&dates(1), &mut rng(&supplier.id))
        .unwrap_err();
    assert!(matches!(err, SimError::Config(_)));
}
