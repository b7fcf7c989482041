//! Inflation: quarterly-ish periods, lagged market influence, sane range.

use supplychain_core::{
    calendar::calendar_days,
    config::InflationParams,
    inflation::InflationGenerator,
    rng::{RngAlgorithm, SeededRng},
    types::SimDate,
};

fn dates() -> Vec<SimDate> {
    calendar_days(SimDate::from_ymd_opt(2020, 1, 1).unwrap(), 3).unwrap()
}

#[test]
fn one_rate_per_day_in_expected_range() {
    let dates = dates();
    let market = vec![0.65; dates.len()];
    let params = InflationParams::default();
    let mut rng = SeededRng::new("test-seed-inflation-LOC-A", RngAlgorithm::Pcg64Mcg);
    let series = InflationGenerator::new(&params).generate("LOC-A", &dates, &market, &mut rng);

    assert_eq!(series.rates.len(), dates.len());
    for (r, d) in series.rates.iter().zip(&dates) {
        assert_eq!(r.date, *d);
        assert!((0.0..=0.10).contains(&r.rate), "{}: rate {}", r.date, r.rate);
    }
}

#[test]
fn periods_tile_range_in_quarterly_spans() {
    let dates = dates();
    let market = vec![0.65; dates.len()];
    let params = InflationParams::default();
    let mut rng = SeededRng::new("periods", RngAlgorithm::Pcg64Mcg);
    let series = InflationGenerator::new(&params).generate("LOC-A", &dates, &market, &mut rng);

    assert_eq!(series.periods[0].start, dates[0]);
    assert_eq!(series.periods.last().unwrap().end, *dates.last().unwrap());
    for pair in series.periods.windows(2) {
        assert_eq!((pair[1].start - pair[0].end).num_days(), 1);
        let len = (pair[0].end - pair[0].start).num_days() + 1;
        assert!((90..=100).contains(&len), "period of {len} days");
    }
    for p in &series.periods {
        assert!((p.base_rate - params.base_rate).abs() <= params.base_rate_spread);
        assert!((params.volatility_min..params.volatility_max).contains(&p.volatility));
    }
}

#[test]
fn market_moves_reach_inflation_after_the_lag() {
    let dates = dates();
    let params = InflationParams {
        volatility_min: 0.0,
        volatility_max: 1e-12,
        ..InflationParams::default()
    };
    let step_day = 400;
    let market: Vec<f64> = (0..dates.len())
        .map(|i| if i < step_day { 0.4 } else { 0.9 })
        .collect();
    let mut rng = SeededRng::new("lag", RngAlgorithm::Pcg64Mcg);
    let series = InflationGenerator::new(&params).generate("LOC-A", &dates, &market, &mut rng);

    // Within one period the only day-to-day movement is the lagged market term.
    let period_of = |i: usize| {
        series
            .periods
            .iter()
            .position(|p| p.start <= dates[i] && dates[i] <= p.end)
            .unwrap()
    };
    let before = step_day + params.lag_days - 1;
    let after = step_day + params.lag_days;
    if period_of(before) == period_of(after) {
        let jump = series.rates[after].rate - series.rates[before].rate;
        assert!((jump - 0.5 * params.mti_influence).abs() < 1e-9, "jump {jump}");
    }
    let unlagged_before = step_day - 1;
    if period_of(unlagged_before) == period_of(step_day) {
        let jump = series.rates[step_day].rate - series.rates[unlagged_before].rate;
        assert!(jump.abs() < 1e-9, "market leaked through without lag: {jump}");
    }
}

#[test]
fn locations_get_independent_streams() {
    let dates = dates();
    let market = vec![0.65; dates.len()];
    let params = InflationParams::default();
    let generator = InflationGenerator::new(&params);
    let a = generator.generate("LOC-A", &dates, &market, &mut SeededRng::new("s-inflation-LOC-A", RngAlgorithm::Pcg64Mcg));
    let b = generator.generate("LOC-B", &dates, &market, &mut SeededRng::new("s-inflation-LOC-B", RngAlgorithm::Pcg64Mcg));
    assert_ne!(a.rates, b.rates);
}
