//! Calendar completeness: one UTC day per entry, no gaps, leap days kept.

use chrono::Datelike;
use supplychain_core::{
    calendar::{calendar_days, CalendarDays},
    types::SimDate,
};

fn date(y: i32, m: u32, d: u32) -> SimDate {
    SimDate::from_ymd_opt(y, m, d).unwrap()
}

fn assert_consecutive(days: &[SimDate]) {
    for pair in days.windows(2) {
        assert_eq!(
            (pair[1] - pair[0]).num_days(), 1,
            "gap or duplicate between {} and {}", pair[0], pair[1]
        );
    }
}

#[test]
fn january_start_counts_every_day_of_every_year() {
    for (start_year, years) in [(2019, 1), (2020, 1), (2019, 5), (2000, 3), (2099, 2)] {
        let days = calendar_days(date(start_year, 1, 1), years).unwrap();
        let expected: usize = (start_year..start_year + years as i32)
            .map(|y| date(y, 12, 31).ordinal() as usize)
            .sum();
        assert_eq!(days.len(), expected, "{start_year} + {years} years");
        assert_consecutive(&days);
        assert_eq!(days[0], date(start_year, 1, 1));
        assert_eq!(*days.last().unwrap(), date(start_year + years as i32 - 1, 12, 31));
    }
}

#[test]
fn leap_day_is_included_when_spanned() {
    let days = calendar_days(date(2021, 3, 1), 4).unwrap();
    assert_eq!(days.len(), 4 * 365 + 1);
    assert!(days.contains(&date(2024, 2, 29)));
    assert_eq!(*days.last().unwrap(), date(2025, 2, 28));
    assert_consecutive(&days);
}

#[test]
fn dst_transition_days_are_present_exactly_once() {
    let days = calendar_days(date(2021, 1, 1), 1).unwrap();
    for d in [date(2021, 3, 14), date(2021, 3, 28), date(2021, 10, 31), date(2021, 11, 7)] {
        assert_eq!(days.iter().filter(|x| **x == d).count(), 1, "{d}");
    }
    let march: Vec<_> = days.iter().filter(|d| d.month() == 3).collect();
    assert_eq!(march.len(), 31);
}

#[test]
fn iterator_is_lazy_and_exact_sized() {
    let mut days = CalendarDays::new(date(2022, 1, 1), 1).unwrap();
    assert_eq!(days.len(), 365);
    assert_eq!(days.next(), Some(date(2022, 1, 1)));
    assert_eq!(days.len(), 364);
    let rest: Vec<_> = days.by_ref().collect();
    assert_eq!(rest.len(), 364);
    assert_eq!(days.next(), None);
    assert_eq!(days.len(), 0);
}
