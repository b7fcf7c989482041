//! Calendar generation — one UTC day per entry across N years.
//!
//! All arithmetic runs on year/month/day components (`NaiveDate`),
//! never on local-time deltas, so DST transitions cannot skip or
//! duplicate a day. Leap days are included whenever the range spans them.

use crate::{
    error::{SimError, SimResult},
    types::SimDate,
};
use chrono::{Datelike, Months};

/// Lazy, finite sequence of consecutive calendar days, both ends inclusive.
#[derive(Debug, Clone)]
pub struct CalendarDays {
    next: Option<SimDate>,
    last: SimDate,
}

impl CalendarDays {
    /// Days from `start` through `start + years - 1 day`.
    pub fn new(start: SimDate, years: u32) -> SimResult<Self> {
        if years == 0 {
            return Err(SimError::Config("calendar span must be at least one year".into()));
        }
        let last = years
            .checked_mul(12)
            .and_then(|months| start.checked_add_months(Months::new(months)))
            .and_then(|end| end.pred_opt())
            .ok_or_else(|| SimError::Config(format!("{years} years from {start} is out of range")))?;
        Ok(Self {
            next: Some(start),
            last,
        })
    }

    pub fn last_day(&self) -> SimDate {
        self.last
    }
}

impl Iterator for CalendarDays {
    type Item = SimDate;

    fn next(&mut self) -> Option<SimDate> {
        let current = self.next?;
        if current > self.last {
            self.next = None;
            return None;
        }
        self.next = current.succ_opt().filter(|d| *d <= self.last);
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = match self.next {
            Some(d) if d <= self.last => (self.last - d).num_days() as usize + 1,
            _ => 0,
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for CalendarDays {}

/// Collect the full calendar into a vector.
pub fn calendar_days(start: SimDate, years: u32) -> SimResult<Vec<SimDate>> {
    Ok(CalendarDays::new(start, years)?.collect())
}

/// Calendar quarter (1..=4) of a date.
pub fn quarter_of(date: SimDate) -> u32 {
    (date.month0() / 3) + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> SimDate {
        SimDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn one_year_ends_the_day_before_the_anniversary() {
        let days = CalendarDays::new(date(2021, 3, 14), 1).unwrap();
        assert_eq!(days.last_day(), date(2022, 3, 13));
        assert_eq!(days.len(), 365);
    }

    #[test]
    fn quarters() {
        assert_eq!(quarter_of(date(2022, 1, 1)), 1);
        assert_eq!(quarter_of(date(2022, 6, 30)), 2);
        assert_eq!(quarter_of(date(2022, 7, 1)), 3);
        assert_eq!(quarter_of(date(2022, 12, 31)), 4);
    }

    #[test]
    fn zero_years_is_rejected() {
        assert!(CalendarDays::new(date(2022, 1, 1), 0).is_err());
    }

    #[test]
    fn oversized_span_is_a_config_error() {
        assert!(matches!(
            CalendarDays::new(date(2022, 1, 1), u32::MAX),
            Err(SimError::Config(_))
        ));
        assert!(matches!(
            CalendarDays::new(date(2022, 1, 1), 1_000_000),
            Err(SimError::Config(_))
        ));
    }
}
