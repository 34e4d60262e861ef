//! Inclusive calendar-day enumeration

use chrono::{Days, NaiveDate};

use crate::error::ConfigError;

/// Date format accepted on the command line
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Closed interval of calendar days. `start > end` enumerates nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Parse both endpoints as `YYYY-MM-DD`
    pub fn parse(start: &str, end: &str) -> Result<Self, ConfigError> {
        Ok(Self::new(parse_date(start)?, parse_date(end)?))
    }

    /// Number of days in the range, both endpoints included
    pub fn len(&self) -> usize {
        if self.start > self.end {
            return 0;
        }
        (self.end - self.start).num_days() as usize + 1
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    /// Lazy iterator over every day from `start` to `end`
    pub fn days(&self) -> DayIter {
        DayIter {
            next: (!self.is_empty()).then_some(self.start),
            end: self.end,
            remaining: self.len(),
        }
    }
}

impl IntoIterator for DateRange {
    type Item = NaiveDate;
    type IntoIter = DayIter;

    fn into_iter(self) -> DayIter {
        self.days()
    }
}

/// Iterator returned by [`DateRange::days`]
#[derive(Debug, Clone)]
pub struct DayIter {
    next: Option<NaiveDate>,
    end: NaiveDate,
    remaining: usize,
}

impl Iterator for DayIter {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let current = self.next?;
        self.next = if current < self.end {
            current.checked_add_days(Days::new(1))
        } else {
            None
        };
        self.remaining -= 1;
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for DayIter {}

/// Parse a `YYYY-MM-DD` date, reporting the offending input on failure
pub fn parse_date(s: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).map_err(|e| ConfigError::InvalidDate {
        value: s.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    #[test]
    fn three_days_inclusive() {
        let range = DateRange::new(d("2020-01-01"), d("2020-01-03"));
        let days: Vec<_> = range.days().collect();
        assert_eq!(days, vec![d("2020-01-01"), d("2020-01-02"), d("2020-01-03")]);
        assert_eq!(range.len(), 3);
    }

    #[test]
    fn single_day() {
        let range = DateRange::new(d("2020-01-05"), d("2020-01-05"));
        assert_eq!(range.days().collect::<Vec<_>>(), vec![d("2020-01-05")]);
    }

    #[test]
    fn reversed_is_empty() {
        let range = DateRange::new(d("2020-01-05"), d("2020-01-04"));
        assert!(range.is_empty());
        assert_eq!(range.len(), 0);
        assert_eq!(range.days().count(), 0);
    }

    #[test]
    fn crosses_month_and_leap_day() {
        let days: Vec<_> = DateRange::new(d("2020-02-28"), d("2020-03-01"))
            .days()
            .collect();
        assert_eq!(days, vec![d("2020-02-28"), d("2020-02-29"), d("2020-03-01")]);
    }

    #[test]
    fn crosses_year() {
        let range = DateRange::new(d("2019-12-31"), d("2020-01-01"));
        assert_eq!(range.days().collect::<Vec<_>>(), vec![d("2019-12-31"), d("2020-01-01")]);
    }

    #[test]
    fn multi_year_length_and_order() {
        let range = DateRange::new(d("2009-01-31"), d("2020-12-31"));
        let days: Vec<_> = range.days().collect();
        assert_eq!(days.len(), range.len());
        assert_eq!(days.len() as i64, (range.end - range.start).num_days() + 1);
        assert_eq!(days.first(), Some(&range.start));
        assert_eq!(days.last(), Some(&range.end));
        assert!(days.windows(2).all(|w| (w[1] - w[0]).num_days() == 1));
    }

    #[test]
    fn exact_size_hint() {
        let mut days = DateRange::new(d("2021-06-01"), d("2021-06-10")).days();
        assert_eq!(days.len(), 10);
        days.next();
        assert_eq!(days.len(), 9);
    }

    #[test]
    fn restartable() {
        let range = DateRange::new(d("2020-01-01"), d("2020-01-31"));
        let a: Vec<_> = range.days().collect();
        let b: Vec<_> = range.into_iter().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(matches!(
            DateRange::parse("2020-01-01", "2020-02-30"),
            Err(ConfigError::InvalidDate { .. })
        ));
        assert!(DateRange::parse("yesterday", "2020-01-01").is_err());
    }

    #[test]
    fn parse_accepts_padding() {
        let range = DateRange::parse(" 2020-01-01", "2020-01-02 ").unwrap();
        assert_eq!(range.len(), 2);
    }
}
