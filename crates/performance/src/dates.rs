//! Calendar arithmetic for the anchor reference dates.
//!
//! These helpers produce the *target* dates the resolver searches the trading
//! calendar around; they know nothing about which dates actually have data.

use chrono::{Datelike, NaiveDate};

/// January 1st of the year `reference` falls in.
pub fn year_start(reference: NaiveDate) -> NaiveDate {
    // Jan 1 exists in every year.
    NaiveDate::from_ymd_opt(reference.year(), 1, 1).expect("January 1st is always valid")
}

/// The same calendar day `years` years earlier, clamped backwards when the
/// day does not exist in the target year (Feb 29).
pub fn years_before(reference: NaiveDate, years: i32) -> NaiveDate {
    let year = reference.year() - years;
    let mut day = reference.day();
    loop {
        if let Some(date) = NaiveDate::from_ymd_opt(year, reference.month(), day) {
            return date;
        }
        day -= 1;
    }
}

/// The same calendar day one year earlier.
pub fn one_year_prior(reference: NaiveDate) -> NaiveDate {
    years_before(reference, 1)
}

/// The last day of the calendar quarter preceding the one `reference` falls
/// in.
pub fn previous_quarter_end(reference: NaiveDate) -> NaiveDate {
    let (year, month, day) = match reference.month() {
        1..=3 => (reference.year() - 1, 12, 31),
        4..=6 => (reference.year(), 3, 31),
        7..=9 => (reference.year(), 6, 30),
        _ => (reference.year(), 9, 30),
    };
    NaiveDate::from_ymd_opt(year, month, day).expect("quarter end is always valid")
}

/// The `count` most recent completed calendar quarter-end dates, newest
/// first.
pub fn past_quarter_ends(reference: NaiveDate, count: usize) -> Vec<NaiveDate> {
    let mut ends = Vec::with_capacity(count);
    let mut cursor = reference;
    for _ in 0..count {
        cursor = previous_quarter_end(cursor);
        ends.push(cursor);
    }
    ends
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn year_start_is_january_first() {
        assert_eq!(year_start(d(2024, 5, 17)), d(2024, 1, 1));
        assert_eq!(year_start(d(2024, 1, 1)), d(2024, 1, 1));
    }

    #[test]
    fn one_year_prior_keeps_calendar_day() {
        assert_eq!(one_year_prior(d(2024, 5, 17)), d(2023, 5, 17));
    }

    #[test]
    fn one_year_prior_clamps_leap_day() {
        assert_eq!(one_year_prior(d(2024, 2, 29)), d(2023, 2, 28));
    }

    #[test]
    fn years_before_spans_multiple_years() {
        assert_eq!(years_before(d(2023, 6, 30), 4), d(2019, 6, 30));
    }

    #[test]
    fn previous_quarter_end_per_quarter() {
        assert_eq!(previous_quarter_end(d(2024, 2, 10)), d(2023, 12, 31));
        assert_eq!(previous_quarter_end(d(2024, 4, 1)), d(2024, 3, 31));
        assert_eq!(previous_quarter_end(d(2024, 8, 20)), d(2024, 6, 30));
        assert_eq!(previous_quarter_end(d(2024, 11, 5)), d(2024, 9, 30));
    }

    #[test]
    fn past_quarter_ends_walks_backwards() {
        let ladder = past_quarter_ends(d(2023, 5, 20), 5);
        assert_eq!(
            ladder,
            vec![
                d(2023, 3, 31),
                d(2022, 12, 31),
                d(2022, 9, 30),
                d(2022, 6, 30),
                d(2022, 3, 31),
            ]
        );
    }
}
