//! Window-type to anchor-date selection for the windowed operations.

use chrono::NaiveDate;
use core_types::{SessionDateSet, WindowType};

/// Maps a comparison window onto the session anchor the change series starts
/// from. Every window variant has its own arm and its own field; the month
/// window resolves to the previous-quarter anchor, the coarsest sub-year
/// anchor the session-date set carries.
pub fn select_start_date(window: WindowType, sessions: &SessionDateSet) -> NaiveDate {
    match window {
        WindowType::Week => sessions.last_five_date,
        WindowType::Month => sessions.last_quarter_date,
        WindowType::YearStart => sessions.first_year_date,
        WindowType::Year => sessions.last_year_date,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn sessions() -> SessionDateSet {
        SessionDateSet {
            latest_date: d(2024, 5, 17),
            last_five_date: d(2024, 5, 13),
            last_quarter_date: d(2024, 3, 29),
            first_year_date: d(2024, 1, 2),
            last_year_date: d(2023, 5, 17),
        }
    }

    #[test]
    fn every_window_selects_its_own_anchor() {
        let s = sessions();
        assert_eq!(select_start_date(WindowType::Week, &s), s.last_five_date);
        assert_eq!(select_start_date(WindowType::Month, &s), s.last_quarter_date);
        assert_eq!(
            select_start_date(WindowType::YearStart, &s),
            s.first_year_date
        );
        assert_eq!(select_start_date(WindowType::Year, &s), s.last_year_date);
    }

    #[test]
    fn month_window_is_not_the_week_anchor() {
        let s = sessions();
        assert_ne!(
            select_start_date(WindowType::Month, &s),
            select_start_date(WindowType::Week, &s)
        );
        assert_eq!(select_start_date(WindowType::Month, &s), d(2024, 3, 29));
    }

    #[test]
    fn unsupported_window_strings_fail_to_parse() {
        assert!("decade".parse::<WindowType>().is_err());
        assert!("month".parse::<WindowType>().is_ok());
    }
}
