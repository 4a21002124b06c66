//! Ordering and truncation of computed performance rows.

use chrono::NaiveDate;
use core_types::{LiquidityPerformanceRow, PricePerformanceRow};
use rust_decimal::Decimal;
use std::cmp::Ordering;

/// Hard cap on every ranked result set. This is not a page size; no further
/// pages exist.
pub const RESULT_LIMIT: usize = 50;

/// A row type that designates which of its per-anchor deltas drives the
/// ranking.
pub trait Rankable {
    fn sort_metric(&self) -> Option<Decimal>;
    fn code(&self) -> &str;
    fn date(&self) -> NaiveDate;
}

impl Rankable for PricePerformanceRow {
    fn sort_metric(&self) -> Option<Decimal> {
        self.per_five
    }
    fn code(&self) -> &str {
        &self.code
    }
    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl Rankable for LiquidityPerformanceRow {
    fn sort_metric(&self) -> Option<Decimal> {
        self.per_quarter
    }
    fn code(&self) -> &str {
        &self.code
    }
    fn date(&self) -> NaiveDate {
        self.date
    }
}

/// Sorts rows descending by their designated metric and keeps the first
/// `limit` entries, never more than [`RESULT_LIMIT`] regardless of what the
/// caller configures.
///
/// Null metrics sort last regardless of direction (stores disagree on their
/// default here, so the policy is explicit). Ties break ascending by entity
/// code, then descending by date.
pub fn rank<T: Rankable>(mut rows: Vec<T>, limit: usize) -> Vec<T> {
    rows.sort_by(|a, b| {
        compare_metric(a.sort_metric(), b.sort_metric())
            .then_with(|| a.code().cmp(b.code()))
            .then_with(|| b.date().cmp(&a.date()))
    });
    rows.truncate(limit.min(RESULT_LIMIT));
    rows
}

fn compare_metric(a: Option<Decimal>, b: Option<Decimal>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn row(code: &str, per_five: Option<Decimal>) -> PricePerformanceRow {
        PricePerformanceRow {
            code: code.to_string(),
            date: d(2024, 5, 17),
            per_five,
            per_quarter: None,
            per_year_start: None,
            per_year: None,
        }
    }

    #[test]
    fn ranks_descending_by_metric() {
        let ranked = rank(
            vec![
                row("AAA", Some(dec!(1.5))),
                row("BBB", Some(dec!(12.0))),
                row("CCC", Some(dec!(-3.25))),
            ],
            RESULT_LIMIT,
        );
        let codes: Vec<&str> = ranked.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["BBB", "AAA", "CCC"]);
    }

    #[test]
    fn null_metrics_rank_after_all_non_null_rows() {
        let ranked = rank(
            vec![
                row("AAA", None),
                row("BBB", Some(dec!(-50))),
                row("CCC", Some(dec!(2))),
            ],
            RESULT_LIMIT,
        );
        let codes: Vec<&str> = ranked.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["CCC", "BBB", "AAA"]);
    }

    #[test]
    fn equal_metrics_break_ties_by_code_ascending() {
        let ranked = rank(
            vec![
                row("VNM", Some(dec!(4.0))),
                row("ACB", Some(dec!(4.0))),
            ],
            RESULT_LIMIT,
        );
        let codes: Vec<&str> = ranked.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["ACB", "VNM"]);
    }

    #[test]
    fn equal_code_and_metric_break_ties_by_date_descending() {
        let mut older = row("AAA", Some(dec!(4.0)));
        older.date = d(2024, 5, 10);
        let newer = row("AAA", Some(dec!(4.0)));
        let ranked = rank(vec![older, newer], RESULT_LIMIT);
        assert_eq!(ranked[0].date, d(2024, 5, 17));
        assert_eq!(ranked[1].date, d(2024, 5, 10));
    }

    #[test]
    fn output_never_exceeds_the_hard_cap() {
        let rows: Vec<PricePerformanceRow> = (0..120)
            .map(|i| row(&format!("C{i:03}"), Some(Decimal::from(i))))
            .collect();
        let ranked = rank(rows, RESULT_LIMIT);
        assert_eq!(ranked.len(), RESULT_LIMIT);
        // Top entry is the largest metric.
        assert_eq!(ranked[0].per_five, Some(Decimal::from(119)));
    }

    #[test]
    fn configured_limit_cannot_exceed_the_hard_cap() {
        let rows: Vec<PricePerformanceRow> = (0..120)
            .map(|i| row(&format!("C{i:03}"), Some(Decimal::from(i))))
            .collect();
        let ranked = rank(rows, 200);
        assert_eq!(ranked.len(), RESULT_LIMIT);
    }
}
