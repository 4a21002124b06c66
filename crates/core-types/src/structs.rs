use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The five named trading-session anchors resolved against a table, relative
/// to a single reference date. Every field is a date that actually has data
/// in the underlying table; no strict ordering between the anchors is
/// guaranteed because each one is searched for independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDateSet {
    /// Most recent trading session.
    pub latest_date: NaiveDate,
    /// Fifth most recent trading session (roughly one week back).
    pub last_five_date: NaiveDate,
    /// Nearest session at or before the previous calendar quarter end.
    pub last_quarter_date: NaiveDate,
    /// First session at or after January 1st of the current year.
    pub first_year_date: NaiveDate,
    /// First session at or after the date one year ago.
    pub last_year_date: NaiveDate,
}

/// One (date, entity, value) observation fetched from a time-series table.
/// `code` is an instrument code for the instrument-level queries and an
/// industry code for the pre-aggregated industry queries.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct MetricRow {
    pub trade_date: NaiveDate,
    pub code: String,
    pub value: Option<Decimal>,
}

/// A single computed comparison between a "now" observation and an anchor
/// observation for one entity. `percent_change` is `None` exactly when the
/// anchor value is zero or absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceDelta {
    pub entity_code: String,
    pub as_of_date: NaiveDate,
    pub reference_date: NaiveDate,
    pub percent_change: Option<Decimal>,
}

/// Ranked price-change entry: one instrument with its delta against each of
/// the standard anchors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePerformanceRow {
    pub code: String,
    pub date: NaiveDate,
    pub per_five: Option<Decimal>,
    pub per_quarter: Option<Decimal>,
    pub per_year_start: Option<Decimal>,
    pub per_year: Option<Decimal>,
}

/// Ranked traded-value entry over the quarter-end anchor ladder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityPerformanceRow {
    pub code: String,
    pub date: NaiveDate,
    pub per_quarter: Option<Decimal>,
    pub per_year: Option<Decimal>,
    pub per_four_years: Option<Decimal>,
}

/// One point of the per-index market-cap change series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexChangePoint {
    pub date: NaiveDate,
    pub index_code: String,
    pub percent_change: Option<Decimal>,
}

/// One point of the per-industry liquidity change series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndustryChangePoint {
    pub date: NaiveDate,
    pub industry: String,
    pub percent_change: Option<Decimal>,
}
