use crate::DbError;
use chrono::NaiveDate;
use core_types::{Floor, InstrumentType, MetricRow};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgPool;
use sqlx::FromRow;

/// Which logical store a query runs against. The market store carries the
/// industry aggregation tables; the server store carries the per-instrument
/// and per-index trade tables. Resolving the target through this enum keeps
/// the store handle fully typed at every call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreTarget {
    Market,
    Server,
}

impl StoreTarget {
    pub fn name(&self) -> &'static str {
        match self {
            StoreTarget::Market => "market",
            StoreTarget::Server => "server",
        }
    }
}

/// The time-series tables the performance pipeline reads. The two tables
/// have different granularity (instruments vs. composite indices), so every
/// query names its table through this enum instead of accepting a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeTable {
    TickerTrades,
    IndexTrades,
}

impl TradeTable {
    pub fn name(&self) -> &'static str {
        match self {
            TradeTable::TickerTrades => "ticker_trades",
            TradeTable::IndexTrades => "index_trades",
        }
    }

    pub fn date_column(&self) -> &'static str {
        "trade_date"
    }
}

/// The numeric column driving a comparison: closing price for price-change
/// performance, total traded value for the liquidity variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricColumn {
    ClosePrice,
    TradedValue,
}

impl MetricColumn {
    pub fn column(&self) -> &'static str {
        match self {
            MetricColumn::ClosePrice => "close_price",
            MetricColumn::TradedValue => "total_value",
        }
    }
}

/// One labeled row of the combined session-anchor query. The label replaces
/// positional indexing into the result set: `recent` rows carry the five most
/// recent distinct dates, the remaining labels carry one nearest-match date
/// each (NULL when the table has no date on the searched side of the target).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AnchorDateRow {
    pub anchor: String,
    pub trade_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, FromRow)]
struct NearestDateRow {
    trade_date: Option<NaiveDate>,
}

/// Both store adapters, shared by reference across all components.
#[derive(Debug, Clone)]
pub struct StoreSet {
    market: StoreRepository,
    server: StoreRepository,
}

impl StoreSet {
    pub fn new(market: StoreRepository, server: StoreRepository) -> Self {
        Self { market, server }
    }

    pub fn get(&self, target: StoreTarget) -> &StoreRepository {
        match target {
            StoreTarget::Market => &self.market,
            StoreTarget::Server => &self.server,
        }
    }
}

/// The `StoreRepository` provides a high-level, application-specific
/// interface to one time-series store. It encapsulates all SQL; every filter
/// value is bound as a parameter, never spliced into the query text. Table
/// and column names come from the enums above.
#[derive(Debug, Clone)]
pub struct StoreRepository {
    pool: PgPool,
}

impl StoreRepository {
    /// Creates a new `StoreRepository` with a shared connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Runs the combined session-anchor query: the five most recent distinct
    /// dates plus the nearest available date at or before the quarter
    /// reference and at or after the year-start and one-year references.
    ///
    /// One round trip; the caller maps the labeled rows into a
    /// `SessionDateSet` and decides whether the shape is complete.
    pub async fn session_anchor_rows(
        &self,
        table: TradeTable,
        quarter_ref: NaiveDate,
        year_start_ref: NaiveDate,
        year_ref: NaiveDate,
    ) -> Result<Vec<AnchorDateRow>, DbError> {
        let sql = format!(
            r#"
            SELECT 'recent' AS anchor, d.{date} AS trade_date
            FROM (
                SELECT DISTINCT {date}
                FROM {table}
                WHERE {date} IS NOT NULL
                ORDER BY {date} DESC
                LIMIT 5
            ) AS d
            UNION ALL
            SELECT 'quarter' AS anchor, MAX({date}) AS trade_date
            FROM {table}
            WHERE {date} <= $1
            UNION ALL
            SELECT 'year_start' AS anchor, MIN({date}) AS trade_date
            FROM {table}
            WHERE {date} >= $2
            UNION ALL
            SELECT 'year' AS anchor, MIN({date}) AS trade_date
            FROM {table}
            WHERE {date} >= $3
            "#,
            table = table.name(),
            date = table.date_column(),
        );

        let rows = sqlx::query_as::<_, AnchorDateRow>(&sql)
            .bind(quarter_ref)
            .bind(year_start_ref)
            .bind(year_ref)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// For each target date, finds the nearest available trading date at or
    /// before it. Results come back in target order; a `None` entry means the
    /// table holds no date at or before that target.
    pub async fn nearest_dates_at_or_before(
        &self,
        table: TradeTable,
        targets: &[NaiveDate],
    ) -> Result<Vec<Option<NaiveDate>>, DbError> {
        let sql = format!(
            r#"
            SELECT (
                SELECT MAX(t.{date})
                FROM {table} t
                WHERE t.{date} <= u.target_date
            ) AS trade_date
            FROM UNNEST($1::date[]) WITH ORDINALITY AS u(target_date, ord)
            ORDER BY u.ord
            "#,
            table = table.name(),
            date = table.date_column(),
        );

        let rows = sqlx::query_as::<_, NearestDateRow>(&sql)
            .bind(targets)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|r| r.trade_date).collect())
    }

    /// Fetches one metric observation per qualifying instrument for each of
    /// the given dates. The instrument dimension filters (floor, type,
    /// industry) are intersection predicates; an empty industry list means no
    /// industry restriction.
    pub async fn metric_rows(
        &self,
        metric: MetricColumn,
        dates: &[NaiveDate],
        floors: &[Floor],
        types: &[InstrumentType],
        industries: &[String],
    ) -> Result<Vec<MetricRow>, DbError> {
        let sql = format!(
            r#"
            SELECT t.trade_date, t.code, t.{metric} AS value
            FROM ticker_trades t
            INNER JOIN instruments i ON i.code = t.code
            WHERE t.trade_date = ANY($1)
              AND i.floor = ANY($2)
              AND i.instrument_type = ANY($3)
              AND (cardinality($4::text[]) = 0 OR i.industry = ANY($4))
            "#,
            metric = metric.column(),
        );

        let rows = sqlx::query_as::<_, MetricRow>(&sql)
            .bind(dates)
            .bind(floor_names(floors))
            .bind(type_names(types))
            .bind(industries)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Fetches index observations for the given codes over a closed date
    /// range, oldest first.
    pub async fn index_rows(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        codes: &[String],
    ) -> Result<Vec<MetricRow>, DbError> {
        let rows = sqlx::query_as::<_, MetricRow>(
            r#"
            SELECT trade_date, code, total_value AS value
            FROM index_trades
            WHERE trade_date >= $1
              AND trade_date <= $2
              AND code = ANY($3)
            ORDER BY trade_date, code
            "#,
        )
        .bind(start)
        .bind(end)
        .bind(codes)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Fetches traded value summed per (date, industry) over a closed date
    /// range. This is the coarser granularity the industry-level variant
    /// works at: the aggregation happens here, before the delta step ever
    /// sees the rows. Instruments without an industry code are excluded.
    pub async fn industry_value_rows(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        floors: &[Floor],
        types: &[InstrumentType],
        industries: &[String],
    ) -> Result<Vec<MetricRow>, DbError> {
        let rows = sqlx::query_as::<_, MetricRow>(
            r#"
            SELECT t.trade_date, i.industry AS code, SUM(t.total_value) AS value
            FROM ticker_trades t
            INNER JOIN instruments i ON i.code = t.code
            WHERE t.trade_date >= $1
              AND t.trade_date <= $2
              AND i.floor = ANY($3)
              AND i.instrument_type = ANY($4)
              AND i.industry <> ''
              AND (cardinality($5::text[]) = 0 OR i.industry = ANY($5))
            GROUP BY t.trade_date, i.industry
            ORDER BY t.trade_date, i.industry
            "#,
        )
        .bind(start)
        .bind(end)
        .bind(floor_names(floors))
        .bind(type_names(types))
        .bind(industries)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

fn floor_names(floors: &[Floor]) -> Vec<String> {
    floors.iter().map(|f| f.as_str().to_string()).collect()
}

fn type_names(types: &[InstrumentType]) -> Vec<String> {
    types.iter().map(|t| t.as_str().to_string()).collect()
}
