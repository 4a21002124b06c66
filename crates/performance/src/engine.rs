//! The performance computation engine: joins "now" observations against
//! anchor observations per entity, computes null-safe percentage deltas, and
//! shapes the four public operations' payloads.

use crate::dates::{past_quarter_ends, years_before};
use crate::error::PerformanceError;
use crate::ranking;
use crate::resolver::SessionDateResolver;
use crate::window::select_start_date;
use cache::{filter_key, get_or_compute, CacheStore};
use chrono::{NaiveDate, Utc};
use core_types::{
    ExchangeFilter, Floor, IndexChangePoint, IndustryChangePoint, InstrumentType,
    LiquidityPerformanceRow, MetricRow, PerformanceDelta, PricePerformanceRow, SessionDateSet,
    WindowType,
};
use database::{MetricColumn, StoreSet, StoreTarget, TradeTable};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::future::Future;
use std::time::Duration;

/// Whether an anchor row must be strictly older than the "now" row, or may
/// share its date. The industry-aggregate series uses the inclusive mode so
/// the start date reports a baseline row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinMode {
    Strict,
    Inclusive,
}

/// The intersection predicates applied identically to both sides of every
/// instrument-level join. An empty industry list means no restriction.
#[derive(Debug, Clone)]
pub struct QueryFilters {
    pub floors: Vec<Floor>,
    pub types: Vec<InstrumentType>,
    pub industries: Vec<String>,
}

impl QueryFilters {
    pub fn from_request(exchange: &str, industries: &[String]) -> Result<Self, PerformanceError> {
        let exchange_filter: ExchangeFilter = exchange.parse()?;
        let industries = industries
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        Ok(Self {
            floors: exchange_filter.floors(),
            types: InstrumentType::TRADEABLE.to_vec(),
            industries,
        })
    }

    fn floor_names(&self) -> Vec<String> {
        self.floors.iter().map(|f| f.as_str().to_string()).collect()
    }
}

/// The resolved anchor dates for the liquidity quarter ladder.
#[derive(Debug, Clone, Copy)]
struct LiquidityAnchors {
    now_date: NaiveDate,
    quarter_date: NaiveDate,
    year_date: NaiveDate,
    four_years_date: NaiveDate,
}

/// Stateless per-request computation over the shared store and cache
/// adapters. All state lives in the collaborators; the engine itself only
/// holds configuration.
#[derive(Debug, Clone)]
pub struct PerformanceEngine {
    stores: StoreSet,
    resolver: SessionDateResolver,
    cache: CacheStore,
    request_timeout: Duration,
    result_limit: usize,
}

impl PerformanceEngine {
    pub fn new(
        stores: StoreSet,
        cache: CacheStore,
        request_timeout: Duration,
        result_limit: usize,
    ) -> Self {
        let resolver = SessionDateResolver::new(stores.clone(), cache.clone());
        Self {
            stores,
            resolver,
            cache,
            request_timeout,
            result_limit,
        }
    }

    /// Ranked top-N price change per instrument against the four standard
    /// anchors, ordered by the five-session delta.
    pub async fn price_change_performance(
        &self,
        exchange: &str,
        industries: &[String],
    ) -> Result<Vec<PricePerformanceRow>, PerformanceError> {
        let filters = QueryFilters::from_request(exchange, industries)?;
        self.with_deadline(self.price_change_inner(&filters)).await
    }

    async fn price_change_inner(
        &self,
        filters: &QueryFilters,
    ) -> Result<Vec<PricePerformanceRow>, PerformanceError> {
        let sessions = self
            .resolver
            .resolve(StoreTarget::Server, TradeTable::TickerTrades, today())
            .await?;
        let anchor_dates = [
            sessions.last_five_date,
            sessions.last_quarter_date,
            sessions.first_year_date,
            sessions.last_year_date,
        ];

        let store = self.stores.get(StoreTarget::Server);
        let now_dates = [sessions.latest_date];
        // The two fetches have no ordering dependency; overlap them.
        let (now_rows, anchor_rows) = tokio::try_join!(
            store.metric_rows(
                MetricColumn::ClosePrice,
                &now_dates,
                &filters.floors,
                &filters.types,
                &filters.industries,
            ),
            store.metric_rows(
                MetricColumn::ClosePrice,
                &anchor_dates,
                &filters.floors,
                &filters.types,
                &filters.industries,
            ),
        )?;

        let deltas = join_deltas(&now_rows, &anchor_rows, JoinMode::Strict);
        tracing::debug!(deltas = deltas.len(), "computed price change deltas");
        let rows = pivot_price_rows(deltas, &sessions);
        Ok(ranking::rank(rows, self.result_limit))
    }

    /// Ranked top-N traded-value change per instrument over the quarter-end
    /// anchor ladder, ordered by the one-quarter delta. The full payload is
    /// result-cached by filter set.
    pub async fn liquidity_change_performance(
        &self,
        exchange: &str,
        industries: &[String],
    ) -> Result<Vec<LiquidityPerformanceRow>, PerformanceError> {
        let filters = QueryFilters::from_request(exchange, industries)?;
        let key = liquidity_cache_key(&filters);
        get_or_compute(&self.cache, &key, || {
            self.with_deadline(self.liquidity_inner(&filters))
        })
        .await
    }

    async fn liquidity_inner(
        &self,
        filters: &QueryFilters,
    ) -> Result<Vec<LiquidityPerformanceRow>, PerformanceError> {
        let ladder = past_quarter_ends(today(), 5);
        // Newest quarter-end is the "now" side; one quarter back, one year
        // back (index 4 of the ladder) and four years back are the anchors.
        let targets = vec![ladder[0], ladder[1], ladder[4], years_before(ladder[0], 4)];

        let store = self.stores.get(StoreTarget::Server);
        let resolved = store
            .nearest_dates_at_or_before(TradeTable::TickerTrades, &targets)
            .await?;
        let anchors = liquidity_anchors_from_dates(&resolved)?;

        let now_dates = [anchors.now_date];
        let anchor_dates = [anchors.quarter_date, anchors.year_date, anchors.four_years_date];
        let (now_rows, anchor_rows) = tokio::try_join!(
            store.metric_rows(
                MetricColumn::TradedValue,
                &now_dates,
                &filters.floors,
                &filters.types,
                &filters.industries,
            ),
            store.metric_rows(
                MetricColumn::TradedValue,
                &anchor_dates,
                &filters.floors,
                &filters.types,
                &filters.industries,
            ),
        )?;

        let deltas = join_deltas(&now_rows, &anchor_rows, JoinMode::Strict);
        tracing::debug!(deltas = deltas.len(), "computed liquidity change deltas");
        let rows = pivot_liquidity_rows(deltas, &anchors);
        Ok(ranking::rank(rows, self.result_limit))
    }

    /// Per-index market-cap change series between the selected window start
    /// and the latest session, baselined on the start-date observation.
    pub async fn market_cap_change_performance(
        &self,
        exchange: &str,
        _industries: &[String],
        window: &str,
    ) -> Result<Vec<IndexChangePoint>, PerformanceError> {
        let exchange_filter: ExchangeFilter = exchange.parse()?;
        let window: WindowType = window.parse()?;
        self.with_deadline(self.market_cap_inner(exchange_filter, window))
            .await
    }

    async fn market_cap_inner(
        &self,
        exchange: ExchangeFilter,
        window: WindowType,
    ) -> Result<Vec<IndexChangePoint>, PerformanceError> {
        let sessions = self
            .resolver
            .resolve(StoreTarget::Server, TradeTable::IndexTrades, today())
            .await?;
        let start = select_start_date(window, &sessions);
        let codes: Vec<String> = exchange
            .floors()
            .iter()
            .map(|f| f.index_code().to_string())
            .collect();

        let rows = self
            .stores
            .get(StoreTarget::Server)
            .index_rows(start, sessions.latest_date, &codes)
            .await?;

        let series = change_series(&rows, start, JoinMode::Strict);
        Ok(series
            .into_iter()
            .map(|delta| IndexChangePoint {
                date: delta.as_of_date,
                index_code: delta.entity_code,
                percent_change: delta.percent_change,
            })
            .collect())
    }

    /// Per-industry traded-value change series between the selected window
    /// start and the latest session. Industry sums are aggregated in the
    /// store before the delta step; the join is inclusive so every industry
    /// reports a baseline point at the start date.
    pub async fn industry_liquidity_change_performance(
        &self,
        exchange: &str,
        industries: &[String],
        window: &str,
    ) -> Result<Vec<IndustryChangePoint>, PerformanceError> {
        let filters = QueryFilters::from_request(exchange, industries)?;
        let window: WindowType = window.parse()?;
        self.with_deadline(self.industry_liquidity_inner(&filters, window))
            .await
    }

    async fn industry_liquidity_inner(
        &self,
        filters: &QueryFilters,
        window: WindowType,
    ) -> Result<Vec<IndustryChangePoint>, PerformanceError> {
        let sessions = self
            .resolver
            .resolve(StoreTarget::Server, TradeTable::TickerTrades, today())
            .await?;
        let start = select_start_date(window, &sessions);

        let rows = self
            .stores
            .get(StoreTarget::Market)
            .industry_value_rows(
                start,
                sessions.latest_date,
                &filters.floors,
                &filters.types,
                &filters.industries,
            )
            .await?;

        let series = change_series(&rows, start, JoinMode::Inclusive);
        Ok(series
            .into_iter()
            .map(|delta| IndustryChangePoint {
                date: delta.as_of_date,
                industry: delta.entity_code,
                percent_change: delta.percent_change,
            })
            .collect())
    }

    /// Applies the per-request deadline covering all store calls. Exceeding
    /// it fails the whole request; no partial results.
    async fn with_deadline<T>(
        &self,
        fut: impl Future<Output = Result<T, PerformanceError>>,
    ) -> Result<T, PerformanceError> {
        match tokio::time::timeout(self.request_timeout, fut).await {
            Ok(result) => result,
            Err(_elapsed) => Err(PerformanceError::DeadlineExceeded(self.request_timeout)),
        }
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Deterministic result-cache key for the liquidity payload: every filter
/// component is sorted and deduplicated, so two logically identical requests
/// produce byte-identical keys regardless of parameter order.
fn liquidity_cache_key(filters: &QueryFilters) -> String {
    format!(
        "liquidity-change-performance:{}:{}",
        filter_key(&filters.floor_names()),
        filter_key(&filters.industries),
    )
}

fn liquidity_anchors_from_dates(
    resolved: &[Option<NaiveDate>],
) -> Result<LiquidityAnchors, PerformanceError> {
    match resolved {
        [Some(now), Some(quarter), Some(year), Some(four_years)] => Ok(LiquidityAnchors {
            now_date: *now,
            quarter_date: *quarter,
            year_date: *year,
            four_years_date: *four_years,
        }),
        _ => Err(PerformanceError::DataIntegrity(
            "one or more quarter anchors have no session at or before the target".to_string(),
        )),
    }
}

/// `percent_change = (now - anchor) / anchor * 100`, defined as `None`
/// whenever the anchor value is zero or absent. Never a runtime error.
pub fn percent_change(now: Option<Decimal>, anchor: Option<Decimal>) -> Option<Decimal> {
    match (now, anchor) {
        (Some(n), Some(a)) if !a.is_zero() => Some((n - a) / a * Decimal::ONE_HUNDRED),
        _ => None,
    }
}

/// Joins "now" rows against anchor rows per entity code and computes one
/// delta per matched pair.
///
/// Duplicate (now date, anchor date, code, now value, anchor value)
/// combinations reduce to a single delta, matching the one-answer-per-pair
/// invariant even when the source queries return redundant rows.
pub fn join_deltas(
    now_rows: &[MetricRow],
    anchor_rows: &[MetricRow],
    mode: JoinMode,
) -> Vec<PerformanceDelta> {
    let mut anchors_by_code: HashMap<&str, Vec<&MetricRow>> = HashMap::new();
    for row in anchor_rows {
        anchors_by_code.entry(row.code.as_str()).or_default().push(row);
    }

    let mut seen: HashSet<(NaiveDate, NaiveDate, &str, Option<Decimal>, Option<Decimal>)> =
        HashSet::new();
    let mut deltas = Vec::new();
    for now in now_rows {
        let Some(anchors) = anchors_by_code.get(now.code.as_str()) else {
            continue;
        };
        for anchor in anchors {
            let matched = match mode {
                JoinMode::Strict => anchor.trade_date < now.trade_date,
                JoinMode::Inclusive => anchor.trade_date <= now.trade_date,
            };
            if !matched {
                continue;
            }
            if !seen.insert((
                now.trade_date,
                anchor.trade_date,
                now.code.as_str(),
                now.value,
                anchor.value,
            )) {
                continue;
            }
            deltas.push(PerformanceDelta {
                entity_code: now.code.clone(),
                as_of_date: now.trade_date,
                reference_date: anchor.trade_date,
                percent_change: percent_change(now.value, anchor.value),
            });
        }
    }
    deltas
}

/// Pivots instrument deltas into one row per code with the delta against
/// each named anchor. Anchors that resolved to the same calendar date fill
/// every matching field.
fn pivot_price_rows(
    deltas: Vec<PerformanceDelta>,
    sessions: &SessionDateSet,
) -> Vec<PricePerformanceRow> {
    let mut rows: BTreeMap<String, PricePerformanceRow> = BTreeMap::new();
    for delta in deltas {
        let row = rows
            .entry(delta.entity_code.clone())
            .or_insert_with(|| PricePerformanceRow {
                code: delta.entity_code.clone(),
                date: delta.as_of_date,
                per_five: None,
                per_quarter: None,
                per_year_start: None,
                per_year: None,
            });
        if delta.reference_date == sessions.last_five_date {
            row.per_five = delta.percent_change;
        }
        if delta.reference_date == sessions.last_quarter_date {
            row.per_quarter = delta.percent_change;
        }
        if delta.reference_date == sessions.first_year_date {
            row.per_year_start = delta.percent_change;
        }
        if delta.reference_date == sessions.last_year_date {
            row.per_year = delta.percent_change;
        }
    }
    rows.into_values().collect()
}

fn pivot_liquidity_rows(
    deltas: Vec<PerformanceDelta>,
    anchors: &LiquidityAnchors,
) -> Vec<LiquidityPerformanceRow> {
    let mut rows: BTreeMap<String, LiquidityPerformanceRow> = BTreeMap::new();
    for delta in deltas {
        let row = rows
            .entry(delta.entity_code.clone())
            .or_insert_with(|| LiquidityPerformanceRow {
                code: delta.entity_code.clone(),
                date: delta.as_of_date,
                per_quarter: None,
                per_year: None,
                per_four_years: None,
            });
        if delta.reference_date == anchors.quarter_date {
            row.per_quarter = delta.percent_change;
        }
        if delta.reference_date == anchors.year_date {
            row.per_year = delta.percent_change;
        }
        if delta.reference_date == anchors.four_years_date {
            row.per_four_years = delta.percent_change;
        }
    }
    rows.into_values().collect()
}

/// Turns a range of observations into a change series against the start-date
/// baseline, ordered by date then entity.
fn change_series(rows: &[MetricRow], start: NaiveDate, mode: JoinMode) -> Vec<PerformanceDelta> {
    let baseline: Vec<MetricRow> = rows
        .iter()
        .filter(|r| r.trade_date == start)
        .cloned()
        .collect();
    let mut deltas = join_deltas(rows, &baseline, mode);
    deltas.sort_by(|a, b| {
        a.as_of_date
            .cmp(&b.as_of_date)
            .then_with(|| a.entity_code.cmp(&b.entity_code))
    });
    deltas
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn mrow(date: NaiveDate, code: &str, value: Option<Decimal>) -> MetricRow {
        MetricRow {
            trade_date: date,
            code: code.to_string(),
            value,
        }
    }

    #[test]
    fn percent_change_matches_worked_example() {
        // now = 100 at 2024-01-02, anchor = 80 at 2023-10-02 -> 25.0
        assert_eq!(
            percent_change(Some(dec!(100)), Some(dec!(80))),
            Some(dec!(25.0))
        );
    }

    #[test]
    fn percent_change_is_null_iff_anchor_zero_or_absent() {
        assert_eq!(percent_change(Some(dec!(100)), Some(Decimal::ZERO)), None);
        assert_eq!(percent_change(Some(dec!(100)), None), None);
        assert_eq!(percent_change(None, Some(dec!(80))), None);
        assert!(percent_change(Some(dec!(90)), Some(dec!(80))).is_some());
    }

    #[test]
    fn join_is_strict_on_anchor_date_by_default() {
        let now = vec![mrow(d(2024, 1, 2), "AAA", Some(dec!(100)))];
        let anchors = vec![
            mrow(d(2023, 10, 2), "AAA", Some(dec!(80))),
            mrow(d(2024, 1, 2), "AAA", Some(dec!(100))),
        ];
        let deltas = join_deltas(&now, &anchors, JoinMode::Strict);
        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].reference_date, d(2023, 10, 2));
        assert_eq!(deltas[0].percent_change, Some(dec!(25.0)));
    }

    #[test]
    fn inclusive_join_keeps_the_same_date_pair() {
        let now = vec![mrow(d(2024, 1, 2), "AAA", Some(dec!(100)))];
        let anchors = vec![mrow(d(2024, 1, 2), "AAA", Some(dec!(100)))];
        let deltas = join_deltas(&now, &anchors, JoinMode::Inclusive);
        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].percent_change, Some(Decimal::ZERO));
    }

    #[test]
    fn join_never_pairs_across_entity_codes() {
        let now = vec![mrow(d(2024, 1, 2), "AAA", Some(dec!(100)))];
        let anchors = vec![mrow(d(2023, 10, 2), "BBB", Some(dec!(80)))];
        assert!(join_deltas(&now, &anchors, JoinMode::Strict).is_empty());
    }

    #[test]
    fn duplicate_combinations_reduce_to_one_delta() {
        let now = vec![
            mrow(d(2024, 1, 2), "AAA", Some(dec!(100))),
            mrow(d(2024, 1, 2), "AAA", Some(dec!(100))),
        ];
        let anchors = vec![mrow(d(2023, 10, 2), "AAA", Some(dec!(80)))];
        let deltas = join_deltas(&now, &anchors, JoinMode::Strict);
        assert_eq!(deltas.len(), 1);
    }

    #[test]
    fn pivot_assigns_each_delta_to_its_anchor_field() {
        let sessions = SessionDateSet {
            latest_date: d(2024, 5, 17),
            last_five_date: d(2024, 5, 13),
            last_quarter_date: d(2024, 3, 29),
            first_year_date: d(2024, 1, 2),
            last_year_date: d(2023, 5, 19),
        };
        let now = vec![mrow(sessions.latest_date, "AAA", Some(dec!(120)))];
        let anchors = vec![
            mrow(sessions.last_five_date, "AAA", Some(dec!(100))),
            mrow(sessions.last_quarter_date, "AAA", Some(dec!(80))),
            mrow(sessions.first_year_date, "AAA", Some(dec!(60))),
            mrow(sessions.last_year_date, "AAA", Some(Decimal::ZERO)),
        ];
        let rows = pivot_price_rows(
            join_deltas(&now, &anchors, JoinMode::Strict),
            &sessions,
        );
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.date, sessions.latest_date);
        assert_eq!(row.per_five, Some(dec!(20.0)));
        assert_eq!(row.per_quarter, Some(dec!(50.0)));
        assert_eq!(row.per_year_start, Some(dec!(100.0)));
        // Zero anchor value stays null rather than erroring.
        assert_eq!(row.per_year, None);
    }

    #[test]
    fn change_series_baselines_on_the_start_date() {
        let start = d(2024, 5, 13);
        let rows = vec![
            mrow(start, "VNINDEX", Some(dec!(200))),
            mrow(d(2024, 5, 14), "VNINDEX", Some(dec!(210))),
            mrow(d(2024, 5, 15), "VNINDEX", Some(dec!(190))),
        ];
        let series = change_series(&rows, start, JoinMode::Strict);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].as_of_date, d(2024, 5, 14));
        assert_eq!(series[0].percent_change, Some(dec!(5.0)));
        assert_eq!(series[1].percent_change, Some(dec!(-5.0)));
    }

    #[test]
    fn inclusive_change_series_reports_a_zero_baseline_point() {
        let start = d(2024, 5, 13);
        let rows = vec![
            mrow(start, "Banks", Some(dec!(50))),
            mrow(d(2024, 5, 14), "Banks", Some(dec!(75))),
        ];
        let series = change_series(&rows, start, JoinMode::Inclusive);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].as_of_date, start);
        assert_eq!(series[0].percent_change, Some(Decimal::ZERO));
        assert_eq!(series[1].percent_change, Some(dec!(50.0)));
    }

    #[test]
    fn liquidity_anchor_shape_is_all_or_nothing() {
        let full = vec![
            Some(d(2023, 3, 31)),
            Some(d(2022, 12, 30)),
            Some(d(2022, 3, 31)),
            Some(d(2019, 3, 29)),
        ];
        assert!(liquidity_anchors_from_dates(&full).is_ok());

        let partial = vec![
            Some(d(2023, 3, 31)),
            Some(d(2022, 12, 30)),
            None,
            Some(d(2019, 3, 29)),
        ];
        let err = liquidity_anchors_from_dates(&partial).unwrap_err();
        assert!(matches!(err, PerformanceError::DataIntegrity(_)));
    }

    #[test]
    fn liquidity_cache_key_ignores_filter_ordering() {
        let a = QueryFilters::from_request(
            "ALL",
            &["8300".to_string(), "0500".to_string()],
        )
        .unwrap();
        let b = QueryFilters::from_request(
            "all",
            &["0500".to_string(), "8300".to_string()],
        )
        .unwrap();
        assert_eq!(liquidity_cache_key(&a), liquidity_cache_key(&b));
    }

    #[test]
    fn malformed_exchange_is_an_invalid_argument() {
        let err = QueryFilters::from_request("NASDAQ", &[]).unwrap_err();
        assert!(matches!(err, PerformanceError::InvalidArgument(_)));
    }

    #[test]
    fn all_exchange_expands_to_every_floor() {
        let filters = QueryFilters::from_request("ALL", &[]).unwrap();
        assert_eq!(filters.floors, Floor::ALL.to_vec());
        let single = QueryFilters::from_request("HOSE", &[]).unwrap();
        assert_eq!(single.floors, vec![Floor::Hose]);
    }
}
