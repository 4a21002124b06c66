//! Session-date resolution: which historical trading dates count as "a week
//! ago", "a quarter ago", and so on, against a sparse trading calendar.

use crate::dates::{one_year_prior, previous_quarter_end, year_start};
use crate::error::PerformanceError;
use cache::{get_or_compute, CacheStore};
use chrono::NaiveDate;
use core_types::SessionDateSet;
use database::{AnchorDateRow, StoreSet, StoreTarget, TradeTable};

/// Resolves the five named session anchors for a table, read-through cached
/// by table identity.
///
/// Cache entries are never invalidated here: anchors shift only day to day,
/// so a day of staleness is an accepted trade-off against one query per
/// request.
#[derive(Debug, Clone)]
pub struct SessionDateResolver {
    stores: StoreSet,
    cache: CacheStore,
}

impl SessionDateResolver {
    pub fn new(stores: StoreSet, cache: CacheStore) -> Self {
        Self { stores, cache }
    }

    /// Resolves the anchor set for `table` relative to `reference` (the
    /// "now" the one-year/year-start/quarter offsets are computed from).
    ///
    /// Every returned date is a date that actually has data in the table. A
    /// near-empty table is a hard error, never a partially populated set.
    pub async fn resolve(
        &self,
        target: StoreTarget,
        table: TradeTable,
        reference: NaiveDate,
    ) -> Result<SessionDateSet, PerformanceError> {
        let key = session_cache_key(target, table);
        get_or_compute(&self.cache, &key, || async move {
            let quarter_ref = previous_quarter_end(reference);
            let year_start_ref = year_start(reference);
            let year_ref = one_year_prior(reference);

            let rows = self
                .stores
                .get(target)
                .session_anchor_rows(table, quarter_ref, year_start_ref, year_ref)
                .await?;
            let sessions = session_dates_from_rows(&rows)?;
            tracing::debug!(
                table = table.name(),
                latest = %sessions.latest_date,
                last_five = %sessions.last_five_date,
                quarter = %sessions.last_quarter_date,
                year_start = %sessions.first_year_date,
                year = %sessions.last_year_date,
                "resolved session anchors"
            );
            Ok(sessions)
        })
        .await
    }
}

/// Anchor cache keys carry the store target as well as the table: both
/// stores could hold a table of the same name, and their calendars need not
/// agree.
fn session_cache_key(target: StoreTarget, table: TradeTable) -> String {
    format!(
        "session-dates:{}:{}:{}",
        target.name(),
        table.name(),
        table.date_column()
    )
}

/// Maps the labeled anchor rows into a named `SessionDateSet`.
///
/// The `recent` block must hold five distinct dates (the table order is not
/// relied upon; dates are re-sorted here) and each nearest-match label must
/// have found a date. Anything less is a `DataIntegrity` failure.
pub fn session_dates_from_rows(rows: &[AnchorDateRow]) -> Result<SessionDateSet, PerformanceError> {
    let mut recent: Vec<NaiveDate> = rows
        .iter()
        .filter(|r| r.anchor == "recent")
        .filter_map(|r| r.trade_date)
        .collect();
    recent.sort_unstable_by(|a, b| b.cmp(a));
    recent.dedup();
    if recent.len() < 5 {
        return Err(PerformanceError::DataIntegrity(format!(
            "expected 5 recent session dates, found {}",
            recent.len()
        )));
    }

    let nearest = |label: &str| -> Result<NaiveDate, PerformanceError> {
        rows.iter()
            .find(|r| r.anchor == label)
            .and_then(|r| r.trade_date)
            .ok_or_else(|| {
                PerformanceError::DataIntegrity(format!("no session date found for `{label}` anchor"))
            })
    };

    Ok(SessionDateSet {
        latest_date: recent[0],
        last_five_date: recent[4],
        last_quarter_date: nearest("quarter")?,
        first_year_date: nearest("year_start")?,
        last_year_date: nearest("year")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn row(anchor: &str, date: Option<NaiveDate>) -> AnchorDateRow {
        AnchorDateRow {
            anchor: anchor.to_string(),
            trade_date: date,
        }
    }

    fn full_rows() -> Vec<AnchorDateRow> {
        vec![
            // Deliberately out of order; the mapping must not rely on it.
            row("recent", Some(d(2024, 5, 15))),
            row("recent", Some(d(2024, 5, 17))),
            row("recent", Some(d(2024, 5, 13))),
            row("recent", Some(d(2024, 5, 16))),
            row("recent", Some(d(2024, 5, 14))),
            row("quarter", Some(d(2024, 3, 29))),
            row("year_start", Some(d(2024, 1, 2))),
            row("year", Some(d(2023, 5, 19))),
        ]
    }

    #[test]
    fn maps_labeled_rows_to_named_anchors() {
        let sessions = session_dates_from_rows(&full_rows()).unwrap();
        assert_eq!(sessions.latest_date, d(2024, 5, 17));
        assert_eq!(sessions.last_five_date, d(2024, 5, 13));
        assert_eq!(sessions.last_quarter_date, d(2024, 3, 29));
        assert_eq!(sessions.first_year_date, d(2024, 1, 2));
        assert_eq!(sessions.last_year_date, d(2023, 5, 19));
    }

    #[test]
    fn fewer_than_five_recent_dates_is_a_hard_error() {
        let mut rows = full_rows();
        rows.retain(|r| r.trade_date != Some(d(2024, 5, 14)));
        let err = session_dates_from_rows(&rows).unwrap_err();
        assert!(matches!(err, PerformanceError::DataIntegrity(_)));
    }

    #[test]
    fn duplicate_recent_dates_do_not_satisfy_the_shape() {
        let mut rows = full_rows();
        // Replace one distinct date with a duplicate of the latest.
        rows.retain(|r| r.trade_date != Some(d(2024, 5, 14)));
        rows.push(row("recent", Some(d(2024, 5, 17))));
        let err = session_dates_from_rows(&rows).unwrap_err();
        assert!(matches!(err, PerformanceError::DataIntegrity(_)));
    }

    #[test]
    fn cache_keys_distinguish_the_store_target() {
        let market = session_cache_key(StoreTarget::Market, TradeTable::TickerTrades);
        let server = session_cache_key(StoreTarget::Server, TradeTable::TickerTrades);
        assert_ne!(market, server);
        assert_eq!(server, "session-dates:server:ticker_trades:trade_date");
    }

    #[test]
    fn missing_nearest_match_anchor_is_a_hard_error() {
        let mut rows = full_rows();
        for r in rows.iter_mut() {
            if r.anchor == "year" {
                r.trade_date = None;
            }
        }
        let err = session_dates_from_rows(&rows).unwrap_err();
        assert!(matches!(err, PerformanceError::DataIntegrity(_)));
    }
}
