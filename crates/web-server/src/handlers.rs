use crate::{error::AppError, AppState};
use axum::{
    extract::{Query, State},
    Json,
};
use core_types::{
    IndexChangePoint, IndustryChangePoint, LiquidityPerformanceRow, PricePerformanceRow,
};
use serde::Deserialize;
use std::sync::Arc;

/// Common query parameters: `exchange` is a floor name or `ALL`;
/// `industries` is a comma-separated industry-code list (absent or empty =
/// unrestricted).
#[derive(Debug, Deserialize)]
pub struct PerformanceQuery {
    #[serde(default = "default_exchange")]
    pub exchange: String,
    pub industries: Option<String>,
}

/// Parameters for the windowed operations; `window` is one of `week`,
/// `month`, `year-start`, `year`.
#[derive(Debug, Deserialize)]
pub struct WindowedQuery {
    #[serde(default = "default_exchange")]
    pub exchange: String,
    pub industries: Option<String>,
    pub window: String,
}

fn default_exchange() -> String {
    "ALL".to_string()
}

fn split_industries(industries: Option<&str>) -> Vec<String> {
    industries
        .unwrap_or("")
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// # GET /api/market/price-change-performance
pub async fn get_price_change_performance(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PerformanceQuery>,
) -> Result<Json<Vec<PricePerformanceRow>>, AppError> {
    let industries = split_industries(params.industries.as_deref());
    let rows = state
        .engine
        .price_change_performance(&params.exchange, &industries)
        .await?;
    Ok(Json(rows))
}

/// # GET /api/market/liquidity-change-performance
pub async fn get_liquidity_change_performance(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PerformanceQuery>,
) -> Result<Json<Vec<LiquidityPerformanceRow>>, AppError> {
    let industries = split_industries(params.industries.as_deref());
    let rows = state
        .engine
        .liquidity_change_performance(&params.exchange, &industries)
        .await?;
    Ok(Json(rows))
}

/// # GET /api/market/market-cap-change-performance
pub async fn get_market_cap_change_performance(
    State(state): State<Arc<AppState>>,
    Query(params): Query<WindowedQuery>,
) -> Result<Json<Vec<IndexChangePoint>>, AppError> {
    let industries = split_industries(params.industries.as_deref());
    let points = state
        .engine
        .market_cap_change_performance(&params.exchange, &industries, &params.window)
        .await?;
    Ok(Json(points))
}

/// # GET /api/market/industry-liquidity-change-performance
pub async fn get_industry_liquidity_change_performance(
    State(state): State<Arc<AppState>>,
    Query(params): Query<WindowedQuery>,
) -> Result<Json<Vec<IndustryChangePoint>>, AppError> {
    let industries = split_industries(params.industries.as_deref());
    let points = state
        .engine
        .industry_liquidity_change_performance(&params.exchange, &industries, &params.window)
        .await?;
    Ok(Json(points))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn industries_split_on_commas_and_drop_blanks() {
        assert_eq!(
            split_industries(Some("8300, 0500,,  ")),
            vec!["8300".to_string(), "0500".to_string()]
        );
        assert!(split_industries(None).is_empty());
        assert!(split_industries(Some("")).is_empty());
    }
}
