use crate::{AppState, error::AppError};
use analytics::params::{parse_cooldown, parse_weeks};
use analytics::{
    AnalyticsError, DashboardQuery, DateRange, DurationBin, KpiSummary, RawQuery,
    SectorPerformance, TrendPoint,
};
use axum::{
    Json,
    extract::{Query, State},
    http::Uri,
};
use axum_extra::extract::WithRejection;
use std::sync::Arc;

fn dashboard_query(state: &AppState, raw: RawQuery) -> Result<DashboardQuery, AppError> {
    DashboardQuery::from_raw(raw, &state.engine.query_defaults())
        .map_err(|e| AppError::Analytics(AnalyticsError::from(e)))
}

/// # GET /api/health
pub async fn health() -> &'static str {
    "OK"
}

/// # GET /api/chart-data
/// Duration × return-band histogram for the filtered subset.
pub async fn get_chart_data(
    State(state): State<Arc<AppState>>,
    WithRejection(Query(raw), _): WithRejection<Query<RawQuery>, AppError>,
) -> Result<Json<Vec<DurationBin>>, AppError> {
    let query = dashboard_query(&state, raw)?;
    Ok(Json(state.engine.duration_chart(&query).await?))
}

/// # GET /api/kpi-data
pub async fn get_kpi_data(
    State(state): State<Arc<AppState>>,
    WithRejection(Query(raw), _): WithRejection<Query<RawQuery>, AppError>,
) -> Result<Json<KpiSummary>, AppError> {
    let query = dashboard_query(&state, raw)?;
    Ok(Json(state.engine.kpi(&query).await?))
}

/// # GET /api/date-range
/// Only `weeks` and `cooldown_weeks` are read.
pub async fn get_date_range(
    State(state): State<Arc<AppState>>,
    WithRejection(Query(raw), _): WithRejection<Query<RawQuery>, AppError>,
) -> Result<Json<DateRange>, AppError> {
    let defaults = state.engine.query_defaults();
    let weeks = parse_weeks(raw.weeks.as_deref(), defaults.holding_weeks)
        .map_err(AnalyticsError::from)?;
    let cooldown = parse_cooldown(raw.cooldown_weeks.as_deref(), defaults.cooldown_weeks)
        .map_err(AnalyticsError::from)?;
    Ok(Json(state.engine.date_range(weeks, cooldown).await?))
}

/// # GET /api/sectors
pub async fn get_sectors(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(state.engine.sectors().await?))
}

/// # GET /api/sector-performance
pub async fn get_sector_performance(
    State(state): State<Arc<AppState>>,
    WithRejection(Query(raw), _): WithRejection<Query<RawQuery>, AppError>,
) -> Result<Json<SectorPerformance>, AppError> {
    let query = dashboard_query(&state, raw)?;
    Ok(Json(state.engine.sector_performance(&query).await?))
}

/// # GET /api/sector-trend
/// Only `cooldown_weeks` is read; the holding periods come from configuration.
pub async fn get_sector_trend(
    State(state): State<Arc<AppState>>,
    WithRejection(Query(raw), _): WithRejection<Query<RawQuery>, AppError>,
) -> Result<Json<Vec<TrendPoint>>, AppError> {
    let default_cooldown = state.engine.settings().trend_cooldown_weeks;
    let cooldown = parse_cooldown(raw.cooldown_weeks.as_deref(), default_cooldown)
        .map_err(AnalyticsError::from)?;
    Ok(Json(state.engine.sector_trend(Some(cooldown)).await?))
}

pub async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("No route for {}", uri.path()))
}
