/// /api/stats endpoints
use crate::{
    auth::AuthUser,
    context::AppContext,
    error::EthosResult,
    stats::{DailyStats, WeeklyStats, YearlyStats},
};
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::{Datelike, NaiveDate, Utc};
use serde::Deserialize;

/// Build stats routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/stats/daily", get(daily_stats))
        .route("/api/stats/weekly", get(weekly_stats))
        .route("/api/stats/yearly", get(yearly_stats))
}

#[derive(Debug, Deserialize)]
struct DailyQuery {
    date: Option<NaiveDate>,
}

fn utc_today() -> NaiveDate {
    Utc::now().date_naive()
}

async fn daily_stats(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Query(query): Query<DailyQuery>,
) -> EthosResult<Json<DailyStats>> {
    let date = query.date.unwrap_or_else(utc_today);
    Ok(Json(ctx.stats.daily(auth.id(), date).await?))
}

async fn weekly_stats(State(ctx): State<AppContext>, auth: AuthUser) -> EthosResult<Json<WeeklyStats>> {
    Ok(Json(ctx.stats.weekly(auth.id(), utc_today()).await?))
}

async fn yearly_stats(State(ctx): State<AppContext>, auth: AuthUser) -> EthosResult<Json<YearlyStats>> {
    Ok(Json(ctx.stats.yearly(auth.id(), utc_today().year()).await?))
}
