/// /api/goals/:goal_id/revisions endpoints
use crate::{
    auth::AuthUser,
    context::AppContext,
    db::models::{GoalRevision, Page},
    error::{EthosError, EthosResult},
    goals::revisions::CreateRevisionRequest,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use validator::Validate;

/// Build revision routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route(
            "/api/goals/:goal_id/revisions",
            get(list_revisions).post(create_revision),
        )
        .route("/api/goals/:goal_id/revisions/active", get(active_revision))
}

#[derive(Debug, Deserialize)]
struct ActiveQuery {
    date: Option<NaiveDate>,
}

async fn create_revision(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path(goal_id): Path<i64>,
    Json(req): Json<CreateRevisionRequest>,
) -> EthosResult<(StatusCode, Json<GoalRevision>)> {
    req.validate()?;
    let revision = ctx.revisions.create(auth.id(), goal_id, req).await?;
    Ok((StatusCode::CREATED, Json(revision)))
}

async fn list_revisions(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path(goal_id): Path<i64>,
) -> EthosResult<Json<Page<GoalRevision>>> {
    Ok(Json(ctx.revisions.list(auth.id(), goal_id).await?))
}

/// Revision in force on `date` (today when omitted)
async fn active_revision(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path(goal_id): Path<i64>,
    Query(query): Query<ActiveQuery>,
) -> EthosResult<Json<GoalRevision>> {
    let day = query.date.unwrap_or_else(|| Utc::now().date_naive());

    ctx.revisions
        .revision_at(auth.id(), goal_id, day)
        .await?
        .map(Json)
        .ok_or_else(|| EthosError::NotFound("No revision for date".to_string()))
}
