/// Goal log endpoints
use crate::{
    api::Pagination,
    auth::AuthUser,
    context::AppContext,
    db::models::{GoalLog, Page},
    error::EthosResult,
    goals::logs::{CreateLogRequest, DateRange, UpdateLogRequest},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use validator::Validate;

/// Build log routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/goals/:goal_id/logs", get(list_goal_logs).post(create_goal_log))
        .route(
            "/api/goals/:goal_id/logs/:log_id",
            patch(update_goal_log).delete(delete_goal_log),
        )
        .route("/api/logs", get(list_logs_by_range))
}

#[derive(Debug, Deserialize)]
struct RangeQuery {
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    limit: Option<i64>,
    offset: Option<i64>,
}

async fn create_goal_log(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path(goal_id): Path<i64>,
    Json(req): Json<CreateLogRequest>,
) -> EthosResult<(StatusCode, Json<GoalLog>)> {
    req.validate()?;
    let log = ctx.logs.create(auth.id(), goal_id, req).await?;
    Ok((StatusCode::CREATED, Json(log)))
}

async fn list_goal_logs(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path(goal_id): Path<i64>,
    Query(page): Query<Pagination>,
) -> EthosResult<Json<Page<GoalLog>>> {
    let (limit, offset) = page.resolve(100, 500)?;
    Ok(Json(ctx.logs.list(auth.id(), goal_id, limit, offset).await?))
}

async fn update_goal_log(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path((goal_id, log_id)): Path<(i64, i64)>,
    Json(req): Json<UpdateLogRequest>,
) -> EthosResult<Json<GoalLog>> {
    req.validate()?;
    Ok(Json(ctx.logs.update(auth.id(), goal_id, log_id, req).await?))
}

async fn delete_goal_log(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path((goal_id, log_id)): Path<(i64, i64)>,
) -> EthosResult<StatusCode> {
    ctx.logs.delete(auth.id(), goal_id, log_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_logs_by_range(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Query(query): Query<RangeQuery>,
) -> EthosResult<Json<Page<GoalLog>>> {
    let (limit, offset) = Pagination {
        limit: query.limit,
        offset: query.offset,
    }
    .resolve(200, 500)?;

    let range = DateRange {
        start: query.start_date,
        end: query.end_date,
    };
    Ok(Json(ctx.logs.list_by_range(auth.id(), range, limit, offset).await?))
}
