/// /api/goals endpoints
use crate::{
    api::Pagination,
    auth::AuthUser,
    context::AppContext,
    db::models::{Goal, Page},
    error::EthosResult,
    goals::{CreateGoalRequest, Heatmap, UpdateGoalRequest},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use validator::Validate;

/// Build goal routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/goals", get(list_goals).post(create_goal))
        .route(
            "/api/goals/:goal_id",
            get(get_goal).patch(update_goal).delete(delete_goal),
        )
        .route("/api/goals/:goal_id/heatmap", get(goal_heatmap))
}

#[derive(Debug, Deserialize)]
struct HeatmapQuery {
    from: NaiveDate,
    to: NaiveDate,
}

async fn create_goal(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Json(req): Json<CreateGoalRequest>,
) -> EthosResult<(StatusCode, Json<Goal>)> {
    req.validate()?;
    let goal = ctx.goals.create(auth.id(), req).await?;
    Ok((StatusCode::CREATED, Json(goal)))
}

async fn list_goals(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Query(page): Query<Pagination>,
) -> EthosResult<Json<Page<Goal>>> {
    let (limit, offset) = page.resolve(50, 200)?;
    Ok(Json(ctx.goals.list(auth.id(), limit, offset).await?))
}

async fn get_goal(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path(goal_id): Path<i64>,
) -> EthosResult<Json<Goal>> {
    Ok(Json(ctx.goals.get(auth.id(), goal_id).await?))
}

async fn update_goal(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path(goal_id): Path<i64>,
    Json(req): Json<UpdateGoalRequest>,
) -> EthosResult<Json<Goal>> {
    req.validate()?;
    Ok(Json(ctx.goals.update(auth.id(), goal_id, req).await?))
}

async fn delete_goal(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path(goal_id): Path<i64>,
) -> EthosResult<StatusCode> {
    ctx.goals.delete(auth.id(), goal_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn goal_heatmap(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path(goal_id): Path<i64>,
    Query(query): Query<HeatmapQuery>,
) -> EthosResult<Json<Heatmap>> {
    Ok(Json(
        ctx.goals
            .heatmap(auth.id(), goal_id, query.from, query.to)
            .await?,
    ))
}
