/// /api/focus/sessions endpoints
use crate::{
    api::Pagination,
    auth::AuthUser,
    context::AppContext,
    db::models::{FocusSession, Page},
    error::EthosResult,
    focus::CreateFocusSessionRequest,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use validator::Validate;

/// Build focus session routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/focus/sessions", get(list_sessions).post(create_session))
        .route("/api/focus/sessions/current", get(current_session))
        .route("/api/focus/sessions/:session_id/pause", post(pause_session))
        .route("/api/focus/sessions/:session_id/resume", post(resume_session))
        .route("/api/focus/sessions/:session_id/complete", post(complete_session))
        .route("/api/focus/sessions/:session_id/cancel", post(cancel_session))
}

async fn create_session(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Json(req): Json<CreateFocusSessionRequest>,
) -> EthosResult<(StatusCode, Json<FocusSession>)> {
    req.validate()?;
    let session = ctx
        .focus
        .create(auth.id(), req.duration_seconds, req.goal_id, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(session)))
}

async fn list_sessions(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Query(page): Query<Pagination>,
) -> EthosResult<Json<Page<FocusSession>>> {
    let (limit, offset) = page.resolve(50, 200)?;
    Ok(Json(ctx.focus.list(auth.id(), limit, offset).await?))
}

/// Live session, or 204 when there is none
async fn current_session(State(ctx): State<AppContext>, auth: AuthUser) -> EthosResult<Response> {
    let response = match ctx.focus.current(auth.id(), Utc::now()).await? {
        Some(session) => Json(session).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    };
    Ok(response)
}

async fn pause_session(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path(session_id): Path<i64>,
) -> EthosResult<Json<FocusSession>> {
    Ok(Json(ctx.focus.pause(auth.id(), session_id, Utc::now()).await?))
}

async fn resume_session(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path(session_id): Path<i64>,
) -> EthosResult<Json<FocusSession>> {
    Ok(Json(ctx.focus.resume(auth.id(), session_id, Utc::now()).await?))
}

async fn complete_session(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path(session_id): Path<i64>,
) -> EthosResult<Json<FocusSession>> {
    Ok(Json(ctx.focus.complete(auth.id(), session_id, Utc::now()).await?))
}

async fn cancel_session(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path(session_id): Path<i64>,
) -> EthosResult<Json<FocusSession>> {
    Ok(Json(ctx.focus.cancel(auth.id(), session_id, Utc::now()).await?))
}
