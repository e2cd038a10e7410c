/// Goal progress logs
use crate::{
    db::models::{GoalLog, LogSource, Page},
    error::{EthosError, EthosResult},
    goals::ensure_owned,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use validator::Validate;

const LOG_COLUMNS: &str = "id, goal_id, focus_session_id, date, value, source, created_at";

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateLogRequest {
    pub date: NaiveDate,
    #[validate(range(min = 1))]
    pub value: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateLogRequest {
    #[validate(range(min = 1))]
    pub value: i64,
}

/// Optional inclusive date bounds for cross-goal listing
#[derive(Debug, Clone, Copy, Default)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

#[derive(Clone)]
pub struct GoalLogManager {
    db: SqlitePool,
}

impl GoalLogManager {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Record a manual log entry
    pub async fn create(&self, user_id: i64, goal_id: i64, request: CreateLogRequest) -> EthosResult<GoalLog> {
        validate_value(request.value)?;

        let mut conn = self.db.acquire().await?;
        ensure_owned(&mut conn, user_id, goal_id).await?;

        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO goal_logs (goal_id, focus_session_id, date, value, source, created_at)
             VALUES (?1, NULL, ?2, ?3, ?4, ?5)",
        )
        .bind(goal_id)
        .bind(request.date)
        .bind(request.value)
        .bind(LogSource::Manual)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        let log = GoalLog {
            id: result.last_insert_rowid(),
            goal_id,
            focus_session_id: None,
            date: request.date,
            value: request.value,
            source: LogSource::Manual,
            created_at: now,
        };
        tracing::debug!(goal_id, log_id = log.id, value = log.value, "manual log recorded");

        Ok(log)
    }

    /// Logs of one goal, most recent day first
    pub async fn list(&self, user_id: i64, goal_id: i64, limit: i64, offset: i64) -> EthosResult<Page<GoalLog>> {
        let mut conn = self.db.acquire().await?;
        ensure_owned(&mut conn, user_id, goal_id).await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM goal_logs WHERE goal_id = ?1")
            .bind(goal_id)
            .fetch_one(&mut *conn)
            .await?;

        let items = sqlx::query_as::<_, GoalLog>(&format!(
            "SELECT {} FROM goal_logs WHERE goal_id = ?1
             ORDER BY date DESC, created_at DESC, id DESC LIMIT ?2 OFFSET ?3",
            LOG_COLUMNS
        ))
        .bind(goal_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *conn)
        .await?;

        Ok(Page { items, total })
    }

    /// Change the value of a manual log
    pub async fn update(
        &self,
        user_id: i64,
        goal_id: i64,
        log_id: i64,
        request: UpdateLogRequest,
    ) -> EthosResult<GoalLog> {
        validate_value(request.value)?;

        let mut conn = self.db.acquire().await?;
        ensure_owned(&mut conn, user_id, goal_id).await?;

        let mut log = fetch_manual(&mut conn, goal_id, log_id).await?;

        sqlx::query("UPDATE goal_logs SET value = ?1 WHERE id = ?2")
            .bind(request.value)
            .bind(log.id)
            .execute(&mut *conn)
            .await?;

        log.value = request.value;
        Ok(log)
    }

    /// Remove a manual log
    pub async fn delete(&self, user_id: i64, goal_id: i64, log_id: i64) -> EthosResult<()> {
        let mut conn = self.db.acquire().await?;
        ensure_owned(&mut conn, user_id, goal_id).await?;

        let log = fetch_manual(&mut conn, goal_id, log_id).await?;

        sqlx::query("DELETE FROM goal_logs WHERE id = ?1")
            .bind(log.id)
            .execute(&mut *conn)
            .await?;

        tracing::debug!(goal_id, log_id, "manual log deleted");
        Ok(())
    }

    /// Logs across all of a user's goals within an optional date range
    pub async fn list_by_range(
        &self,
        user_id: i64,
        range: DateRange,
        limit: i64,
        offset: i64,
    ) -> EthosResult<Page<GoalLog>> {
        // NULL bounds disable the corresponding filter
        let filter = "FROM goal_logs l JOIN goals g ON g.id = l.goal_id
                      WHERE g.user_id = ?1
                        AND (?2 IS NULL OR l.date >= ?2)
                        AND (?3 IS NULL OR l.date <= ?3)";

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) {}", filter))
            .bind(user_id)
            .bind(range.start)
            .bind(range.end)
            .fetch_one(&self.db)
            .await?;

        let items = sqlx::query_as::<_, GoalLog>(&format!(
            "SELECT l.id, l.goal_id, l.focus_session_id, l.date, l.value, l.source, l.created_at {}
             ORDER BY l.date DESC, l.created_at DESC, l.id DESC LIMIT ?4 OFFSET ?5",
            filter
        ))
        .bind(user_id)
        .bind(range.start)
        .bind(range.end)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        Ok(Page { items, total })
    }
}

fn validate_value(value: i64) -> EthosResult<()> {
    if value < 1 {
        return Err(EthosError::Validation("Value must be at least 1".to_string()));
    }
    Ok(())
}

/// Load a log of `goal_id` that users may edit; focus-session logs read as missing
async fn fetch_manual(conn: &mut SqliteConnection, goal_id: i64, log_id: i64) -> EthosResult<GoalLog> {
    sqlx::query_as::<_, GoalLog>(&format!(
        "SELECT {} FROM goal_logs WHERE id = ?1 AND goal_id = ?2",
        LOG_COLUMNS
    ))
    .bind(log_id)
    .bind(goal_id)
    .fetch_optional(&mut *conn)
    .await?
    .filter(GoalLog::is_manual)
    .ok_or_else(log_not_found)
}

fn log_not_found() -> EthosError {
    EthosError::NotFound("Log not found".to_string())
}
