/// Focus session persistence and lifecycle
use crate::{
    db::models::{FocusSession, FocusStatus, LogSource, Page},
    error::{EthosError, EthosResult},
    focus::timer,
    goals,
};
use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};

const SESSION_COLUMNS: &str =
    "id, user_id, goal_id, duration_seconds, paused_seconds, status, started_at, ended_at";

/// Focus session manager
///
/// Every operation is scoped to one user; sessions of other users read as missing.
/// Callers pass `now` so expiry decisions are reproducible.
#[derive(Clone)]
pub struct FocusSessionManager {
    db: SqlitePool,
}

impl FocusSessionManager {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Start a new running session
    ///
    /// An active session that has run past its duration is completed first;
    /// one that is still live is a conflict. Losing a race against another
    /// create for the same user is a conflict too.
    pub async fn create(
        &self,
        user_id: i64,
        duration_seconds: i64,
        goal_id: Option<i64>,
        now: DateTime<Utc>,
    ) -> EthosResult<FocusSession> {
        timer::validate_duration(duration_seconds)?;

        self.start_session(user_id, duration_seconds, goal_id, now)
            .await
            .map_err(active_session_conflict)
    }

    async fn start_session(
        &self,
        user_id: i64,
        duration_seconds: i64,
        goal_id: Option<i64>,
        now: DateTime<Utc>,
    ) -> EthosResult<FocusSession> {
        let mut tx = self.db.begin().await?;

        if let Some(goal_id) = goal_id {
            goals::ensure_owned(&mut tx, user_id, goal_id).await?;
        }

        if let Some(mut existing) = fetch_active(&mut tx, user_id).await? {
            if !timer::is_expired(&existing, now) {
                return Err(EthosError::Conflict("Active session exists".to_string()));
            }

            tracing::info!(
                session_id = existing.id,
                user_id,
                "auto-completing expired focus session"
            );
            timer::finish(&mut existing, FocusStatus::Completed, now)?;
            save(&mut tx, &existing).await?;
            insert_focus_log(&mut tx, &existing).await?;
        }

        let result = sqlx::query(
            "INSERT INTO focus_sessions (user_id, goal_id, duration_seconds, paused_seconds, status, started_at, ended_at)
             VALUES (?1, ?2, ?3, 0, ?4, ?5, NULL)",
        )
        .bind(user_id)
        .bind(goal_id)
        .bind(duration_seconds)
        .bind(FocusStatus::Running)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        let session = FocusSession {
            id: result.last_insert_rowid(),
            user_id,
            goal_id,
            duration_seconds,
            paused_seconds: 0,
            status: FocusStatus::Running,
            started_at: now,
            ended_at: None,
        };
        tracing::info!(session_id = session.id, user_id, duration_seconds, "focus session started");

        Ok(session)
    }

    /// Mark a session completed and credit its goal
    pub async fn complete(&self, user_id: i64, session_id: i64, now: DateTime<Utc>) -> EthosResult<FocusSession> {
        let mut tx = self.db.begin().await?;
        let mut session = fetch_owned(&mut tx, user_id, session_id).await?;

        timer::finish(&mut session, FocusStatus::Completed, now)?;
        save(&mut tx, &session).await?;
        insert_focus_log(&mut tx, &session).await?;
        tx.commit().await?;

        tracing::info!(session_id, user_id, "focus session completed");
        Ok(session)
    }

    /// Pause a running session
    pub async fn pause(&self, user_id: i64, session_id: i64, now: DateTime<Utc>) -> EthosResult<FocusSession> {
        let mut conn = self.db.acquire().await?;
        let mut session = fetch_owned(&mut conn, user_id, session_id).await?;

        timer::pause(&mut session, now)?;
        save(&mut conn, &session).await?;

        tracing::debug!(session_id, user_id, "focus session paused");
        Ok(session)
    }

    /// Resume a paused session
    pub async fn resume(&self, user_id: i64, session_id: i64, now: DateTime<Utc>) -> EthosResult<FocusSession> {
        let mut conn = self.db.acquire().await?;
        let mut session = fetch_owned(&mut conn, user_id, session_id).await?;

        timer::resume(&mut session, now)?;
        save(&mut conn, &session).await?;

        tracing::debug!(session_id, user_id, paused_seconds = session.paused_seconds, "focus session resumed");
        Ok(session)
    }

    /// Abandon a session without crediting its goal
    pub async fn cancel(&self, user_id: i64, session_id: i64, now: DateTime<Utc>) -> EthosResult<FocusSession> {
        let mut conn = self.db.acquire().await?;
        let mut session = fetch_owned(&mut conn, user_id, session_id).await?;

        timer::finish(&mut session, FocusStatus::Canceled, now)?;
        save(&mut conn, &session).await?;

        tracing::info!(session_id, user_id, "focus session canceled");
        Ok(session)
    }

    /// The user's live session, if any
    ///
    /// An expired session found here is completed on the spot and not returned.
    pub async fn current(&self, user_id: i64, now: DateTime<Utc>) -> EthosResult<Option<FocusSession>> {
        let mut tx = self.db.begin().await?;

        let Some(mut session) = fetch_active(&mut tx, user_id).await? else {
            return Ok(None);
        };

        if !timer::is_expired(&session, now) {
            return Ok(Some(session));
        }

        tracing::info!(session_id = session.id, user_id, "auto-completing expired focus session");
        timer::finish(&mut session, FocusStatus::Completed, now)?;
        save(&mut tx, &session).await?;
        insert_focus_log(&mut tx, &session).await?;
        tx.commit().await?;

        Ok(None)
    }

    /// List sessions, newest first
    pub async fn list(&self, user_id: i64, limit: i64, offset: i64) -> EthosResult<Page<FocusSession>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM focus_sessions WHERE user_id = ?1")
            .bind(user_id)
            .fetch_one(&self.db)
            .await?;

        let items = sqlx::query_as::<_, FocusSession>(&format!(
            "SELECT {} FROM focus_sessions WHERE user_id = ?1
             ORDER BY started_at DESC, id DESC LIMIT ?2 OFFSET ?3",
            SESSION_COLUMNS
        ))
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        Ok(Page { items, total })
    }
}

/// The partial unique index on active sessions and a lost write lock both mean
/// another session got there first
fn active_session_conflict(err: EthosError) -> EthosError {
    if err.is_unique_violation() || err.is_busy() {
        tracing::debug!(error = %err, "concurrent focus session create");
        EthosError::Conflict("Active session exists".to_string())
    } else {
        err
    }
}

async fn fetch_active(conn: &mut SqliteConnection, user_id: i64) -> EthosResult<Option<FocusSession>> {
    let session = sqlx::query_as::<_, FocusSession>(&format!(
        "SELECT {} FROM focus_sessions
         WHERE user_id = ?1 AND status IN ('running', 'paused')
         ORDER BY started_at DESC LIMIT 1",
        SESSION_COLUMNS
    ))
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(session)
}

async fn fetch_owned(conn: &mut SqliteConnection, user_id: i64, session_id: i64) -> EthosResult<FocusSession> {
    sqlx::query_as::<_, FocusSession>(&format!(
        "SELECT {} FROM focus_sessions WHERE id = ?1 AND user_id = ?2",
        SESSION_COLUMNS
    ))
    .bind(session_id)
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| EthosError::NotFound("Session not found".to_string()))
}

async fn save(conn: &mut SqliteConnection, session: &FocusSession) -> EthosResult<()> {
    sqlx::query(
        "UPDATE focus_sessions SET paused_seconds = ?1, status = ?2, ended_at = ?3 WHERE id = ?4",
    )
    .bind(session.paused_seconds)
    .bind(session.status)
    .bind(session.ended_at)
    .bind(session.id)
    .execute(&mut *conn)
    .await?;

    tracing::debug!(session_id = session.id, status = session.status.as_str(), "focus session saved");
    Ok(())
}

/// Credit a finished session to its goal; sessions without a goal log nothing
async fn insert_focus_log(conn: &mut SqliteConnection, session: &FocusSession) -> EthosResult<()> {
    let Some(goal_id) = session.goal_id else {
        return Ok(());
    };

    sqlx::query(
        "INSERT INTO goal_logs (goal_id, focus_session_id, date, value, source, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(goal_id, date, focus_session_id) DO NOTHING",
    )
    .bind(goal_id)
    .bind(session.id)
    .bind(session.started_at.date_naive())
    .bind(timer::focus_log_minutes(session.duration_seconds))
    .bind(LogSource::Focus)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(())
}
