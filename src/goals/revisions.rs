/// Goal target revisions
///
/// Each revision holds a target value for the half-open window
/// `[valid_from, valid_to)`. Creating a revision closes whichever revision was
/// open-ended, so a goal has at most one current target.
use crate::{
    db::models::{GoalRevision, Page},
    error::{EthosError, EthosResult},
    goals::ensure_owned,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use validator::Validate;

const REVISION_COLUMNS: &str = "id, goal_id, target_value, valid_from, valid_to, created_at";

/// Create-revision request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateRevisionRequest {
    #[validate(range(min = 1))]
    pub target_value: i64,
    pub valid_from: NaiveDate,
    #[serde(default)]
    pub valid_to: Option<NaiveDate>,
}

#[derive(Clone)]
pub struct RevisionManager {
    db: SqlitePool,
}

impl RevisionManager {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Add a revision, closing the currently open one at `valid_from`
    pub async fn create(
        &self,
        user_id: i64,
        goal_id: i64,
        request: CreateRevisionRequest,
    ) -> EthosResult<GoalRevision> {
        if request.target_value < 1 {
            return Err(EthosError::Validation("Target value must be at least 1".to_string()));
        }
        if let Some(valid_to) = request.valid_to {
            if valid_to < request.valid_from {
                return Err(EthosError::Validation(
                    "valid_to must be on or after valid_from".to_string(),
                ));
            }
        }

        let mut tx = self.db.begin().await?;
        ensure_owned(&mut tx, user_id, goal_id).await?;

        let open_id: Option<i64> = sqlx::query_scalar(
            "SELECT id FROM goal_revisions WHERE goal_id = ?1 AND valid_to IS NULL
             ORDER BY valid_from DESC, id DESC LIMIT 1",
        )
        .bind(goal_id)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(open_id) = open_id {
            sqlx::query("UPDATE goal_revisions SET valid_to = ?1 WHERE id = ?2")
                .bind(request.valid_from)
                .bind(open_id)
                .execute(&mut *tx)
                .await?;
            tracing::debug!(goal_id, revision_id = open_id, valid_to = %request.valid_from, "closed open revision");
        }

        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO goal_revisions (goal_id, target_value, valid_from, valid_to, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(goal_id)
        .bind(request.target_value)
        .bind(request.valid_from)
        .bind(request.valid_to)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        let revision = GoalRevision {
            id: result.last_insert_rowid(),
            goal_id,
            target_value: request.target_value,
            valid_from: request.valid_from,
            valid_to: request.valid_to,
            created_at: now,
        };
        tracing::info!(goal_id, revision_id = revision.id, target_value = revision.target_value, "goal revision created");

        Ok(revision)
    }

    /// All revisions of a goal, latest window first
    pub async fn list(&self, user_id: i64, goal_id: i64) -> EthosResult<Page<GoalRevision>> {
        let mut conn = self.db.acquire().await?;
        ensure_owned(&mut conn, user_id, goal_id).await?;

        let items = sqlx::query_as::<_, GoalRevision>(&format!(
            "SELECT {} FROM goal_revisions WHERE goal_id = ?1 ORDER BY valid_from DESC, id DESC",
            REVISION_COLUMNS
        ))
        .bind(goal_id)
        .fetch_all(&mut *conn)
        .await?;

        let total = items.len() as i64;
        Ok(Page { items, total })
    }

    /// The revision in force on `day`, if any
    pub async fn revision_at(&self, user_id: i64, goal_id: i64, day: NaiveDate) -> EthosResult<Option<GoalRevision>> {
        let mut conn = self.db.acquire().await?;
        ensure_owned(&mut conn, user_id, goal_id).await?;

        // Latest start first; bounded windows may end before `day`
        let candidates = sqlx::query_as::<_, GoalRevision>(&format!(
            "SELECT {} FROM goal_revisions WHERE goal_id = ?1 AND valid_from <= ?2
             ORDER BY valid_from DESC, id DESC",
            REVISION_COLUMNS
        ))
        .bind(goal_id)
        .bind(day)
        .fetch_all(&mut *conn)
        .await?;

        Ok(candidates.into_iter().find(|revision| revision.covers(day)))
    }
}
