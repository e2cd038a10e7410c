/// Goals, their target revisions and progress logs

pub mod logs;
pub mod revisions;

pub use logs::GoalLogManager;
pub use revisions::RevisionManager;

use crate::{
    db::models::{Goal, GoalType, Page},
    error::{EthosError, EthosResult},
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashMap;
use validator::Validate;

/// Longest heatmap range, in days
pub const MAX_HEATMAP_DAYS: i64 = 366;

const GOAL_COLUMNS: &str = "id, user_id, name, goal_type, is_active, created_at";

/// Create-goal request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateGoalRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub goal_type: GoalType,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// Partial goal update; absent fields stay as they are
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateGoalRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub goal_type: Option<GoalType>,
    pub is_active: Option<bool>,
}

/// One heatmap cell
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HeatmapValue {
    pub date: NaiveDate,
    pub count: i64,
}

/// Per-day log counts for a goal over an inclusive date range
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Heatmap {
    pub goal_id: i64,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub unit: String,
    pub values: Vec<HeatmapValue>,
}

/// Goal manager
#[derive(Clone)]
pub struct GoalManager {
    db: SqlitePool,
}

impl GoalManager {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Create a goal for a user
    pub async fn create(&self, user_id: i64, request: CreateGoalRequest) -> EthosResult<Goal> {
        let name = normalize_name(&request.name)?;
        let now = Utc::now();

        let result = sqlx::query(
            "INSERT INTO goals (user_id, name, goal_type, is_active, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(user_id)
        .bind(&name)
        .bind(request.goal_type)
        .bind(request.is_active)
        .bind(now)
        .execute(&self.db)
        .await?;

        let goal = Goal {
            id: result.last_insert_rowid(),
            user_id,
            name,
            goal_type: request.goal_type,
            is_active: request.is_active,
            created_at: now,
        };
        tracing::info!(goal_id = goal.id, user_id, goal_type = goal.goal_type.as_str(), "goal created");

        Ok(goal)
    }

    /// List a user's goals, newest first
    pub async fn list(&self, user_id: i64, limit: i64, offset: i64) -> EthosResult<Page<Goal>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM goals WHERE user_id = ?1")
            .bind(user_id)
            .fetch_one(&self.db)
            .await?;

        let items = sqlx::query_as::<_, Goal>(&format!(
            "SELECT {} FROM goals WHERE user_id = ?1 ORDER BY created_at DESC, id DESC LIMIT ?2 OFFSET ?3",
            GOAL_COLUMNS
        ))
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        Ok(Page { items, total })
    }

    /// Fetch a goal the user owns
    pub async fn get(&self, user_id: i64, goal_id: i64) -> EthosResult<Goal> {
        sqlx::query_as::<_, Goal>(&format!(
            "SELECT {} FROM goals WHERE id = ?1 AND user_id = ?2",
            GOAL_COLUMNS
        ))
        .bind(goal_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(goal_not_found)
    }

    /// Apply a partial update
    pub async fn update(&self, user_id: i64, goal_id: i64, request: UpdateGoalRequest) -> EthosResult<Goal> {
        let mut goal = self.get(user_id, goal_id).await?;

        if let Some(name) = request.name.as_deref() {
            goal.name = normalize_name(name)?;
        }
        if let Some(goal_type) = request.goal_type {
            goal.goal_type = goal_type;
        }
        if let Some(is_active) = request.is_active {
            goal.is_active = is_active;
        }

        sqlx::query("UPDATE goals SET name = ?1, goal_type = ?2, is_active = ?3 WHERE id = ?4")
            .bind(&goal.name)
            .bind(goal.goal_type)
            .bind(goal.is_active)
            .bind(goal.id)
            .execute(&self.db)
            .await?;

        tracing::debug!(goal_id, user_id, "goal updated");
        Ok(goal)
    }

    /// Delete a goal together with its revisions and logs
    pub async fn delete(&self, user_id: i64, goal_id: i64) -> EthosResult<()> {
        let result = sqlx::query("DELETE FROM goals WHERE id = ?1 AND user_id = ?2")
            .bind(goal_id)
            .bind(user_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(goal_not_found());
        }

        tracing::info!(goal_id, user_id, "goal deleted");
        Ok(())
    }

    /// Count logs per day over `[from, to]`, filling empty days with zero
    pub async fn heatmap(
        &self,
        user_id: i64,
        goal_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EthosResult<Heatmap> {
        if from > to {
            return Err(EthosError::Validation("'from' must be <= 'to'".to_string()));
        }
        if (to - from).num_days() >= MAX_HEATMAP_DAYS {
            return Err(EthosError::Validation(format!(
                "Range must not exceed {} days",
                MAX_HEATMAP_DAYS
            )));
        }

        let goal = self.get(user_id, goal_id).await?;

        let rows: Vec<(NaiveDate, i64)> = sqlx::query_as(
            "SELECT date, COUNT(*) FROM goal_logs
             WHERE goal_id = ?1 AND date >= ?2 AND date <= ?3
             GROUP BY date",
        )
        .bind(goal.id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.db)
        .await?;

        let counts: HashMap<NaiveDate, i64> = rows.into_iter().collect();
        let values = from
            .iter_days()
            .take_while(|day| *day <= to)
            .map(|date| HeatmapValue {
                date,
                count: counts.get(&date).copied().unwrap_or(0),
            })
            .collect();

        Ok(Heatmap {
            goal_id: goal.id,
            from,
            to,
            unit: "day".to_string(),
            values,
        })
    }
}

/// Fail with 404 unless the goal exists and belongs to the user
pub(crate) async fn ensure_owned(conn: &mut SqliteConnection, user_id: i64, goal_id: i64) -> EthosResult<()> {
    let owned: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM goals WHERE id = ?1 AND user_id = ?2")
        .bind(goal_id)
        .bind(user_id)
        .fetch_one(&mut *conn)
        .await?;

    if owned == 0 {
        return Err(goal_not_found());
    }

    Ok(())
}

fn goal_not_found() -> EthosError {
    EthosError::NotFound("Goal not found".to_string())
}

fn normalize_name(name: &str) -> EthosResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(EthosError::Validation("Name is required".to_string()));
    }
    Ok(name.to_string())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db::create_memory_pool;

    pub(crate) async fn insert_user(db: &SqlitePool, username: &str) -> i64 {
        sqlx::query(
            "INSERT INTO users (username, password_hash, created_at, updated_at) VALUES (?1, 'x', ?2, ?2)",
        )
        .bind(username)
        .bind(Utc::now())
        .execute(db)
        .await
        .unwrap()
        .last_insert_rowid()
    }

    pub(crate) fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    pub(crate) fn new_goal(name: &str, goal_type: GoalType) -> CreateGoalRequest {
        CreateGoalRequest {
            name: name.to_string(),
            goal_type,
            is_active: true,
        }
    }

    async fn setup() -> (GoalManager, SqlitePool, i64) {
        let db = create_memory_pool().await.unwrap();
        let user_id = insert_user(&db, "alice").await;
        (GoalManager::new(db.clone()), db, user_id)
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (manager, _db, user_id) = setup().await;

        let goal = manager.create(user_id, new_goal("  Read  ", GoalType::Time)).await.unwrap();
        assert_eq!(goal.name, "Read");
        assert!(goal.is_active);

        let fetched = manager.get(user_id, goal.id).await.unwrap();
        assert_eq!(fetched.name, "Read");
        assert_eq!(fetched.goal_type, GoalType::Time);
    }

    #[tokio::test]
    async fn test_blank_name_rejected() {
        let (manager, _db, user_id) = setup().await;

        assert!(matches!(
            manager.create(user_id, new_goal("   ", GoalType::Count)).await,
            Err(EthosError::Validation(_))
        ));

        let goal = manager.create(user_id, new_goal("Run", GoalType::Count)).await.unwrap();
        let update = UpdateGoalRequest {
            name: Some(" ".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            manager.update(user_id, goal.id, update).await,
            Err(EthosError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_partial_update() {
        let (manager, _db, user_id) = setup().await;
        let goal = manager.create(user_id, new_goal("Meditate", GoalType::Boolean)).await.unwrap();

        let updated = manager
            .update(
                user_id,
                goal.id,
                UpdateGoalRequest {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Meditate");
        assert_eq!(updated.goal_type, GoalType::Boolean);
        assert!(!updated.is_active);

        assert!(!manager.get(user_id, goal.id).await.unwrap().is_active);
    }

    #[tokio::test]
    async fn test_goals_are_private() {
        let (manager, db, user_id) = setup().await;
        let other_id = insert_user(&db, "bob").await;
        let goal = manager.create(user_id, new_goal("Read", GoalType::Time)).await.unwrap();

        assert!(matches!(manager.get(other_id, goal.id).await, Err(EthosError::NotFound(_))));
        assert!(matches!(manager.delete(other_id, goal.id).await, Err(EthosError::NotFound(_))));
        assert_eq!(manager.list(other_id, 50, 0).await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn test_delete_cascades_logs() {
        let (manager, db, user_id) = setup().await;
        let goal = manager.create(user_id, new_goal("Read", GoalType::Time)).await.unwrap();

        sqlx::query("INSERT INTO goal_logs (goal_id, date, value, source, created_at) VALUES (?1, '2026-03-02', 10, 'manual', ?2)")
            .bind(goal.id)
            .bind(Utc::now())
            .execute(&db)
            .await
            .unwrap();

        manager.delete(user_id, goal.id).await.unwrap();

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM goal_logs")
            .fetch_one(&db)
            .await
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[tokio::test]
    async fn test_list_pagination() {
        let (manager, _db, user_id) = setup().await;
        for name in ["a", "b", "c"] {
            manager.create(user_id, new_goal(name, GoalType::Count)).await.unwrap();
        }

        let page = manager.list(user_id, 2, 0).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].name, "c");
    }

    #[tokio::test]
    async fn test_heatmap_zero_fills() {
        let (manager, db, user_id) = setup().await;
        let goal = manager.create(user_id, new_goal("Read", GoalType::Count)).await.unwrap();

        for date in ["2026-03-02", "2026-03-02", "2026-03-04", "2026-03-09"] {
            sqlx::query("INSERT INTO goal_logs (goal_id, date, value, source, created_at) VALUES (?1, ?2, 1, 'manual', ?3)")
                .bind(goal.id)
                .bind(day(date))
                .bind(Utc::now())
                .execute(&db)
                .await
                .unwrap();
        }

        let heatmap = manager
            .heatmap(user_id, goal.id, day("2026-03-01"), day("2026-03-05"))
            .await
            .unwrap();

        assert_eq!(heatmap.unit, "day");
        assert_eq!(heatmap.values.len(), 5);
        let counts: Vec<i64> = heatmap.values.iter().map(|v| v.count).collect();
        assert_eq!(counts, vec![0, 2, 0, 1, 0]);
        assert_eq!(heatmap.values[0].date, day("2026-03-01"));
        assert_eq!(heatmap.values[4].date, day("2026-03-05"));
    }

    #[tokio::test]
    async fn test_heatmap_range_checks() {
        let (manager, _db, user_id) = setup().await;
        let goal = manager.create(user_id, new_goal("Read", GoalType::Count)).await.unwrap();

        assert!(matches!(
            manager.heatmap(user_id, goal.id, day("2026-03-05"), day("2026-03-01")).await,
            Err(EthosError::Validation(_))
        ));
        assert!(matches!(
            manager.heatmap(user_id, goal.id, day("2025-01-01"), day("2026-03-01")).await,
            Err(EthosError::Validation(_))
        ));

        let single = manager
            .heatmap(user_id, goal.id, day("2026-03-01"), day("2026-03-01"))
            .await
            .unwrap();
        assert_eq!(single.values.len(), 1);

        let leap_year = manager
            .heatmap(user_id, goal.id, day("2028-01-01"), day("2028-12-31"))
            .await
            .unwrap();
        assert_eq!(leap_year.values.len(), 366);
    }
}
