/// Row records for the tracker database
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// User account record
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Kind of progress a goal tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum GoalType {
    /// Minutes per day
    Time,
    /// Units per day
    Count,
    /// Done or not done
    Boolean,
}

impl GoalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalType::Time => "time",
            GoalType::Count => "count",
            GoalType::Boolean => "boolean",
        }
    }
}

/// Goal record
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Goal {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub goal_type: GoalType,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Time-sliced target value for a goal
///
/// `valid_to == None` marks the current, open-ended revision.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct GoalRevision {
    pub id: i64,
    pub goal_id: i64,
    pub target_value: i64,
    pub valid_from: NaiveDate,
    pub valid_to: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl GoalRevision {
    /// Whether `day` falls inside `[valid_from, valid_to)`
    pub fn covers(&self, day: NaiveDate) -> bool {
        day >= self.valid_from && self.valid_to.map_or(true, |to| day < to)
    }
}

/// Where a log entry came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum LogSource {
    Manual,
    Focus,
    Import,
    Automation,
}

/// Progress entry for a goal on a given day
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct GoalLog {
    pub id: i64,
    pub goal_id: i64,
    pub focus_session_id: Option<i64>,
    pub date: NaiveDate,
    pub value: i64,
    pub source: LogSource,
    pub created_at: DateTime<Utc>,
}

impl GoalLog {
    /// Entries not produced by a focus session; the only ones users may edit or delete
    pub fn is_manual(&self) -> bool {
        self.focus_session_id.is_none()
    }
}

/// Focus session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum FocusStatus {
    Running,
    Paused,
    Completed,
    Canceled,
}

impl FocusStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FocusStatus::Running => "running",
            FocusStatus::Paused => "paused",
            FocusStatus::Completed => "completed",
            FocusStatus::Canceled => "canceled",
        }
    }

    /// Running or paused
    pub fn is_active(&self) -> bool {
        matches!(self, FocusStatus::Running | FocusStatus::Paused)
    }

    /// Completed or canceled; no further transitions
    pub fn is_finished(&self) -> bool {
        !self.is_active()
    }
}

/// Focus session record
///
/// While paused, `ended_at` holds the pause timestamp.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct FocusSession {
    pub id: i64,
    pub user_id: i64,
    pub goal_id: Option<i64>,
    pub duration_seconds: i64,
    pub paused_seconds: i64,
    pub status: FocusStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

/// Boolean system flag
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SystemSetting {
    pub key: String,
    pub value: bool,
}

/// Paginated list response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_revision_covers_half_open_window() {
        let revision = GoalRevision {
            id: 1,
            goal_id: 1,
            target_value: 30,
            valid_from: day("2026-01-01"),
            valid_to: Some(day("2026-02-01")),
            created_at: Utc::now(),
        };

        assert!(!revision.covers(day("2025-12-31")));
        assert!(revision.covers(day("2026-01-01")));
        assert!(revision.covers(day("2026-01-31")));
        assert!(!revision.covers(day("2026-02-01")));

        let open = GoalRevision { valid_to: None, ..revision };
        assert!(open.covers(day("2030-06-15")));
    }

    #[test]
    fn test_focus_status_serialization() {
        assert_eq!(serde_json::to_string(&FocusStatus::Canceled).unwrap(), "\"canceled\"");
        assert_eq!(serde_json::to_string(&GoalType::Boolean).unwrap(), "\"boolean\"");
        assert!(FocusStatus::Paused.is_active());
        assert!(FocusStatus::Completed.is_finished());
    }

    #[test]
    fn test_user_hides_password_hash() {
        let user = User {
            id: 7,
            username: "alice".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            is_active: true,
            is_admin: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["username"], "alice");
    }
}
