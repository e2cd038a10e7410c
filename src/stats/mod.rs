/// Aggregated statistics over goal logs and focus sessions
///
/// All days are UTC calendar days. Focus figures count every session that
/// started on a day, whatever its final status.
use crate::error::{EthosError, EthosResult};
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DailyStats {
    pub date: NaiveDate,
    pub goal_value_sum: i64,
    pub goal_logs_count: i64,
    pub focus_seconds: i64,
    pub focus_sessions_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WeeklyDayStats {
    pub date: NaiveDate,
    pub goal_value_sum: i64,
    pub focus_seconds: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyStats {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub goal_value_sum: i64,
    pub focus_seconds: i64,
    pub days: Vec<WeeklyDayStats>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct YearlyMonthStats {
    pub month: u32,
    pub goal_value_sum: i64,
    pub focus_seconds: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearlyStats {
    pub year: i32,
    pub goal_value_sum: i64,
    pub focus_seconds: i64,
    pub months: Vec<YearlyMonthStats>,
}

/// Monday and Sunday of the week containing `day`
pub fn week_bounds(day: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = day - Duration::days(day.weekday().num_days_from_monday() as i64);
    (start, start + Duration::days(6))
}

/// First day of `month` and first day of the following month
pub fn month_bounds(year: i32, month: u32) -> EthosResult<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1);
    let end = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };

    match (start, end) {
        (Some(start), Some(end)) => Ok((start, end)),
        _ => Err(EthosError::Validation(format!("Invalid month {}-{}", year, month))),
    }
}

#[derive(Clone)]
pub struct StatsManager {
    db: SqlitePool,
}

impl StatsManager {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn daily(&self, user_id: i64, date: NaiveDate) -> EthosResult<DailyStats> {
        let (goal_value_sum, goal_logs_count): (i64, i64) = sqlx::query_as(
            "SELECT COALESCE(SUM(l.value), 0), COUNT(l.id)
             FROM goal_logs l JOIN goals g ON g.id = l.goal_id
             WHERE g.user_id = ?1 AND l.date = ?2",
        )
        .bind(user_id)
        .bind(date)
        .fetch_one(&self.db)
        .await?;

        let (focus_seconds, focus_sessions_count): (i64, i64) = sqlx::query_as(
            "SELECT COALESCE(SUM(duration_seconds), 0), COUNT(id)
             FROM focus_sessions
             WHERE user_id = ?1 AND date(started_at) = ?2",
        )
        .bind(user_id)
        .bind(date)
        .fetch_one(&self.db)
        .await?;

        Ok(DailyStats {
            date,
            goal_value_sum,
            goal_logs_count,
            focus_seconds,
            focus_sessions_count,
        })
    }

    /// Monday-to-Sunday breakdown of the week containing `today`
    pub async fn weekly(&self, user_id: i64, today: NaiveDate) -> EthosResult<WeeklyStats> {
        let (start_date, end_date) = week_bounds(today);

        let mut days = Vec::with_capacity(7);
        for date in start_date.iter_days().take(7) {
            let daily = self.daily(user_id, date).await?;
            days.push(WeeklyDayStats {
                date,
                goal_value_sum: daily.goal_value_sum,
                focus_seconds: daily.focus_seconds,
            });
        }

        Ok(WeeklyStats {
            start_date,
            end_date,
            goal_value_sum: days.iter().map(|d| d.goal_value_sum).sum(),
            focus_seconds: days.iter().map(|d| d.focus_seconds).sum(),
            days,
        })
    }

    /// Month-by-month breakdown of `year`
    pub async fn yearly(&self, user_id: i64, year: i32) -> EthosResult<YearlyStats> {
        let mut months = Vec::with_capacity(12);

        for month in 1..=12 {
            let (start, end) = month_bounds(year, month)?;

            let goal_value_sum: i64 = sqlx::query_scalar(
                "SELECT COALESCE(SUM(l.value), 0)
                 FROM goal_logs l JOIN goals g ON g.id = l.goal_id
                 WHERE g.user_id = ?1 AND l.date >= ?2 AND l.date < ?3",
            )
            .bind(user_id)
            .bind(start)
            .bind(end)
            .fetch_one(&self.db)
            .await?;

            let focus_seconds: i64 = sqlx::query_scalar(
                "SELECT COALESCE(SUM(duration_seconds), 0)
                 FROM focus_sessions
                 WHERE user_id = ?1 AND date(started_at) >= ?2 AND date(started_at) < ?3",
            )
            .bind(user_id)
            .bind(start)
            .bind(end)
            .fetch_one(&self.db)
            .await?;

            months.push(YearlyMonthStats {
                month,
                goal_value_sum,
                focus_seconds,
            });
        }

        Ok(YearlyStats {
            year,
            goal_value_sum: months.iter().map(|m| m.goal_value_sum).sum(),
            focus_seconds: months.iter().map(|m| m.focus_seconds).sum(),
            months,
        })
    }
}
