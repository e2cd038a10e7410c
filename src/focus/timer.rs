/// Focus timer arithmetic
///
/// Pure functions over a session snapshot and a caller-supplied `now`, so the
/// lifecycle rules can be exercised without a clock or a database.
use crate::{
    db::models::{FocusSession, FocusStatus},
    error::{EthosError, EthosResult},
};
use chrono::{DateTime, Utc};

/// Shortest allowed session
pub const MIN_DURATION_SECONDS: i64 = 300;
/// Longest allowed session
pub const MAX_DURATION_SECONDS: i64 = 7200;

/// Seconds of focused time so far, never negative
///
/// A paused session is frozen at its pause timestamp (`ended_at`).
pub fn elapsed_seconds(session: &FocusSession, now: DateTime<Utc>) -> i64 {
    let effective_now = match (session.status, session.ended_at) {
        (FocusStatus::Paused, Some(paused_at)) => paused_at,
        _ => now,
    };

    let elapsed = (effective_now - session.started_at).num_seconds() - session.paused_seconds;
    elapsed.max(0)
}

/// Whether the session has used up its planned duration
pub fn is_expired(session: &FocusSession, now: DateTime<Utc>) -> bool {
    elapsed_seconds(session, now) >= session.duration_seconds
}

/// Minutes credited to the goal when a session completes (at least one)
pub fn focus_log_minutes(duration_seconds: i64) -> i64 {
    (duration_seconds / 60).max(1)
}

/// Check a requested duration: 5 minutes to 2 hours in whole minutes
pub fn validate_duration(duration_seconds: i64) -> EthosResult<()> {
    if !(MIN_DURATION_SECONDS..=MAX_DURATION_SECONDS).contains(&duration_seconds) {
        return Err(EthosError::Validation(format!(
            "Duration must be between {} and {} seconds",
            MIN_DURATION_SECONDS, MAX_DURATION_SECONDS
        )));
    }

    if duration_seconds % 60 != 0 {
        return Err(EthosError::Validation(
            "Duration must be in 60 second steps".to_string(),
        ));
    }

    Ok(())
}

/// Put a running session on hold
pub fn pause(session: &mut FocusSession, now: DateTime<Utc>) -> EthosResult<()> {
    if session.status != FocusStatus::Running {
        return Err(EthosError::Validation("Session is not running".to_string()));
    }

    session.status = FocusStatus::Paused;
    session.ended_at = Some(now);
    Ok(())
}

/// Continue a paused session, crediting the pause to `paused_seconds`
pub fn resume(session: &mut FocusSession, now: DateTime<Utc>) -> EthosResult<()> {
    if session.status != FocusStatus::Paused {
        return Err(EthosError::Validation("Session is not paused".to_string()));
    }

    if let Some(paused_at) = session.ended_at {
        session.paused_seconds += (now - paused_at).num_seconds().max(0);
    }
    session.status = FocusStatus::Running;
    session.ended_at = None;
    Ok(())
}

/// Move an unfinished session to `completed` or `canceled`
pub fn finish(session: &mut FocusSession, outcome: FocusStatus, now: DateTime<Utc>) -> EthosResult<()> {
    debug_assert!(outcome.is_finished());

    if session.status.is_finished() {
        return Err(EthosError::Validation("Session already finished".to_string()));
    }

    session.status = outcome;
    session.ended_at = Some(now);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
    }

    fn running(duration_seconds: i64) -> FocusSession {
        FocusSession {
            id: 1,
            user_id: 1,
            goal_id: None,
            duration_seconds,
            paused_seconds: 0,
            status: FocusStatus::Running,
            started_at: t0(),
            ended_at: None,
        }
    }

    #[test]
    fn test_elapsed_running() {
        let session = running(1500);
        assert_eq!(elapsed_seconds(&session, t0() + Duration::seconds(90)), 90);
    }

    #[test]
    fn test_elapsed_never_negative() {
        let mut session = running(1500);
        assert_eq!(elapsed_seconds(&session, t0() - Duration::seconds(30)), 0);

        session.paused_seconds = 10_000;
        assert_eq!(elapsed_seconds(&session, t0() + Duration::seconds(60)), 0);
    }

    #[test]
    fn test_paused_session_is_frozen() {
        let mut session = running(1500);
        pause(&mut session, t0() + Duration::seconds(120)).unwrap();

        assert_eq!(session.status, FocusStatus::Paused);
        assert_eq!(elapsed_seconds(&session, t0() + Duration::seconds(120)), 120);
        assert_eq!(elapsed_seconds(&session, t0() + Duration::hours(5)), 120);
        assert!(!is_expired(&session, t0() + Duration::hours(5)));
    }

    #[test]
    fn test_resume_accumulates_exact_pause() {
        let mut session = running(1500);
        pause(&mut session, t0() + Duration::seconds(100)).unwrap();
        resume(&mut session, t0() + Duration::seconds(400)).unwrap();

        assert_eq!(session.paused_seconds, 300);
        assert_eq!(session.status, FocusStatus::Running);
        assert!(session.ended_at.is_none());

        pause(&mut session, t0() + Duration::seconds(500)).unwrap();
        resume(&mut session, t0() + Duration::seconds(545)).unwrap();
        assert_eq!(session.paused_seconds, 345);

        // 600s of wall clock minus 345s paused
        assert_eq!(elapsed_seconds(&session, t0() + Duration::seconds(600)), 255);
    }

    #[test]
    fn test_expiry_boundary() {
        let session = running(300);
        assert!(!is_expired(&session, t0() + Duration::seconds(299)));
        assert!(is_expired(&session, t0() + Duration::seconds(300)));
        assert!(is_expired(&session, t0() + Duration::seconds(900)));
    }

    #[test]
    fn test_invalid_transitions() {
        let mut session = running(600);
        assert!(resume(&mut session, t0()).is_err());

        pause(&mut session, t0()).unwrap();
        assert!(pause(&mut session, t0()).is_err());

        finish(&mut session, FocusStatus::Canceled, t0() + Duration::seconds(5)).unwrap();
        assert_eq!(session.status, FocusStatus::Canceled);
        assert!(finish(&mut session, FocusStatus::Completed, t0()).is_err());
        assert!(resume(&mut session, t0()).is_err());
        assert!(pause(&mut session, t0()).is_err());
    }

    #[test]
    fn test_focus_log_minutes() {
        assert_eq!(focus_log_minutes(1500), 25);
        assert_eq!(focus_log_minutes(90), 1);
        assert_eq!(focus_log_minutes(0), 1);
    }

    #[test]
    fn test_validate_duration() {
        assert!(validate_duration(300).is_ok());
        assert!(validate_duration(7200).is_ok());
        assert!(validate_duration(240).is_err());
        assert!(validate_duration(7260).is_err());
        assert!(validate_duration(330).is_err());
    }
}
