/// Focus sessions
///
/// A countdown timer a user can pause, resume, complete or cancel. At most one
/// session per user is running or paused at any time; completing a session
/// that is attached to a goal credits the goal with a focus log.

mod manager;
pub mod timer;

pub use manager::FocusSessionManager;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Start-session request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateFocusSessionRequest {
    #[validate(range(min = 300, max = 7200))]
    pub duration_seconds: i64,
    #[serde(default)]
    pub goal_id: Option<i64>,
}
