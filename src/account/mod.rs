/// Account management system
///
/// Handles user registration, password verification and session tokens.

mod manager;
mod password;

pub use manager::{AccountManager, Claims};
pub use password::{hash_password, verify_password};

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Registration request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(max = 255))]
    pub username: String,
    #[validate(length(min = 8, max = 256))]
    pub password: String,
}

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Registration toggle request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationToggle {
    pub enabled: bool,
    pub admin_password: String,
}

/// Registration toggle response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationState {
    pub registration_enabled: bool,
}

/// A user that passed credential checks, plus the token issued for it
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub user: crate::db::models::User,
    pub token: String,
}
