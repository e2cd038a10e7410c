/// User accounts, credentials and access tokens

use crate::{
    account::{hash_password, verify_password, IssuedSession},
    config::ServerConfig,
    db::models::User,
    error::{EthosError, EthosResult},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::sync::Arc;

const MIN_USERNAME_LEN: usize = 3;
const MAX_USERNAME_LEN: usize = 64;

/// Access token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id, as a decimal string
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Account manager service
pub struct AccountManager {
    db: SqlitePool,
    config: Arc<ServerConfig>,
}

impl AccountManager {
    /// Create a new account manager
    pub fn new(db: SqlitePool, config: Arc<ServerConfig>) -> Self {
        Self { db, config }
    }

    /// Normalize a username the way it is stored
    pub fn normalize_username(username: &str) -> String {
        username.trim().to_lowercase()
    }

    /// Create a new user
    ///
    /// Registration gating happens in the caller; this only enforces
    /// username rules and uniqueness.
    pub async fn create_user(&self, username: &str, password: &str) -> EthosResult<User> {
        let username = Self::normalize_username(username);
        self.validate_username(&username)?;
        self.validate_password(password)?;

        if self.username_exists(&username).await? {
            return Err(EthosError::Conflict("User already exists".to_string()));
        }

        let password_hash = hash_password(password)?;
        let now = Utc::now();

        let result = sqlx::query(
            "INSERT INTO users (username, password_hash, is_active, is_admin, created_at, updated_at)
             VALUES (?1, ?2, 1, 0, ?3, ?3)",
        )
        .bind(&username)
        .bind(&password_hash)
        .bind(now)
        .execute(&self.db)
        .await
        .map_err(|e| {
            let err = EthosError::Database(e);
            if err.is_unique_violation() {
                EthosError::Conflict("User already exists".to_string())
            } else {
                err
            }
        })?;

        let user_id = result.last_insert_rowid();
        tracing::info!(user_id, username = %username, "user registered");

        Ok(User {
            id: user_id,
            username,
            password_hash,
            is_active: true,
            is_admin: false,
            created_at: now,
            updated_at: now,
        })
    }

    /// Verify credentials and issue an access token
    pub async fn login(&self, username: &str, password: &str) -> EthosResult<IssuedSession> {
        let username = Self::normalize_username(username);

        let user = match self.get_user_by_username(&username).await? {
            Some(user) if user.is_active => user,
            _ => {
                tracing::warn!(username = %username, "login rejected: unknown or inactive user");
                return Err(EthosError::Authentication("Invalid credentials".to_string()));
            }
        };

        if !verify_password(password, &user.password_hash)? {
            tracing::warn!(username = %username, "login rejected: bad password");
            return Err(EthosError::Authentication("Invalid credentials".to_string()));
        }

        let token = self.issue_token(user.id)?;
        Ok(IssuedSession { user, token })
    }

    /// Generate access JWT token
    pub fn issue_token(&self, user_id: i64) -> EthosResult<String> {
        let now = Utc::now();
        let ttl_minutes = self.config.authentication.token_ttl_minutes;
        let exp = Duration::try_minutes(ttl_minutes)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| EthosError::Internal(format!("Token TTL out of range: {} minutes", ttl_minutes)))?;

        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.authentication.auth_secret.as_bytes()),
        )
        .map_err(|e| EthosError::Jwt(format!("Failed to generate token: {}", e)))
    }

    /// Decode an access token into the user id it was issued for
    pub fn decode_token(&self, token: &str) -> EthosResult<i64> {
        let decoding_key =
            DecodingKey::from_secret(self.config.authentication.auth_secret.as_bytes());
        let validation = Validation::new(Algorithm::HS256);

        let data = decode::<Claims>(token, &decoding_key, &validation).map_err(|e| {
            tracing::debug!("JWT verification failed: {}", e);
            EthosError::Authentication("Invalid session".to_string())
        })?;

        data.claims
            .sub
            .parse::<i64>()
            .map_err(|_| EthosError::Authentication("Invalid session".to_string()))
    }

    /// Validate access token and return the active user it belongs to
    pub async fn validate_access_token(&self, token: &str) -> EthosResult<User> {
        let user_id = self.decode_token(token)?;

        match self.get_user(user_id).await? {
            Some(user) if user.is_active => Ok(user),
            _ => Err(EthosError::Authentication("User inactive".to_string())),
        }
    }

    /// Get user by id
    pub async fn get_user(&self, user_id: i64) -> EthosResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, is_active, is_admin, created_at, updated_at
             FROM users WHERE id = ?1",
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }

    /// Get user by normalized username
    async fn get_user_by_username(&self, username: &str) -> EthosResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, is_active, is_admin, created_at, updated_at
             FROM users WHERE username = ?1",
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }

    /// Check if username exists
    async fn username_exists(&self, username: &str) -> EthosResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = ?1")
            .bind(username)
            .fetch_one(&self.db)
            .await?;

        Ok(count > 0)
    }

    /// Validate username format
    fn validate_username(&self, username: &str) -> EthosResult<()> {
        if username.is_empty() {
            return Err(EthosError::Validation("Username is required".to_string()));
        }

        if username.len() < MIN_USERNAME_LEN {
            return Err(EthosError::Validation(format!(
                "Username must be at least {} characters",
                MIN_USERNAME_LEN
            )));
        }

        if username.len() > MAX_USERNAME_LEN {
            return Err(EthosError::Validation("Username too long".to_string()));
        }

        if !username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
        {
            return Err(EthosError::Validation(
                "Username contains invalid characters".to_string(),
            ));
        }

        Ok(())
    }

    /// Validate password length
    fn validate_password(&self, password: &str) -> EthosResult<()> {
        if password.len() < 8 {
            return Err(EthosError::Validation(
                "Password must be at least 8 characters".to_string(),
            ));
        }

        if password.len() > 256 {
            return Err(EthosError::Validation("Password too long".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_memory_pool;

    async fn setup_test_db() -> AccountManager {
        let db = create_memory_pool().await.unwrap();
        AccountManager::new(db, Arc::new(ServerConfig::for_tests()))
    }

    #[tokio::test]
    async fn test_create_user_normalizes_username() {
        let manager = setup_test_db().await;

        let user = manager.create_user("  Alice ", "password123").await.unwrap();
        assert_eq!(user.username, "alice");
        assert!(user.is_active);
        assert!(!user.is_admin);

        let stored = manager.get_user(user.id).await.unwrap().unwrap();
        assert_eq!(stored.username, "alice");
        assert_ne!(stored.password_hash, "password123");
    }

    #[tokio::test]
    async fn test_create_user_duplicate() {
        let manager = setup_test_db().await;

        manager.create_user("alice", "password123").await.unwrap();
        let result = manager.create_user("ALICE", "password456").await;

        match result {
            Err(EthosError::Conflict(msg)) => assert!(msg.contains("already exists")),
            other => panic!("Expected Conflict error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_user_validation() {
        let manager = setup_test_db().await;

        assert!(matches!(
            manager.create_user("   ", "password123").await,
            Err(EthosError::Validation(_))
        ));
        assert!(matches!(
            manager.create_user("al", "password123").await,
            Err(EthosError::Validation(_))
        ));
        assert!(matches!(
            manager.create_user("alice@home", "password123").await,
            Err(EthosError::Validation(_))
        ));
        assert!(matches!(
            manager.create_user("alice", "short").await,
            Err(EthosError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_login_and_validate_token() {
        let manager = setup_test_db().await;
        let user = manager.create_user("alice", "password123").await.unwrap();

        let session = manager.login("Alice", "password123").await.unwrap();
        assert_eq!(session.user.id, user.id);

        let validated = manager.validate_access_token(&session.token).await.unwrap();
        assert_eq!(validated.id, user.id);
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let manager = setup_test_db().await;
        manager.create_user("alice", "password123").await.unwrap();

        let result = manager.login("alice", "password124").await;
        assert!(matches!(result, Err(EthosError::Authentication(_))));

        let result = manager.login("nobody", "password123").await;
        assert!(matches!(result, Err(EthosError::Authentication(_))));
    }

    #[tokio::test]
    async fn test_inactive_user_rejected() {
        let manager = setup_test_db().await;
        let user = manager.create_user("alice", "password123").await.unwrap();
        let session = manager.login("alice", "password123").await.unwrap();

        sqlx::query("UPDATE users SET is_active = 0 WHERE id = ?1")
            .bind(user.id)
            .execute(&manager.db)
            .await
            .unwrap();

        assert!(matches!(
            manager.login("alice", "password123").await,
            Err(EthosError::Authentication(_))
        ));
        assert!(matches!(
            manager.validate_access_token(&session.token).await,
            Err(EthosError::Authentication(_))
        ));
    }

    #[tokio::test]
    async fn test_token_signed_with_other_secret_rejected() {
        let manager = setup_test_db().await;
        manager.create_user("alice", "password123").await.unwrap();

        let mut other_config = ServerConfig::for_tests();
        other_config.authentication.auth_secret = "another-secret-key-that-is-long-enough!!".to_string();
        let other = AccountManager::new(manager.db.clone(), Arc::new(other_config));
        let forged = other.issue_token(1).unwrap();

        assert!(matches!(
            manager.validate_access_token(&forged).await,
            Err(EthosError::Authentication(_))
        ));
        assert!(manager.decode_token("garbage").is_err());
    }

    #[tokio::test]
    async fn test_oversized_ttl_is_an_error() {
        let manager = setup_test_db().await;

        let mut config = ServerConfig::for_tests();
        config.authentication.token_ttl_minutes = i64::MAX / 2;
        let oversized = AccountManager::new(manager.db.clone(), Arc::new(config));

        assert!(matches!(oversized.issue_token(1), Err(EthosError::Internal(_))));
    }
}
