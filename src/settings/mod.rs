/// System-wide boolean flags stored in the database
use crate::{
    db::models::SystemSetting,
    error::{EthosError, EthosResult},
};
use sqlx::SqlitePool;

/// Key of the flag gating self-service registration
pub const REGISTRATION_KEY: &str = "registration_enabled";

/// Flag store backed by the `system_settings` table
#[derive(Clone)]
pub struct SettingsManager {
    db: SqlitePool,
}

impl SettingsManager {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Read a flag; a missing key reads as `false`
    pub async fn get_flag(&self, key: &str) -> EthosResult<bool> {
        let setting = sqlx::query_as::<_, SystemSetting>(
            "SELECT key, value FROM system_settings WHERE key = ?1",
        )
        .bind(key)
        .fetch_optional(&self.db)
        .await?;

        Ok(setting.map_or(false, |s| s.value))
    }

    /// Insert or update a flag
    pub async fn set_flag(&self, key: &str, value: bool) -> EthosResult<bool> {
        if key.is_empty() || key.len() > 64 {
            return Err(EthosError::Validation("Invalid setting key".to_string()));
        }

        sqlx::query(
            "INSERT INTO system_settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(value)
        .execute(&self.db)
        .await?;

        tracing::info!(key, value, "system setting updated");
        Ok(value)
    }

    pub async fn is_registration_enabled(&self) -> EthosResult<bool> {
        self.get_flag(REGISTRATION_KEY).await
    }

    pub async fn set_registration_enabled(&self, enabled: bool) -> EthosResult<bool> {
        self.set_flag(REGISTRATION_KEY, enabled).await
    }
}

/// Compare a supplied admin password with the configured secret
///
/// Runs in time independent of where the first mismatch occurs.
pub fn verify_admin_password(supplied: &str, secret: &str) -> bool {
    let a = supplied.as_bytes();
    let b = secret.as_bytes();
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_memory_pool;

    #[tokio::test]
    async fn test_registration_defaults_to_disabled() {
        let settings = SettingsManager::new(create_memory_pool().await.unwrap());
        assert!(!settings.is_registration_enabled().await.unwrap());
    }

    #[tokio::test]
    async fn test_toggle_registration() {
        let settings = SettingsManager::new(create_memory_pool().await.unwrap());

        assert!(settings.set_registration_enabled(true).await.unwrap());
        assert!(settings.is_registration_enabled().await.unwrap());

        assert!(!settings.set_registration_enabled(false).await.unwrap());
        assert!(!settings.is_registration_enabled().await.unwrap());
    }

    #[tokio::test]
    async fn test_invalid_key() {
        let settings = SettingsManager::new(create_memory_pool().await.unwrap());
        let long_key = "k".repeat(65);
        assert!(settings.set_flag(&long_key, true).await.is_err());
    }

    #[test]
    fn test_verify_admin_password() {
        assert!(verify_admin_password("s3cret", "s3cret"));
        assert!(!verify_admin_password("s3cre", "s3cret"));
        assert!(!verify_admin_password("s3creT", "s3cret"));
        assert!(!verify_admin_password("", "s3cret"));
    }
}
