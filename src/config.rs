/// Configuration management for the Ethos API
use crate::error::{EthosError, EthosResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Longest accepted session lifetime (one year)
pub const MAX_TOKEN_TTL_MINUTES: i64 = 60 * 24 * 365;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub authentication: AuthConfig,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
    pub app_name: String,
    /// Allowed CORS origins (comma-separated in the environment)
    pub cors_origins: Vec<String>,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub media_root: PathBuf,
}

/// Cookie SameSite policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSitePolicy {
    Lax,
    Strict,
    None,
}

impl SameSitePolicy {
    pub fn parse(s: &str) -> EthosResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "lax" => Ok(SameSitePolicy::Lax),
            "strict" => Ok(SameSitePolicy::Strict),
            "none" => Ok(SameSitePolicy::None),
            other => Err(EthosError::Validation(format!(
                "Invalid AUTH_COOKIE_SAMESITE value: {}",
                other
            ))),
        }
    }
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub auth_secret: String,
    /// Shared secret required to toggle registration
    pub admin_secret: String,
    pub cookie_name: String,
    pub cookie_secure: bool,
    pub cookie_samesite: SameSitePolicy,
    pub token_ttl_minutes: i64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> EthosResult<Self> {
        dotenv::dotenv().ok();

        let hostname = env::var("ETHOS_HOSTNAME").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("ETHOS_PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse()
            .map_err(|_| EthosError::Validation("Invalid port number".to_string()))?;
        let app_name = env::var("APP_NAME").unwrap_or_else(|_| "Ethos API".to_string());
        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<String>>();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./data/ethos.sqlite".to_string());
        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .unwrap_or(10);
        let media_root: PathBuf = env::var("MEDIA_ROOT")
            .unwrap_or_else(|_| "./data/media".to_string())
            .into();

        let auth_secret = env::var("AUTH_SECRET")
            .map_err(|_| EthosError::Validation("AUTH_SECRET required".to_string()))?;
        let admin_secret = env::var("ADMIN_SECRET")
            .map_err(|_| EthosError::Validation("ADMIN_SECRET required".to_string()))?;
        let cookie_name =
            env::var("AUTH_COOKIE_NAME").unwrap_or_else(|_| "ethos_session".to_string());
        let cookie_secure = env::var("AUTH_COOKIE_SECURE")
            .ok()
            .and_then(|v| parse_bool(&v))
            .unwrap_or(false);
        let cookie_samesite = SameSitePolicy::parse(
            &env::var("AUTH_COOKIE_SAMESITE").unwrap_or_else(|_| "lax".to_string()),
        )?;
        let token_ttl_minutes = env::var("AUTH_TOKEN_TTL_MINUTES")
            .unwrap_or_else(|_| (60 * 24 * 7).to_string())
            .parse()
            .map_err(|_| EthosError::Validation("Invalid AUTH_TOKEN_TTL_MINUTES".to_string()))?;

        let level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let json = env::var("LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        Ok(ServerConfig {
            service: ServiceConfig {
                hostname,
                port,
                app_name,
                cors_origins,
            },
            storage: StorageConfig {
                database_url,
                max_connections,
                media_root,
            },
            authentication: AuthConfig {
                auth_secret,
                admin_secret,
                cookie_name,
                cookie_secure,
                cookie_samesite,
                token_ttl_minutes,
            },
            logging: LoggingConfig { level, json },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> EthosResult<()> {
        if self.service.hostname.is_empty() {
            return Err(EthosError::Validation("Hostname cannot be empty".to_string()));
        }

        if self.authentication.auth_secret.len() < 32 {
            return Err(EthosError::Validation(
                "AUTH_SECRET must be at least 32 characters".to_string(),
            ));
        }

        if self.authentication.admin_secret.is_empty() {
            return Err(EthosError::Validation("ADMIN_SECRET cannot be empty".to_string()));
        }

        if self.authentication.cookie_name.is_empty() {
            return Err(EthosError::Validation("AUTH_COOKIE_NAME cannot be empty".to_string()));
        }

        if !(1..=MAX_TOKEN_TTL_MINUTES).contains(&self.authentication.token_ttl_minutes) {
            return Err(EthosError::Validation(format!(
                "AUTH_TOKEN_TTL_MINUTES must be between 1 and {}",
                MAX_TOKEN_TTL_MINUTES
            )));
        }

        // Browsers drop SameSite=None cookies that are not Secure
        if self.authentication.cookie_samesite == SameSitePolicy::None
            && !self.authentication.cookie_secure
        {
            return Err(EthosError::Validation(
                "AUTH_COOKIE_SAMESITE=none requires AUTH_COOKIE_SECURE=true".to_string(),
            ));
        }

        Ok(())
    }

    /// Configuration used by unit and integration tests
    pub fn for_tests() -> Self {
        ServerConfig {
            service: ServiceConfig {
                hostname: "127.0.0.1".to_string(),
                port: 0,
                app_name: "Ethos API".to_string(),
                cors_origins: vec![],
            },
            storage: StorageConfig {
                database_url: "sqlite::memory:".to_string(),
                max_connections: 1,
                media_root: PathBuf::from("./data/media"),
            },
            authentication: AuthConfig {
                auth_secret: "test-secret-key-for-testing-only-0123456789".to_string(),
                admin_secret: "admin-test-secret".to_string(),
                cookie_name: "ethos_session".to_string(),
                cookie_secure: false,
                cookie_samesite: SameSitePolicy::Lax,
                token_ttl_minutes: 60,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                json: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_samesite_parse() {
        assert_eq!(SameSitePolicy::parse("Lax").unwrap(), SameSitePolicy::Lax);
        assert_eq!(SameSitePolicy::parse(" strict ").unwrap(), SameSitePolicy::Strict);
        assert_eq!(SameSitePolicy::parse("none").unwrap(), SameSitePolicy::None);
        assert!(SameSitePolicy::parse("sometimes").is_err());
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_validate() {
        let config = ServerConfig::for_tests();
        assert!(config.validate().is_ok());

        let mut short_secret = config.clone();
        short_secret.authentication.auth_secret = "short".to_string();
        assert!(short_secret.validate().is_err());

        let mut insecure_none = config.clone();
        insecure_none.authentication.cookie_samesite = SameSitePolicy::None;
        assert!(insecure_none.validate().is_err());

        let mut zero_ttl = config;
        zero_ttl.authentication.token_ttl_minutes = 0;
        assert!(zero_ttl.validate().is_err());
    }

    #[test]
    fn test_validate_ttl_upper_bound() {
        let mut config = ServerConfig::for_tests();

        config.authentication.token_ttl_minutes = MAX_TOKEN_TTL_MINUTES;
        assert!(config.validate().is_ok());

        config.authentication.token_ttl_minutes = MAX_TOKEN_TTL_MINUTES + 1;
        assert!(config.validate().is_err());

        config.authentication.token_ttl_minutes = i64::MAX / 2;
        assert!(config.validate().is_err());
    }
}
