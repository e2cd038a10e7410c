/// Authentication extractors and session cookie helpers
use crate::{
    api::middleware::extract_bearer_token,
    config::{AuthConfig, SameSitePolicy},
    context::AppContext,
    db::models::User,
    error::EthosError,
};
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

/// Authenticated user - extracts and validates the session from the request
///
/// The session cookie is checked first; an `Authorization: Bearer` header is
/// accepted when no cookie is present.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
}

impl AuthUser {
    pub fn id(&self) -> i64 {
        self.user.id
    }
}

#[async_trait]
impl FromRequestParts<AppContext> for AuthUser {
    type Rejection = EthosError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let cookie_name = &state.config.authentication.cookie_name;

        let token = jar
            .get(cookie_name)
            .map(|cookie| cookie.value().to_string())
            .filter(|value| !value.is_empty())
            .or_else(|| extract_bearer_token(&parts.headers))
            .ok_or_else(|| EthosError::Authentication("Not authenticated".to_string()))?;

        let user = state.account_manager.validate_access_token(&token).await?;

        Ok(AuthUser { user })
    }
}

fn same_site(policy: SameSitePolicy) -> SameSite {
    match policy {
        SameSitePolicy::Lax => SameSite::Lax,
        SameSitePolicy::Strict => SameSite::Strict,
        SameSitePolicy::None => SameSite::None,
    }
}

/// Build the HttpOnly session cookie carrying an access token
pub fn session_cookie(config: &AuthConfig, token: String) -> Cookie<'static> {
    Cookie::build((config.cookie_name.clone(), token))
        .http_only(true)
        .secure(config.cookie_secure)
        .same_site(same_site(config.cookie_samesite))
        .path("/")
        .max_age(time::Duration::minutes(config.token_ttl_minutes))
        .build()
}

/// Cookie that, when removed from a jar, clears the session on the client
pub fn removal_cookie(config: &AuthConfig) -> Cookie<'static> {
    Cookie::build((config.cookie_name.clone(), ""))
        .path("/")
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;

    #[test]
    fn test_session_cookie_attributes() {
        let config = ServerConfig::for_tests().authentication;
        let cookie = session_cookie(&config, "token-value".to_string());

        assert_eq!(cookie.name(), "ethos_session");
        assert_eq!(cookie.value(), "token-value");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(false));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(time::Duration::minutes(60)));
    }

    #[test]
    fn test_strict_secure_cookie() {
        let mut config = ServerConfig::for_tests().authentication;
        config.cookie_secure = true;
        config.cookie_samesite = SameSitePolicy::Strict;

        let cookie = session_cookie(&config, "t".to_string());
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
    }
}
