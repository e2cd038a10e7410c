/// API routes and handlers
pub mod auth;
pub mod focus;
pub mod goals;
pub mod health;
pub mod logs;
pub mod middleware;
pub mod revisions;
pub mod stats;

use crate::{
    context::AppContext,
    error::{EthosError, EthosResult},
};
use axum::Router;
use serde::Deserialize;

/// Build API routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(goals::routes())
        .merge(revisions::routes())
        .merge(logs::routes())
        .merge(focus::routes())
        .merge(stats::routes())
}

/// `limit` / `offset` query parameters
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Pagination {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Pagination {
    /// Apply the endpoint's default and upper bound for `limit`
    pub fn resolve(&self, default_limit: i64, max_limit: i64) -> EthosResult<(i64, i64)> {
        let limit = self.limit.unwrap_or(default_limit);
        let offset = self.offset.unwrap_or(0);

        if !(1..=max_limit).contains(&limit) {
            return Err(EthosError::Validation(format!(
                "limit must be between 1 and {}",
                max_limit
            )));
        }
        if offset < 0 {
            return Err(EthosError::Validation("offset must not be negative".to_string()));
        }

        Ok((limit, offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults_and_bounds() {
        assert_eq!(Pagination::default().resolve(50, 200).unwrap(), (50, 0));

        let page = Pagination { limit: Some(200), offset: Some(400) };
        assert_eq!(page.resolve(50, 200).unwrap(), (200, 400));

        assert!(Pagination { limit: Some(0), offset: None }.resolve(50, 200).is_err());
        assert!(Pagination { limit: Some(201), offset: None }.resolve(50, 200).is_err());
        assert!(Pagination { limit: None, offset: Some(-1) }.resolve(50, 200).is_err());
    }
}
