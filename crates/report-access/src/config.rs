//! Access-control store configuration.
//!
//! Configuration is loaded from environment variables with defaults suitable
//! for local development.

use report_rbac::ScopeLevel;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::AccessError;
use crate::resolver::ResolverSettings;
use crate::retry::RetryConfig;

/// Page id of the project overview, the designated hierarchy root that never
/// inherits access.
pub const DEFAULT_OVERVIEW_PAGE_ID: &str = "cms-overview";

/// Configuration for the access-control store and resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Access-control store endpoint.
    pub endpoint: StoreEndpoint,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Maximum attempts for idempotent reads.
    pub max_retries: u32,

    /// Scope level for calculated resource ids.
    pub scope_level: u32,

    /// Page id of the project overview.
    pub overview_page_id: String,
}

impl Default for StoreConfig {
    /// Returns default configuration suitable for local development.
    fn default() -> Self {
        Self {
            endpoint: StoreEndpoint {
                base_url: "http://localhost:4810".to_string(),
                api_key: None,
            },
            timeout_secs: 30,
            max_retries: 3,
            scope_level: ScopeLevel::DEFAULT.value(),
            overview_page_id: DEFAULT_OVERVIEW_PAGE_ID.to_string(),
        }
    }
}

impl StoreConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `ACCESS_STORE_URL`: Store URL (default: http://localhost:4810)
    /// - `ACCESS_STORE_API_KEY`: Store API key
    /// - `ACCESS_STORE_TIMEOUT_SECS`: Request timeout in seconds (default: 30)
    /// - `ACCESS_STORE_MAX_RETRIES`: Maximum read attempts (default: 3)
    /// - `ACCESS_SCOPE_LEVEL`: Scope level for resource ids (default: 1)
    /// - `ACCESS_OVERVIEW_PAGE_ID`: Overview page id (default: cms-overview)
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            endpoint: StoreEndpoint {
                base_url: std::env::var("ACCESS_STORE_URL").unwrap_or(default.endpoint.base_url),
                api_key: std::env::var("ACCESS_STORE_API_KEY").ok(),
            },
            timeout_secs: std::env::var("ACCESS_STORE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.timeout_secs),
            max_retries: std::env::var("ACCESS_STORE_MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.max_retries),
            scope_level: std::env::var("ACCESS_SCOPE_LEVEL")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.scope_level),
            overview_page_id: std::env::var("ACCESS_OVERVIEW_PAGE_ID")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or(default.overview_page_id),
        }
    }

    /// Get the request timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Retry policy for store reads.
    pub fn retry(&self) -> RetryConfig {
        RetryConfig::with_attempts(self.max_retries)
    }

    /// Resolver settings derived from this configuration.
    pub fn resolver_settings(&self) -> ResolverSettings {
        ResolverSettings {
            overview_page_id: self.overview_page_id.clone(),
            scope: ScopeLevel(self.scope_level),
        }
    }

    /// Validate that the configuration is complete for production.
    pub fn validate_for_production(&self) -> Result<(), AccessError> {
        if self.endpoint.api_key.is_none() {
            return Err(AccessError::Config(
                "Missing required environment variable: ACCESS_STORE_API_KEY".to_string(),
            ));
        }
        if !self.endpoint.base_url.starts_with("https://") {
            return Err(AccessError::Config(format!(
                "Access store URL must use https in production: {}",
                self.endpoint.base_url
            )));
        }
        Ok(())
    }
}

/// Access-control store endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreEndpoint {
    /// Base URL for the store (e.g., "https://rbac.example.com").
    pub base_url: String,

    /// API key for service-to-service authentication.
    pub api_key: Option<String>,
}

impl StoreEndpoint {
    /// Create an endpoint without authentication.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
        }
    }

    /// Build a full URL by appending a path to the base URL.
    pub fn url(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }

    /// Check if API key authentication is available.
    pub fn has_auth(&self) -> bool {
        self.api_key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.overview_page_id, "cms-overview");
        assert_eq!(config.resolver_settings().scope, ScopeLevel::DEFAULT);
        assert_eq!(config.retry().max_attempts, 3);
    }

    #[test]
    fn test_endpoint_url() {
        let endpoint = StoreEndpoint::new("https://rbac.example.com/");
        assert_eq!(
            endpoint.url("/api/v1/roles"),
            "https://rbac.example.com/api/v1/roles"
        );
        assert_eq!(endpoint.url("api/v1/roles"), "https://rbac.example.com/api/v1/roles");
        assert!(!endpoint.has_auth());
    }

    #[test]
    fn test_validate_for_production() {
        let mut config = StoreConfig::default();
        assert!(config.validate_for_production().is_err());

        config.endpoint.api_key = Some("key".to_string());
        assert!(config.validate_for_production().is_err());

        config.endpoint.base_url = "https://rbac.example.com".to_string();
        assert!(config.validate_for_production().is_ok());
    }
}
