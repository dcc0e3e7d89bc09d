//! HTTP access-control store client.
//!
//! Talks JSON to the remote access-control store. Reads are retried on
//! transient failures; writes are sent exactly once.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

use report_hierarchy::BreadcrumbTrail;
use report_rbac::{
    AccessGrant, AccessRecord, EffectiveRoleSet, Group, RecordMutation, ResourceId, ResourceRecord, Role, Subject,
    User,
};

use super::{AccessControlStore, StoreError, StoreResult};
use crate::config::{StoreConfig, StoreEndpoint};
use crate::retry::{with_retry_if, RetryConfig};

/// Access-control store client.
#[derive(Debug, Clone)]
pub struct HttpAccessControlStore {
    /// HTTP client instance.
    client: Client,

    /// Store endpoint configuration.
    endpoint: StoreEndpoint,

    /// Retry policy for reads.
    retry: RetryConfig,
}

impl HttpAccessControlStore {
    /// Create a new store client.
    pub fn new(endpoint: StoreEndpoint, timeout: Duration) -> StoreResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint,
            retry: RetryConfig::default(),
        })
    }

    /// Create a store client from configuration.
    pub fn from_config(config: &StoreConfig) -> StoreResult<Self> {
        Ok(Self::new(config.endpoint.clone(), config.timeout())?.with_retry(config.retry()))
    }

    /// Replace the retry policy for reads.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.endpoint.api_key {
            Some(ref api_key) => request.header("Authorization", format!("Bearer {}", api_key)),
            None => request,
        }
    }

    /// GET a JSON document, retrying transient failures.
    async fn get_json<T>(&self, path: &str, query: &[(&str, String)]) -> StoreResult<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let url = self.endpoint.url(path);

        with_retry_if(
            &self.retry,
            || {
                let request = self.authorize(self.client.get(&url)).query(query);
                async move {
                    match request.send().await {
                        Ok(response) => Self::handle_response(response).await,
                        Err(e) => Err(StoreError::from(e)),
                    }
                }
            },
            StoreError::is_retryable,
        )
        .await
    }

    /// Send a mutation once and read the `success` flag.
    async fn send_mutation(&self, request: RequestBuilder) -> StoreResult<bool> {
        let response = self.authorize(request).send().await?;
        let outcome: MutationResponse = Self::handle_response(response).await?;
        Ok(outcome.success)
    }

    /// Handle API response and parse JSON.
    async fn handle_response<T>(response: reqwest::Response) -> StoreResult<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            error!("Access store authentication failed");
            return Err(StoreError::AuthenticationFailed);
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            warn!("Access store API error ({}): {}", status.as_u16(), message);
            return Err(StoreError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl AccessControlStore for HttpAccessControlStore {
    #[instrument(skip(self), fields(resource_id = resource_id.map(|r| r.as_str())))]
    async fn list_access_records(&self, resource_id: Option<&ResourceId>) -> StoreResult<Vec<AccessRecord>> {
        debug!("Listing access records");

        let query: Vec<(&str, String)> = resource_id
            .map(|r| vec![("resource", r.to_string())])
            .unwrap_or_default();
        self.get_json("/api/v1/access-records", &query).await
    }

    #[instrument(skip(self), fields(resource_id = %resource_id))]
    async fn retrieve_resource(&self, resource_id: &ResourceId, strict: bool) -> StoreResult<Option<ResourceRecord>> {
        debug!("Retrieving resource record");

        let query = [("id", resource_id.to_string()), ("strict", strict.to_string())];
        match self.get_json("/api/v1/resources", &query).await {
            Ok(record) => Ok(Some(record)),
            Err(StoreError::ApiError { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self))]
    async fn list_groups(&self) -> StoreResult<Vec<Group>> {
        self.get_json("/api/v1/groups", &[]).await
    }

    #[instrument(skip(self))]
    async fn list_users(&self) -> StoreResult<Vec<User>> {
        self.get_json("/api/v1/users", &[]).await
    }

    #[instrument(skip(self))]
    async fn list_roles(&self) -> StoreResult<Vec<Role>> {
        self.get_json("/api/v1/roles", &[]).await
    }

    #[instrument(skip(self, trail), fields(trail_length = trail.len()))]
    async fn retrieve_effective_roles(&self, trail: &BreadcrumbTrail) -> StoreResult<EffectiveRoleSet> {
        debug!("Retrieving effective roles along trail");

        let url = self.endpoint.url("/api/v1/effective-roles");
        let body = EffectiveRolesRequest { trail };

        // POST but read-only on the store side, so safe to retry
        with_retry_if(
            &self.retry,
            || {
                let request = self.authorize(self.client.post(&url)).json(&body);
                async move {
                    match request.send().await {
                        Ok(response) => Self::handle_response(response).await,
                        Err(e) => Err(StoreError::from(e)),
                    }
                }
            },
            StoreError::is_retryable,
        )
        .await
    }

    #[instrument(skip(self, grant), fields(resource_id = %grant.resource_id, subject = %grant.subject, role = %grant.role_id))]
    async fn add_access_record(&self, grant: &AccessGrant) -> StoreResult<bool> {
        let url = self.endpoint.url("/api/v1/access-records");
        let changed = self.send_mutation(self.client.post(&url).json(grant)).await?;
        info!(changed, "Added access record");
        Ok(changed)
    }

    #[instrument(skip(self, mutations), fields(count = mutations.len()))]
    async fn edit_access_records(&self, mutations: &[RecordMutation]) -> StoreResult<bool> {
        let url = self.endpoint.url("/api/v1/access-records");
        let body = EditRecordsRequest { records: mutations };
        let changed = self.send_mutation(self.client.put(&url).json(&body)).await?;
        info!(changed, "Edited access records");
        Ok(changed)
    }

    #[instrument(skip(self), fields(resource_id = %resource_id, subject = %subject))]
    async fn delete_access_record(
        &self,
        resource_id: &ResourceId,
        subject: &Subject,
        role_id: &str,
    ) -> StoreResult<bool> {
        let url = self.endpoint.url("/api/v1/access-records");
        let subject_key = match subject {
            Subject::User(_) => "user",
            Subject::Group(_) => "group",
        };
        let query = [
            ("resource", resource_id.to_string()),
            (subject_key, subject.id().to_string()),
            ("role", role_id.to_string()),
        ];

        let changed = self.send_mutation(self.client.delete(&url).query(&query)).await?;
        info!(changed, "Deleted access record");
        Ok(changed)
    }

    #[instrument(skip(self), fields(resource_id = %resource_id))]
    async fn edit_resource(
        &self,
        resource_id: &ResourceId,
        reset_inheritance: bool,
        is_persistent: bool,
    ) -> StoreResult<bool> {
        let url = self.endpoint.url("/api/v1/resources");
        let body = EditResourceRequest {
            resource_id,
            reset_inheritance,
            is_persistent,
        };

        let changed = self.send_mutation(self.client.patch(&url).json(&body)).await?;
        info!(changed, "Edited resource");
        Ok(changed)
    }
}

/// Body of the effective-roles query.
#[derive(Debug, Serialize)]
struct EffectiveRolesRequest<'a> {
    trail: &'a BreadcrumbTrail,
}

/// Body of a batched record edit.
#[derive(Debug, Serialize)]
struct EditRecordsRequest<'a> {
    records: &'a [RecordMutation],
}

/// Body of a resource edit.
#[derive(Debug, Serialize)]
struct EditResourceRequest<'a> {
    resource_id: &'a ResourceId,
    reset_inheritance: bool,
    is_persistent: bool,
}

/// Answer to every mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationResponse {
    /// Whether the store changed anything.
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let endpoint = StoreEndpoint {
            base_url: "http://localhost:4810".to_string(),
            api_key: Some("test-key".to_string()),
        };
        let store = HttpAccessControlStore::new(endpoint, Duration::from_secs(30)).unwrap();
        assert!(store.endpoint.has_auth());
        assert_eq!(store.retry, RetryConfig::default());
    }

    #[test]
    fn test_from_config_uses_configured_attempts() {
        let config = StoreConfig {
            max_retries: 5,
            ..StoreConfig::default()
        };
        let store = HttpAccessControlStore::from_config(&config).unwrap();
        assert_eq!(store.retry.max_attempts, 5);
    }

    #[test]
    fn test_edit_request_shape() {
        let mutation = RecordMutation {
            resource_id: ResourceId::from_raw("get:1:ar2024:notes"),
            subject: Subject::user("u1"),
            role_id: "editor".to_string(),
            enabled: false,
        };
        let body = serde_json::to_value(EditRecordsRequest {
            records: std::slice::from_ref(&mutation),
        })
        .unwrap();

        assert_eq!(
            body,
            serde_json::json!({"records": [{
                "resource_id": "get:1:ar2024:notes",
                "subject": {"type": "user", "id": "u1"},
                "role_id": "editor",
                "enabled": false
            }]})
        );
    }
}
