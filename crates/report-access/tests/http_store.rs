//! HTTP access-control store tests.
//!
//! These tests run the HTTP store client against a wiremock server and check
//! the request shapes, response handling and retry behavior.

use report_access::{AccessControlStore, HttpAccessControlStore, RetryConfig, StoreEndpoint, StoreError};
use report_hierarchy::BreadcrumbTrail;
use report_rbac::{AccessGrant, RecordMutation, ResourceId, Subject, SubjectKind};
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Test fixture with a mock store.
struct TestFixture {
    /// Mock access-control store.
    server: MockServer,
}

impl TestFixture {
    async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Store client pointed at the mock server, with fast retries.
    fn store(&self) -> HttpAccessControlStore {
        let endpoint = StoreEndpoint {
            base_url: self.server.uri(),
            api_key: Some("test-store-key".to_string()),
        };

        HttpAccessControlStore::new(endpoint, Duration::from_secs(5))
            .unwrap()
            .with_retry(RetryConfig {
                max_attempts: 3,
                initial_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(5),
                exponential_base: 2.0,
            })
    }
}

fn resource(node: &str) -> ResourceId {
    ResourceId::from_raw(format!("get:1:ar2024:{}", node))
}

#[tokio::test]
async fn test_list_access_records_for_resource() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/access-records"))
        .and(query_param("resource", "get:1:ar2024:notes"))
        .and(header("Authorization", "Bearer test-store-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"resource_id": "get:1:ar2024:notes", "user_ref": "u1", "role_ref": "editor"},
            {"resource_id": "get:1:ar2024:notes", "group_ref": "g1", "role_ref": "viewer", "enabled": false}
        ])))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let records = fixture
        .store()
        .list_access_records(Some(&resource("notes")))
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].subject().unwrap(), Subject::user("u1"));
    assert!(records[0].enabled);
    assert!(!records[1].enabled);
}

#[tokio::test]
async fn test_retrieve_resource_not_found_is_none() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/resources"))
        .and(query_param("strict", "false"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such resource"))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let record = fixture
        .store()
        .retrieve_resource(&resource("notes"), false)
        .await
        .unwrap();

    assert!(record.is_none());
}

#[tokio::test]
async fn test_effective_roles_posts_trail() {
    let fixture = TestFixture::new().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/effective-roles"))
        .and(body_json(serde_json::json!({
            "trail": ["get:1:ar2024:root", "get:1:ar2024:a"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "users": [{"id": "u1", "roles": ["editor"]}],
            "groups": []
        })))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let trail = BreadcrumbTrail::new(vec![resource("root"), resource("a")]);
    let roles = fixture.store().retrieve_effective_roles(&trail).await.unwrap();

    assert_eq!(roles.roles_of(SubjectKind::User, "u1"), Some(&["editor".to_string()][..]));
    assert!(roles.groups.is_empty());
}

#[tokio::test]
async fn test_reads_retry_server_errors() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/roles"))
        .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
        .up_to_n_times(2)
        .expect(2)
        .mount(&fixture.server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/roles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"id": "viewer", "name": "Viewer"}
        ])))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let roles = fixture.store().list_roles().await.unwrap();
    assert_eq!(roles.len(), 1);
    assert_eq!(roles[0].name, "Viewer");
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/groups"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let result = fixture.store().list_groups().await;
    assert!(matches!(result, Err(StoreError::ApiError { status: 400, .. })));
}

#[tokio::test]
async fn test_authentication_failure() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/users"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let result = fixture.store().list_users().await;
    assert!(matches!(result, Err(StoreError::AuthenticationFailed)));
}

#[tokio::test]
async fn test_writes_are_sent_once() {
    let fixture = TestFixture::new().await;

    Mock::given(method("PUT"))
        .and(path("/api/v1/access-records"))
        .respond_with(ResponseTemplate::new(502).set_body_string("gateway"))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let mutation = RecordMutation {
        resource_id: resource("a"),
        subject: Subject::group("g1"),
        role_id: "viewer".to_string(),
        enabled: false,
    };
    let result = fixture.store().edit_access_records(&[mutation]).await;

    assert!(matches!(result, Err(StoreError::ApiError { status: 502, .. })));
}

#[tokio::test]
async fn test_mutations_read_success_flag() {
    let fixture = TestFixture::new().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/access-records"))
        .and(body_json(serde_json::json!({
            "resource_id": "get:1:ar2024:a",
            "subject": {"type": "user", "id": "u1"},
            "role_id": "editor",
            "enabled": true,
            "reset_inheritance": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"success": true})))
        .expect(1)
        .mount(&fixture.server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/api/v1/access-records"))
        .and(query_param("resource", "get:1:ar2024:a"))
        .and(query_param("group", "g1"))
        .and(query_param("role", "viewer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"success": false})))
        .expect(1)
        .mount(&fixture.server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/api/v1/resources"))
        .and(body_json(serde_json::json!({
            "resource_id": "get:1:ar2024:a",
            "reset_inheritance": true,
            "is_persistent": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"success": true})))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let store = fixture.store();
    let grant = AccessGrant {
        resource_id: resource("a"),
        subject: Subject::user("u1"),
        role_id: "editor".to_string(),
        enabled: true,
        reset_inheritance: false,
    };

    assert!(store.add_access_record(&grant).await.unwrap());
    assert!(!store
        .delete_access_record(&resource("a"), &Subject::group("g1"), "viewer")
        .await
        .unwrap());
    assert!(store.edit_resource(&resource("a"), true, false).await.unwrap());
}

#[tokio::test]
async fn test_invalid_response_body() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/roles"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let result = fixture.store().list_roles().await;
    assert!(matches!(result, Err(StoreError::InvalidResponse(_))));
}
