//! Integration tests for session resolution and the auth actions using wiremock.

use std::time::Duration;

use serde_json::{json, Value};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use readlens_core::{
    ApiClient, ApiError, CredentialStore, MemoryStore, RegisterRequest, RequestDescriptor,
    SessionManager, SessionStatus, TokenPair,
};

const ME: &str = "/api/v1/auth/me";
const REFRESH: &str = "/api/v1/auth/refresh";
const LOGIN: &str = "/api/v1/auth/login";
const REGISTER: &str = "/api/v1/auth/register";
const LOGOUT: &str = "/api/v1/auth/logout";

/// Helper function to create a session manager whose store holds the given pair.
fn create_test_manager(mock_uri: &str, pair: Option<TokenPair>) -> SessionManager {
    let store = match pair {
        Some(ref pair) => MemoryStore::with_pair(pair),
        None => MemoryStore::new(),
    };
    let api = ApiClient::new(mock_uri, CredentialStore::new(store)).unwrap();
    SessionManager::new(api)
}

fn token_response(access: &str, refresh: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "access_token": access,
        "refresh_token": refresh,
        "token_type": "bearer"
    }))
}

fn profile() -> Value {
    json!({
        "id": 1,
        "username": "alice",
        "email": "alice@example.com",
        "role": "user",
        "created_at": "2024-03-01T12:00:00"
    })
}

fn stored_pair(manager: &SessionManager) -> (Option<String>, Option<String>) {
    let credentials = manager.api().credentials();
    (
        credentials.access_token().unwrap(),
        credentials.refresh_token().unwrap(),
    )
}

async fn mount_profile(server: &MockServer, access_token: &str) {
    Mock::given(method("GET"))
        .and(path(ME))
        .and(header("authorization", format!("Bearer {}", access_token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile()))
        .mount(server)
        .await;
}

// ============================================================================
// Session resolution
// ============================================================================

#[tokio::test]
async fn test_no_tokens_resolves_unauthenticated_offline() {
    let server = MockServer::start().await;
    let manager = create_test_manager(&server.uri(), None);

    manager.init().await;
    let session = manager.get_session().await;

    assert_eq!(session.status, SessionStatus::Unauthenticated);
    assert!(session.user.is_none());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_valid_token_resolves_authenticated() {
    let server = MockServer::start().await;
    mount_profile(&server, "a1").await;

    let manager = create_test_manager(&server.uri(), Some(TokenPair::new("a1", "r1")));
    manager.init().await;
    let session = manager.get_session().await;

    assert_eq!(session.status, SessionStatus::Authenticated);
    let user = session.user.unwrap();
    assert_eq!(user.username(), Some("alice"));
    assert_eq!(user.raw(), &profile());
}

#[tokio::test]
async fn test_expired_token_with_valid_refresh_resolves_authenticated() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ME))
        .and(header("authorization", "Bearer a-old"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH))
        .and(body_json(json!({"refresh_token": "r-old"})))
        .respond_with(token_response("a-new", "r-new"))
        .expect(1)
        .mount(&server)
        .await;
    mount_profile(&server, "a-new").await;

    let manager = create_test_manager(&server.uri(), Some(TokenPair::new("a-old", "r-old")));
    let session = manager.init().await;

    assert_eq!(session.status, SessionStatus::Authenticated);
    assert_eq!(session.user.unwrap().username(), Some("alice"));
    assert_eq!(
        stored_pair(&manager),
        (Some("a-new".to_string()), Some("r-new".to_string()))
    );
}

#[tokio::test]
async fn test_expired_token_with_invalid_refresh_resolves_unauthenticated() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ME))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": "Invalid refresh token"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let manager = create_test_manager(&server.uri(), Some(TokenPair::new("a-old", "r-old")));
    let mut expired = manager.api().subscribe_session_expired();

    let session = manager.init().await;

    assert_eq!(session.status, SessionStatus::Unauthenticated);
    assert!(session.user.is_none());
    assert_eq!(stored_pair(&manager), (None, None));
    assert_eq!(expired.try_recv().unwrap().path, ME);
}

#[tokio::test]
async fn test_identity_failure_clears_tokens() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ME))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let manager = create_test_manager(&server.uri(), Some(TokenPair::new("a1", "r1")));
    let session = manager.init().await;

    assert_eq!(session.status, SessionStatus::Unauthenticated);
    assert_eq!(stored_pair(&manager), (None, None));
}

#[tokio::test]
async fn test_init_resolves_only_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ME))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile()))
        .expect(1)
        .mount(&server)
        .await;

    let manager = create_test_manager(&server.uri(), Some(TokenPair::new("a1", "r1")));
    let (first, second) = futures::join!(manager.init(), manager.init());

    assert_eq!(first, second);
    assert_eq!(first.status, SessionStatus::Authenticated);
}

#[tokio::test]
async fn test_expired_request_ends_authenticated_session() {
    let server = MockServer::start().await;
    mount_profile(&server, "a1").await;
    Mock::given(method("GET"))
        .and(path("/api/v1/articles/"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let manager = create_test_manager(&server.uri(), Some(TokenPair::new("a1", "r1")));
    assert!(manager.init().await.is_authenticated());

    let mut changes = manager.subscribe();
    let result = manager
        .request_json::<Value>(RequestDescriptor::get("/api/v1/articles/"))
        .await;

    assert!(matches!(result, Err(ApiError::SessionExpired)));
    assert!(changes.has_changed().unwrap());
    let session = changes.borrow_and_update().clone();
    assert_eq!(session.status, SessionStatus::Unauthenticated);
    assert!(session.user.is_none());
}

#[tokio::test]
async fn test_login_during_init_keeps_new_tokens() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ME))
        .and(header("authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(500).set_delay(Duration::from_millis(300)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(LOGIN))
        .respond_with(token_response("a1", "r1"))
        .expect(1)
        .mount(&server)
        .await;
    mount_profile(&server, "a1").await;

    let manager = create_test_manager(&server.uri(), Some(TokenPair::new("stale", "rs")));

    // init takes the lock on its first poll, so the login queues behind it
    let (_, login) = futures::join!(manager.init(), manager.login("alice", "secret"));
    let user = login.unwrap();

    assert_eq!(user.username(), Some("alice"));
    assert_eq!(
        stored_pair(&manager),
        (Some("a1".to_string()), Some("r1".to_string()))
    );
    let session = manager.session();
    assert_eq!(session.status, SessionStatus::Authenticated);
    assert_eq!(session.user, Some(user));
}

// ============================================================================
// Login and register
// ============================================================================

#[tokio::test]
async fn test_login_stores_issued_pair() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(LOGIN))
        .and(body_json(json!({"username": "alice", "password": "secret"})))
        .respond_with(token_response("a1", "r1"))
        .expect(1)
        .mount(&server)
        .await;
    mount_profile(&server, "a1").await;

    let manager = create_test_manager(&server.uri(), None);
    assert_eq!(manager.init().await.status, SessionStatus::Unauthenticated);

    let user = manager.login("alice", "secret").await.unwrap();
    assert_eq!(user.username(), Some("alice"));

    assert_eq!(
        stored_pair(&manager),
        (Some("a1".to_string()), Some("r1".to_string()))
    );
    let session = manager.get_session().await;
    assert_eq!(session.status, SessionStatus::Authenticated);
    assert_eq!(session.user, Some(user));
}

#[tokio::test]
async fn test_login_rejected_stores_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(LOGIN))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"detail": "Invalid username or password"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(ME))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile()))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(token_response("a1", "r1"))
        .expect(0)
        .mount(&server)
        .await;

    let manager = create_test_manager(&server.uri(), None);
    manager.init().await;

    let result = manager.login("alice", "wrong").await;
    assert!(
        matches!(result, Err(ApiError::AuthRejected(ref d)) if d == "Invalid username or password")
    );
    assert_eq!(stored_pair(&manager), (None, None));
    assert_eq!(manager.status(), SessionStatus::Unauthenticated);
}

#[tokio::test]
async fn test_login_identity_failure_leaves_signed_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(LOGIN))
        .respond_with(token_response("a1", "r1"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(ME))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "db down"})))
        .mount(&server)
        .await;

    let manager = create_test_manager(&server.uri(), None);
    let result = manager.login("alice", "secret").await;

    assert!(matches!(result, Err(ApiError::ServerError(ref d)) if d == "db down"));
    assert_eq!(stored_pair(&manager), (None, None));
    assert_eq!(manager.status(), SessionStatus::Unauthenticated);
}

#[tokio::test]
async fn test_register_signs_in() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(REGISTER))
        .and(body_json(json!({
            "username": "alice",
            "email": "alice@example.com",
            "password": "Secret123"
        })))
        .respond_with(token_response("a1", "r1"))
        .expect(1)
        .mount(&server)
        .await;
    mount_profile(&server, "a1").await;

    let manager = create_test_manager(&server.uri(), None);
    let request = RegisterRequest {
        username: "alice".to_string(),
        email: "alice@example.com".to_string(),
        password: "Secret123".to_string(),
    };
    let user = manager.register(&request).await.unwrap();

    assert_eq!(user.email(), Some("alice@example.com"));
    assert_eq!(manager.status(), SessionStatus::Authenticated);
}

#[tokio::test]
async fn test_register_duplicate_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(REGISTER))
        .respond_with(
            ResponseTemplate::new(409).set_body_json(json!({"detail": "Username already exists"})),
        )
        .mount(&server)
        .await;

    let manager = create_test_manager(&server.uri(), None);
    let request = RegisterRequest {
        username: "alice".to_string(),
        email: "alice@example.com".to_string(),
        password: "Secret123".to_string(),
    };
    let result = manager.register(&request).await;

    assert!(matches!(result, Err(ApiError::AuthRejected(ref d)) if d == "Username already exists"));
    assert_eq!(stored_pair(&manager), (None, None));
}

// ============================================================================
// Logout
// ============================================================================

#[tokio::test]
async fn test_logout_notifies_server_and_clears() {
    let server = MockServer::start().await;
    mount_profile(&server, "a1").await;
    Mock::given(method("POST"))
        .and(path(LOGOUT))
        .and(header("authorization", "Bearer a1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "Logged out"})))
        .expect(1)
        .mount(&server)
        .await;

    let manager = create_test_manager(&server.uri(), Some(TokenPair::new("a1", "r1")));
    assert!(manager.init().await.is_authenticated());

    manager.logout().await.unwrap();

    assert_eq!(stored_pair(&manager), (None, None));
    let session = manager.session();
    assert_eq!(session.status, SessionStatus::Unauthenticated);
    assert!(session.user.is_none());
}

#[tokio::test]
async fn test_logout_server_error_still_clears() {
    let server = MockServer::start().await;
    mount_profile(&server, "a1").await;
    Mock::given(method("POST"))
        .and(path(LOGOUT))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let manager = create_test_manager(&server.uri(), Some(TokenPair::new("a1", "r1")));
    manager.init().await;

    manager.logout().await.unwrap();

    assert_eq!(stored_pair(&manager), (None, None));
    assert_eq!(manager.status(), SessionStatus::Unauthenticated);
}

#[tokio::test]
async fn test_logout_rejected_token_does_not_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(LOGOUT))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(token_response("a-new", "r-new"))
        .expect(0)
        .mount(&server)
        .await;

    let manager = create_test_manager(&server.uri(), Some(TokenPair::new("a1", "r1")));
    manager.logout().await.unwrap();

    assert_eq!(stored_pair(&manager), (None, None));
    assert_eq!(manager.status(), SessionStatus::Unauthenticated);
}

#[tokio::test]
async fn test_logout_network_failure_still_clears() {
    // Discard port, nothing listens there
    let manager = create_test_manager("http://127.0.0.1:9", Some(TokenPair::new("a1", "r1")));
    manager.logout().await.unwrap();

    assert_eq!(stored_pair(&manager), (None, None));
    assert_eq!(manager.status(), SessionStatus::Unauthenticated);
}

#[tokio::test]
async fn test_logout_without_tokens_skips_server() {
    let server = MockServer::start().await;

    let manager = create_test_manager(&server.uri(), None);
    manager.init().await;
    manager.logout().await.unwrap();

    assert!(server.received_requests().await.unwrap().is_empty());
    assert_eq!(manager.status(), SessionStatus::Unauthenticated);
}

#[tokio::test]
async fn test_login_after_logout() {
    let server = MockServer::start().await;
    mount_profile(&server, "a1").await;
    mount_profile(&server, "a2").await;
    Mock::given(method("POST"))
        .and(path(LOGOUT))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(LOGIN))
        .respond_with(token_response("a2", "r2"))
        .mount(&server)
        .await;

    let manager = create_test_manager(&server.uri(), Some(TokenPair::new("a1", "r1")));
    let mut changes = manager.subscribe();
    manager.init().await;
    manager.logout().await.unwrap();
    manager.login("alice", "secret").await.unwrap();

    assert_eq!(
        stored_pair(&manager),
        (Some("a2".to_string()), Some("r2".to_string()))
    );
    assert_eq!(changes.borrow_and_update().status, SessionStatus::Authenticated);
}
