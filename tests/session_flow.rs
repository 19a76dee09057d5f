//! End-to-end session flow: sign in, browse, lose the session, restart.

use std::sync::Arc;
use std::time::Duration;

use hub_shell::config::ClientConfig;
use hub_shell::net::{ApiRequest, Gateway, api};
use hub_shell::router::{Navigator, Outcome, RouteTable, Router, View};
use hub_shell::state::session::{SessionStore, TOKEN_KEY};
use hub_shell::state::storage::{FileStorage, Storage};
use mockito::{Matcher, Server};

struct Console {
    session: SessionStore,
    router: Arc<Router>,
    gateway: Gateway,
}

fn boot(base_url: &str, storage: Arc<dyn Storage>, location: &str) -> Console {
    let session = SessionStore::load(storage);
    let router = Arc::new(Router::new(RouteTable::console(), session.clone()));
    router.navigate(location).unwrap();
    let config = ClientConfig { api_base_url: base_url.to_owned(), timeout: Duration::from_secs(5), ..ClientConfig::default() };
    let gateway = Gateway::new(&config, session.clone(), router.clone()).unwrap();
    Console { session, router, gateway }
}

#[tokio::test]
async fn sign_in_survives_restart_until_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("session.json");
    let mut server = Server::new_async().await;

    server
        .mock("POST", "/api/v1/auth/login")
        .with_status(200)
        .with_body(r#"{"code":0,"message":"ok","data":{"access_token":"abc123","refresh_token":"r","user":{"id":"1","username":"admin"}}}"#)
        .create_async()
        .await;
    let users = server
        .mock("GET", "/api/v1/users")
        .match_header("authorization", "Bearer abc123")
        .with_status(200)
        .with_body(r#"{"code":0,"message":"ok","data":[]}"#)
        .expect(1)
        .create_async()
        .await;

    // First run: anonymous visitor is held on the login page, then signs in.
    let first = boot(&server.url(), Arc::new(FileStorage::new(&file)), "/users");
    assert_eq!(first.router.current_path(), "/login");

    api::login(&first.gateway, "admin", "hunter2").await.unwrap();
    assert_eq!(
        first.router.navigate("/users").unwrap(),
        Outcome::Arrived { path: "/users".into(), view: Some(View::Users), redirected: false }
    );
    first.gateway.send(ApiRequest::get("/api/v1/users")).await.unwrap();
    users.assert_async().await;

    // Second run: the credential comes back from disk.
    let second = boot(&server.url(), Arc::new(FileStorage::new(&file)), "/tasks");
    assert!(second.session.is_authenticated());
    assert_eq!(second.router.current_path(), "/tasks");

    // The server has since expired it.
    server
        .mock("GET", "/api/v1/tasks")
        .with_status(401)
        .with_body(r#"{"code":1001,"message":"unauthorized","data":null}"#)
        .create_async()
        .await;
    let err = second.gateway.send(ApiRequest::get("/api/v1/tasks")).await.unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(second.router.current_path(), "/login");
    assert_eq!(second.router.current_view(), Some(View::Login));
    assert!(!file.exists(), "credential file should be gone");

    // Third run: nothing left to restore.
    let third = boot(&server.url(), Arc::new(FileStorage::new(&file)), "/");
    assert!(!third.session.is_authenticated());
    assert_eq!(third.router.current_path(), "/login");
}

#[tokio::test]
async fn anonymous_requests_carry_no_credential() {
    let mut server = Server::new_async().await;
    let health = server
        .mock("GET", "/health")
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .with_body(r#"{"code":0,"message":"ok","data":null}"#)
        .create_async()
        .await;

    let storage = Arc::new(hub_shell::state::storage::MemoryStorage::new());
    let console = boot(&server.url(), storage.clone(), "/login");
    api::health(&console.gateway).await.unwrap();
    health.assert_async().await;
    assert_eq!(storage.get_item(TOKEN_KEY).unwrap(), None);
}

#[tokio::test]
async fn logout_returns_to_login_on_next_navigation() {
    let mut server = Server::new_async().await;
    server.mock("POST", "/api/v1/auth/logout").with_status(200).with_body("{}").create_async().await;

    let storage = Arc::new(hub_shell::state::storage::MemoryStorage::new());
    storage.set_item(TOKEN_KEY, "abc123").unwrap();
    let console = boot(&server.url(), storage.clone(), "/reports");
    assert_eq!(console.router.current_path(), "/reports");

    api::logout(&console.gateway).await;
    console.router.navigate("/reports").unwrap();
    assert_eq!(console.router.current_path(), "/login");
    assert_eq!(storage.get_item(TOKEN_KEY).unwrap(), None);
}

#[test]
fn corrupt_session_file_recovers_on_next_sign_in() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("session.json");
    std::fs::write(&file, "{truncated").unwrap();

    let session = SessionStore::load(Arc::new(FileStorage::new(&file)));
    assert!(!session.is_authenticated());
    session.set("abc123");

    let restarted = SessionStore::load(Arc::new(FileStorage::new(&file)));
    assert_eq!(restarted.get(), "abc123");

    restarted.clear();
    assert!(!file.exists());
}
