use super::*;

use std::sync::Arc;
use std::time::Duration;

use mockito::{Matcher, Server};

use crate::config::ClientConfig;
use crate::router::history::{Navigator, Router};
use crate::router::routes::RouteTable;
use crate::state::session::SessionStore;

fn console(base_url: &str) -> (Gateway, Arc<Router>) {
    let session = SessionStore::in_memory();
    let router = Arc::new(Router::new(RouteTable::console(), session.clone()));
    router.navigate("/login").unwrap();
    let config = ClientConfig { api_base_url: base_url.to_owned(), timeout: Duration::from_secs(5), ..ClientConfig::default() };
    let gateway = Gateway::new(&config, session, router.clone()).unwrap();
    (gateway, router)
}

const LOGIN_OK: &str = r#"{
    "code": 0,
    "message": "ok",
    "data": {
        "access_token": "jwt-access",
        "refresh_token": "jwt-refresh",
        "user": { "id": "u-1", "username": "admin", "created_at": "2026-01-02T03:04:05Z" }
    }
}"#;

// =============================================================
// login
// =============================================================

#[tokio::test]
async fn login_stores_access_token() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", LOGIN_ENDPOINT)
        .match_header("authorization", Matcher::Missing)
        .match_body(Matcher::Json(serde_json::json!({ "username": "admin", "password": "hunter2" })))
        .with_status(200)
        .with_body(LOGIN_OK)
        .create_async()
        .await;

    let (gateway, router) = console(&server.url());
    let user = login(&gateway, "admin", "hunter2").await.unwrap().unwrap();

    assert_eq!(user.username, "admin");
    assert_eq!(gateway.session().get(), "jwt-access");
    mock.assert_async().await;

    // Signed in: the login page now bounces to the dashboard.
    router.navigate("/login").unwrap();
    assert_eq!(router.current_path(), "/dashboard");
}

#[tokio::test]
async fn login_bad_credentials_leaves_session_empty_and_stays_put() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", LOGIN_ENDPOINT)
        .with_status(401)
        .with_body(r#"{"code":1001,"message":"invalid credentials","data":null}"#)
        .create_async()
        .await;

    let (gateway, router) = console(&server.url());
    let err = login(&gateway, "admin", "wrong").await.unwrap_err();

    assert!(err.is_unauthorized());
    assert!(!gateway.session().is_authenticated());
    assert_eq!(router.entries(), vec!["/login".to_owned()]);
}

#[tokio::test]
async fn login_non_zero_code_is_api_error() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", LOGIN_ENDPOINT)
        .with_status(200)
        .with_body(r#"{"code":1000,"message":"invalid params","data":null}"#)
        .create_async()
        .await;

    let (gateway, _) = console(&server.url());
    let err = login(&gateway, "", "").await.unwrap_err();
    assert!(matches!(err, RequestError::Api { code: 1000, ref message } if message == "invalid params"));
    assert!(!gateway.session().is_authenticated());
}

#[tokio::test]
async fn login_without_token_is_decode_error() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", LOGIN_ENDPOINT)
        .with_status(200)
        .with_body(r#"{"code":0,"message":"ok","data":{"access_token":""}}"#)
        .create_async()
        .await;

    let (gateway, _) = console(&server.url());
    let err = login(&gateway, "admin", "hunter2").await.unwrap_err();
    assert!(matches!(err, RequestError::Decode(_)));
    assert!(!gateway.session().is_authenticated());
}

// =============================================================
// logout
// =============================================================

#[tokio::test]
async fn logout_calls_server_and_clears() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", LOGOUT_ENDPOINT)
        .match_header("authorization", "Bearer abc123")
        .with_status(200)
        .with_body(r#"{"code":0,"message":"ok","data":null}"#)
        .create_async()
        .await;

    let (gateway, _) = console(&server.url());
    gateway.session().set("abc123");
    logout(&gateway).await;

    mock.assert_async().await;
    assert_eq!(gateway.session().get(), "");
}

#[tokio::test]
async fn logout_clears_even_when_server_fails() {
    let mut server = Server::new_async().await;
    server.mock("POST", LOGOUT_ENDPOINT).with_status(500).create_async().await;

    let (gateway, _) = console(&server.url());
    gateway.session().set("abc123");
    logout(&gateway).await;
    assert_eq!(gateway.session().get(), "");
}

#[tokio::test]
async fn logout_when_signed_out_skips_server() {
    let mut server = Server::new_async().await;
    let mock = server.mock("POST", LOGOUT_ENDPOINT).expect(0).create_async().await;

    let (gateway, _) = console(&server.url());
    logout(&gateway).await;
    logout(&gateway).await;
    mock.assert_async().await;
    assert_eq!(gateway.session().get(), "");
}

// =============================================================
// ping / health
// =============================================================

#[tokio::test]
async fn ping_returns_payload() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", PING_ENDPOINT)
        .with_status(200)
        .with_body(r#"{"code":0,"message":"ok","data":{"ping":"pong"}}"#)
        .create_async()
        .await;

    let (gateway, _) = console(&server.url());
    let data = ping(&gateway).await.unwrap();
    assert_eq!(data["ping"], "pong");
}

#[tokio::test]
async fn health_ok_with_null_data() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", HEALTH_ENDPOINT)
        .with_status(200)
        .with_body(r#"{"code":0,"message":"ok","data":null}"#)
        .create_async()
        .await;

    let (gateway, _) = console(&server.url());
    health(&gateway).await.unwrap();
}
