#![allow(dead_code)]

use std::sync::Arc;

use serde_json::json;
use stockroom_core::{ApiClient, Config, CookieJar, SessionGuard};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const CSRF_TOKEN_PATH: &str = "/api/inventory/csrf-token/";
pub const CURRENT_USER_PATH: &str = "/api/inventory/auth/current-user/";
pub const LOGIN_PATH: &str = "/api/inventory/auth/login/";
pub const LOGOUT_PATH: &str = "/api/inventory/auth/logout/";

pub fn config_for(uri: &str) -> Config {
    Config {
        base_url: uri.to_string(),
        ..Config::default()
    }
}

pub fn client_for(server: &MockServer, jar: &Arc<CookieJar>) -> ApiClient {
    ApiClient::new(&config_for(&server.uri()), jar.clone()).expect("client")
}

pub fn guard_for(server: &MockServer, jar: &Arc<CookieJar>) -> SessionGuard {
    SessionGuard::new(client_for(server, jar))
}

/// Token endpoint answering with `token`, expected `calls` times
pub async fn mount_csrf_token(server: &MockServer, token: &str, calls: u64) {
    Mock::given(method("GET"))
        .and(path(CSRF_TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "csrfToken": token })))
        .expect(calls)
        .mount(server)
        .await;
}

/// Token endpoint that must never be called
pub async fn forbid_csrf_token(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(CSRF_TOKEN_PATH))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(server)
        .await;
}

pub async fn mount_current_user(server: &MockServer, body: serde_json::Value, calls: u64) {
    Mock::given(method("GET"))
        .and(path(CURRENT_USER_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(calls)
        .mount(server)
        .await;
}

/// Base URL of a server that has already shut down
pub async fn unreachable_uri() -> String {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);
    uri
}
