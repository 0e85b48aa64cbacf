mod common;

use std::sync::Arc;

use cookie::{Cookie, SameSite};
use serde_json::json;
use stockroom_core::cookies::CSRF_COOKIE;
use stockroom_core::{ApiClient, CookieJar, CookieStore};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::*;

#[tokio::test]
async fn test_storage_lookup_ignores_other_cookies() {
    let server = MockServer::start().await;
    forbid_csrf_token(&server).await;

    let jar = Arc::new(CookieJar::new());
    jar.set(Cookie::new("sessionid", "s1"));
    jar.set(Cookie::new(CSRF_COOKIE, "from-cookie"));
    jar.set(Cookie::new("theme", "dark"));

    let client = client_for(&server, &jar);
    assert_eq!(client.csrf().from_storage(), Some("from-cookie".to_string()));
    assert_eq!(client.csrf().resolve().await, Some("from-cookie".to_string()));
}

#[tokio::test]
async fn test_storage_lookup_without_cookie() {
    let server = MockServer::start().await;
    let jar = Arc::new(CookieJar::new());
    jar.set(Cookie::new("sessionid", "s1"));

    let client = client_for(&server, &jar);
    assert_eq!(client.csrf().from_storage(), None);
}

#[tokio::test]
async fn test_network_fallback_stores_cookie() {
    let server = MockServer::start().await;
    mount_csrf_token(&server, "X", 1).await;

    let jar = Arc::new(CookieJar::new());
    let client = client_for(&server, &jar);

    assert_eq!(client.csrf().resolve().await, Some("X".to_string()));
    assert_eq!(jar.get(CSRF_COOKIE), Some("X".to_string()));

    let cookie = jar.cookie(CSRF_COOKIE).expect("cookie written");
    assert_eq!(cookie.path(), Some("/"));
    assert_eq!(cookie.same_site(), Some(SameSite::Strict));

    // The stored cookie now short-circuits the network
    assert_eq!(client.csrf().resolve().await, Some("X".to_string()));
}

#[tokio::test]
async fn test_network_failure_status_returns_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CSRF_TOKEN_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .expect(1)
        .mount(&server)
        .await;

    let jar = Arc::new(CookieJar::new());
    let client = client_for(&server, &jar);

    assert_eq!(client.csrf().from_network().await, None);
    assert_eq!(jar.get(CSRF_COOKIE), None);
    assert!(jar.is_empty());
}

#[tokio::test]
async fn test_malformed_token_body_returns_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CSRF_TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "wrong-field" })))
        .mount(&server)
        .await;

    let jar = Arc::new(CookieJar::new());
    let client = client_for(&server, &jar);

    assert_eq!(client.csrf().resolve().await, None);
    assert!(jar.is_empty());
}

#[tokio::test]
async fn test_unreachable_backend_returns_none() {
    let uri = unreachable_uri().await;
    let jar = Arc::new(CookieJar::new());
    let client = ApiClient::new(&config_for(&uri), jar.clone()).expect("client");

    assert_eq!(client.csrf().resolve().await, None);
    assert!(jar.is_empty());
}
