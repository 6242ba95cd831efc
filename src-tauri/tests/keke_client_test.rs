// Tests for `KekeClient` against a mocked backend using wiremock.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use kekefinder_lib::api::{ApiError, AuthToken, KekeClient};
use kekefinder_lib::auth::{AuthService, MemoryTokenStore, TokenStore};
use kekefinder_lib::config::api_config::ApiConfig;

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, KekeClient) {
    let server = MockServer::start().await;
    let base = Url::parse(&server.uri()).unwrap();
    let client =
        KekeClient::with_client(reqwest::Client::new(), &base, "usercheck.php", "devices.php")
            .unwrap();
    (server, client)
}

fn token() -> AuthToken {
    AuthToken::new("tok-123").unwrap()
}

// ── Login ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_login_returns_token() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/usercheck.php"))
        .and(query_param("l", "me@example.com"))
        .and(query_param("p", "1234"))
        .respond_with(ResponseTemplate::new(200).set_body_string("\"tok-123\""))
        .expect(1)
        .mount(&server)
        .await;

    let issued = client.login(" me@example.com ", "1234").await.unwrap();
    assert_eq!(issued, token());
}

#[tokio::test]
async fn test_login_accepts_bare_text_token() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/usercheck.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string("tok-123\n"))
        .mount(&server)
        .await;

    assert_eq!(client.login("me@example.com", "1234").await.unwrap(), token());
}

#[tokio::test]
async fn test_login_rejected_credentials() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/usercheck.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string("false"))
        .mount(&server)
        .await;

    let err = client.login("me@example.com", "0000").await.unwrap_err();
    match err {
        ApiError::Authentication { message } => {
            assert_eq!(message, "Invalid Credentials Provided.");
        }
        other => panic!("expected Authentication, got {other:?}"),
    }
}

#[tokio::test]
async fn test_login_blank_fields_send_nothing() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = client.login("", "1234").await.unwrap_err();
    assert!(matches!(err, ApiError::MissingCredentials));
    let err = client.login("me@example.com", "  ").await.unwrap_err();
    assert!(matches!(err, ApiError::MissingCredentials));
}

#[tokio::test]
async fn test_login_server_unreachable() {
    let config = ApiConfig {
        base_url: "http://127.0.0.1:1/".into(),
        ..ApiConfig::default()
    };
    let client = KekeClient::new(&config).unwrap();

    let err = client.login("me@example.com", "1234").await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
}

#[tokio::test]
async fn test_login_unauthorized_reads_as_bad_credentials() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/usercheck.php"))
        .respond_with(ResponseTemplate::new(401).set_body_string("<html>Internal detail</html>"))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::default());
    let auth = AuthService::new(client, store.clone());
    let err = auth.login("me@example.com", "1234").await.unwrap_err();

    assert_eq!(err.user_message(), "Invalid Credentials Provided.");
    assert_eq!(store.get().await, None);
}

#[tokio::test]
async fn test_login_server_error_hides_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/usercheck.php"))
        .respond_with(ResponseTemplate::new(500).set_body_string("<html>Internal detail</html>"))
        .mount(&server)
        .await;

    let auth = AuthService::new(client, Arc::new(MemoryTokenStore::default()));
    let err = auth.login("me@example.com", "1234").await.unwrap_err();

    assert_eq!(err.user_message(), "Server not accessible");
}

#[tokio::test]
async fn test_login_unreachable_server_message() {
    let config = ApiConfig {
        base_url: "http://127.0.0.1:1/".into(),
        ..ApiConfig::default()
    };
    let auth = AuthService::new(
        KekeClient::new(&config).unwrap(),
        Arc::new(MemoryTokenStore::default()),
    );

    let err = auth.login("me@example.com", "1234").await.unwrap_err();
    assert_eq!(err.user_message(), "Server not accessible");
}

#[tokio::test]
async fn test_successful_login_keeps_token() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/usercheck.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string("\"tok-123\""))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::default());
    let auth = AuthService::new(client, store.clone());
    auth.login("me@example.com", "1234").await.unwrap();

    assert_eq!(store.get().await, Some(token()));
    assert!(auth.is_authenticated().await);
}

// ── Device registry ─────────────────────────────────────────────────

#[tokio::test]
async fn test_fetch_devices() {
    let (server, client) = setup().await;

    let body = json!([
        {
            "name": "C4:7C:8D:6A:12:3F",
            "alias": "Schlüssel",
            "lastupdate": "1700000000",
            "batt": "420",
            "maplink": "https://www.kekefinder.de/map.php?id=7",
            "setlink": ""
        },
        { "name": "Keke-2", "alias": "Rucksack", "lastupdate": 0, "batt": null }
    ]);

    Mock::given(method("GET"))
        .and(path("/devices.php"))
        .and(query_param("k", "tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let entries = client.fetch_devices(&token()).await.unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].name, "C4:7C:8D:6A:12:3F");
    assert_eq!(entries[0].alias, "Schlüssel");
    assert_eq!(entries[0].battery, Some(420));
    assert!(entries[0].map_link.is_some());
    assert_eq!(entries[0].settings_link, None);
    assert_eq!(entries[1].alias, "Rucksack");
    assert_eq!(entries[1].last_update(), None);
}

#[tokio::test]
async fn test_fetch_devices_empty_list() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/devices.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .mount(&server)
        .await;

    assert!(client.fetch_devices(&token()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_fetch_devices_rejected_token() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/devices.php"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client.fetch_devices(&token()).await.unwrap_err();
    assert!(err.is_auth_rejected());
}

#[tokio::test]
async fn test_fetch_devices_false_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/devices.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string("false"))
        .mount(&server)
        .await;

    let err = client.fetch_devices(&token()).await.unwrap_err();
    assert!(err.is_auth_rejected());
}

#[tokio::test]
async fn test_fetch_devices_server_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/devices.php"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let err = client.fetch_devices(&token()).await.unwrap_err();
    match &err {
        ApiError::Status { status, message } => {
            assert_eq!(*status, 503);
            assert_eq!(message, "maintenance");
        }
        other => panic!("expected Status, got {other:?}"),
    }
    assert!(!err.is_auth_rejected());
}

#[tokio::test]
async fn test_fetch_devices_garbage_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/devices.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client.fetch_devices(&token()).await.unwrap_err();
    match err {
        ApiError::Deserialization { body, .. } => assert_eq!(body, "<html>oops</html>"),
        other => panic!("expected Deserialization, got {other:?}"),
    }
}
