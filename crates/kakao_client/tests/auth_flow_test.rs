//! Integration tests for the authorization-code exchange and token refresh
//! against a fake token endpoint.

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use kakao_client::http::build_plain_client;
use kakao_client::{
    AuthError, FileTokenStore, RefreshError, TokenIssuer, TokenRecord, TokenRefresher, TokenStore,
};
use notify_core::Config;

fn test_config(mock_uri: &str) -> Config {
    let mut config = Config::default();
    config.auth_base_url = mock_uri.to_string();
    config.api_base_url = mock_uri.to_string();
    config
}

fn file_store(dir: &tempfile::TempDir) -> Arc<FileTokenStore> {
    Arc::new(FileTokenStore::new(dir.path().join("kakao_token.json")))
}

#[tokio::test]
async fn issue_persists_provider_response() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=auth-code-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "a1",
            "refresh_token": "r1",
            "token_type": "bearer",
            "expires_in": 21599,
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let store = file_store(&dir);
    let config = test_config(&mock_server.uri());
    let issuer = TokenIssuer::new(
        build_plain_client().expect("client"),
        store.clone(),
        "test-key".to_string(),
        &config,
    );

    let record = issuer
        .issue("https://localhost:3000/oauth?code=auth-code-1")
        .await
        .expect("issue");
    assert_eq!(record.access_token(), Some("a1"));

    let stored = store.load().expect("stored record");
    assert_eq!(stored.access_token(), Some("a1"));
    assert_eq!(stored.refresh_token(), Some("r1"));
    assert_eq!(stored.expires_in(), Some(21599));
}

#[tokio::test]
async fn issue_rejection_persists_nothing() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "authorization code not found",
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let store = file_store(&dir);
    let config = test_config(&mock_server.uri());
    let issuer = TokenIssuer::new(
        build_plain_client().expect("client"),
        store.clone(),
        "test-key".to_string(),
        &config,
    );

    let err = issuer
        .issue("https://localhost:3000/oauth?code=stale")
        .await
        .expect_err("rejected exchange");
    match err {
        AuthError::ExchangeRejected { raw } => assert!(raw.contains("invalid_grant")),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(store.load().is_err(), "nothing should be persisted");
}

#[tokio::test]
async fn malformed_redirect_makes_no_network_call() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "a"})))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let config = test_config(&mock_server.uri());
    let issuer = TokenIssuer::new(
        build_plain_client().expect("client"),
        file_store(&dir),
        "test-key".to_string(),
        &config,
    );

    let err = issuer
        .issue("https://localhost:3000/oauth?error=access_denied")
        .await
        .expect_err("malformed redirect");
    assert!(matches!(err, AuthError::MalformedRedirect));
}

#[tokio::test]
async fn refresh_merges_response_into_stored_record() {
    let mock_server = MockServer::start().await;
    // Renewal omits refresh_token; the stored one must survive.
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=r1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "a2",
            "expires_in": 21599,
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let store = file_store(&dir);
    store
        .save(
            &TokenRecord::from_value(json!({
                "access_token": "a1",
                "refresh_token": "r1",
                "token_type": "bearer",
            }))
            .expect("record"),
        )
        .expect("seed store");

    let config = test_config(&mock_server.uri());
    let refresher = TokenRefresher::new(
        build_plain_client().expect("client"),
        store.clone(),
        "test-key".to_string(),
        &config,
    );

    let new_token = refresher.refresh().await.expect("refresh");
    assert_eq!(new_token, "a2");

    let stored = store.load().expect("stored record");
    assert_eq!(stored.access_token(), Some("a2"));
    assert_eq!(stored.refresh_token(), Some("r1"));
    assert_eq!(
        stored.get("token_type").and_then(|v| v.as_str()),
        Some("bearer")
    );
}

#[tokio::test]
async fn refresh_with_rotated_refresh_token_overwrites_old_one() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "a2",
            "refresh_token": "r2",
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let store = file_store(&dir);
    store
        .save(
            &TokenRecord::from_value(json!({
                "access_token": "a1",
                "refresh_token": "r1",
            }))
            .expect("record"),
        )
        .expect("seed store");

    let config = test_config(&mock_server.uri());
    let refresher = TokenRefresher::new(
        build_plain_client().expect("client"),
        store.clone(),
        "test-key".to_string(),
        &config,
    );

    refresher.refresh().await.expect("refresh");
    assert_eq!(store.load().expect("record").refresh_token(), Some("r2"));
}

#[tokio::test]
async fn refresh_without_stored_record_fails_fast() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "a"})))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let config = test_config(&mock_server.uri());
    let refresher = TokenRefresher::new(
        build_plain_client().expect("client"),
        file_store(&dir),
        "test-key".to_string(),
        &config,
    );

    let err = refresher.refresh().await.expect_err("no stored record");
    assert!(matches!(err, RefreshError::NoStoredCredentials));
}

#[tokio::test]
async fn refresh_without_refresh_token_makes_no_network_call() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "a"})))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let store = file_store(&dir);
    store
        .save(&TokenRecord::from_value(json!({"access_token": "a1"})).expect("record"))
        .expect("seed store");

    let config = test_config(&mock_server.uri());
    let refresher = TokenRefresher::new(
        build_plain_client().expect("client"),
        store,
        "test-key".to_string(),
        &config,
    );

    let err = refresher.refresh().await.expect_err("no refresh token");
    assert!(matches!(err, RefreshError::NoRefreshToken));
}

#[tokio::test]
async fn refresh_rejected_by_provider_keeps_stored_record() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": "invalid_grant",
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let store = file_store(&dir);
    store
        .save(
            &TokenRecord::from_value(json!({
                "access_token": "a1",
                "refresh_token": "r1",
            }))
            .expect("record"),
        )
        .expect("seed store");

    let config = test_config(&mock_server.uri());
    let refresher = TokenRefresher::new(
        build_plain_client().expect("client"),
        store.clone(),
        "test-key".to_string(),
        &config,
    );

    let err = refresher.refresh().await.expect_err("provider rejected");
    assert!(matches!(err, RefreshError::ProviderRejected { .. }));
    // The stored record is untouched by a rejected refresh.
    assert_eq!(store.load().expect("record").access_token(), Some("a1"));
}
