mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::http::Method;
use chrono::Utc;
use serde_json::json;

use common::{MockBackend, Reply, page, state_for};
use secov_admin::AppState;
use secov_admin::config::Config;
use secov_admin::error::AppError;
use secov_admin::session::{MemoryStorage, SessionState, SessionStorage};

fn login_reply(password: &str) -> Reply {
    if password == "correcto" {
        Reply::ok(json!({
            "user": {
                "id": 4,
                "name": "Jorge",
                "first_name": "Salas",
                "permissions": ["driver.index"]
            },
            "token": "jwt-abc",
            "expires_in": 3600
        }))
    } else {
        Reply::status(
            401,
            json!({"message": "Invalid credentials", "errors": {"password": ["Wrong password"]}}),
        )
    }
}

async fn backend() -> MockBackend {
    MockBackend::start(|hit| match hit.path.as_str() {
        "/api/auth/login" => login_reply(hit.body["password"].as_str().unwrap_or_default()),
        _ => Reply::ok(page(json!([]), 1)),
    })
    .await
}

#[tokio::test]
async fn login_persists_the_session_and_authorizes_requests() {
    let backend = backend().await;
    let storage = Arc::new(MemoryStorage::new());
    let state = AppState::new(Config::new(backend.url()), storage.clone()).unwrap();

    assert_eq!(state.session.rehydrate().await, SessionState::Anonymous);
    let session = state.session.login("jsalas", "correcto").await.unwrap();

    assert_eq!(session.user.full_name(), "Jorge Salas");
    assert!(state.session.state().is_authenticated());
    assert!(state.session.watchdog_armed());

    let persisted = storage.snapshot().expect("persisted session");
    assert_eq!(persisted.token, "jwt-abc");
    assert!(persisted.expires_in > 3500 && persisted.expires_in <= 3600);

    state.client.get("getDrivers", &[]).await.unwrap();
    let list = backend.hits_to("/api/getDrivers");
    assert_eq!(list[0].authorization.as_deref(), Some("Bearer jwt-abc"));

    let login = &backend.hits_to("/api/auth/login")[0];
    assert_eq!(login.method, Method::POST);
    assert_eq!(login.body, json!({"username": "jsalas", "password": "correcto"}));
}

#[tokio::test]
async fn rejected_login_leaves_the_session_untouched() {
    let backend = backend().await;
    let state = state_for(&backend);
    state.session.rehydrate().await;

    let err = state.session.login("jsalas", "wrong").await.unwrap_err();
    match &err {
        AppError::Auth {
            message,
            field_errors,
        } => {
            assert_eq!(message, "Invalid credentials");
            assert_eq!(field_errors["password"], vec!["Wrong password".to_string()]);
        }
        other => panic!("expected an auth error, got {other:?}"),
    }
    assert_eq!(state.session.state(), SessionState::Anonymous);
    assert!(!state.session.watchdog_armed());
}

#[tokio::test]
async fn logout_clears_storage_and_the_bearer_token() {
    let backend = backend().await;
    let storage = Arc::new(MemoryStorage::new());
    let state = AppState::new(Config::new(backend.url()), storage.clone()).unwrap();
    state.session.rehydrate().await;
    state.session.login("jsalas", "correcto").await.unwrap();

    state.session.logout().await;
    state.session.logout().await;

    assert_eq!(state.session.state(), SessionState::Anonymous);
    assert!(storage.load().await.unwrap().is_none());
    assert!(!state.session.watchdog_armed());

    state.client.get("getDrivers", &[]).await.unwrap();
    assert_eq!(backend.hits_to("/api/getDrivers")[0].authorization, None);
}

#[tokio::test]
async fn a_restarted_process_picks_up_the_saved_session() {
    let backend = backend().await;
    let storage = Arc::new(MemoryStorage::new());
    let first = AppState::new(Config::new(backend.url()), storage.clone()).unwrap();
    first.session.rehydrate().await;
    first.session.login("jsalas", "correcto").await.unwrap();

    let second = AppState::new(Config::new(backend.url()), storage).unwrap();
    assert_eq!(second.session.state(), SessionState::Unknown);
    let restored = second.session.rehydrate().await;
    assert_eq!(restored.user().map(|u| u.id), Some(4));

    second.client.get("getDrivers", &[]).await.unwrap();
    assert_eq!(
        backend.hits_to("/api/getDrivers")[0].authorization.as_deref(),
        Some("Bearer jwt-abc")
    );
}

#[tokio::test]
async fn rejected_login_keeps_the_signed_in_session() {
    let backend = backend().await;
    let storage = Arc::new(MemoryStorage::new());
    let state = AppState::new(Config::new(backend.url()), storage.clone()).unwrap();
    state
        .session
        .begin(common::user(&["car.index"]), "token-123".to_string(), Duration::from_secs(600))
        .await
        .unwrap();
    let before = state.session.state();
    let persisted = storage.snapshot();

    let err = state.session.login("intruder", "wrong").await.unwrap_err();
    assert!(matches!(err, AppError::Auth { .. }));

    assert_eq!(state.session.state(), before);
    assert_eq!(storage.snapshot(), persisted);
    assert!(state.session.watchdog_armed());

    state.client.get("getCars", &[]).await.unwrap();
    assert_eq!(
        backend.hits_to("/api/getCars")[0].authorization.as_deref(),
        Some("Bearer token-123")
    );
}

#[tokio::test]
async fn oversized_expires_in_uses_the_fallback_lifetime() {
    let backend = MockBackend::start(|_| {
        Reply::ok(json!({
            "user": {"id": 4, "name": "Jorge", "permissions": []},
            "token": "opaque-token",
            "expires_in": 100_000_000_000_000_000u64
        }))
    })
    .await;
    let state = state_for(&backend);
    state.session.rehydrate().await;

    let before = Utc::now();
    let session = state.session.login("jsalas", "correcto").await.unwrap();

    let lifetime = (session.expires_at - before).num_seconds();
    assert!((3590..=3610).contains(&lifetime), "lifetime was {lifetime}");
    assert!(state.session.watchdog_armed());
}
