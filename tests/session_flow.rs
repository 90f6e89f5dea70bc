//! Session store and token-injection behavior against mock identity and
//! backend API servers.

mod support;

use kawal::{
    api::ApiClient,
    identity::{IdentityProvider, RestIdentity},
    session::SessionStore,
};
use secrecy::SecretString;
use serde_json::json;
use std::sync::{Arc, Mutex};
use support::{backend_router, identity_router, serve, test_globals, BackendCalls, IdentityCalls};

fn backend_users() -> Vec<serde_json::Value> {
    vec![
        json!({"id": "uid1", "username": "alice", "email": "a@x.com"}),
        json!({"id": "uid2", "username": "bob", "email": "b@x.com"}),
    ]
}

async fn store_with_backend(
    backend: Arc<Mutex<BackendCalls>>,
    signed_in: bool,
) -> (SessionStore, Arc<RestIdentity>, tempfile::TempDir) {
    let identity_url = serve(identity_router(Arc::new(Mutex::new(
        IdentityCalls::default(),
    ))))
    .await;
    let api_url = serve(backend_router(backend)).await;

    let dir = tempfile::tempdir().unwrap();
    let globals = test_globals(
        &identity_url,
        "http://127.0.0.1:9",
        &api_url,
        &dir.path().join("session.json"),
    );

    let identity = Arc::new(RestIdentity::new(&globals).unwrap());
    if signed_in {
        identity
            .sign_in("a@x.com", &SecretString::from("pw123456".to_string()))
            .await
            .unwrap();
    }

    let api = ApiClient::new(&globals, identity.clone()).unwrap();
    let store = SessionStore::new(api, identity.clone());

    (store, identity, dir)
}

#[tokio::test]
async fn test_unauthenticated_request_has_no_authorization_header() {
    let backend = Arc::new(Mutex::new(BackendCalls {
        users: backend_users(),
        ..BackendCalls::default()
    }));

    let (store, _identity, _dir) = store_with_backend(backend.clone(), false).await;

    store.fetch_all().await.unwrap();

    let backend = backend.lock().unwrap();
    assert_eq!(backend.auth_headers, vec![None]);
}

#[tokio::test]
async fn test_signed_in_request_carries_bearer_token() {
    let backend = Arc::new(Mutex::new(BackendCalls {
        users: backend_users(),
        ..BackendCalls::default()
    }));

    let (store, _identity, _dir) = store_with_backend(backend.clone(), true).await;

    store.fetch_all().await.unwrap();

    let backend = backend.lock().unwrap();
    assert_eq!(
        backend.auth_headers,
        vec![Some("Bearer tok-1".to_string())]
    );
}

#[tokio::test]
async fn test_fetch_all_replaces_list_and_is_idempotent() {
    let backend = Arc::new(Mutex::new(BackendCalls {
        users: backend_users(),
        ..BackendCalls::default()
    }));

    let (store, _identity, _dir) = store_with_backend(backend, true).await;

    let first = store.fetch_all().await.unwrap();
    let second = store.fetch_all().await.unwrap();

    assert_eq!(first.len(), 2);
    assert_eq!(first, second);
    assert_eq!(*store.users().borrow(), second);
}

#[tokio::test]
async fn test_delete_user_refetches_and_resynchronizes() {
    let backend = Arc::new(Mutex::new(BackendCalls {
        users: backend_users(),
        ..BackendCalls::default()
    }));

    let (store, _identity, _dir) = store_with_backend(backend.clone(), true).await;

    let remaining = store.delete_user("uid2").await.unwrap();

    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, "uid1");
    assert_eq!(*store.users().borrow(), remaining);

    let backend = backend.lock().unwrap();
    assert_eq!(backend.events, vec!["DELETE uid2", "GET"]);
}

#[tokio::test]
async fn test_fetch_failure_leaves_previous_list() {
    let backend = Arc::new(Mutex::new(BackendCalls {
        users: backend_users(),
        ..BackendCalls::default()
    }));

    let (store, _identity, _dir) = store_with_backend(backend.clone(), true).await;

    let first = store.fetch_all().await.unwrap();

    backend.lock().unwrap().fail_get = true;

    let err = store.fetch_all().await.unwrap_err();
    assert!(err.to_string().contains("500"), "unexpected error: {err}");

    assert_eq!(*store.users().borrow(), first);
}

#[tokio::test]
async fn test_logout_clears_local_state_and_persisted_session() {
    let backend = Arc::new(Mutex::new(BackendCalls {
        users: backend_users(),
        ..BackendCalls::default()
    }));

    let (store, identity, dir) = store_with_backend(backend, true).await;
    let session_file = dir.path().join("session.json");
    assert!(session_file.exists());

    store.fetch_all().await.unwrap();
    store.set_profile(Some(kawal::session::UserRecord {
        id: "uid1".to_string(),
        username: "alice".to_string(),
        email: "a@x.com".to_string(),
    }));

    store.logout().await.unwrap();

    assert!(store.profile().borrow().is_none());
    assert!(store.users().borrow().is_empty());
    assert!(identity.current_principal().is_none());
    assert!(!session_file.exists());
}
