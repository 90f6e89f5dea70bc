//! Shared fixtures for the integration suites: in-process mock servers for
//! the identity provider, the document store and the backend API, plus a
//! `GlobalArgs` builder pointing at them.

#![allow(dead_code)]

use axum::{
    extract::{Path, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    routing::{delete, get, post, put},
    Json, Router,
};
use kawal::cli::globals::GlobalArgs;
use secrecy::SecretString;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

/// Serve `app` on an ephemeral port and return its base URL.
pub async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service()).await.unwrap();
    });

    format!("http://{addr}")
}

pub fn test_globals(
    identity_url: &str,
    store_url: &str,
    api_url: &str,
    session_file: &std::path::Path,
) -> GlobalArgs {
    GlobalArgs {
        api_key: SecretString::from("k-test".to_string()),
        identity_url: identity_url.to_string(),
        token_url: String::new(),
        store_url: store_url.to_string(),
        project_id: "demo".to_string(),
        app_id: "test".to_string(),
        api_url: api_url.to_string(),
        session_file: session_file.to_path_buf(),
    }
}

// ---------------------------------------------------------------------------
// Identity provider mock

#[derive(Default)]
pub struct IdentityCalls {
    pub sign_ups: Vec<Value>,
    pub sign_ins: Vec<Value>,
    pub deletes: Vec<Value>,
    pub token_grants: Vec<Value>,
    pub fail_accounts: Option<&'static str>,
    pub fail_token: Option<&'static str>,
}

pub fn identity_router(state: Arc<Mutex<IdentityCalls>>) -> Router {
    Router::new()
        .route("/v1/*op", post(identity_handler))
        .with_state(state)
}

async fn identity_handler(
    State(state): State<Arc<Mutex<IdentityCalls>>>,
    Path(op): Path<String>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut calls = state.lock().unwrap();

    match op.as_str() {
        "accounts:signUp" | "accounts:signInWithPassword" => {
            if op == "accounts:signUp" {
                calls.sign_ups.push(body.clone());
            } else {
                calls.sign_ins.push(body.clone());
            }

            if let Some(code) = calls.fail_accounts {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"error": {"message": code}})),
                );
            }

            (
                StatusCode::OK,
                Json(json!({
                    "localId": "uid1",
                    "email": body.get("email").cloned().unwrap_or(Value::Null),
                    "idToken": "tok-1",
                    "refreshToken": "r-1",
                    "expiresIn": "3600",
                })),
            )
        }
        "accounts:delete" => {
            calls.deletes.push(body);
            (StatusCode::OK, Json(json!({})))
        }
        "token" => {
            calls.token_grants.push(body);

            if let Some(code) = calls.fail_token {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"error": {"message": code}})),
                );
            }

            let grant = calls.token_grants.len();
            (
                StatusCode::OK,
                Json(json!({
                    "user_id": "uid1",
                    "id_token": format!("tok-{grant}"),
                    "refresh_token": "r-2",
                    "expires_in": "3600",
                })),
            )
        }
        _ => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": {"message": "UNKNOWN_ENDPOINT"}})),
        ),
    }
}

// ---------------------------------------------------------------------------
// Document store mock

pub struct StoreUpsert {
    pub project: String,
    pub collection: String,
    pub key: String,
    pub authorization: Option<String>,
    pub body: Value,
}

#[derive(Default)]
pub struct StoreCalls {
    pub upserts: Vec<StoreUpsert>,
    pub fail: bool,
}

pub fn store_router(state: Arc<Mutex<StoreCalls>>) -> Router {
    Router::new()
        .route(
            "/v1/projects/:project/documents/:collection/:key",
            put(store_handler),
        )
        .with_state(state)
}

async fn store_handler(
    State(state): State<Arc<Mutex<StoreCalls>>>,
    Path((project, collection, key)): Path<(String, String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> StatusCode {
    let mut calls = state.lock().unwrap();

    calls.upserts.push(StoreUpsert {
        project,
        collection,
        key,
        authorization: auth_header(&headers),
        body,
    });

    if calls.fail {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    }
}

// ---------------------------------------------------------------------------
// Backend API mock

#[derive(Default)]
pub struct BackendCalls {
    pub users: Vec<Value>,
    pub events: Vec<String>,
    pub auth_headers: Vec<Option<String>>,
    pub fail_get: bool,
}

pub fn backend_router(state: Arc<Mutex<BackendCalls>>) -> Router {
    Router::new()
        .route("/api/getUsers", get(get_users))
        .route("/api/deleteUser/:id", delete(delete_user))
        .with_state(state)
}

async fn get_users(
    State(state): State<Arc<Mutex<BackendCalls>>>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    let mut calls = state.lock().unwrap();

    calls.events.push("GET".to_string());
    calls.auth_headers.push(auth_header(&headers));

    if calls.fail_get {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "boom"})),
        );
    }

    (StatusCode::OK, Json(Value::Array(calls.users.clone())))
}

async fn delete_user(
    State(state): State<Arc<Mutex<BackendCalls>>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Json<Value> {
    let mut calls = state.lock().unwrap();

    calls.events.push(format!("DELETE {id}"));
    calls.auth_headers.push(auth_header(&headers));
    calls
        .users
        .retain(|user| user.get("id").and_then(Value::as_str) != Some(id.as_str()));

    Json(json!({"deleted": id}))
}

fn auth_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(ToString::to_string)
}
