use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;

use taskdeck_core::user::{Role, User};
use taskdeck_db::Db;
use taskdeck_store::LocalStore;

use crate::auth::{self, TokenKeys};
use crate::routes::{build_router, build_state, AppState};

pub const TEST_SECRET: &str = "taskdeck-test-secret";

/// Low bcrypt cost keeps the suite fast; never use outside tests.
pub const TEST_BCRYPT_COST: u32 = 4;

/// App state over in-memory SQLite and a temp-dir store.
pub fn test_state() -> AppState {
    let db = Db::open_in_memory().unwrap();
    let store = Arc::new(LocalStore::new(tempfile::tempdir().unwrap().keep()));
    build_state(db, store, TokenKeys::new(TEST_SECRET), TEST_BCRYPT_COST)
}

pub async fn test_router() -> Router {
    build_router(test_state())
}

/// Router plus one registered account and a token for it.
pub async fn test_router_with_user(role: Role) -> (Router, String, User) {
    let state = test_state();
    let (token, user) = register_user(&state, "someone@example.com", "password", role);
    (build_router(state), token, user)
}

/// Register an account directly against the state, bypassing HTTP.
pub fn register_user(state: &AppState, email: &str, password: &str, role: Role) -> (String, User) {
    let hash = auth::hash_password(password, TEST_BCRYPT_COST).unwrap();
    let user = state.users.register(email, &hash, role).unwrap();
    let token = auth::issue_token(&state.keys, &user.id, user.role).unwrap();
    (token, user)
}

/// A running test server with base_url and background task handle.
pub struct TestServer {
    pub base_url: String,
    _handle: tokio::task::JoinHandle<()>,
}

/// Spawn an axum test server on a random port.
pub async fn spawn_test_server() -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base_url = format!("http://{addr}");
    let app = test_router().await;
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    TestServer {
        base_url,
        _handle: handle,
    }
}
