pub mod documents;
pub mod health;
pub mod tasks;
pub mod users;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::{middleware, Json, Router};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use taskdeck_db::Db;
use taskdeck_service::{DocumentService, ServiceError, TaskService, UserService};
use taskdeck_store::ObjectStore;

use crate::auth::{auth_middleware, TokenKeys};

/// Uploads are multipart PDF batches; anything past this is rejected
/// before it reaches a handler.
const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

pub struct InnerAppState {
    pub users: UserService,
    pub tasks: TaskService,
    pub documents: DocumentService,
    pub keys: TokenKeys,
    pub bcrypt_cost: u32,
}

pub type AppState = Arc<InnerAppState>;

pub fn build_state(
    db: Db,
    store: Arc<dyn ObjectStore>,
    keys: TokenKeys,
    bcrypt_cost: u32,
) -> AppState {
    Arc::new(InnerAppState {
        users: UserService::new(db.clone()),
        tasks: TaskService::new(db.clone(), store.clone()),
        documents: DocumentService::new(db, store),
        keys,
        bcrypt_cost,
    })
}

pub fn build_router(state: AppState) -> Router {
    let public = Router::new()
        .merge(health::routes())
        .merge(users::public_routes());

    let protected = Router::new()
        .merge(users::routes())
        .merge(tasks::routes())
        .merge(documents::routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    public
        .merge(protected)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Map a service failure onto the HTTP contract. Internal failures get a
/// generic body so nothing about the storage layer leaks out.
pub(crate) fn to_error(e: ServiceError) -> (StatusCode, Json<Value>) {
    let status = match &e {
        ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::Unauthorized(_) => StatusCode::FORBIDDEN,
        ServiceError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        ServiceError::Conflict(_) => StatusCode::CONFLICT,
        ServiceError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        ServiceError::Storage(_) | ServiceError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    let message = match &e {
        ServiceError::Storage(msg) | ServiceError::Internal(msg) => {
            tracing::error!(error = %msg, "internal failure");
            "internal error".to_string()
        }
        other => other.to_string(),
    };
    (status, Json(json!({ "error": message })))
}

pub(crate) fn internal(e: crate::auth::AuthError) -> (StatusCode, Json<Value>) {
    to_error(ServiceError::Internal(e.to_string()))
}
