use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use taskdeck_core::actor::Actor;
use taskdeck_core::user::{Role, UpdateUser};
use taskdeck_service::ServiceError;

use super::{internal, to_error, AppState};
use crate::auth;

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/users/register", post(register))
        .route("/api/users/login", post(login))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/users", get(list_users))
        .route(
            "/api/users/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
}

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    email: String,
    password: String,
    #[serde(default)]
    role: Option<Role>,
}

async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    let email = input.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(to_error(ServiceError::InvalidInput(
            "a valid email is required".into(),
        )));
    }
    if input.password.is_empty() {
        return Err(to_error(ServiceError::InvalidInput(
            "password must not be empty".into(),
        )));
    }
    let hash = auth::hash_password(&input.password, state.bcrypt_cost).map_err(internal)?;
    let user = state
        .users
        .register(email, &hash, input.role.unwrap_or_default())
        .map_err(to_error)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "user registered", "user": user })),
    ))
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

/// Unknown email and wrong password answer identically.
async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let user = state
        .users
        .find_by_email(input.email.trim())
        .map_err(to_error)?
        .ok_or_else(|| to_error(ServiceError::InvalidCredentials))?;
    let matches = auth::verify_password(&input.password, &user.password_hash).map_err(internal)?;
    if !matches {
        return Err(to_error(ServiceError::InvalidCredentials));
    }
    let token = auth::issue_token(&state.keys, &user.id, user.role).map_err(internal)?;
    Ok(Json(json!({ "token": token, "user": user })))
}

async fn list_users(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    state
        .users
        .list(&actor)
        .map(|users| Json(json!(users)))
        .map_err(to_error)
}

async fn get_user(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    state
        .users
        .get(&id, &actor)
        .map(|user| Json(json!(user)))
        .map_err(to_error)
}

async fn update_user(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Json(input): Json<UpdateUser>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    state
        .users
        .update(&id, &actor, input)
        .map(|user| Json(json!(user)))
        .map_err(to_error)
}

async fn delete_user(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<StatusCode, (StatusCode, Json<Value>)> {
    state
        .users
        .delete(&id, &actor)
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(to_error)
}
