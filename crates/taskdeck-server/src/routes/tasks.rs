use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use serde_json::{json, Value};

use taskdeck_core::actor::Actor;
use taskdeck_core::task::{CreateTask, UpdateTask};

use super::{to_error, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route(
            "/api/tasks/{id}",
            get(get_task).put(update_task).delete(delete_task),
        )
}

async fn list_tasks(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    state
        .tasks
        .list(&actor)
        .map(|tasks| Json(json!(tasks)))
        .map_err(to_error)
}

async fn create_task(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(input): Json<CreateTask>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    state
        .tasks
        .create(&input, &actor)
        .map(|task| (StatusCode::CREATED, Json(json!(task))))
        .map_err(to_error)
}

async fn get_task(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    state
        .tasks
        .get(&id, &actor)
        .map(|task| Json(json!(task)))
        .map_err(to_error)
}

async fn update_task(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Json(input): Json<UpdateTask>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    state
        .tasks
        .update(&id, &input, &actor)
        .map(|task| Json(json!(task)))
        .map_err(to_error)
}

/// Responds with the deleted record.
async fn delete_task(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    state
        .tasks
        .delete(&id, &actor)
        .await
        .map(|task| Json(json!(task)))
        .map_err(to_error)
}
