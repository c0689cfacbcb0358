use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::Response,
    routing::get,
    Extension, Json, Router,
};
use serde_json::{json, Value};

use taskdeck_core::actor::Actor;
use taskdeck_service::{ServiceError, UploadedFile};

use super::{to_error, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/tasks/{id}/documents",
            get(list_documents).post(upload_documents),
        )
        .route("/api/tasks/documents/{doc_id}/view", get(view_document))
        .route(
            "/api/tasks/documents/{doc_id}/download",
            get(download_document),
        )
}

async fn list_documents(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    state
        .documents
        .list(&id, &actor)
        .map(|docs| Json(json!(docs)))
        .map_err(to_error)
}

async fn upload_documents(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    let mut files = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        to_error(ServiceError::InvalidInput(format!(
            "malformed multipart body: {e}"
        )))
    })? {
        // Only file parts count; stray form values are ignored.
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let data = field.bytes().await.map_err(|e| {
            to_error(ServiceError::InvalidInput(format!(
                "failed to read {file_name}: {e}"
            )))
        })?;
        files.push(UploadedFile { file_name, data });
    }
    state
        .documents
        .attach(&id, files, &actor)
        .await
        .map(|docs| (StatusCode::CREATED, Json(json!(docs))))
        .map_err(to_error)
}

async fn view_document(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(doc_id): Path<String>,
) -> Result<Response, (StatusCode, Json<Value>)> {
    let (_document, data) = state
        .documents
        .open(&doc_id, &actor)
        .await
        .map_err(to_error)?;
    Response::builder()
        .header(header::CONTENT_TYPE, "application/pdf")
        .body(Body::from(data))
        .map_err(|e| to_error(ServiceError::Internal(e.to_string())))
}

async fn download_document(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(doc_id): Path<String>,
) -> Result<Response, (StatusCode, Json<Value>)> {
    let (document, data) = state
        .documents
        .open(&doc_id, &actor)
        .await
        .map_err(to_error)?;
    // Quotes would terminate the header's filename early; strip them.
    let file_name = document.file_name.replace('"', "");
    Response::builder()
        .header(header::CONTENT_TYPE, "application/pdf")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{file_name}\""),
        )
        .body(Body::from(data))
        .map_err(|e| to_error(ServiceError::Internal(e.to_string())))
}
