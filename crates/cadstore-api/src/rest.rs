//! REST API handlers

use axum::{
    body::Body,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        DefaultBodyLimit, Multipart, Path, State,
    },
    http::{header, StatusCode},
    response::{Json, Response},
    routing::{get, post},
    Router,
};
use cadstore_core::{extension, ApiConfig, CadstoreError};
use cadstore_store::ModelStore;
use serde::Serialize;
use std::sync::Arc;
use tokio_util::io::ReaderStream;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::debug;

use crate::cors::create_cors_layer;
use crate::error::ApiError;

/// Application state shared across handlers
pub struct AppState {
    pub store: Arc<ModelStore>,
}

/// Create the API router
///
/// The request body limit comes from the store's configuration and applies
/// to every route.
pub fn create_router(store: Arc<ModelStore>, api: &ApiConfig) -> Router {
    let max_body = usize::try_from(store.config().max_upload_size).unwrap_or(usize::MAX);
    let state = Arc::new(AppState { store });

    let router = Router::new()
        .route("/upload", post(upload_model))
        .route("/models", get(list_models))
        .route("/models/:filename", get(get_model))
        .with_state(state)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body));

    let router = if api.cors_enabled {
        router.layer(create_cors_layer(&api.cors_origins))
    } else {
        router
    };

    router.layer(TraceLayer::new_for_http())
}

/// Response for a successful upload
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub filename: String,
}

/// Response listing stored models
#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub models: Vec<String>,
}

fn multipart_error(err: MultipartError, max_bytes: u64) -> CadstoreError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        CadstoreError::PayloadTooLarge { max_bytes }
    } else {
        debug!(error = %err, "Malformed multipart body");
        CadstoreError::InvalidMultipart
    }
}

/// Upload a model from the `file` field of a multipart form
async fn upload_model(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let max_bytes = state.store.config().max_upload_size;
    let mut multipart = multipart.map_err(|rejection| {
        debug!(error = %rejection, "Upload without multipart body");
        CadstoreError::MissingFilePart
    })?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_bytes))?
    {
        if upload.is_some() || field.name() != Some("file") {
            continue;
        }

        // Reject bad names before buffering the content
        let name = state
            .store
            .upload_name(field.file_name().unwrap_or_default())?;

        let content = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e, max_bytes))?;
        upload = Some((name, content));
    }

    let (name, content) = upload.ok_or(CadstoreError::MissingFilePart)?;
    let model = state.store.save(&name, &content).await?;

    Ok(Json(UploadResponse {
        message: "File uploaded successfully".to_string(),
        filename: model.name,
    }))
}

/// List stored models
async fn list_models(State(state): State<Arc<AppState>>) -> Result<Json<ModelsResponse>, ApiError> {
    let models = state.store.list().await?;
    Ok(Json(ModelsResponse { models }))
}

/// Content type for a stored model name
fn content_type(name: &str) -> String {
    match extension(name).map(str::to_ascii_lowercase).as_deref() {
        Some("stl") => "model/stl".to_string(),
        Some("obj") => "model/obj".to_string(),
        _ => mime_guess::from_path(name)
            .first_or_octet_stream()
            .to_string(),
    }
}

/// Stream a stored model back to the client
async fn get_model(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let (model, file) = state.store.open(&filename).await?;

    // The stream owns the file handle and closes it when dropped
    let body = Body::from_stream(ReaderStream::new(file));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type(&model.name))
        .header(header::CONTENT_LENGTH, model.size)
        .body(body)
        .map_err(|e| ApiError(CadstoreError::Internal(e.to_string())))
}
