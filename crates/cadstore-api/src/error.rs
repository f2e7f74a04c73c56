//! Mapping of cadstore errors onto HTTP responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cadstore_core::CadstoreError;
use serde::Serialize;
use tracing::error;

/// JSON body returned for every failed request
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Error returned by API handlers
#[derive(Debug)]
pub struct ApiError(pub CadstoreError);

impl ApiError {
    /// HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match &self.0 {
            CadstoreError::MissingFilePart
            | CadstoreError::EmptyFilename
            | CadstoreError::ExtensionNotAllowed
            | CadstoreError::InvalidFilename
            | CadstoreError::InvalidMultipart => StatusCode::BAD_REQUEST,
            CadstoreError::ModelNotFound(_) => StatusCode::NOT_FOUND,
            CadstoreError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            CadstoreError::Config(_) | CadstoreError::Io(_) | CadstoreError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<CadstoreError> for ApiError {
    fn from(err: CadstoreError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if self.0.is_client_error() {
            self.0.to_string()
        } else {
            error!(error = %self.0, "Request failed");
            "Internal server error".to_string()
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
