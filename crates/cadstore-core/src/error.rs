//! Error types for cadstore

use thiserror::Error;

/// Main error type for cadstore
///
/// The `Display` text of the client-facing variants is the exact message
/// returned to HTTP clients.
#[derive(Error, Debug)]
pub enum CadstoreError {
    /// Upload request carried no `file` field
    #[error("No file part")]
    MissingFilePart,

    /// The `file` field had an empty filename
    #[error("No selected file")]
    EmptyFilename,

    /// Extension is not in the allow-list
    #[error("File type not allowed")]
    ExtensionNotAllowed,

    /// Filename sanitized down to nothing
    #[error("Invalid filename")]
    InvalidFilename,

    /// Multipart body could not be parsed
    #[error("Invalid multipart data")]
    InvalidMultipart,

    /// Request body exceeded the upload limit
    #[error("File too large (max {max_bytes} bytes)")]
    PayloadTooLarge { max_bytes: u64 },

    /// Requested model does not exist
    #[error("File not found")]
    ModelNotFound(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CadstoreError {
    /// Whether the error was caused by the client's request rather than a server fault
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            CadstoreError::MissingFilePart
                | CadstoreError::EmptyFilename
                | CadstoreError::ExtensionNotAllowed
                | CadstoreError::InvalidFilename
                | CadstoreError::InvalidMultipart
                | CadstoreError::PayloadTooLarge { .. }
                | CadstoreError::ModelNotFound(_)
        )
    }
}

/// Result type for cadstore operations
pub type CadstoreResult<T> = Result<T, CadstoreError>;

impl From<toml::de::Error> for CadstoreError {
    fn from(err: toml::de::Error) -> Self {
        CadstoreError::Config(err.to_string())
    }
}
