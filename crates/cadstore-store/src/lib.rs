//! cadstore-store: Model storage
//!
//! This crate provides the filesystem-backed model store:
//! - Storage directory initialization
//! - Allow-listed, sanitized uploads
//! - Retrieval and listing

pub mod store;

pub use store::{ModelStore, StoredModel, UploadName};
