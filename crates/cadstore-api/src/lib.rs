//! cadstore-api: HTTP API server for cadstore
//!
//! This crate provides the HTTP API for the model store:
//! - Model upload
//! - Model listing
//! - Model retrieval

pub mod cors;
pub mod error;
pub mod rest;

pub use error::ApiError;
pub use rest::create_router;
