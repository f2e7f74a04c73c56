//! cadstore-core: Core types for cadstore
//!
//! This crate provides the fundamental pieces shared by the cadstore crates:
//! - Configuration types
//! - Error handling
//! - Filename sanitization and extension allow-listing

pub mod config;
pub mod error;
pub mod filename;

pub use config::*;
pub use error::*;
pub use filename::*;
