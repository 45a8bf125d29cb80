//! Docqa Core - shared infrastructure for the question-answering system
//!
//! This crate carries the concerns every other crate leans on: the error
//! taxonomy with structured context, logging setup, async utilities
//! (timeouts, retries, rate limiting), and the startup configuration object.

pub mod async_utils;
pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use async_utils::*;
pub use error::*;
pub use logging::*;
pub use types::*;

// Re-export commonly used external types
pub use async_trait::async_trait;
pub use tokio;
pub use tracing;
