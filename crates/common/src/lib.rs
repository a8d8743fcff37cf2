//! Sangat Common Library
//!
//! Shared code for the Sangat gateway:
//! - Error types and handling
//! - Configuration management
//! - Sign-in tokens
//! - Metrics
//! - Chat context assembly and the generative backend
//! - Gurbani search with transliteration fallback
//! - The seva board store

pub mod auth;
pub mod chat;
pub mod config;
pub mod errors;
pub mod gurbani;
pub mod metrics;
pub mod seva;

// Re-export commonly used types
pub use config::AppConfig;
pub use errors::{AppError, Result};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
