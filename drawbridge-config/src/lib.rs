//! Configuration system for the drawbridge diagram workspace.
//!
//! This crate provides configuration loading, saving, and default values
//! for the application. It includes:
//!
//! - Application configuration types and settings
//! - Layout constants shared with the UI layer
//! - The credential persistence port and its implementations

pub mod config;
pub mod credential;
pub mod defaults;
pub mod error;
pub mod layout;

// Re-export main types for convenience
pub use config::{Config, LogLevel};
pub use credential::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use error::ConfigError;
pub use layout::{
    PANEL_COLLAPSED_WIDTH, PANEL_DEFAULT_WIDTH, PANEL_MAX_WIDTH, PANEL_MIN_WIDTH,
};
