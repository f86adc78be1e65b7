// Library exports for testing and potential library use

/// Application version (root crate version).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod app;
pub mod chat;
pub mod cli;
pub mod config {
    //! Configuration re-exports from the `drawbridge-config` sub-crate.
    pub use drawbridge_config::{
        Config, ConfigError, CredentialStore, FileCredentialStore, LogLevel,
        MemoryCredentialStore, PANEL_COLLAPSED_WIDTH, PANEL_DEFAULT_WIDTH, PANEL_MAX_WIDTH,
        PANEL_MIN_WIDTH,
    };
}
pub mod diagram_host;
pub mod http;
pub mod logging;
pub mod panel;
