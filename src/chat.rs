//! Chat sub-system for the assistant panel.
//!
//! Sub-modules:
//! - [`client`] — `ChatClient`: one-shot chat-completions HTTP client
//! - [`state`]  — `PanelState` reducer: conversation, geometry, request lifecycle
//! - [`types`]  — `Role` and `ChatMessage`

pub mod client;
pub mod state;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export the public API so callers can use `chat::PanelState` etc.
pub use client::{CancelToken, ChatClient, ChatError};
pub use state::{Command, PanelEvent, PanelState};
pub use types::{ChatMessage, Role};
