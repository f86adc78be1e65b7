//! Default values for configuration fields.
//!
//! Each function doubles as a `#[serde(default = "...")]` target and as the
//! source of truth for `Config::default()`, so a hand-edited config file
//! with missing keys and a freshly generated one agree.

use crate::layout::PANEL_DEFAULT_WIDTH;

pub fn window_title() -> String {
    "drawbridge".to_string()
}

pub fn window_width() -> u32 {
    1280
}

pub fn window_height() -> u32 {
    800
}

/// Public diagrams.net embed endpoint.
pub fn diagrams_base_url() -> String {
    "https://embed.diagrams.net/".to_string()
}

pub fn chat_endpoint() -> String {
    "https://api.deepseek.com/chat/completions".to_string()
}

pub fn chat_model() -> String {
    "deepseek-chat".to_string()
}

/// Request timeout in seconds. Zero disables the timeout.
pub fn chat_timeout_secs() -> u64 {
    60
}

pub fn panel_width() -> f32 {
    PANEL_DEFAULT_WIDTH
}

pub fn bool_true() -> bool {
    true
}

pub fn bool_false() -> bool {
    false
}
