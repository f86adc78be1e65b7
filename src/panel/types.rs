//! Shared colors and layout values for the chat panel.
//!
//! Only panel-local presentation constants live here; the geometry limits
//! the state machine enforces come from `drawbridge-config` so the loader
//! and the panel agree on the legal width range.

use egui::{Color32, Stroke};

/// Width of the resize handle band on the left edge of the panel.
pub const RESIZE_HANDLE_WIDTH: f32 = 8.0;

/// Inner margin of the panel frame.
pub const PANEL_INNER_MARGIN: f32 = 8.0;

/// Horizontal + vertical inset consumed by the panel frame (margins and
/// stroke on both sides).
pub const PANEL_INSET: f32 = 18.0;

/// Base height of the chat input row.
pub const CHAT_INPUT_BASE_HEIGHT: f32 = 20.0;

/// Extra height per additional input line.
pub const CHAT_INPUT_LINE_HEIGHT: f32 = 14.0;

/// Width reserved for the send/clear button column.
pub const CHAT_BUTTON_WIDTH: f32 = 36.0;

/// Panel background color (opaque dark).
pub const PANEL_BG: Color32 = Color32::from_rgba_premultiplied(24, 24, 24, 255);

/// Panel border stroke.
pub const PANEL_BORDER: Stroke = Stroke {
    width: 1.0,
    color: Color32::from_gray(50),
};

/// User message background.
pub const USER_MSG_BG: Color32 = Color32::from_rgb(30, 50, 70);

/// User role tag color.
pub const USER_TAG: Color32 = Color32::from_rgb(100, 160, 230);

/// Assistant message background.
pub const ASSISTANT_MSG_BG: Color32 = Color32::from_rgb(35, 35, 40);

/// Assistant role tag color.
pub const ASSISTANT_TAG: Color32 = Color32::from_rgb(76, 175, 80);

/// System message color.
pub const SYSTEM_MSG_COLOR: Color32 = Color32::from_gray(110);

/// Inline error text color.
pub const ERROR_COLOR: Color32 = Color32::from_rgb(244, 67, 54);

/// Default message body text color.
pub const BODY_TEXT: Color32 = Color32::from_gray(220);
