//! `PanelState` — the chat panel's state machine.
//!
//! All panel transitions (geometry, credential, send lifecycle) are applied
//! through [`PanelState::apply`] as tagged [`PanelEvent`]s. The egui layer
//! only translates raw input into events and renders the resulting state;
//! side effects come back to the caller as [`Command`]s. This keeps every
//! transition unit-testable without simulating pointer events or a backend.

use drawbridge_config::{CredentialStore, PANEL_MAX_WIDTH, PANEL_MIN_WIDTH};

use super::types::ChatMessage;

/// A tagged input to the panel state machine.
#[derive(Debug, Clone)]
pub enum PanelEvent {
    /// Pointer pressed over the resize handle.
    DragStarted,
    /// Pointer moved while a drag is active. Width is recomputed from the
    /// absolute pointer position, not accumulated deltas, so the handle
    /// tracks the pointer even after the clamp engages.
    DragMoved { pointer_x: f32, viewport_width: f32 },
    /// Pointer released anywhere.
    DragEnded,
    /// Collapse/expand toggle.
    CollapseToggled,
    /// The credential input changed.
    CredentialChanged { value: String },
    /// The user asked to send the current input buffer.
    SendRequested,
    /// The in-flight request completed with the assistant's reply.
    SendSucceeded { seq: u64, text: String },
    /// The in-flight request failed.
    SendFailed { seq: u64, message: String },
    /// The user asked to abandon the in-flight request.
    CancelRequested,
}

/// A side effect requested by the state machine, executed by the app shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Issue a chat request carrying a snapshot of the full conversation.
    Send {
        seq: u64,
        credential: String,
        messages: Vec<ChatMessage>,
    },
    /// Trip the cancel token of the request identified by `seq`.
    CancelInFlight { seq: u64 },
}

/// Chat panel state: conversation, input buffer, request lifecycle,
/// credential, and panel geometry.
pub struct PanelState {
    /// All messages in the conversation history, oldest first.
    pub messages: Vec<ChatMessage>,
    /// The current text input from the user (not yet sent). Bound directly
    /// to the input widget; consumed by `SendRequested`.
    pub input: String,
    /// Whether a request is in flight.
    pub loading: bool,
    /// The most recent failure, shown until the next send clears it.
    pub error: Option<String>,
    /// The credential value as currently entered. Bound directly to the
    /// credential widget; persisted through `CredentialChanged`.
    pub credential: String,
    /// Panel width in pixels, always within [`PANEL_MIN_WIDTH`, `PANEL_MAX_WIDTH`].
    pub width: f32,
    /// Whether the panel is collapsed to its expand strip.
    pub collapsed: bool,
    /// Whether a resize drag is active. Transient; never persisted.
    pub resizing: bool,

    store: Box<dyn CredentialStore>,
    /// Sequence number of the most recently dispatched request.
    seq: u64,
    /// Sequence of the request currently in flight, if any. Completions
    /// carrying any other sequence are stale and dropped.
    in_flight: Option<u64>,
}

impl PanelState {
    /// Create panel state with the given geometry defaults, adopting a
    /// previously stored credential if the port has one.
    pub fn new(width: f32, collapsed: bool, store: Box<dyn CredentialStore>) -> Self {
        let credential = store.load().unwrap_or_default();
        Self {
            messages: Vec::new(),
            input: String::new(),
            loading: false,
            error: None,
            credential,
            width: width.clamp(PANEL_MIN_WIDTH, PANEL_MAX_WIDTH),
            collapsed,
            resizing: false,
            store,
            seq: 0,
            in_flight: None,
        }
    }

    /// Whether the send affordance should be enabled: not while a request
    /// is in flight, and never without a credential.
    pub fn can_send(&self) -> bool {
        !self.loading && !self.credential.trim().is_empty()
    }

    /// Apply one event, returning a side effect for the shell to run.
    pub fn apply(&mut self, event: PanelEvent) -> Option<Command> {
        match event {
            PanelEvent::DragStarted => {
                if !self.collapsed {
                    self.resizing = true;
                }
                None
            }
            PanelEvent::DragMoved {
                pointer_x,
                viewport_width,
            } => {
                if self.resizing {
                    self.width =
                        (viewport_width - pointer_x).clamp(PANEL_MIN_WIDTH, PANEL_MAX_WIDTH);
                }
                None
            }
            PanelEvent::DragEnded => {
                self.resizing = false;
                None
            }
            PanelEvent::CollapseToggled => {
                self.collapsed = !self.collapsed;
                // A collapse mid-drag ends the drag; the handle is gone.
                self.resizing = false;
                None
            }
            PanelEvent::CredentialChanged { value } => {
                self.credential = value;
                if !self.credential.trim().is_empty()
                    && let Err(e) = self.store.save(&self.credential)
                {
                    log::warn!("Failed to persist credential: {e}");
                }
                None
            }
            PanelEvent::SendRequested => self.begin_send(),
            PanelEvent::SendSucceeded { seq, text } => {
                if self.in_flight != Some(seq) {
                    log::debug!("Dropping stale completion (seq {seq})");
                    return None;
                }
                self.messages.push(ChatMessage::assistant(text));
                self.loading = false;
                self.in_flight = None;
                None
            }
            PanelEvent::SendFailed { seq, message } => {
                if self.in_flight != Some(seq) {
                    log::debug!("Dropping stale failure (seq {seq})");
                    return None;
                }
                // The user's message stays in the conversation; failed turns
                // are visibly recorded, not rolled back.
                self.error = Some(message);
                self.loading = false;
                self.in_flight = None;
                None
            }
            PanelEvent::CancelRequested => {
                let seq = self.in_flight.take()?;
                self.loading = false;
                self.error = Some("Request cancelled".to_string());
                Some(Command::CancelInFlight { seq })
            }
        }
    }

    fn begin_send(&mut self) -> Option<Command> {
        let trimmed = self.input.trim();
        if trimmed.is_empty() || self.loading {
            return None;
        }
        self.error = None;
        self.messages.push(ChatMessage::user(trimmed));
        self.input.clear();
        self.loading = true;
        self.seq += 1;
        self.in_flight = Some(self.seq);
        Some(Command::Send {
            seq: self.seq,
            credential: self.credential.clone(),
            messages: self.messages.clone(),
        })
    }

    /// Clear the conversation and any error. Does not touch geometry,
    /// credential, or an in-flight request.
    pub fn clear_conversation(&mut self) {
        self.messages.clear();
        self.error = None;
    }
}
