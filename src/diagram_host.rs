//! Passive host for the embedded third-party diagram editor.
//!
//! The host owns the embed endpoint (config value, overridable from the CLI
//! and the `DRAWBRIDGE_DIAGRAMS_URL` environment variable) and the trust
//! boundary for messages coming back from the editor: inbound messages are
//! accepted only when their origin matches the origin derived from the
//! configured base URL, and everything else is silently dropped.
//!
//! Accepted messages currently go to an optional [`EmbedMessageHandler`] —
//! a reserved extension seam, not a protocol implementation. No handler is
//! installed today.

use std::sync::mpsc::{Receiver, Sender, channel};

use egui::{Color32, Frame, RichText, Stroke};
use url::Url;

use crate::config::Config;

/// Environment variable overriding the configured embed base URL.
pub const DIAGRAMS_URL_ENV: &str = "DRAWBRIDGE_DIAGRAMS_URL";

/// Fallback endpoint when both config and environment are unusable.
const DEFAULT_BASE_URL: &str = "https://embed.diagrams.net/";

/// Query selecting the editor's minimal embedded UI and JSON message
/// protocol.
const EMBED_QUERY: &str = "embed=1&ui=min&spin=1&proto=json";

/// A message sent by the embedded editor, tagged with the origin it came
/// from.
#[derive(Debug, Clone)]
pub struct EmbedMessage {
    /// scheme+host+port of the sender.
    pub origin: String,
    /// The editor's native JSON protocol payload, uninterpreted.
    pub payload: serde_json::Value,
}

/// Capability handed accepted embed messages.
///
/// Reserved seam for a future editor protocol; the origin filter in front of
/// it is active regardless of whether a handler is installed.
pub trait EmbedMessageHandler {
    fn handle(&mut self, payload: &serde_json::Value);
}

/// The diagram editor embed region.
pub struct DiagramHost {
    base_url: String,
    origin: String,
    rx: Receiver<EmbedMessage>,
    handler: Option<Box<dyn EmbedMessageHandler>>,
    accepted: u64,
    rejected: u64,
}

impl DiagramHost {
    /// Create a host for the given base URL, returning the sender half of
    /// its message intake.
    pub fn new(base_url: impl Into<String>) -> (Self, Sender<EmbedMessage>) {
        let base_url = base_url.into();
        let origin = origin_of(&base_url).unwrap_or_else(|| {
            log::warn!(
                "Unparseable diagrams base URL {:?}, trusting only the default origin",
                base_url
            );
            origin_of(DEFAULT_BASE_URL).expect("default embed URL parses")
        });
        let (tx, rx) = channel();
        let host = Self {
            base_url,
            origin,
            rx,
            handler: None,
            accepted: 0,
            rejected: 0,
        };
        (host, tx)
    }

    /// Resolve the embed base URL: CLI flag, then environment, then config.
    pub fn resolve_base_url(config: &Config, cli_override: Option<&str>) -> String {
        if let Some(url) = cli_override {
            return url.to_string();
        }
        match std::env::var(DIAGRAMS_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => url,
            _ => config.diagrams_base_url.clone(),
        }
    }

    /// Full embed URL including the minimal-UI JSON-protocol query.
    pub fn embed_url(&self) -> String {
        let separator = if self.base_url.contains('?') { '&' } else { '?' };
        format!("{}{}{}", self.base_url, separator, EMBED_QUERY)
    }

    /// The only origin whose messages are trusted.
    pub fn expected_origin(&self) -> &str {
        &self.origin
    }

    /// Install the handler that accepted messages are dispatched to.
    pub fn set_handler(&mut self, handler: Box<dyn EmbedMessageHandler>) {
        self.handler = Some(handler);
    }

    /// Drain the intake channel, applying the origin filter to each message.
    /// Called once per frame by the app shell.
    pub fn pump_messages(&mut self) {
        while let Ok(message) = self.rx.try_recv() {
            self.accept(message);
        }
    }

    fn accept(&mut self, message: EmbedMessage) {
        if message.origin != self.origin {
            self.rejected += 1;
            log::debug!(
                "Dropping embed message from untrusted origin {:?} (expected {:?})",
                message.origin,
                self.origin
            );
            return;
        }
        self.accepted += 1;
        if let Some(handler) = self.handler.as_mut() {
            handler.handle(&message.payload);
        }
    }

    /// Messages that passed the origin filter so far.
    pub fn accepted_count(&self) -> u64 {
        self.accepted
    }

    /// Messages dropped by the origin filter so far.
    pub fn rejected_count(&self) -> u64 {
        self.rejected
    }

    /// Render the embed region. The native shell does not execute remote
    /// documents in-process, so this shows the endpoint and hands off to
    /// the system browser.
    pub fn show(&mut self, ui: &mut egui::Ui) {
        self.pump_messages();

        let frame = Frame::new()
            .fill(Color32::from_gray(18))
            .stroke(Stroke::new(1.0, Color32::from_gray(50)))
            .inner_margin(16.0);
        frame.show(ui, |ui| {
            ui.set_min_size(ui.available_size());
            ui.vertical_centered(|ui| {
                ui.add_space(ui.available_height() * 0.35);
                ui.heading(RichText::new("Diagram Editor").color(Color32::from_gray(200)));
                ui.add_space(8.0);
                ui.label(
                    RichText::new(self.embed_url())
                        .color(Color32::from_gray(120))
                        .monospace()
                        .small(),
                );
                ui.add_space(12.0);
                if ui
                    .button("Open editor in browser")
                    .on_hover_text("Launch the embedded editor endpoint externally")
                    .clicked()
                    && let Err(e) = open::that(self.embed_url())
                {
                    log::warn!("Failed to open diagram editor URL: {e}");
                }
                ui.add_space(8.0);
                ui.label(
                    RichText::new(format!("Trusted origin: {}", self.origin))
                        .color(Color32::from_gray(90))
                        .small(),
                );
            });
        });
    }
}

/// Compute the scheme+host+port origin of a URL.
fn origin_of(url_str: &str) -> Option<String> {
    let parsed = Url::parse(url_str).ok()?;
    let host = parsed.host_str()?;
    let scheme = parsed.scheme();
    match parsed.port() {
        Some(port) => Some(format!("{scheme}://{host}:{port}")),
        None => Some(format!("{scheme}://{host}")),
    }
}
