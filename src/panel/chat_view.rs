//! Chat UI rendering for the assistant panel: credential row, message
//! list, thinking indicator, inline error, and the input row.

use egui::{Frame, Key, Label, RichText};

use crate::chat::types::Role;
use crate::chat::{Command, PanelEvent};

use super::ChatPanel;
use super::types::{
    ASSISTANT_MSG_BG, ASSISTANT_TAG, BODY_TEXT, CHAT_BUTTON_WIDTH, CHAT_INPUT_BASE_HEIGHT,
    CHAT_INPUT_LINE_HEIGHT, ERROR_COLOR, SYSTEM_MSG_COLOR, USER_MSG_BG, USER_TAG,
};

impl ChatPanel {
    /// Render the API key field. Changes are persisted through the
    /// credential port on every non-empty edit; blanking the field leaves
    /// storage untouched.
    pub(super) fn render_credential_row(&mut self, ui: &mut egui::Ui, commands: &mut Vec<Command>) {
        ui.label(RichText::new("API key").color(SYSTEM_MSG_COLOR).small());
        let response = ui.add(
            egui::TextEdit::singleline(&mut self.state.credential)
                .password(true)
                .hint_text("Paste your chat API key")
                .desired_width(ui.available_width()),
        );
        if response.changed() {
            let value = self.state.credential.clone();
            self.apply(PanelEvent::CredentialChanged { value }, commands);
        }
    }

    /// Render the conversation in order, followed by the thinking
    /// indicator and the most recent error.
    pub(super) fn render_messages(&mut self, ui: &mut egui::Ui, commands: &mut Vec<Command>) {
        for message in &self.state.messages {
            match message.role {
                Role::User => {
                    let frame = Frame::new()
                        .fill(USER_MSG_BG)
                        .corner_radius(4.0)
                        .inner_margin(6.0);
                    frame.show(ui, |ui| {
                        ui.set_min_width(ui.available_width());
                        ui.label(RichText::new("You:").color(USER_TAG).small().strong());
                        ui.add(
                            Label::new(RichText::new(&message.content).color(BODY_TEXT))
                                .selectable(true)
                                .wrap(),
                        );
                    });
                    ui.add_space(4.0);
                }
                Role::Assistant => {
                    let frame = Frame::new()
                        .fill(ASSISTANT_MSG_BG)
                        .corner_radius(4.0)
                        .inner_margin(6.0);
                    frame.show(ui, |ui| {
                        ui.set_min_width(ui.available_width());
                        ui.label(
                            RichText::new("Assistant:")
                                .color(ASSISTANT_TAG)
                                .small()
                                .strong(),
                        );
                        ui.add(
                            Label::new(RichText::new(&message.content).color(BODY_TEXT))
                                .selectable(true)
                                .wrap(),
                        );
                    });
                    ui.add_space(4.0);
                }
                Role::System => {
                    ui.horizontal(|ui| {
                        ui.label(RichText::new("i").color(SYSTEM_MSG_COLOR).small());
                        ui.add(
                            Label::new(
                                RichText::new(&message.content)
                                    .color(SYSTEM_MSG_COLOR)
                                    .small()
                                    .italics(),
                            )
                            .selectable(true)
                            .wrap(),
                        );
                    });
                    ui.add_space(2.0);
                }
            }
        }

        if self.state.loading {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label(
                    RichText::new("Assistant is thinking...")
                        .color(SYSTEM_MSG_COLOR)
                        .small()
                        .italics(),
                );
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui
                        .button(RichText::new("Cancel").small().color(ERROR_COLOR))
                        .on_hover_text("Abandon the in-flight request")
                        .clicked()
                    {
                        self.apply(PanelEvent::CancelRequested, commands);
                    }
                });
            });
            ui.add_space(2.0);
        }

        if let Some(error) = &self.state.error {
            ui.add(
                Label::new(
                    RichText::new(format!("Error: {error}"))
                        .color(ERROR_COLOR)
                        .small(),
                )
                .selectable(true)
                .wrap(),
            );
        }
    }

    /// Height of the input row for the current line count.
    pub(super) fn input_row_height(&self) -> f32 {
        let line_count = self.state.input.lines().count().clamp(1, 6);
        CHAT_INPUT_BASE_HEIGHT + (line_count as f32 - 1.0) * CHAT_INPUT_LINE_HEIGHT
    }

    /// Render the chat text input and send/clear buttons.
    ///
    /// Multiline: Enter sends, Shift+Enter inserts a newline. The send
    /// affordance is disabled while a request is in flight or without a
    /// credential; empty input is additionally a reducer-level no-op.
    pub(super) fn render_input_row(&mut self, ui: &mut egui::Ui, commands: &mut Vec<Command>) {
        let line_count = self.state.input.lines().count().clamp(1, 6);
        let input_height = self.input_row_height();
        let input_width = ui.available_width() - CHAT_BUTTON_WIDTH;

        // Check for Enter (without Shift) before rendering the TextEdit,
        // since egui may consume the key event.
        let enter_pressed = ui.input(|i| {
            i.key_pressed(Key::Enter)
                && !i.modifiers.shift
                && !i.modifiers.ctrl
                && !i.modifiers.command
        });

        ui.horizontal(|ui| {
            let response = ui.add_sized(
                [input_width, input_height],
                egui::TextEdit::multiline(&mut self.state.input)
                    .hint_text("Describe the diagram you want... (Shift+Enter for newline)")
                    .desired_width(input_width)
                    .desired_rows(line_count),
            );

            let is_focused = response.has_focus();
            let should_send = is_focused && enter_pressed && self.state.can_send();

            ui.vertical(|ui| {
                let send_clicked = ui
                    .add_enabled(
                        self.state.can_send(),
                        egui::Button::new(RichText::new(">").size(14.0)),
                    )
                    .on_hover_text("Send message (Enter)")
                    .clicked();

                if ui
                    .button(RichText::new("C").size(12.0))
                    .on_hover_text("Clear conversation")
                    .clicked()
                {
                    self.state.clear_conversation();
                }

                if should_send {
                    // egui inserts the newline from Enter before we see the
                    // send; strip it so it is not part of the message.
                    while self.state.input.ends_with('\n') {
                        self.state.input.pop();
                    }
                }

                if should_send || send_clicked {
                    self.apply(PanelEvent::SendRequested, commands);
                }
            });

            // Re-focus input after sending
            if should_send {
                response.request_focus();
            }
        });
    }
}
