//! Chat side panel.
//!
//! Renders the assistant panel docked to the right edge of the viewport and
//! translates raw pointer/keyboard input into [`PanelEvent`]s for the state
//! machine in [`crate::chat::state`]. All state transitions happen in the
//! reducer; this module only renders and translates.
//!
//! Sub-modules:
//! - [`chat_view`] — message list, credential field, input row
//! - [`types`]     — panel colors and layout constants

mod chat_view;
pub mod types;

use egui::{Color32, Context, CursorIcon, Frame, Id, Order, Pos2, RichText};

use drawbridge_config::{CredentialStore, PANEL_COLLAPSED_WIDTH};

use crate::chat::{Command, PanelEvent, PanelState};
use types::{PANEL_BG, PANEL_BORDER, PANEL_INNER_MARGIN, PANEL_INSET, RESIZE_HANDLE_WIDTH};

/// The assistant side panel: reducer state plus per-frame interaction
/// scratch that never outlives the egui pass.
pub struct ChatPanel {
    pub state: PanelState,
    /// Whether the pointer is over the resize handle band (kept across
    /// frames so the cursor icon does not flicker at the band edge).
    hover_resize_handle: bool,
}

impl ChatPanel {
    /// Create the panel, adopting a stored credential from the given port.
    pub fn new(width: f32, collapsed: bool, store: Box<dyn CredentialStore>) -> Self {
        Self {
            state: PanelState::new(width, collapsed, store),
            hover_resize_handle: false,
        }
    }

    /// Width consumed at the right edge of the viewport.
    pub fn consumed_width(&self) -> f32 {
        if self.state.collapsed {
            PANEL_COLLAPSED_WIDTH
        } else {
            self.state.width
        }
    }

    /// Whether a resize drag is active (the shell keeps redrawing while
    /// true so the drag stays smooth).
    pub fn is_resizing(&self) -> bool {
        self.state.resizing
    }

    /// Render the panel and return the side effects the reducer requested
    /// this frame.
    pub fn show(&mut self, ctx: &Context) -> Vec<Command> {
        let mut commands = Vec::new();

        if self.state.collapsed {
            self.show_collapsed_strip(ctx, &mut commands);
            return commands;
        }

        let viewport = ctx.input(|i| i.viewport_rect());

        // --- Resize handle input (BEFORE panel rendering so width updates
        // this frame) ---
        let panel_x = viewport.max.x - self.state.width;
        let handle_left = panel_x - RESIZE_HANDLE_WIDTH / 2.0;
        let handle_right = panel_x + RESIZE_HANDLE_WIDTH / 2.0;
        let pointer_pos = ctx.input(|i| i.pointer.hover_pos());
        let hover = pointer_pos.is_some_and(|pos| {
            pos.x >= handle_left
                && pos.x <= handle_right
                && pos.y >= viewport.min.y
                && pos.y <= viewport.max.y
        });

        let primary_pressed = ctx.input(|i| i.pointer.primary_pressed());
        let primary_down = ctx.input(|i| i.pointer.primary_down());

        if hover && primary_pressed {
            self.apply(PanelEvent::DragStarted, &mut commands);
        }
        if self.state.resizing {
            if primary_down {
                if let Some(pos) = pointer_pos.or(ctx.input(|i| i.pointer.latest_pos())) {
                    self.apply(
                        PanelEvent::DragMoved {
                            pointer_x: pos.x,
                            viewport_width: viewport.width(),
                        },
                        &mut commands,
                    );
                }
            } else {
                // Release anywhere ends the drag; egui's pointer state is
                // global, so leaving the handle band cannot wedge a drag.
                self.apply(PanelEvent::DragEnded, &mut commands);
            }
        }
        self.hover_resize_handle = hover;
        if self.hover_resize_handle || self.state.resizing {
            ctx.set_cursor_icon(CursorIcon::ResizeHorizontal);
        }

        // Recompute with a potentially drag-updated width (eliminates a
        // 1-frame lag while resizing).
        let panel_x = viewport.max.x - self.state.width;

        // --- Main panel area ---
        egui::Area::new(Id::new("chat_panel"))
            .fixed_pos(Pos2::new(panel_x, viewport.min.y))
            .order(Order::Middle)
            .interactable(true)
            .show(ctx, |ui| {
                let inner_width = self.state.width - PANEL_INSET;
                let panel_frame = Frame::new()
                    .fill(PANEL_BG)
                    .stroke(PANEL_BORDER)
                    .inner_margin(PANEL_INNER_MARGIN);

                panel_frame.show(ui, |ui| {
                    let panel_inner_height = (viewport.height() - PANEL_INSET).max(0.0);
                    ui.set_min_width(inner_width);
                    ui.set_max_width(inner_width);
                    // Constrain both min AND max height so that
                    // ui.available_height() returns a finite value inside
                    // the Area.
                    ui.set_min_height(panel_inner_height);
                    ui.set_max_height(panel_inner_height);

                    // === Title bar ===
                    ui.horizontal(|ui| {
                        ui.heading(
                            RichText::new("Assistant")
                                .strong()
                                .color(Color32::from_gray(220)),
                        );
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui
                                .button(RichText::new(">").size(14.0))
                                .on_hover_text("Collapse panel")
                                .clicked()
                            {
                                self.apply(PanelEvent::CollapseToggled, &mut commands);
                            }
                        });
                    });

                    ui.add_space(4.0);
                    ui.separator();
                    ui.add_space(4.0);

                    // === Credential row ===
                    self.render_credential_row(ui, &mut commands);

                    ui.add_space(4.0);
                    ui.separator();
                    ui.add_space(4.0);

                    // === Message history (everything above the input row) ===
                    let input_height = self.input_row_height();
                    let history_height = (ui.available_height() - input_height - 12.0).max(0.0);
                    egui::ScrollArea::vertical()
                        .id_salt("chat_history")
                        .auto_shrink([false, false])
                        .max_height(history_height)
                        .stick_to_bottom(true)
                        .show(ui, |ui| {
                            self.render_messages(ui, &mut commands);
                        });

                    ui.add_space(4.0);

                    // === Input row (pinned at the bottom) ===
                    ui.with_layout(egui::Layout::bottom_up(egui::Align::Min), |ui| {
                        self.render_input_row(ui, &mut commands);
                    });
                });
            });

        commands
    }

    /// Collapsed state: a narrow strip that re-expands the panel on click.
    /// No chat UI, credential input, or resize handle is reachable while
    /// collapsed.
    fn show_collapsed_strip(&mut self, ctx: &Context, commands: &mut Vec<Command>) {
        let viewport = ctx.input(|i| i.viewport_rect());
        let strip_x = viewport.max.x - PANEL_COLLAPSED_WIDTH;

        egui::Area::new(Id::new("chat_panel_collapsed"))
            .fixed_pos(Pos2::new(strip_x, viewport.min.y))
            .order(Order::Middle)
            .interactable(true)
            .show(ctx, |ui| {
                let desired = egui::Vec2::new(PANEL_COLLAPSED_WIDTH, viewport.height());
                let (rect, response) = ui.allocate_exact_size(desired, egui::Sense::click());
                if ui.is_rect_visible(rect) {
                    let painter = ui.painter();
                    painter.rect_filled(rect, 0.0, PANEL_BG);
                    painter.text(
                        rect.center(),
                        egui::Align2::CENTER_CENTER,
                        "<",
                        egui::FontId::proportional(14.0),
                        Color32::from_gray(200),
                    );
                }
                let response = response
                    .on_hover_cursor(CursorIcon::PointingHand)
                    .on_hover_text("Expand assistant panel");
                if response.clicked() {
                    self.apply(PanelEvent::CollapseToggled, commands);
                }
            });
    }

    /// Feed one event through the reducer, collecting any side effect.
    fn apply(&mut self, event: PanelEvent, commands: &mut Vec<Command>) {
        if let Some(command) = self.state.apply(event) {
            commands.push(command);
        }
    }
}
