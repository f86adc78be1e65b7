//! Application shell: window, render loop, and request orchestration.
//!
//! Composes the diagram host (remaining space) and the chat panel (its
//! current width) side by side in one window. The shell also executes the
//! side effects the panel's state machine requests: it runs chat requests
//! on the tokio blocking pool and feeds completions back into the reducer
//! through a channel drained once per frame.

use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};

use anyhow::{Context as _, Result};
use tokio::runtime::Runtime;
use wgpu::SurfaceError;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use drawbridge_config::FileCredentialStore;

use crate::chat::{CancelToken, ChatClient, Command, PanelEvent};
use crate::cli::RuntimeOptions;
use crate::config::Config;
use crate::diagram_host::{DiagramHost, EmbedMessage};
use crate::panel::ChatPanel;

/// Fallback wake interval while a request is in flight, in case the
/// worker's redraw races the wait.
const LOADING_POLL: std::time::Duration = std::time::Duration::from_millis(200);

/// Main application
pub struct App {
    config: Config,
    runtime: Arc<Runtime>,
    options: RuntimeOptions,
}

impl App {
    /// Create a new application, loading (or creating) the config file.
    pub fn new(runtime: Arc<Runtime>, options: RuntimeOptions) -> Result<Self> {
        let mut config = Config::load().context("failed to load configuration")?;
        if let Some(level) = options.log_level {
            config.log_level = level;
        }
        crate::logging::apply_config_level(config.log_level);
        Ok(Self {
            config,
            runtime,
            options,
        })
    }

    /// Run the application until the window closes.
    pub fn run(self) -> Result<()> {
        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Wait);

        let mut app_state = AppState::new(self.config, self.runtime, self.options);

        event_loop.run_app(&mut app_state)?;

        Ok(())
    }
}

/// Outcome of one chat request, reported by the worker.
struct ChatCompletion {
    seq: u64,
    result: Result<String, crate::chat::ChatError>,
}

/// Application state that handles events.
struct AppState {
    config: Config,
    runtime: Arc<Runtime>,
    options: RuntimeOptions,
    window: Option<Arc<Window>>,
    gfx: Option<Gfx>,
    panel: ChatPanel,
    diagram: DiagramHost,
    /// Sender half of the embed message intake. Nothing feeds it today;
    /// it is the seam a local editor bridge would write into.
    #[allow(dead_code)]
    embed_tx: Sender<EmbedMessage>,
    chat_client: Arc<ChatClient>,
    completion_tx: Sender<ChatCompletion>,
    completion_rx: Receiver<ChatCompletion>,
    /// Cancel token of the request currently in flight, keyed by sequence.
    in_flight: Option<(u64, CancelToken)>,
    started_at: std::time::Instant,
}

impl AppState {
    fn new(config: Config, runtime: Arc<Runtime>, options: RuntimeOptions) -> Self {
        let panel = ChatPanel::new(
            config.panel_width,
            !config.panel_open_on_startup,
            Box::new(FileCredentialStore::default()),
        );
        let base_url = DiagramHost::resolve_base_url(&config, options.diagrams_url.as_deref());
        let (diagram, embed_tx) = DiagramHost::new(base_url);
        log::info!("Diagram embed origin: {}", diagram.expected_origin());

        let chat_client = Arc::new(ChatClient::new(
            config.chat_endpoint.clone(),
            config.chat_model.clone(),
            config.chat_timeout_secs,
        ));
        let (completion_tx, completion_rx) = channel();

        Self {
            config,
            runtime,
            options,
            window: None,
            gfx: None,
            panel,
            diagram,
            embed_tx,
            chat_client,
            completion_tx,
            completion_rx,
            in_flight: None,
            started_at: std::time::Instant::now(),
        }
    }

    /// Apply any completions the worker has reported since the last frame.
    fn drain_completions(&mut self) {
        while let Ok(completion) = self.completion_rx.try_recv() {
            if self
                .in_flight
                .as_ref()
                .is_some_and(|(seq, _)| *seq == completion.seq)
            {
                self.in_flight = None;
            }
            let event = match completion.result {
                Ok(text) => PanelEvent::SendSucceeded {
                    seq: completion.seq,
                    text,
                },
                Err(e) => PanelEvent::SendFailed {
                    seq: completion.seq,
                    message: e.to_string(),
                },
            };
            // Completion events never produce commands.
            self.panel.state.apply(event);
        }
    }

    /// Execute the side effects the panel requested this frame.
    fn handle_commands(&mut self, commands: Vec<Command>) {
        for command in commands {
            match command {
                Command::Send {
                    seq,
                    credential,
                    messages,
                } => self.spawn_send(seq, credential, messages),
                Command::CancelInFlight { seq } => {
                    if let Some((in_seq, token)) = &self.in_flight
                        && *in_seq == seq
                    {
                        log::info!("Cancelling chat request {seq}");
                        token.cancel();
                    }
                }
            }
        }
    }

    /// Run one chat request on the blocking pool. The panel's loading guard
    /// ensures at most one of these is ever in flight.
    fn spawn_send(
        &mut self,
        seq: u64,
        credential: String,
        messages: Vec<crate::chat::ChatMessage>,
    ) {
        let client = Arc::clone(&self.chat_client);
        let token = CancelToken::new();
        self.in_flight = Some((seq, token.clone()));
        let tx = self.completion_tx.clone();
        let window = self.window.clone();

        self.runtime.spawn_blocking(move || {
            let result = client.complete(&credential, &messages, &token);
            if tx.send(ChatCompletion { seq, result }).is_err() {
                log::debug!("Completion channel closed before request {seq} finished");
                return;
            }
            // Wake the event loop so the reply shows without waiting for
            // the next input event.
            if let Some(window) = window {
                window.request_redraw();
            }
        });
    }

    /// Persist panel geometry so the next launch reopens where we left off.
    fn save_geometry(&mut self) {
        self.config.panel_width = self.panel.state.width;
        self.config.panel_open_on_startup = !self.panel.state.collapsed;
        if let Err(e) = self.config.save() {
            log::error!("Failed to save config on exit: {e}");
        }
    }

    fn render(&mut self) {
        self.drain_completions();

        let Some(gfx) = self.gfx.as_mut() else {
            return;
        };

        let panel = &mut self.panel;
        let diagram = &mut self.diagram;
        let mut commands = Vec::new();

        gfx.render(|ctx| {
            commands = compose(ctx, panel, diagram);
        });

        self.handle_commands(commands);
    }
}

/// Lay out the frame: diagram region filling the space left of the panel,
/// chat panel at the right edge. No state crosses between them.
fn compose(ctx: &egui::Context, panel: &mut ChatPanel, diagram: &mut DiagramHost) -> Vec<Command> {
    let viewport = ctx.input(|i| i.viewport_rect());
    let diagram_width = (viewport.width() - panel.consumed_width()).max(0.0);

    egui::Area::new(egui::Id::new("diagram_region"))
        .fixed_pos(viewport.min)
        .order(egui::Order::Background)
        .show(ctx, |ui| {
            ui.set_min_width(diagram_width);
            ui.set_max_width(diagram_width);
            ui.set_min_height(viewport.height());
            ui.set_max_height(viewport.height());
            diagram.show(ui);
        });

    panel.show(ctx)
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            let window_attrs = Window::default_attributes()
                .with_title(&self.config.window_title)
                .with_inner_size(winit::dpi::LogicalSize::new(
                    self.config.window_width,
                    self.config.window_height,
                ))
                .with_min_inner_size(winit::dpi::LogicalSize::new(640, 400))
                .with_resizable(true);

            match event_loop.create_window(window_attrs) {
                Ok(window) => {
                    let window = Arc::new(window);
                    let runtime = Arc::clone(&self.runtime);
                    match runtime.block_on(Gfx::new(Arc::clone(&window))) {
                        Ok(gfx) => {
                            self.window = Some(window);
                            self.gfx = Some(gfx);
                        }
                        Err(e) => {
                            log::error!("Failed to initialize renderer: {e:#}");
                            event_loop.exit();
                        }
                    }
                }
                Err(e) => {
                    log::error!("Failed to create window: {e}");
                    event_loop.exit();
                }
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        // Let egui handle the event first (keyboard focus, pointer state).
        let mut repaint = false;
        if let (Some(gfx), Some(window)) = (self.gfx.as_mut(), self.window.as_ref()) {
            repaint = gfx.egui_state.on_window_event(window, &event).repaint;
        }

        match event {
            WindowEvent::CloseRequested => {
                self.save_geometry();
                event_loop.exit();
            }

            WindowEvent::Resized(new_size) => {
                if let Some(gfx) = self.gfx.as_mut() {
                    gfx.resize(new_size);
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }

            WindowEvent::RedrawRequested => {
                self.render();
            }

            _ => {}
        }

        if repaint && let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        // Harness aid: exit after the requested number of seconds.
        if let Some(exit_after) = self.options.exit_after {
            if self.started_at.elapsed().as_secs_f64() >= exit_after {
                log::info!("--exit-after {exit_after}s elapsed, exiting");
                self.save_geometry();
                event_loop.exit();
                return;
            }
            let deadline = self.started_at + std::time::Duration::from_secs_f64(exit_after);
            event_loop.set_control_flow(ControlFlow::WaitUntil(deadline));
        }

        // While a request is in flight, keep the thinking indicator
        // animating and catch completions even if the worker's redraw
        // races the wait. A hung backend with the timeout disabled leaves
        // loading true; that is surfaced by the indicator, not silently
        // recovered.
        if self.panel.state.loading {
            if let Some(window) = &self.window {
                window.request_redraw();
            }
            event_loop.set_control_flow(ControlFlow::WaitUntil(
                std::time::Instant::now() + LOADING_POLL,
            ));
        } else if self.options.exit_after.is_none() {
            event_loop.set_control_flow(ControlFlow::Wait);
        }
    }
}

/// Window graphics: wgpu surface plus the egui context, winit state, and
/// renderer for one window.
struct Gfx {
    window: Arc<Window>,
    #[allow(dead_code)]
    instance: wgpu::Instance,
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    surface_config: wgpu::SurfaceConfiguration,
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Gfx {
    async fn new(window: Arc<Window>) -> Result<Self> {
        let size = window.inner_size();

        // Platform-specific backend selection for better VM compatibility
        #[cfg(target_os = "windows")]
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::DX12,
            ..Default::default()
        });
        #[cfg(target_os = "macos")]
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        #[cfg(target_os = "linux")]
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::VULKAN | wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::LowPower,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("Failed to find suitable GPU adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor::default())
            .await?;

        let device = Arc::new(device);
        let queue = Arc::new(queue);

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let alpha_mode = if surface_caps
            .alpha_modes
            .contains(&wgpu::CompositeAlphaMode::Auto)
        {
            wgpu::CompositeAlphaMode::Auto
        } else {
            surface_caps.alpha_modes[0]
        };

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let scale_factor = window.scale_factor() as f32;
        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(scale_factor),
            None,
            None,
        );

        let egui_renderer = egui_wgpu::Renderer::new(
            &device,
            surface_format,
            egui_wgpu::RendererOptions {
                msaa_samples: 1,
                depth_stencil_format: None,
                dithering: false,
                predictable_texture_filtering: false,
            },
        );

        Ok(Self {
            window,
            instance,
            surface,
            device,
            queue,
            surface_config,
            egui_ctx,
            egui_state,
            egui_renderer,
        })
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.surface_config.width = new_size.width;
            self.surface_config.height = new_size.height;
            self.surface.configure(&self.device, &self.surface_config);
        }
    }

    /// Run one egui pass and present it.
    fn render(&mut self, build_ui: impl FnMut(&egui::Context)) {
        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(SurfaceError::Lost | SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.surface_config);
                return;
            }
            Err(SurfaceError::Timeout) => {
                log::warn!("Surface timeout");
                return;
            }
            Err(e) => {
                log::error!("Surface error: {:?}", e);
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let raw_input = self.egui_state.take_egui_input(&self.window);
        let egui_output = self.egui_ctx.run(raw_input, build_ui);

        // Manually handle clipboard copy as a fallback for platforms where
        // the window system intercepts the shortcut before egui sees it.
        for cmd in &egui_output.platform_output.commands {
            if let egui::OutputCommand::CopyText(text) = cmd
                && let Ok(mut clipboard) = arboard::Clipboard::new()
                && let Err(e) = clipboard.set_text(text)
            {
                log::warn!("Failed to copy to clipboard: {}", e);
            }
        }
        self.egui_state
            .handle_platform_output(&self.window, egui_output.platform_output.clone());

        let paint_jobs = self
            .egui_ctx
            .tessellate(egui_output.shapes, self.egui_ctx.pixels_per_point());

        for (id, delta) in &egui_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, delta);
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Main Window Encoder"),
            });

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.surface_config.width, self.surface_config.height],
            pixels_per_point: self.window.scale_factor() as f32,
        };

        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );

        {
            let render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Window Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.07,
                            g: 0.07,
                            b: 0.07,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            // Convert to 'static lifetime as required by egui_renderer.render()
            let mut render_pass = render_pass.forget_lifetime();

            self.egui_renderer
                .render(&mut render_pass, &paint_jobs, &screen_descriptor);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        for id in &egui_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        // egui-driven animations (text cursor, spinner) ask for an
        // immediate repaint through the viewport output.
        let wants_repaint = egui_output
            .viewport_output
            .get(&egui::ViewportId::ROOT)
            .is_some_and(|v| v.repaint_delay.is_zero());
        if wants_repaint {
            self.window.request_redraw();
        }
    }
}
