// =============================================================================
// QUAD RENDERER - Vulkan frame loop around a single indexed quad
// =============================================================================
//
// ARCHITECTURE OVERVIEW:
// ┌─────────────────────────────────────────────────────────────────┐
// │  winit event loop (window, input, redraw requests)              │
// │    └── Renderer                                                 │
// │          ├── SwapchainManager (swapchain, pipeline, framebuffers)│
// │          ├── CommandRecorder (one indexed draw)                 │
// │          └── FrameScheduler (fence + semaphores, one in flight) │
// │    └── VulkanDevice (instance, surface, device, queue)          │
// └─────────────────────────────────────────────────────────────────┘
//
// FRAME FLOW:
// 1. Wait for the previous frame's fence
// 2. Acquire swapchain image (recreate and skip the frame if stale)
// 3. Reset fence, record the command buffer
// 4. Submit, waiting on the acquire semaphore
// 5. Present, waiting on the render-complete semaphore
//
// =============================================================================

mod backend;
mod config;
mod renderer;

use anyhow::{Context, Result};
use ash::vk;
use backend::{FrameOutcome, Mesh, ShaderSet, VulkanDevice};
use config::Config;
use renderer::Renderer;
use std::sync::Arc;
use std::time::Instant;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Fullscreen, Window, WindowAttributes},
};

// =============================================================================
// ENTRY POINT
// =============================================================================

fn main() -> Result<()> {
    let (config, status) = Config::load();

    // Nothing logged before this point is seen
    init_logging(&config);
    status.log();
    log::debug!("Config: {:?}", config);
    log::info!("Starting quad renderer");
    log::info!(
        "Window: {}x{} ({})",
        config.window.width,
        config.window.height,
        if config.window.fullscreen { "fullscreen" } else { "windowed" }
    );

    let event_loop = EventLoop::new()?;
    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    match app.fatal.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// `debug.log_level` sets the default, `RUST_LOG` still overrides it
fn init_logging(config: &Config) {
    use env_logger::Builder;

    let mut builder = Builder::new();
    builder.filter_level(config.debug.level_filter());
    builder.parse_default_env();
    builder.init();
}

// =============================================================================
// APPLICATION STATE
// =============================================================================

struct App {
    // ─────────────────────────────────────────────────────────────────────────
    // GPU (dropped in this order: renderer, device, window)
    // ─────────────────────────────────────────────────────────────────────────
    renderer: Option<Renderer<VulkanDevice>>,
    device: Option<Arc<VulkanDevice>>,
    window: Option<Arc<Window>>,

    // ─────────────────────────────────────────────────────────────────────────
    // LOOP STATE
    // ─────────────────────────────────────────────────────────────────────────
    /// Checked at the top of every frame, never mid-frame
    closing: bool,
    is_fullscreen: bool,
    /// First fatal error, reported from `main`
    fatal: Option<anyhow::Error>,

    // ─────────────────────────────────────────────────────────────────────────
    // FPS TRACKING
    // ─────────────────────────────────────────────────────────────────────────
    frame_count: u32,
    last_frame_time: Instant,
    last_fps_update: Instant,

    config: Config,
}

impl App {
    fn new(config: Config) -> Self {
        let now = Instant::now();
        Self {
            renderer: None,
            device: None,
            window: None,
            closing: false,
            is_fullscreen: config.window.fullscreen,
            fatal: None,
            frame_count: 0,
            last_frame_time: now,
            last_fps_update: now,
            config,
        }
    }

    /// Device -> shaders -> renderer
    fn init_vulkan(&mut self, window: &Window) -> Result<()> {
        let validation = self.config.debug.validation_layers && cfg!(debug_assertions);
        let device = VulkanDevice::new(&self.config.window.title, validation, window)?;

        let shaders = ShaderSet::load(
            device.clone(),
            &self.config.shaders.vertex,
            &self.config.shaders.fragment,
        )
        .context("Failed to load shaders")?;

        let size = window.inner_size();
        let renderer = Renderer::new(
            device.clone(),
            shaders,
            &Mesh::quad(),
            self.config.frame.settings(),
            vk::Extent2D {
                width: size.width,
                height: size.height,
            },
        )?;

        self.renderer = Some(renderer);
        self.device = Some(device);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("Fatal: {:#}", error);
        if self.fatal.is_none() {
            self.fatal = Some(error);
        }
        self.closing = true;
        event_loop.exit();
    }

    /// Drain the queue, then release GPU objects before the device and window
    fn shutdown(&mut self) {
        if let Some(renderer) = self.renderer.take() {
            if let Err(e) = renderer.drain() {
                log::error!("Failed to drain queue on exit: {:#}", e);
            }
        }
        self.device = None;
        self.window = None;
    }

    // =========================================================================
    // FULLSCREEN TOGGLE
    // =========================================================================

    fn toggle_fullscreen(&mut self) {
        if let Some(ref window) = self.window {
            self.is_fullscreen = !self.is_fullscreen;

            if self.is_fullscreen {
                window.set_fullscreen(Some(Fullscreen::Borderless(None)));
                log::info!("Entered fullscreen mode");
            } else {
                window.set_fullscreen(None);
                log::info!("Exited fullscreen mode");
            }

            // A Resized event usually follows; this covers platforms where it doesn't
            let size = window.inner_size();
            if let Some(renderer) = self.renderer.as_mut() {
                renderer.resize(size.width, size.height);
            }
        }
    }

    // =========================================================================
    // FPS TRACKING
    // =========================================================================

    fn update_fps(&mut self) {
        if !self.config.debug.show_fps {
            return;
        }

        let now = Instant::now();
        let frame_time = now.duration_since(self.last_frame_time).as_secs_f32();
        self.last_frame_time = now;
        self.frame_count += 1;

        // Update title every second
        let elapsed = now.duration_since(self.last_fps_update).as_secs_f32();
        if elapsed >= 1.0 {
            let fps = self.frame_count as f32 / elapsed;

            let total = self.renderer.as_ref().map_or(0, |r| r.frames());
            if let Some(ref window) = self.window {
                window.set_title(&format!(
                    "{} - {:.0} FPS ({:.2}ms) - frame {}",
                    self.config.window.title,
                    fps,
                    frame_time * 1000.0,
                    total
                ));
            }

            self.frame_count = 0;
            self.last_fps_update = now;
        }
    }
}

// =============================================================================
// EVENT HANDLING
// =============================================================================

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let mut window_attributes = WindowAttributes::default()
            .with_title(&self.config.window.title)
            .with_inner_size(winit::dpi::PhysicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));

        if self.config.window.fullscreen {
            window_attributes = window_attributes.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                self.fail(event_loop, anyhow::anyhow!("Failed to create window: {}", e));
                return;
            }
        };

        if let Err(e) = self.init_vulkan(&window) {
            self.fail(event_loop, e.context("Failed to initialize Vulkan"));
            return;
        }

        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        match event {
            // ─────────────────────────────────────────────────────────────────
            // CLOSE REQUEST
            // ─────────────────────────────────────────────────────────────────
            WindowEvent::CloseRequested => {
                log::info!("Close requested, shutting down...");
                self.closing = true;
                event_loop.exit();
            }

            // ─────────────────────────────────────────────────────────────────
            // WINDOW RESIZED (zero size = minimized)
            // ─────────────────────────────────────────────────────────────────
            WindowEvent::Resized(size) => {
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.resize(size.width, size.height);
                }
            }

            // ─────────────────────────────────────────────────────────────────
            // REDRAW REQUESTED
            // ─────────────────────────────────────────────────────────────────
            WindowEvent::RedrawRequested => {
                if self.closing {
                    return;
                }
                let Some(renderer) = self.renderer.as_mut() else {
                    return;
                };

                match renderer.render_frame() {
                    Ok(Some(FrameOutcome::Presented { .. })) => self.update_fps(),
                    Ok(Some(FrameOutcome::Recreated | FrameOutcome::Deferred)) | Ok(None) => {}
                    Err(e) => self.fail(event_loop, e),
                }
            }

            // ─────────────────────────────────────────────────────────────────
            // KEYBOARD INPUT
            // ─────────────────────────────────────────────────────────────────
            WindowEvent::KeyboardInput { event, .. } => {
                use winit::keyboard::{KeyCode, PhysicalKey};

                if event.state.is_pressed() {
                    if let PhysicalKey::Code(key) = event.physical_key {
                        match key {
                            KeyCode::Escape => {
                                log::info!("ESC pressed, exiting...");
                                self.closing = true;
                                event_loop.exit();
                            }
                            KeyCode::F11 => {
                                self.toggle_fullscreen();
                            }
                            _ => {}
                        }
                    }
                }
            }

            _ => {}
        }
    }

    /// Continuous redraws: the frame loop is paced by the present mode
    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if self.closing {
            return;
        }
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shutdown();
    }
}

// =============================================================================
// CLEANUP
// =============================================================================

impl Drop for App {
    fn drop(&mut self) {
        self.shutdown();
        log::info!("Cleanup complete");
    }
}
