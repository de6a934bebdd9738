// Renderer - ties the backend together
//
// Construction is an ordered pipeline: every stage consumes only what earlier
// stages produced.
//
//   shaders -> allocator -> geometry -> swapchain -> recorder -> scheduler
//
// Fields are declared in reverse of that order so that dropping the renderer
// releases everything in reverse creation order.

use anyhow::{Context, Result};
use ash::vk;
use std::sync::Arc;
use crate::backend::{
    CommandRecorder, FrameOutcome, FrameScheduler, FrameSettings, GeometryBuffers, Gpu,
    MemoryAllocator, Mesh, ShaderSet, SwapchainManager, Vertex,
};

pub struct Renderer<G: Gpu> {
    scheduler: FrameScheduler<G>,
    recorder: CommandRecorder,
    swapchain: SwapchainManager<G>,
    _geometry: GeometryBuffers<G>,
    window_extent: vk::Extent2D,
    /// Window changed size since the swapchain was built
    resized: bool,
}

impl<G: Gpu> Renderer<G> {
    pub fn new(
        gpu: Arc<G>,
        shaders: ShaderSet<G>,
        mesh: &Mesh,
        settings: FrameSettings,
        window_extent: vk::Extent2D,
    ) -> Result<Self> {
        let allocator = MemoryAllocator::new(gpu.clone());
        let geometry = GeometryBuffers::upload(&allocator, mesh)
            .context("Failed to upload geometry")?;

        let swapchain = SwapchainManager::create(gpu.clone(), shaders, Vertex::layout(), window_extent)
            .context("Failed to create swapchain")?;

        let recorder = CommandRecorder::new(&geometry);
        let scheduler = FrameScheduler::new(gpu, settings)
            .context("Failed to create frame scheduler")?;

        log::info!("Renderer ready: {} indices per frame", recorder.index_count());

        Ok(Self {
            scheduler,
            recorder,
            swapchain,
            _geometry: geometry,
            window_extent,
            resized: false,
        })
    }

    /// Render and present one frame.
    ///
    /// Returns `None` while the window has no area, and
    /// `Some(FrameOutcome::Deferred)` while the surface reports none.
    pub fn render_frame(&mut self) -> Result<Option<FrameOutcome>> {
        if self.window_extent.width == 0 || self.window_extent.height == 0 {
            return Ok(None);
        }

        if self.resized {
            self.swapchain.set_window_extent(self.window_extent);
            self.swapchain.recreate()?;
            self.resized = false;
        }

        self.scheduler
            .run_frame(&mut self.swapchain, &self.recorder)
            .map(Some)
    }

    /// Record a new window size; the swapchain is rebuilt before the next frame
    pub fn resize(&mut self, width: u32, height: u32) {
        let extent = vk::Extent2D { width, height };
        if extent != self.window_extent {
            log::debug!("Window resized to {}x{}", width, height);
            self.window_extent = extent;
            self.resized = true;
        }
    }

    pub fn frames(&self) -> u64 {
        self.scheduler.frames()
    }

    /// Wait for all submitted work; call before tearing down the window
    pub fn drain(&self) -> Result<()> {
        self.scheduler.drain()
    }
}

impl<G: Gpu> Drop for Renderer<G> {
    fn drop(&mut self) {
        // Nothing may be destroyed while the GPU can still reference it
        if let Err(e) = self.drain() {
            log::error!("Failed to drain queue before teardown: {:#}", e);
        }
    }
}
