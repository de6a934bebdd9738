// Synchronization primitives for the single in-flight frame
//
// fence:          GPU -> CPU, "the previous frame's command buffer is free again"
// acquire:        presentation engine -> graphics queue, "image is ready"
// render_complete: graphics queue -> presentation engine, "image is drawn"

use ash::vk;
use anyhow::{Context, Result};
use std::sync::Arc;
use super::gpu::Gpu;

pub struct FrameSync<G: Gpu> {
    pub fence: vk::Fence,
    pub acquire: vk::Semaphore,
    pub render_complete: vk::Semaphore,
    gpu: Arc<G>,
}

impl<G: Gpu> FrameSync<G> {
    pub fn new(gpu: Arc<G>) -> Result<Self> {
        // Start signaled so the first wait returns immediately
        let fence = gpu.create_fence(true).context("Failed to create frame fence")?;
        let acquire = gpu.create_semaphore().context("Failed to create acquire semaphore")?;
        let render_complete = gpu
            .create_semaphore()
            .context("Failed to create render-complete semaphore")?;

        Ok(Self {
            fence,
            acquire,
            render_complete,
            gpu,
        })
    }

    /// Swap the acquire semaphore for a fresh one.
    ///
    /// Needed after an acquire that returned an image whose semaphore signal
    /// is never waited on. The device must be idle.
    pub fn replace_acquire(&mut self) -> Result<()> {
        let fresh = self
            .gpu
            .create_semaphore()
            .context("Failed to create acquire semaphore")?;
        self.gpu.destroy_semaphore(self.acquire);
        self.acquire = fresh;
        Ok(())
    }
}

impl<G: Gpu> Drop for FrameSync<G> {
    fn drop(&mut self) {
        self.gpu.destroy_semaphore(self.acquire);
        self.gpu.destroy_semaphore(self.render_complete);
        self.gpu.destroy_fence(self.fence);
    }
}
