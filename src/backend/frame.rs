// Frame scheduling - one frame in flight
//
// Per iteration:
//   wait fence -> acquire -> reset fence -> record -> submit -> present
//
// The fence is only reset once an image has actually been acquired. A stale
// acquire (suboptimal or out of date) recreates the swapchain and ends the
// iteration without submitting anything, leaving the fence signaled for the
// next wait. While the surface has no area the swapchain stays unbuilt and
// every iteration only retries the recreate.

use anyhow::{anyhow, Context, Result};
use ash::vk;
use std::sync::Arc;
use super::error::BackendError;
use super::gpu::{Gpu, Submission};
use super::recorder::{CommandRecorder, DrawTarget};
use super::swapchain::SwapchainManager;
use super::sync::FrameSync;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSettings {
    pub fence_timeout_ns: u64,
    pub acquire_timeout_ns: u64,
}

impl Default for FrameSettings {
    fn default() -> Self {
        Self {
            fence_timeout_ns: 1_000_000_000,
            acquire_timeout_ns: 1_000_000_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    Idle,
    Acquiring,
    Acquired,
    Rendering,
    Presenting,
}

/// Everything the render and present stages need to know about the acquired image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameContext {
    pub image_index: u32,
    pub framebuffer: vk::Framebuffer,
    pub extent: vk::Extent2D,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquire {
    Ready(FrameContext),
    /// Swapchain was recreated; nothing to render this iteration
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Presented { image_index: u32 },
    Recreated,
    /// Surface has no area; nothing was acquired or submitted
    Deferred,
}

pub struct FrameScheduler<G: Gpu> {
    sync: FrameSync<G>,
    command_pool: vk::CommandPool,
    command_buffer: vk::CommandBuffer,
    settings: FrameSettings,
    state: FrameState,
    frames: u64,
    gpu: Arc<G>,
}

impl<G: Gpu> FrameScheduler<G> {
    pub fn new(gpu: Arc<G>, settings: FrameSettings) -> Result<Self> {
        let sync = FrameSync::new(gpu.clone())?;

        // The frame command buffer is reset and re-recorded every frame
        let command_pool = gpu
            .create_command_pool(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER)
            .context("Failed to create command pool")?;
        let command_buffer = match gpu.allocate_command_buffer(command_pool) {
            Ok(cmd) => cmd,
            Err(e) => {
                gpu.destroy_command_pool(command_pool);
                return Err(e).context("Failed to allocate command buffer");
            }
        };

        Ok(Self {
            sync,
            command_pool,
            command_buffer,
            settings,
            state: FrameState::Idle,
            frames: 0,
            gpu,
        })
    }

    #[cfg(test)]
    pub fn state(&self) -> FrameState {
        self.state
    }

    /// Frames submitted so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Run one acquire/render/present iteration.
    ///
    /// Returns `Recreated` when the swapchain had to be rebuilt before
    /// anything was submitted. Every error is fatal.
    pub fn run_frame(
        &mut self,
        swapchain: &mut SwapchainManager<G>,
        recorder: &CommandRecorder,
    ) -> Result<FrameOutcome> {
        if !swapchain.is_ready() {
            swapchain.recreate()?;
            if !swapchain.is_ready() {
                return Ok(FrameOutcome::Deferred);
            }
        }

        self.transition(FrameState::Acquiring);
        self.wait_for_previous_frame()?;

        let frame = match self.acquire(swapchain)? {
            Acquire::Ready(frame) => frame,
            Acquire::Stale => {
                self.transition(FrameState::Idle);
                return Ok(FrameOutcome::Recreated);
            }
        };
        self.transition(FrameState::Acquired);

        self.gpu
            .reset_fence(self.sync.fence)
            .context("Failed to reset frame fence")?;

        self.transition(FrameState::Rendering);
        let target = DrawTarget {
            render_pass: swapchain.render_pass(),
            framebuffer: frame.framebuffer,
            pipeline: swapchain.pipeline(),
            extent: frame.extent,
        };
        recorder.record(self.gpu.as_ref(), self.command_buffer, &target)?;
        self.submit()?;

        self.transition(FrameState::Presenting);
        self.present(swapchain, &frame)?;

        self.transition(FrameState::Idle);
        self.frames += 1;
        Ok(FrameOutcome::Presented { image_index: frame.image_index })
    }

    /// Block until the GPU is done with everything submitted so far
    pub fn drain(&self) -> Result<()> {
        self.gpu
            .queue_wait_idle()
            .context("Failed to drain graphics queue")
    }

    fn wait_for_previous_frame(&self) -> Result<()> {
        match self.gpu.wait_for_fence(self.sync.fence, self.settings.fence_timeout_ns) {
            Ok(()) => Ok(()),
            Err(vk::Result::TIMEOUT) => Err(BackendError::FenceTimeout {
                timeout_ns: self.settings.fence_timeout_ns,
            }
            .into()),
            Err(e) => Err(e).context("Failed to wait for frame fence"),
        }
    }

    fn acquire(&mut self, swapchain: &mut SwapchainManager<G>) -> Result<Acquire> {
        let result = self.gpu.acquire_next_image(
            swapchain.handle(),
            self.settings.acquire_timeout_ns,
            self.sync.acquire,
        );

        match result {
            Ok((image_index, false)) => {
                let framebuffer = swapchain
                    .framebuffer(image_index)
                    .ok_or_else(|| anyhow!("Acquired image index {} out of range", image_index))?;
                Ok(Acquire::Ready(FrameContext {
                    image_index,
                    framebuffer,
                    extent: swapchain.extent,
                }))
            }
            Ok((_, true)) => {
                log::debug!("Swapchain suboptimal on acquire, recreating");
                swapchain.recreate()?;
                // The acquire signaled the semaphore and nothing will wait on it
                self.sync.replace_acquire()?;
                Ok(Acquire::Stale)
            }
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                log::debug!("Swapchain out of date on acquire, recreating");
                swapchain.recreate()?;
                Ok(Acquire::Stale)
            }
            Err(e) => Err(BackendError::AcquireFailed(e).into()),
        }
    }

    fn submit(&self) -> Result<()> {
        let submission = Submission {
            command_buffer: self.command_buffer,
            wait: Some((
                self.sync.acquire,
                vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
            )),
            signal: Some(self.sync.render_complete),
            fence: self.sync.fence,
        };
        self.gpu
            .queue_submit(&submission)
            .map_err(BackendError::SubmitFailed)?;
        Ok(())
    }

    fn present(&self, swapchain: &SwapchainManager<G>, frame: &FrameContext) -> Result<()> {
        let result = self.gpu.queue_present(
            swapchain.handle(),
            frame.image_index,
            self.sync.render_complete,
        );

        // Staleness reported here shows up again on the next acquire
        match result {
            Ok(false) => Ok(()),
            Ok(true) => {
                log::debug!("Swapchain suboptimal on present");
                Ok(())
            }
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                log::debug!("Swapchain out of date on present");
                Ok(())
            }
            Err(e) => Err(BackendError::PresentFailed(e).into()),
        }
    }

    fn transition(&mut self, next: FrameState) {
        log::trace!("Frame {}: {:?} -> {:?}", self.frames, self.state, next);
        self.state = next;
    }
}

impl<G: Gpu> Drop for FrameScheduler<G> {
    fn drop(&mut self) {
        // Frees the command buffer with it; sync objects drop afterwards
        self.gpu.destroy_command_pool(self.command_pool);
    }
}
