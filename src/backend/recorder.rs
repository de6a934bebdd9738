// Per-frame command recording
//
// The command buffer is re-recorded from scratch every frame, so nothing here
// caches swapchain-dependent handles: the framebuffer, render pass and
// pipeline are passed in through `DrawTarget`.

use anyhow::{Context, Result};
use ash::vk;
use super::geometry::GeometryBuffers;
use super::gpu::{Gpu, RenderPassBegin};

pub const CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// Swapchain-dependent handles for one frame
#[derive(Debug, Clone, Copy)]
pub struct DrawTarget {
    pub render_pass: vk::RenderPass,
    pub framebuffer: vk::Framebuffer,
    pub pipeline: vk::Pipeline,
    pub extent: vk::Extent2D,
}

/// Records the indexed draw of the static geometry
#[derive(Debug, Clone, Copy)]
pub struct CommandRecorder {
    vertex_buffer: vk::Buffer,
    index_buffer: vk::Buffer,
    index_count: u32,
}

impl CommandRecorder {
    pub fn new<G: Gpu>(geometry: &GeometryBuffers<G>) -> Self {
        Self {
            vertex_buffer: geometry.vertex.buffer,
            index_buffer: geometry.index.buffer,
            index_count: geometry.index_count,
        }
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Reset `cmd` and record one full-screen clear plus the indexed draw.
    ///
    /// The command buffer must not be pending execution.
    pub fn record<G: Gpu>(&self, gpu: &G, cmd: vk::CommandBuffer, target: &DrawTarget) -> Result<()> {
        gpu.reset_command_buffer(cmd)
            .context("Failed to reset command buffer")?;
        gpu.begin_command_buffer(cmd, vk::CommandBufferUsageFlags::empty())
            .context("Failed to begin command buffer")?;

        gpu.cmd_begin_render_pass(
            cmd,
            &RenderPassBegin {
                render_pass: target.render_pass,
                framebuffer: target.framebuffer,
                extent: target.extent,
                clear_color: CLEAR_COLOR,
            },
        );
        gpu.cmd_bind_pipeline(cmd, target.pipeline);
        gpu.cmd_bind_vertex_buffer(cmd, self.vertex_buffer);
        gpu.cmd_bind_index_buffer(cmd, self.index_buffer, vk::IndexType::UINT32);
        gpu.cmd_draw_indexed(cmd, self.index_count);
        gpu.cmd_end_render_pass(cmd);

        gpu.end_command_buffer(cmd)
            .context("Failed to end command buffer")?;
        Ok(())
    }
}
