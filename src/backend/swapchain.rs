// Swapchain - Window presentation
//
// Owns the swapchain and everything derived from it: one image view and one
// framebuffer per image, plus the render pass/pipeline built for its format
// and extent. Recreation tears all of it down and builds it again from the
// current surface state. While the surface reports no area nothing is built
// and the manager stays unready until a later recreate finds a usable extent.

use anyhow::{Context, Result};
use ash::vk;
use std::sync::Arc;
use super::error::BackendError;
use super::gpu::{Gpu, SwapchainDesc, VertexLayout};
use super::pipeline::PipelineSet;
use super::shader::ShaderSet;

/// Per-image objects, index-aligned with the swapchain images
struct SwapchainImages {
    images: Vec<vk::Image>,
    views: Vec<vk::ImageView>,
    framebuffers: Vec<vk::Framebuffer>,
}

pub struct SwapchainManager<G: Gpu> {
    swapchain: vk::SwapchainKHR,
    targets: SwapchainImages,
    pipeline: Option<PipelineSet<G>>,
    pub format: vk::SurfaceFormatKHR,
    pub present_mode: vk::PresentModeKHR,
    pub extent: vk::Extent2D,
    shaders: ShaderSet<G>,
    vertex_layout: VertexLayout,
    /// Used only when the surface leaves the extent up to us
    window_extent: vk::Extent2D,
    gpu: Arc<G>,
}

impl<G: Gpu> SwapchainManager<G> {
    pub fn create(
        gpu: Arc<G>,
        shaders: ShaderSet<G>,
        vertex_layout: VertexLayout,
        window_extent: vk::Extent2D,
    ) -> Result<Self> {
        let mut manager = Self {
            swapchain: vk::SwapchainKHR::null(),
            targets: SwapchainImages {
                images: Vec::new(),
                views: Vec::new(),
                framebuffers: Vec::new(),
            },
            pipeline: None,
            format: vk::SurfaceFormatKHR::default(),
            present_mode: vk::PresentModeKHR::FIFO,
            extent: vk::Extent2D::default(),
            shaders,
            vertex_layout,
            window_extent,
            gpu,
        };
        manager.build()?;
        Ok(manager)
    }

    pub fn handle(&self) -> vk::SwapchainKHR {
        self.swapchain
    }

    /// False while the surface has no area and nothing has been built
    pub fn is_ready(&self) -> bool {
        self.swapchain != vk::SwapchainKHR::null()
    }

    pub fn image_count(&self) -> usize {
        self.targets.images.len()
    }

    pub fn framebuffer(&self, image_index: u32) -> Option<vk::Framebuffer> {
        self.targets.framebuffers.get(image_index as usize).copied()
    }

    #[cfg(test)]
    pub fn framebuffers(&self) -> &[vk::Framebuffer] {
        &self.targets.framebuffers
    }

    pub fn render_pass(&self) -> vk::RenderPass {
        self.pipeline.as_ref().map_or(vk::RenderPass::null(), |p| p.render_pass)
    }

    pub fn pipeline(&self) -> vk::Pipeline {
        self.pipeline.as_ref().map_or(vk::Pipeline::null(), |p| p.pipeline)
    }

    pub fn set_window_extent(&mut self, extent: vk::Extent2D) {
        self.window_extent = extent;
    }

    /// Tear everything down and build it again against the current surface.
    ///
    /// Waits for the device to go idle first: the old framebuffers may still
    /// be referenced by presentation.
    pub fn recreate(&mut self) -> Result<()> {
        self.gpu
            .device_wait_idle()
            .context("Failed to wait for device before swapchain recreation")?;

        self.destroy();
        self.build()?;
        if !self.is_ready() {
            return Ok(());
        }

        log::info!(
            "Recreated swapchain: {} images, {:?}, {}x{}",
            self.image_count(),
            self.format.format,
            self.extent.width,
            self.extent.height
        );
        Ok(())
    }

    fn build(&mut self) -> Result<()> {
        let support = self
            .gpu
            .surface_support()
            .context("Failed to query surface capabilities")?;
        let caps = support.capabilities;

        // First available, no ranking
        let format = *support.formats.first().ok_or(BackendError::NoSurfaceFormat)?;
        let present_mode = *support
            .present_modes
            .first()
            .ok_or(BackendError::NoPresentMode)?;

        let extent = if caps.current_extent.width != u32::MAX {
            caps.current_extent
        } else {
            vk::Extent2D {
                width: self.window_extent.width.clamp(
                    caps.min_image_extent.width,
                    caps.max_image_extent.width,
                ),
                height: self.window_extent.height.clamp(
                    caps.min_image_extent.height,
                    caps.max_image_extent.height,
                ),
            }
        };

        // Minimized: Vulkan forbids zero-sized swapchain images
        if extent.width == 0 || extent.height == 0 {
            log::debug!("Surface has no area, deferring swapchain creation");
            self.extent = extent;
            return Ok(());
        }

        let mut image_count = caps.min_image_count + 1;
        if caps.max_image_count > 0 && image_count > caps.max_image_count {
            image_count = caps.max_image_count;
        }

        let desc = SwapchainDesc {
            min_image_count: image_count,
            format,
            present_mode,
            extent,
            pre_transform: caps.current_transform,
        };
        self.swapchain = self
            .gpu
            .create_swapchain(&desc)
            .context("Failed to create swapchain")?;
        self.format = format;
        self.present_mode = present_mode;
        self.extent = extent;

        self.targets.images = self
            .gpu
            .swapchain_images(self.swapchain)
            .context("Failed to get swapchain images")?;

        // Render pass first: framebuffers are created against it
        self.pipeline = Some(PipelineSet::new(
            self.gpu.clone(),
            &self.shaders,
            &self.vertex_layout,
            format.format,
            extent,
        )?);
        let render_pass = self.render_pass();

        for &image in &self.targets.images {
            let view = self
                .gpu
                .create_image_view(image, format.format)
                .context("Failed to create image view")?;
            self.targets.views.push(view);

            let framebuffer = self
                .gpu
                .create_framebuffer(render_pass, view, extent)
                .context("Failed to create framebuffer")?;
            self.targets.framebuffers.push(framebuffer);
        }

        log::info!(
            "Created swapchain with {} images ({:?}, {:?}, {}x{})",
            self.targets.images.len(),
            format.format,
            present_mode,
            extent.width,
            extent.height
        );
        Ok(())
    }

    /// Framebuffers, views, swapchain, then render pass/pipeline.
    /// Safe to call on a partially built manager.
    fn destroy(&mut self) {
        for framebuffer in self.targets.framebuffers.drain(..) {
            self.gpu.destroy_framebuffer(framebuffer);
        }
        for view in self.targets.views.drain(..) {
            self.gpu.destroy_image_view(view);
        }
        self.targets.images.clear();

        if self.swapchain != vk::SwapchainKHR::null() {
            self.gpu.destroy_swapchain(self.swapchain);
            self.swapchain = vk::SwapchainKHR::null();
        }

        self.pipeline = None;
    }
}

impl<G: Gpu> Drop for SwapchainManager<G> {
    fn drop(&mut self) {
        self.destroy();
    }
}
