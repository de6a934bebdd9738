// GPU seam - the device layer the frame core talks to
//
// Everything above this trait (allocator, uploader, swapchain manager,
// scheduler, recorder) is written against `Gpu` instead of `ash::Device`
// directly. `VulkanDevice` is the real implementation; tests use `MockGpu`.
//
// Handles are plain `vk::*` values and results are `VkResult`, so callers can
// match on `vk::Result` codes exactly as they would against raw ash.

use ash::prelude::VkResult;
use ash::vk;

/// Surface properties queried before (re)creating a swapchain
#[derive(Debug, Clone, Default)]
pub struct SurfaceSupport {
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    pub formats: Vec<vk::SurfaceFormatKHR>,
    pub present_modes: Vec<vk::PresentModeKHR>,
}

/// Everything needed to create a swapchain against the device's surface
#[derive(Debug, Clone, Copy)]
pub struct SwapchainDesc {
    pub min_image_count: u32,
    pub format: vk::SurfaceFormatKHR,
    pub present_mode: vk::PresentModeKHR,
    pub extent: vk::Extent2D,
    pub pre_transform: vk::SurfaceTransformFlagsKHR,
}

/// Vertex buffer layout consumed by pipeline creation
#[derive(Debug, Clone)]
pub struct VertexLayout {
    pub bindings: Vec<vk::VertexInputBindingDescription>,
    pub attributes: Vec<vk::VertexInputAttributeDescription>,
}

/// Graphics pipeline description. Viewport and scissor are baked in from `extent`.
#[derive(Debug, Clone)]
pub struct PipelineDesc<'a> {
    pub render_pass: vk::RenderPass,
    pub extent: vk::Extent2D,
    pub vertex_shader: vk::ShaderModule,
    pub fragment_shader: vk::ShaderModule,
    pub vertex_layout: &'a VertexLayout,
}

/// Render pass begin parameters for a single-attachment pass
#[derive(Debug, Clone, Copy)]
pub struct RenderPassBegin {
    pub render_pass: vk::RenderPass,
    pub framebuffer: vk::Framebuffer,
    pub extent: vk::Extent2D,
    pub clear_color: [f32; 4],
}

/// One command buffer submission with optional synchronization.
///
/// `wait` pairs the semaphore with the stage that must not run before it is
/// signaled. A null `fence` means no CPU-visible completion signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Submission {
    pub command_buffer: vk::CommandBuffer,
    pub wait: Option<(vk::Semaphore, vk::PipelineStageFlags)>,
    pub signal: Option<vk::Semaphore>,
    pub fence: vk::Fence,
}

impl Submission {
    /// Submission without any semaphores or fence (setup-time transfers)
    pub fn unsynchronized(command_buffer: vk::CommandBuffer) -> Self {
        Self {
            command_buffer,
            wait: None,
            signal: None,
            fence: vk::Fence::null(),
        }
    }
}

/// Device, queue, surface and pipeline capabilities used by the frame core.
///
/// Destroy/free methods are infallible, like their Vulkan counterparts.
/// Callers are responsible for making sure the GPU is no longer using
/// a handle when they destroy it.
pub trait Gpu {
    // ─────────────────────────────────────────────────────────────────────────
    // DEVICE & QUEUE
    // ─────────────────────────────────────────────────────────────────────────
    fn memory_types(&self) -> Vec<vk::MemoryType>;
    fn device_wait_idle(&self) -> VkResult<()>;
    fn queue_wait_idle(&self) -> VkResult<()>;
    fn queue_submit(&self, submission: &Submission) -> VkResult<()>;

    // ─────────────────────────────────────────────────────────────────────────
    // BUFFERS & MEMORY
    // ─────────────────────────────────────────────────────────────────────────
    fn create_buffer(
        &self,
        size: vk::DeviceSize,
        usage: vk::BufferUsageFlags,
    ) -> VkResult<vk::Buffer>;
    fn buffer_memory_requirements(&self, buffer: vk::Buffer) -> vk::MemoryRequirements;
    fn allocate_memory(
        &self,
        size: vk::DeviceSize,
        memory_type_index: u32,
    ) -> VkResult<vk::DeviceMemory>;
    fn bind_buffer_memory(&self, buffer: vk::Buffer, memory: vk::DeviceMemory) -> VkResult<()>;
    /// Map, copy `data` at offset 0, flush the mapped range, unmap
    fn write_mapped(&self, memory: vk::DeviceMemory, data: &[u8]) -> VkResult<()>;
    /// Map, invalidate the mapped range, copy `len` bytes out, unmap
    #[cfg(test)]
    fn read_mapped(&self, memory: vk::DeviceMemory, len: usize) -> VkResult<Vec<u8>>;
    fn destroy_buffer(&self, buffer: vk::Buffer);
    fn free_memory(&self, memory: vk::DeviceMemory);

    // ─────────────────────────────────────────────────────────────────────────
    // COMMANDS
    // ─────────────────────────────────────────────────────────────────────────
    fn create_command_pool(&self, flags: vk::CommandPoolCreateFlags) -> VkResult<vk::CommandPool>;
    fn allocate_command_buffer(&self, pool: vk::CommandPool) -> VkResult<vk::CommandBuffer>;
    fn destroy_command_pool(&self, pool: vk::CommandPool);
    fn reset_command_buffer(&self, cmd: vk::CommandBuffer) -> VkResult<()>;
    fn begin_command_buffer(
        &self,
        cmd: vk::CommandBuffer,
        flags: vk::CommandBufferUsageFlags,
    ) -> VkResult<()>;
    fn end_command_buffer(&self, cmd: vk::CommandBuffer) -> VkResult<()>;
    fn cmd_copy_buffer(
        &self,
        cmd: vk::CommandBuffer,
        src: vk::Buffer,
        dst: vk::Buffer,
        size: vk::DeviceSize,
    );
    fn cmd_begin_render_pass(&self, cmd: vk::CommandBuffer, begin: &RenderPassBegin);
    fn cmd_bind_pipeline(&self, cmd: vk::CommandBuffer, pipeline: vk::Pipeline);
    fn cmd_bind_vertex_buffer(&self, cmd: vk::CommandBuffer, buffer: vk::Buffer);
    fn cmd_bind_index_buffer(
        &self,
        cmd: vk::CommandBuffer,
        buffer: vk::Buffer,
        index_type: vk::IndexType,
    );
    fn cmd_draw_indexed(&self, cmd: vk::CommandBuffer, index_count: u32);
    fn cmd_end_render_pass(&self, cmd: vk::CommandBuffer);

    // ─────────────────────────────────────────────────────────────────────────
    // SYNCHRONIZATION
    // ─────────────────────────────────────────────────────────────────────────
    fn create_fence(&self, signaled: bool) -> VkResult<vk::Fence>;
    fn create_semaphore(&self) -> VkResult<vk::Semaphore>;
    /// Returns `Err(vk::Result::TIMEOUT)` when the fence is still unsignaled after `timeout_ns`
    fn wait_for_fence(&self, fence: vk::Fence, timeout_ns: u64) -> VkResult<()>;
    fn reset_fence(&self, fence: vk::Fence) -> VkResult<()>;
    fn destroy_fence(&self, fence: vk::Fence);
    fn destroy_semaphore(&self, semaphore: vk::Semaphore);

    // ─────────────────────────────────────────────────────────────────────────
    // PRESENTATION
    // ─────────────────────────────────────────────────────────────────────────
    fn surface_support(&self) -> VkResult<SurfaceSupport>;
    fn create_swapchain(&self, desc: &SwapchainDesc) -> VkResult<vk::SwapchainKHR>;
    fn swapchain_images(&self, swapchain: vk::SwapchainKHR) -> VkResult<Vec<vk::Image>>;
    fn destroy_swapchain(&self, swapchain: vk::SwapchainKHR);
    fn create_image_view(&self, image: vk::Image, format: vk::Format) -> VkResult<vk::ImageView>;
    fn destroy_image_view(&self, view: vk::ImageView);
    fn create_framebuffer(
        &self,
        render_pass: vk::RenderPass,
        view: vk::ImageView,
        extent: vk::Extent2D,
    ) -> VkResult<vk::Framebuffer>;
    fn destroy_framebuffer(&self, framebuffer: vk::Framebuffer);
    /// `Ok((index, true))` means the image was acquired but the swapchain is suboptimal
    fn acquire_next_image(
        &self,
        swapchain: vk::SwapchainKHR,
        timeout_ns: u64,
        semaphore: vk::Semaphore,
    ) -> VkResult<(u32, bool)>;
    /// `Ok(true)` means presented but suboptimal
    fn queue_present(
        &self,
        swapchain: vk::SwapchainKHR,
        image_index: u32,
        wait_semaphore: vk::Semaphore,
    ) -> VkResult<bool>;

    // ─────────────────────────────────────────────────────────────────────────
    // PIPELINES
    // ─────────────────────────────────────────────────────────────────────────
    fn create_shader_module(&self, code: &[u32]) -> VkResult<vk::ShaderModule>;
    fn destroy_shader_module(&self, module: vk::ShaderModule);
    fn create_render_pass(&self, format: vk::Format) -> VkResult<vk::RenderPass>;
    fn destroy_render_pass(&self, render_pass: vk::RenderPass);
    fn create_graphics_pipeline(
        &self,
        desc: &PipelineDesc<'_>,
    ) -> VkResult<(vk::Pipeline, vk::PipelineLayout)>;
    fn destroy_pipeline(&self, pipeline: vk::Pipeline, layout: vk::PipelineLayout);
}
