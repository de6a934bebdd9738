// Recording GPU for unit tests
//
// Hands out fake handles, keeps an ordered log of every call, tracks which
// handles are alive, models memory contents and fence state, and executes
// recorded buffer copies when a command buffer is submitted. The "GPU"
// finishes work instantly unless `hang()` was called.

use ash::prelude::VkResult;
use ash::vk::{self, Handle};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use super::gpu::{Gpu, PipelineDesc, RenderPassBegin, Submission, SurfaceSupport, SwapchainDesc};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateBuffer { buffer: vk::Buffer, size: vk::DeviceSize, usage: vk::BufferUsageFlags },
    AllocateMemory { memory: vk::DeviceMemory, size: vk::DeviceSize, type_index: u32 },
    BindBufferMemory { buffer: vk::Buffer, memory: vk::DeviceMemory },
    WriteMapped { memory: vk::DeviceMemory, len: usize },
    ReadMapped { memory: vk::DeviceMemory, len: usize },
    DestroyBuffer(vk::Buffer),
    FreeMemory(vk::DeviceMemory),

    CreateCommandPool { pool: vk::CommandPool, flags: vk::CommandPoolCreateFlags },
    AllocateCommandBuffer { pool: vk::CommandPool, cmd: vk::CommandBuffer },
    DestroyCommandPool(vk::CommandPool),
    ResetCommandBuffer(vk::CommandBuffer),
    BeginCommandBuffer { cmd: vk::CommandBuffer, flags: vk::CommandBufferUsageFlags },
    EndCommandBuffer(vk::CommandBuffer),
    CopyBuffer { cmd: vk::CommandBuffer, src: vk::Buffer, dst: vk::Buffer, size: vk::DeviceSize },
    BeginRenderPass { cmd: vk::CommandBuffer, begin: RenderPassBeginRecord },
    BindPipeline { cmd: vk::CommandBuffer, pipeline: vk::Pipeline },
    BindVertexBuffer { cmd: vk::CommandBuffer, buffer: vk::Buffer },
    BindIndexBuffer { cmd: vk::CommandBuffer, buffer: vk::Buffer, index_type: vk::IndexType },
    DrawIndexed { cmd: vk::CommandBuffer, index_count: u32 },
    EndRenderPass(vk::CommandBuffer),

    CreateFence { fence: vk::Fence, signaled: bool },
    CreateSemaphore(vk::Semaphore),
    WaitForFence { fence: vk::Fence, was_signaled: bool },
    ResetFence(vk::Fence),
    DestroyFence(vk::Fence),
    DestroySemaphore(vk::Semaphore),
    QueueSubmit(Submission),
    QueueWaitIdle,
    DeviceWaitIdle,

    SurfaceSupport,
    CreateSwapchain { swapchain: vk::SwapchainKHR, image_count: u32, format: vk::Format, extent: vk::Extent2D },
    DestroySwapchain(vk::SwapchainKHR),
    CreateImageView { view: vk::ImageView, image: vk::Image },
    DestroyImageView(vk::ImageView),
    CreateFramebuffer { framebuffer: vk::Framebuffer, view: vk::ImageView },
    DestroyFramebuffer(vk::Framebuffer),
    AcquireNextImage { semaphore: vk::Semaphore, result: VkResult<(u32, bool)> },
    QueuePresent { image_index: u32, wait_semaphore: vk::Semaphore },

    CreateShaderModule(vk::ShaderModule),
    DestroyShaderModule(vk::ShaderModule),
    CreateRenderPass { render_pass: vk::RenderPass, format: vk::Format },
    DestroyRenderPass(vk::RenderPass),
    CreatePipeline { pipeline: vk::Pipeline, extent: vk::Extent2D },
    DestroyPipeline(vk::Pipeline),
}

/// `RenderPassBegin` with a comparable clear color
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderPassBeginRecord {
    pub render_pass: vk::RenderPass,
    pub framebuffer: vk::Framebuffer,
    pub extent: vk::Extent2D,
    pub clear_color: [f32; 4],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Buffer,
    Memory,
    CommandPool,
    Fence,
    Semaphore,
    Swapchain,
    ImageView,
    Framebuffer,
    ShaderModule,
    RenderPass,
    Pipeline,
    PipelineLayout,
}

struct State {
    next_handle: u64,
    calls: Vec<Call>,
    live: HashMap<u64, Kind>,

    memory_types: Vec<vk::MemoryType>,
    buffer_type_bits: u32,
    buffer_memory: HashMap<vk::Buffer, (vk::DeviceSize, Option<vk::DeviceMemory>)>,
    memory_contents: HashMap<vk::DeviceMemory, Vec<u8>>,
    recorded_copies: HashMap<vk::CommandBuffer, Vec<(vk::Buffer, vk::Buffer, vk::DeviceSize)>>,

    fences: HashMap<vk::Fence, bool>,
    hung: bool,
    submit_failure: Option<vk::Result>,

    surface: VkResult<SurfaceSupport>,
    swapchain_images: HashMap<vk::SwapchainKHR, Vec<vk::Image>>,
    next_image: u32,
    acquire_script: VecDeque<VkResult<(u32, bool)>>,
    present_script: VecDeque<VkResult<bool>>,
}

impl State {
    fn mint<H: Handle>(&mut self, kind: Kind) -> H {
        self.next_handle += 1;
        self.live.insert(self.next_handle, kind);
        H::from_raw(self.next_handle)
    }

    fn mint_untracked<H: Handle>(&mut self) -> H {
        self.next_handle += 1;
        H::from_raw(self.next_handle)
    }

    fn retire<H: Handle>(&mut self, handle: H, kind: Kind) {
        let raw = handle.as_raw();
        match self.live.remove(&raw) {
            Some(found) if found == kind => {}
            Some(found) => panic!("destroying {:?} handle as {:?}", found, kind),
            None => panic!("{:?} {:#x} destroyed twice or never created", kind, raw),
        }
    }

    fn execute_copies(&mut self, cmd: vk::CommandBuffer) {
        let copies = self.recorded_copies.get(&cmd).cloned().unwrap_or_default();
        for (src, dst, size) in copies {
            let size = size as usize;
            let src_memory = self.buffer_memory[&src].1.expect("copy from unbound buffer");
            let dst_memory = self.buffer_memory[&dst].1.expect("copy into unbound buffer");
            let bytes = self.memory_contents[&src_memory][..size].to_vec();
            self.memory_contents
                .get_mut(&dst_memory)
                .expect("destination memory freed")[..size]
                .copy_from_slice(&bytes);
        }
    }
}

pub struct MockGpu {
    state: Mutex<State>,
}

impl MockGpu {
    pub fn new() -> Self {
        Self::with_memory_types(vec![
            vk::MemoryType {
                property_flags: vk::MemoryPropertyFlags::DEVICE_LOCAL,
                heap_index: 0,
            },
            vk::MemoryType {
                property_flags: vk::MemoryPropertyFlags::HOST_VISIBLE
                    | vk::MemoryPropertyFlags::HOST_COHERENT,
                heap_index: 1,
            },
        ])
    }

    pub fn with_memory_types(memory_types: Vec<vk::MemoryType>) -> Self {
        Self {
            state: Mutex::new(State {
                next_handle: 0x1000,
                calls: Vec::new(),
                live: HashMap::new(),
                memory_types,
                buffer_type_bits: u32::MAX,
                buffer_memory: HashMap::new(),
                memory_contents: HashMap::new(),
                recorded_copies: HashMap::new(),
                fences: HashMap::new(),
                hung: false,
                submit_failure: None,
                surface: Ok(Self::surface(640, 480, vk::Format::B8G8R8A8_SRGB)),
                swapchain_images: HashMap::new(),
                next_image: 0,
                acquire_script: VecDeque::new(),
                present_script: VecDeque::new(),
            }),
        }
    }

    /// Surface with min image count 2, one format and FIFO present mode
    pub fn surface(width: u32, height: u32, format: vk::Format) -> SurfaceSupport {
        SurfaceSupport {
            capabilities: vk::SurfaceCapabilitiesKHR {
                min_image_count: 2,
                max_image_count: 8,
                current_extent: vk::Extent2D { width, height },
                min_image_extent: vk::Extent2D { width: 1, height: 1 },
                max_image_extent: vk::Extent2D { width: 4096, height: 4096 },
                current_transform: vk::SurfaceTransformFlagsKHR::IDENTITY,
                ..Default::default()
            },
            formats: vec![vk::SurfaceFormatKHR {
                format,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            }],
            present_modes: vec![vk::PresentModeKHR::FIFO],
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // SCRIPTING
    // ─────────────────────────────────────────────────────────────────────────

    pub fn set_buffer_type_bits(&self, bits: u32) {
        self.state.lock().buffer_type_bits = bits;
    }

    pub fn set_surface(&self, surface: VkResult<SurfaceSupport>) {
        self.state.lock().surface = surface;
    }

    /// Results returned by the next acquire calls, in order
    pub fn script_acquire(&self, results: impl IntoIterator<Item = VkResult<(u32, bool)>>) {
        self.state.lock().acquire_script.extend(results);
    }

    pub fn script_present(&self, results: impl IntoIterator<Item = VkResult<bool>>) {
        self.state.lock().present_script.extend(results);
    }

    /// Submitted work never completes: fences stay unsignaled
    pub fn hang(&self) {
        self.state.lock().hung = true;
    }

    pub fn fail_next_submit(&self, error: vk::Result) {
        self.state.lock().submit_failure = Some(error);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // INSPECTION
    // ─────────────────────────────────────────────────────────────────────────

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.state.lock().calls.iter().filter(|c| predicate(c)).count()
    }

    pub fn position(&self, predicate: impl Fn(&Call) -> bool) -> Option<usize> {
        self.state.lock().calls.iter().position(|c| predicate(c))
    }

    pub fn live(&self, kind: Kind) -> usize {
        self.state.lock().live.values().filter(|&&k| k == kind).count()
    }

    pub fn live_total(&self) -> usize {
        self.state.lock().live.len()
    }

    pub fn live_buffers(&self) -> usize {
        self.live(Kind::Buffer)
    }

    pub fn live_allocations(&self) -> usize {
        self.live(Kind::Memory)
    }

    pub fn fence_signaled(&self, fence: vk::Fence) -> bool {
        self.state.lock().fences.get(&fence).copied().unwrap_or(false)
    }

    fn log(&self, call: Call) {
        self.state.lock().calls.push(call);
    }
}

impl Gpu for MockGpu {
    fn memory_types(&self) -> Vec<vk::MemoryType> {
        self.state.lock().memory_types.clone()
    }

    fn device_wait_idle(&self) -> VkResult<()> {
        self.log(Call::DeviceWaitIdle);
        Ok(())
    }

    fn queue_wait_idle(&self) -> VkResult<()> {
        self.log(Call::QueueWaitIdle);
        Ok(())
    }

    fn queue_submit(&self, submission: &Submission) -> VkResult<()> {
        let mut state = self.state.lock();
        state.calls.push(Call::QueueSubmit(*submission));
        if let Some(error) = state.submit_failure.take() {
            return Err(error);
        }
        if state.hung {
            return Ok(());
        }
        state.execute_copies(submission.command_buffer);
        if submission.fence != vk::Fence::null() {
            state.fences.insert(submission.fence, true);
        }
        Ok(())
    }

    fn create_buffer(
        &self,
        size: vk::DeviceSize,
        usage: vk::BufferUsageFlags,
    ) -> VkResult<vk::Buffer> {
        let mut state = self.state.lock();
        let buffer = state.mint(Kind::Buffer);
        state.buffer_memory.insert(buffer, (size, None));
        state.calls.push(Call::CreateBuffer { buffer, size, usage });
        Ok(buffer)
    }

    fn buffer_memory_requirements(&self, buffer: vk::Buffer) -> vk::MemoryRequirements {
        let state = self.state.lock();
        vk::MemoryRequirements {
            size: state.buffer_memory[&buffer].0,
            alignment: 4,
            memory_type_bits: state.buffer_type_bits,
        }
    }

    fn allocate_memory(
        &self,
        size: vk::DeviceSize,
        memory_type_index: u32,
    ) -> VkResult<vk::DeviceMemory> {
        let mut state = self.state.lock();
        let memory = state.mint(Kind::Memory);
        state.memory_contents.insert(memory, vec![0; size as usize]);
        state.calls.push(Call::AllocateMemory { memory, size, type_index: memory_type_index });
        Ok(memory)
    }

    fn bind_buffer_memory(&self, buffer: vk::Buffer, memory: vk::DeviceMemory) -> VkResult<()> {
        let mut state = self.state.lock();
        if let Some(entry) = state.buffer_memory.get_mut(&buffer) {
            entry.1 = Some(memory);
        }
        state.calls.push(Call::BindBufferMemory { buffer, memory });
        Ok(())
    }

    fn write_mapped(&self, memory: vk::DeviceMemory, data: &[u8]) -> VkResult<()> {
        let mut state = self.state.lock();
        let contents = state
            .memory_contents
            .get_mut(&memory)
            .ok_or(vk::Result::ERROR_MEMORY_MAP_FAILED)?;
        contents[..data.len()].copy_from_slice(data);
        state.calls.push(Call::WriteMapped { memory, len: data.len() });
        Ok(())
    }

    fn read_mapped(&self, memory: vk::DeviceMemory, len: usize) -> VkResult<Vec<u8>> {
        let mut state = self.state.lock();
        let bytes = state
            .memory_contents
            .get(&memory)
            .ok_or(vk::Result::ERROR_MEMORY_MAP_FAILED)?[..len]
            .to_vec();
        state.calls.push(Call::ReadMapped { memory, len });
        Ok(bytes)
    }

    fn destroy_buffer(&self, buffer: vk::Buffer) {
        let mut state = self.state.lock();
        state.retire(buffer, Kind::Buffer);
        state.buffer_memory.remove(&buffer);
        state.calls.push(Call::DestroyBuffer(buffer));
    }

    fn free_memory(&self, memory: vk::DeviceMemory) {
        let mut state = self.state.lock();
        state.retire(memory, Kind::Memory);
        state.memory_contents.remove(&memory);
        state.calls.push(Call::FreeMemory(memory));
    }

    fn create_command_pool(&self, flags: vk::CommandPoolCreateFlags) -> VkResult<vk::CommandPool> {
        let mut state = self.state.lock();
        let pool = state.mint(Kind::CommandPool);
        state.calls.push(Call::CreateCommandPool { pool, flags });
        Ok(pool)
    }

    fn allocate_command_buffer(&self, pool: vk::CommandPool) -> VkResult<vk::CommandBuffer> {
        let mut state = self.state.lock();
        let cmd = state.mint_untracked();
        state.calls.push(Call::AllocateCommandBuffer { pool, cmd });
        Ok(cmd)
    }

    fn destroy_command_pool(&self, pool: vk::CommandPool) {
        let mut state = self.state.lock();
        state.retire(pool, Kind::CommandPool);
        state.calls.push(Call::DestroyCommandPool(pool));
    }

    fn reset_command_buffer(&self, cmd: vk::CommandBuffer) -> VkResult<()> {
        let mut state = self.state.lock();
        state.recorded_copies.remove(&cmd);
        state.calls.push(Call::ResetCommandBuffer(cmd));
        Ok(())
    }

    fn begin_command_buffer(
        &self,
        cmd: vk::CommandBuffer,
        flags: vk::CommandBufferUsageFlags,
    ) -> VkResult<()> {
        let mut state = self.state.lock();
        state.recorded_copies.remove(&cmd);
        state.calls.push(Call::BeginCommandBuffer { cmd, flags });
        Ok(())
    }

    fn end_command_buffer(&self, cmd: vk::CommandBuffer) -> VkResult<()> {
        self.log(Call::EndCommandBuffer(cmd));
        Ok(())
    }

    fn cmd_copy_buffer(
        &self,
        cmd: vk::CommandBuffer,
        src: vk::Buffer,
        dst: vk::Buffer,
        size: vk::DeviceSize,
    ) {
        let mut state = self.state.lock();
        state.recorded_copies.entry(cmd).or_default().push((src, dst, size));
        state.calls.push(Call::CopyBuffer { cmd, src, dst, size });
    }

    fn cmd_begin_render_pass(&self, cmd: vk::CommandBuffer, begin: &RenderPassBegin) {
        self.log(Call::BeginRenderPass {
            cmd,
            begin: RenderPassBeginRecord {
                render_pass: begin.render_pass,
                framebuffer: begin.framebuffer,
                extent: begin.extent,
                clear_color: begin.clear_color,
            },
        });
    }

    fn cmd_bind_pipeline(&self, cmd: vk::CommandBuffer, pipeline: vk::Pipeline) {
        self.log(Call::BindPipeline { cmd, pipeline });
    }

    fn cmd_bind_vertex_buffer(&self, cmd: vk::CommandBuffer, buffer: vk::Buffer) {
        self.log(Call::BindVertexBuffer { cmd, buffer });
    }

    fn cmd_bind_index_buffer(
        &self,
        cmd: vk::CommandBuffer,
        buffer: vk::Buffer,
        index_type: vk::IndexType,
    ) {
        self.log(Call::BindIndexBuffer { cmd, buffer, index_type });
    }

    fn cmd_draw_indexed(&self, cmd: vk::CommandBuffer, index_count: u32) {
        self.log(Call::DrawIndexed { cmd, index_count });
    }

    fn cmd_end_render_pass(&self, cmd: vk::CommandBuffer) {
        self.log(Call::EndRenderPass(cmd));
    }

    fn create_fence(&self, signaled: bool) -> VkResult<vk::Fence> {
        let mut state = self.state.lock();
        let fence = state.mint(Kind::Fence);
        state.fences.insert(fence, signaled);
        state.calls.push(Call::CreateFence { fence, signaled });
        Ok(fence)
    }

    fn create_semaphore(&self) -> VkResult<vk::Semaphore> {
        let mut state = self.state.lock();
        let semaphore = state.mint(Kind::Semaphore);
        state.calls.push(Call::CreateSemaphore(semaphore));
        Ok(semaphore)
    }

    fn wait_for_fence(&self, fence: vk::Fence, _timeout_ns: u64) -> VkResult<()> {
        let mut state = self.state.lock();
        let was_signaled = state.fences.get(&fence).copied().unwrap_or(false);
        state.calls.push(Call::WaitForFence { fence, was_signaled });
        if was_signaled {
            Ok(())
        } else {
            Err(vk::Result::TIMEOUT)
        }
    }

    fn reset_fence(&self, fence: vk::Fence) -> VkResult<()> {
        let mut state = self.state.lock();
        state.fences.insert(fence, false);
        state.calls.push(Call::ResetFence(fence));
        Ok(())
    }

    fn destroy_fence(&self, fence: vk::Fence) {
        let mut state = self.state.lock();
        state.retire(fence, Kind::Fence);
        state.fences.remove(&fence);
        state.calls.push(Call::DestroyFence(fence));
    }

    fn destroy_semaphore(&self, semaphore: vk::Semaphore) {
        let mut state = self.state.lock();
        state.retire(semaphore, Kind::Semaphore);
        state.calls.push(Call::DestroySemaphore(semaphore));
    }

    fn surface_support(&self) -> VkResult<SurfaceSupport> {
        let mut state = self.state.lock();
        state.calls.push(Call::SurfaceSupport);
        state.surface.clone()
    }

    fn create_swapchain(&self, desc: &SwapchainDesc) -> VkResult<vk::SwapchainKHR> {
        let mut state = self.state.lock();
        let swapchain = state.mint(Kind::Swapchain);
        let images: Vec<vk::Image> = (0..desc.min_image_count)
            .map(|_| state.mint_untracked())
            .collect();
        state.swapchain_images.insert(swapchain, images);
        state.next_image = 0;
        state.calls.push(Call::CreateSwapchain {
            swapchain,
            image_count: desc.min_image_count,
            format: desc.format.format,
            extent: desc.extent,
        });
        Ok(swapchain)
    }

    fn swapchain_images(&self, swapchain: vk::SwapchainKHR) -> VkResult<Vec<vk::Image>> {
        self.state
            .lock()
            .swapchain_images
            .get(&swapchain)
            .cloned()
            .ok_or(vk::Result::ERROR_SURFACE_LOST_KHR)
    }

    fn destroy_swapchain(&self, swapchain: vk::SwapchainKHR) {
        let mut state = self.state.lock();
        state.retire(swapchain, Kind::Swapchain);
        state.swapchain_images.remove(&swapchain);
        state.calls.push(Call::DestroySwapchain(swapchain));
    }

    fn create_image_view(&self, image: vk::Image, _format: vk::Format) -> VkResult<vk::ImageView> {
        let mut state = self.state.lock();
        let view = state.mint(Kind::ImageView);
        state.calls.push(Call::CreateImageView { view, image });
        Ok(view)
    }

    fn destroy_image_view(&self, view: vk::ImageView) {
        let mut state = self.state.lock();
        state.retire(view, Kind::ImageView);
        state.calls.push(Call::DestroyImageView(view));
    }

    fn create_framebuffer(
        &self,
        _render_pass: vk::RenderPass,
        view: vk::ImageView,
        _extent: vk::Extent2D,
    ) -> VkResult<vk::Framebuffer> {
        let mut state = self.state.lock();
        let framebuffer = state.mint(Kind::Framebuffer);
        state.calls.push(Call::CreateFramebuffer { framebuffer, view });
        Ok(framebuffer)
    }

    fn destroy_framebuffer(&self, framebuffer: vk::Framebuffer) {
        let mut state = self.state.lock();
        state.retire(framebuffer, Kind::Framebuffer);
        state.calls.push(Call::DestroyFramebuffer(framebuffer));
    }

    fn acquire_next_image(
        &self,
        swapchain: vk::SwapchainKHR,
        _timeout_ns: u64,
        semaphore: vk::Semaphore,
    ) -> VkResult<(u32, bool)> {
        let mut state = self.state.lock();
        let result = match state.acquire_script.pop_front() {
            Some(result) => result,
            None => {
                let image_count = state
                    .swapchain_images
                    .get(&swapchain)
                    .map_or(1, |images| images.len() as u32);
                let index = state.next_image % image_count;
                state.next_image += 1;
                Ok((index, false))
            }
        };
        state.calls.push(Call::AcquireNextImage { semaphore, result });
        result
    }

    fn queue_present(
        &self,
        _swapchain: vk::SwapchainKHR,
        image_index: u32,
        wait_semaphore: vk::Semaphore,
    ) -> VkResult<bool> {
        let mut state = self.state.lock();
        state.calls.push(Call::QueuePresent { image_index, wait_semaphore });
        state.present_script.pop_front().unwrap_or(Ok(false))
    }

    fn create_shader_module(&self, _code: &[u32]) -> VkResult<vk::ShaderModule> {
        let mut state = self.state.lock();
        let module = state.mint(Kind::ShaderModule);
        state.calls.push(Call::CreateShaderModule(module));
        Ok(module)
    }

    fn destroy_shader_module(&self, module: vk::ShaderModule) {
        let mut state = self.state.lock();
        state.retire(module, Kind::ShaderModule);
        state.calls.push(Call::DestroyShaderModule(module));
    }

    fn create_render_pass(&self, format: vk::Format) -> VkResult<vk::RenderPass> {
        let mut state = self.state.lock();
        let render_pass = state.mint(Kind::RenderPass);
        state.calls.push(Call::CreateRenderPass { render_pass, format });
        Ok(render_pass)
    }

    fn destroy_render_pass(&self, render_pass: vk::RenderPass) {
        let mut state = self.state.lock();
        state.retire(render_pass, Kind::RenderPass);
        state.calls.push(Call::DestroyRenderPass(render_pass));
    }

    fn create_graphics_pipeline(
        &self,
        desc: &PipelineDesc<'_>,
    ) -> VkResult<(vk::Pipeline, vk::PipelineLayout)> {
        let mut state = self.state.lock();
        let layout = state.mint(Kind::PipelineLayout);
        let pipeline = state.mint(Kind::Pipeline);
        state.calls.push(Call::CreatePipeline { pipeline, extent: desc.extent });
        Ok((pipeline, layout))
    }

    fn destroy_pipeline(&self, pipeline: vk::Pipeline, layout: vk::PipelineLayout) {
        let mut state = self.state.lock();
        state.retire(pipeline, Kind::Pipeline);
        state.retire(layout, Kind::PipelineLayout);
        state.calls.push(Call::DestroyPipeline(pipeline));
    }
}
