// Backend module - Vulkan abstraction layer
//
// Core frame machinery is written against the `Gpu` trait; `VulkanDevice`
// provides it through ash, `MockGpu` provides it in tests.

pub mod device;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod gpu;
pub mod memory;
pub mod pipeline;
pub mod recorder;
pub mod shader;
pub mod staging;
pub mod swapchain;
pub mod sync;
mod vulkan_gpu;

#[cfg(test)]
pub mod mock;

pub use device::VulkanDevice;
pub use frame::{FrameOutcome, FrameScheduler, FrameSettings};
pub use geometry::{GeometryBuffers, Mesh, Vertex};
pub use gpu::Gpu;
pub use memory::MemoryAllocator;
pub use recorder::CommandRecorder;
pub use shader::ShaderSet;
pub use swapchain::SwapchainManager;
