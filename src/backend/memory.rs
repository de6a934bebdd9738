// Device memory allocation for buffers
//
// One `vkAllocateMemory` per buffer. That is plenty for a handful of static
// buffers created at startup.

use anyhow::{Context, Result};
use ash::vk;
use std::sync::Arc;
use super::error::BackendError;
use super::gpu::Gpu;

/// First memory type whose bit is set in `type_bits` and whose property
/// flags contain `required`. `None` if no type satisfies both.
pub fn select_memory_type(
    type_bits: u32,
    available: &[vk::MemoryType],
    required: vk::MemoryPropertyFlags,
) -> Option<u32> {
    available
        .iter()
        .enumerate()
        .take(u32::BITS as usize)
        .find(|&(i, memory_type)| {
            type_bits & (1u32 << i) != 0 && memory_type.property_flags.contains(required)
        })
        .map(|(i, _)| i as u32)
}

/// A buffer together with the memory bound to it. Not freed on drop;
/// hand it back to `MemoryAllocator::destroy_buffer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferAllocation {
    pub buffer: vk::Buffer,
    pub memory: vk::DeviceMemory,
    pub size: vk::DeviceSize,
}

pub struct MemoryAllocator<G: Gpu> {
    gpu: Arc<G>,
    memory_types: Vec<vk::MemoryType>,
}

impl<G: Gpu> MemoryAllocator<G> {
    pub fn new(gpu: Arc<G>) -> Self {
        let memory_types = gpu.memory_types();
        log::debug!("Device exposes {} memory types", memory_types.len());
        Self { gpu, memory_types }
    }

    pub fn gpu(&self) -> &Arc<G> {
        &self.gpu
    }

    /// Allocate memory for `buffer` from the first compatible type and bind it at offset 0.
    ///
    /// The caller owns the returned memory.
    pub fn allocate_for_buffer(
        &self,
        buffer: vk::Buffer,
        required: vk::MemoryPropertyFlags,
    ) -> Result<vk::DeviceMemory> {
        let requirements = self.gpu.buffer_memory_requirements(buffer);

        let type_index = select_memory_type(
            requirements.memory_type_bits,
            &self.memory_types,
            required,
        )
        .ok_or(BackendError::NoSuitableMemoryType {
            type_bits: requirements.memory_type_bits,
            required,
        })?;

        let memory = self
            .gpu
            .allocate_memory(requirements.size, type_index)
            .context("Failed to allocate buffer memory")?;

        if let Err(e) = self.gpu.bind_buffer_memory(buffer, memory) {
            self.gpu.free_memory(memory);
            return Err(e).context("Failed to bind buffer memory");
        }

        Ok(memory)
    }

    /// Create a buffer of `size` bytes and back it with memory that has `required` properties
    pub fn create_buffer(
        &self,
        size: vk::DeviceSize,
        usage: vk::BufferUsageFlags,
        required: vk::MemoryPropertyFlags,
    ) -> Result<BufferAllocation> {
        let buffer = self
            .gpu
            .create_buffer(size, usage)
            .context("Failed to create buffer")?;

        match self.allocate_for_buffer(buffer, required) {
            Ok(memory) => Ok(BufferAllocation { buffer, memory, size }),
            Err(e) => {
                self.gpu.destroy_buffer(buffer);
                Err(e)
            }
        }
    }

    pub fn destroy_buffer(&self, allocation: BufferAllocation) {
        self.gpu.destroy_buffer(allocation.buffer);
        self.gpu.free_memory(allocation.memory);
    }
}
