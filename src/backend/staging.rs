// Staging uploads into device-local memory
//
// Setup-time only. Every call is synchronous: it records a one-shot copy,
// submits it without semaphores and waits for the queue to go idle. The
// staging buffer and the transient command pool are released on every exit
// path by their guards.

use anyhow::{Context, Result};
use ash::vk;
use super::error::BackendError;
use super::gpu::{Gpu, Submission};
use super::memory::{BufferAllocation, MemoryAllocator};

/// Host-visible buffer that lives for exactly one transfer
struct StagingBuffer<'a, G: Gpu> {
    allocator: &'a MemoryAllocator<G>,
    allocation: BufferAllocation,
}

impl<'a, G: Gpu> StagingBuffer<'a, G> {
    fn new(
        allocator: &'a MemoryAllocator<G>,
        size: vk::DeviceSize,
        usage: vk::BufferUsageFlags,
    ) -> Result<Self> {
        let allocation = allocator
            .create_buffer(size, usage, vk::MemoryPropertyFlags::HOST_VISIBLE)
            .context("Failed to create staging buffer")?;
        Ok(Self { allocator, allocation })
    }
}

impl<G: Gpu> Drop for StagingBuffer<'_, G> {
    fn drop(&mut self) {
        self.allocator.destroy_buffer(self.allocation);
    }
}

/// Short-lived command pool; destroying it frees its command buffer
struct TransientPool<'a, G: Gpu> {
    gpu: &'a G,
    pool: vk::CommandPool,
}

impl<'a, G: Gpu> TransientPool<'a, G> {
    fn new(gpu: &'a G) -> Result<Self> {
        let pool = gpu
            .create_command_pool(vk::CommandPoolCreateFlags::TRANSIENT)
            .context("Failed to create transient command pool")?;
        Ok(Self { gpu, pool })
    }
}

impl<G: Gpu> Drop for TransientPool<'_, G> {
    fn drop(&mut self) {
        self.gpu.destroy_command_pool(self.pool);
    }
}

pub struct StagingUploader<'a, G: Gpu> {
    allocator: &'a MemoryAllocator<G>,
}

impl<'a, G: Gpu> StagingUploader<'a, G> {
    pub fn new(allocator: &'a MemoryAllocator<G>) -> Self {
        Self { allocator }
    }

    /// Copy `data` into `destination` at offset 0 through a transient staging buffer.
    ///
    /// `destination` must have `TRANSFER_DST` usage and hold at least `data.len()` bytes.
    pub fn upload(&self, destination: vk::Buffer, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        let size = data.len() as vk::DeviceSize;
        let gpu = self.allocator.gpu().as_ref();

        let staging = StagingBuffer::new(self.allocator, size, vk::BufferUsageFlags::TRANSFER_SRC)?;
        gpu.write_mapped(staging.allocation.memory, data)
            .context("Failed to write staging buffer")?;

        self.submit_once(|cmd| {
            gpu.cmd_copy_buffer(cmd, staging.allocation.buffer, destination, size);
        })?;

        log::debug!("Uploaded {} bytes to {:?}", size, destination);
        Ok(())
    }

    pub fn upload_slice<T: bytemuck::Pod>(&self, destination: vk::Buffer, data: &[T]) -> Result<()> {
        self.upload(destination, bytemuck::cast_slice(data))
    }

    /// Create a device-local buffer with `usage | TRANSFER_DST` and fill it with `data`
    pub fn create_device_local<T: bytemuck::Pod>(
        &self,
        usage: vk::BufferUsageFlags,
        data: &[T],
    ) -> Result<BufferAllocation> {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        let allocation = self.allocator.create_buffer(
            bytes.len() as vk::DeviceSize,
            usage | vk::BufferUsageFlags::TRANSFER_DST,
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
        )?;

        if let Err(e) = self.upload_slice(allocation.buffer, data) {
            self.allocator.destroy_buffer(allocation);
            return Err(e);
        }
        Ok(allocation)
    }

    /// Copy the first `size` bytes of `source` back to the host.
    ///
    /// `source` must have `TRANSFER_SRC` usage.
    #[cfg(test)]
    pub fn read_back(&self, source: vk::Buffer, size: vk::DeviceSize) -> Result<Vec<u8>> {
        if size == 0 {
            return Ok(Vec::new());
        }
        let gpu = self.allocator.gpu().as_ref();

        let staging = StagingBuffer::new(self.allocator, size, vk::BufferUsageFlags::TRANSFER_DST)?;
        self.submit_once(|cmd| {
            gpu.cmd_copy_buffer(cmd, source, staging.allocation.buffer, size);
        })?;

        gpu.read_mapped(staging.allocation.memory, size as usize)
            .context("Failed to read staging buffer")
    }

    /// Record one-time commands, submit them unsynchronized and block until the queue is idle
    fn submit_once(&self, record: impl FnOnce(vk::CommandBuffer)) -> Result<()> {
        let gpu = self.allocator.gpu().as_ref();
        let pool = TransientPool::new(gpu)?;

        let cmd = gpu
            .allocate_command_buffer(pool.pool)
            .context("Failed to allocate transfer command buffer")?;
        gpu.begin_command_buffer(cmd, vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT)?;
        record(cmd);
        gpu.end_command_buffer(cmd)?;

        gpu.queue_submit(&Submission::unsynchronized(cmd))
            .map_err(BackendError::SubmitFailed)?;
        gpu.queue_wait_idle()
            .context("Failed waiting for transfer to finish")?;

        Ok(())
    }
}
