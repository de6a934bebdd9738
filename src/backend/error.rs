// Typed backend failures
//
// Everything here is fatal. A stale swapchain is not an error at all: it is
// reported through `Acquire::Stale` / `FrameOutcome::Recreated`.

use ash::vk;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("no suitable physical device (needs graphics + present queue and VK_KHR_swapchain)")]
    NoSuitableDevice,

    #[error("no suitable memory type for type bits {type_bits:#b} and flags {required:?}")]
    NoSuitableMemoryType {
        type_bits: u32,
        required: vk::MemoryPropertyFlags,
    },

    #[error("surface reports no formats")]
    NoSurfaceFormat,

    #[error("surface reports no present modes")]
    NoPresentMode,

    #[error("frame fence not signaled within {timeout_ns} ns (GPU hang?)")]
    FenceTimeout { timeout_ns: u64 },

    #[error("failed to acquire swapchain image")]
    AcquireFailed(#[source] vk::Result),

    #[error("failed to present swapchain image")]
    PresentFailed(#[source] vk::Result),

    #[error("queue submission failed")]
    SubmitFailed(#[source] vk::Result),
}
