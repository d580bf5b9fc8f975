use ash::vk;
use thiserror::Error;

pub type NegotiationResult<T> = Result<T, NegotiationError>;

/// Failures while picking a device or negotiating swapchain parameters.
/// None of these are recoverable during startup.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationError {
    #[error("No Vulkan physical devices are available on this host")]
    NoDevices,

    #[error("No suitable physical device found")]
    NoSuitableDevice,

    #[error("Surface reports no supported formats")]
    NoSurfaceFormats,

    #[error("Surface does not report the FIFO present mode the Vulkan spec guarantees")]
    MissingFifoPresentMode,

    #[error("Vulkan query failed: {0}")]
    Vulkan(#[from] vk::Result),
}
