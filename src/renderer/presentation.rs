use ash::{khr::swapchain, vk};
use log::{info, warn};

use crate::renderer::device::VKDevice;
use crate::renderer::error::{NegotiationError, NegotiationResult};
use crate::renderer::query::DeviceQuery;
use crate::renderer::queue_family::ResolvedQueueFamilies;
use crate::renderer::surface::VKSurface;

/// 8bit BGRA in the SRGB colour space
pub const PREFERRED_SURFACE_FORMAT: vk::SurfaceFormatKHR = vk::SurfaceFormatKHR {
    format: vk::Format::B8G8R8A8_SRGB,
    color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
};

/// Triple buffering without tearing, lowest latency of the vsync modes
pub const PREFERRED_PRESENT_MODE: vk::PresentModeKHR = vk::PresentModeKHR::MAILBOX;

/// Every conforming implementation has to support FIFO
pub const FALLBACK_PRESENT_MODE: vk::PresentModeKHR = vk::PresentModeKHR::FIFO;

/// Everything a device reports about presenting to one surface.
/// Queried fresh for each device, never reused across devices.
#[derive(Debug, Clone)]
pub struct SwapSupport {
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    pub formats: Vec<vk::SurfaceFormatKHR>,
    pub present_modes: Vec<vk::PresentModeKHR>,
}

impl SwapSupport {
    /// Empty format or mode lists are returned as is, the validator decides what they mean
    pub fn query(
        query: &impl DeviceQuery,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> NegotiationResult<Self> {
        Ok(Self {
            capabilities: query.surface_capabilities(physical_device, surface)?,
            formats: query.surface_formats(physical_device, surface)?,
            present_modes: query.present_modes(physical_device, surface)?,
        })
    }

    pub fn is_adequate(&self) -> bool {
        !self.formats.is_empty() && !self.present_modes.is_empty()
    }
}

// if 8bit BGRA in SRGB Colour Space pick it Else first Option
pub fn choose_surface_format(
    formats: &[vk::SurfaceFormatKHR],
) -> NegotiationResult<vk::SurfaceFormatKHR> {
    let preferred = formats.iter().copied().find(|surface_format| {
        surface_format.format == PREFERRED_SURFACE_FORMAT.format
            && surface_format.color_space == PREFERRED_SURFACE_FORMAT.color_space
    });

    match preferred {
        Some(surface_format) => Ok(surface_format),
        None => {
            let fallback = *formats.first().ok_or(NegotiationError::NoSurfaceFormats)?;
            warn!(
                "Preferred surface format unavailable, using {:?} {:?}",
                fallback.format, fallback.color_space
            );
            Ok(fallback)
        }
    }
}

// if Mailbox Supported Return Mailbox else FIFO
pub fn choose_present_mode(
    present_modes: &[vk::PresentModeKHR],
) -> NegotiationResult<vk::PresentModeKHR> {
    if present_modes.contains(&PREFERRED_PRESENT_MODE) {
        return Ok(PREFERRED_PRESENT_MODE);
    }

    if !present_modes.contains(&FALLBACK_PRESENT_MODE) {
        return Err(NegotiationError::MissingFifoPresentMode);
    }

    warn!("Mailbox present mode unavailable, falling back to FIFO");
    Ok(FALLBACK_PRESENT_MODE)
}

/// The window manager either fixes the extent through `current_extent`, or
/// reports `u32::MAX` on both axes and lets the swapchain decide, in which case
/// the framebuffer size is clamped into the supported range.
pub fn choose_extent(
    capabilities: &vk::SurfaceCapabilitiesKHR,
    framebuffer_size: vk::Extent2D,
) -> vk::Extent2D {
    let current_extent = capabilities.current_extent;
    if current_extent.width != u32::MAX || current_extent.height != u32::MAX {
        return current_extent;
    }

    let min_extent = capabilities.min_image_extent;
    let max_extent = capabilities.max_image_extent;
    vk::Extent2D::default()
        .width(
            framebuffer_size
                .width
                .clamp(min_extent.width, max_extent.width),
        )
        .height(
            framebuffer_size
                .height
                .clamp(min_extent.height, max_extent.height),
        )
}

// one more than the minimum so we never wait on the driver, max of 0 means no limit
pub fn choose_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let image_count = capabilities.min_image_count + 1;
    if capabilities.max_image_count > 0 {
        image_count.min(capabilities.max_image_count)
    } else {
        image_count
    }
}

/// How swapchain images are shared between the graphics and present queues
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSharing {
    Exclusive,
    Concurrent([u32; 2]),
}

impl ImageSharing {
    pub fn sharing_mode(&self) -> vk::SharingMode {
        match self {
            ImageSharing::Exclusive => vk::SharingMode::EXCLUSIVE,
            ImageSharing::Concurrent(_) => vk::SharingMode::CONCURRENT,
        }
    }

    pub fn queue_family_indices(&self) -> &[u32] {
        match self {
            ImageSharing::Exclusive => &[],
            ImageSharing::Concurrent(indices) => indices,
        }
    }
}

impl From<ResolvedQueueFamilies> for ImageSharing {
    fn from(families: ResolvedQueueFamilies) -> Self {
        if families.is_shared() {
            ImageSharing::Exclusive
        } else {
            ImageSharing::Concurrent([families.graphics_family, families.present_family])
        }
    }
}

/// Negotiated swapchain parameters, all the creation step needs
#[derive(Debug, Clone, Copy)]
pub struct SwapchainConfig {
    pub surface_format: vk::SurfaceFormatKHR,
    pub present_mode: vk::PresentModeKHR,
    pub extent: vk::Extent2D,
    pub image_count: u32,
    pub sharing: ImageSharing,
    pub pre_transform: vk::SurfaceTransformFlagsKHR,
}

impl SwapchainConfig {
    /// Pure function of its inputs, makes no device calls
    pub fn negotiate(
        swap_support: &SwapSupport,
        framebuffer_size: vk::Extent2D,
        queue_families: ResolvedQueueFamilies,
    ) -> NegotiationResult<Self> {
        let capabilities = &swap_support.capabilities;

        Ok(Self {
            surface_format: choose_surface_format(&swap_support.formats)?,
            present_mode: choose_present_mode(&swap_support.present_modes)?,
            extent: choose_extent(capabilities, framebuffer_size),
            image_count: choose_image_count(capabilities),
            sharing: ImageSharing::from(queue_families),
            pre_transform: capabilities.current_transform,
        })
    }

    pub fn log(&self) {
        info!(
            "Swapchain: {:?} {:?}, {:?}, {}x{}, {} images, {:?}",
            self.surface_format.format,
            self.surface_format.color_space,
            self.present_mode,
            self.extent.width,
            self.extent.height,
            self.image_count,
            self.sharing.sharing_mode()
        );
    }
}

pub struct VKSwapchain {
    pub swapchain: vk::SwapchainKHR,
    pub image_views: Vec<vk::ImageView>,
    pub images: Vec<vk::Image>,
    pub config: SwapchainConfig,
    pub swapchain_loader: swapchain::Device,
}

impl VKSwapchain {
    pub fn new(
        instance: &ash::Instance,
        vk_device: &VKDevice,
        vk_surface: &VKSurface,
        config: SwapchainConfig,
    ) -> Result<Self, vk::Result> {
        let swapchain_create_info = vk::SwapchainCreateInfoKHR::default()
            .surface(vk_surface.surface)
            .min_image_count(config.image_count)
            .image_format(config.surface_format.format)
            .image_color_space(config.surface_format.color_space)
            .image_extent(config.extent)
            .image_array_layers(1) // always 1 for non sterioscopic displays
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(config.sharing.sharing_mode())
            .queue_family_indices(config.sharing.queue_family_indices())
            .pre_transform(config.pre_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE) // Alpha Blending with other windows = Opaque
            .present_mode(config.present_mode)
            .clipped(true); // ignore Pixel covered by other windows

        let swapchain_loader = swapchain::Device::new(instance, &vk_device.device);

        let swapchain = unsafe { swapchain_loader.create_swapchain(&swapchain_create_info, None)? };

        let images = unsafe { swapchain_loader.get_swapchain_images(swapchain)? };

        let image_views =
            Self::create_image_views(&images, config.surface_format.format, vk_device)?;

        Ok(Self {
            swapchain,
            image_views,
            images,
            config,
            swapchain_loader,
        })
    }

    fn create_image_views(
        swapchain_images: &[vk::Image],
        image_format: vk::Format,
        vk_device: &VKDevice,
    ) -> Result<Vec<vk::ImageView>, vk::Result> {
        swapchain_images
            .iter()
            .map(|image| {
                let image_view_create_info = vk::ImageViewCreateInfo::default()
                    .image(*image)
                    .view_type(vk::ImageViewType::TYPE_2D)
                    .format(image_format) // the colour format matches the swapchain
                    .components(vk::ComponentMapping::default())
                    .subresource_range(
                        vk::ImageSubresourceRange::default()
                            .aspect_mask(vk::ImageAspectFlags::COLOR)
                            .base_mip_level(0)
                            .level_count(1)
                            .base_array_layer(0)
                            .layer_count(1),
                    ); // 1 colour resource spanning the whole image
                unsafe {
                    vk_device
                        .device
                        .create_image_view(&image_view_create_info, None)
                }
            })
            .collect()
    }

    /// # Safety
    /// Destroy Before Vulkan Device
    /// Read VK Docs For Destruction Order
    pub unsafe fn destroy(&mut self, vk_device: &VKDevice) {
        unsafe {
            self.image_views
                .iter()
                .for_each(|iv| vk_device.device.destroy_image_view(*iv, None));
            self.swapchain_loader
                .destroy_swapchain(self.swapchain, None);
        }
        self.image_views.clear();
        self.images.clear();
    }
}
