pub mod device;
pub mod error;
pub mod extensions;
pub mod presentation;
pub mod query;
pub mod queue_family;
pub mod surface;

use ash::{Entry, Instance, vk};
use log::info;
use std::error::Error;
use std::ffi::c_char;
use winit::{raw_window_handle::HasDisplayHandle, window::Window};

use crate::config::{DeviceRequirements, ENGINE_MAJOR, ENGINE_MINOR, ENGINE_PATCH, GameInfo};
use device::{VKDevice, pick_device, report_candidates};
use presentation::{SwapSupport, SwapchainConfig, VKSwapchain};
use surface::VKSurface;

pub struct VKInstance {
    pub entry: Entry,
    pub instance: Instance,
}

impl VKInstance {
    pub fn new(
        game_info: &GameInfo,
        extension_names: &[*const c_char],
    ) -> Result<Self, Box<dyn Error>> {
        // Load Vulkan Library
        let entry = unsafe { Entry::load()? };

        let engine_version = vk::make_api_version(
            0,
            ENGINE_MAJOR.parse()?,
            ENGINE_MINOR.parse()?,
            ENGINE_PATCH.parse()?,
        );

        let app_info = vk::ApplicationInfo::default()
            .api_version(vk::make_api_version(0, 1, 0, 0))
            .application_name(game_info.app_name)
            .application_version(vk::make_api_version(
                0,
                game_info.major,
                game_info.minor,
                game_info.patch,
            ))
            .engine_name(c"Swapchain Negotiator")
            .engine_version(engine_version);

        let create_info = vk::InstanceCreateInfo::default()
            .application_info(&app_info)
            .enabled_extension_names(extension_names);

        let instance = unsafe { entry.create_instance(&create_info, None)? };

        Ok(Self { entry, instance })
    }
}

impl Drop for VKInstance {
    fn drop(&mut self) {
        unsafe {
            self.instance.destroy_instance(None);
        }
    }
}

/// Everything created for one window. Fields drop top to bottom,
/// which is the reverse of creation order.
pub struct VKContext {
    pub vulkan_swapchain: VKSwapchain,
    pub vulkan_device: VKDevice,
    pub vulkan_surface: VKSurface,
    pub vulkan_instance: VKInstance,
}

impl VKContext {
    pub fn new(
        game_info: &GameInfo,
        requirements: &DeviceRequirements,
        window: &Window,
    ) -> Result<Self, Box<dyn Error>> {
        let extension_names =
            ash_window::enumerate_required_extensions(window.display_handle()?.as_raw())?;

        let vulkan_instance = VKInstance::new(game_info, extension_names)?;
        let vulkan_surface = VKSurface::new(&vulkan_instance, window)?;

        let host = vulkan_surface.host(&vulkan_instance);
        let selection = pick_device(&host, vulkan_surface.surface, requirements)?;
        report_candidates(&selection.candidates);

        let swap_support =
            SwapSupport::query(&host, selection.device.handle, vulkan_surface.surface)?;
        let framebuffer_size = window.inner_size();
        let swapchain_config = SwapchainConfig::negotiate(
            &swap_support,
            vk::Extent2D {
                width: framebuffer_size.width,
                height: framebuffer_size.height,
            },
            selection.queue_families,
        )?;
        swapchain_config.log();

        let vulkan_device = VKDevice::new(&vulkan_instance, &selection, requirements)?;
        let vulkan_swapchain = VKSwapchain::new(
            &vulkan_instance.instance,
            &vulkan_device,
            &vulkan_surface,
            swapchain_config,
        )?;
        info!(
            "Created swapchain with {} images",
            vulkan_swapchain.images.len()
        );

        Ok(Self {
            vulkan_swapchain,
            vulkan_device,
            vulkan_surface,
            vulkan_instance,
        })
    }
}

impl Drop for VKContext {
    fn drop(&mut self) {
        unsafe {
            // only thing without its own Drop, has to go before the device
            self.vulkan_swapchain.destroy(&self.vulkan_device);
        }
    }
}
