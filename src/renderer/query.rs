use ash::prelude::VkResult;
use ash::{Instance, khr::surface, vk};
use std::ffi::CString;

/// Read-only view of what the host and driver report about physical devices.
/// Every selection and validation step goes through this so it can run against
/// a real instance or an in-memory host.
pub trait DeviceQuery {
    fn physical_devices(&self) -> VkResult<Vec<vk::PhysicalDevice>>;

    fn properties(&self, physical_device: vk::PhysicalDevice) -> vk::PhysicalDeviceProperties;

    fn features(&self, physical_device: vk::PhysicalDevice) -> vk::PhysicalDeviceFeatures;

    fn queue_families(&self, physical_device: vk::PhysicalDevice)
    -> Vec<vk::QueueFamilyProperties>;

    fn queue_supports_surface(
        &self,
        physical_device: vk::PhysicalDevice,
        queue_index: u32,
        surface: vk::SurfaceKHR,
    ) -> VkResult<bool>;

    fn extension_names(&self, physical_device: vk::PhysicalDevice) -> VkResult<Vec<CString>>;

    fn surface_capabilities(
        &self,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<vk::SurfaceCapabilitiesKHR>;

    fn surface_formats(
        &self,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::SurfaceFormatKHR>>;

    fn present_modes(
        &self,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::PresentModeKHR>>;
}

/// Queries backed by a live instance and surface loader
pub struct VKHost<'a> {
    pub instance: &'a Instance,
    pub surface_loader: &'a surface::Instance,
}

impl<'a> VKHost<'a> {
    pub fn new(instance: &'a Instance, surface_loader: &'a surface::Instance) -> Self {
        Self {
            instance,
            surface_loader,
        }
    }
}

// Safety for all of these: both loaders are borrowed from a live VKContext,
// handles passed in were enumerated from that same instance.
impl DeviceQuery for VKHost<'_> {
    fn physical_devices(&self) -> VkResult<Vec<vk::PhysicalDevice>> {
        unsafe { self.instance.enumerate_physical_devices() }
    }

    fn properties(&self, physical_device: vk::PhysicalDevice) -> vk::PhysicalDeviceProperties {
        unsafe { self.instance.get_physical_device_properties(physical_device) }
    }

    fn features(&self, physical_device: vk::PhysicalDevice) -> vk::PhysicalDeviceFeatures {
        unsafe { self.instance.get_physical_device_features(physical_device) }
    }

    fn queue_families(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> Vec<vk::QueueFamilyProperties> {
        unsafe {
            self.instance
                .get_physical_device_queue_family_properties(physical_device)
        }
    }

    fn queue_supports_surface(
        &self,
        physical_device: vk::PhysicalDevice,
        queue_index: u32,
        surface: vk::SurfaceKHR,
    ) -> VkResult<bool> {
        unsafe {
            self.surface_loader
                .get_physical_device_surface_support(physical_device, queue_index, surface)
        }
    }

    fn extension_names(&self, physical_device: vk::PhysicalDevice) -> VkResult<Vec<CString>> {
        let extension_props = unsafe {
            self.instance
                .enumerate_device_extension_properties(physical_device)?
        };

        Ok(extension_props
            .iter()
            .filter_map(|ext_prop| ext_prop.extension_name_as_c_str().ok())
            .map(CString::from)
            .collect())
    }

    fn surface_capabilities(
        &self,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<vk::SurfaceCapabilitiesKHR> {
        unsafe {
            self.surface_loader
                .get_physical_device_surface_capabilities(physical_device, surface)
        }
    }

    fn surface_formats(
        &self,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::SurfaceFormatKHR>> {
        unsafe {
            self.surface_loader
                .get_physical_device_surface_formats(physical_device, surface)
        }
    }

    fn present_modes(
        &self,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::PresentModeKHR>> {
        unsafe {
            self.surface_loader
                .get_physical_device_surface_present_modes(physical_device, surface)
        }
    }
}
