use ash::vk;

use crate::renderer::error::NegotiationResult;
use crate::renderer::query::DeviceQuery;

/// Queue families found for one (device, surface) pair. Either role may be missing.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct QueueFamilyIndices {
    pub graphics_family: Option<u32>,
    pub present_family: Option<u32>,
}

/// Both roles assigned, ready for device and swapchain creation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedQueueFamilies {
    pub graphics_family: u32,
    pub present_family: u32,
}

impl QueueFamilyIndices {
    /// Walks the family list once, stopping as soon as both roles have a family.
    /// Graphics comes from the family flags, present from asking the surface.
    pub fn find(
        query: &impl DeviceQuery,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> NegotiationResult<Self> {
        let mut indices = Self::default();

        for (index, family) in query.queue_families(physical_device).iter().enumerate() {
            let index = index as u32;

            if indices.graphics_family.is_none()
                && family.queue_flags.contains(vk::QueueFlags::GRAPHICS)
            {
                indices.graphics_family = Some(index);
            }

            if indices.present_family.is_none()
                && query.queue_supports_surface(physical_device, index, surface)?
            {
                indices.present_family = Some(index);
            }

            if indices.is_complete() {
                break;
            }
        }

        Ok(indices)
    }

    pub fn is_complete(&self) -> bool {
        self.graphics_family.is_some() && self.present_family.is_some()
    }

    pub fn resolved(&self) -> Option<ResolvedQueueFamilies> {
        Some(ResolvedQueueFamilies {
            graphics_family: self.graphics_family?,
            present_family: self.present_family?,
        })
    }
}

impl ResolvedQueueFamilies {
    pub fn is_shared(&self) -> bool {
        self.graphics_family == self.present_family
    }

    /// Distinct family indices, graphics first
    pub fn unique(&self) -> Vec<u32> {
        if self.is_shared() {
            vec![self.graphics_family]
        } else {
            vec![self.graphics_family, self.present_family]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::query::fake::{FakeDevice, FakeHost, family};
    use ash::vk::Handle;

    fn find(device: FakeDevice) -> QueueFamilyIndices {
        let host = FakeHost::with_devices(vec![device]);
        QueueFamilyIndices::find(&host, FakeHost::handle(0), vk::SurfaceKHR::null()).unwrap()
    }

    #[test]
    fn shared_family_is_complete() {
        let indices = find(FakeDevice::discrete("gpu", 4096));
        assert_eq!(indices.graphics_family, Some(0));
        assert_eq!(indices.present_family, Some(0));
        assert!(indices.resolved().unwrap().is_shared());
    }

    #[test]
    fn separate_graphics_and_present_families() {
        let mut device = FakeDevice::discrete("gpu", 4096);
        device.queue_families = vec![
            family(vk::QueueFlags::TRANSFER),
            family(vk::QueueFlags::GRAPHICS),
            family(vk::QueueFlags::COMPUTE),
            family(vk::QueueFlags::TRANSFER),
        ];
        device.present_families = vec![3];

        let resolved = find(device).resolved().unwrap();
        assert_eq!(resolved.graphics_family, 1);
        assert_eq!(resolved.present_family, 3);
        assert_eq!(resolved.unique(), vec![1, 3]);
    }

    #[test]
    fn first_matching_family_wins() {
        let mut device = FakeDevice::discrete("gpu", 4096);
        device.queue_families = vec![
            family(vk::QueueFlags::GRAPHICS),
            family(vk::QueueFlags::GRAPHICS),
        ];
        device.present_families = vec![1, 0];

        let indices = find(device);
        assert_eq!(indices.graphics_family, Some(0));
        assert_eq!(indices.present_family, Some(0));
    }

    #[test]
    fn missing_present_support_is_incomplete_not_error() {
        let mut device = FakeDevice::discrete("gpu", 4096);
        device.present_families.clear();

        let indices = find(device);
        assert_eq!(indices.graphics_family, Some(0));
        assert_eq!(indices.present_family, None);
        assert!(!indices.is_complete());
        assert_eq!(indices.resolved(), None);
    }

    #[test]
    fn no_graphics_family() {
        let mut device = FakeDevice::discrete("gpu", 4096);
        device.queue_families = vec![family(vk::QueueFlags::COMPUTE)];

        let indices = find(device);
        assert_eq!(indices.graphics_family, None);
        assert!(!indices.is_complete());
    }
}
