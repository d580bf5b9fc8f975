use ash::vk;
use std::ffi::CStr;

use crate::renderer::error::NegotiationResult;
use crate::renderer::query::DeviceQuery;

/// Required extensions the device does not advertise, in requirement order
pub fn missing_device_extensions(
    query: &impl DeviceQuery,
    physical_device: vk::PhysicalDevice,
    required_extensions: &[&'static CStr],
) -> NegotiationResult<Vec<&'static CStr>> {
    let device_extensions = query.extension_names(physical_device)?;

    Ok(required_extensions
        .iter()
        .copied()
        .filter(|required| {
            !device_extensions
                .iter()
                .any(|supported| supported.as_c_str() == *required)
        })
        .collect())
}

pub fn check_device_extension_support(
    query: &impl DeviceQuery,
    physical_device: vk::PhysicalDevice,
    required_extensions: &[&'static CStr],
) -> NegotiationResult<bool> {
    Ok(missing_device_extensions(query, physical_device, required_extensions)?.is_empty())
}
