use ash::{Device, Instance, vk};
use log::{debug, info};
use std::error;

use crate::config::DeviceRequirements;
use crate::renderer::VKInstance;
use crate::renderer::error::{NegotiationError, NegotiationResult};
use crate::renderer::extensions::missing_device_extensions;
use crate::renderer::presentation::SwapSupport;
use crate::renderer::query::DeviceQuery;
use crate::renderer::queue_family::{QueueFamilyIndices, ResolvedQueueFamilies};

/// Snapshot of what a physical device reports, taken once during selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceCandidate {
    pub handle: vk::PhysicalDevice,
    pub name: String,
    pub vendor_id: u32,
    pub device_id: u32,
    pub api_version: u32,
    pub device_type: vk::PhysicalDeviceType,
    pub max_image_dimension_2d: u32,
    pub geometry_shader: bool,
}

impl DeviceCandidate {
    pub fn query(query: &impl DeviceQuery, physical_device: vk::PhysicalDevice) -> Self {
        let properties = query.properties(physical_device);
        let features = query.features(physical_device);

        Self {
            handle: physical_device,
            name: properties
                .device_name_as_c_str()
                .unwrap_or_default()
                .to_string_lossy()
                .into_owned(),
            vendor_id: properties.vendor_id,
            device_id: properties.device_id,
            api_version: properties.api_version,
            device_type: properties.device_type,
            max_image_dimension_2d: properties.limits.max_image_dimension2_d,
            geometry_shader: features.geometry_shader == vk::TRUE,
        }
    }
}

// calculate a capability score for a physical device
// discrete cards get a flat bonus, max texture size stands in for everything else
pub fn score_device(candidate: &DeviceCandidate) -> u64 {
    // can't run the pipeline at all without geometry shaders
    if !candidate.geometry_shader {
        return 0;
    }

    let mut score: u64 = 0;
    if candidate.device_type == vk::PhysicalDeviceType::DISCRETE_GPU {
        score += 1000;
    }

    score + u64::from(candidate.max_image_dimension_2d)
}

/// Complete queue families, every required extension, and at least one
/// surface format and present mode
pub fn is_device_suitable(
    query: &impl DeviceQuery,
    physical_device: vk::PhysicalDevice,
    surface: vk::SurfaceKHR,
    requirements: &DeviceRequirements,
) -> NegotiationResult<bool> {
    let indices = QueueFamilyIndices::find(query, physical_device, surface)?;
    if !indices.is_complete() {
        debug!("{physical_device:?} rejected, incomplete queue families {indices:?}");
        return Ok(false);
    }

    let missing = missing_device_extensions(query, physical_device, requirements.extensions())?;
    if !missing.is_empty() {
        debug!("{physical_device:?} rejected, missing extensions {missing:?}");
        return Ok(false);
    }

    // only safe to ask about swapchain support once the extension is known to exist
    let swap_support = SwapSupport::query(query, physical_device, surface)?;
    if !swap_support.is_adequate() {
        debug!(
            "{physical_device:?} rejected, {} formats {} present modes",
            swap_support.formats.len(),
            swap_support.present_modes.len()
        );
        return Ok(false);
    }

    Ok(true)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredCandidate {
    pub candidate: DeviceCandidate,
    pub score: u64,
    pub suitable: bool,
}

/// Winning device plus everything that was considered
#[derive(Debug, Clone)]
pub struct Selection {
    pub device: DeviceCandidate,
    pub score: u64,
    pub queue_families: ResolvedQueueFamilies,
    pub candidates: Vec<ScoredCandidate>,
}

/// Scores every device, then keeps the highest scoring suitable one.
/// Ties go to whichever device was enumerated first.
pub fn pick_device(
    query: &impl DeviceQuery,
    surface: vk::SurfaceKHR,
    requirements: &DeviceRequirements,
) -> NegotiationResult<Selection> {
    let physical_devices = query.physical_devices()?;
    if physical_devices.is_empty() {
        return Err(NegotiationError::NoDevices);
    }

    let candidates = physical_devices
        .iter()
        .map(|physical_device| -> NegotiationResult<ScoredCandidate> {
            let candidate = DeviceCandidate::query(query, *physical_device);
            let suitable = is_device_suitable(query, *physical_device, surface, requirements)?;
            Ok(ScoredCandidate {
                score: score_device(&candidate),
                candidate,
                suitable,
            })
        })
        .collect::<NegotiationResult<Vec<ScoredCandidate>>>()?;

    let mut best: Option<&ScoredCandidate> = None;
    for scored in candidates.iter().filter(|scored| scored.suitable) {
        if best.is_none_or(|current| scored.score > current.score) {
            best = Some(scored);
        }
    }

    let (device, score) = best
        .filter(|best| best.score > 0)
        .map(|best| (best.candidate.clone(), best.score))
        .ok_or(NegotiationError::NoSuitableDevice)?;

    let queue_families = QueueFamilyIndices::find(query, device.handle, surface)?
        .resolved()
        .ok_or(NegotiationError::NoSuitableDevice)?;

    Ok(Selection {
        device,
        score,
        queue_families,
        candidates,
    })
}

/// Diagnostic table of every device considered, informational only
pub fn report_candidates(candidates: &[ScoredCandidate]) {
    info!("{:<40} {:<16} {:>8} {:>8}", "Device", "Type", "Score", "Suitable");
    for scored in candidates {
        info!(
            "{:<40} {:<16} {:>8} {:>8}",
            scored.candidate.name,
            format!("{:?}", scored.candidate.device_type),
            scored.score,
            scored.suitable
        );
    }
}

pub struct VKDevice {
    pub p_device: vk::PhysicalDevice,
    pub device: Device,
    pub queue_families: ResolvedQueueFamilies,
    pub graphics_queue: vk::Queue,
    pub present_queue: vk::Queue,
}

impl VKDevice {
    pub fn new(
        vk_instance: &VKInstance,
        selection: &Selection,
        requirements: &DeviceRequirements,
    ) -> Result<Self, Box<dyn error::Error>> {
        let p_device = selection.device.handle;
        let queue_families = selection.queue_families;
        let instance = &vk_instance.instance;

        info!(
            "VK Device Name: {} (score {})",
            selection.device.name, selection.score
        );
        info!(
            "VK Device Version: {}.{}.{}",
            vk::api_version_major(selection.device.api_version),
            vk::api_version_minor(selection.device.api_version),
            vk::api_version_patch(selection.device.api_version)
        );
        info!(
            "VK Device Memory: {}MiB",
            physical_device_memory_size(&p_device, instance)
        );

        let priorities = [1.0f32];

        // one queue per distinct family, graphics and present may be the same
        let queue_create_infos: Vec<vk::DeviceQueueCreateInfo> = queue_families
            .unique()
            .into_iter()
            .map(|family_index| {
                vk::DeviceQueueCreateInfo::default()
                    .queue_family_index(family_index)
                    .queue_priorities(&priorities)
            })
            .collect();

        let features = vk::PhysicalDeviceFeatures::default().geometry_shader(true);

        let device_extension_names = requirements.extensions_raw();

        let device_create_info = vk::DeviceCreateInfo::default()
            .enabled_extension_names(&device_extension_names)
            .enabled_features(&features)
            .queue_create_infos(&queue_create_infos);

        let device = unsafe { instance.create_device(p_device, &device_create_info, None)? };

        let graphics_queue = unsafe { device.get_device_queue(queue_families.graphics_family, 0) };
        let present_queue = unsafe { device.get_device_queue(queue_families.present_family, 0) };

        Ok(Self {
            p_device,
            device,
            queue_families,
            graphics_queue,
            present_queue,
        })
    }
}

impl Drop for VKDevice {
    fn drop(&mut self) {
        unsafe {
            //must be dropped before instance
            if let Err(err) = self.device.device_wait_idle() {
                log::error!("Device wait idle failed during teardown: {err}");
            }
            self.device.destroy_device(None);
        };
    }
}

// get device memory in MiB
pub fn physical_device_memory_size(
    physical_device: &vk::PhysicalDevice,
    instance: &Instance,
) -> u64 {
    let memory_properties =
        unsafe { instance.get_physical_device_memory_properties(*physical_device) };

    memory_properties
        .memory_heaps
        .iter()
        .take(memory_properties.memory_heap_count as usize)
        .filter(|heap| heap.flags.contains(vk::MemoryHeapFlags::DEVICE_LOCAL))
        .map(|heap| heap.size / (1024 * 1024))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::query::fake::{FakeDevice, FakeHost, family};
    use ash::vk::Handle;

    fn pick(devices: Vec<FakeDevice>) -> NegotiationResult<Selection> {
        let host = FakeHost::with_devices(devices);
        pick_device(&host, vk::SurfaceKHR::null(), &DeviceRequirements::default())
    }

    fn candidate(device: FakeDevice) -> DeviceCandidate {
        let host = FakeHost::with_devices(vec![device]);
        DeviceCandidate::query(&host, FakeHost::handle(0))
    }

    #[test]
    fn candidate_snapshot_reads_properties() {
        let candidate = candidate(FakeDevice::discrete("Fake RTX", 16384));
        assert_eq!(candidate.name, "Fake RTX");
        assert_eq!(candidate.device_type, vk::PhysicalDeviceType::DISCRETE_GPU);
        assert_eq!(candidate.max_image_dimension_2d, 16384);
        assert!(candidate.geometry_shader);
    }

    #[test]
    fn discrete_scores_bonus_plus_image_limit() {
        assert_eq!(score_device(&candidate(FakeDevice::discrete("d", 16384))), 17384);
        assert_eq!(score_device(&candidate(FakeDevice::integrated("i", 8192))), 8192);
        let cpu = FakeDevice::new("cpu", vk::PhysicalDeviceType::CPU, 4096);
        assert_eq!(score_device(&candidate(cpu)), 4096);
    }

    #[test]
    fn no_geometry_shader_scores_zero() {
        let devices = [
            FakeDevice::discrete("d", 16384),
            FakeDevice::integrated("i", 8192),
            FakeDevice::new("v", vk::PhysicalDeviceType::VIRTUAL_GPU, u32::MAX),
        ];
        for device in devices {
            assert_eq!(score_device(&candidate(device.without_geometry_shader())), 0);
        }
    }

    #[test]
    fn discrete_beats_integrated() {
        let selection = pick(vec![
            FakeDevice::integrated("integrated", 16384),
            FakeDevice::discrete("discrete", 16384),
            FakeDevice::integrated("integrated 2", 8192),
        ])
        .unwrap();

        assert_eq!(selection.device.name, "discrete");
        assert_eq!(selection.device.handle, FakeHost::handle(1));
        assert_eq!(selection.candidates.len(), 3);
    }

    #[test]
    fn lower_later_score_does_not_displace_best() {
        let selection = pick(vec![
            FakeDevice::discrete("big", 32768),
            FakeDevice::discrete("small", 4096),
        ])
        .unwrap();

        assert_eq!(selection.device.name, "big");
        assert_eq!(selection.score, 33768);
    }

    #[test]
    fn ties_keep_first_enumerated() {
        let selection = pick(vec![
            FakeDevice::discrete("first", 16384),
            FakeDevice::discrete("second", 16384),
        ])
        .unwrap();

        assert_eq!(selection.device.name, "first");
    }

    #[test]
    fn unsuitable_high_scorer_is_skipped() {
        let mut best_on_paper = FakeDevice::discrete("no present", 32768);
        best_on_paper.present_families.clear();

        let selection = pick(vec![best_on_paper, FakeDevice::integrated("igpu", 8192)]).unwrap();

        assert_eq!(selection.device.name, "igpu");
        assert!(!selection.candidates[0].suitable);
        assert!(selection.candidates[1].suitable);
    }

    #[test]
    fn empty_enumeration_fails() {
        assert_eq!(pick(vec![]).unwrap_err(), NegotiationError::NoDevices);
    }

    #[test]
    fn enumeration_error_propagates() {
        let mut host = FakeHost::with_devices(vec![FakeDevice::discrete("gpu", 1)]);
        host.fail_enumeration = Some(vk::Result::ERROR_INITIALIZATION_FAILED);

        assert_eq!(
            pick_device(&host, vk::SurfaceKHR::null(), &DeviceRequirements::default())
                .unwrap_err(),
            NegotiationError::Vulkan(vk::Result::ERROR_INITIALIZATION_FAILED)
        );
    }

    #[test]
    fn zero_score_fails_selection() {
        let result = pick(vec![FakeDevice::discrete("gpu", 16384).without_geometry_shader()]);
        assert_eq!(result.unwrap_err(), NegotiationError::NoSuitableDevice);
    }

    #[test]
    fn no_suitable_device_fails_selection() {
        let mut device = FakeDevice::discrete("gpu", 16384);
        device.extensions.clear();

        assert_eq!(pick(vec![device]).unwrap_err(), NegotiationError::NoSuitableDevice);
    }

    #[test]
    fn selection_resolves_split_families() {
        let mut device = FakeDevice::discrete("gpu", 16384);
        device.queue_families = vec![
            family(vk::QueueFlags::TRANSFER),
            family(vk::QueueFlags::GRAPHICS),
            family(vk::QueueFlags::TRANSFER),
            family(vk::QueueFlags::COMPUTE),
        ];
        device.present_families = vec![3];

        let selection = pick(vec![device]).unwrap();
        assert_eq!(selection.queue_families.graphics_family, 1);
        assert_eq!(selection.queue_families.present_family, 3);
    }

    #[test]
    fn suitability_rejects_empty_formats() {
        let mut device = FakeDevice::discrete("gpu", 16384);
        device.formats.clear();
        let host = FakeHost::with_devices(vec![device]);

        let suitable = is_device_suitable(
            &host,
            FakeHost::handle(0),
            vk::SurfaceKHR::null(),
            &DeviceRequirements::default(),
        )
        .unwrap();
        assert!(!suitable);
    }

    #[test]
    fn suitability_rejects_empty_present_modes() {
        let mut device = FakeDevice::discrete("gpu", 16384);
        device.present_modes.clear();
        let host = FakeHost::with_devices(vec![device]);

        assert!(
            !is_device_suitable(
                &host,
                FakeHost::handle(0),
                vk::SurfaceKHR::null(),
                &DeviceRequirements::default(),
            )
            .unwrap()
        );
    }

    #[test]
    fn swap_support_not_probed_without_extension() {
        let mut device = FakeDevice::discrete("gpu", 16384);
        device.extensions.clear();
        let host = FakeHost::with_devices(vec![device]);

        let suitable = is_device_suitable(
            &host,
            FakeHost::handle(0),
            vk::SurfaceKHR::null(),
            &DeviceRequirements::default(),
        )
        .unwrap();
        assert!(!suitable);
        assert_eq!(host.surface_probes.get(), 0);
    }

    #[test]
    fn suitable_device_probes_once() {
        let host = FakeHost::with_devices(vec![FakeDevice::discrete("gpu", 16384)]);

        let suitable = is_device_suitable(
            &host,
            FakeHost::handle(0),
            vk::SurfaceKHR::null(),
            &DeviceRequirements::default(),
        )
        .unwrap();
        assert!(suitable);
        assert_eq!(host.surface_probes.get(), 1);
    }
}
