use ash::khr;
use std::ffi::{CStr, c_char};

pub const ENGINE_MAJOR: &str = env!("CARGO_PKG_VERSION_MAJOR");
pub const ENGINE_MINOR: &str = env!("CARGO_PKG_VERSION_MINOR");
pub const ENGINE_PATCH: &str = env!("CARGO_PKG_VERSION_PATCH");

/// Application and window settings handed to the context bootstrap.
#[derive(Debug, Clone)]
pub struct GameInfo<'a> {
    pub app_name: &'a CStr,
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub width: u32,
    pub height: u32,
    pub resizable: bool,
}

impl<'a> Default for GameInfo<'a> {
    fn default() -> Self {
        Self {
            app_name: c"Vulkan Triangle",
            major: 0,
            minor: 1,
            patch: 0,
            width: 800,
            height: 600,
            resizable: false,
        }
    }
}

/// Device extensions a physical device must advertise to be considered.
/// Built once and passed by reference into selection and device creation.
/// ```
/// use swapchain_negotiator::config::DeviceRequirements;
/// let requirements = DeviceRequirements::default().push_ext(ash::khr::dynamic_rendering::NAME);
/// assert_eq!(requirements.extensions().len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRequirements {
    required_extensions: Vec<&'static CStr>,
}

impl DeviceRequirements {
    /// Empty requirement set, mostly useful for tests
    pub fn none() -> Self {
        Self {
            required_extensions: Vec::new(),
        }
    }

    /// Adds a vulkan extension name to the requirements
    pub fn push_ext(mut self, ext_name: &'static CStr) -> Self {
        if !self.required_extensions.contains(&ext_name) {
            self.required_extensions.push(ext_name);
        }
        self
    }

    pub fn extensions(&self) -> &[&'static CStr] {
        self.required_extensions.as_slice()
    }

    // pointers stay valid for 'static, safe to hand to create infos
    pub fn extensions_raw(&self) -> Vec<*const c_char> {
        self.required_extensions
            .iter()
            .map(|ext| ext.as_ptr())
            .collect()
    }
}

// presenting to a surface is the one thing every device here has to do
impl Default for DeviceRequirements {
    fn default() -> Self {
        Self::none().push_ext(khr::swapchain::NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_requires_swapchain() {
        let requirements = DeviceRequirements::default();
        assert_eq!(requirements.extensions(), &[khr::swapchain::NAME]);
    }

    #[test]
    fn push_ext_ignores_duplicates() {
        let requirements = DeviceRequirements::default()
            .push_ext(khr::swapchain::NAME)
            .push_ext(khr::dynamic_rendering::NAME);
        assert_eq!(
            requirements.extensions(),
            &[khr::swapchain::NAME, khr::dynamic_rendering::NAME]
        );
        assert_eq!(requirements.extensions_raw().len(), 2);
    }

    #[test]
    fn default_window_matches_triangle_app() {
        let info = GameInfo::default();
        assert_eq!((info.width, info.height), (800, 600));
        assert!(!info.resizable);
    }
}
