use crate::renderer::VKInstance;
use crate::renderer::query::VKHost;
use ash::{khr::surface, vk};
use std::error;
use winit::{
    raw_window_handle::{HasDisplayHandle, HasWindowHandle},
    window::Window,
};

pub struct VKSurface {
    pub surface: vk::SurfaceKHR,
    pub surface_loader: surface::Instance,
}

impl VKSurface {
    pub fn new(vk_instance: &VKInstance, window: &Window) -> Result<Self, Box<dyn error::Error>> {
        let surface = unsafe {
            ash_window::create_surface(
                &vk_instance.entry,
                &vk_instance.instance,
                window.display_handle()?.as_raw(),
                window.window_handle()?.as_raw(),
                None,
            )?
        };

        let surface_loader = surface::Instance::new(&vk_instance.entry, &vk_instance.instance);

        Ok(Self {
            surface_loader,
            surface,
        })
    }

    /// Query view over this surface's loader and the instance that created it
    pub fn host<'a>(&'a self, vk_instance: &'a VKInstance) -> VKHost<'a> {
        VKHost::new(&vk_instance.instance, &self.surface_loader)
    }
}

// must be dropped after any swapchain built on it and before the instance
impl Drop for VKSurface {
    fn drop(&mut self) {
        unsafe {
            self.surface_loader.destroy_surface(self.surface, None);
        }
    }
}
