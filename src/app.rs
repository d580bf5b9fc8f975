use log::{error, info};
use std::error::Error;
use swapchain_negotiator::config::{DeviceRequirements, GameInfo};
use swapchain_negotiator::renderer::VKContext;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

// only held so it drops in the right order, nothing is drawn
#[allow(dead_code)]
pub struct AppCTX {
    // context first so vulkan goes away before the window it presents to
    vulkan_ctx: VKContext,
    window: Window,
}

impl AppCTX {
    fn new(
        game_info: &GameInfo<'static>,
        requirements: &DeviceRequirements,
        event_loop: &ActiveEventLoop,
    ) -> Result<Self, Box<dyn Error>> {
        let window = event_loop.create_window(
            Window::default_attributes()
                .with_title(game_info.app_name.to_string_lossy())
                .with_inner_size(PhysicalSize::new(game_info.width, game_info.height))
                .with_resizable(game_info.resizable),
        )?;

        let vulkan_ctx = VKContext::new(game_info, requirements, &window)?;

        Ok(Self { vulkan_ctx, window })
    }
}

pub struct App {
    game_info: GameInfo<'static>,
    requirements: DeviceRequirements,
    ctx: Option<AppCTX>,
    startup_error: Option<Box<dyn Error>>,
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.ctx.is_some() {
            return;
        }

        info!(
            "Initialising: {}",
            self.game_info.app_name.to_string_lossy()
        );
        match AppCTX::new(&self.game_info, &self.requirements, event_loop) {
            Ok(ctx) => self.ctx = Some(ctx),
            Err(err) => {
                error!("Startup failed: {err}");
                self.startup_error = Some(err);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                // tear vulkan down while the window still exists
                self.ctx = None;
                event_loop.exit();
            }
            _ => (),
        }
    }
}

impl App {
    pub fn new(game_info: GameInfo<'static>, requirements: DeviceRequirements) -> Self {
        Self {
            game_info,
            requirements,
            ctx: None,
            startup_error: None,
        }
    }

    /// Runs until the window closes, startup failures come back as the error
    pub fn start(mut self, event_loop: EventLoop<()>) -> Result<(), Box<dyn Error>> {
        event_loop.set_control_flow(ControlFlow::Wait);
        event_loop.run_app(&mut self)?;

        match self.startup_error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
