mod app;

use app::App;
use log::LevelFilter;
use simple_logger::SimpleLogger;
use std::error::Error;
use swapchain_negotiator::config::{DeviceRequirements, GameInfo};
use winit::event_loop::EventLoop;

fn main() -> Result<(), Box<dyn Error>> {
    // RUST_LOG overrides the default level
    SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .env()
        .init()?;

    let event_loop = EventLoop::new()?;

    App::new(GameInfo::default(), DeviceRequirements::default()).start(event_loop)
}
