pub mod config;
pub mod renderer;
