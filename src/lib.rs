pub mod app_config;
pub mod camera;
pub mod cli;
pub mod common;
pub mod config_loader;
pub mod core;
pub mod drive;
pub mod errors;
