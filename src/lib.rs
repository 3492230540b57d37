pub mod args;
pub mod camera;
pub mod capture;
pub mod config;
pub mod dataset;
pub mod devices;
pub mod error;
pub mod font;
pub mod grid;
pub mod output;
pub mod phase;
pub mod screen;
pub mod session;
pub mod stimulus;
pub mod staging;
pub mod types;
