// src/monitor/mod.rs
mod board;
mod runner;

pub use board::{SiteState, StatusBoard, Transition};
pub use runner::{Monitor, OutputFormat};
