// src/lib.rs
pub mod check;
pub mod cli;
pub mod config;
pub mod metrics;
pub mod monitor;
pub mod notify;
pub mod report;
pub mod retry;
pub mod server;
