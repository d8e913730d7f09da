// src/retry/mod.rs
mod strategy;

pub use strategy::{RetryDecision, RetryStrategy, Retryable};
