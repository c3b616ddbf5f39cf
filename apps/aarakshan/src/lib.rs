//! # Aarakshan Library
//!
//! This library exposes the Aarakshan binary modules for testing and
//! integration.
//!
//! The main binary uses these modules through the `main.rs` entry point.

pub mod api;
pub mod cli;
pub mod config;

// Re-export aarakshan_core for convenience
pub use aarakshan_core;
