//! CLI-specific utilities for bili-audio-dl
//!
//! This module contains code specific to the command-line interface,
//! separate from the core library functionality.

pub mod menu;
pub mod progress;

pub use progress::ProgressManager;
