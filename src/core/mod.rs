//! Core library modules for bili-audio-dl
//!
//! This module contains the internal implementation details of the bili-audio-dl library.

pub mod error;
pub mod identifier;
pub mod credential;
pub mod source;
pub mod models;
pub mod wbi;
pub mod api;
pub mod resolver;
pub mod selector;
pub mod stream;
pub mod downloader;
pub mod postprocess;

// Re-export main types for internal use
pub use api::BiliClient;
pub use downloader::Downloader;
pub use resolver::StreamResolver;
pub use source::{ApiConfig, resolve_output_filename};
