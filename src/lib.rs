//! Bareplug - descriptor-free plugin discovery for Rhai script plugins

pub mod config;
pub mod error;
pub mod plugins;

pub use config::PluginConfig;
pub use error::{BareplugError, Result};
