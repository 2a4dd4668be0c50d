//! Configuration structures for packaging operations.
//!
//! This module provides the application context consumed from the host build
//! tool and the builder pattern for constructing it.

mod builder;
mod core;
mod plugin;

// Re-export all public types
pub use builder::{DEFAULT_MANIFEST_NAME, DEFAULT_META_NAME, DEFAULT_OUTPUT_DIR, SettingsBuilder};
pub use core::Settings;
pub use plugin::{ServerPlugin, parse_plugin_arg};
