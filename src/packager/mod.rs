//! Deployment packaging pipeline.
//!
//! Turns a built web application into a self-contained deployment unit for
//! an edge-functions platform: static assets, a generated request-handling
//! entry module, a pruned dependency set, and a platform manifest.
//!
//! # Overview
//!
//! The pipeline:
//! 1. Resets the output directory ([`layout`])
//! 2. Lays out static/runtime files and writes the merged manifest
//!    ([`layout`], [`manifest`], [`version`])
//! 3. Renders the entry module from the handler template ([`entry`])
//! 4. Narrows the dependency set to what the entry actually needs
//!    ([`closure`])
//!
//! # Example
//!
//! ```no_run
//! use edgepack::packager::{Pipeline, SettingsBuilder};
//!
//! # async fn example() -> edgepack::packager::Result<()> {
//! let settings = SettingsBuilder::new()
//!     .app_dir("apps/site")
//!     .host_node_version("22")
//!     .build()?;
//!
//! Pipeline::new(settings).run().await?;
//! # Ok(())
//! # }
//! ```

pub mod closure;
pub mod entry;
pub mod error;
pub mod layout;
pub mod manifest;
pub mod pipeline;
pub mod settings;
pub mod utils;
pub mod version;

pub use closure::{ClosureReport, DependencyCloser, ModuleTracer, ScanTracer};
pub use error::{Error, Result};
pub use layout::LayoutMode;
pub use pipeline::{Pipeline, Stage};
pub use settings::{ServerPlugin, Settings, SettingsBuilder};

/// Static-asset directory name, in both the build output and the package.
pub const STATIC_DIR: &str = "static";

/// Pre-rendered HTML directory name inside the build output.
pub const HTML_DIR: &str = "html";

/// Runtime-functions directory name inside the package.
pub const FUNCS_DIR: &str = "node-functions";
