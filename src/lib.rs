//! Edge deployment packager library.
//!
//! Packages a previously built web application into a minimal,
//! self-contained deployment unit for an edge-functions platform:
//! - a static-asset directory,
//! - a generated request-handling entry module wired to the application's
//!   runtime server,
//! - a pruned dependency set containing only the files the entry actually
//!   needs, and
//! - a platform manifest carrying the selected runtime version.
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod cli;
pub mod error;
pub mod packager;

// Re-export commonly used types
pub use error::{CliError, EdgepackError, Result};
pub use packager::{Pipeline, ServerPlugin, Settings, SettingsBuilder};
