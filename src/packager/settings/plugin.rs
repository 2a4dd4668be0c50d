//! Server-plugin descriptors.

use crate::packager::error::{Error, Result};

/// A server plugin to load in the generated entry module.
///
/// Ordering is significant: plugins are imported and registered in the
/// generated code in exactly the order they appear in
/// [`Settings::server_plugins`](super::Settings::server_plugins).
#[derive(Debug, Clone, PartialEq)]
pub struct ServerPlugin {
    /// Package name of the plugin, as it would be `require`d.
    pub name: String,

    /// Plugin options, serialized verbatim into the registration call.
    ///
    /// `None` renders as a no-argument call.
    pub options: Option<serde_json::Value>,
}

impl ServerPlugin {
    /// Creates a plugin descriptor.
    pub fn new(name: impl Into<String>, options: Option<serde_json::Value>) -> Self {
        Self {
            name: name.into(),
            options,
        }
    }

    /// Parses the CLI syntax `NAME` or `NAME=<options-json>`.
    pub fn parse(spec: &str) -> Result<Self> {
        let (name, options) = match spec.split_once('=') {
            Some((name, raw)) => {
                let options = serde_json::from_str(raw).map_err(|e| {
                    Error::GenericError(format!("invalid options JSON for plugin {name}: {e}"))
                })?;
                (name, Some(options))
            }
            None => (spec, None),
        };

        if name.is_empty() {
            return Err(Error::GenericError("plugin name cannot be empty".into()));
        }

        Ok(Self::new(name, options))
    }
}

/// clap-compatible value parser for `--server-plugin`.
pub fn parse_plugin_arg(spec: &str) -> std::result::Result<ServerPlugin, String> {
    ServerPlugin::parse(spec).map_err(|e| e.to_string())
}
