//! Builder for constructing Settings.

use super::{ServerPlugin, Settings};
use std::path::{Path, PathBuf};

/// Default package output directory, relative to the application root.
pub const DEFAULT_OUTPUT_DIR: &str = ".edgepack";

/// Default platform control-file stem.
pub const DEFAULT_MANIFEST_NAME: &str = "edgepack";

/// Default runtime-framework meta name.
pub const DEFAULT_META_NAME: &str = "modern";

/// Builder for constructing [`Settings`].
///
/// Provides a fluent API for building packaging settings with validation.
///
/// # Examples
///
/// ```no_run
/// use edgepack::packager::SettingsBuilder;
///
/// # fn example() -> edgepack::packager::Result<()> {
/// let settings = SettingsBuilder::new()
///     .app_dir("apps/site")
///     .host_node_version("22")
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct SettingsBuilder {
    app_dir: Option<PathBuf>,
    dist_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    server_plugins: Vec<ServerPlugin>,
    meta_name: Option<String>,
    manifest_name: Option<String>,
    needs_server: Option<bool>,
    host_node_version: Option<String>,
    include_entries: Vec<PathBuf>,
    whole_packages: Vec<String>,
    entry_template: Option<PathBuf>,
    bff_prefix: Option<String>,
}

impl SettingsBuilder {
    /// Creates a new settings builder.
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets the application root directory.
    ///
    /// # Required
    ///
    /// This field is required for building.
    pub fn app_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.app_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the build output directory.
    ///
    /// Default: `<app_dir>/dist`
    pub fn dist_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.dist_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the package output directory.
    ///
    /// Default: `<app_dir>/.edgepack`
    pub fn output_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.output_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the ordered server-plugin list.
    ///
    /// Default: empty
    pub fn server_plugins(mut self, plugins: Vec<ServerPlugin>) -> Self {
        self.server_plugins = plugins;
        self
    }

    /// Sets the runtime-framework meta name.
    ///
    /// Default: `"modern"`
    pub fn meta_name(mut self, name: impl Into<String>) -> Self {
        self.meta_name = Some(name.into());
        self
    }

    /// Sets the platform control-file stem.
    ///
    /// Default: `"edgepack"`
    pub fn manifest_name(mut self, name: impl Into<String>) -> Self {
        self.manifest_name = Some(name.into());
        self
    }

    /// Sets whether the application needs the runtime server.
    ///
    /// Default: `true` (server-rendered mode)
    pub fn needs_server(mut self, needs_server: bool) -> Self {
        self.needs_server = Some(needs_server);
        self
    }

    /// Sets the host runtime's major version.
    ///
    /// The selector is a pure function of this value; the packager never
    /// inspects the executing process.
    ///
    /// Default: `"22"`
    pub fn host_node_version(mut self, version: impl Into<String>) -> Self {
        self.host_node_version = Some(version.into());
        self
    }

    /// Sets the force-included closure entries.
    ///
    /// Default: empty
    pub fn include_entries(mut self, entries: Vec<PathBuf>) -> Self {
        self.include_entries = entries;
        self
    }

    /// Sets the package names copied wholesale during closure.
    ///
    /// Default: empty
    pub fn whole_packages(mut self, packages: Vec<String>) -> Self {
        self.whole_packages = packages;
        self
    }

    /// Sets a handler template file overriding the embedded template.
    ///
    /// Default: None (embedded template)
    pub fn entry_template<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.entry_template = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the BFF route prefix for the generated server config.
    ///
    /// Default: None
    pub fn bff_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.bff_prefix = Some(prefix.into());
        self
    }

    /// Builds the settings.
    ///
    /// # Errors
    ///
    /// Returns an error if `app_dir` is missing.
    pub fn build(self) -> crate::packager::Result<Settings> {
        use crate::packager::error::Context;

        let app_dir = self.app_dir.context("app_dir is required")?;
        let dist_dir = self.dist_dir.unwrap_or_else(|| app_dir.join("dist"));
        let output_dir = self
            .output_dir
            .unwrap_or_else(|| app_dir.join(DEFAULT_OUTPUT_DIR));

        Ok(Settings::new(
            app_dir,
            dist_dir,
            output_dir,
            self.server_plugins,
            self.meta_name
                .unwrap_or_else(|| DEFAULT_META_NAME.to_string()),
            self.manifest_name
                .unwrap_or_else(|| DEFAULT_MANIFEST_NAME.to_string()),
            self.needs_server.unwrap_or(true),
            self.host_node_version.unwrap_or_else(|| "22".to_string()),
            self.include_entries,
            self.whole_packages,
            self.entry_template,
            self.bff_prefix,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_derive_from_app_dir() {
        let settings = SettingsBuilder::new()
            .app_dir("/srv/app")
            .build()
            .expect("build");
        assert_eq!(settings.dist_dir(), Path::new("/srv/app/dist"));
        assert_eq!(settings.output_dir(), Path::new("/srv/app/.edgepack"));
        assert_eq!(settings.manifest_file_name(), "edgepack.json");
        assert!(settings.needs_server());
    }

    #[test]
    fn app_dir_is_required() {
        assert!(SettingsBuilder::new().build().is_err());
    }
}
