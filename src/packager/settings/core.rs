//! Core Settings struct and implementations.

use super::ServerPlugin;
use crate::packager::{FUNCS_DIR, HTML_DIR, STATIC_DIR};
use std::path::{Path, PathBuf};

/// Main settings for a packaging run.
///
/// Central configuration for the packager, constructed via
/// [`SettingsBuilder`](super::SettingsBuilder). Captures the application
/// context handed over by the host build tool plus the packaging knobs.
/// Immutable for the duration of a run.
#[derive(Clone, Debug)]
pub struct Settings {
    /// Application root directory.
    app_dir: PathBuf,

    /// Build output directory produced by the application build.
    dist_dir: PathBuf,

    /// Output directory for the deployment package.
    output_dir: PathBuf,

    /// Ordered server plugins, preserved exactly in generated code.
    server_plugins: Vec<ServerPlugin>,

    /// Runtime-framework meta name (e.g. "modern").
    meta_name: String,

    /// Platform control-file stem; the manifest is `<stem>.json`.
    manifest_name: String,

    /// Whether the application needs the runtime server.
    ///
    /// False selects static-only mode: no entry module, no dependency
    /// closure, no runtime-version field in the manifest.
    needs_server: bool,

    /// Major version of the runtime on the host running the packaging step.
    host_node_version: String,

    /// Module files to force-include in the dependency closure even when
    /// static analysis observes no reference to them.
    include_entries: Vec<PathBuf>,

    /// Package names copied wholesale instead of file-by-file.
    whole_packages: Vec<String>,

    /// Optional handler template file overriding the embedded template.
    entry_template: Option<PathBuf>,

    /// Optional BFF route prefix forwarded into the generated server config.
    bff_prefix: Option<String>,
}

impl Settings {
    /// Returns the application root directory.
    pub fn app_dir(&self) -> &Path {
        &self.app_dir
    }

    /// Returns the build output directory.
    pub fn dist_dir(&self) -> &Path {
        &self.dist_dir
    }

    /// Returns the package output directory.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Returns the ordered server plugins.
    pub fn server_plugins(&self) -> &[ServerPlugin] {
        &self.server_plugins
    }

    /// Returns the runtime-framework meta name.
    pub fn meta_name(&self) -> &str {
        &self.meta_name
    }

    /// Returns the platform control-file stem.
    pub fn manifest_name(&self) -> &str {
        &self.manifest_name
    }

    /// Returns whether the application needs the runtime server.
    pub fn needs_server(&self) -> bool {
        self.needs_server
    }

    /// Returns the host runtime's major version.
    pub fn host_node_version(&self) -> &str {
        &self.host_node_version
    }

    /// Returns the force-included closure entries.
    pub fn include_entries(&self) -> &[PathBuf] {
        &self.include_entries
    }

    /// Returns the package names copied wholesale.
    pub fn whole_packages(&self) -> &[String] {
        &self.whole_packages
    }

    /// Returns the handler template override, if any.
    pub fn entry_template(&self) -> Option<&Path> {
        self.entry_template.as_deref()
    }

    /// Returns the BFF route prefix, if any.
    pub fn bff_prefix(&self) -> Option<&str> {
        self.bff_prefix.as_deref()
    }

    /// Static-asset subtree inside the build output.
    pub fn dist_static_dir(&self) -> PathBuf {
        self.dist_dir.join(STATIC_DIR)
    }

    /// Pre-rendered HTML tree inside the build output.
    pub fn dist_html_dir(&self) -> PathBuf {
        self.dist_dir.join(HTML_DIR)
    }

    /// Static-asset directory at the package root.
    pub fn output_static_dir(&self) -> PathBuf {
        self.output_dir.join(STATIC_DIR)
    }

    /// Runtime-functions directory inside the package.
    pub fn funcs_dir(&self) -> PathBuf {
        self.output_dir.join(FUNCS_DIR)
    }

    /// Platform manifest file name (`<stem>.json`).
    pub fn manifest_file_name(&self) -> String {
        format!("{}.json", self.manifest_name)
    }

    /// Optional user-authored manifest at the application root.
    pub fn user_manifest_path(&self) -> PathBuf {
        self.app_dir.join(self.manifest_file_name())
    }

    /// Merged manifest written into the package.
    pub fn output_manifest_path(&self) -> PathBuf {
        self.output_dir.join(self.manifest_file_name())
    }

    /// Creates a new Settings instance (used by SettingsBuilder).
    #[allow(clippy::too_many_arguments)]
    pub(super) fn new(
        app_dir: PathBuf,
        dist_dir: PathBuf,
        output_dir: PathBuf,
        server_plugins: Vec<ServerPlugin>,
        meta_name: String,
        manifest_name: String,
        needs_server: bool,
        host_node_version: String,
        include_entries: Vec<PathBuf>,
        whole_packages: Vec<String>,
        entry_template: Option<PathBuf>,
        bff_prefix: Option<String>,
    ) -> Self {
        Self {
            app_dir,
            dist_dir,
            output_dir,
            server_plugins,
            meta_name,
            manifest_name,
            needs_server,
            host_node_version,
            include_entries,
            whole_packages,
            entry_template,
            bff_prefix,
        }
    }
}
