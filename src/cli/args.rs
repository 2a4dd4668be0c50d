//! Command line argument parsing and validation.

use crate::packager::settings::{ServerPlugin, Settings, SettingsBuilder, parse_plugin_arg};
use clap::Parser;
use std::path::PathBuf;

/// Edge deployment packager for built web applications
#[derive(Parser, Debug)]
#[command(
    name = "edgepack",
    version,
    about = "Packages a built web application for an edge-functions platform",
    long_about = "Turns a compiled application's output tree into a self-contained deployment \
unit: static assets, a generated request-handling entry module, a pruned dependency set, and a \
platform manifest.

Usage:
  edgepack --app-dir .
  edgepack --app-dir apps/site --static-only
  edgepack --app-dir . --server-plugin '@scope/bff={\"prefix\":\"/api\"}' \\
           --include-entry node_modules/@modern-js/prod-server/dist/index.js

Exit code 0 = fully-formed package at the output directory. Any failure leaves the output in an \
unspecified state; rerun from scratch rather than resuming."
)]
pub struct Args {
    /// Application root directory
    #[arg(short = 'a', long, value_name = "DIR", default_value = ".")]
    pub app_dir: PathBuf,

    /// Build output directory (default: <app-dir>/dist)
    #[arg(short = 'd', long, value_name = "DIR")]
    pub dist_dir: Option<PathBuf>,

    /// Package output directory (default: <app-dir>/.edgepack)
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Package a pure static site: no entry module, no dependency closure
    #[arg(long)]
    pub static_only: bool,

    /// Major version of the runtime on this host, used to pick the target
    /// runtime version
    #[arg(long, value_name = "MAJOR", default_value = "22")]
    pub node_version: String,

    /// Server plugin to load in the generated entry, `NAME` or
    /// `NAME=<options-json>`; repeatable, order is preserved
    #[arg(long = "server-plugin", value_name = "NAME[=OPTIONS]", value_parser = parse_plugin_arg)]
    pub server_plugins: Vec<ServerPlugin>,

    /// Module file to force-include in the dependency closure; repeatable
    #[arg(long = "include-entry", value_name = "PATH")]
    pub include_entries: Vec<PathBuf>,

    /// Package to copy wholesale instead of file-by-file; repeatable
    #[arg(long = "copy-whole-package", value_name = "NAME")]
    pub whole_packages: Vec<String>,

    /// Platform control-file stem; the manifest is `<NAME>.json`
    #[arg(long, value_name = "NAME", default_value = "edgepack")]
    pub manifest_name: String,

    /// Runtime-framework meta name
    #[arg(long, value_name = "NAME", default_value = "modern")]
    pub meta_name: String,

    /// Handler template file overriding the embedded template
    #[arg(long, value_name = "FILE")]
    pub entry_template: Option<PathBuf>,

    /// BFF route prefix forwarded into the generated server config
    #[arg(long, value_name = "PREFIX")]
    pub bff_prefix: Option<String>,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.node_version.trim().parse::<u64>().is_err() {
            return Err(format!(
                "Invalid --node-version: {} (expected a major version like 22)",
                self.node_version
            ));
        }

        if self.manifest_name.is_empty()
            || self.manifest_name.contains(['/', '\\'])
            || self.manifest_name.contains('.')
        {
            return Err(format!(
                "Invalid --manifest-name: {} (expected a bare file stem)",
                self.manifest_name
            ));
        }

        Ok(())
    }

    /// Builds packaging settings from the parsed arguments.
    pub fn to_settings(&self) -> crate::error::Result<Settings> {
        // Resolve the application root so relative inputs compare cleanly
        // during closure computation.
        let app_dir = std::fs::canonicalize(&self.app_dir)?;

        let mut builder = SettingsBuilder::new()
            .app_dir(&app_dir)
            .server_plugins(self.server_plugins.clone())
            .meta_name(&self.meta_name)
            .manifest_name(&self.manifest_name)
            .needs_server(!self.static_only)
            .host_node_version(&self.node_version)
            .include_entries(
                self.include_entries
                    .iter()
                    .map(|path| {
                        if path.is_absolute() {
                            path.clone()
                        } else {
                            app_dir.join(path)
                        }
                    })
                    .collect(),
            )
            .whole_packages(self.whole_packages.clone());

        if let Some(dist_dir) = &self.dist_dir {
            builder = builder.dist_dir(dist_dir);
        }
        if let Some(output_dir) = &self.output_dir {
            builder = builder.output_dir(output_dir);
        }
        if let Some(template) = &self.entry_template {
            builder = builder.entry_template(template);
        }
        if let Some(prefix) = &self.bff_prefix {
            builder = builder.bff_prefix(prefix);
        }

        Ok(builder.build()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_args_validate() {
        let args = Args::parse_from(["edgepack"]);
        args.validate().expect("valid");
    }

    #[test]
    fn rejects_non_numeric_node_version() {
        let args = Args::parse_from(["edgepack", "--node-version", "latest"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn rejects_manifest_name_with_extension() {
        let args = Args::parse_from(["edgepack", "--manifest-name", "edgepack.json"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn plugin_order_is_preserved() {
        let args = Args::parse_from([
            "edgepack",
            "--server-plugin",
            "first",
            "--server-plugin",
            "second={\"x\":1}",
        ]);
        let names: Vec<&str> = args
            .server_plugins
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, ["first", "second"]);
    }
}
