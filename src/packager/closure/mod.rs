//! Dependency-closure narrowing.
//!
//! Computes the minimal set of filesystem paths the generated entry module
//! needs to run standalone and copies it next to the entry, rewriting each
//! copied package's manifest on the way.
//!
//! # Module Organization
//!
//! - `tracer` - [`ModuleTracer`] capability + specifier-scanning implementation
//! - `package_json` - manifest transforms applied before the copy

pub mod package_json;
pub mod tracer;

pub use tracer::{ModuleTracer, ScanTracer};

use crate::packager::error::{Error, ErrorExt, Result};
use crate::packager::settings::Settings;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

type WholePackagePredicate = Box<dyn Fn(&str) -> bool + Send + Sync>;
type ManifestTransform = Box<dyn Fn(Value) -> Value + Send + Sync>;

/// Outcome of a closure run, for logging and assertions.
#[derive(Debug, Clone, Copy)]
pub struct ClosureReport {
    /// Files the tracer proved reachable (entries included).
    pub traced: usize,
    /// Files copied into the pruned tree.
    pub files_copied: usize,
    /// Packages the copy touched.
    pub packages: usize,
}

/// Builds and copies the pruned dependency set for a generated tree.
///
/// Entry set: every module in the source directory plus the force-included
/// entries. A module that cannot be resolved aborts the run; the pruned set
/// must be provably sufficient, never best-effort.
pub struct DependencyCloser {
    app_dir: PathBuf,
    source_dir: PathBuf,
    include_entries: Vec<PathBuf>,
    copy_whole_package: WholePackagePredicate,
    transform_manifest: ManifestTransform,
    tracer: Box<dyn ModuleTracer>,
}

impl DependencyCloser {
    /// Creates a closer for the given application root and generated tree.
    ///
    /// Defaults: no whole-package copies, the `module-sync`-stripping
    /// manifest transform, and the specifier-scanning tracer.
    pub fn new(app_dir: impl Into<PathBuf>, source_dir: impl Into<PathBuf>) -> Self {
        let app_dir = app_dir.into();
        Self {
            tracer: Box::new(ScanTracer::new(app_dir.clone())),
            app_dir,
            source_dir: source_dir.into(),
            include_entries: Vec::new(),
            copy_whole_package: Box::new(|_| false),
            transform_manifest: Box::new(package_json::strip_module_sync),
        }
    }

    /// Creates a closer configured from packaging settings.
    pub fn from_settings(settings: &Settings) -> Self {
        let whole: Vec<String> = settings.whole_packages().to_vec();
        Self::new(settings.app_dir(), settings.funcs_dir())
            .include_entries(settings.include_entries().to_vec())
            .copy_whole_package(move |name| whole.iter().any(|pkg| pkg == name))
    }

    /// Sets the paths force-included in the closure even when static
    /// analysis observes no reference to them.
    pub fn include_entries(mut self, entries: Vec<PathBuf>) -> Self {
        self.include_entries = entries;
        self
    }

    /// Sets the predicate selecting packages copied wholesale because their
    /// file set cannot be statically determined.
    pub fn copy_whole_package(
        mut self,
        predicate: impl Fn(&str) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.copy_whole_package = Box::new(predicate);
        self
    }

    /// Sets the transform applied to every copied package manifest.
    pub fn transform_manifest(
        mut self,
        transform: impl Fn(Value) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.transform_manifest = Box::new(transform);
        self
    }

    /// Replaces the module tracer.
    pub fn with_tracer(mut self, tracer: impl ModuleTracer + 'static) -> Self {
        self.tracer = Box::new(tracer);
        self
    }

    /// Computes the closure and copies the pruned tree.
    ///
    /// Blocking; callers on an async runtime should wrap this in
    /// `spawn_blocking`.
    pub fn run(&self) -> Result<ClosureReport> {
        let mut entries = collect_source_modules(&self.source_dir)?;
        for entry in &self.include_entries {
            if !entry.is_file() {
                crate::bail!("force-included entry {} does not exist", entry.display());
            }
            entries.push(entry.clone());
        }

        let closure = self.tracer.trace(&entries)?;
        let traced = closure.len();

        let node_modules_root = self.app_dir.join("node_modules");
        let mut by_package: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();
        for path in &closure {
            if path.starts_with(&self.source_dir) {
                continue; // already part of the generated tree
            }
            if !path.starts_with(&node_modules_root) {
                crate::bail!(
                    "closure file {} escapes the application's dependency tree",
                    path.display()
                );
            }
            let pkg_dir = owning_package_dir(path, &node_modules_root)?;
            by_package.entry(pkg_dir).or_default().push(path.clone());
        }

        let dest_root = self.source_dir.join("node_modules");
        let mut files_copied = 0usize;

        for (pkg_dir, pkg_files) in &by_package {
            let rel = pkg_dir.strip_prefix(&node_modules_root)?;
            let dest_dir = dest_root.join(rel);
            let name = package_name(pkg_dir);

            if (self.copy_whole_package)(&name) {
                log::debug!("copying whole package {name}");
                files_copied += copy_tree(pkg_dir, &dest_dir)?;
            } else {
                for file in pkg_files {
                    let rel_file = file.strip_prefix(pkg_dir)?;
                    copy_file_sync(file, &dest_dir.join(rel_file))?;
                    files_copied += 1;
                }
            }

            // Rewrite the manifest last so it also supersedes a whole-copy.
            let manifest_path = pkg_dir.join("package.json");
            if manifest_path.is_file() {
                let raw = std::fs::read(&manifest_path)
                    .fs_context("reading package manifest", &manifest_path)?;
                let manifest: Value =
                    serde_json::from_slice(&raw).map_err(|source| Error::ManifestParse {
                        path: manifest_path.clone(),
                        source,
                    })?;
                let transformed = (self.transform_manifest)(manifest);
                let mut rendered = serde_json::to_string_pretty(&transformed)?;
                rendered.push('\n');
                let dest_manifest = dest_dir.join("package.json");
                if let Some(parent) = dest_manifest.parent() {
                    std::fs::create_dir_all(parent)
                        .fs_context("creating package directory", parent)?;
                }
                std::fs::write(&dest_manifest, rendered)
                    .fs_context("writing package manifest", &dest_manifest)?;
            }
        }

        let report = ClosureReport {
            traced,
            files_copied,
            packages: by_package.len(),
        };
        log::info!(
            "✓ Pruned dependency set: {} files across {} packages",
            report.files_copied,
            report.packages
        );
        Ok(report)
    }
}

/// Collects the generated tree's own modules as trace roots.
fn collect_source_modules(source_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut modules = Vec::new();
    for entry in walkdir::WalkDir::new(source_dir) {
        let entry = entry?;
        if entry.path().components().any(|c| c.as_os_str() == "node_modules") {
            continue;
        }
        if !entry.file_type().is_file() {
            continue;
        }
        let is_module = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| matches!(e, "js" | "cjs" | "mjs"));
        if is_module {
            modules.push(entry.path().to_path_buf());
        }
    }
    modules.sort();
    Ok(modules)
}

/// Finds the package directory owning a traced file.
///
/// Prefers the nearest ancestor carrying a `package.json`; falls back to the
/// `node_modules/<name>` (or `node_modules/@scope/<name>`) path shape for
/// manifest-less packages.
fn owning_package_dir(file: &Path, node_modules_root: &Path) -> Result<PathBuf> {
    for dir in file.ancestors().skip(1) {
        if !dir.starts_with(node_modules_root) {
            break;
        }
        if dir.join("package.json").is_file() {
            return Ok(dir.to_path_buf());
        }
    }

    let mut current = file.parent();
    while let Some(dir) = current {
        let Some(parent) = dir.parent() else { break };
        let parent_is_nm = parent.file_name().is_some_and(|n| n == "node_modules");
        let parent_is_scope = parent
            .file_name()
            .is_some_and(|n| n.to_string_lossy().starts_with('@'))
            && parent
                .parent()
                .and_then(|g| g.file_name())
                .is_some_and(|n| n == "node_modules");
        if parent_is_nm || parent_is_scope {
            return Ok(dir.to_path_buf());
        }
        current = Some(parent);
        if dir == node_modules_root {
            break;
        }
    }

    Err(Error::GenericError(format!(
        "cannot determine owning package for {}",
        file.display()
    )))
}

/// Package name from the manifest, or the directory shape when absent.
fn package_name(pkg_dir: &Path) -> String {
    if let Ok(raw) = std::fs::read(pkg_dir.join("package.json")) {
        if let Ok(manifest) = serde_json::from_slice::<Value>(&raw) {
            if let Some(name) = manifest.get("name").and_then(|v| v.as_str()) {
                return name.to_string();
            }
        }
    }

    let dir_name = pkg_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let scope = pkg_dir
        .parent()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| n.starts_with('@'));
    match scope {
        Some(scope) => format!("{scope}/{dir_name}"),
        None => dir_name,
    }
}

fn copy_file_sync(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent() {
        std::fs::create_dir_all(parent).fs_context("creating destination directory", parent)?;
    }
    std::fs::copy(from, to).fs_context("copying dependency file", from)?;
    Ok(())
}

fn copy_tree(from: &Path, to: &Path) -> Result<usize> {
    let mut copied = 0usize;
    for entry in walkdir::WalkDir::new(from) {
        let entry = entry?;
        let rel = entry.path().strip_prefix(from)?;
        let dest = to.join(rel);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&dest).fs_context("creating package directory", &dest)?;
        } else {
            copy_file_sync(entry.path(), &dest)?;
            copied += 1;
        }
    }
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::fs;

    fn write(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(path, contents).expect("write");
    }

    /// App fixture with a runtime server package, a helper dependency, and
    /// one package that is never referenced statically.
    fn fixture(app: &Path) {
        write(
            &app.join("node_modules/@scope/server/package.json"),
            r#"{"name": "@scope/server", "main": "index.js", "exports": {".": {"module-sync": "./sync.mjs", "node": "./index.js"}}}"#,
        );
        write(
            &app.join("node_modules/@scope/server/index.js"),
            "const helper = require('helper');\nmodule.exports = helper;",
        );
        write(
            &app.join("node_modules/helper/package.json"),
            r#"{"name": "helper", "main": "lib/index.js"}"#,
        );
        write(&app.join("node_modules/helper/lib/index.js"), "module.exports = 1;");
        write(&app.join("node_modules/helper/lib/unused.js"), "module.exports = 2;");
        write(
            &app.join("node_modules/dynamic-pkg/package.json"),
            r#"{"name": "dynamic-pkg", "main": "index.js"}"#,
        );
        write(&app.join("node_modules/dynamic-pkg/index.js"), "module.exports = 3;");
        write(&app.join("node_modules/dynamic-pkg/extra/data.js"), "module.exports = 4;");

        write(
            &app.join(".edgepack/node-functions/entry.js"),
            "const server = require('@scope/server');\nmodule.exports = server;",
        );
    }

    fn copied_files(root: &Path) -> BTreeSet<PathBuf> {
        walkdir::WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.path().strip_prefix(root).expect("prefix").to_path_buf())
            .collect()
    }

    #[test]
    fn closure_prunes_unreferenced_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = dir.path();
        fixture(app);

        let funcs = app.join(".edgepack/node-functions");
        let report = DependencyCloser::new(app, &funcs).run().expect("closure");

        let copied = copied_files(&funcs.join("node_modules"));
        assert!(copied.contains(Path::new("@scope/server/index.js")));
        assert!(copied.contains(Path::new("helper/lib/index.js")));
        // not in the closure, not copied
        assert!(!copied.contains(Path::new("helper/lib/unused.js")));
        assert!(!copied.contains(Path::new("dynamic-pkg/index.js")));
        assert_eq!(report.packages, 2);
    }

    #[test]
    fn include_entries_are_forced_into_the_closure() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = dir.path();
        fixture(app);

        let funcs = app.join(".edgepack/node-functions");
        DependencyCloser::new(app, &funcs)
            .include_entries(vec![app.join("node_modules/dynamic-pkg/index.js")])
            .run()
            .expect("closure");

        let copied = copied_files(&funcs.join("node_modules"));
        assert!(copied.contains(Path::new("dynamic-pkg/index.js")));
        // forcing one entry does not drag in that package's unrelated files
        assert!(!copied.contains(Path::new("dynamic-pkg/extra/data.js")));
    }

    #[test]
    fn shrinking_the_include_set_never_grows_the_closure() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = dir.path();
        fixture(app);
        let funcs = app.join(".edgepack/node-functions");

        let with_extra = DependencyCloser::new(app, &funcs)
            .include_entries(vec![app.join("node_modules/dynamic-pkg/index.js")])
            .run()
            .expect("closure");
        let with_files = copied_files(&funcs.join("node_modules"));

        fs::remove_dir_all(funcs.join("node_modules")).expect("cleanup");
        let without_extra = DependencyCloser::new(app, &funcs).run().expect("closure");
        let without_files = copied_files(&funcs.join("node_modules"));

        assert!(without_extra.files_copied <= with_extra.files_copied);
        assert!(without_files.is_subset(&with_files));
    }

    #[test]
    fn whole_package_predicate_copies_everything() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = dir.path();
        fixture(app);

        let funcs = app.join(".edgepack/node-functions");
        DependencyCloser::new(app, &funcs)
            .copy_whole_package(|name| name == "helper")
            .run()
            .expect("closure");

        let copied = copied_files(&funcs.join("node_modules"));
        assert!(copied.contains(Path::new("helper/lib/index.js")));
        assert!(copied.contains(Path::new("helper/lib/unused.js")));
    }

    #[test]
    fn copied_manifests_lose_module_sync_conditions() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = dir.path();
        fixture(app);

        let funcs = app.join(".edgepack/node-functions");
        DependencyCloser::new(app, &funcs).run().expect("closure");

        let manifest: Value = serde_json::from_slice(
            &fs::read(funcs.join("node_modules/@scope/server/package.json")).expect("read"),
        )
        .expect("parse");
        assert_eq!(
            manifest["exports"],
            serde_json::json!({".": {"node": "./index.js"}})
        );
    }

    #[test]
    fn missing_include_entry_fails_the_run() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = dir.path();
        fixture(app);

        let funcs = app.join(".edgepack/node-functions");
        let err = DependencyCloser::new(app, &funcs)
            .include_entries(vec![app.join("node_modules/ghost/index.js")])
            .run()
            .expect_err("must fail");
        assert!(err.to_string().contains("ghost"));
    }
}
