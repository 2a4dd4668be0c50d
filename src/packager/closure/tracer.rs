//! Module-graph tracing.
//!
//! The closure algorithm's policy (force-include, whole-package copy,
//! manifest transform) is independent of how the module graph is walked, so
//! the walk lives behind [`ModuleTracer`]. The production implementation
//! scans sources for require/import specifiers and resolves them the way the
//! target runtime's module loader would.

use crate::packager::error::{Error, ErrorExt, Result};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Bfs;
use regex::Regex;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

/// Computes the set of files loaded, directly or transitively, by a set of
/// entry modules.
pub trait ModuleTracer: Send + Sync {
    /// Returns every file reachable from `entries`, including the entries
    /// themselves. A specifier that cannot be resolved is a hard failure.
    fn trace(&self, entries: &[PathBuf]) -> Result<BTreeSet<PathBuf>>;
}

static REQUIRE_SPECIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"require\(\s*['"]([^'"]+)['"]\s*\)"#).expect("require regex is valid")
});

static IMPORT_FROM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^\s*(?:import|export)\s+[^;'"]*?from\s+['"]([^'"]+)['"]"#)
        .expect("import regex is valid")
});

static BARE_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^\s*import\s+['"]([^'"]+)['"]"#).expect("bare import regex is valid")
});

static DYNAMIC_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"import\(\s*['"]([^'"]+)['"]\s*\)"#).expect("dynamic import regex is valid")
});

/// Runtime-provided modules that never resolve to files on disk.
const NODE_BUILTINS: &[&str] = &[
    "assert",
    "async_hooks",
    "buffer",
    "child_process",
    "cluster",
    "console",
    "constants",
    "crypto",
    "dgram",
    "diagnostics_channel",
    "dns",
    "domain",
    "events",
    "fs",
    "http",
    "http2",
    "https",
    "inspector",
    "module",
    "net",
    "os",
    "path",
    "perf_hooks",
    "process",
    "punycode",
    "querystring",
    "readline",
    "repl",
    "stream",
    "string_decoder",
    "timers",
    "tls",
    "trace_events",
    "tty",
    "url",
    "util",
    "v8",
    "vm",
    "worker_threads",
    "zlib",
];

/// Source extensions worth scanning for specifiers.
const SCANNABLE_EXTENSIONS: &[&str] = &["js", "cjs", "mjs"];

/// Extensions probed when a specifier omits one, in resolution order.
const PROBE_EXTENSIONS: &[&str] = &["js", "cjs", "mjs", "json", "node"];

/// Specifier-scanning tracer resolving modules CommonJS-style.
///
/// Bare specifiers are looked up through `node_modules` directories walking
/// up from the referrer; `app_dir`'s `node_modules` is the final fallback so
/// files generated outside the application tree still resolve against it.
pub struct ScanTracer {
    app_dir: PathBuf,
}

impl ScanTracer {
    /// Creates a tracer resolving against the given application root.
    pub fn new(app_dir: impl Into<PathBuf>) -> Self {
        Self {
            app_dir: app_dir.into(),
        }
    }

    /// Extracts every string-literal specifier from a source text.
    fn scan_specifiers(source: &str) -> BTreeSet<String> {
        let mut specifiers = BTreeSet::new();
        for regex in [&REQUIRE_SPECIFIER, &IMPORT_FROM, &BARE_IMPORT, &DYNAMIC_IMPORT] {
            for capture in regex.captures_iter(source) {
                if let Some(spec) = capture.get(1) {
                    specifiers.insert(spec.as_str().to_string());
                }
            }
        }
        specifiers
    }

    fn is_builtin(specifier: &str) -> bool {
        if specifier.starts_with("node:") {
            return true;
        }
        let head = specifier.split('/').next().unwrap_or(specifier);
        NODE_BUILTINS.contains(&head)
    }

    /// Resolves a specifier relative to the file that references it.
    ///
    /// Returns `None` for runtime builtins, the resolved file otherwise.
    fn resolve(&self, specifier: &str, referrer: &Path) -> Result<Option<PathBuf>> {
        if Self::is_builtin(specifier) {
            return Ok(None);
        }

        let unresolved = || Error::ModuleResolve {
            specifier: specifier.to_string(),
            referrer: referrer.to_path_buf(),
        };

        let referrer_dir = referrer.parent().ok_or_else(unresolved)?;

        if specifier.starts_with('.') || Path::new(specifier).is_absolute() {
            let base = normalize(&referrer_dir.join(specifier));
            return self.probe(&base).map(Some).ok_or_else(unresolved);
        }

        if let Some(alias) = specifier.strip_prefix('#') {
            return self.resolve_import_alias(alias, specifier, referrer);
        }

        let (name, subpath) = split_package_specifier(specifier);
        for dir in referrer_dir
            .ancestors()
            .chain(std::iter::once(self.app_dir.as_path()))
        {
            let pkg_dir = dir.join("node_modules").join(&name);
            if !pkg_dir.is_dir() {
                continue;
            }
            let resolved = match &subpath {
                Some(subpath) => self.package_subpath(&pkg_dir, subpath),
                None => self.package_entry(&pkg_dir),
            };
            // The package exists; failing to resolve inside it is terminal.
            return resolved.map(Some).ok_or_else(unresolved);
        }

        Err(unresolved())
    }

    /// Resolves a `#alias` through the nearest manifest's `imports` map.
    fn resolve_import_alias(
        &self,
        alias: &str,
        specifier: &str,
        referrer: &Path,
    ) -> Result<Option<PathBuf>> {
        let unresolved = || Error::ModuleResolve {
            specifier: specifier.to_string(),
            referrer: referrer.to_path_buf(),
        };

        for dir in referrer.ancestors().skip(1) {
            let manifest_path = dir.join("package.json");
            let Ok(raw) = std::fs::read(&manifest_path) else {
                continue;
            };
            let manifest: Value = serde_json::from_slice(&raw)
                .map_err(|source| Error::ManifestParse {
                    path: manifest_path.clone(),
                    source,
                })?;
            let target = manifest
                .get("imports")
                .and_then(|imports| imports.get(format!("#{alias}")))
                .and_then(resolve_export_target)
                .ok_or_else(unresolved)?;
            if target.starts_with('.') {
                return self
                    .probe(&normalize(&dir.join(&target)))
                    .map(Some)
                    .ok_or_else(unresolved);
            }
            return self.resolve(&target, referrer);
        }

        Err(unresolved())
    }

    /// Resolves a path that may omit its extension or point at a directory.
    fn probe(&self, base: &Path) -> Option<PathBuf> {
        if let Some(file) = probe_file(base) {
            return Some(file);
        }
        if base.is_dir() {
            return self.package_entry(base);
        }
        None
    }

    /// Resolves a subpath inside a package.
    ///
    /// An exports map takes precedence over the literal file layout, as it
    /// does for the target runtime's loader.
    fn package_subpath(&self, pkg_dir: &Path, subpath: &str) -> Option<PathBuf> {
        let manifest_path = pkg_dir.join("package.json");
        if let Ok(raw) = std::fs::read(&manifest_path) {
            if let Ok(manifest) = serde_json::from_slice::<Value>(&raw) {
                if let Some(Value::Object(exports)) = manifest.get("exports") {
                    if let Some(target) = exports
                        .get(&format!("./{subpath}"))
                        .and_then(resolve_export_target)
                    {
                        if let Some(file) = probe_file(&pkg_dir.join(&target)) {
                            return Some(file);
                        }
                    }
                }
            }
        }
        self.probe(&pkg_dir.join(subpath))
    }

    /// Resolves a package directory to its entry file.
    ///
    /// Consults `exports` (condition order `node` → `require` → `default`),
    /// then `main`, then `index.*`.
    fn package_entry(&self, pkg_dir: &Path) -> Option<PathBuf> {
        let manifest_path = pkg_dir.join("package.json");
        if let Ok(raw) = std::fs::read(&manifest_path) {
            if let Ok(manifest) = serde_json::from_slice::<Value>(&raw) {
                if let Some(target) = manifest.get("exports").and_then(resolve_export_target) {
                    if let Some(file) = probe_file(&pkg_dir.join(&target)) {
                        return Some(file);
                    }
                }
                if let Some(main) = manifest.get("main").and_then(|v| v.as_str()) {
                    let base = pkg_dir.join(main);
                    if let Some(file) = probe_file(&base) {
                        return Some(file);
                    }
                    if let Some(file) = probe_index(&base) {
                        return Some(file);
                    }
                }
            }
        }
        probe_index(pkg_dir)
    }
}

impl ModuleTracer for ScanTracer {
    fn trace(&self, entries: &[PathBuf]) -> Result<BTreeSet<PathBuf>> {
        let mut graph: DiGraph<PathBuf, ()> = DiGraph::new();
        let mut indices: BTreeMap<PathBuf, NodeIndex> = BTreeMap::new();
        let mut queue: VecDeque<NodeIndex> = VecDeque::new();

        fn intern(
            path: PathBuf,
            graph: &mut DiGraph<PathBuf, ()>,
            indices: &mut BTreeMap<PathBuf, NodeIndex>,
            queue: &mut VecDeque<NodeIndex>,
        ) -> NodeIndex {
            if let Some(&index) = indices.get(&path) {
                return index;
            }
            let index = graph.add_node(path.clone());
            indices.insert(path, index);
            queue.push_back(index);
            index
        }

        let mut roots = Vec::with_capacity(entries.len());
        for entry in entries {
            if !entry.is_file() {
                crate::bail!("closure entry {} does not exist", entry.display());
            }
            roots.push(intern(normalize(entry), &mut graph, &mut indices, &mut queue));
        }

        while let Some(index) = queue.pop_front() {
            let path = graph[index].clone();
            if !is_scannable(&path) {
                continue;
            }
            let raw = std::fs::read(&path).fs_context("reading module for tracing", &path)?;
            let source = String::from_utf8_lossy(&raw);

            for specifier in Self::scan_specifiers(&source) {
                if let Some(resolved) = self.resolve(&specifier, &path)? {
                    let to = intern(normalize(&resolved), &mut graph, &mut indices, &mut queue);
                    graph.add_edge(index, to, ());
                }
            }
        }

        let mut closure = BTreeSet::new();
        for root in roots {
            let mut bfs = Bfs::new(&graph, root);
            while let Some(node) = bfs.next(&graph) {
                closure.insert(graph[node].clone());
            }
        }
        Ok(closure)
    }
}

/// Splits a bare specifier into package name and optional subpath.
fn split_package_specifier(specifier: &str) -> (String, Option<String>) {
    let segments: Vec<&str> = specifier.splitn(3, '/').collect();
    if specifier.starts_with('@') {
        match segments.as_slice() {
            [scope, name] => (format!("{scope}/{name}"), None),
            [scope, name, rest] => (format!("{scope}/{name}"), Some(rest.to_string())),
            _ => (specifier.to_string(), None),
        }
    } else {
        match segments.as_slice() {
            [name] => (name.to_string(), None),
            [name, rest @ ..] => (name.to_string(), Some(rest.join("/"))),
            _ => (specifier.to_string(), None),
        }
    }
}

/// Picks a target out of an exports-style value.
///
/// Strings resolve directly; objects resolve through the `.` subpath then
/// the condition order `node` → `require` → `default`. Subpath maps without
/// a `.` entry have no default target.
fn resolve_export_target(value: &Value) -> Option<String> {
    match value {
        Value::String(target) => Some(target.clone()),
        Value::Object(map) => {
            if let Some(dot) = map.get(".") {
                return resolve_export_target(dot);
            }
            if map.keys().any(|key| key.starts_with('.')) {
                return None;
            }
            for condition in ["node", "require", "default"] {
                if let Some(next) = map.get(condition) {
                    if let Some(target) = resolve_export_target(next) {
                        return Some(target);
                    }
                }
            }
            None
        }
        _ => None,
    }
}

fn probe_file(base: &Path) -> Option<PathBuf> {
    if base.is_file() {
        return Some(base.to_path_buf());
    }
    let raw = base.as_os_str().to_string_lossy();
    for extension in PROBE_EXTENSIONS {
        let candidate = PathBuf::from(format!("{raw}.{extension}"));
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

fn probe_index(dir: &Path) -> Option<PathBuf> {
    probe_file(&dir.join("index"))
}

fn is_scannable(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| SCANNABLE_EXTENSIONS.contains(&e))
}

/// Folds `.` and `..` components without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
