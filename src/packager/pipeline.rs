//! Packaging pipeline orchestration.
//!
//! Sequences the staged operations — reset, copy/layout, code generation,
//! dependency closure — and owns the cross-stage state (the computed
//! manifest fragment, the generated entry path). Stages are strictly
//! sequential and non-reentrant: each stage's side effects are on disk
//! before the next stage begins, because later stages read files earlier
//! stages wrote.

use crate::packager::closure::{ClosureReport, DependencyCloser};
use crate::packager::error::{Error, Result};
use crate::packager::layout::{self, LayoutMode};
use crate::packager::settings::Settings;
use crate::packager::version::{SUPPORTED_NODE_VERSIONS, select_node_version};
use crate::packager::{entry, manifest};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Pipeline progress through the staged protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Nothing has run.
    Idle,
    /// Output directory has been reset.
    Prepared,
    /// Static assets and runtime files are in place, manifest written.
    LaidOut,
    /// Entry module and companion generated.
    EntryGenerated,
    /// Dependency closure copied; the package is complete.
    Closed,
    /// Terminal state for applications without a runtime server.
    StaticOnly,
}

impl Stage {
    fn name(self) -> &'static str {
        match self {
            Stage::Idle => "idle",
            Stage::Prepared => "prepared",
            Stage::LaidOut => "laid-out",
            Stage::EntryGenerated => "entry-generated",
            Stage::Closed => "closed",
            Stage::StaticOnly => "static-only",
        }
    }
}

/// Deployment packaging pipeline.
///
/// Constructed fresh per packaging invocation. A failed run leaves the
/// output directory in an unspecified state; the recovery action is a new
/// run from [`prepare`](Pipeline::prepare), never a resume.
///
/// # Examples
///
/// ```no_run
/// use edgepack::packager::{Pipeline, SettingsBuilder};
///
/// # async fn example() -> edgepack::packager::Result<()> {
/// let settings = SettingsBuilder::new()
///     .app_dir("apps/site")
///     .host_node_version("22")
///     .build()?;
///
/// let mut pipeline = Pipeline::new(settings);
/// pipeline.run().await?;
/// # Ok(())
/// # }
/// ```
pub struct Pipeline {
    settings: Settings,
    stage: Stage,
    computed_manifest: Map<String, Value>,
    entry_file: Option<PathBuf>,
}

impl Pipeline {
    /// Creates an idle pipeline for the given settings.
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            stage: Stage::Idle,
            computed_manifest: Map::new(),
            entry_file: None,
        }
    }

    /// Returns the current stage.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Returns the packaging settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Returns the generated entry module path, once `gen_entry` has run.
    pub fn entry_file(&self) -> Option<&PathBuf> {
        self.entry_file.as_ref()
    }

    fn expect_stage(&self, expected: Stage, attempted: &'static str) -> Result<()> {
        if self.stage != expected {
            return Err(Error::StageOrder {
                attempted,
                current: self.stage.name(),
            });
        }
        Ok(())
    }

    /// Stage 1: clears any prior output directory.
    ///
    /// The only mandatory stage; idempotent with respect to the output path.
    pub async fn prepare(&mut self) -> Result<()> {
        self.expect_stage(Stage::Idle, "prepare")?;
        layout::reset(&self.settings).await?;
        self.stage = Stage::Prepared;
        Ok(())
    }

    /// Stage 2: lays out static/runtime files and writes the merged manifest.
    ///
    /// In server-rendered mode this also selects the runtime version and
    /// records it in the computed manifest fragment. Static-only
    /// applications transition directly to the terminal static-only state.
    pub async fn write_output(&mut self) -> Result<()> {
        self.expect_stage(Stage::Prepared, "write_output")?;

        let mode = if self.settings.needs_server() {
            LayoutMode::ServerRendered
        } else {
            LayoutMode::StaticOnly
        };
        layout::layout(&self.settings, mode).await?;

        if self.settings.needs_server() {
            let version = select_node_version(
                self.settings.host_node_version(),
                &SUPPORTED_NODE_VERSIONS,
            );
            log::debug!("selected runtime version {version}");
            self.computed_manifest
                .insert("nodeVersion".to_string(), Value::String(version));
        }

        let mut merged =
            manifest::load_user_manifest(&self.settings.user_manifest_path()).await?;
        manifest::deep_merge(&mut merged, self.computed_manifest.clone());
        manifest::write_manifest(&self.settings.output_manifest_path(), &merged).await?;

        self.stage = if self.settings.needs_server() {
            Stage::LaidOut
        } else {
            Stage::StaticOnly
        };
        Ok(())
    }

    /// Stage 3: renders and writes the entry module and its companion.
    ///
    /// Skipped entirely in static-only mode.
    pub async fn gen_entry(&mut self) -> Result<()> {
        if self.stage == Stage::StaticOnly {
            log::debug!("static-only package, skipping entry generation");
            return Ok(());
        }
        self.expect_stage(Stage::LaidOut, "gen_entry")?;

        self.entry_file = Some(entry::generate_entry_module(&self.settings).await?);
        self.stage = Stage::EntryGenerated;
        Ok(())
    }

    /// Stage 4: runs the dependency closure over the generated tree.
    ///
    /// Skipped entirely in static-only mode.
    pub async fn end(&mut self) -> Result<Option<ClosureReport>> {
        if self.stage == Stage::StaticOnly {
            log::debug!("static-only package, skipping dependency closure");
            return Ok(None);
        }
        self.expect_stage(Stage::EntryGenerated, "end")?;

        let closer = DependencyCloser::from_settings(&self.settings);
        let report = tokio::task::spawn_blocking(move || closer.run())
            .await
            .map_err(|e| Error::GenericError(format!("dependency closure task panicked: {e}")))??;

        self.stage = Stage::Closed;
        Ok(Some(report))
    }

    /// Drives all stages in order.
    pub async fn run(&mut self) -> Result<()> {
        self.prepare().await?;
        self.write_output().await?;
        self.gen_entry().await?;
        self.end().await?;
        log::info!(
            "✓ Packaged {} ({})",
            self.settings.output_dir().display(),
            self.stage.name()
        );
        Ok(())
    }
}
