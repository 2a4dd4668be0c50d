//! Output directory layout.
//!
//! Owns the package directory's lifecycle: full reset, directory creation,
//! static-asset copy, and the mode-dependent tree copy.

use crate::packager::error::{ErrorExt, Result};
use crate::packager::settings::Settings;
use crate::packager::utils::fs;

/// Deployment shape of the package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutMode {
    /// Pre-rendered assets only, no server-side request handling.
    StaticOnly,
    /// Runtime server plus static assets.
    ServerRendered,
}

/// Removes the output directory and all its contents.
///
/// Idempotent: a non-existent path is a no-op, not an error.
pub async fn reset(settings: &Settings) -> Result<()> {
    log::debug!("resetting output directory {}", settings.output_dir().display());
    fs::remove_dir_all(settings.output_dir()).await
}

/// Lays out the package directory for the given mode.
///
/// Both modes copy the static-asset subtree verbatim to `static/` at the
/// output root. Static-only mode additionally copies the pre-rendered HTML
/// tree directly into the output root. Server-rendered mode copies the whole
/// build output into the runtime-functions directory, excluding the static
/// subtree by path containment so a nested directory that merely shares its
/// name is still copied.
pub async fn layout(settings: &Settings, mode: LayoutMode) -> Result<()> {
    let output_dir = settings.output_dir();
    tokio::fs::create_dir_all(output_dir)
        .await
        .fs_context("creating output directory", output_dir)?;

    let dist_static = settings.dist_static_dir();
    fs::copy_dir(&dist_static, &settings.output_static_dir()).await?;

    match mode {
        LayoutMode::StaticOnly => {
            fs::copy_dir(&settings.dist_html_dir(), output_dir).await?;
        }
        LayoutMode::ServerRendered => {
            fs::copy_dir_excluding(settings.dist_dir(), &settings.funcs_dir(), &dist_static)
                .await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packager::settings::SettingsBuilder;
    use std::path::Path;

    fn write(path: &Path, contents: &str) {
        std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        std::fs::write(path, contents).expect("write");
    }

    fn fixture(app: &Path) -> Settings {
        write(&app.join("dist/static/app.css"), "body {}");
        write(&app.join("dist/html/main/index.html"), "<html></html>");
        write(&app.join("dist/bundles/server.js"), "module.exports = {};");
        write(&app.join("dist/bundles/static/chunk.js"), "nested");
        write(&app.join("dist/route.json"), "{}");
        SettingsBuilder::new().app_dir(app).build().expect("build")
    }

    #[tokio::test]
    async fn reset_tolerates_missing_output() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = SettingsBuilder::new()
            .app_dir(dir.path())
            .build()
            .expect("build");
        reset(&settings).await.expect("first reset");
        reset(&settings).await.expect("second reset");
    }

    #[tokio::test]
    async fn static_only_layout_has_no_functions_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = fixture(dir.path());

        layout(&settings, LayoutMode::StaticOnly).await.expect("layout");

        assert!(settings.output_static_dir().join("app.css").is_file());
        assert!(settings.output_dir().join("main/index.html").is_file());
        assert!(!settings.funcs_dir().exists());
    }

    #[tokio::test]
    async fn server_layout_excludes_static_by_containment() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = fixture(dir.path());

        layout(&settings, LayoutMode::ServerRendered)
            .await
            .expect("layout");

        let funcs = settings.funcs_dir();
        assert!(settings.output_static_dir().join("app.css").is_file());
        assert!(funcs.join("bundles/server.js").is_file());
        assert!(funcs.join("route.json").is_file());
        // top-level static subtree is excluded from the functions copy
        assert!(!funcs.join("static").exists());
        // but a nested directory named "static" is not
        assert!(funcs.join("bundles/static/chunk.js").is_file());
    }

    #[tokio::test]
    async fn missing_build_output_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = SettingsBuilder::new()
            .app_dir(dir.path())
            .build()
            .expect("build");
        let err = layout(&settings, LayoutMode::ServerRendered)
            .await
            .expect_err("must fail");
        assert!(err.to_string().contains("static"));
    }
}
