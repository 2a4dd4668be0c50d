//! Entry-module generation.
//!
//! Renders the request-handling entry module from the handler template and
//! writes it, together with the request-forwarding companion module, into
//! the runtime-functions directory.
//!
//! # Module Organization
//!
//! - `template` - embedded handler template + companion source + placeholder set
//! - `codegen` - deterministic code fragments substituted into the template

pub mod codegen;
pub mod template;

use crate::packager::error::{Error, ErrorExt, Result};
use crate::packager::settings::Settings;
use handlebars::Handlebars;
use regex::Regex;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::LazyLock;

/// File name of the generated entry module, the platform's catch-all route.
pub const ENTRY_FILE_NAME: &str = "[[default]].js";

/// File name of the request-forwarding companion module.
pub const COMPANION_FILE_NAME: &str = "forward-request.js";

static PLACEHOLDER_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("placeholder regex is valid")
});

/// Substitution values for the handler template, one field per placeholder.
///
/// The struct is constructed exhaustively, so a forgotten placeholder value
/// is a compile error rather than a runtime surprise; strict-mode rendering
/// catches the reverse direction.
#[derive(Debug, serde::Serialize)]
pub struct EntryTemplateData {
    /// Plugin import lines, list order preserved.
    pub plugin_import_code: String,
    /// Quoted route-spec file literal.
    pub route_spec_file: String,
    /// JSON blob of dynamic server options.
    pub dynamic_prod_options: String,
    /// Plugin registration array, list order preserved.
    pub plugins_code: String,
    /// Path-join expression for the server-config file.
    pub server_directory: String,
    /// Path-join expression for the shared-code directory.
    pub shared_directory: String,
    /// Path-join expression for the API handlers directory.
    pub api_directory: String,
    /// Path-join expression for the lambda handlers directory.
    pub lambda_directory: String,
    /// Normalized runtime-framework name.
    pub meta_name: String,
}

impl EntryTemplateData {
    /// Builds the substitution set from the packaging settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let plugins = settings.server_plugins();
        let meta = codegen::normalized_meta(settings.meta_name());

        Ok(Self {
            plugin_import_code: codegen::plugin_imports_code(plugins)?,
            route_spec_file: format!("\"{}\"", codegen::ROUTE_SPEC_FILE),
            dynamic_prod_options: codegen::dynamic_prod_options(settings)?,
            plugins_code: codegen::plugins_code(plugins)?,
            server_directory: codegen::server_config_path_expr(meta),
            shared_directory: codegen::dir_expr(&[codegen::SHARED_DIR]),
            api_directory: codegen::dir_expr(&[codegen::API_DIR]),
            lambda_directory: codegen::dir_expr(&[codegen::LAMBDA_DIR]),
            meta_name: meta.to_string(),
        })
    }
}

/// Checks a template's token set against the declared placeholder set.
///
/// Every declared placeholder must appear at least once and no undeclared
/// token may appear at all; either mismatch is a build-time defect.
pub fn validate_placeholders(template_source: &str) -> Result<()> {
    let declared: BTreeSet<&str> = template::PLACEHOLDERS.iter().copied().collect();
    let mut seen: BTreeSet<&str> = BTreeSet::new();

    for capture in PLACEHOLDER_TOKEN.captures_iter(template_source) {
        let token = capture.get(1).map(|m| m.as_str()).unwrap_or_default();
        match declared.get(token) {
            Some(&token) => {
                seen.insert(token);
            }
            None => {
                return Err(Error::Template(format!(
                    "template references undeclared placeholder `{token}`"
                )));
            }
        }
    }

    let missing: Vec<&str> = declared.difference(&seen).copied().collect();
    if !missing.is_empty() {
        return Err(Error::Template(format!(
            "template is missing placeholders: {}",
            missing.join(", ")
        )));
    }

    Ok(())
}

/// Renders the handler template with the given substitution set.
///
/// Rendering is strict (an unknown token aborts instead of emitting nothing)
/// and unescaped, and replaces every occurrence of every placeholder. Given
/// identical inputs the output is byte-identical.
pub fn render_entry(template_source: &str, data: &EntryTemplateData) -> Result<String> {
    validate_placeholders(template_source)?;

    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars.set_strict_mode(true);

    handlebars
        .register_template_string("entry", template_source)
        .map_err(|e| Error::Template(format!("failed to register handler template: {e}")))?;

    handlebars
        .render("entry", data)
        .map_err(|e| Error::Template(format!("failed to render handler template: {e}")))
}

/// Generates the entry module and its companion into the functions directory.
///
/// Returns the path of the written entry module.
pub async fn generate_entry_module(settings: &Settings) -> Result<PathBuf> {
    let template_source = match settings.entry_template() {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .fs_context("reading handler template", path)?,
        None => template::ENTRY_TEMPLATE.to_string(),
    };

    let data = EntryTemplateData::from_settings(settings)?;
    let rendered = render_entry(&template_source, &data)?;

    let funcs_dir = settings.funcs_dir();
    tokio::fs::create_dir_all(&funcs_dir)
        .await
        .fs_context("creating functions directory", &funcs_dir)?;

    let entry_path = funcs_dir.join(ENTRY_FILE_NAME);
    tokio::fs::write(&entry_path, &rendered)
        .await
        .fs_context("writing entry module", &entry_path)?;

    let companion_path = funcs_dir.join(COMPANION_FILE_NAME);
    tokio::fs::write(&companion_path, template::COMPANION_SOURCE)
        .await
        .fs_context("writing companion module", &companion_path)?;

    log::info!("✓ Generated entry module: {}", entry_path.display());

    Ok(entry_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packager::settings::{ServerPlugin, SettingsBuilder};
    use serde_json::json;

    fn settings() -> Settings {
        SettingsBuilder::new()
            .app_dir("/srv/app")
            .server_plugins(vec![
                ServerPlugin::new("@scope/bff", Some(json!({"prefix": "/api"}))),
                ServerPlugin::new("logger-plugin", None),
            ])
            .build()
            .expect("build")
    }

    #[test]
    fn embedded_template_carries_the_declared_placeholder_set() {
        validate_placeholders(template::ENTRY_TEMPLATE).expect("embedded template is valid");
    }

    #[test]
    fn rendered_entry_has_no_residual_tokens() {
        let data = EntryTemplateData::from_settings(&settings()).expect("data");
        let rendered = render_entry(template::ENTRY_TEMPLATE, &data).expect("render");
        assert!(!rendered.contains("{{"));
        for token in template::PLACEHOLDERS {
            assert!(!rendered.contains(&format!("{{{{{token}}}}}")));
        }
        assert!(rendered.contains("const plugin_0 = require(\"@scope/bff\");"));
        assert!(rendered.contains("plugin_1.default()"));
        assert!(rendered.contains("path.join(__dirname, \"server\", \"modern.server\")"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let data = EntryTemplateData::from_settings(&settings()).expect("data");
        let first = render_entry(template::ENTRY_TEMPLATE, &data).expect("render");
        let second = render_entry(template::ENTRY_TEMPLATE, &data).expect("render");
        assert_eq!(first, second);
    }

    #[test]
    fn undeclared_token_is_rejected() {
        let err = validate_placeholders("{{plugin_import_code}} {{bogus_token}}")
            .expect_err("must fail");
        assert!(err.to_string().contains("bogus_token"));
    }

    #[test]
    fn missing_token_is_rejected() {
        let err = validate_placeholders("only {{plugin_import_code}} here").expect_err("must fail");
        assert!(err.to_string().contains("missing placeholders"));
    }
}
