//! Code fragments substituted into the handler template.
//!
//! Everything generated here must be deterministic: plugin fragments follow
//! the descriptor list order exactly, and JSON values serialize with sorted
//! keys, so identical inputs render byte-identical entry modules.

use crate::packager::error::Result;
use crate::packager::settings::{ServerPlugin, Settings};

/// Route-specification file read by the generated entry at startup.
pub const ROUTE_SPEC_FILE: &str = "route.json";

/// Server runtime-config directory inside the functions tree.
pub const SERVER_DIR: &str = "server";

/// Shared-code directory inside the functions tree.
pub const SHARED_DIR: &str = "shared";

/// API handlers directory inside the functions tree.
pub const API_DIR: &str = "api";

/// Lambda handlers directory inside the functions tree.
pub const LAMBDA_DIR: &str = "lambda";

/// Normalizes the runtime-framework meta name.
///
/// The long form of the default framework name collapses to its short form;
/// anything else passes through unchanged.
pub fn normalized_meta(name: &str) -> &str {
    if name == "modern-js" { "modern" } else { name }
}

/// Generates one import line per plugin, preserving list order.
pub fn plugin_imports_code(plugins: &[ServerPlugin]) -> Result<String> {
    let lines = plugins
        .iter()
        .enumerate()
        .map(|(index, plugin)| {
            Ok(format!(
                "const plugin_{index} = require({});",
                serde_json::to_string(&plugin.name)?
            ))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(lines.join("\n"))
}

/// Generates the plugin-registration array, preserving list order.
///
/// Options serialize with sorted keys; a plugin without options registers
/// with a no-argument call.
pub fn plugins_code(plugins: &[ServerPlugin]) -> Result<String> {
    let calls = plugins
        .iter()
        .enumerate()
        .map(|(index, plugin)| {
            Ok(match &plugin.options {
                Some(options) => {
                    format!("plugin_{index}.default({})", serde_json::to_string(options)?)
                }
                None => format!("plugin_{index}.default()"),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(format!("[{}]", calls.join(", ")))
}

/// Serializes the dynamic server options blob for the generated entry.
pub fn dynamic_prod_options(settings: &Settings) -> Result<String> {
    let options = serde_json::json!({
        "config": {
            "bff": { "prefix": settings.bff_prefix() },
            "output": { "distPath": { "root": "." } },
        }
    });
    Ok(serde_json::to_string(&options)?)
}

/// Emits a platform-portable path-join expression rooted at the entry's
/// directory, e.g. `path.join(__dirname, "shared")`.
pub fn dir_expr(segments: &[&str]) -> String {
    let quoted: Vec<String> = segments.iter().map(|s| format!("\"{s}\"")).collect();
    format!("path.join(__dirname, {})", quoted.join(", "))
}

/// Path-join expression for the runtime server-config file.
pub fn server_config_path_expr(meta: &str) -> String {
    let config_file = format!("{meta}.server");
    dir_expr(&[SERVER_DIR, &config_file])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn plugins() -> Vec<ServerPlugin> {
        vec![
            ServerPlugin::new("@scope/bff", Some(json!({"prefix": "/api"}))),
            ServerPlugin::new("logger-plugin", None),
        ]
    }

    #[test]
    fn imports_preserve_plugin_order() {
        let code = plugin_imports_code(&plugins()).expect("codegen");
        assert_eq!(
            code,
            "const plugin_0 = require(\"@scope/bff\");\nconst plugin_1 = require(\"logger-plugin\");"
        );
    }

    #[test]
    fn registration_preserves_order_and_options() {
        let code = plugins_code(&plugins()).expect("codegen");
        assert_eq!(
            code,
            "[plugin_0.default({\"prefix\":\"/api\"}), plugin_1.default()]"
        );
    }

    #[test]
    fn empty_plugin_list_renders_empty_array() {
        assert_eq!(plugins_code(&[]).expect("codegen"), "[]");
        assert_eq!(plugin_imports_code(&[]).expect("codegen"), "");
    }

    #[test]
    fn path_expressions_avoid_hardcoded_separators() {
        assert_eq!(
            server_config_path_expr("modern"),
            "path.join(__dirname, \"server\", \"modern.server\")"
        );
        assert_eq!(dir_expr(&[SHARED_DIR]), "path.join(__dirname, \"shared\")");
    }

    #[test]
    fn meta_name_normalization() {
        assert_eq!(normalized_meta("modern-js"), "modern");
        assert_eq!(normalized_meta("modern"), "modern");
        assert_eq!(normalized_meta("acme"), "acme");
    }
}
