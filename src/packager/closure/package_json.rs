//! Package manifest transforms applied before the pruned copy.

use serde_json::Value;

/// Default manifest transform: strips the `module-sync` condition from the
/// package's exports map.
///
/// The target runtime does not understand that conditional-export variant,
/// and leaving it in place makes resolution fail at execution time. A
/// manifest without an object-shaped `exports` passes through untouched.
pub fn strip_module_sync(manifest: Value) -> Value {
    let Value::Object(mut map) = manifest else {
        return manifest;
    };

    if let Some(exports) = map.remove("exports") {
        map.insert("exports".to_string(), strip_condition(exports, "module-sync"));
    }

    Value::Object(map)
}

fn strip_condition(value: Value, condition: &str) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(key, _)| key != condition)
                .map(|(key, nested)| (key, strip_condition(nested, condition)))
                .collect(),
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strips_module_sync_at_every_depth() {
        let manifest = json!({
            "name": "pkg",
            "exports": {
                ".": {
                    "module-sync": "./dist/sync.mjs",
                    "require": "./dist/index.cjs",
                    "default": "./dist/index.js"
                },
                "./edge": {
                    "node": { "module-sync": "./edge-sync.mjs", "default": "./edge.js" }
                }
            }
        });

        let transformed = strip_module_sync(manifest);
        assert_eq!(
            transformed,
            json!({
                "name": "pkg",
                "exports": {
                    ".": {
                        "require": "./dist/index.cjs",
                        "default": "./dist/index.js"
                    },
                    "./edge": {
                        "node": { "default": "./edge.js" }
                    }
                }
            })
        );
    }

    #[test]
    fn manifests_without_object_exports_pass_through() {
        let string_exports = json!({"name": "pkg", "exports": "./index.js"});
        assert_eq!(strip_module_sync(string_exports.clone()), string_exports);

        let no_exports = json!({"name": "pkg", "main": "index.js"});
        assert_eq!(strip_module_sync(no_exports.clone()), no_exports);
    }
}
