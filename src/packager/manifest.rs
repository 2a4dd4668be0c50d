//! Platform manifest loading, merging, and writing.
//!
//! The package carries a single control file, `<name>.json`, merged from an
//! optional user-authored manifest at the application root and the fragment
//! the pipeline computes. The computed fragment is the overlay: on key
//! conflicts the pipeline's value wins, everything else the user wrote
//! survives.

use crate::packager::error::{Error, ErrorExt, Result};
use serde_json::{Map, Value};
use std::path::Path;

/// Loads the user-authored manifest at `path`.
///
/// An absent file yields an empty manifest. A file that exists but does not
/// parse as a JSON object is an input error, reported before any output is
/// written.
pub async fn load_user_manifest(path: &Path) -> Result<Map<String, Value>> {
    let raw = match tokio::fs::read(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
        Err(e) => {
            return Err(Error::FsError {
                operation: "reading user manifest".to_string(),
                path: path.to_path_buf(),
                source: e,
            });
        }
    };

    let value: Value = serde_json::from_slice(&raw).map_err(|source| Error::ManifestParse {
        path: path.to_path_buf(),
        source,
    })?;

    match value {
        Value::Object(map) => Ok(map),
        other => Err(Error::GenericError(format!(
            "manifest {} must be a JSON object, found {other}",
            path.display()
        ))),
    }
}

/// Deep-merges `overlay` into `base`.
///
/// Objects merge recursively; arrays and scalars from the overlay replace
/// the base value wholesale.
pub fn deep_merge(base: &mut Map<String, Value>, overlay: Map<String, Value>) {
    for (key, overlay_value) in overlay {
        match (base.get_mut(&key), overlay_value) {
            (Some(Value::Object(base_obj)), Value::Object(overlay_obj)) => {
                deep_merge(base_obj, overlay_obj);
            }
            (_, overlay_value) => {
                base.insert(key, overlay_value);
            }
        }
    }
}

/// Writes the merged manifest to `path`.
pub async fn write_manifest(path: &Path, manifest: &Map<String, Value>) -> Result<()> {
    let mut rendered = serde_json::to_string_pretty(manifest)?;
    rendered.push('\n');
    tokio::fs::write(path, rendered)
        .await
        .fs_context("writing platform manifest", path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn merge_keeps_disjoint_keys() {
        let mut base = object(json!({"region": "auto"}));
        deep_merge(&mut base, object(json!({"nodeVersion": "22.11.0"})));
        assert_eq!(
            Value::Object(base),
            json!({"region": "auto", "nodeVersion": "22.11.0"})
        );
    }

    // The pipeline-computed fragment is the overlay and wins on conflict.
    // This precedence is a designed policy choice, pinned here.
    #[test]
    fn computed_fragment_wins_on_conflict() {
        let mut base = object(json!({"nodeVersion": "16.20.2", "region": "auto"}));
        deep_merge(&mut base, object(json!({"nodeVersion": "22.11.0"})));
        assert_eq!(
            Value::Object(base),
            json!({"nodeVersion": "22.11.0", "region": "auto"})
        );
    }

    #[test]
    fn merge_recurses_into_nested_objects() {
        let mut base = object(json!({"cache": {"ttl": 60, "edge": true}}));
        deep_merge(&mut base, object(json!({"cache": {"ttl": 120}})));
        assert_eq!(
            Value::Object(base),
            json!({"cache": {"ttl": 120, "edge": true}})
        );
    }

    #[test]
    fn overlay_replaces_arrays_wholesale() {
        let mut base = object(json!({"headers": ["a", "b"]}));
        deep_merge(&mut base, object(json!({"headers": ["c"]})));
        assert_eq!(Value::Object(base), json!({"headers": ["c"]}));
    }

    #[tokio::test]
    async fn absent_user_manifest_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let manifest = load_user_manifest(&dir.path().join("edgepack.json"))
            .await
            .expect("load");
        assert!(manifest.is_empty());
    }

    #[tokio::test]
    async fn malformed_user_manifest_is_an_input_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("edgepack.json");
        std::fs::write(&path, "{ not json").expect("write");
        let err = load_user_manifest(&path).await.expect_err("must fail");
        assert!(matches!(err, Error::ManifestParse { .. }));
    }
}
