//! Runtime version selection.
//!
//! Picks the supported execution-runtime version closest to the host that is
//! running the packaging step. This is a compatibility policy, not a
//! negotiation: the target platform is assumed to support every version in
//! the fixed list, and the selector only matches the build environment.

use semver::Version;

/// Runtime versions the target platform ships, ordered oldest to newest.
pub const SUPPORTED_NODE_VERSIONS: [&str; 5] = [
    "14.21.3",
    "16.20.2",
    "18.20.4",
    "20.18.0",
    "22.11.0",
];

/// Fallback when no candidate shares the host's major version: the newest
/// supported version.
pub const DEFAULT_NODE_VERSION: &str = "22.11.0";

/// Selects a runtime version for the platform manifest.
///
/// Compares only the major-version component of `host_major` against each
/// candidate in `supported` and returns the first exact major match. A miss
/// is not an error: the newest supported version is returned and the
/// condition is logged at warn level.
pub fn select_node_version(host_major: &str, supported: &[&str]) -> String {
    let host: Option<u64> = host_major.trim().parse().ok();

    if let Some(host) = host {
        for candidate in supported {
            match Version::parse(candidate) {
                Ok(version) if version.major == host => return candidate.to_string(),
                Ok(_) => {}
                Err(e) => log::debug!("skipping unparsable runtime version {candidate}: {e}"),
            }
        }
    }

    let fallback = supported
        .iter()
        .rev()
        .find(|candidate| Version::parse(candidate).is_ok())
        .copied()
        .unwrap_or(DEFAULT_NODE_VERSION);

    log::warn!(
        "no supported runtime matches host major version {host_major}, falling back to {fallback}"
    );
    fallback.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_exact_major_match() {
        assert_eq!(
            select_node_version("18", &SUPPORTED_NODE_VERSIONS),
            "18.20.4"
        );
        assert_eq!(
            select_node_version("14", &SUPPORTED_NODE_VERSIONS),
            "14.21.3"
        );
    }

    #[test]
    fn falls_back_to_newest_on_miss() {
        assert_eq!(
            select_node_version("21", &SUPPORTED_NODE_VERSIONS),
            DEFAULT_NODE_VERSION
        );
    }

    #[test]
    fn falls_back_on_unparsable_host() {
        assert_eq!(
            select_node_version("not-a-version", &SUPPORTED_NODE_VERSIONS),
            DEFAULT_NODE_VERSION
        );
    }

    #[test]
    fn empty_supported_list_uses_documented_default() {
        assert_eq!(select_node_version("18", &[]), DEFAULT_NODE_VERSION);
    }
}
