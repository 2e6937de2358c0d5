//! Solution manifest scanning.
//!
//! A `.sln` file is not parsed structurally. Membership is recovered with a
//! line heuristic:
//!
//! 1. A line is an entry when it contains `proj"` (ASCII case-insensitive).
//! 2. The line is split on `"` and empty tokens are dropped.
//! 3. The first token that contains `proj` but not `project` is the project
//!    path. `Project("{GUID}")` fragments contain `project` and are skipped
//!    this way.
//! 4. The last path segment of that token is the identifier.
//!
//! Entry lines without a qualifying token are skipped silently.

use crate::error::Result;
use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

const ENTRY_MARKER: &str = "proj\"";
const PATH_TOKEN: &str = "proj";
const EXCLUDED_TOKEN: &str = "project";

/// Extract the project file names referenced by a manifest.
///
/// A manifest that does not exist yet yields an empty set. Bytes that are
/// not valid UTF-8 (e.g. a Windows-1252 solution) are replaced rather than
/// failing the scan.
pub fn extract_member_identifiers(manifest_path: &Path) -> Result<BTreeSet<String>> {
    let bytes = match fs::read(manifest_path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("Manifest {:?} does not exist yet", manifest_path);
            return Ok(BTreeSet::new());
        }
        Err(e) => return Err(e.into()),
    };

    let content = String::from_utf8_lossy(&bytes);
    let identifiers = identifiers_from_str(&content);
    debug!(
        "Found {} member identifier(s) in {:?}",
        identifiers.len(),
        manifest_path
    );
    Ok(identifiers)
}

/// Apply the scanning heuristic to manifest text.
pub fn identifiers_from_str(content: &str) -> BTreeSet<String> {
    content.lines().filter_map(identifier_from_line).collect()
}

/// Identifier for a single manifest line, if the line is an entry.
pub fn identifier_from_line(line: &str) -> Option<String> {
    if !contains_ignore_case(line, ENTRY_MARKER) {
        return None;
    }

    let token = line
        .split('"')
        .filter(|token| !token.is_empty())
        .find(|token| {
            contains_ignore_case(token, PATH_TOKEN) && !contains_ignore_case(token, EXCLUDED_TOKEN)
        })?;

    token
        .split(['\\', '/'])
        .filter(|segment| !segment.is_empty())
        .next_back()
        .map(str::to_string)
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_ascii_lowercase().contains(needle)
}
