//! Candidate project discovery on disk.

use crate::error::{Error, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Project file extensions eligible for a solution.
pub const PROJECT_EXTENSIONS: &[&str] = &[".csproj", ".vbproj"];

/// A project file found directly under the root directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateMember {
    /// Absolute path to the project file
    pub full_path: PathBuf,
    /// File name including extension (`App.csproj`)
    pub file_name: String,
    /// Directory holding the file
    pub directory: PathBuf,
}

impl CandidateMember {
    fn from_path(full_path: PathBuf) -> Option<Self> {
        let file_name = full_path.file_name()?.to_str()?.to_string();
        let directory = full_path.parent()?.to_path_buf();
        Some(Self {
            full_path,
            file_name,
            directory,
        })
    }
}

/// List project files directly under `root` (no recursion).
///
/// Extensions are compared case-sensitively, dot included. Results are
/// sorted by file name.
pub fn collect_candidates(root: &Path, allowed_extensions: &[&str]) -> Result<Vec<CandidateMember>> {
    if !root.is_dir() {
        return Err(Error::PathNotFound(root.to_path_buf()));
    }
    let root = root.canonicalize()?;

    let mut candidates = Vec::new();
    for entry in fs::read_dir(&root)? {
        let path = entry?.path();
        if !path.is_file() || !has_allowed_extension(&path, allowed_extensions) {
            continue;
        }
        if let Some(candidate) = CandidateMember::from_path(path) {
            candidates.push(candidate);
        }
    }

    candidates.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    debug!("Collected {} candidate(s) under {:?}", candidates.len(), root);
    Ok(candidates)
}

fn has_allowed_extension(path: &Path, allowed_extensions: &[&str]) -> bool {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => allowed_extensions
            .iter()
            .any(|allowed| allowed.strip_prefix('.') == Some(ext)),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), "<Project />").expect("Failed to write file");
    }

    #[test]
    fn test_filters_by_extension() {
        let temp = tempdir().expect("Failed to create temp dir");
        touch(temp.path(), "A.csproj");
        touch(temp.path(), "B.vbproj");
        touch(temp.path(), "C.txt");

        let names: Vec<String> = collect_candidates(temp.path(), PROJECT_EXTENSIONS)
            .expect("collect")
            .into_iter()
            .map(|c| c.file_name)
            .collect();

        assert_eq!(names, vec!["A.csproj", "B.vbproj"]);
    }

    #[test]
    fn test_extension_match_is_case_sensitive() {
        let temp = tempdir().expect("Failed to create temp dir");
        touch(temp.path(), "Upper.CSPROJ");
        touch(temp.path(), "lower.csproj");

        let candidates = collect_candidates(temp.path(), PROJECT_EXTENSIONS).expect("collect");
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].file_name, "lower.csproj");
    }

    #[test]
    fn test_does_not_recurse() {
        let temp = tempdir().expect("Failed to create temp dir");
        let nested = temp.path().join("nested");
        fs::create_dir(&nested).expect("mkdir");
        touch(&nested, "Deep.csproj");
        // A directory with a project-like name is not a candidate either
        fs::create_dir(temp.path().join("Dir.csproj")).expect("mkdir");

        let candidates = collect_candidates(temp.path(), PROJECT_EXTENSIONS).expect("collect");
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_candidate_paths_are_absolute() {
        let temp = tempdir().expect("Failed to create temp dir");
        touch(temp.path(), "App.csproj");

        let candidates = collect_candidates(temp.path(), PROJECT_EXTENSIONS).expect("collect");
        let candidate = &candidates[0];
        assert!(candidate.full_path.is_absolute());
        assert_eq!(candidate.directory, temp.path().canonicalize().unwrap());
        assert_eq!(candidate.full_path, candidate.directory.join("App.csproj"));
    }

    #[test]
    fn test_missing_root_is_path_not_found() {
        let temp = tempdir().expect("Failed to create temp dir");
        let missing = temp.path().join("missing");

        let err = collect_candidates(&missing, PROJECT_EXTENSIONS).unwrap_err();
        assert!(matches!(err, Error::PathNotFound(p) if p == missing));
    }

    #[test]
    fn test_file_root_is_path_not_found() {
        let temp = tempdir().expect("Failed to create temp dir");
        touch(temp.path(), "App.csproj");

        let err = collect_candidates(&temp.path().join("App.csproj"), PROJECT_EXTENSIONS).unwrap_err();
        assert!(matches!(err, Error::PathNotFound(_)));
    }
}
