//! `dotnet sln` as the automation surface.
//!
//! Provides the session operations on top of the dotnet CLI:
//! - Attach to (or create) a solution file
//! - List projects in the solution
//! - Add a project file
//! - Save (copy) the solution elsewhere

use super::{AutomationHost, AutomationSession, HostVersion, MemberRef};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::process::Command;
use tracing::{debug, info};

/// Default executable name for the dotnet CLI.
pub const DEFAULT_DOTNET: &str = "dotnet";

/// Host that edits solutions through the dotnet CLI.
#[derive(Debug, Clone)]
pub struct DotnetHost {
    program: String,
}

impl Default for DotnetHost {
    fn default() -> Self {
        Self::new(DEFAULT_DOTNET)
    }
}

impl DotnetHost {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Check that the dotnet CLI is installed and available.
    pub fn check(&self) -> Result<PathBuf> {
        match which::which(&self.program) {
            Ok(path) => {
                debug!("Found dotnet at: {:?}", path);
                Ok(path)
            }
            Err(_) => Err(Error::HostNotFound(self.program.clone())),
        }
    }
}

#[async_trait]
impl AutomationHost for DotnetHost {
    async fn open_or_attach(
        &self,
        version: HostVersion,
        manifest: &Path,
    ) -> Result<Box<dyn AutomationSession>> {
        self.check()?;

        if !manifest.exists() {
            let parent = manifest
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            if !parent.is_dir() {
                return Err(Error::PathNotFound(parent.to_path_buf()));
            }
            tokio::fs::write(manifest, version.empty_solution()).await?;
            info!("Created solution {:?} ({})", manifest, version.tag());
        } else if !manifest.is_file() {
            return Err(Error::PathNotFound(manifest.to_path_buf()));
        }

        let manifest = manifest.canonicalize()?;
        debug!("Attached to {:?} as {}", manifest, version.tag());

        Ok(Box::new(DotnetSession {
            program: self.program.clone(),
            manifest,
            closed: AtomicBool::new(false),
        }))
    }
}

/// An open solution edited through `dotnet sln`.
#[derive(Debug)]
pub struct DotnetSession {
    program: String,
    manifest: PathBuf,
    closed: AtomicBool,
}

impl DotnetSession {
    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::SessionClosed);
        }
        Ok(())
    }

    fn sln_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("sln")
            .arg(&self.manifest)
            .env("DOTNET_NOLOGO", "1")
            .env("DOTNET_CLI_TELEMETRY_OPTOUT", "1");
        cmd
    }

    async fn run(&self, mut cmd: Command, action: &str) -> Result<String> {
        let output = cmd.output().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            // dotnet reports some failures on stdout
            let detail = if stderr.trim().is_empty() { stdout } else { stderr };
            return Err(Error::command_failed(
                format!("{} sln {} {}", self.program, self.manifest.display(), action),
                detail.trim().to_string(),
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    fn solution_dir(&self) -> &Path {
        self.manifest.parent().unwrap_or(Path::new("."))
    }
}

#[async_trait]
impl AutomationSession for DotnetSession {
    async fn enumerate_members(&self) -> Result<Vec<MemberRef>> {
        self.ensure_open()?;

        let mut cmd = self.sln_command();
        cmd.arg("list");
        let stdout = self.run(cmd, "list").await?;

        Ok(parse_list_output(&stdout, self.solution_dir()))
    }

    async fn add_member(&self, file: &Path) -> Result<MemberRef> {
        self.ensure_open()?;

        let mut cmd = self.sln_command();
        cmd.arg("add").arg(file);
        let stdout = self.run(cmd, &format!("add {}", file.display())).await?;
        debug!("dotnet sln add: {}", stdout.trim());

        let full_name = file.canonicalize().unwrap_or_else(|_| file.to_path_buf());
        Ok(MemberRef::from_path(full_name))
    }

    async fn save(&self, destination: &Path) -> Result<()> {
        self.ensure_open()?;

        // `dotnet sln` writes through on every change
        let same_file = destination
            .canonicalize()
            .map(|d| d == self.manifest)
            .unwrap_or(false);
        if same_file {
            debug!("Solution {:?} already saved in place", self.manifest);
            return Ok(());
        }

        tokio::fs::copy(&self.manifest, destination).await?;
        debug!("Saved solution to {:?}", destination);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            debug!("Session for {:?} already closed", self.manifest);
        } else {
            debug!("Closed session for {:?}", self.manifest);
        }
        Ok(())
    }
}

/// Parse `dotnet sln list` output into members resolved against the
/// solution directory.
///
/// The listing is a `Project(s)` header and a dashed rule followed by one
/// relative path per line. Anything else (e.g. "No projects found in the
/// solution.") means no members.
pub fn parse_list_output(output: &str, solution_dir: &Path) -> Vec<MemberRef> {
    let mut lines = output.lines().map(str::trim);
    if !lines.any(|line| !line.is_empty() && line.chars().all(|c| c == '-')) {
        return Vec::new();
    }

    lines
        .filter(|line| !line.is_empty())
        .map(|line| {
            let path = line
                .split(['\\', '/'])
                .filter(|segment| !segment.is_empty())
                .fold(solution_dir.to_path_buf(), |acc, segment| acc.join(segment));
            let full_name = path.canonicalize().unwrap_or(path);
            MemberRef::from_path(full_name)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_check_dotnet() {
        // This test requires dotnet to be installed
        let result = DotnetHost::default().check();
        // Don't assert - dotnet may not be installed in CI
        println!("dotnet check result: {:?}", result);
    }

    #[test]
    fn test_check_missing_program() {
        let host = DotnetHost::new("projagg-no-such-dotnet-12345");
        assert!(matches!(host.check(), Err(Error::HostNotFound(p)) if p == "projagg-no-such-dotnet-12345"));
    }

    #[tokio::test]
    async fn test_open_without_dotnet_fails_before_touching_disk() {
        let temp = tempdir().expect("Failed to create temp dir");
        let manifest = temp.path().join("All.sln");
        let host = DotnetHost::new("projagg-no-such-dotnet-12345");

        let result = host.open_or_attach(HostVersion::default(), &manifest).await;

        assert!(matches!(result, Err(Error::HostNotFound(_))));
        assert!(!manifest.exists());
    }

    #[test]
    fn test_parse_list_output() {
        let temp = tempdir().expect("Failed to create temp dir");
        let output = "Project(s)\n----------\nsrc\\App\\App.csproj\nLib/Lib.vbproj\n\n";

        let members = parse_list_output(output, temp.path());

        assert_eq!(members.len(), 2);
        assert_eq!(members[0].name, "App");
        assert_eq!(members[0].full_name, temp.path().join("src").join("App").join("App.csproj"));
        assert_eq!(members[1].name, "Lib");
        assert_eq!(members[1].full_name, temp.path().join("Lib").join("Lib.vbproj"));
    }

    #[test]
    fn test_parse_list_output_canonicalizes_existing_files() {
        let temp = tempdir().expect("Failed to create temp dir");
        std::fs::write(temp.path().join("App.csproj"), "<Project />").expect("write");

        let members = parse_list_output("Project(s)\n----------\nApp.csproj\n", temp.path());

        assert_eq!(
            members[0].full_name,
            temp.path().join("App.csproj").canonicalize().unwrap()
        );
    }

    #[test]
    fn test_parse_list_output_no_projects() {
        let members = parse_list_output("No projects found in the solution.\n", Path::new("/tmp"));
        assert!(members.is_empty());
    }
}
