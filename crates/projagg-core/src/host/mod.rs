//! Automation surface that owns a solution while it is being edited.
//!
//! The engine never touches the manifest file itself. It opens a session
//! through an [`AutomationHost`], adds members through the session, then
//! saves and closes it:
//!
//! ```text
//! AutomationHost::open_or_attach ──► AutomationSession (Open)
//!                                       │
//!                                       ├─► enumerate_members
//!                                       ├─► add_member (per candidate)
//!                                       ├─► save
//!                                       └─► close ──► Closed
//! ```

mod dotnet;

pub use dotnet::*;

use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Host selector passed when a session is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HostVersion {
    #[serde(rename = "vs2013", alias = "VisualStudio.DTE.12.0")]
    VisualStudio2013,
    #[default]
    #[serde(rename = "vs2015", alias = "VisualStudio.DTE.14.0")]
    VisualStudio2015,
}

impl HostVersion {
    pub const ALL: [HostVersion; 2] = [HostVersion::VisualStudio2013, HostVersion::VisualStudio2015];

    /// Automation ProgID of the host.
    pub fn tag(&self) -> &'static str {
        match self {
            HostVersion::VisualStudio2013 => "VisualStudio.DTE.12.0",
            HostVersion::VisualStudio2015 => "VisualStudio.DTE.14.0",
        }
    }

    /// Short name used on the command line and in config files.
    pub fn short_name(&self) -> &'static str {
        match self {
            HostVersion::VisualStudio2013 => "vs2013",
            HostVersion::VisualStudio2015 => "vs2015",
        }
    }

    /// Contents of an empty solution written by this host version.
    pub fn empty_solution(&self) -> String {
        let (comment, version) = match self {
            HostVersion::VisualStudio2013 => ("# Visual Studio 2013", "12.0.31101.0"),
            HostVersion::VisualStudio2015 => ("# Visual Studio 14", "14.0.25420.1"),
        };
        let version_line = format!("VisualStudioVersion = {version}");
        [
            "",
            "Microsoft Visual Studio Solution File, Format Version 12.00",
            comment,
            version_line.as_str(),
            "MinimumVisualStudioVersion = 10.0.40219.1",
            "Global",
            "\tGlobalSection(SolutionProperties) = preSolution",
            "\t\tHideSolutionNode = FALSE",
            "\tEndGlobalSection",
            "EndGlobal",
            "",
        ]
        .join("\r\n")
    }
}

impl fmt::Display for HostVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl FromStr for HostVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        HostVersion::ALL
            .into_iter()
            .find(|v| v.short_name().eq_ignore_ascii_case(wanted) || v.tag().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| Error::InvalidHostVersion(s.to_string()))
    }
}

/// A project as the automation surface reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberRef {
    /// Display name (usually the file stem)
    pub name: String,
    /// Absolute path of the project file
    pub full_name: PathBuf,
}

impl MemberRef {
    pub fn from_path(full_name: impl Into<PathBuf>) -> Self {
        let full_name = full_name.into();
        let name = full_name
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        Self { name, full_name }
    }
}

/// Opens sessions against a solution manifest.
#[async_trait]
pub trait AutomationHost: Send + Sync {
    /// Attach to the manifest, creating it when it does not exist.
    async fn open_or_attach(
        &self,
        version: HostVersion,
        manifest: &Path,
    ) -> Result<Box<dyn AutomationSession>>;
}

/// An open manifest inside the automation host.
///
/// Every call except `close` fails with [`Error::SessionClosed`] once the
/// session is closed. `close` is idempotent.
#[async_trait]
pub trait AutomationSession: Send + Sync {
    /// Members currently in the solution.
    async fn enumerate_members(&self) -> Result<Vec<MemberRef>>;

    /// Add a project file to the solution.
    async fn add_member(&self, file: &Path) -> Result<MemberRef>;

    /// Persist the solution to `destination`.
    async fn save(&self, destination: &Path) -> Result<()>;

    /// Release the session and the host behind it.
    async fn close(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_version_default_is_vs2015() {
        assert_eq!(HostVersion::default(), HostVersion::VisualStudio2015);
        assert_eq!(HostVersion::default().tag(), "VisualStudio.DTE.14.0");
    }

    #[test]
    fn test_host_version_parse() {
        assert_eq!("vs2013".parse::<HostVersion>().unwrap(), HostVersion::VisualStudio2013);
        assert_eq!("VS2015".parse::<HostVersion>().unwrap(), HostVersion::VisualStudio2015);
        assert_eq!(
            "VisualStudio.DTE.12.0".parse::<HostVersion>().unwrap(),
            HostVersion::VisualStudio2013
        );
        assert!(matches!(
            "vs2019".parse::<HostVersion>(),
            Err(Error::InvalidHostVersion(v)) if v == "vs2019"
        ));
    }

    #[test]
    fn test_empty_solution_header() {
        let sln = HostVersion::VisualStudio2013.empty_solution();
        assert!(sln.contains("Format Version 12.00"));
        assert!(sln.contains("VisualStudioVersion = 12.0"));
        assert!(HostVersion::VisualStudio2015.empty_solution().contains("# Visual Studio 14"));
    }

    #[test]
    fn test_member_ref_from_path() {
        let member = MemberRef::from_path("/src/App/App.csproj");
        assert_eq!(member.name, "App");
        assert_eq!(member.full_name, PathBuf::from("/src/App/App.csproj"));
    }
}
