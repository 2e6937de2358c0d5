//! Aggregation runs as a front end triggers them.
//!
//! Wraps the engine with the bookkeeping an interactive caller needs: input
//! gating, a single run at a time, banner lines in the run log, and the
//! missing set of the last run for display.

use crate::collector::CandidateMember;
use crate::engine::{ReconcileEngine, ReconcileOutcome};
use crate::error::{Error, Result};
use crate::host::HostVersion;
use crate::log::RunLog;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::error;

const RULE: &str = "**************************************************";

/// Inputs for one aggregation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateRequest {
    pub solution: PathBuf,
    pub root: PathBuf,
    pub host_version: HostVersion,
}

impl AggregateRequest {
    pub fn new(solution: impl Into<PathBuf>, root: impl Into<PathBuf>) -> Self {
        Self {
            solution: solution.into(),
            root: root.into(),
            host_version: HostVersion::default(),
        }
    }

    pub fn with_host_version(mut self, host_version: HostVersion) -> Self {
        self.host_version = host_version;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.solution.as_os_str().is_empty() {
            return Err(Error::MissingInput("solution file"));
        }
        if self.root.as_os_str().is_empty() {
            return Err(Error::MissingInput("root folder"));
        }
        Ok(())
    }
}

/// Runs aggregations one at a time and remembers what was missing.
pub struct Aggregator {
    log: Arc<dyn RunLog>,
    build_engine: Box<dyn Fn(HostVersion) -> ReconcileEngine + Send + Sync>,
    in_progress: AtomicBool,
    missing: Mutex<Vec<CandidateMember>>,
}

/// Clears the in-progress flag however the run ends.
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Aggregator {
    /// `build_engine` creates the engine for the selected host version.
    pub fn new<F>(log: Arc<dyn RunLog>, build_engine: F) -> Self
    where
        F: Fn(HostVersion) -> ReconcileEngine + Send + Sync + 'static,
    {
        Self {
            log,
            build_engine: Box::new(build_engine),
            in_progress: AtomicBool::new(false),
            missing: Mutex::new(Vec::new()),
        }
    }

    pub fn is_aggregating(&self) -> bool {
        self.in_progress.load(Ordering::SeqCst)
    }

    /// Both paths are set and no run is in progress.
    pub fn can_aggregate(&self, request: &AggregateRequest) -> bool {
        request.validate().is_ok() && !self.is_aggregating()
    }

    /// Missing members computed by the last run that got past diffing.
    pub fn missing_projects(&self) -> Vec<CandidateMember> {
        match self.missing.lock() {
            Ok(missing) => missing.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn set_missing(&self, members: Vec<CandidateMember>) {
        match self.missing.lock() {
            Ok(mut missing) => *missing = members,
            Err(poisoned) => *poisoned.into_inner() = members,
        }
    }

    fn banner(&self, title: &str) {
        self.log.log("");
        self.log.log(RULE);
        self.log.log(title);
        self.log.log(RULE);
        self.log.log("");
    }

    /// Run one aggregation.
    ///
    /// Fails fast with [`Error::MissingInput`] or [`Error::AlreadyRunning`].
    /// Any other failure is logged, and the engine has already closed its
    /// session best-effort by the time it is returned.
    pub async fn aggregate(&self, request: &AggregateRequest) -> Result<ReconcileOutcome> {
        request.validate()?;
        if self
            .in_progress
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(Error::AlreadyRunning);
        }
        let _guard = RunGuard(&self.in_progress);

        self.banner("     Starting the Project Aggregation process     ");
        self.log.log(&format!("Solution: {}", request.solution.display()));
        self.log.log(&format!("Root Folder: {}", request.root.display()));

        let result = self.run(request).await;
        if let Err(e) = &result {
            error!("Aggregation failed: {}", e);
            self.log
                .log("~~~~~~ An error occurred while attempting to aggregate all the projects ~~~~~~~");
            self.log.log(&e.to_string());
        }

        self.banner("     Project Aggregation process is finished      ");
        result
    }

    async fn run(&self, request: &AggregateRequest) -> Result<ReconcileOutcome> {
        let engine = (self.build_engine)(request.host_version);
        let plan = engine.plan(&request.solution, &request.root)?;
        self.set_missing(plan.missing.clone());
        engine.apply(&plan).await
    }
}
