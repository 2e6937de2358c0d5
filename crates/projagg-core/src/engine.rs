//! Reconciliation engine.
//!
//! One run goes through these phases:
//!
//! ```text
//! Idle ─► Scanning ─► Diffing ─┬─► NoOpDone
//!                              └─► SessionOpening ─► AddingMembers ─► Saving ─► Closing ─► Done
//! ```
//!
//! Opening, enumerating, saving and closing each go through the
//! [`RetryPolicy`]. Member adds do not: a failed add is skipped and tried
//! again on the next pass.

use crate::collector::{CandidateMember, PROJECT_EXTENSIONS, collect_candidates};
use crate::error::{Error, Result};
use crate::host::{AutomationHost, AutomationSession, HostVersion, MemberRef};
use crate::log::RunLog;
use crate::manifest::extract_member_identifiers;
use crate::retry::RetryPolicy;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

/// Add passes per run.
pub const DEFAULT_PASSES: usize = 15;

/// Engine settings for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileConfig {
    pub host_version: HostVersion,
    /// Upper bound on add passes
    pub passes: usize,
    /// Stop after a pass that added nothing
    pub stop_on_convergence: bool,
    /// Policy for open, enumerate, save and close
    pub retry: RetryPolicy,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            host_version: HostVersion::default(),
            passes: DEFAULT_PASSES,
            stop_on_convergence: false,
            retry: RetryPolicy::default(),
        }
    }
}

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunPhase {
    Idle,
    Scanning,
    Diffing,
    NoOpDone,
    SessionOpening,
    AddingMembers,
    Saving,
    Closing,
    Done,
    Failed,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunPhase::Idle => "idle",
            RunPhase::Scanning => "scanning",
            RunPhase::Diffing => "diffing",
            RunPhase::NoOpDone => "up-to-date",
            RunPhase::SessionOpening => "opening",
            RunPhase::AddingMembers => "adding",
            RunPhase::Saving => "saving",
            RunPhase::Closing => "closing",
            RunPhase::Done => "done",
            RunPhase::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Result of scanning and diffing, before any session is opened.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcilePlan {
    pub manifest: PathBuf,
    pub root: PathBuf,
    /// Identifiers already referenced by the manifest
    pub known: BTreeSet<String>,
    pub candidates: Vec<CandidateMember>,
    pub missing: Vec<CandidateMember>,
}

impl ReconcilePlan {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// What a run that opened a session did.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileReport {
    pub run_id: Uuid,
    pub host_version: HostVersion,
    pub manifest: PathBuf,
    pub passes_run: usize,
    /// Members added, in the order the host accepted them
    pub added: Vec<MemberRef>,
    /// Missing members that never made it into the solution
    pub failed: Vec<CandidateMember>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub enum ReconcileOutcome {
    /// Nothing was missing; no session was opened
    UpToDate,
    Reconciled(ReconcileReport),
}

impl ReconcileOutcome {
    /// True when a session was opened and the manifest saved.
    pub fn modified(&self) -> bool {
        matches!(self, ReconcileOutcome::Reconciled(_))
    }

    pub fn report(&self) -> Option<&ReconcileReport> {
        match self {
            ReconcileOutcome::UpToDate => None,
            ReconcileOutcome::Reconciled(report) => Some(report),
        }
    }
}

/// Candidates whose file name does not occur in any known identifier.
pub fn compute_missing(known: &BTreeSet<String>, candidates: &[CandidateMember]) -> Vec<CandidateMember> {
    candidates
        .iter()
        .filter(|c| !known.iter().any(|id| id.contains(c.file_name.as_str())))
        .cloned()
        .collect()
}

/// Scan, collect and diff without touching any session.
///
/// Fails with [`Error::PathNotFound`] when the root or the folder that holds
/// the manifest does not exist.
pub fn build_plan(manifest: &Path, root: &Path) -> Result<ReconcilePlan> {
    if let Some(parent) = manifest.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.is_dir() {
            return Err(Error::PathNotFound(parent.to_path_buf()));
        }
    }

    let known = extract_member_identifiers(manifest)?;
    let candidates = collect_candidates(root, PROJECT_EXTENSIONS)?;
    let missing = compute_missing(&known, &candidates);
    debug!(
        "{} known, {} candidate(s), {} missing",
        known.len(),
        candidates.len(),
        missing.len()
    );

    Ok(ReconcilePlan {
        manifest: manifest.to_path_buf(),
        root: root.to_path_buf(),
        known,
        candidates,
        missing,
    })
}

/// Members known to be in the session during a run.
#[derive(Debug, Default)]
struct Roster {
    members: Vec<MemberRef>,
    submitted: HashSet<PathBuf>,
}

impl Roster {
    fn new(members: Vec<MemberRef>) -> Self {
        Self {
            members,
            submitted: HashSet::new(),
        }
    }

    fn contains(&self, candidate: &CandidateMember) -> bool {
        self.submitted.contains(&candidate.full_path)
            || self.members.iter().any(|m| m.full_name == candidate.full_path)
    }

    fn record(&mut self, candidate: &CandidateMember, member: MemberRef) {
        self.submitted.insert(candidate.full_path.clone());
        self.members.push(member);
    }
}

/// Drives one reconciliation run at a time against an automation host.
pub struct ReconcileEngine {
    host: Arc<dyn AutomationHost>,
    log: Arc<dyn RunLog>,
    config: ReconcileConfig,
    phase: Mutex<RunPhase>,
}

impl ReconcileEngine {
    pub fn new(host: Arc<dyn AutomationHost>, log: Arc<dyn RunLog>, config: ReconcileConfig) -> Self {
        Self {
            host,
            log,
            config,
            phase: Mutex::new(RunPhase::Idle),
        }
    }

    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    /// Phase of the current or last run.
    pub fn phase(&self) -> RunPhase {
        match self.phase.lock() {
            Ok(phase) => *phase,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn enter(&self, phase: RunPhase) {
        debug!("Run phase: {}", phase);
        match self.phase.lock() {
            Ok(mut current) => *current = phase,
            Err(poisoned) => *poisoned.into_inner() = phase,
        }
    }

    /// Scan the manifest, collect candidates and compute the missing set.
    pub fn plan(&self, manifest: &Path, root: &Path) -> Result<ReconcilePlan> {
        self.enter(RunPhase::Scanning);
        let plan = build_plan(manifest, root)?;
        self.enter(RunPhase::Diffing);
        Ok(plan)
    }

    /// Plan and apply in one go.
    pub async fn reconcile(&self, manifest: &Path, root: &Path) -> Result<ReconcileOutcome> {
        let plan = match self.plan(manifest, root) {
            Ok(plan) => plan,
            Err(e) => {
                self.enter(RunPhase::Failed);
                return Err(e);
            }
        };
        self.apply(&plan).await
    }

    /// Add the plan's missing members through a new session.
    pub async fn apply(&self, plan: &ReconcilePlan) -> Result<ReconcileOutcome> {
        if plan.is_complete() {
            self.enter(RunPhase::NoOpDone);
            return Ok(ReconcileOutcome::UpToDate);
        }

        let run_id = Uuid::new_v4();
        let span = info_span!("reconcile", run_id = %run_id);
        let result = self.run_session(plan, run_id).instrument(span).await;

        match &result {
            Ok(_) => self.enter(RunPhase::Done),
            Err(_) => self.enter(RunPhase::Failed),
        }
        result.map(ReconcileOutcome::Reconciled)
    }

    async fn run_session(&self, plan: &ReconcilePlan, run_id: Uuid) -> Result<ReconcileReport> {
        let started_at = Utc::now();
        let version = self.config.host_version;
        let retry = &self.config.retry;
        info!(
            "{} project(s) missing from {:?}",
            plan.missing.len(),
            plan.manifest
        );

        self.enter(RunPhase::SessionOpening);
        let session = retry
            .attempt("open solution", || {
                self.host.open_or_attach(version, &plan.manifest)
            })
            .await?;

        match self.drive(session.as_ref(), plan).await {
            Ok((passes_run, added, failed)) => Ok(ReconcileReport {
                run_id,
                host_version: version,
                manifest: plan.manifest.clone(),
                passes_run,
                added,
                failed,
                started_at,
                finished_at: Utc::now(),
            }),
            Err(e) => {
                // A failed close has already spent its own retry budget
                if self.phase() != RunPhase::Closing {
                    self.abandon(session.as_ref()).await;
                }
                Err(e)
            }
        }
    }

    async fn drive(
        &self,
        session: &dyn AutomationSession,
        plan: &ReconcilePlan,
    ) -> Result<(usize, Vec<MemberRef>, Vec<CandidateMember>)> {
        let retry = &self.config.retry;

        let existing = retry
            .attempt("enumerate members", || session.enumerate_members())
            .await?;
        debug!("Session reports {} existing member(s)", existing.len());
        let mut roster = Roster::new(existing);

        self.enter(RunPhase::AddingMembers);
        let (passes_run, added) = self.add_passes(session, &plan.missing, &mut roster).await;

        let failed: Vec<CandidateMember> = plan
            .missing
            .iter()
            .filter(|c| !roster.contains(c))
            .cloned()
            .collect();
        if !failed.is_empty() {
            let names: Vec<&str> = failed.iter().map(|c| c.file_name.as_str()).collect();
            self.log.log(&format!(
                "Could not add {} project(s): {}",
                failed.len(),
                names.join(", ")
            ));
        }

        self.enter(RunPhase::Saving);
        retry
            .attempt("save solution", || session.save(&plan.manifest))
            .await?;

        self.enter(RunPhase::Closing);
        retry.attempt("close solution", || session.close()).await?;

        Ok((passes_run, added, failed))
    }

    /// Repeat add passes until the pass budget is spent or nothing is left.
    async fn add_passes(
        &self,
        session: &dyn AutomationSession,
        missing: &[CandidateMember],
        roster: &mut Roster,
    ) -> (usize, Vec<MemberRef>) {
        let mut added = Vec::new();
        let mut passes_run = 0;

        for pass in 1..=self.config.passes {
            let pending: Vec<&CandidateMember> = missing.iter().filter(|c| !roster.contains(c)).collect();
            if pending.is_empty() {
                debug!("Nothing left to add after {} pass(es)", passes_run);
                break;
            }
            passes_run = pass;

            let mut added_this_pass = 0;
            for candidate in pending {
                match session.add_member(&candidate.full_path).await {
                    Ok(member) => {
                        self.log.log(&candidate.file_name);
                        roster.record(candidate, member.clone());
                        added.push(member);
                        added_this_pass += 1;
                    }
                    Err(e) => {
                        debug!("Pass {}: could not add {}: {}", pass, candidate.file_name, e);
                    }
                }
            }

            if added_this_pass == 0 && self.config.stop_on_convergence {
                debug!("Pass {} added nothing; stopping early", pass);
                break;
            }
        }

        (passes_run, added)
    }

    /// Best-effort close after a failed run; its own failure is swallowed.
    async fn abandon(&self, session: &dyn AutomationSession) {
        self.enter(RunPhase::Closing);
        if let Err(e) = self
            .config
            .retry
            .attempt("close solution", || session.close())
            .await
        {
            warn!("Failed to close solution after error: {}", e);
        }
    }
}
