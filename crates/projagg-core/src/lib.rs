//! projagg-core - Core library for projagg
//!
//! Finds project files that sit next to a solution's sources but are not in
//! the solution yet, and adds them through an automation host:
//!
//! - **manifest**: heuristic scan of `.sln` member identifiers
//! - **collector**: candidate project files under a root directory
//! - **engine**: diff, add passes, save and close
//! - **retry**: fixed-delay retry for automation calls
//! - **host**: automation surface traits and the `dotnet sln` host
//! - **aggregator**: run gating, banners and the missing-projects view
//! - **log**: run log collaborator

pub mod aggregator;
pub mod collector;
pub mod engine;
pub mod error;
pub mod host;
pub mod log;
pub mod manifest;
pub mod retry;

// Re-export commonly used types
pub use aggregator::{AggregateRequest, Aggregator};
pub use collector::{CandidateMember, PROJECT_EXTENSIONS};
pub use engine::{
    ReconcileConfig, ReconcileEngine, ReconcileOutcome, ReconcilePlan, ReconcileReport, build_plan,
};
pub use error::{Error, Result};
pub use host::{DotnetHost, HostVersion, MemberRef};
pub use retry::RetryPolicy;
