//! Command implementations for projagg CLI.
//!
//! Each submodule implements the logic for one command.

pub mod aggregate;
pub mod doctor;
pub mod missing;
