//! Conformance harness for the FMI 2.0.2 callback bundle.
//!
//! This crate provides:
//! - Fixtures: JSON cases describing a logger call and the exact console line
//!   it must produce
//! - Verify: render each case through `fmi2cb-core` and compare
//! - Structured logs: JSONL records of every verification run, plus an
//!   artifact index with SHA-256 digests

#![forbid(unsafe_code)]

pub mod fixtures;
pub mod structured_log;
pub mod verify;

pub use fixtures::{ArgParseError, FixtureArg, FixtureCase, FixtureError, FixtureSet};
pub use verify::{VerificationResult, VerificationSummary, render_case, verify_case, verify_set};
