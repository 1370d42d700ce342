//! Local execution harness for Go handler functions.
//!
//! This crate owns the runtime integration details: staging a rewritten
//! handler artifact, acquiring short-term session credentials, launching the
//! toolchain against the artifact, and returning the demultiplexed result.
//! Deterministic contract and protocol logic lives in `offline_core`.

pub mod adapters;
pub mod credentials;
pub mod launcher;
pub mod runner;
pub mod stager;

mod observe;
