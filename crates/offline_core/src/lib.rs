//! Shared local-invocation contracts and protocol logic.
//!
//! This crate owns the deterministic pieces of the harness: the invocation
//! context contract, the stdout payload protocol, child environment
//! composition, and the handler import rewrite. It intentionally excludes
//! AWS SDK, filesystem, and subprocess concerns.

pub mod contract;
pub mod environment;
pub mod payload;
pub mod rewrite;
