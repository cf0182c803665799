//! Purpose: Library crate behind the `waitforservice` CLI and its tests.
//! Exports: `api` (stable surface), `core` (backends, matching, wait loop, errors).
//! Role: Lets callers embed the property wait without spawning the binary.
//! Invariants: No process-global state; everything lives in values the caller owns.
pub mod api;
pub mod core;
