// Core modules implementing readiness gating, property backends, matching, and the wait loop.
pub mod backend;
pub mod error;
pub mod glob;
pub mod matcher;
pub mod memory;
pub mod native;
pub mod property;
pub mod ready;
pub mod wait;
