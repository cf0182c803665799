//! Purpose: Interface the wait loop consumes from a property backend.
//! Exports: `PropertyBackend`.
//! Role: Seam between the orchestrator and concrete bindings (`native`, `memory`).
//! Invariants: `wait_for_change(s)` returns only once the table version differs from `s`.
//! Invariants: A change landing between `snapshot` and the next `wait_for_change` still
//! yields a serial different from the one passed in, so no update is missed.

use crate::core::error::Error;
use crate::core::property::PropertySnapshot;

pub trait PropertyBackend {
    /// Blocks until the table version moves past `serial` and returns the new version.
    fn wait_for_change(&self, serial: u32) -> Result<u32, Error>;

    /// Captures the current table as a single-pass iterator.
    fn snapshot(&self) -> Result<PropertySnapshot, Error>;
}

impl<B: PropertyBackend + ?Sized> PropertyBackend for &B {
    fn wait_for_change(&self, serial: u32) -> Result<u32, Error> {
        (**self).wait_for_change(serial)
    }

    fn snapshot(&self) -> Result<PropertySnapshot, Error> {
        (**self).snapshot()
    }
}
