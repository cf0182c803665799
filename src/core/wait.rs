//! Purpose: Block until a property matching the caller's patterns reaches the target value.
//! Exports: `Waiter`, `WaitState`, `PropertyMatch`, `wait_for_match`.
//! Role: Control loop tying readiness, backend change notification, and matching together.
//! Invariants: The serial cursor starts at 0 and never moves backwards (wrapping serial order).
//! Invariants: Each iteration waits with the last observed serial, then scans one fresh snapshot.
//! Invariants: After a match no further waits or scans happen; the backend is dropped with the waiter.

use serde::Serialize;
use tracing::{debug, info};

use crate::core::backend::PropertyBackend;
use crate::core::error::Error;
use crate::core::matcher::Matcher;
use crate::core::property::SerialCursor;
use crate::core::ready::ReadinessGate;

/// Lifecycle of a bound waiter. Readiness and binding happen before a `Waiter` exists.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WaitState {
    Bound,
    Waiting,
    Scanning,
    Done,
}

/// The winning property and where it was found.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct PropertyMatch {
    pub key: String,
    pub value: String,
    pub serial: u32,
    pub pattern: String,
}

pub struct Waiter<B: PropertyBackend> {
    backend: B,
    matcher: Matcher,
    cursor: SerialCursor,
    state: WaitState,
}

impl<B: PropertyBackend> Waiter<B> {
    pub fn new(backend: B, matcher: Matcher) -> Self {
        Self {
            backend,
            matcher,
            cursor: SerialCursor::new(),
            state: WaitState::Bound,
        }
    }

    pub fn state(&self) -> WaitState {
        self.state
    }

    pub fn cursor(&self) -> u32 {
        self.cursor.get()
    }

    /// One wait-then-scan iteration. `Ok(None)` means the snapshot held no match.
    pub fn step(&mut self) -> Result<Option<PropertyMatch>, Error> {
        if self.state == WaitState::Done {
            return Ok(None);
        }

        self.state = WaitState::Waiting;
        let serial = self.backend.wait_for_change(self.cursor.get())?;
        self.cursor.advance(serial)?;
        debug!(serial, "property table changed");

        self.state = WaitState::Scanning;
        let snapshot = self.backend.snapshot()?;
        for property in snapshot {
            if let Some(index) = self.matcher.first_match(&property.key, &property.value) {
                self.state = WaitState::Done;
                let pattern = self.matcher.patterns()[index].as_str().to_string();
                info!(key = %property.key, value = %property.value, serial, %pattern, "property matched");
                return Ok(Some(PropertyMatch {
                    key: property.key,
                    value: property.value,
                    serial,
                    pattern,
                }));
            }
        }

        self.state = WaitState::Waiting;
        Ok(None)
    }

    /// Loops until a match. Blocks indefinitely if none ever appears.
    pub fn run(mut self) -> Result<PropertyMatch, Error> {
        loop {
            if let Some(found) = self.step()? {
                return Ok(found);
            }
        }
    }
}

/// Drives the whole sequence: readiness, binding, then the wait loop.
pub fn wait_for_match<B, F>(
    gate: &ReadinessGate,
    bind: F,
    matcher: Matcher,
) -> Result<PropertyMatch, Error>
where
    B: PropertyBackend,
    F: FnOnce() -> Result<B, Error>,
{
    debug!(marker = %gate.marker().display(), "awaiting property backend");
    gate.await_ready();

    debug!("binding property backend");
    let backend = bind()?;

    debug!(
        patterns = matcher.patterns().len(),
        value = matcher.target(),
        "waiting for property"
    );
    Waiter::new(backend, matcher).run()
}
