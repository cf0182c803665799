//! Purpose: In-process property table with blocking change notification.
//! Exports: `MemoryBackend`.
//! Role: Drives the wait loop without Android (tests, embedders, dry runs).
//! Invariants: Every `set` bumps the serial by one and wakes all waiters.
//! Invariants: Snapshots are taken under the table lock and are therefore consistent.
//! Invariants: Enumeration order is key order.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};

use crate::core::backend::PropertyBackend;
use crate::core::error::Error;
use crate::core::property::{Property, PropertySnapshot};

#[derive(Default)]
struct Table {
    serial: u32,
    entries: BTreeMap<String, String>,
}

#[derive(Default)]
struct Shared {
    table: Mutex<Table>,
    changed: Condvar,
    wait_calls: AtomicU64,
}

/// Cloning yields another handle to the same table.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    shared: Arc<Shared>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the table; each entry counts as one change.
    pub fn with_properties<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let backend = Self::new();
        for (key, value) in entries {
            backend.set(key, value);
        }
        backend
    }

    /// Stores a property and returns the new serial.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) -> u32 {
        let mut table = self.lock();
        table.entries.insert(key.into(), value.into());
        table.serial = table.serial.wrapping_add(1);
        let serial = table.serial;
        drop(table);
        self.shared.changed.notify_all();
        serial
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.lock().entries.get(key).cloned()
    }

    pub fn serial(&self) -> u32 {
        self.lock().serial
    }

    /// Number of `wait_for_change` calls made against this table so far.
    pub fn wait_calls(&self) -> u64 {
        self.shared.wait_calls.load(Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, Table> {
        // A panicking writer cannot leave the map half-updated, so poisoning is ignored.
        self.shared
            .table
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl PropertyBackend for MemoryBackend {
    fn wait_for_change(&self, serial: u32) -> Result<u32, Error> {
        self.shared.wait_calls.fetch_add(1, Ordering::SeqCst);
        let mut table = self.lock();
        while table.serial == serial {
            table = self
                .shared
                .changed
                .wait(table)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
        Ok(table.serial)
    }

    fn snapshot(&self) -> Result<PropertySnapshot, Error> {
        let table = self.lock();
        let entries = table
            .entries
            .iter()
            .map(|(key, value)| Property::new(key.clone(), value.clone()))
            .collect();
        Ok(PropertySnapshot::new(entries))
    }
}
