// Property entries, table snapshots, and the serial cursor that tracks observed table versions.
use serde::Serialize;

use crate::core::error::{Error, ErrorKind};

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Property {
    pub key: String,
    pub value: String,
}

impl Property {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// One consistent pass over the property table.
///
/// Built fresh for every scan and consumed once; there is no way to rewind it.
#[derive(Debug)]
pub struct PropertySnapshot {
    entries: std::vec::IntoIter<Property>,
}

impl PropertySnapshot {
    pub fn new(entries: Vec<Property>) -> Self {
        Self {
            entries: entries.into_iter(),
        }
    }
}

impl Iterator for PropertySnapshot {
    type Item = Property;

    fn next(&mut self) -> Option<Property> {
        self.entries.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

impl ExactSizeIterator for PropertySnapshot {}

/// Latest table version observed so far.
///
/// Serials are `u32` counters that wrap, so ordering uses serial-number arithmetic:
/// a value up to half the range ahead of the cursor (modulo 2^32) counts as progress.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SerialCursor(u32);

impl SerialCursor {
    pub fn new() -> Self {
        Self(0)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Moves the cursor to a serial reported by the backend. Never rewinds.
    pub fn advance(&mut self, observed: u32) -> Result<(), Error> {
        if observed.wrapping_sub(self.0) > u32::MAX / 2 {
            return Err(Error::new(ErrorKind::Internal).with_message(format!(
                "property serial went backwards ({} -> {observed})",
                self.0
            )));
        }
        self.0 = observed;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Property, PropertySnapshot, SerialCursor};
    use crate::core::error::ErrorKind;

    #[test]
    fn snapshot_yields_entries_once_in_order() {
        let mut snapshot = PropertySnapshot::new(vec![
            Property::new("a", "1"),
            Property::new("b", "2"),
        ]);
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.next(), Some(Property::new("a", "1")));
        assert_eq!(snapshot.next(), Some(Property::new("b", "2")));
        assert_eq!(snapshot.next(), None);
        assert_eq!(snapshot.next(), None);
    }

    #[test]
    fn cursor_starts_at_zero_and_advances() {
        let mut cursor = SerialCursor::new();
        assert_eq!(cursor.get(), 0);
        cursor.advance(4).expect("advance");
        cursor.advance(4).expect("same serial");
        cursor.advance(9).expect("advance");
        assert_eq!(cursor.get(), 9);
    }

    #[test]
    fn cursor_follows_serial_across_wraparound() {
        let mut cursor = SerialCursor::new();
        cursor.advance(u32::MAX / 2).expect("half range");
        cursor.advance(u32::MAX - 1).expect("near end");
        cursor.advance(u32::MAX).expect("end");
        cursor.advance(2).expect("wrapped");
        assert_eq!(cursor.get(), 2);
        let err = cursor.advance(u32::MAX).expect_err("behind after wrap");
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn cursor_rejects_regression() {
        let mut cursor = SerialCursor::new();
        cursor.advance(7).expect("advance");
        let err = cursor.advance(3).expect_err("regression");
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(cursor.get(), 7);
    }
}
