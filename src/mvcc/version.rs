//! Version - Immutable value at a revision
//!
//! - A version holds either a value or an explicit tombstone
//! - A version belongs to exactly one revision
//! - Once created, a version never changes; updates append new versions

use super::Revision;

/// The payload of a version: either a value or an explicit tombstone.
///
/// Deletes are ordinary entries in the history so that older snapshots
/// still see the value that existed before the delete.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VersionPayload {
    /// An opaque value.
    Value(Vec<u8>),
    /// An explicit deletion marker.
    Tombstone,
}

impl VersionPayload {
    /// Returns true if this payload is a tombstone.
    #[inline]
    pub fn is_tombstone(&self) -> bool {
        matches!(self, VersionPayload::Tombstone)
    }

    /// Returns the value bytes, or None for a tombstone.
    #[inline]
    pub fn as_value(&self) -> Option<&[u8]> {
        match self {
            VersionPayload::Value(bytes) => Some(bytes),
            VersionPayload::Tombstone => None,
        }
    }

    /// Length of the value in bytes; tombstones have length zero.
    #[inline]
    pub fn len(&self) -> usize {
        self.as_value().map_or(0, <[u8]>::len)
    }

    /// Returns true for tombstones and empty values.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A single immutable version of a key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Version {
    revision: Revision,
    payload: VersionPayload,
}

impl Version {
    pub fn new(revision: Revision, payload: VersionPayload) -> Self {
        Self { revision, payload }
    }

    /// Creates a version carrying a value.
    pub fn with_value(revision: Revision, value: Vec<u8>) -> Self {
        Self::new(revision, VersionPayload::Value(value))
    }

    /// Creates a tombstone version.
    pub fn with_tombstone(revision: Revision) -> Self {
        Self::new(revision, VersionPayload::Tombstone)
    }

    #[inline]
    pub fn revision(&self) -> Revision {
        self.revision
    }

    #[inline]
    pub fn payload(&self) -> &VersionPayload {
        &self.payload
    }

    #[inline]
    pub fn is_tombstone(&self) -> bool {
        self.payload.is_tombstone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_with_value() {
        let version = Version::with_value(Revision::new(3), b"payload".to_vec());

        assert_eq!(version.revision(), Revision::new(3));
        assert_eq!(version.payload().as_value(), Some(&b"payload"[..]));
        assert!(!version.is_tombstone());
    }

    #[test]
    fn test_version_with_tombstone() {
        let version = Version::with_tombstone(Revision::new(4));

        assert!(version.is_tombstone());
        assert_eq!(version.payload().as_value(), None);
        assert_eq!(version.payload().len(), 0);
    }

    #[test]
    fn test_empty_value_is_not_a_tombstone() {
        let payload = VersionPayload::Value(Vec::new());
        assert!(payload.is_empty());
        assert!(!payload.is_tombstone());
    }
}
