//! Insertion-ordered identifier set used by samplers
//!
//! Membership is keyed on the CRC-32 (IEEE) of the identifier bytes. Two
//! distinct identifiers with the same checksum are treated as duplicates and
//! the later one is dropped.

use std::collections::HashSet;

use crate::types::ContentId;

/// Accumulates unique identifiers in first-seen order
#[derive(Debug, Default)]
pub struct IdentifierSet {
    fingerprints: HashSet<u32>,
    identifiers: Vec<ContentId>,
}

impl IdentifierSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `id` unless an identifier with the same fingerprint was seen.
    /// Returns true if it was appended.
    pub fn put_if_absent(&mut self, id: ContentId) -> bool {
        let key = crc32fast::hash(id.as_bytes());
        let absent = self.fingerprints.insert(key);
        if absent {
            self.identifiers.push(id);
        }
        absent
    }

    pub fn len(&self) -> usize {
        self.identifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }

    pub fn as_slice(&self) -> &[ContentId] {
        &self.identifiers
    }

    /// Consume the set, yielding identifiers in insertion order
    pub fn into_vec(self) -> Vec<ContentId> {
        self.identifiers
    }
}

impl Extend<ContentId> for IdentifierSet {
    fn extend<I: IntoIterator<Item = ContentId>>(&mut self, iter: I) {
        for id in iter {
            self.put_if_absent(id);
        }
    }
}
