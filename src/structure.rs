//! The capability set shared by all three associative-array engines, and
//! the tagged-variant dispatcher the harness drives them through.
//!
//! A `dyn AssociativeArray` trait object is convenient for documentation
//! and for generic cross-structure test helpers, but the harness's timed
//! insert/search loops go through [`StructureKind`] instead, so the
//! measured path never pays for virtual dispatch.

use crate::hash_table::HashTable;
use crate::patricia::PatriciaTree;
use crate::ternary::TernaryTree;

/// Operations every associative array exposes, independent of its
/// internal representation.
pub trait AssociativeArray {
    /// Appends `pos` to `key`'s position list for `stream`, creating the
    /// entry on first sight. Tolerates duplicate keys and positions.
    fn insert(&mut self, key: &[u8], pos: usize, stream: u8);

    /// Reports whether `key` is present; if `verbose` is set, also prints
    /// the occurrences recorded for `stream`.
    fn search_report(&self, key: &[u8], stream: u8, verbose: bool) -> bool;

    /// `(|L0|, |L1|)` for `key`. Behavior is unspecified if `key` was
    /// never inserted; callers must only call this after a present
    /// `search_report`.
    fn occurrences(&self, key: &[u8]) -> (usize, usize);

    /// One of `"PATR"`, `"TERN"`, `"HASH"`.
    fn name(&self) -> &'static str;

    /// Best-effort byte count of the instance's owned heap footprint.
    fn structure_size(&self) -> usize;

    /// Maximum root-to-leaf depth for trees, current load factor for the
    /// hash table.
    fn extra_measurement(&self) -> f64;
}

/// A tagged union over the three engines, used by the harness so that
/// running "all three structures" is a loop over an enum rather than a
/// `Vec<Box<dyn AssociativeArray>>`.
pub enum StructureKind {
    Patricia(PatriciaTree),
    Ternary(TernaryTree),
    Hash(HashTable),
}

impl StructureKind {
    pub fn all_new() -> Vec<StructureKind> {
        vec![
            StructureKind::Patricia(PatriciaTree::new()),
            StructureKind::Ternary(TernaryTree::new()),
            StructureKind::Hash(HashTable::new()),
        ]
    }
}

impl AssociativeArray for StructureKind {
    fn insert(&mut self, key: &[u8], pos: usize, stream: u8) {
        match self {
            StructureKind::Patricia(t) => t.insert(key, pos, stream),
            StructureKind::Ternary(t) => t.insert(key, pos, stream),
            StructureKind::Hash(t) => t.insert(key, pos, stream),
        }
    }

    fn search_report(&self, key: &[u8], stream: u8, verbose: bool) -> bool {
        match self {
            StructureKind::Patricia(t) => t.search_report(key, stream, verbose),
            StructureKind::Ternary(t) => t.search_report(key, stream, verbose),
            StructureKind::Hash(t) => t.search_report(key, stream, verbose),
        }
    }

    fn occurrences(&self, key: &[u8]) -> (usize, usize) {
        match self {
            StructureKind::Patricia(t) => t.occurrences(key),
            StructureKind::Ternary(t) => t.occurrences(key),
            StructureKind::Hash(t) => t.occurrences(key),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            StructureKind::Patricia(t) => t.name(),
            StructureKind::Ternary(t) => t.name(),
            StructureKind::Hash(t) => t.name(),
        }
    }

    fn structure_size(&self) -> usize {
        match self {
            StructureKind::Patricia(t) => t.structure_size(),
            StructureKind::Ternary(t) => t.structure_size(),
            StructureKind::Hash(t) => t.structure_size(),
        }
    }

    fn extra_measurement(&self) -> f64 {
        match self {
            StructureKind::Patricia(t) => t.extra_measurement(),
            StructureKind::Ternary(t) => t.extra_measurement(),
            StructureKind::Hash(t) => t.extra_measurement(),
        }
    }
}
