//! Open-addressed hash table with linear probing and load-bounded
//! doubling rehash.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::position::PositionMultiset;
use crate::structure::AssociativeArray;

const INITIAL_CAPACITY: usize = 100;
/// Load factor ceiling; crossing it before an insertion doubles the table.
const MAX_LOAD: f64 = 0.4;

struct Slot {
    key: Option<Vec<u8>>,
    positions: PositionMultiset,
}

impl Slot {
    fn empty() -> Self {
        Slot {
            key: None,
            positions: PositionMultiset::new(),
        }
    }
}

/// Associative array backed by a flat slot array probed linearly from
/// `hash(key) % capacity`.
pub struct HashTable {
    slots: Vec<Slot>,
    capacity: usize,
    stored: usize,
}

impl HashTable {
    pub fn new() -> Self {
        HashTable {
            slots: (0..INITIAL_CAPACITY).map(|_| Slot::empty()).collect(),
            capacity: INITIAL_CAPACITY,
            stored: 0,
        }
    }

    fn hash_value(key: &[u8], capacity: usize) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() % capacity as u64) as usize
    }

    pub fn load_factor(&self) -> f64 {
        self.stored as f64 / self.capacity as f64
    }

    /// Probes `slots` linearly from `start`, stopping at the first empty
    /// slot or the first slot whose key matches `key`.
    fn probe_free_slot(slots: &[Slot], capacity: usize, start: usize, key: &[u8]) -> usize {
        let mut slot = start;
        loop {
            match &slots[slot].key {
                None => return slot,
                Some(k) if k.as_slice() == key => return slot,
                Some(_) => slot = (slot + 1) % capacity,
            }
        }
    }

    fn search_slot(&self, key: &[u8]) -> Option<usize> {
        let start = Self::hash_value(key, self.capacity);
        let mut slot = start;
        loop {
            match &self.slots[slot].key {
                None => return None,
                Some(k) if k.as_slice() == key => return Some(slot),
                Some(_) => slot = (slot + 1) % self.capacity,
            }
        }
    }

    /// Doubles capacity and rehashes every occupied slot, called before
    /// any insertion that would push the load factor past [`MAX_LOAD`].
    fn check_fill_rate(&mut self) {
        if (self.stored + 1) as f64 / self.capacity as f64 <= MAX_LOAD {
            return;
        }
        let new_capacity = self.capacity * 2;
        let mut new_slots: Vec<Slot> = (0..new_capacity).map(|_| Slot::empty()).collect();
        for slot in self.slots.drain(..) {
            if let Some(key) = slot.key {
                let start = Self::hash_value(&key, new_capacity);
                let dest = Self::probe_free_slot(&new_slots, new_capacity, start, &key);
                new_slots[dest] = Slot {
                    key: Some(key),
                    positions: slot.positions,
                };
            }
        }
        self.slots = new_slots;
        self.capacity = new_capacity;
    }
}

impl Default for HashTable {
    fn default() -> Self {
        Self::new()
    }
}

impl AssociativeArray for HashTable {
    fn insert(&mut self, key: &[u8], pos: usize, stream: u8) {
        self.check_fill_rate();
        let start = Self::hash_value(key, self.capacity);
        let slot = Self::probe_free_slot(&self.slots, self.capacity, start, key);
        if self.slots[slot].key.is_none() {
            self.slots[slot].key = Some(key.to_vec());
            self.stored += 1;
        }
        self.slots[slot].positions.push(stream, pos);
    }

    fn search_report(&self, key: &[u8], stream: u8, verbose: bool) -> bool {
        match self.search_slot(key) {
            Some(slot) => {
                if verbose {
                    let positions = self.slots[slot].positions.stream(stream);
                    println!(
                        "{} found in slot {slot} with {} occurrences: {:?}",
                        String::from_utf8_lossy(key),
                        positions.len(),
                        positions
                    );
                }
                true
            }
            None => false,
        }
    }

    fn occurrences(&self, key: &[u8]) -> (usize, usize) {
        match self.search_slot(key) {
            Some(slot) => self.slots[slot].positions.counts(),
            None => (0, 0),
        }
    }

    fn name(&self) -> &'static str {
        "HASH"
    }

    fn structure_size(&self) -> usize {
        let base = std::mem::size_of::<Self>();
        self.slots.iter().fold(base, |acc, slot| {
            acc + std::mem::size_of::<Slot>()
                + slot.key.as_ref().map_or(0, |k| k.capacity())
                + slot.positions.heap_size()
        })
    }

    fn extra_measurement(&self) -> f64 {
        self.load_factor()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_table_starts_at_capacity_100() {
        let t = HashTable::new();
        assert_eq!(t.capacity, INITIAL_CAPACITY);
        assert_eq!(t.stored, 0);
    }

    #[test]
    fn round_trip_insert_and_search() {
        let mut t = HashTable::new();
        t.insert(b"some", 0, 0);
        t.insert(b"abacus", 4, 0);
        t.insert(b"something", 16, 0);
        assert!(t.search_report(b"some", 0, false));
        assert!(t.search_report(b"abacus", 0, false));
        assert!(t.search_report(b"something", 0, false));
        assert!(!t.search_report(b"missing", 0, false));
    }

    #[test]
    fn duplicate_key_accumulates_positions_in_one_slot() {
        let mut t = HashTable::new();
        t.insert(b"to", 63, 0);
        t.insert(b"to", 66, 0);
        t.insert(b"to", 69, 0);
        assert_eq!(t.occurrences(b"to"), (3, 0));
    }

    #[test]
    fn streams_are_independent() {
        let mut t = HashTable::new();
        t.insert(b"x", 1, 0);
        t.insert(b"x", 2, 1);
        t.insert(b"x", 3, 1);
        assert_eq!(t.occurrences(b"x"), (1, 2));
    }

    #[test]
    fn load_factor_never_exceeds_threshold_and_capacity_doubles_as_needed() {
        let mut t = HashTable::new();
        for i in 0..250usize {
            let key = format!("{i:08}");
            t.insert(key.as_bytes(), i, 0);
            assert!(t.load_factor() <= MAX_LOAD + 1e-9);
        }
        assert_eq!(t.capacity, 800);
    }

    #[test]
    fn rehash_preserves_every_mapping() {
        let mut t = HashTable::new();
        let keys: Vec<String> = (0..300).map(|i| format!("key-{i}")).collect();
        for (i, k) in keys.iter().enumerate() {
            t.insert(k.as_bytes(), i, 0);
        }
        for (i, k) in keys.iter().enumerate() {
            assert!(t.search_report(k.as_bytes(), 0, false));
            assert_eq!(t.occurrences(k.as_bytes()), (1, 0));
            let _ = i;
        }
    }
}
