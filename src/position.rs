//! Per-key occurrence bookkeeping shared by all three associative arrays.

/// Two ordered position lists recorded for a single key, one per stream.
///
/// Every insert appends to exactly one of the two lists, selected by the
/// caller's stream id. Duplicates are never collapsed: inserting the same
/// position twice on the same stream records it twice.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PositionMultiset {
    streams: [Vec<usize>; 2],
}

impl PositionMultiset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `pos` to stream `stream`.
    ///
    /// # Panics
    /// Panics if `stream` is not `0` or `1`; the harness never constructs
    /// any other stream id.
    pub fn push(&mut self, stream: u8, pos: usize) {
        self.streams[stream as usize].push(pos);
    }

    pub fn counts(&self) -> (usize, usize) {
        (self.streams[0].len(), self.streams[1].len())
    }

    pub fn stream(&self, stream: u8) -> &[usize] {
        &self.streams[stream as usize]
    }

    /// Heap bytes owned by the two position vectors, using capacity (not
    /// length) so a table that grows an entry past a `Vec`'s existing
    /// capacity is accounted honestly.
    pub fn heap_size(&self) -> usize {
        (self.streams[0].capacity() + self.streams[1].capacity()) * std::mem::size_of::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_multiset_is_empty_on_both_streams() {
        let m = PositionMultiset::new();
        assert_eq!(m.counts(), (0, 0));
    }

    #[test]
    fn push_appends_in_order_per_stream() {
        let mut m = PositionMultiset::new();
        m.push(0, 3);
        m.push(1, 7);
        m.push(0, 9);
        assert_eq!(m.counts(), (2, 1));
        assert_eq!(m.stream(0), &[3, 9]);
        assert_eq!(m.stream(1), &[7]);
    }

    #[test]
    fn duplicate_positions_are_kept() {
        let mut m = PositionMultiset::new();
        m.push(0, 5);
        m.push(0, 5);
        assert_eq!(m.counts(), (2, 0));
    }

    #[test]
    fn stream_insertions_do_not_cross_contaminate() {
        let mut m = PositionMultiset::new();
        for i in 0..10 {
            m.push(1, i);
        }
        assert_eq!(m.counts(), (0, 10));
    }
}
