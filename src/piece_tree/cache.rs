//! Component D: the search cache (§4.4.8). A bounded list of recently
//! located node spans, consulted by offset-based lookups before falling
//! back to a tree descent. A cache miss or a stale entry can never
//! produce a wrong answer, only a slower one: [`PieceTree`](super::PieceTree)
//! always re-verifies a hit against the piece it actually names.

use crate::piece::Piece;
use smallvec::SmallVec;

const CACHE_CAPACITY: usize = 4;

#[derive(Debug, Clone, Copy)]
pub(crate) struct CacheEntry {
    pub(crate) node_start_offset: u64,
    pub(crate) piece: Piece,
}

impl CacheEntry {
    #[inline]
    pub(crate) fn piece_length(&self) -> u64 {
        self.piece.length
    }
}

#[derive(Debug, Default)]
pub(crate) struct SearchCache {
    entries: SmallVec<[CacheEntry; CACHE_CAPACITY]>,
}

impl SearchCache {
    pub(crate) fn new() -> Self {
        SearchCache {
            entries: SmallVec::new(),
        }
    }

    /// Most-recently-inserted entry whose span contains `offset`, i.e. a
    /// node a caller can read from directly instead of descending the
    /// tree. The caller still owns verifying the entry actually covers
    /// what it needs; a stale entry can only cost a fallback descent,
    /// never a wrong answer.
    pub(crate) fn get(&self, offset: u64) -> Option<CacheEntry> {
        self.entries
            .iter()
            .rev()
            .copied()
            .find(|e| offset >= e.node_start_offset && offset < e.node_start_offset + e.piece_length())
    }

    pub(crate) fn put(&mut self, entry: CacheEntry) {
        if self.entries.len() >= CACHE_CAPACITY {
            self.entries.remove(0);
        }
        self.entries.push(entry);
    }

    /// Drop every entry that could have shifted or been invalidated by an
    /// edit touching document offset `offset` or anything before it.
    pub(crate) fn invalidate_from(&mut self, offset: u64) {
        self.entries.retain(|e| e.node_start_offset < offset);
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::buffer::Buffer;
    use crate::piece::CHANGE_BUFFER;

    fn piece_of_length(len: u32) -> Piece {
        let buffer = Buffer::from_units(vec![b'a' as u16; len as usize]);
        Piece::new(&buffer, CHANGE_BUFFER, crate::buffer::BufferPosition::new(0, 0), crate::buffer::BufferPosition::new(0, len))
    }

    fn entry(node_start_offset: u64, piece_length: u32) -> CacheEntry {
        CacheEntry {
            node_start_offset,
            piece: piece_of_length(piece_length),
        }
    }

    #[test]
    fn hits_within_span_misses_outside() {
        let mut cache = SearchCache::new();
        cache.put(entry(10, 5));
        assert!(cache.get(10).is_some());
        assert!(cache.get(14).is_some());
        assert!(cache.get(15).is_none());
        assert!(cache.get(9).is_none());
    }

    #[test]
    fn invalidate_drops_entries_at_or_after_offset() {
        let mut cache = SearchCache::new();
        cache.put(entry(10, 5));
        cache.put(entry(20, 5));
        cache.invalidate_from(15);
        assert!(cache.get(10).is_some());
        assert!(cache.get(20).is_none());
    }

    #[test]
    fn evicts_oldest_past_capacity() {
        let mut cache = SearchCache::new();
        for i in 0..(CACHE_CAPACITY as u64 + 2) {
            cache.put(entry(i * 10, 1));
        }
        assert!(cache.get(0).is_none());
        assert!(cache.get((CACHE_CAPACITY as u64 + 1) * 10).is_some());
    }
}
