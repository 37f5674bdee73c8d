use crate::state::{Move, Side, State};

/// How a stored score relates to the true value of the position
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Bound {
    /// The search completed inside its window
    Exact,
    /// A cutoff occurred, the true value is at least the score
    LowerBound,
    /// No move reached alpha, the true value is at most the score
    UpperBound,
}

/// A position together with the player to move in it
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TableKey {
    pub state: State,
    pub side: Side,
}

impl TableKey {
    pub fn new(state: State, side: Side) -> Self {
        Self { state, side }
    }

    // mixes both bitboards and the side to move into a slot index
    fn hash_code(&self) -> u64 {
        let white = self.state.mask(Side::White);
        let black = self.state.mask(Side::Black);
        let mut h = white.wrapping_mul(0x9E37_79B9_7F4A_7C15);
        h ^= black.wrapping_mul(0xC2B2_AE3D_27D4_EB4F).rotate_left(31);
        h ^= (self.side == Side::Black) as u64;
        h ^ (h >> 29)
    }
}

#[derive(Copy, Clone, Debug)]
pub struct Entry {
    pub key: TableKey,
    pub score: i32,
    pub bound: Bound,
    /// The remaining depth the score was searched to
    pub depth: usize,
    pub best_move: Option<Move>,
}

pub const DEFAULT_TABLE_SIZE: usize = (1 << 18) + 3; // prime value

/// A fixed size, direct-mapped cache of search results
///
/// Each key maps to a single slot. Storing always replaces the slot, and a
/// lookup only succeeds for the exact key it was stored with, so collisions
/// cost hits but never return another position's score.
#[derive(Clone)]
pub struct TranspositionTable {
    entries: Vec<Option<Entry>>,
}

impl TranspositionTable {
    pub fn new() -> Self {
        Self::with_size(DEFAULT_TABLE_SIZE)
    }

    pub fn with_size(size: usize) -> Self {
        Self {
            entries: vec![None; size.max(1)],
        }
    }

    fn slot(&self, key: &TableKey) -> usize {
        (key.hash_code() % self.entries.len() as u64) as usize
    }

    /// Stores a search result, replacing whatever occupied its slot
    pub fn store(
        &mut self,
        state: &State,
        side: Side,
        depth: usize,
        score: i32,
        bound: Bound,
        best_move: Option<Move>,
    ) {
        let key = TableKey::new(*state, side);
        let slot = self.slot(&key);
        self.entries[slot] = Some(Entry {
            key,
            score,
            bound,
            depth,
            best_move,
        });
    }

    /// Fetches the entry for a position if it was searched at least `depth` deep
    pub fn lookup(&self, state: &State, side: Side, depth: usize) -> Option<Entry> {
        let key = TableKey::new(*state, side);
        match self.entries[self.slot(&key)] {
            Some(entry) if entry.key == key && entry.depth >= depth => Some(entry),
            _ => None,
        }
    }

    pub fn clear(&mut self) {
        for entry in self.entries.iter_mut() {
            *entry = None;
        }
    }

    /// The number of occupied slots
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(|entry| entry.is_none())
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }
}

impl Default for TranspositionTable {
    fn default() -> Self {
        Self::new()
    }
}
