//! Bitboard layout and alignment helpers
//!
//! Squares are stored column by column, each column using `HEIGHT + 1` bits
//! where the top bit is a sentinel that is never set. The sentinel stops
//! vertical and diagonal runs from wrapping into the next column, so four in
//! a row can be found with a handful of shifts.

use crate::{HEIGHT, WIDTH};

mod static_masks {
    use crate::{HEIGHT, WIDTH};

    pub const fn bottom_mask() -> u64 {
        let mut mask = 0;
        let mut column = 0;
        while column < WIDTH {
            mask |= 1 << (column * (HEIGHT + 1));
            column += 1;
        }
        mask
    }
    pub const fn full_board_mask() -> u64 {
        bottom_mask() * ((1 << HEIGHT as u64) - 1)
    }
}

/// Mask of every playable square on the board
pub const BOARD_MASK: u64 = static_masks::full_board_mask();

/// The bit offsets between neighbouring squares in each line direction:
/// vertical, diagonal `/`, horizontal, diagonal `\`
pub const LINE_SHIFTS: [usize; 4] = [1, HEIGHT, HEIGHT + 1, HEIGHT + 2];

/// Returns the bit index of a square, or `None` if it is off the board
pub fn square_index(column: i32, row: i32) -> Option<usize> {
    if column < 0 || column >= WIDTH as i32 || row < 0 || row >= HEIGHT as i32 {
        return None;
    }
    Some(column as usize * (HEIGHT + 1) + row as usize)
}

/// Returns the bit of a square, or `None` if it is off the board
pub fn square_bit(column: i32, row: i32) -> Option<u64> {
    square_index(column, row).map(|index| 1 << index)
}

/// Converts a bit index back into `(column, row)`
pub fn index_to_square(index: usize) -> (usize, usize) {
    (index / (HEIGHT + 1), index % (HEIGHT + 1))
}

/// Iterates over the indices of the set bits in a mask, lowest first
pub fn bits(mut mask: u64) -> impl Iterator<Item = usize> {
    std::iter::from_fn(move || {
        if mask == 0 {
            None
        } else {
            let index = mask.trailing_zeros() as usize;
            // clear the lowest set bit
            mask &= mask - 1;
            Some(index)
        }
    })
}

/// Checks a mask of one player's pieces for four in a row
pub fn has_alignment(pos: u64) -> bool {
    for &shift in LINE_SHIFTS.iter() {
        // mark all runs of 2
        let m = pos & (pos >> shift);
        // check for runs of 2 * (runs of 2)
        if m & (m >> (2 * shift)) != 0 {
            return true;
        }
    }
    // no alignments
    false
}
