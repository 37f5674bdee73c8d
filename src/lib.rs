//! A game tree search agent for the board game 'Dynamic Connect 4'
//!
//! Each player owns a fixed set of pieces on a 7x7 board and slides one piece
//! a single square per turn. Four of a player's pieces in a row, column or
//! diagonal wins. The agent searches the game tree with negamax alpha-beta,
//! a depth-aware transposition table and time-limited iterative deepening.
//!
//! # Basic Usage
//!
//! ```
//! use dynamic_connect4::{config::SearchConfig, solver::Solver, state::*};
//!
//!# use std::error::Error;
//!# fn main() -> Result<(), Box<dyn Error>> {
//! let white = [(2, 2), (3, 2), (4, 2), (5, 3)];
//! let black = [(0, 6), (2, 6), (4, 6), (6, 6)];
//! let state = State::new(
//!     white.iter().map(|&(c, r)| Square::new(c, r)),
//!     black.iter().map(|&(c, r)| Square::new(c, r)),
//! )?;
//!
//! let mut solver = Solver::new(SearchConfig::default());
//! let result = solver.best_move(&state, Side::White);
//!
//! assert_eq!(result.best_move, Some("64N".parse()?));
//!# Ok(())
//!# }
//! ```

use static_assertions::*;
pub use anyhow;

pub mod bitboard;

pub mod state;

pub mod error;

pub mod heuristics;

pub mod transposition_table;

pub mod clock;

pub mod config;

pub mod solver;

pub mod diagnostics;

mod test;

pub use solver::best_move;

/// The width of the game board in squares
pub const WIDTH: usize = 7;

/// The height of the game board in squares
pub const HEIGHT: usize = 7;

// ensure that the given dimensions fit in a u64 for the bitboard representation,
// including the empty sentinel row above each column
const_assert!(WIDTH * (HEIGHT + 1) <= 64);
