//! Errors raised by the state and move model

use crate::state::{Move, Square};

/// Contract violations when building states or applying moves
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    /// A square outside the board was given
    #[error("square ({column}, {row}) is outside the board")]
    OutOfBounds { column: usize, row: usize },

    /// A square was listed twice for the same player
    #[error("square {0} holds more than one piece")]
    DuplicatePiece(Square),

    /// A square was listed for both players
    #[error("square {0} is claimed by both players")]
    Overlap(Square),

    /// The move is not legal in the position it was applied to
    #[error("illegal move {mv}: {reason}")]
    IllegalMove { mv: Move, reason: &'static str },

    /// The move notation could not be parsed
    #[error("could not parse '{0}' as a move")]
    InvalidMove(String),
}
