//! Static evaluation of positions
//!
//! Every evaluator scores a position from White's point of view: larger is
//! better for White regardless of whose turn it is. A score whose magnitude
//! reaches [`WIN_SCORE`] means the game is decided.

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::bitboard::{self, LINE_SHIFTS};
use crate::state::{Side, State};
use crate::{HEIGHT, WIDTH};

/// Score of a won position, and the threshold for a decided game
pub const WIN_SCORE: i32 = 10_000;

const FOUR_IN_A_ROW_SCORE: i32 = 3_000;
const THREE_IN_A_ROW_SCORE: i32 = 1_000;

// only half of the directions are needed, as every piece is used as a starting point
const ADJACENT_DIRECTIONS: [(i32, i32); 4] = [(0, 1), (1, -1), (1, 0), (1, 1)];

const CENTER_COLUMN: i32 = WIDTH as i32 / 2;
const CENTER_ROW: i32 = HEIGHT as i32 / 2;

/// Returns true if `score` means a win for either player
pub fn is_decided(score: i32) -> bool {
    score.abs() >= WIN_SCORE
}

/// A scoring function for positions
///
/// Implementations other than [`Heuristic::Random`] must return the same score
/// for the same state every time, and should be cheap: the search calls them
/// at every leaf and again when sorting moves.
pub trait Evaluator {
    fn evaluate(&mut self, state: &State) -> i32;
}

impl<F: FnMut(&State) -> i32> Evaluator for F {
    fn evaluate(&mut self, state: &State) -> i32 {
        self(state)
    }
}

/// The available evaluation heuristics
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Heuristic {
    /// Squared distance to the centre plus the longest runs of pieces
    Default,
    /// Only distinguishes won, lost and undecided positions
    WinLoss,
    /// Whether each player has three pieces in a line
    ThreeInARow,
    /// Number of pairs of adjacent pieces of the same colour
    Cluster,
    /// Manhattan distance of the pieces to the centre
    CenterDistance,
    /// Number of legal moves available to each player
    Mobility,
    /// A uniformly random score, as a baseline
    Random,
}

impl Default for Heuristic {
    fn default() -> Self {
        Heuristic::Default
    }
}

impl Heuristic {
    pub fn is_deterministic(self) -> bool {
        self != Heuristic::Random
    }

    /// Scores `state` for White, drawing from `rng` only for [`Heuristic::Random`]
    pub fn evaluate_with<R: Rng>(self, state: &State, rng: &mut R) -> i32 {
        match self {
            Heuristic::Default => center_distance_squared(state) + in_a_row(state),
            Heuristic::WinLoss => win_loss(state),
            Heuristic::ThreeInARow => three_in_a_row(state),
            Heuristic::Cluster => cluster(state),
            Heuristic::CenterDistance => center_distance(state),
            Heuristic::Mobility => mobility(state),
            Heuristic::Random => rng.gen_range(-WIN_SCORE + 1..WIN_SCORE),
        }
    }
}

/// A [`Heuristic`] together with the random source used by [`Heuristic::Random`]
#[derive(Clone, Debug)]
pub struct HeuristicEvaluator {
    heuristic: Heuristic,
    rng: StdRng,
}

impl HeuristicEvaluator {
    pub fn new(heuristic: Heuristic, seed: u64) -> Self {
        Self {
            heuristic,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn heuristic(&self) -> Heuristic {
        self.heuristic
    }
}

impl Evaluator for HeuristicEvaluator {
    fn evaluate(&mut self, state: &State) -> i32 {
        self.heuristic.evaluate_with(state, &mut self.rng)
    }
}

impl From<Heuristic> for HeuristicEvaluator {
    fn from(heuristic: Heuristic) -> Self {
        Self::new(heuristic, 0)
    }
}

fn occupies(mask: u64, column: i32, row: i32) -> bool {
    bitboard::square_bit(column, row).map_or(false, |bit| mask & bit != 0)
}

fn squares(mask: u64) -> impl Iterator<Item = (i32, i32)> {
    bitboard::bits(mask).map(|index| {
        let (column, row) = bitboard::index_to_square(index);
        (column as i32, row as i32)
    })
}

/// `WIN_SCORE` if White has four in a row, `-WIN_SCORE` if Black has, else 0
pub fn win_loss(state: &State) -> i32 {
    match state.winner() {
        Some(side) => side.color() * WIN_SCORE,
        None => 0,
    }
}

// Length of the run through (column, row) along (dx, dy), allowing one empty
// square as a gap between two stretches of pieces
fn run_length(pieces: u64, empty: u64, (column, row): (i32, i32), (dx, dy): (i32, i32)) -> i32 {
    let (mut x, mut y) = (column + dx, row + dy);
    let mut count = 1;
    while occupies(pieces, x, y) {
        count += 1;
        x += dx;
        y += dy;
    }
    if occupies(empty, x, y) {
        x += dx;
        y += dy;
        while occupies(pieces, x, y) {
            count += 1;
            x += dx;
            y += dy;
        }
    }
    count
}

fn run_score(pieces: u64, empty: u64) -> i32 {
    let mut total = 0;
    for square in squares(pieces) {
        for &direction in ADJACENT_DIRECTIONS.iter() {
            let count = run_length(pieces, empty, square, direction);
            if count >= 4 {
                return FOUR_IN_A_ROW_SCORE;
            }
            if count >= 3 {
                return THREE_IN_A_ROW_SCORE;
            }
            // longer runs are worth more
            total += count * count;
        }
    }
    total
}

/// Rewards runs of pieces in a line, with a single gap allowed
pub fn in_a_row(state: &State) -> i32 {
    let empty = bitboard::BOARD_MASK & !state.occupied();
    run_score(state.mask(Side::White), empty) - run_score(state.mask(Side::Black), empty)
}

/// 1 for White having three in a line (gap allowed), -1 for Black, 0 for both or neither
pub fn three_in_a_row(state: &State) -> i32 {
    let empty = bitboard::BOARD_MASK & !state.occupied();
    let has_three = |pieces: u64| {
        squares(pieces).any(|square| {
            ADJACENT_DIRECTIONS
                .iter()
                .any(|&direction| run_length(pieces, empty, square, direction) >= 3)
        })
    };
    has_three(state.mask(Side::White)) as i32 - has_three(state.mask(Side::Black)) as i32
}

/// Rewards pieces near the centre, by squared distance
pub fn center_distance_squared(state: &State) -> i32 {
    let distance = |pieces: u64| -> i32 {
        squares(pieces)
            .map(|(x, y)| (x - CENTER_COLUMN).pow(2) + (y - CENTER_ROW).pow(2))
            .sum()
    };
    distance(state.mask(Side::Black)) - distance(state.mask(Side::White))
}

/// Rewards pieces near the centre, by Manhattan distance
pub fn center_distance(state: &State) -> i32 {
    let distance = |pieces: u64| -> i32 {
        squares(pieces)
            .map(|(x, y)| (x - CENTER_COLUMN).abs() + (y - CENTER_ROW).abs())
            .sum()
    };
    distance(state.mask(Side::Black)) - distance(state.mask(Side::White))
}

/// Counts adjacent pairs of same coloured pieces
pub fn cluster(state: &State) -> i32 {
    let pairs = |pieces: u64| -> i32 {
        LINE_SHIFTS
            .iter()
            .map(|&shift| (pieces & (pieces >> shift)).count_ones() as i32)
            .sum()
    };
    pairs(state.mask(Side::White)) - pairs(state.mask(Side::Black))
}

/// Difference in the number of legal moves
pub fn mobility(state: &State) -> i32 {
    state.legal_moves(Side::White).len() as i32 - state.legal_moves(Side::Black).len() as i32
}
