//! An agent to choose moves in Dynamic Connect 4

use log::{debug, info};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::{Deserialize, Serialize};

use std::time::Duration;

use crate::{
    clock::*, config::SearchConfig, heuristics::*, state::*, transposition_table::*,
};

/// A score beyond any reachable value, used for the initial search window
pub const INFINITY: i32 = i32::MAX;

/// The score of a won position found with `depth` plies of search remaining
///
/// Wins found higher up the tree have more depth remaining, so a quicker win
/// always outscores a slower one.
pub fn win_score(depth: usize) -> i32 {
    WIN_SCORE * (depth as i32 + 1)
}

/// The order in which the children of a node are searched
///
/// Ordering never changes the value of a search, only how much of the tree
/// alpha-beta can prune.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveOrdering {
    /// Move generation order
    #[serde(alias = "none")]
    Unordered,
    /// Best child for the player to move first, by static evaluation
    HeuristicSorted,
    /// Shuffled, for comparison only
    Random,
}

impl Default for MoveOrdering {
    fn default() -> Self {
        MoveOrdering::HeuristicSorted
    }
}

/// Marker returned when the time budget ran out in the middle of a search
///
/// It carries no score: a search interrupted part way has nothing trustworthy
/// to report, so it is passed straight up to the root.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TimeExpired;

/// The value of a node from the point of view of the player to move, with the
/// move that achieves it
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Line {
    pub score: i32,
    pub best_move: Option<Move>,
}

impl Line {
    fn leaf(score: i32) -> Self {
        Self {
            score,
            best_move: None,
        }
    }
}

/// Counters collected while searching (for diagnostics only)
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Nodes entered, including leaves
    pub nodes: usize,
    /// Transposition table lookups that returned a usable entry
    pub table_hits: usize,
    /// Nodes where a beta cutoff skipped the remaining children
    pub cutoffs: usize,
}

/// The outcome of an iterative deepening search
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SearchResult {
    /// `None` only if the game is over or the player has no legal move
    pub best_move: Option<Move>,
    /// Score of the deepest completed search, for the player to move
    pub score: i32,
    /// Deepest completed search depth
    pub depth: usize,
    /// Whether a deeper search was cut short by the time budget
    pub aborted: bool,
    pub stats: SearchStats,
}

// children of a node with the score used to order them, best kept last
struct MoveSorter {
    moves: Vec<(Move, State, i32)>,
}

impl MoveSorter {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            moves: Vec::with_capacity(capacity),
        }
    }
    pub fn push(&mut self, new_move: Move, child: State, score: i32) {
        let mut pos = self.moves.len();
        self.moves.push((new_move, child, score));
        while pos != 0 && self.moves[pos - 1].2 > score {
            self.moves.swap(pos, pos - 1);
            pos -= 1;
        }
    }
}
impl Iterator for MoveSorter {
    type Item = (Move, State);

    fn next(&mut self) -> Option<Self::Item> {
        self.moves.pop().map(|(new_move, child, _)| (new_move, child))
    }
}

/// An agent to find good moves in Dynamic Connect 4 positions
///
/// # Notes
/// This agent uses negamax alpha-beta search with a transposition table,
/// deepening one ply at a time until the time budget or the maximum depth is
/// reached, and plays the best move of the deepest search that completed.
///
/// # Position Scoring
/// Scores are given from the point of view of the player to move. Undecided
/// positions are scored by the evaluator, so they stay below [`WIN_SCORE`]
/// in magnitude. A win found with `d` plies of search still remaining scores
/// `WIN_SCORE * (d + 1)`, so faster wins score higher, and losses the negation.
pub struct Solver<E = HeuristicEvaluator, C = SystemClock> {
    evaluator: E,
    clock: C,
    rng: StdRng,
    time_budget: Option<Duration>,
    max_depth: usize,
    ordering: MoveOrdering,
    use_table: bool,
    reuse_table: bool,
    transposition_table: TranspositionTable,

    /// Counters for the current or most recent search (for diagnostics only)
    pub stats: SearchStats,
}

impl Solver {
    /// Creates a new `Solver` using the configured heuristic and the system clock
    pub fn new(config: SearchConfig) -> Self {
        let evaluator = HeuristicEvaluator::new(config.heuristic, config.seed);
        Self::with_parts(config, evaluator, SystemClock::new())
    }
}

impl<E: Evaluator, C: Clock> Solver<E, C> {
    /// Creates a new `Solver` from an evaluator and a clock
    pub fn with_parts(config: SearchConfig, evaluator: E, clock: C) -> Self {
        Self {
            evaluator,
            clock,
            rng: StdRng::seed_from_u64(config.seed),
            time_budget: config.time_budget(),
            max_depth: config.max_depth,
            ordering: config.ordering,
            use_table: config.use_transposition_table,
            reuse_table: config.reuse_table,
            transposition_table: TranspositionTable::with_size(config.table_size),
            stats: SearchStats::default(),
        }
    }

    /// Replaces the evaluator of an existing `Solver`
    pub fn with_evaluator<F: Evaluator>(self, evaluator: F) -> Solver<F, C> {
        Solver {
            evaluator,
            clock: self.clock,
            rng: self.rng,
            time_budget: self.time_budget,
            max_depth: self.max_depth,
            ordering: self.ordering,
            use_table: self.use_table,
            reuse_table: self.reuse_table,
            transposition_table: self.transposition_table,
            stats: self.stats,
        }
    }

    /// Replaces the clock of an existing `Solver`
    pub fn with_clock<D: Clock>(self, clock: D) -> Solver<E, D> {
        Solver {
            evaluator: self.evaluator,
            clock,
            rng: self.rng,
            time_budget: self.time_budget,
            max_depth: self.max_depth,
            ordering: self.ordering,
            use_table: self.use_table,
            reuse_table: self.reuse_table,
            transposition_table: self.transposition_table,
            stats: self.stats,
        }
    }

    pub fn transposition_table(&self) -> &TranspositionTable {
        &self.transposition_table
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Scores a position for `side` without searching
    pub fn static_score(&mut self, state: &State, side: Side) -> i32 {
        match state.winner() {
            Some(winner) => side.color() * winner.color() * win_score(0),
            None => side.color() * self.evaluator.evaluate(state),
        }
    }

    /// Lists the children of a node in the order they will be searched
    fn ordered_successors(&mut self, state: &State, side: Side) -> Vec<(Move, State)> {
        let mut successors = state.successors(side);
        match self.ordering {
            MoveOrdering::Unordered => {}
            MoveOrdering::HeuristicSorted => {
                let color = side.color();
                let mut sorter = MoveSorter::with_capacity(successors.len());
                // pushing in reverse keeps generation order among equal scores
                for (new_move, child) in successors.into_iter().rev() {
                    let score = color * self.evaluator.evaluate(&child);
                    sorter.push(new_move, child, score);
                }
                return sorter.collect();
            }
            MoveOrdering::Random => successors.shuffle(&mut self.rng),
        }
        successors
    }

    /// Performs game tree search
    ///
    /// Returns the score of the position for `side` (see [Position Scoring]),
    /// or [`TimeExpired`] if the time budget ran out before it completed.
    ///
    /// [Position Scoring]: #position-scoring
    fn negamax(
        &mut self,
        state: &State,
        depth: usize,
        mut alpha: i32,
        mut beta: i32,
        side: Side,
    ) -> Result<Line, TimeExpired> {
        self.stats.nodes += 1;
        let color = side.color();

        // check for a finished game
        if let Some(winner) = state.winner() {
            return Ok(Line::leaf(color * winner.color() * win_score(depth)));
        }

        if depth == 0 {
            return Ok(Line::leaf(color * self.evaluator.evaluate(state)));
        }

        if let Some(budget) = self.time_budget {
            if self.clock.elapsed() >= budget {
                return Err(TimeExpired);
            }
        }

        let alpha_orig = alpha;

        // try to fetch the value or a bound on it from the transposition table
        if self.use_table {
            if let Some(entry) = self.transposition_table.lookup(state, side, depth) {
                self.stats.table_hits += 1;
                let cached = Line {
                    score: entry.score,
                    best_move: entry.best_move,
                };
                match entry.bound {
                    Bound::Exact => return Ok(cached),
                    Bound::LowerBound => alpha = alpha.max(entry.score),
                    Bound::UpperBound => beta = beta.min(entry.score),
                }
                if alpha >= beta {
                    // prune the exploration
                    return Ok(cached);
                }
            }
        }

        let successors = self.ordered_successors(state, side);
        // a player without legal moves is scored on the position as it stands
        if successors.is_empty() {
            return Ok(Line::leaf(color * self.evaluator.evaluate(state)));
        }

        // search the next level of the tree and keep track of the best move
        let mut best = Line {
            score: -INFINITY,
            best_move: None,
        };
        for (new_move, child) in successors {
            // the search window is flipped for the other player
            let score = -self
                .negamax(&child, depth - 1, -beta, -alpha, side.opponent())?
                .score;
            if score > best.score {
                best = Line {
                    score,
                    best_move: Some(new_move),
                };
            }
            if score > alpha {
                alpha = score;
            }
            // the other player will not allow this branch, skip the remaining moves
            if alpha >= beta {
                self.stats.cutoffs += 1;
                break;
            }
        }

        if self.use_table {
            let bound = if best.score <= alpha_orig {
                Bound::UpperBound
            } else if best.score >= beta {
                Bound::LowerBound
            } else {
                Bound::Exact
            };
            self.transposition_table
                .store(state, side, depth, best.score, bound, best.best_move);
        }
        Ok(best)
    }

    /// Searches a position to a fixed depth with a full window
    ///
    /// The time budget is measured from the clock's last reset. Statistics
    /// accumulate in [`Solver::stats`].
    pub fn search(&mut self, state: &State, side: Side, depth: usize) -> Result<Line, TimeExpired> {
        self.negamax(state, depth, -INFINITY, INFINITY, side)
    }

    /// The move whose resulting position evaluates best for `side`, first on ties
    fn greedy_move(&mut self, state: &State, side: Side) -> Option<Move> {
        let mut best: Option<(Move, i32)> = None;
        for (new_move, child) in state.successors(side) {
            let score = self.static_score(&child, side);
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((new_move, score));
            }
        }
        best.map(|(new_move, _)| new_move)
    }

    /// Calculates the best move for `side` with iterative deepening
    ///
    /// Searches depths `0, 1, ...` up to the configured maximum, stopping early
    /// when a win is found or the time budget is spent, and returns the result
    /// of the deepest search that completed. If no search deeper than 0
    /// completed, the move with the best static evaluation is played.
    pub fn best_move(&mut self, state: &State, side: Side) -> SearchResult {
        self.clock.reset();
        self.stats = SearchStats::default();
        if !self.reuse_table {
            self.transposition_table.clear();
        }

        let mut result = SearchResult {
            best_move: None,
            score: self.static_score(state, side),
            depth: 0,
            aborted: false,
            stats: SearchStats::default(),
        };

        debug!("[{} AI] Thinking of a move...", side);
        for depth in 0..self.max_depth {
            let nodes_before = self.stats.nodes;
            match self.search(state, side, depth) {
                Err(TimeExpired) => {
                    info!(
                        "[{} AI] Depth {} interrupted by the time limit, using depth {}",
                        side, depth, result.depth
                    );
                    result.aborted = true;
                    break;
                }
                Ok(line) => {
                    result.score = line.score;
                    result.depth = depth;
                    result.best_move = line.best_move.or(result.best_move);
                    debug!(
                        "[{} AI] Depth {}, value: {}, best move: {}, states visited: {}",
                        side,
                        depth,
                        side.color() * line.score,
                        line.best_move
                            .map_or_else(|| "none".to_string(), |m| m.to_string()),
                        self.stats.nodes - nodes_before
                    );

                    // no need to look deeper once a forced win is found
                    if line.score >= WIN_SCORE {
                        if let Some(winning_move) = line.best_move {
                            info!("[{} AI] Win found with move {}", side, winning_move);
                        }
                        break;
                    }
                }
            }

            if let Some(budget) = self.time_budget {
                if self.clock.elapsed() >= budget {
                    break;
                }
            }
        }

        if result.best_move.is_none() && state.winner().is_none() {
            result.best_move = self.greedy_move(state, side);
        }
        result.stats = self.stats;
        result
    }
}

/// Chooses a move for `side` within `time_limit` seconds, searching at most
/// `max_depth` plies with the given heuristic and move ordering
///
/// Returns `None` if the game is already over or `side` cannot move.
pub fn best_move(
    state: &State,
    side: Side,
    time_limit: f64,
    max_depth: usize,
    heuristic: Heuristic,
    ordering: MoveOrdering,
) -> Option<Move> {
    let config = SearchConfig {
        time_limit,
        max_depth,
        heuristic,
        ordering,
        ..SearchConfig::default()
    };
    Solver::new(config).best_move(state, side).best_move
}
