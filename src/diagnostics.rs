//! Fixed depth searches for benchmarking and cross-checking
//!
//! None of these searches watch the clock. Each returns the number of nodes
//! it entered alongside the value it computed, so the algorithms can be
//! compared on the same position: pruning and move ordering change the node
//! count, never the value.
//!
//! [`minimax`] and [`alphabeta`] are the textbook max/min formulations and
//! report values from White's point of view. [`negamax`] runs the production
//! search and reports the value for the player to move.

use crate::clock::SystemClock;
use crate::config::SearchConfig;
use crate::heuristics::Evaluator;
use crate::solver::{win_score, MoveOrdering, Solver, INFINITY};
use crate::state::{Side, State};

/// Nodes entered by a search and the value it returned
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub nodes: usize,
    pub value: i32,
}

// value of a node that is not expanded, or None if it should be searched
fn leaf_value<E: Evaluator>(
    state: &State,
    depth: usize,
    side: Side,
    evaluator: &mut E,
) -> Option<i32> {
    if let Some(winner) = state.winner() {
        return Some(winner.color() * win_score(depth));
    }
    if depth == 0 || state.legal_moves(side).is_empty() {
        return Some(evaluator.evaluate(state));
    }
    None
}

/// Exhaustive minimax to `depth` plies, White maximizing
pub fn minimax<E: Evaluator>(
    state: &State,
    depth: usize,
    side: Side,
    evaluator: &mut E,
) -> Diagnostic {
    let mut nodes = 0;
    let value = minimax_value(state, depth, side, evaluator, &mut nodes);
    Diagnostic { nodes, value }
}

fn minimax_value<E: Evaluator>(
    state: &State,
    depth: usize,
    side: Side,
    evaluator: &mut E,
    nodes: &mut usize,
) -> i32 {
    *nodes += 1;
    if let Some(value) = leaf_value(state, depth, side, evaluator) {
        return value;
    }

    let mut best = match side {
        Side::White => -INFINITY,
        Side::Black => INFINITY,
    };
    for (_, child) in state.successors(side) {
        let value = minimax_value(&child, depth - 1, side.opponent(), evaluator, nodes);
        best = match side {
            Side::White => best.max(value),
            Side::Black => best.min(value),
        };
    }
    best
}

/// Alpha-beta without negamax sign folding or a transposition table,
/// searching moves in generation order
pub fn alphabeta<E: Evaluator>(
    state: &State,
    depth: usize,
    side: Side,
    evaluator: &mut E,
) -> Diagnostic {
    let mut nodes = 0;
    let value = alphabeta_value(state, depth, -INFINITY, INFINITY, side, evaluator, &mut nodes);
    Diagnostic { nodes, value }
}

fn alphabeta_value<E: Evaluator>(
    state: &State,
    depth: usize,
    mut alpha: i32,
    mut beta: i32,
    side: Side,
    evaluator: &mut E,
    nodes: &mut usize,
) -> i32 {
    *nodes += 1;
    if let Some(value) = leaf_value(state, depth, side, evaluator) {
        return value;
    }

    match side {
        Side::White => {
            let mut value = -INFINITY;
            for (_, child) in state.successors(side) {
                let child_value =
                    alphabeta_value(&child, depth - 1, alpha, beta, Side::Black, evaluator, nodes);
                value = value.max(child_value);
                alpha = alpha.max(value);
                if alpha >= beta {
                    break; // beta cut-off
                }
            }
            value
        }
        Side::Black => {
            let mut value = INFINITY;
            for (_, child) in state.successors(side) {
                let child_value =
                    alphabeta_value(&child, depth - 1, alpha, beta, Side::White, evaluator, nodes);
                value = value.min(child_value);
                beta = beta.min(value);
                if alpha >= beta {
                    break; // alpha cut-off
                }
            }
            value
        }
    }
}

/// The production negamax search at a fixed depth, without a time limit
///
/// The value is for the player to move, so for Black it is the negation of
/// what [`minimax`] reports.
pub fn negamax<E: Evaluator>(
    state: &State,
    depth: usize,
    side: Side,
    evaluator: &mut E,
    ordering: MoveOrdering,
    use_transposition_table: bool,
) -> Diagnostic {
    let config = SearchConfig::default()
        .with_time_limit(f64::INFINITY)
        .with_ordering(ordering)
        .with_transposition_table(use_transposition_table);
    let evaluate = |state: &State| evaluator.evaluate(state);
    let mut solver = Solver::with_parts(config, evaluate, SystemClock::new());

    match solver.search(state, side, depth) {
        Ok(line) => Diagnostic {
            nodes: solver.stats.nodes,
            value: line.score,
        },
        Err(_) => unreachable!("a search without a time budget cannot expire"),
    }
}
