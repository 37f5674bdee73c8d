//! Search settings

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::heuristics::Heuristic;
use crate::solver::MoveOrdering;
use crate::transposition_table::DEFAULT_TABLE_SIZE;

/// Settings for one [`Solver`](crate::solver::Solver)
///
/// Missing fields take their default values when deserialising, so a
/// profile only needs to list what it changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Time allowed for one move, in seconds. Infinite means no limit.
    pub time_limit: f64,
    /// Iterative deepening searches depths `0..max_depth`
    pub max_depth: usize,
    pub heuristic: Heuristic,
    pub ordering: MoveOrdering,
    pub use_transposition_table: bool,
    /// Keep the transposition table between calls instead of clearing it
    pub reuse_table: bool,
    /// Number of transposition table slots
    pub table_size: usize,
    /// Seed for random move ordering and the random heuristic
    pub seed: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            time_limit: 19.0,
            max_depth: 100,
            heuristic: Heuristic::Default,
            ordering: MoveOrdering::HeuristicSorted,
            use_transposition_table: true,
            reuse_table: false,
            table_size: DEFAULT_TABLE_SIZE,
            seed: 0,
        }
    }
}

impl SearchConfig {
    /// The time budget, or `None` when the search is unlimited
    ///
    /// Negative and NaN limits count as an already expired budget, limits too
    /// large for a `Duration` as no limit at all.
    pub fn time_budget(&self) -> Option<Duration> {
        if self.time_limit > 0.0 {
            Duration::try_from_secs_f64(self.time_limit).ok()
        } else {
            Some(Duration::ZERO)
        }
    }

    pub fn with_time_limit(mut self, seconds: f64) -> Self {
        self.time_limit = seconds;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_heuristic(mut self, heuristic: Heuristic) -> Self {
        self.heuristic = heuristic;
        self
    }

    pub fn with_ordering(mut self, ordering: MoveOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn with_transposition_table(mut self, enabled: bool) -> Self {
        self.use_transposition_table = enabled;
        self
    }

    pub fn with_table_size(mut self, table_size: usize) -> Self {
        self.table_size = table_size;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("invalid search configuration")
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reads a configuration from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_json(&json)
    }
}
