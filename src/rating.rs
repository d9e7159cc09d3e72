//! Difficulty estimate of a puzzle from its search statistics.
//!
//! Hard puzzles have many plausible side pairings, force the search deep
//! before it fails, and have few solutions.

use thiserror::Error;

use crate::compat::count_matching_edges;
use crate::grid::Grid;
use crate::piece::Piece;
use crate::solver::{SolveError, SolveStats, Solver};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RatingError {
    #[error(transparent)]
    Solve(#[from] SolveError),
    #[error("puzzle cannot be rated: {0}")]
    Degenerate(&'static str),
}

/// `(-m/50 - r + 2 ln(1/s)) / 4 + 6` for `m` matching edges, average depth
/// `r` and `s` solutions.
///
/// `None` when the search never branched or found no solution.
pub fn difficulty(stats: &SolveStats, matching_edges: usize) -> Option<f64> {
    let depth = stats.average_depth()?;
    if stats.solution_count == 0 {
        return None;
    }
    let solutions = stats.solution_count as f64;
    Some((-(matching_edges as f64) / 50.0 - depth + 2.0 * (1.0 / solutions).ln()) / 4.0 + 6.0)
}

/// Rates puzzles on one grid.
pub struct DifficultyRater<'a> {
    solver: Solver<'a>,
}

impl<'a> DifficultyRater<'a> {
    pub fn new(grid: &'a Grid) -> Self {
        Self {
            solver: Solver::new(grid),
        }
    }

    /// Rates `pieces`, reusing `stats` and `matching_edges` when supplied.
    ///
    /// The rating is defined over a search with all orientations, so stats
    /// from a pruned search are discarded and the search is rerun.
    pub fn rate(
        &self,
        pieces: &[Piece],
        stats: Option<&SolveStats>,
        matching_edges: Option<usize>,
    ) -> Result<f64, RatingError> {
        let stats = match stats {
            Some(stats) if stats.used_all_orientations => *stats,
            _ => {
                tracing::debug!("rerunning search with all orientations for rating");
                self.solver.solve(pieces, true, |_| Ok::<(), SolveError>(()))?
            }
        };
        let matching_edges = matching_edges.unwrap_or_else(|| count_matching_edges(pieces));

        if stats.solution_count == 0 {
            return Err(RatingError::Degenerate("no solution"));
        }
        difficulty(&stats, matching_edges).ok_or(RatingError::Degenerate("search never branched"))
    }
}
