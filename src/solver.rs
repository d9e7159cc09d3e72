//! Backtracking assembly search.
//!
//! The first piece is pinned to slot 0 in the identity orientation, which
//! removes the global rotations and reflections of every assembly. The
//! remaining pieces are tried slot by slot, each in its candidate
//! orientations, and the grid is checked after every tentative placement.
//!
//! Key choices:
//! - Bitmask for the remaining pieces (u32 instead of a Vec)
//! - Placements carry the orientation, pieces are never mutated
//! - All search state lives in one context owned by the current search

use serde::Serialize;
use thiserror::Error;

use crate::grid::{Grid, Placement, Slot};
use crate::piece::{Orientation, OrientationSet, Piece};

/// Maximum number of pieces, bounded by the remaining-pieces bitmask.
pub const MAX_PIECES: usize = 32;

/// Errors detected before the search starts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SolveError {
    #[error("no pieces to place")]
    NoPieces,
    #[error("{pieces} pieces given for a grid of {slots} slots")]
    PieceCountMismatch { pieces: usize, slots: usize },
    #[error("at most 32 pieces are supported, got {0}")]
    TooManyPieces(usize),
}

/// Counters accumulated over a whole search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SolveStats {
    /// Search nodes that still had pieces to place.
    pub recursions: u64,
    /// Sum of the levels of those nodes.
    pub sum_of_levels: u64,
    /// Grid checks performed.
    pub checks: u64,
    pub solution_count: u64,
    pub used_all_orientations: bool,
}

impl SolveStats {
    /// Mean level of the search nodes; `None` when the search never branched.
    pub fn average_depth(&self) -> Option<f64> {
        (self.recursions > 0).then(|| self.sum_of_levels as f64 / self.recursions as f64)
    }

    /// `None` when no solution was found.
    pub fn checks_per_solution(&self) -> Option<f64> {
        (self.solution_count > 0).then(|| self.checks as f64 / self.solution_count as f64)
    }
}

/// Mutable state of one search, threaded through the recursion.
struct SearchContext<'a, F> {
    grid: &'a Grid,
    pieces: &'a [Piece],
    /// Candidate orientations, indexed by piece.
    orientations: Vec<OrientationSet>,
    slots: Vec<Slot>,
    stats: SolveStats,
    on_solution: F,
}

impl<F> SearchContext<'_, F> {
    /// Fills slot `level` with each remaining piece in each candidate
    /// orientation and recurses on every placement the grid accepts.
    fn backtrack<E>(&mut self, remaining: u32, level: usize) -> Result<(), E>
    where
        F: FnMut(&[Slot]) -> Result<(), E>,
    {
        if remaining == 0 {
            self.stats.solution_count += 1;
            return (self.on_solution)(&self.slots);
        }

        self.stats.recursions += 1;
        self.stats.sum_of_levels += level as u64;

        let mut candidates = remaining;
        while candidates != 0 {
            let piece = candidates.trailing_zeros() as usize;
            candidates &= candidates - 1;

            for orientation in self.orientations[piece].iter() {
                self.slots[level] = Some(Placement { piece, orientation });

                self.stats.checks += 1;
                if !self.grid.check(self.pieces, &self.slots) {
                    continue;
                }
                self.backtrack::<E>(remaining & !(1 << piece), level + 1)?;
            }
        }

        self.slots[level] = None;
        Ok(())
    }
}

/// Searches a grid for every valid assembly of a piece set.
pub struct Solver<'a> {
    grid: &'a Grid,
}

impl<'a> Solver<'a> {
    pub fn new(grid: &'a Grid) -> Self {
        Self { grid }
    }

    pub fn grid(&self) -> &Grid {
        self.grid
    }

    fn validate(&self, pieces: &[Piece]) -> Result<(), SolveError> {
        if pieces.is_empty() {
            return Err(SolveError::NoPieces);
        }
        if pieces.len() > MAX_PIECES {
            return Err(SolveError::TooManyPieces(pieces.len()));
        }
        if pieces.len() != self.grid.piece_count() {
            return Err(SolveError::PieceCountMismatch {
                pieces: pieces.len(),
                slots: self.grid.piece_count(),
            });
        }
        Ok(())
    }

    /// Enumerates all assemblies, handing each one to `on_solution`.
    ///
    /// With `use_all_orientations` every piece is tried in all eight
    /// orientations; otherwise only in its `different_orientations`. An error
    /// returned by `on_solution` stops the search and is returned as is.
    pub fn solve<F, E>(
        &self,
        pieces: &[Piece],
        use_all_orientations: bool,
        on_solution: F,
    ) -> Result<SolveStats, E>
    where
        F: FnMut(&[Slot]) -> Result<(), E>,
        E: From<SolveError>,
    {
        self.validate(pieces)?;

        let orientations = pieces
            .iter()
            .map(|piece| {
                if use_all_orientations {
                    OrientationSet::ALL
                } else {
                    piece.different_orientations()
                }
            })
            .collect();

        let mut slots = vec![None; pieces.len()];
        slots[0] = Some(Placement {
            piece: 0,
            orientation: Orientation::IDENTITY,
        });

        tracing::debug!(
            pieces = pieces.len(),
            constraints = self.grid.constraints().len(),
            use_all_orientations,
            "starting search"
        );

        let mut context = SearchContext {
            grid: self.grid,
            pieces,
            orientations,
            slots,
            stats: SolveStats {
                used_all_orientations: use_all_orientations,
                ..SolveStats::default()
            },
            on_solution,
        };

        // bit i set = piece i still to place; piece 0 is the anchor
        let remaining = (u32::MAX >> (MAX_PIECES - pieces.len())) & !1;
        context.backtrack::<E>(remaining, 1)?;

        let stats = context.stats;
        tracing::debug!(
            solutions = stats.solution_count,
            recursions = stats.recursions,
            checks = stats.checks,
            "search finished"
        );
        Ok(stats)
    }

    /// Collects every assembly along with the search statistics.
    pub fn solve_all(
        &self,
        pieces: &[Piece],
        use_all_orientations: bool,
    ) -> Result<(Vec<Vec<Slot>>, SolveStats), SolveError> {
        let mut solutions = Vec::new();
        let stats = self.solve(pieces, use_all_orientations, |slots| {
            solutions.push(slots.to_vec());
            Ok::<(), SolveError>(())
        })?;
        Ok((solutions, stats))
    }
}
