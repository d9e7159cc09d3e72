//! Edge-Matching Cube Puzzle Library
//!
//! Assembles square puzzle faces with toothed edges into a closed shape and
//! measures how hard a piece set is to assemble.
//!
//! - [`piece`]: perimeter bits, orientations and symmetry analysis
//! - [`compat`]: rules for joining edges and corners
//! - [`grid`]: slot topologies and their constraints
//! - [`solver`]: exhaustive backtracking search with statistics
//! - [`rating`]: difficulty estimate built on the search statistics
//! - [`persistence`]: JSON definition files

pub mod compat;
pub mod grid;
pub mod persistence;
pub mod piece;
pub mod rating;
pub mod solver;

pub use compat::{corner_compatible, count_matching_edges, edge_compatible};
pub use grid::{Grid, GridError, Placement, Slot};
pub use piece::{Edge, Orientation, OrientationSet, Piece, PieceError, PieceMeta, Side};
pub use rating::{difficulty, DifficultyRater};
pub use solver::{SolveError, SolveStats, Solver};
