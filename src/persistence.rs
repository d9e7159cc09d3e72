//! JSON definition files for piece sets and grids.
//!
//! Piece files hold an array of records:
//! - `bits`: 16 characters of `0`/`1`, the forward perimeter
//! - `meta`: optional `{ "index": n, "name": "..." }`; defaults to the record position
//!
//! Grid files hold one object:
//! - `piece_count`: number of slots
//! - `edges`: `{ "slot_a", "side_a", "slot_b", "side_b", "reversed" }`, `reversed` defaults to true
//! - `corners`: arrays of 3, 4 or 5 `[slot, side]` pairs

use std::fs;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::grid::{CornerSpec, EdgeSpec, Grid, GridError};
use crate::piece::{Piece, PieceError, PieceMeta};

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed definition: {0}")]
    Json(#[from] serde_json::Error),
    #[error("piece record {index}: {source}")]
    Piece { index: usize, source: PieceError },
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error("edge between slot {} side {} and slot {} side {} declared twice", .0.slot_a, .0.side_a, .0.slot_b, .0.side_b)]
    DuplicateEdge(EdgeSpec),
}

/// One entry of a piece file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieceRecord {
    pub bits: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<PieceMeta>,
}

/// Contents of a grid file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridDefinition {
    pub piece_count: usize,
    #[serde(default)]
    pub edges: Vec<EdgeSpec>,
    #[serde(default)]
    pub corners: Vec<CornerSpec>,
}

/// Both ends of an edge declaration, order-independent.
fn edge_key(spec: &EdgeSpec) -> ((usize, usize), (usize, usize)) {
    let a = (spec.slot_a, spec.side_a);
    let b = (spec.slot_b, spec.side_b);
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl GridDefinition {
    pub fn from_grid(grid: &Grid) -> Self {
        Self {
            piece_count: grid.piece_count(),
            edges: grid.edges().to_vec(),
            corners: grid.corners().to_vec(),
        }
    }

    /// Compiles every declaration; the first invalid one fails the whole grid.
    pub fn compile(&self) -> Result<Grid, PersistenceError> {
        let mut grid = Grid::new(self.piece_count);
        let mut seen = FxHashSet::default();

        for spec in &self.edges {
            if !seen.insert(edge_key(spec)) {
                return Err(PersistenceError::DuplicateEdge(*spec));
            }
            grid.add_edge_spec(*spec)?;
        }
        for spec in &self.corners {
            grid.add_corner_spec(spec)?;
        }
        Ok(grid)
    }
}

fn read(path: &Path) -> Result<String, PersistenceError> {
    fs::read_to_string(path).map_err(|source| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write(path: &Path, contents: &str) -> Result<(), PersistenceError> {
    fs::write(path, contents).map_err(|source| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Parses a piece set and runs the symmetry analysis of every piece.
pub fn parse_pieces(json: &str) -> Result<Vec<Piece>, PersistenceError> {
    let records: Vec<PieceRecord> = serde_json::from_str(json)?;

    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            let piece_error = |source| PersistenceError::Piece { index, source };
            let meta = record.meta.unwrap_or(PieceMeta { index, name: None });
            let mut piece = record.bits.parse::<Piece>().map_err(piece_error)?.with_meta(meta);
            piece.find_symmetries().map_err(piece_error)?;
            Ok(piece)
        })
        .collect()
}

pub fn load_pieces(path: impl AsRef<Path>) -> Result<Vec<Piece>, PersistenceError> {
    let path = path.as_ref();
    let pieces = parse_pieces(&read(path)?)?;
    tracing::info!(path = %path.display(), count = pieces.len(), "loaded pieces");
    Ok(pieces)
}

pub fn pieces_to_json(pieces: &[Piece]) -> Result<String, PersistenceError> {
    let records: Vec<PieceRecord> = pieces
        .iter()
        .map(|piece| PieceRecord {
            bits: piece.bit_string(),
            meta: piece.meta().cloned(),
        })
        .collect();
    Ok(serde_json::to_string_pretty(&records)?)
}

pub fn save_pieces(path: impl AsRef<Path>, pieces: &[Piece]) -> Result<(), PersistenceError> {
    write(path.as_ref(), &pieces_to_json(pieces)?)
}

pub fn parse_grid(json: &str) -> Result<Grid, PersistenceError> {
    let definition: GridDefinition = serde_json::from_str(json)?;
    definition.compile()
}

pub fn load_grid(path: impl AsRef<Path>) -> Result<Grid, PersistenceError> {
    let path = path.as_ref();
    let grid = parse_grid(&read(path)?)?;
    tracing::info!(
        path = %path.display(),
        slots = grid.piece_count(),
        constraints = grid.constraints().len(),
        "loaded grid"
    );
    Ok(grid)
}

pub fn save_grid(path: impl AsRef<Path>, grid: &Grid) -> Result<(), PersistenceError> {
    let json = serde_json::to_string_pretty(&GridDefinition::from_grid(grid))?;
    write(path.as_ref(), &json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::OrientationSet;

    #[test]
    fn test_parse_pieces_assigns_meta_and_analyzes() {
        let json = r#"[
            { "bits": "0000000000001110" },
            { "bits": "0100000100101011", "meta": { "index": 7, "name": "corner" } }
        ]"#;
        let pieces = parse_pieces(json).unwrap();

        assert_eq!(pieces[0].meta(), Some(&PieceMeta { index: 0, name: None }));
        assert_eq!(pieces[1].meta().unwrap().index, 7);
        assert_eq!(pieces[1].meta().unwrap().name.as_deref(), Some("corner"));
        assert!(pieces.iter().all(Piece::symmetries_analyzed));
        assert_eq!(pieces[0].different_orientations().len(), 4);
        assert_eq!(pieces[1].different_orientations(), OrientationSet::ALL);
    }

    #[test]
    fn test_bad_piece_record_names_its_position() {
        let json = r#"[{ "bits": "0000000000000000" }, { "bits": "0101" }]"#;
        match parse_pieces(json) {
            Err(PersistenceError::Piece { index, source }) => {
                assert_eq!(index, 1);
                assert_eq!(source, PieceError::BitCount(4));
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(matches!(
            parse_pieces("{"),
            Err(PersistenceError::Json(_))
        ));
    }

    #[test]
    fn test_grid_definition_reproduces_builtin_cube() {
        let definition = GridDefinition::from_grid(&Grid::cube());
        let json = serde_json::to_string(&definition).unwrap();
        assert_eq!(parse_grid(&json).unwrap(), Grid::cube());
    }

    #[test]
    fn test_grid_defaults() {
        let json = r#"{
            "piece_count": 2,
            "edges": [{ "slot_a": 0, "side_a": 1, "slot_b": 1, "side_b": 3 }]
        }"#;
        let grid = parse_grid(json).unwrap();
        assert!(grid.edges()[0].reversed);
        assert!(grid.corners().is_empty());
    }

    #[test]
    fn test_invalid_grid_declarations_fail_the_grid() {
        let arity = r#"{ "piece_count": 3, "corners": [[[0, 1], [1, 2]]] }"#;
        assert!(matches!(
            parse_grid(arity),
            Err(PersistenceError::Grid(GridError::CornerArity(2)))
        ));

        let slot = r#"{ "piece_count": 2, "edges": [{ "slot_a": 0, "side_a": 1, "slot_b": 2, "side_b": 3 }] }"#;
        assert!(matches!(
            parse_grid(slot),
            Err(PersistenceError::Grid(GridError::SlotOutOfRange { slot: 2, .. }))
        ));
    }

    #[test]
    fn test_duplicate_edges_are_rejected_in_either_direction() {
        let json = r#"{
            "piece_count": 2,
            "edges": [
                { "slot_a": 0, "side_a": 1, "slot_b": 1, "side_b": 3 },
                { "slot_a": 1, "side_a": 3, "slot_b": 0, "side_b": 1, "reversed": false }
            ]
        }"#;
        assert!(matches!(
            parse_grid(json),
            Err(PersistenceError::DuplicateEdge(EdgeSpec { slot_a: 1, .. }))
        ));
    }

    #[test]
    fn test_save_and_load_files() {
        let dir = std::env::temp_dir().join(format!("snapcube-persistence-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let pieces_path = dir.join("pieces.json");
        let grid_path = dir.join("grid.json");

        let pieces = parse_pieces(r#"[{ "bits": "1100010000101110" }]"#).unwrap();
        save_pieces(&pieces_path, &pieces).unwrap();
        save_grid(&grid_path, &Grid::ring(3)).unwrap();

        assert_eq!(load_pieces(&pieces_path).unwrap(), pieces);
        assert_eq!(load_grid(&grid_path).unwrap(), Grid::ring(3));

        fs::remove_dir_all(&dir).unwrap();
        assert!(matches!(
            load_grid(&grid_path),
            Err(PersistenceError::Io { .. })
        ));
    }
}
