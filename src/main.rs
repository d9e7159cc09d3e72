//! Edge-Matching Cube Puzzle Solver
//!
//! Finds every assembly of a set of toothed square pieces on a grid of
//! slots, reports search statistics and optionally rates the puzzle's
//! difficulty.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::Level;

use snapcube::grid::format_slots;
use snapcube::persistence::{self, PersistenceError};
use snapcube::rating::RatingError;
use snapcube::solver::SolveError;
use snapcube::{count_matching_edges, DifficultyRater, Orientation, PieceError, SolveStats, Solver};

/// Solves and rates edge-matching cube puzzles.
#[derive(Parser)]
#[command(name = "snapcube")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Find all assemblies of a piece set on a grid.
    Solve {
        /// Grid definition file.
        grid: PathBuf,
        /// Piece definition file.
        pieces: PathBuf,
        /// Also rate the puzzle's difficulty.
        #[arg(short, long)]
        rate: bool,
        /// Try every orientation, including ones proven redundant by symmetry.
        #[arg(short = 't', long)]
        all_orientations: bool,
        /// Print statistics as one CSV line.
        #[arg(short, long)]
        compact: bool,
        /// Print every solution found.
        #[arg(short = 's', long)]
        show_solutions: bool,
    },
    /// Count the compatible side pairings of a piece set.
    CountEdges {
        /// Piece definition file.
        pieces: PathBuf,
    },
    /// Print every piece of a piece set.
    Dump {
        /// Piece definition file.
        pieces: PathBuf,
        /// Orientation (0-7) to draw the pieces in.
        #[arg(short, long, default_value_t = 0)]
        orientation: usize,
    },
    /// Print the difficulty rating of a puzzle.
    Rate {
        /// Grid definition file.
        grid: PathBuf,
        /// Piece definition file.
        pieces: PathBuf,
    },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error(transparent)]
    Solve(#[from] SolveError),
    #[error(transparent)]
    Rating(#[from] RatingError),
    #[error(transparent)]
    Piece(#[from] PieceError),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(level)
        .init();

    let result = match cli.command {
        Command::Solve {
            grid,
            pieces,
            rate,
            all_orientations,
            compact,
            show_solutions,
        } => run_solve(&grid, &pieces, rate, all_orientations, compact, show_solutions),
        Command::CountEdges { pieces } => run_count_edges(&pieces),
        Command::Dump {
            pieces,
            orientation,
        } => run_dump(&pieces, orientation),
        Command::Rate { grid, pieces } => run_rate(&grid, &pieces),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Formats an optional statistic, `n/a` when undefined.
fn optional(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.6}"))
}

/// Solves the puzzle and prints statistics, optionally with a rating.
fn run_solve(
    grid_path: &Path,
    pieces_path: &Path,
    rate: bool,
    all_orientations: bool,
    compact: bool,
    show_solutions: bool,
) -> Result<(), CliError> {
    let grid = persistence::load_grid(grid_path)?;
    let pieces = persistence::load_pieces(pieces_path)?;

    let solver = Solver::new(&grid);
    let stats: SolveStats = solver.solve(&pieces, all_orientations, |slots| {
        if show_solutions {
            println!("{}", format_slots(slots));
        }
        Ok::<(), CliError>(())
    })?;

    let rating = if rate {
        let rating = DifficultyRater::new(&grid).rate(&pieces, Some(&stats), None)?;
        format!("{rating:.6}")
    } else {
        "n/a".to_string()
    };

    if compact {
        println!(
            "{},{},{},{},{},{}",
            optional(stats.average_depth()),
            stats.recursions,
            stats.checks,
            optional(stats.checks_per_solution()),
            stats.solution_count,
            rating
        );
    } else {
        println!("Statistics:");
        println!("  Average depth: {}", optional(stats.average_depth()));
        println!("  Consistency checks: {}", stats.checks);
        println!("  Recursions: {}", stats.recursions);
        println!(
            "  Checks per solution: {}",
            optional(stats.checks_per_solution())
        );
        println!("  Solutions: {}", stats.solution_count);
        println!("  Rating: {rating}");
    }
    Ok(())
}

fn run_count_edges(pieces_path: &Path) -> Result<(), CliError> {
    let pieces = persistence::load_pieces(pieces_path)?;
    println!("{}", count_matching_edges(&pieces));
    Ok(())
}

/// Draws every piece in the requested orientation.
fn run_dump(pieces_path: &Path, orientation: usize) -> Result<(), CliError> {
    let orientation = Orientation::new(orientation)?;
    let mut pieces = persistence::load_pieces(pieces_path)?;
    for piece in &mut pieces {
        piece.set_orientation(orientation);
        println!("{piece}");
    }
    Ok(())
}

fn run_rate(grid_path: &Path, pieces_path: &Path) -> Result<(), CliError> {
    let grid = persistence::load_grid(grid_path)?;
    let pieces = persistence::load_pieces(pieces_path)?;
    let rating = DifficultyRater::new(&grid).rate(&pieces, None, None)?;
    println!("{rating:.6}");
    Ok(())
}
