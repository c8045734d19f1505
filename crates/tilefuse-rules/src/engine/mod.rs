//! Engine module: slot-grid board, per-line reduction, and game ops.
//!
//! - `Board` is the dimension-generic slot grid with bounds-checked access.
//! - `reduce` turns one line of slots (in travel order) into move/merge
//!   instructions; this is the algorithmic heart.
//! - `Game` applies reductions per direction, tracks score, and answers
//!   the win/loss questions.

pub mod ops;
mod reduce;
pub mod state;

pub use ops::{line_coordinates, Game, MoveOutcome};
pub use reduce::{reduce, Instruction};
pub use state::{Board, Direction, Position, Score, Slot, SpawnPolicy};
