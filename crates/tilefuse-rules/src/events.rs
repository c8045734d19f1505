//! Events the engine emits while a move or insert is applied.
//!
//! Emission order within one move follows evaluation order: lines by
//! ascending line index, instructions within a line by ascending
//! destination, and each merge's score event immediately before its tile
//! event. Presentation layers drain these to drive animations and the
//! scoreboard; a tile that never moved produces no event.

use crate::engine::state::{Position, Score};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    /// The score total changed (merges during a move, or a reset to zero).
    ScoreChanged { total: Score },
    /// One tile slid from `from` to `to`; with `merged` set it combined
    /// with the tile already at the destination.
    TileMoved {
        from: Position,
        to: Position,
        value: u32,
        merged: bool,
    },
    /// Two equal tiles slid together and combined at `to`.
    TilesMerged {
        first: Position,
        second: Position,
        to: Position,
        value: u32,
    },
    /// A fresh tile appeared at `at`.
    TileInserted { at: Position, value: u32 },
}
