//! Per-line reduction: turn one row or column of slots, read in travel
//! order, into an ordered list of move/merge instructions.
//!
//! The reduction runs as three pure phases over tagged tokens:
//!
//! 1. `condense` removes the gaps between tiles, tagging each tile as
//!    either already tight against the front or forced to slide.
//! 2. `collapse` pairs up equal-valued neighbors, consuming each tile at
//!    most once (no chain merges within a single move).
//! 3. `convert` assigns destinations by output index and drops tiles that
//!    never moved.
//!
//! Index 0 of a line is always the cell tiles travel into; all indices
//! here are line-local, and the move engine maps them back to board
//! coordinates.

use super::state::Slot;

/// Intermediate verdict for one tile while a line is being reduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActionToken {
    /// Tile has not needed to move so far.
    NoAction { source: usize, value: u32 },
    /// Tile slides forward from `source`.
    Move { source: usize, value: u32 },
    /// A moving tile lands on a stationary equal tile; `source` is the
    /// moving tile's slot, which drives the slide-then-merge animation.
    SingleCombine { source: usize, value: u32 },
    /// Two moving equal tiles meet and combine.
    DoubleCombine { source: usize, second: usize, value: u32 },
}

impl ActionToken {
    fn value(self) -> u32 {
        match self {
            ActionToken::NoAction { value, .. }
            | ActionToken::Move { value, .. }
            | ActionToken::SingleCombine { value, .. }
            | ActionToken::DoubleCombine { value, .. } => value,
        }
    }

    fn source(self) -> usize {
        match self {
            ActionToken::NoAction { source, .. }
            | ActionToken::Move { source, .. }
            | ActionToken::SingleCombine { source, .. }
            | ActionToken::DoubleCombine { source, .. } => source,
        }
    }
}

/// One concrete board mutation produced by reducing a line.
///
/// Indices are positions within the line, not board coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// One tile slides; with `merged` set it combines with the tile
    /// already sitting on its destination path.
    SingleMove {
        source: usize,
        destination: usize,
        value: u32,
        merged: bool,
    },
    /// Two equal tiles slide together and combine into one doubled tile.
    DoubleMove {
        first_source: usize,
        second_source: usize,
        destination: usize,
        value: u32,
    },
}

/// Reduce one line of slots (travel order) to its instruction list.
///
/// Deterministic: the same input always yields the same instructions. An
/// already-settled line (no gaps, no equal neighbors) yields none.
///
/// ```
/// use tilefuse_rules::engine::{reduce, Instruction, Slot};
///
/// let line = [Slot::Tile(2), Slot::Empty, Slot::Tile(2), Slot::Empty];
/// assert_eq!(
///     reduce(&line),
///     vec![Instruction::SingleMove { source: 2, destination: 0, value: 4, merged: true }]
/// );
/// ```
pub fn reduce(line: &[Slot]) -> Vec<Instruction> {
    convert(&collapse(&condense(line)))
}

/// Phase 1: drop empties, tagging tiles in place vs. forced to slide.
///
/// A tile at line index `idx` is still in place exactly when every earlier
/// slot held a tile too, i.e. the output so far has `idx` entries.
fn condense(line: &[Slot]) -> Vec<ActionToken> {
    let mut tokens = Vec::with_capacity(line.len());
    for (idx, slot) in line.iter().enumerate() {
        if let Slot::Tile(value) = *slot {
            if tokens.len() == idx {
                tokens.push(ActionToken::NoAction { source: idx, value });
            } else {
                tokens.push(ActionToken::Move { source: idx, value });
            }
        }
    }
    tokens
}

/// A tile is quiescent while it has needed no position shift and no merge:
/// its input position matches both the output length and its original slot.
/// The distinction picks the merge animation: a quiescent tile absorbs its
/// neighbor in place, a moved tile slides before combining.
fn still_quiescent(input_position: usize, output_len: usize, original_source: usize) -> bool {
    input_position == output_len && original_source == input_position
}

/// Phase 2: pair equal-valued neighbors, consuming each tile at most once.
fn collapse(tokens: &[ActionToken]) -> Vec<ActionToken> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut skip_next = false;
    for (idx, &token) in tokens.iter().enumerate() {
        if skip_next {
            // Consumed by the previous token's merge.
            skip_next = false;
            continue;
        }
        let next = tokens.get(idx + 1).copied();
        let next_value = next.map(ActionToken::value);
        match token {
            ActionToken::SingleCombine { .. } | ActionToken::DoubleCombine { .. } => {
                unreachable!("combine tokens cannot appear in collapse input")
            }
            ActionToken::NoAction { source, value }
                if next_value == Some(value) && still_quiescent(idx, out.len(), source) =>
            {
                // Stationary tile absorbs the moving one behind it.
                let next = next.expect("lookahead checked by guard");
                skip_next = true;
                out.push(ActionToken::SingleCombine {
                    source: next.source(),
                    value: value + next.value(),
                });
            }
            _ if next_value == Some(token.value()) => {
                // Both participants are in motion.
                let next = next.expect("lookahead checked by guard");
                skip_next = true;
                out.push(ActionToken::DoubleCombine {
                    source: token.source(),
                    second: next.source(),
                    value: token.value() + next.value(),
                });
            }
            ActionToken::NoAction { source, value }
                if !still_quiescent(idx, out.len(), source) =>
            {
                // Merges ahead of this tile shifted the output, so it
                // moves after all.
                out.push(ActionToken::Move { source, value });
            }
            ActionToken::NoAction { .. } | ActionToken::Move { .. } => out.push(token),
        }
    }
    out
}

/// Phase 3: destinations are output indices; tiles that never moved need
/// no instruction.
fn convert(tokens: &[ActionToken]) -> Vec<Instruction> {
    let mut instructions = Vec::with_capacity(tokens.len());
    for (idx, &token) in tokens.iter().enumerate() {
        match token {
            ActionToken::Move { source, value } => instructions.push(Instruction::SingleMove {
                source,
                destination: idx,
                value,
                merged: false,
            }),
            ActionToken::SingleCombine { source, value } => {
                instructions.push(Instruction::SingleMove {
                    source,
                    destination: idx,
                    value,
                    merged: true,
                })
            }
            ActionToken::DoubleCombine {
                source,
                second,
                value,
            } => instructions.push(Instruction::DoubleMove {
                first_source: source,
                second_source: second,
                destination: idx,
                value,
            }),
            ActionToken::NoAction { .. } => {}
        }
    }
    instructions
}
