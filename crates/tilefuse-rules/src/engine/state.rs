use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Board coordinate as `(row, col)`.
pub type Position = (usize, usize);
/// Running total of merge points.
pub type Score = u64;

/// One board cell: empty, or a tile carrying its face value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Empty,
    Tile(u32),
}

impl Slot {
    #[inline]
    pub fn is_empty(self) -> bool {
        matches!(self, Slot::Empty)
    }

    /// The tile value, or `None` for an empty slot.
    #[inline]
    pub fn value(self) -> Option<u32> {
        match self {
            Slot::Empty => None,
            Slot::Tile(v) => Some(v),
        }
    }
}

/// A direction to move/merge tiles.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Value policy for freshly spawned tiles.
///
/// `four_chance` is the probability of spawning a 4 instead of a 2. The
/// default matches the classic rule of one four per ten spawns.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct SpawnPolicy {
    #[serde(default = "SpawnPolicy::default_four_chance")]
    pub four_chance: f64,
}

impl SpawnPolicy {
    fn default_four_chance() -> f64 {
        0.1
    }

    /// Pick a value for a new tile using the provided RNG.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        if rng.gen_bool(self.four_chance) {
            4
        } else {
            2
        }
    }
}

impl Default for SpawnPolicy {
    fn default() -> Self {
        SpawnPolicy {
            four_chance: Self::default_four_chance(),
        }
    }
}

/// Square grid of slots, `dimension * dimension`, row-major.
///
/// Coordinates are checked against `dimension` on every access; an
/// out-of-range row or column is a caller bug and panics. Callers that
/// iterate lines are expected to go through
/// [`line_coordinates`](super::line_coordinates), which only yields
/// in-range positions.
///
/// ```
/// use tilefuse_rules::engine::{Board, Slot};
///
/// let mut board = Board::new(4);
/// board.set(1, 2, Slot::Tile(8));
/// assert_eq!(board.get(1, 2), Slot::Tile(8));
/// assert_eq!(board.empty_positions().len(), 15);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    dimension: usize,
    slots: Vec<Slot>,
}

impl Board {
    /// Construct an empty board. `dimension` must be at least 2.
    pub fn new(dimension: usize) -> Self {
        assert!(
            dimension >= 2,
            "board dimension must be at least 2, got {dimension}"
        );
        Board {
            dimension,
            slots: vec![Slot::Empty; dimension * dimension],
        }
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Slot {
        self.slots[self.index(row, col)]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, slot: Slot) {
        let idx = self.index(row, col);
        self.slots[idx] = slot;
    }

    /// Overwrite every slot with `slot`.
    pub fn set_all(&mut self, slot: Slot) {
        self.slots.fill(slot);
    }

    /// All currently empty positions, row-major.
    pub fn empty_positions(&self) -> Vec<Position> {
        let mut open = Vec::new();
        for row in 0..self.dimension {
            for col in 0..self.dimension {
                if self.get(row, col).is_empty() {
                    open.push((row, col));
                }
            }
        }
        open
    }

    pub fn is_full(&self) -> bool {
        self.slots.iter().all(|slot| !slot.is_empty())
    }

    /// The highest tile value on the board, or 0 when no tiles are placed.
    pub fn highest_tile(&self) -> u32 {
        self.slots
            .iter()
            .filter_map(|slot| slot.value())
            .max()
            .unwrap_or(0)
    }

    #[inline]
    fn index(&self, row: usize, col: usize) -> usize {
        assert!(
            row < self.dimension && col < self.dimension,
            "coordinates ({row}, {col}) out of range for dimension {}",
            self.dimension
        );
        row * self.dimension + col
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "-".repeat(self.dimension * 8);
        for row in 0..self.dimension {
            if row > 0 {
                writeln!(f, "{rule}")?;
            }
            let cells: Vec<String> = (0..self.dimension)
                .map(|col| format_cell(self.get(row, col)))
                .collect();
            writeln!(f, "{}", cells.join("|"))?;
        }
        Ok(())
    }
}

fn format_cell(slot: Slot) -> String {
    match slot.value() {
        None => String::from("       "),
        Some(v) => {
            let mut x = v.to_string();
            while x.len() < 7 {
                match x.len() {
                    6 => x = format!(" {}", x),
                    _ => x = format!(" {} ", x),
                }
            }
            x
        }
    }
}
