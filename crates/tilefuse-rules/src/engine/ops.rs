use log::debug;
use rand::Rng;

use super::reduce::{reduce, Instruction};
use super::state::{Board, Direction, Position, Score, Slot, SpawnPolicy};
use crate::events::GameEvent;

/// Board coordinates of one line, ordered from the far edge toward the
/// direction of travel, so index 0 is the cell tiles move into.
///
/// ```
/// use tilefuse_rules::engine::{line_coordinates, Direction};
///
/// assert_eq!(
///     line_coordinates(Direction::Down, 1, 4),
///     vec![(3, 1), (2, 1), (1, 1), (0, 1)]
/// );
/// ```
pub fn line_coordinates(direction: Direction, line_index: usize, dimension: usize) -> Vec<Position> {
    (0..dimension)
        .map(|i| match direction {
            Direction::Up => (i, line_index),
            Direction::Down => (dimension - 1 - i, line_index),
            Direction::Left => (line_index, i),
            Direction::Right => (line_index, dimension - 1 - i),
        })
        .collect()
}

/// What one directional move did to the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    /// True iff at least one line produced at least one instruction.
    pub changed: bool,
    /// Points earned from merges in this move.
    pub score_delta: Score,
    /// Everything that happened, in evaluation order.
    pub events: Vec<GameEvent>,
}

/// Game state: the board, the running score, and the winning threshold.
///
/// All board mutation goes through [`Game::evaluate_move`] and the insert
/// methods; score only ever grows, by the merged tile's value.
#[derive(Debug, Clone)]
pub struct Game {
    board: Board,
    score: Score,
    threshold: u32,
}

impl Game {
    pub fn new(dimension: usize, threshold: u32) -> Self {
        Game {
            board: Board::new(dimension),
            score: 0,
            threshold,
        }
    }

    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[inline]
    pub fn score(&self) -> Score {
        self.score
    }

    #[inline]
    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Clear the board and zero the score for a fresh game.
    pub fn reset(&mut self) {
        self.board.set_all(Slot::Empty);
        self.score = 0;
    }

    /// Evaluate one directional move: reduce every line, apply the
    /// resulting instructions to the board, and accumulate score.
    ///
    /// Lines never interact within one move; each of the `dimension`
    /// lines is reduced independently and applied before the next line
    /// is read.
    pub fn evaluate_move(&mut self, direction: Direction) -> MoveOutcome {
        let dimension = self.board.dimension();
        let mut changed = false;
        let mut score_delta = 0;
        let mut events = Vec::new();

        for line_index in 0..dimension {
            let coords = line_coordinates(direction, line_index, dimension);
            let line: Vec<Slot> = coords
                .iter()
                .map(|&(row, col)| self.board.get(row, col))
                .collect();
            let instructions = reduce(&line);
            changed |= !instructions.is_empty();

            for instruction in instructions {
                match instruction {
                    Instruction::SingleMove {
                        source,
                        destination,
                        value,
                        merged,
                    } => {
                        let from = coords[source];
                        let to = coords[destination];
                        if merged {
                            self.credit(value, &mut score_delta, &mut events);
                        }
                        self.board.set(from.0, from.1, Slot::Empty);
                        self.board.set(to.0, to.1, Slot::Tile(value));
                        events.push(GameEvent::TileMoved {
                            from,
                            to,
                            value,
                            merged,
                        });
                    }
                    Instruction::DoubleMove {
                        first_source,
                        second_source,
                        destination,
                        value,
                    } => {
                        let first = coords[first_source];
                        let second = coords[second_source];
                        let to = coords[destination];
                        self.credit(value, &mut score_delta, &mut events);
                        self.board.set(first.0, first.1, Slot::Empty);
                        self.board.set(second.0, second.1, Slot::Empty);
                        self.board.set(to.0, to.1, Slot::Tile(value));
                        events.push(GameEvent::TilesMerged {
                            first,
                            second,
                            to,
                            value,
                        });
                    }
                }
            }
        }

        MoveOutcome {
            changed,
            score_delta,
            events,
        }
    }

    fn credit(&mut self, value: u32, score_delta: &mut Score, events: &mut Vec<GameEvent>) {
        self.score += Score::from(value);
        *score_delta += Score::from(value);
        events.push(GameEvent::ScoreChanged { total: self.score });
    }

    /// Place a tile at `position` if that slot is empty.
    ///
    /// Returns the insert event, or `None` when the slot was occupied
    /// (an expected no-op, not an error).
    pub fn insert_tile(&mut self, position: Position, value: u32) -> Option<GameEvent> {
        let (row, col) = position;
        if !self.board.get(row, col).is_empty() {
            debug!("insert at ({row}, {col}) ignored, slot occupied");
            return None;
        }
        self.board.set(row, col, Slot::Tile(value));
        Some(GameEvent::TileInserted {
            at: position,
            value,
        })
    }

    /// Place a policy-valued tile at a uniformly random empty position.
    ///
    /// No-op returning `None` when the board is full.
    pub fn insert_tile_at_random_empty<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        policy: SpawnPolicy,
    ) -> Option<GameEvent> {
        let open = self.board.empty_positions();
        if open.is_empty() {
            debug!("board is full, dropping random insert");
            return None;
        }
        let position = open[rng.gen_range(0..open.len())];
        let value = policy.pick(rng);
        self.insert_tile(position, value)
    }

    /// First position (row-major) holding a tile at or above the winning
    /// threshold, if any.
    pub fn has_won(&self) -> Option<Position> {
        let dimension = self.board.dimension();
        for row in 0..dimension {
            for col in 0..dimension {
                if let Slot::Tile(value) = self.board.get(row, col) {
                    if value >= self.threshold {
                        return Some((row, col));
                    }
                }
            }
        }
        None
    }

    /// True when the board is full and no adjacent pair can merge.
    ///
    /// Checking below and to the right of every tile is sufficient since
    /// adjacency is symmetric. Fullness is re-checked here rather than
    /// trusted from the caller.
    pub fn has_lost(&self) -> bool {
        if !self.board.is_full() {
            return false;
        }
        let dimension = self.board.dimension();
        for row in 0..dimension {
            for col in 0..dimension {
                match self.board.get(row, col) {
                    Slot::Empty => {
                        unreachable!("full board scan found an empty slot at ({row}, {col})")
                    }
                    Slot::Tile(value) => {
                        if self.neighbor_below_matches(row, col, value)
                            || self.neighbor_right_matches(row, col, value)
                        {
                            return false;
                        }
                    }
                }
            }
        }
        true
    }

    fn neighbor_below_matches(&self, row: usize, col: usize, value: u32) -> bool {
        row + 1 < self.board.dimension() && self.board.get(row + 1, col) == Slot::Tile(value)
    }

    fn neighbor_right_matches(&self, row: usize, col: usize, value: u32) -> bool {
        col + 1 < self.board.dimension() && self.board.get(row, col + 1) == Slot::Tile(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn board_values(game: &Game) -> Vec<u32> {
        let dimension = game.board().dimension();
        let mut out = Vec::with_capacity(dimension * dimension);
        for row in 0..dimension {
            for col in 0..dimension {
                out.push(game.board().get(row, col).value().unwrap_or(0));
            }
        }
        out
    }

    fn place(game: &mut Game, cells: &[(usize, usize, u32)]) {
        for &(row, col, value) in cells {
            let _ = game.insert_tile((row, col), value);
        }
    }

    #[test]
    fn line_coordinates_match_travel_order() {
        assert_eq!(
            line_coordinates(Direction::Up, 2, 4),
            vec![(0, 2), (1, 2), (2, 2), (3, 2)]
        );
        assert_eq!(
            line_coordinates(Direction::Down, 0, 3),
            vec![(2, 0), (1, 0), (0, 0)]
        );
        assert_eq!(
            line_coordinates(Direction::Left, 1, 3),
            vec![(1, 0), (1, 1), (1, 2)]
        );
        assert_eq!(
            line_coordinates(Direction::Right, 3, 4),
            vec![(3, 3), (3, 2), (3, 1), (3, 0)]
        );
    }

    #[test]
    fn left_move_merges_across_a_gap() {
        let mut game = Game::new(4, 2048);
        place(&mut game, &[(0, 0, 2), (0, 2, 2)]);
        let outcome = game.evaluate_move(Direction::Left);
        assert!(outcome.changed);
        assert_eq!(outcome.score_delta, 4);
        assert_eq!(game.score(), 4);
        assert_eq!(game.board().get(0, 0), Slot::Tile(4));
        assert_eq!(game.board().get(0, 2), Slot::Empty);
        assert_eq!(
            outcome.events,
            vec![
                GameEvent::ScoreChanged { total: 4 },
                GameEvent::TileMoved {
                    from: (0, 2),
                    to: (0, 0),
                    value: 4,
                    merged: true
                },
            ]
        );
    }

    #[test]
    fn merge_then_slide_in_one_row() {
        let mut game = Game::new(4, 2048);
        place(&mut game, &[(1, 0, 2), (1, 1, 2), (1, 2, 4)]);
        let outcome = game.evaluate_move(Direction::Left);
        assert!(outcome.changed);
        assert_eq!(outcome.score_delta, 4);
        assert_eq!(game.board().get(1, 0), Slot::Tile(4));
        assert_eq!(game.board().get(1, 1), Slot::Tile(4));
        assert_eq!(game.board().get(1, 2), Slot::Empty);
    }

    #[test]
    fn right_move_mirrors_left() {
        let mut game = Game::new(4, 2048);
        place(&mut game, &[(0, 2, 2), (0, 3, 2)]);
        let outcome = game.evaluate_move(Direction::Right);
        assert!(outcome.changed);
        assert_eq!(game.board().get(0, 3), Slot::Tile(4));
        assert_eq!(game.board().get(0, 2), Slot::Empty);
    }

    #[test]
    fn up_and_down_work_on_columns() {
        let mut game = Game::new(4, 2048);
        place(&mut game, &[(0, 1, 2), (3, 1, 2)]);
        let outcome = game.evaluate_move(Direction::Down);
        assert!(outcome.changed);
        assert_eq!(game.board().get(3, 1), Slot::Tile(4));
        assert_eq!(game.board().get(0, 1), Slot::Empty);

        let mut game = Game::new(4, 2048);
        place(&mut game, &[(2, 0, 4), (3, 0, 4)]);
        game.evaluate_move(Direction::Up);
        assert_eq!(game.board().get(0, 0), Slot::Tile(8));
    }

    #[test]
    fn lines_reduce_independently() {
        let mut game = Game::new(4, 2048);
        place(&mut game, &[(0, 0, 2), (0, 1, 2), (1, 0, 4), (1, 3, 4)]);
        let outcome = game.evaluate_move(Direction::Left);
        assert_eq!(outcome.score_delta, 4 + 8);
        assert_eq!(
            board_values(&game),
            vec![4, 0, 0, 0, 8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn events_follow_line_then_destination_order() {
        let mut game = Game::new(4, 2048);
        place(&mut game, &[(0, 3, 2), (2, 1, 4), (2, 2, 4)]);
        let outcome = game.evaluate_move(Direction::Left);
        assert_eq!(
            outcome.events,
            vec![
                GameEvent::TileMoved {
                    from: (0, 3),
                    to: (0, 0),
                    value: 2,
                    merged: false
                },
                GameEvent::ScoreChanged { total: 8 },
                GameEvent::TilesMerged {
                    first: (2, 1),
                    second: (2, 2),
                    to: (2, 0),
                    value: 8
                },
            ]
        );
    }

    #[test]
    fn unchanged_move_reports_no_events() {
        let mut game = Game::new(4, 2048);
        place(&mut game, &[(0, 0, 2), (1, 0, 4)]);
        let outcome = game.evaluate_move(Direction::Left);
        assert!(!outcome.changed);
        assert_eq!(outcome.score_delta, 0);
        assert!(outcome.events.is_empty());
        assert_eq!(game.score(), 0);
    }

    #[test]
    fn score_accumulates_across_moves() {
        let mut game = Game::new(4, 2048);
        place(&mut game, &[(0, 0, 2), (0, 1, 2), (0, 2, 4)]);
        game.evaluate_move(Direction::Left);
        assert_eq!(game.score(), 4);
        game.evaluate_move(Direction::Left);
        assert_eq!(game.score(), 4 + 8);
        assert_eq!(game.board().get(0, 0), Slot::Tile(8));
    }

    #[test]
    fn insert_into_occupied_slot_is_ignored() {
        let mut game = Game::new(4, 2048);
        assert_eq!(
            game.insert_tile((2, 2), 2),
            Some(GameEvent::TileInserted {
                at: (2, 2),
                value: 2
            })
        );
        assert_eq!(game.insert_tile((2, 2), 4), None);
        assert_eq!(game.board().get(2, 2), Slot::Tile(2));
    }

    #[test]
    fn random_insert_fills_the_board_exactly_once_per_cell() {
        let mut game = Game::new(3, 2048);
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..9 {
            assert!(game
                .insert_tile_at_random_empty(&mut rng, SpawnPolicy::default())
                .is_some());
        }
        assert!(game.board().is_full());
        assert_eq!(
            game.insert_tile_at_random_empty(&mut rng, SpawnPolicy::default()),
            None
        );
    }

    #[test]
    fn win_is_first_threshold_tile_in_row_major_order() {
        let mut game = Game::new(4, 2048);
        assert_eq!(game.has_won(), None);
        place(&mut game, &[(3, 3, 2048), (1, 2, 4096)]);
        assert_eq!(game.has_won(), Some((1, 2)));
    }

    #[test]
    fn win_ignores_fullness() {
        // One empty cell left; the threshold tile still wins.
        let mut game = Game::new(2, 32);
        place(&mut game, &[(0, 0, 32), (0, 1, 2), (1, 0, 4)]);
        assert_eq!(game.has_won(), Some((0, 0)));
        assert!(!game.has_lost());
    }

    #[test]
    fn loss_requires_a_full_board() {
        let mut game = Game::new(2, 2048);
        place(&mut game, &[(0, 0, 2), (0, 1, 4), (1, 0, 4)]);
        assert!(!game.has_lost());
    }

    #[test]
    fn full_board_without_equal_neighbors_is_lost() {
        // Strictly alternating values: no pair below or to the right.
        let mut game = Game::new(4, 2048);
        for row in 0..4 {
            for col in 0..4 {
                let value = if (row + col) % 2 == 0 { 2 } else { 4 };
                let _ = game.insert_tile((row, col), value);
            }
        }
        assert!(game.has_lost());
    }

    #[test]
    fn full_board_with_a_mergeable_pair_is_not_lost() {
        let mut game = Game::new(2, 2048);
        place(&mut game, &[(0, 0, 2), (0, 1, 2), (1, 0, 4), (1, 1, 8)]);
        assert!(!game.has_lost());
    }

    #[test]
    fn reset_clears_board_and_score() {
        let mut game = Game::new(4, 2048);
        place(&mut game, &[(0, 0, 2), (0, 1, 2)]);
        game.evaluate_move(Direction::Left);
        assert!(game.score() > 0);
        game.reset();
        assert_eq!(game.score(), 0);
        assert_eq!(game.board().empty_positions().len(), 16);
    }
}
