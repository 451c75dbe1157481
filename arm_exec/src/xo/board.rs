//! Tic-tac-toe board and decision engine

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::perception::{PerceptionError, SceneData};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

pub const BOARD_SIZE: usize = 3;

/// Minimum number of integers in a board capture.
pub const CAPTURE_MIN_LEN: usize = 15;

/// Stride between two rows of a board capture.
const CAPTURE_ROW_STRIDE: usize = 5;

const CENTRE: (usize, usize) = (1, 1);

const CORNERS: [(usize, usize); 4] = [(0, 0), (0, 2), (2, 0), (2, 2)];

/// All eight winning lines: three rows, three columns and the two diagonals.
const LINES: [[(usize, usize); 3]; 8] = [
    [(0, 0), (0, 1), (0, 2)],
    [(1, 0), (1, 1), (1, 2)],
    [(2, 0), (2, 1), (2, 2)],
    [(0, 0), (1, 0), (2, 0)],
    [(0, 1), (1, 1), (2, 1)],
    [(0, 2), (1, 2), (2, 2)],
    [(0, 0), (1, 1), (2, 2)],
    [(0, 2), (1, 1), (2, 0)],
];

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A 3x3 board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Board {
    pub cells: [[Mark; BOARD_SIZE]; BOARD_SIZE],
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    Empty,
    X,
    O,
}

/// Reasons a captured board is not a legal opponent move.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("No cell has changed")]
    NoChange,

    #[error("{0} cells have changed")]
    MultipleChanges(usize),

    #[error("The robot's mark at ({0}, {1}) has changed")]
    TouchesRobotMark(usize, usize),

    #[error("Cell ({0}, {1}) was not empty")]
    NotFromEmpty(usize, usize),

    #[error("Cell ({0}, {1}) was not given the opponent's mark")]
    NotOpponentMark(usize, usize),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for Mark {
    fn default() -> Self {
        Mark::Empty
    }
}

impl Mark {
    /// The other player's mark. `Empty` has no opponent.
    pub fn opponent(&self) -> Mark {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
            Mark::Empty => Mark::Empty,
        }
    }

    fn from_capture(value: i32) -> Option<Self> {
        match value {
            0 => Some(Mark::Empty),
            1 => Some(Mark::X),
            2 => Some(Mark::O),
            _ => None,
        }
    }
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a board from a scene capture.
    ///
    /// The capture holds at least [`CAPTURE_MIN_LEN`] integers, row `i` being the three values
    /// starting at index `i * 5 + 1`.
    pub fn from_capture(data: SceneData) -> Result<Self, PerceptionError> {
        let values = data.expect_min_len(CAPTURE_MIN_LEN)?.ints()?;

        let mut board = Board::new();
        for row in 0..BOARD_SIZE {
            for col in 0..BOARD_SIZE {
                let value = values[row * CAPTURE_ROW_STRIDE + 1 + col];
                board.cells[row][col] = Mark::from_capture(value).ok_or_else(|| {
                    PerceptionError::InvalidData(format!(
                        "{} is not a valid mark for cell ({}, {})",
                        value, row, col
                    ))
                })?;
            }
        }

        Ok(board)
    }

    pub fn get(&self, row: usize, col: usize) -> Mark {
        self.cells[row][col]
    }

    pub fn set(&mut self, row: usize, col: usize, mark: Mark) {
        self.cells[row][col] = mark;
    }

    pub fn is_empty_at(&self, row: usize, col: usize) -> bool {
        self.cells[row][col] == Mark::Empty
    }

    /// The player with three in a row, if any.
    pub fn winner(&self) -> Option<Mark> {
        LINES.iter().find_map(|line| {
            let first = self.get(line[0].0, line[0].1);
            if first != Mark::Empty && line.iter().all(|&(r, c)| self.get(r, c) == first) {
                Some(first)
            } else {
                None
            }
        })
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().flatten().all(|m| *m != Mark::Empty)
    }

    /// Empty cells in row-major order.
    pub fn empty_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..BOARD_SIZE)
            .flat_map(|r| (0..BOARD_SIZE).map(move |c| (r, c)))
            .filter(move |&(r, c)| self.is_empty_at(r, c))
    }

    /// First empty cell which would give `mark` three in a row.
    fn winning_cell(&self, mark: Mark) -> Option<(usize, usize)> {
        self.empty_cells().find(|&(r, c)| {
            let mut trial = *self;
            trial.set(r, c, mark);
            trial.winner() == Some(mark)
        })
    }
}

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, row) in self.cells.iter().enumerate() {
            let s: Vec<&str> = row
                .iter()
                .map(|m| match m {
                    Mark::Empty => "_",
                    Mark::X => "X",
                    Mark::O => "O",
                })
                .collect();
            write!(f, "{}", s.join(" "))?;
            if i + 1 < BOARD_SIZE {
                write!(f, " | ")?;
            }
        }
        Ok(())
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Choose the robot's next move.
///
/// Greedy priority order: a winning cell, a cell blocking the opponent's win, the centre, the
/// corners, then the remaining cells in row-major order. This does not look further ahead than
/// one move and can be beaten.
///
/// Returns `None` if the board is full.
pub fn find_best_move(board: &Board, robot: Mark) -> Option<(usize, usize)> {
    if let Some(cell) = board.winning_cell(robot) {
        return Some(cell);
    }

    if let Some(cell) = board.winning_cell(robot.opponent()) {
        return Some(cell);
    }

    if board.is_empty_at(CENTRE.0, CENTRE.1) {
        return Some(CENTRE);
    }

    if let Some(&corner) = CORNERS.iter().find(|&&(r, c)| board.is_empty_at(r, c)) {
        return Some(corner);
    }

    board.empty_cells().next()
}

/// Check that `new` differs from `last` by exactly one legal move of `opponent`, returning the
/// cell played.
pub fn validate_opponent_move(
    last: &Board,
    new: &Board,
    opponent: Mark,
) -> Result<(usize, usize), MoveError> {
    let robot = opponent.opponent();

    let changes: Vec<(usize, usize)> = (0..BOARD_SIZE)
        .flat_map(|r| (0..BOARD_SIZE).map(move |c| (r, c)))
        .filter(|&(r, c)| last.get(r, c) != new.get(r, c))
        .collect();

    let (r, c) = match changes.len() {
        0 => return Err(MoveError::NoChange),
        1 => changes[0],
        n => return Err(MoveError::MultipleChanges(n)),
    };

    if last.get(r, c) == robot || new.get(r, c) == robot {
        return Err(MoveError::TouchesRobotMark(r, c));
    }
    if last.get(r, c) != Mark::Empty {
        return Err(MoveError::NotFromEmpty(r, c));
    }
    if new.get(r, c) != opponent {
        return Err(MoveError::NotOpponentMark(r, c));
    }

    Ok((r, c))
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    use super::Mark::{Empty as E, O, X};

    fn board(cells: [[Mark; 3]; 3]) -> Board {
        Board { cells }
    }

    #[test]
    fn test_best_move_wins() {
        let b = board([[X, O, X], [O, X, O], [E, E, E]]);
        let (r, c) = find_best_move(&b, X).unwrap();

        let mut after = b;
        after.set(r, c, X);
        assert_eq!(after.winner(), Some(X));
    }

    #[test]
    fn test_best_move_blocks() {
        let b = board([[O, O, E], [E, X, E], [E, E, E]]);
        assert_eq!(find_best_move(&b, X), Some((0, 2)));
    }

    #[test]
    fn test_best_move_priority() {
        // Empty board: centre
        assert_eq!(find_best_move(&Board::new(), X), Some((1, 1)));

        // Centre taken: first free corner
        let b = board([[O, E, E], [E, X, E], [E, E, E]]);
        assert_eq!(find_best_move(&b, X), Some((0, 2)));

        // Only sides left
        let b = board([[X, E, O], [O, O, X], [X, E, O]]);
        assert_eq!(find_best_move(&b, X), Some((0, 1)));

        let b = board([[X, O, X], [X, O, O], [O, X, X]]);
        assert_eq!(find_best_move(&b, X), None);
    }

    #[test]
    fn test_winner() {
        assert_eq!(board([[O, O, O], [E; 3], [E; 3]]).winner(), Some(O));
        assert_eq!(board([[X, E, E], [X, E, E], [X, E, E]]).winner(), Some(X));
        assert_eq!(board([[E, E, O], [E, O, E], [O, E, E]]).winner(), Some(O));
        assert_eq!(board([[X, O, X], [X, O, O], [O, X, X]]).winner(), None);
        assert!(board([[X, O, X], [X, O, O], [O, X, X]]).is_full());
        assert!(!Board::new().is_full());
    }

    #[test]
    fn test_validate_opponent_move() {
        let last = board([[E, E, E], [E, X, E], [E, E, E]]);

        let legal = board([[O, E, E], [E, X, E], [E, E, E]]);
        assert_eq!(validate_opponent_move(&last, &legal, O), Ok((0, 0)));

        assert_eq!(
            validate_opponent_move(&last, &last, O),
            Err(MoveError::NoChange)
        );

        // Any two changes are rejected, whatever they are
        for second in [O, X].iter() {
            let two = board([[O, E, E], [E, X, E], [E, E, *second]]);
            assert_eq!(
                validate_opponent_move(&last, &two, O),
                Err(MoveError::MultipleChanges(2))
            );
        }

        let robot_removed = board([[E, E, E], [E, E, E], [E, E, E]]);
        assert_eq!(
            validate_opponent_move(&last, &robot_removed, O),
            Err(MoveError::TouchesRobotMark(1, 1))
        );

        let robot_placed = board([[X, E, E], [E, X, E], [E, E, E]]);
        assert_eq!(
            validate_opponent_move(&last, &robot_placed, O),
            Err(MoveError::TouchesRobotMark(0, 0))
        );

        let moved = board([[O, E, E], [E, X, E], [E, E, E]]);
        let removed = board([[E, E, E], [E, X, E], [E, E, E]]);
        assert_eq!(
            validate_opponent_move(&moved, &removed, O),
            Err(MoveError::NotFromEmpty(0, 0))
        );
    }

    #[test]
    fn test_from_capture() {
        let data = SceneData::parse("9,0,0,2,9,9,0,1,0,9,9,0,0,0,9");
        let b = Board::from_capture(data).unwrap();
        assert_eq!(b, board([[E, E, O], [E, X, E], [E, E, E]]));

        assert!(Board::from_capture(SceneData::parse("0,0,0")).is_err());
        assert!(Board::from_capture(SceneData::parse("9,0,0,3,9,9,0,1,0,9,9,0,0,0,9")).is_err());
        assert!(Board::from_capture(SceneData::parse("9,0,0,a,9,9,0,1,0,9,9,0,0,0,9")).is_err());
    }
}
