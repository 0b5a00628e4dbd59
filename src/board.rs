use std::{
    fmt::{Display, Write},
    hash::{Hash, Hasher},
    ops::Index,
};

use itertools::Itertools;
use rand::{seq::SliceRandom, Rng};
use smallvec::SmallVec;
use thiserror::Error;

use crate::direction::Direction;

/// Cell value of the blank.
pub const EMPTY: u8 = 0;

/// Largest supported board dimension; the biggest tile must fit in a `u8`.
pub const MAX_SIZE: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("board has no cells")]
    Empty,
    #[error("board size {0} exceeds the supported maximum of {max}", max = MAX_SIZE)]
    TooLarge(usize),
    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("expected {expected} cells, found {found}")]
    WrongLength { expected: usize, found: usize },
    #[error("cannot parse cell `{0}`")]
    InvalidCell(String),
    #[error("tile {value} is out of range 1..={max}")]
    OutOfRange { value: u8, max: usize },
    #[error("tile {0} appears more than once")]
    Duplicate(u8),
    #[error("board has more than one empty cell")]
    MultipleEmpty,
}

/// An immutable N×N board configuration.
///
/// Cells are stored row-major. Two states are equal exactly when their
/// cell sequences are equal; the cached blank position takes no part in
/// equality or hashing.
#[derive(Debug, Clone)]
pub struct State {
    size: usize,
    cells: Vec<u8>,
    blank: usize,
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.cells == other.cells
    }
}

impl Eq for State {}

impl Hash for State {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.cells.hash(state);
    }
}

fn check_size(size: usize) -> Result<(), BoardError> {
    match size {
        0 => Err(BoardError::Empty),
        s if s > MAX_SIZE => Err(BoardError::TooLarge(s)),
        _ => Ok(()),
    }
}

impl State {
    /// Builds a state from rows, checking that the board is square and
    /// holds every value in `{EMPTY} ∪ 1..size²` exactly once.
    pub fn from_rows(rows: Vec<Vec<u8>>) -> Result<State, BoardError> {
        let size = rows.len();
        check_size(size)?;

        for (row, cells) in rows.iter().enumerate() {
            if cells.len() != size {
                return Err(BoardError::RaggedRow {
                    row,
                    expected: size,
                    found: cells.len(),
                });
            }
        }

        State::from_cells(size, rows.into_iter().flatten().collect())
    }

    /// Builds a state from a row-major cell sequence.
    pub fn from_cells(size: usize, cells: Vec<u8>) -> Result<State, BoardError> {
        check_size(size)?;

        let expected = size * size;
        if cells.len() != expected {
            return Err(BoardError::WrongLength {
                expected,
                found: cells.len(),
            });
        }

        let mut seen = [false; MAX_SIZE * MAX_SIZE];
        for &c in &cells {
            if c as usize >= expected {
                return Err(BoardError::OutOfRange {
                    value: c,
                    max: expected - 1,
                });
            }

            let slot = &mut seen[c as usize];
            if *slot {
                return Err(if c == EMPTY {
                    BoardError::MultipleEmpty
                } else {
                    BoardError::Duplicate(c)
                });
            }
            *slot = true;
        }

        // every value in range appears once, so the blank is present
        let blank = cells.iter().position(|&c| c == EMPTY).unwrap_or_default();

        Ok(State { size, cells, blank })
    }

    /// The solved board: blank first, then `1, 2, ..., size²-1`.
    pub fn goal(size: usize) -> Result<State, BoardError> {
        check_size(size)?;
        Ok(State {
            size,
            cells: (0..size * size).map(|v| v as u8).collect(),
            blank: 0,
        })
    }

    /// Shuffles the full value set until the result is solvable.
    pub fn random<R: Rng + ?Sized>(size: usize, rng: &mut R) -> Result<State, BoardError> {
        let mut state = State::goal(size)?;

        loop {
            state.cells.shuffle(rng);
            state.blank = state
                .cells
                .iter()
                .position(|&c| c == EMPTY)
                .unwrap_or_default();

            if state.is_solvable() {
                return Ok(state);
            }
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Row-major cells, `EMPTY` for the blank.
    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.cells.chunks(self.size)
    }

    /// `(column, row)` of the blank.
    pub fn find_empty(&self) -> (usize, usize) {
        (self.blank % self.size, self.blank / self.size)
    }

    /// Slides the tile found at the blank's neighbour in `direction` into
    /// the blank, or `None` when that neighbour lies off the board.
    pub fn make_move(&self, direction: Direction) -> Option<State> {
        let (x, y) = self.find_empty();
        let (dx, dy) = direction.delta();

        let nx = x.checked_add_signed(dx).filter(|&nx| nx < self.size)?;
        let ny = y.checked_add_signed(dy).filter(|&ny| ny < self.size)?;

        let target = ny * self.size + nx;
        let mut cells = self.cells.clone();
        cells.swap(self.blank, target);

        Some(State {
            size: self.size,
            cells,
            blank: target,
        })
    }

    /// Every legal neighbour, in `Direction::ALL` order.
    pub fn successors(&self) -> SmallVec<[(Direction, State); 4]> {
        Direction::ALL
            .into_iter()
            .filter_map(|d| self.make_move(d).map(|s| (d, s)))
            .collect()
    }

    /// Pairs of tiles that appear out of order in a row-major scan.
    pub fn inversions(&self) -> usize {
        self.cells
            .iter()
            .filter(|&&c| c != EMPTY)
            .tuple_combinations()
            .filter(|(a, b)| a > b)
            .count()
    }

    // Parity class of the board. Odd sizes: inversion parity. Even sizes:
    // parity of inversions plus the blank's row counted from the bottom.
    // Both quantities are preserved by every legal move.
    fn parity(&self, inversions: usize, blank_row: usize) -> usize {
        if self.size % 2 == 1 {
            inversions % 2
        } else {
            (inversions + (self.size - 1 - blank_row)) % 2
        }
    }

    /// Whether the goal is reachable from this board.
    pub fn is_solvable(&self) -> bool {
        let (_, row) = self.find_empty();
        // the goal has no inversions and its blank in row 0
        self.parity(self.inversions(), row) == self.parity(0, 0)
    }

    pub fn is_finished(&self) -> bool {
        self.cells.iter().enumerate().all(|(i, &c)| c as usize == i)
    }

    /// Number of tiles not on their goal cell; the blank is not counted.
    pub fn hamming_cost(&self) -> u32 {
        self.cells
            .iter()
            .enumerate()
            .filter(|&(i, &c)| c != EMPTY && c as usize != i)
            .count() as u32
    }

    /// Sum of grid distances from each tile to its goal cell; the goal
    /// index of a tile is its own value.
    pub fn manhattan_cost(&self) -> u32 {
        self.cells
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c != EMPTY)
            .map(|(i, &c)| {
                let goal = c as usize;
                let (row, col) = (i / self.size, i % self.size);
                let (goal_row, goal_col) = (goal / self.size, goal % self.size);
                (row.abs_diff(goal_row) + col.abs_diff(goal_col)) as u32
            })
            .sum()
    }
}

impl Index<(usize, usize)> for State {
    type Output = u8;

    /// Cell at `(row, column)`.
    fn index(&self, index: (usize, usize)) -> &Self::Output {
        &self.cells[index.0 * self.size + index.1]
    }
}

impl Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let width = (self.cells.len() - 1).to_string().len();
        let mut first = true;
        for row in self.rows() {
            if !first {
                f.write_char('\n')?;
            } else {
                first = false;
            }

            let line = row
                .iter()
                .map(|&c| {
                    if c == EMPTY {
                        format!("{:>width$}", "_")
                    } else {
                        format!("{:>width$}", c)
                    }
                })
                .join(" ");
            f.write_str(&line)?;
        }

        Ok(())
    }
}

/// Parses a board written one row per line, cells separated by
/// whitespace, with `_` or `0` marking the blank.
pub fn parse_board(b: &str) -> Result<State, BoardError> {
    let rows = b
        .trim()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            line.split_whitespace()
                .map(|cell| match cell {
                    "_" => Ok(EMPTY),
                    n => n
                        .parse::<u8>()
                        .map_err(|_| BoardError::InvalidCell(n.to_string())),
                })
                .collect::<Result<Vec<u8>, _>>()
        })
        .collect::<Result<Vec<_>, _>>()?;

    State::from_rows(rows)
}

#[cfg(test)]
mod test {
    use std::collections::HashSet;

    use proptest::prelude::*;
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    const ONE_MOVE: &str = "
1 _ 2
3 4 5
6 7 8
";

    fn board(s: &str) -> State {
        parse_board(s).expect("valid board")
    }

    #[test]
    fn goal_is_finished() {
        let goal = State::goal(3).unwrap();
        assert_eq!(goal.cells(), &[0, 1, 2, 3, 4, 5, 6, 7, 8]);
        assert!(goal.is_finished());
        assert!(goal.is_solvable());
        assert_eq!(goal.hamming_cost(), 0);
        assert_eq!(goal.manhattan_cost(), 0);
    }

    #[test]
    fn parses_blank_markers() {
        let a = board("_ 1\n2 3");
        let b = board("0 1\n2 3");
        assert_eq!(a, b);
        assert!(a.is_finished());
        assert_eq!(a.find_empty(), (0, 0));
    }

    #[test]
    fn rejects_malformed_boards() {
        assert_eq!(parse_board(""), Err(BoardError::Empty));
        assert_eq!(
            parse_board("1 2\n3"),
            Err(BoardError::RaggedRow {
                row: 1,
                expected: 2,
                found: 1
            })
        );
        assert_eq!(parse_board("1 x\n_ 2"), Err(BoardError::InvalidCell("x".into())));
        assert_eq!(
            parse_board("1 4\n_ 2"),
            Err(BoardError::OutOfRange { value: 4, max: 3 })
        );
        assert_eq!(parse_board("1 1\n_ 2"), Err(BoardError::Duplicate(1)));
        assert_eq!(parse_board("_ 1\n_ 2"), Err(BoardError::MultipleEmpty));
        assert_eq!(
            State::from_cells(2, vec![0, 1, 2]),
            Err(BoardError::WrongLength {
                expected: 4,
                found: 3
            })
        );
        assert_eq!(State::goal(17), Err(BoardError::TooLarge(17)));
    }

    #[test]
    fn single_cell_board_is_solved() {
        let s = board("_");
        assert!(s.is_finished());
        assert!(s.is_solvable());
        assert!(s.successors().is_empty());
    }

    #[test]
    fn make_move_does_not_mutate() {
        let s = board(ONE_MOVE);
        let before = s.clone();

        // blank at (1, 0); tile 1 to its left slides right
        let moved = s.make_move(Direction::Right).unwrap();
        assert!(moved.is_finished());
        assert_eq!(s, before);
        assert_eq!(s.cells(), before.cells());
    }

    #[test]
    fn off_board_moves_are_rejected() {
        let goal = State::goal(3).unwrap();
        // blank in the top-left corner
        assert!(goal.make_move(Direction::Down).is_none());
        assert!(goal.make_move(Direction::Right).is_none());
        assert!(goal.make_move(Direction::Left).is_some());
        assert!(goal.make_move(Direction::Up).is_some());
        assert_eq!(goal.successors().len(), 2);
    }

    #[test]
    fn move_swaps_blank_with_neighbour() {
        let goal = State::goal(3).unwrap();
        let s = goal.make_move(Direction::Up).unwrap();
        assert_eq!(s.cells(), &[3, 1, 2, 0, 4, 5, 6, 7, 8]);
        assert_eq!(s.find_empty(), (0, 1));
        assert_eq!(s[(1, 0)], EMPTY);
        assert_eq!(s[(0, 0)], 3);
    }

    #[test]
    fn adjacent_swap_is_unsolvable() {
        let s = board("_ 2 1\n3 4 5\n6 7 8");
        assert_eq!(s.inversions(), 1);
        assert!(!s.is_solvable());
    }

    #[test]
    fn even_size_parity_follows_goal() {
        let goal = State::goal(4).unwrap();
        assert!(goal.is_solvable());

        let swapped = board(
            "
_ 2 1 3
4 5 6 7
8 9 10 11
12 13 14 15
",
        );
        assert!(!swapped.is_solvable());

        // a vertical move changes both inversions and blank row
        let down = goal.make_move(Direction::Up).unwrap();
        assert_eq!(down.inversions(), 3);
        assert!(down.is_solvable());
    }

    #[test]
    fn heuristics_on_known_board() {
        let s = board("8 1 2\n_ 4 3\n7 6 5");
        assert_eq!(s.cells(), &[8, 1, 2, 0, 4, 3, 7, 6, 5]);
        assert_eq!(s.hamming_cost(), 5);
        // 8: (0,0)->(2,2)=4, 3: (1,2)->(1,0)=2, 7: (2,0)->(2,1)=1,
        // 6: (2,1)->(2,0)=1, 5: (2,2)->(1,2)=1
        assert_eq!(s.manhattan_cost(), 9);
    }

    #[test]
    fn equal_boards_hash_identically() {
        let a = State::goal(3)
            .unwrap()
            .make_move(Direction::Left)
            .unwrap()
            .make_move(Direction::Up)
            .unwrap();
        let b = board("1 4 2\n3 _ 5\n6 7 8");
        assert_eq!(a, b);

        let set: HashSet<State> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn display_marks_blank() {
        assert_eq!(board(ONE_MOVE).to_string(), "1 _ 2\n3 4 5\n6 7 8");
        assert_eq!(
            State::goal(4).unwrap().to_string().lines().next(),
            Some(" _  1  2  3")
        );
    }

    #[test]
    fn random_boards_are_solvable_permutations() {
        let mut rng = StdRng::seed_from_u64(7);
        for size in 2..=4 {
            for _ in 0..20 {
                let s = State::random(size, &mut rng).unwrap();
                assert!(s.is_solvable());
                let mut sorted = s.cells().to_vec();
                sorted.sort_unstable();
                assert_eq!(sorted, State::goal(size).unwrap().cells());
                assert_eq!(s.cells()[s.blank], EMPTY);
            }
        }
    }

    fn random_walk(size: usize, steps: Vec<usize>) -> State {
        let mut s = State::goal(size).unwrap();
        for step in steps {
            let next = s.successors();
            let (_, picked) = next[step % next.len()].clone();
            s = picked;
        }
        s
    }

    proptest! {
        #[test]
        fn manhattan_dominates_hamming(seed in any::<u64>(), size in 2usize..=5) {
            let s = State::random(size, &mut StdRng::seed_from_u64(seed)).unwrap();
            prop_assert!(s.manhattan_cost() >= s.hamming_cost());
            prop_assert_eq!(s.hamming_cost() == 0, s.is_finished());
            prop_assert_eq!(s.manhattan_cost() == 0, s.is_finished());
        }

        #[test]
        fn moves_are_undone_by_the_opposite(
            steps in proptest::collection::vec(0usize..4, 0..30),
            size in 2usize..=4,
        ) {
            let s = random_walk(size, steps);
            for d in Direction::ALL {
                if let Some(next) = s.make_move(d) {
                    prop_assert_eq!(next.make_move(d.opposite()), Some(s.clone()));
                }
            }
        }

        #[test]
        fn reachable_states_stay_solvable(
            steps in proptest::collection::vec(0usize..4, 0..60),
            size in 2usize..=5,
        ) {
            prop_assert!(random_walk(size, steps).is_solvable());
        }
    }
}
