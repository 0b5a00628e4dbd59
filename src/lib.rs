//! Optimal sliding-tile puzzle solver.
//!
//! Boards are N×N with a single blank; the goal places the blank first
//! followed by tiles `1..N²`. Search is A* over board states with a closed
//! set, and two admissible heuristics (misplaced tiles and grid distance)
//! can be compared on the same instances.

pub mod board;
pub mod direction;
pub mod heuristic;
pub mod report;
pub mod solver;

pub use board::{parse_board, BoardError, State, EMPTY, MAX_SIZE};
pub use direction::Direction;
pub use heuristic::{BuiltinHeuristic, Heuristic, HeuristicChoice};
pub use report::{run_benchmark, BenchmarkConfig, Report};
pub use solver::{
    solve, solve_with, NodeId, SearchNode, SearchStats, SearchTree, Solution, SolveError,
    SolverConfig,
};
