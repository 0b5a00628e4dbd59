use std::{
    cmp::Ordering,
    collections::{BinaryHeap, HashSet},
    mem,
    ops::Index,
};

use log::{debug, trace};
use serde::Serialize;
use thiserror::Error;

use crate::{board::State, direction::Direction, heuristic::Heuristic};

/// Handle of a node inside a [`SearchTree`].
pub type NodeId = usize;

#[derive(Debug, Clone)]
pub struct SearchNode {
    pub state: State,
    /// Node this one was expanded from; `None` for the root.
    pub parent: Option<NodeId>,
    /// Moves made from the root.
    pub g_cost: u32,
}

/// Arena owning every node created during one search. Children refer to
/// their parent by handle, so parents always outlive their children.
#[derive(Debug, Default)]
pub struct SearchTree {
    nodes: Vec<SearchNode>,
}

impl SearchTree {
    pub fn insert_root(&mut self, state: State) -> NodeId {
        self.nodes.push(SearchNode {
            state,
            parent: None,
            g_cost: 0,
        });
        self.nodes.len() - 1
    }

    pub fn insert_child(&mut self, parent: NodeId, state: State) -> NodeId {
        let g_cost = self.nodes[parent].g_cost + 1;
        self.nodes.push(SearchNode {
            state,
            parent: Some(parent),
            g_cost,
        });
        self.nodes.len() - 1
    }

    /// States from the root down to `id`, inclusive.
    pub fn path_to(&self, id: NodeId) -> Vec<State> {
        let mut path: Vec<State> = std::iter::successors(Some(id), |&i| self.nodes[i].parent)
            .map(|i| self.nodes[i].state.clone())
            .collect();
        path.reverse();
        path
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Index<NodeId> for SearchTree {
    type Output = SearchNode;

    fn index(&self, id: NodeId) -> &Self::Output {
        &self.nodes[id]
    }
}

// Ordered so that BinaryHeap pops the lowest f_cost first, and among equal
// f_cost the entry inserted earliest.
#[derive(Debug, Clone, Copy)]
struct FrontierEntry {
    f_cost: u32,
    sequence: u64,
    node: NodeId,
}

impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f_cost
            .cmp(&self.f_cost)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for FrontierEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FrontierEntry {}

#[derive(Debug, Default)]
struct Frontier {
    heap: BinaryHeap<FrontierEntry>,
    next_sequence: u64,
}

impl Frontier {
    fn push(&mut self, f_cost: u32, node: NodeId) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.heap.push(FrontierEntry {
            f_cost,
            sequence,
            node,
        });
    }

    fn pop(&mut self) -> Option<FrontierEntry> {
        self.heap.pop()
    }

    fn len(&self) -> usize {
        self.heap.len()
    }
}

/// Limits applied to a single search.
#[derive(Debug, Clone, Default)]
pub struct SolverConfig {
    /// Stop after this many expansions. Checked only between pops.
    pub max_expansions: Option<usize>,
}

/// Effort spent by one search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SearchStats {
    /// Nodes popped from the frontier and expanded (goal test included).
    pub expansions: usize,
    /// Expansions of a state that was already closed when popped.
    pub reexpanded: usize,
    /// Children pushed onto the frontier.
    pub generated: usize,
    /// Largest frontier size seen.
    pub peak_frontier: usize,
    /// Nodes held by the search tree when the search ended.
    pub stored_nodes: usize,
    /// States in the closed set when the search ended.
    pub closed: usize,
}

impl SearchStats {
    /// Rough number of bytes held by the search structures at their peak,
    /// for boards of dimension `size`.
    pub fn approx_bytes(&self, size: usize) -> usize {
        let cells = size * size;
        self.stored_nodes * (mem::size_of::<SearchNode>() + cells)
            + self.closed * (mem::size_of::<State>() + cells)
            + self.peak_frontier * mem::size_of::<FrontierEntry>()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolveError {
    #[error("board is not solvable")]
    Unsolvable,
    #[error("frontier exhausted after {} expansions without reaching the goal", .stats.expansions)]
    Exhausted { stats: SearchStats },
    #[error("expansion limit reached after {} expansions", .stats.expansions)]
    LimitReached { stats: SearchStats },
}

impl SolveError {
    /// Effort spent before the search gave up; zero for rejected boards.
    pub fn stats(&self) -> SearchStats {
        match self {
            SolveError::Unsolvable => SearchStats::default(),
            SolveError::Exhausted { stats } | SolveError::LimitReached { stats } => *stats,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Solution {
    /// Root first, goal last.
    pub path: Vec<State>,
    pub stats: SearchStats,
}

impl Solution {
    pub fn moves(&self) -> usize {
        self.path.len() - 1
    }

    /// The slide taken between each pair of consecutive states.
    pub fn directions(&self) -> Vec<Direction> {
        self.path
            .windows(2)
            .filter_map(|pair| {
                Direction::ALL
                    .into_iter()
                    .find(|&d| pair[0].make_move(d).as_ref() == Some(&pair[1]))
            })
            .collect()
    }
}

/// Finds a shortest move sequence from `root` to the goal with A*.
pub fn solve<H: Heuristic + ?Sized>(root: &State, heuristic: &H) -> Result<Solution, SolveError> {
    solve_with(root, heuristic, &SolverConfig::default())
}

pub fn solve_with<H: Heuristic + ?Sized>(
    root: &State,
    heuristic: &H,
    config: &SolverConfig,
) -> Result<Solution, SolveError> {
    if !root.is_solvable() {
        debug!("rejecting unsolvable board ({} inversions)", root.inversions());
        return Err(SolveError::Unsolvable);
    }

    search(root, heuristic, config)
}

// A* without the parity check. Closed states are never pushed again,
// which keeps paths optimal for consistent heuristics and unit move costs.
fn search<H: Heuristic + ?Sized>(
    root: &State,
    heuristic: &H,
    config: &SolverConfig,
) -> Result<Solution, SolveError> {
    let mut tree = SearchTree::default();
    let mut frontier = Frontier::default();
    let mut closed: HashSet<State> = HashSet::new();
    let mut stats = SearchStats::default();

    let root_h = heuristic.estimate(root);
    let root_id = tree.insert_root(root.clone());
    frontier.push(root_h, root_id);
    stats.peak_frontier = 1;

    debug!("starting search, size {}, h(root) = {}", root.size(), root_h);

    let finish = |mut stats: SearchStats, tree: &SearchTree, closed: &HashSet<State>| {
        stats.stored_nodes = tree.len();
        stats.closed = closed.len();
        stats
    };

    loop {
        if let Some(max) = config.max_expansions {
            if stats.expansions >= max {
                let stats = finish(stats, &tree, &closed);
                debug!("expansion limit {} reached", max);
                return Err(SolveError::LimitReached { stats });
            }
        }

        let Some(entry) = frontier.pop() else {
            break;
        };

        stats.expansions += 1;
        let current = &tree[entry.node];
        trace!(
            "expanding node {} (f = {}, g = {})",
            entry.node,
            entry.f_cost,
            current.g_cost
        );

        if current.state.is_finished() {
            let path = tree.path_to(entry.node);
            let stats = finish(stats, &tree, &closed);
            debug!(
                "solved in {} moves, {} expansions",
                path.len() - 1,
                stats.expansions
            );
            return Ok(Solution { path, stats });
        }

        let g_cost = current.g_cost + 1;
        let successors = current.state.successors();
        // a duplicate pushed before its state was closed is expanded again
        if !closed.insert(current.state.clone()) {
            stats.reexpanded += 1;
        }

        for (_, neighbor) in successors {
            if closed.contains(&neighbor) {
                continue;
            }

            let f_cost = g_cost + heuristic.estimate(&neighbor);
            let child = tree.insert_child(entry.node, neighbor);
            frontier.push(f_cost, child);
            stats.generated += 1;
        }

        stats.peak_frontier = stats.peak_frontier.max(frontier.len());
    }

    let stats = finish(stats, &tree, &closed);
    debug!("frontier exhausted after {} expansions", stats.expansions);
    Err(SolveError::Exhausted { stats })
}
