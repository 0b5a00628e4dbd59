//! Heuristic comparison over many random boards.
//!
//! Every run draws one solvable board and solves it once with each selected
//! heuristic, so all heuristics see exactly the same instances.

use std::{
    fmt::{self, Display},
    time::Instant,
};

use itertools::Itertools;
use log::{info, warn};
use rand::Rng;
use serde::Serialize;

use crate::{
    board::{BoardError, State},
    heuristic::{BuiltinHeuristic, HeuristicChoice},
    solver::{solve_with, SolverConfig},
};

#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    pub runs: usize,
    pub size: usize,
    pub heuristics: HeuristicChoice,
    pub solver: SolverConfig,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            runs: 100,
            size: 3,
            heuristics: HeuristicChoice::Both,
            solver: SolverConfig::default(),
        }
    }
}

/// Outcome of solving one board with one heuristic.
#[derive(Debug, Clone, Serialize)]
pub struct RunRecord {
    pub heuristic: BuiltinHeuristic,
    /// `None` when the search gave up.
    pub moves: Option<usize>,
    pub expansions: usize,
    pub seconds: f64,
    pub approx_bytes: usize,
}

/// Mean and sample standard deviation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Spread {
    pub mean: f64,
    pub stdev: f64,
}

impl Spread {
    pub fn of(samples: &[f64]) -> Spread {
        if samples.is_empty() {
            return Spread::default();
        }

        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let stdev = if samples.len() > 1 {
            let var = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
            var.sqrt()
        } else {
            0.0
        };

        Spread { mean, stdev }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HeuristicSummary {
    pub heuristic: BuiltinHeuristic,
    pub solved: usize,
    pub failed: usize,
    pub total_nodes: usize,
    pub total_seconds: f64,
    pub total_moves: usize,
    pub nodes: Spread,
    pub seconds: Spread,
    pub bytes: Spread,
}

impl HeuristicSummary {
    pub fn from_records<'a>(
        heuristic: BuiltinHeuristic,
        records: impl IntoIterator<Item = &'a RunRecord>,
    ) -> HeuristicSummary {
        let (solved, failed): (Vec<&RunRecord>, Vec<&RunRecord>) = records
            .into_iter()
            .filter(|r| r.heuristic == heuristic)
            .partition(|r| r.moves.is_some());

        let nodes = solved.iter().map(|r| r.expansions as f64).collect_vec();
        let seconds = solved.iter().map(|r| r.seconds).collect_vec();
        let bytes = solved.iter().map(|r| r.approx_bytes as f64).collect_vec();

        HeuristicSummary {
            heuristic,
            solved: solved.len(),
            failed: failed.len(),
            total_nodes: solved.iter().map(|r| r.expansions).sum(),
            total_seconds: seconds.iter().sum(),
            total_moves: solved.iter().filter_map(|r| r.moves).sum(),
            nodes: Spread::of(&nodes),
            seconds: Spread::of(&seconds),
            bytes: Spread::of(&bytes),
        }
    }
}

/// How much more effort Hamming needs than Manhattan, as ratios of means.
/// A ratio is `None` when Manhattan's mean is zero.
#[derive(Debug, Clone, Serialize)]
pub struct Comparison {
    pub nodes_ratio: Option<f64>,
    pub time_ratio: Option<f64>,
    pub memory_ratio: Option<f64>,
    /// Both heuristics found paths of the same total length.
    pub lengths_agree: bool,
}

fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    (denominator > 0.0).then(|| numerator / denominator)
}

impl Comparison {
    pub fn between(hamming: &HeuristicSummary, manhattan: &HeuristicSummary) -> Comparison {
        Comparison {
            nodes_ratio: ratio(hamming.nodes.mean, manhattan.nodes.mean),
            time_ratio: ratio(hamming.seconds.mean, manhattan.seconds.mean),
            memory_ratio: ratio(hamming.bytes.mean, manhattan.bytes.mean),
            lengths_agree: hamming.total_moves == manhattan.total_moves,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub runs: usize,
    pub size: usize,
    pub summaries: Vec<HeuristicSummary>,
    pub comparison: Option<Comparison>,
    pub records: Vec<RunRecord>,
}

impl Report {
    pub fn summary(&self, heuristic: BuiltinHeuristic) -> Option<&HeuristicSummary> {
        self.summaries.iter().find(|s| s.heuristic == heuristic)
    }
}

/// Solves `config.runs` random boards with every selected heuristic.
pub fn run_benchmark<R: Rng + ?Sized>(
    config: &BenchmarkConfig,
    rng: &mut R,
) -> Result<Report, BoardError> {
    let mut records = Vec::with_capacity(config.runs * 2);

    for run in 0..config.runs {
        let start = State::random(config.size, rng)?;

        for heuristic in config.heuristics.heuristics() {
            let t0 = Instant::now();
            let result = solve_with(&start, &heuristic, &config.solver);
            let seconds = t0.elapsed().as_secs_f64();

            let record = match result {
                Ok(solution) => RunRecord {
                    heuristic,
                    moves: Some(solution.moves()),
                    expansions: solution.stats.expansions,
                    seconds,
                    approx_bytes: solution.stats.approx_bytes(config.size),
                },
                Err(err) => {
                    warn!("{} failed on run {}: {}", heuristic, run + 1, err);
                    let stats = err.stats();
                    RunRecord {
                        heuristic,
                        moves: None,
                        expansions: stats.expansions,
                        seconds,
                        approx_bytes: stats.approx_bytes(config.size),
                    }
                }
            };
            records.push(record);
        }

        if (run + 1) % 10 == 0 {
            info!("... {}/{} completed", run + 1, config.runs);
        }
    }

    let summaries = config
        .heuristics
        .heuristics()
        .map(|h| HeuristicSummary::from_records(h, &records))
        .collect_vec();

    let comparison = match (
        summaries.iter().find(|s| s.heuristic == BuiltinHeuristic::Hamming),
        summaries.iter().find(|s| s.heuristic == BuiltinHeuristic::Manhattan),
    ) {
        (Some(hamming), Some(manhattan)) if hamming.solved > 0 && manhattan.solved > 0 => {
            Some(Comparison::between(hamming, manhattan))
        }
        _ => None,
    };

    let report = Report {
        runs: config.runs,
        size: config.size,
        summaries,
        comparison,
        records,
    };

    Ok(report)
}

// Ratio printed as `2.50x`, or `n/a` when undefined.
struct Times(Option<f64>);

impl Display for Times {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(r) => write!(f, "{:.2}x", r),
            None => f.write_str("n/a"),
        }
    }
}

const RULE: &str = "======================================================================";
const THIN_RULE: &str = "----------------------------------------------------------------------";

impl Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", RULE)?;
        writeln!(
            f,
            "BENCHMARK REPORT - {} Random States ({}x{})",
            self.runs, self.size, self.size
        )?;
        writeln!(f, "{}", RULE)?;
        writeln!(f)?;

        for s in &self.summaries {
            writeln!(f, "{} HEURISTIC", s.heuristic.name().to_uppercase())?;
            writeln!(f, "{}", THIN_RULE)?;

            if s.solved == 0 {
                writeln!(f, "  No runs solved")?;
                writeln!(f)?;
                continue;
            }

            writeln!(f, "Puzzles Solved:               {} / {}", s.solved, self.runs)?;
            writeln!(f, "Total Nodes Expanded:         {} nodes", s.total_nodes)?;
            writeln!(f, "Total Runtime:                {:.2} seconds", s.total_seconds)?;
            writeln!(f)?;
            writeln!(f, "Nodes Expanded:")?;
            writeln!(f, "  Mean:                       {:.2} nodes", s.nodes.mean)?;
            writeln!(f, "  Standard Deviation:         {:.2} nodes", s.nodes.stdev)?;
            writeln!(f)?;
            writeln!(f, "Memory Usage (estimated peak):")?;
            writeln!(f, "  Mean:                       {:.2} KiB", s.bytes.mean / 1024.0)?;
            writeln!(f, "  Standard Deviation:         {:.2} KiB", s.bytes.stdev / 1024.0)?;
            writeln!(f)?;
            writeln!(f, "Execution Time:")?;
            writeln!(f, "  Mean:                       {:.4} seconds", s.seconds.mean)?;
            writeln!(f, "  Standard Deviation:         {:.4} seconds", s.seconds.stdev)?;
            writeln!(f)?;
            writeln!(f, "Total Path Lengths:           {} moves", s.total_moves)?;
            writeln!(f)?;
        }

        if let (Some(c), Some(hamming), Some(manhattan)) = (
            &self.comparison,
            self.summary(BuiltinHeuristic::Hamming),
            self.summary(BuiltinHeuristic::Manhattan),
        ) {
            writeln!(f, "{}", RULE)?;
            writeln!(f, "PERFORMANCE COMPARISON")?;
            writeln!(f, "{}", RULE)?;
            writeln!(
                f,
                "Node Efficiency:              Manhattan explores {} fewer nodes",
                Times(c.nodes_ratio)
            )?;
            writeln!(
                f,
                "Runtime Efficiency:           Manhattan is {} faster",
                Times(c.time_ratio)
            )?;
            writeln!(
                f,
                "Memory Efficiency:            Manhattan uses {} less memory",
                Times(c.memory_ratio)
            )?;
            writeln!(f)?;
            writeln!(f, "Optimality:")?;
            if c.lengths_agree {
                writeln!(f, "  Both heuristics achieved optimal solutions")?;
                writeln!(f, "  (Total path length: {} moves)", manhattan.total_moves)?;
            } else {
                writeln!(f, "  WARNING: Path lengths differ!")?;
                writeln!(f, "  Manhattan: {} moves", manhattan.total_moves)?;
                writeln!(f, "  Hamming: {} moves", hamming.total_moves)?;
            }
            writeln!(f, "{}", RULE)?;
        }

        Ok(())
    }
}
