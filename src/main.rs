use std::{
    fs,
    io::{self, Read},
    path::PathBuf,
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use rand::{rngs::StdRng, SeedableRng};

use tile_solver::{
    parse_board, run_benchmark, solve_with, BenchmarkConfig, BuiltinHeuristic, HeuristicChoice,
    SolveError, SolverConfig,
};

#[derive(Parser)]
#[command(name = "tile-solver")]
#[command(about = "Optimal A* solver for N×N sliding-tile puzzles")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve one board and print the optimal path
    Solve {
        /// Board file: one row per line, `_` or `0` for the blank
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,

        /// Read the board from stdin instead of a file
        #[arg(long)]
        stdin: bool,

        #[arg(long, value_enum, default_value = "manhattan")]
        heuristic: HeuristicArg,

        /// Give up after this many expansions
        #[arg(long)]
        max_expansions: Option<usize>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Compare heuristics on random solvable boards
    Bench {
        #[arg(long, default_value = "100")]
        runs: usize,

        /// Board dimension
        #[arg(long, default_value = "3")]
        size: usize,

        /// Seed for reproducible boards
        #[arg(long)]
        seed: Option<u64>,

        #[arg(long, value_enum, default_value = "both")]
        heuristic: HeuristicArg,

        /// Give up after this many expansions per board
        #[arg(long)]
        max_expansions: Option<usize>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum HeuristicArg {
    Hamming,
    Manhattan,
    Both,
}

impl From<HeuristicArg> for HeuristicChoice {
    fn from(arg: HeuristicArg) -> Self {
        match arg {
            HeuristicArg::Hamming => HeuristicChoice::Single(BuiltinHeuristic::Hamming),
            HeuristicArg::Manhattan => HeuristicChoice::Single(BuiltinHeuristic::Manhattan),
            HeuristicArg::Both => HeuristicChoice::Both,
        }
    }
}

fn read_input(file: Option<PathBuf>, stdin: bool) -> Result<String> {
    if stdin {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read board from stdin")?;
        Ok(buf)
    } else if let Some(path) = file {
        fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))
    } else {
        bail!("either FILE or --stdin is required")
    }
}

fn run_solve(
    input: &str,
    heuristics: HeuristicChoice,
    config: &SolverConfig,
    json: bool,
) -> Result<()> {
    let board = parse_board(input).context("invalid board")?;

    println!("----");
    println!("Start:");
    println!("{}", board);
    println!("----");

    for heuristic in heuristics.heuristics() {
        match solve_with(&board, &heuristic, config) {
            Ok(solution) => {
                if json {
                    let out = serde_json::json!({
                        "heuristic": heuristic,
                        "moves": solution.moves(),
                        "directions": solution
                            .directions()
                            .iter()
                            .map(|d| d.to_string())
                            .collect::<Vec<_>>(),
                        "stats": solution.stats,
                    });
                    println!("{}", serde_json::to_string_pretty(&out)?);
                    continue;
                }

                println!("[{}] Found a solution in {} moves:", heuristic, solution.moves());
                println!(
                    "Expanded {} board positions (generated {} total).",
                    solution.stats.expansions, solution.stats.generated
                );
                for (direction, state) in solution.directions().iter().zip(&solution.path[1..]) {
                    println!();
                    println!("{}", direction);
                    println!("{}", state);
                }
                println!("----");
            }
            Err(SolveError::Unsolvable) => bail!("board is not solvable"),
            Err(err) => {
                return Err(err).with_context(|| format!("[{}] no solution found", heuristic))
            }
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Solve {
            file,
            stdin,
            heuristic,
            max_expansions,
            json,
        } => {
            let input = read_input(file, stdin)?;
            let config = SolverConfig { max_expansions };
            run_solve(&input, heuristic.into(), &config, json)
        }
        Commands::Bench {
            runs,
            size,
            seed,
            heuristic,
            max_expansions,
            json,
        } => {
            let config = BenchmarkConfig {
                runs,
                size,
                heuristics: heuristic.into(),
                solver: SolverConfig { max_expansions },
            };
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };

            info!("Running {} random {}x{} states...", runs, size, size);
            let report = run_benchmark(&config, &mut rng).context("benchmark failed")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", report);
            }
            Ok(())
        }
    }
}
