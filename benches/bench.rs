use criterion::{black_box, criterion_group, criterion_main, Criterion};

use tile_solver::{parse_board, solve, BuiltinHeuristic};

// Row per line, `_` is the blank. The goal puts the blank top-left.
const SIMPLE_INPUT: &str = "
3 1 2
4 _ 5
6 7 8";

const MEDIUM_INPUT: &str = "
8 1 3
4 _ 2
7 6 5";

const HARDER_INPUT: &str = "
8 6 7
2 5 4
3 _ 1";

fn criterion_bench(c: &mut Criterion) {
    for (name, input) in [
        ("simple", SIMPLE_INPUT),
        ("medium", MEDIUM_INPUT),
        ("harder", HARDER_INPUT),
    ] {
        let board = parse_board(input).expect("valid board");
        for heuristic in [BuiltinHeuristic::Manhattan, BuiltinHeuristic::Hamming] {
            c.bench_function(&format!("{}/{}", name, heuristic), |b| {
                b.iter(|| solve(black_box(&board), &heuristic))
            });
        }
    }
}

criterion_group!(benches, criterion_bench);
criterion_main!(benches);
