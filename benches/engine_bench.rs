use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::time::Duration;

use checkers_engine::evaluation::evaluate;
use checkers_engine::{Board, MoveGenerator, Player, SearchEngine};

fn bench_movable_entries(c: &mut Criterion) {
    let board = Board::new(10, 4).unwrap();
    let gen = MoveGenerator::new();
    c.bench_function("movable_entries_10x10_opening", |b| {
        b.iter(|| gen.movable_entries(black_box(&board), black_box(Player::White)))
    });
}

fn bench_evaluate(c: &mut Criterion) {
    let board = Board::new(10, 4).unwrap();
    c.bench_function("evaluate_10x10_opening", |b| {
        b.iter(|| evaluate(black_box(&board), black_box(Player::White)))
    });
}

fn bench_perft(c: &mut Criterion) {
    let board = Board::new(8, 3).unwrap();
    let gen = MoveGenerator::new();
    c.bench_function("perft_4_8x8", |b| {
        b.iter(|| gen.perft(black_box(&board), Player::White, 4).unwrap())
    });
}

fn bench_search(c: &mut Criterion) {
    let board = Board::new(10, 4).unwrap();
    let mut group = c.benchmark_group("search");
    group.sample_size(10);
    group.measurement_time(Duration::from_secs(10));
    group.bench_function("depth_4_10x10_opening", |b| {
        b.iter(|| {
            let mut engine = SearchEngine::new();
            engine.search(black_box(&board), Player::White, Player::Black, 4).unwrap()
        })
    });
    group.finish();
}

criterion_group!(benches, bench_movable_entries, bench_evaluate, bench_perft, bench_search);
criterion_main!(benches);
