use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use tourney::{
    config::{
        DoubleStage, Finals, Points, RoundRobinStage, SingleStage, SwissPairing, SwissStage,
        Tiebreaker,
    },
    engine::{FormatEngine, Match, StageContext, compute_standings, pair_round},
    migration::{LegacyTournament, translate},
};

fn names(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("player{i}")).collect()
}

/// Benchmark single elimination layout across field sizes
fn bench_single_elimination(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_elimination");
    for n in [16, 64, 256] {
        let stage = SingleStage {
            size: n as u32,
            third_place: true,
        };
        let players = names(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &players, |b, players| {
            b.iter(|| stage.generate(StageContext::new(1, 0), black_box(players)));
        });
    }
    group.finish();
}

/// Benchmark double elimination layout, including the bracket reset
fn bench_double_elimination(c: &mut Criterion) {
    let mut group = c.benchmark_group("double_elimination");
    for n in [16, 64, 256] {
        let stage = DoubleStage {
            size: n as u32,
            finals: Finals::IfNecessary,
            min_games_guaranteed: Some(2),
        };
        let players = names(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &players, |b, players| {
            b.iter(|| stage.generate(StageContext::new(1, 0), black_box(players)));
        });
    }
    group.finish();
}

fn bench_round_robin(c: &mut Criterion) {
    let stage = RoundRobinStage {
        groups: 8,
        group_size: 8,
        points: Points::league(),
        tiebreakers: vec![Tiebreaker::Points, Tiebreaker::GoalDifference],
    };
    let players = names(64);

    c.bench_function("round_robin_8x8", |b| {
        b.iter(|| stage.generate(StageContext::new(1, 0), black_box(&players)));
    });
}

/// Play a Swiss event to the given round with the higher seed always winning
fn swiss_history(stage: &SwissStage, players: &[String], rounds: u32) -> Vec<Match> {
    let mut history = Vec::new();
    for round in 1..=rounds {
        let bracket = pair_round(stage, StageContext::new(1, 0), players, &history, round).unwrap();
        for mut m in bracket.matches {
            if !m.is_completed() {
                m.record_result(1, 0);
            }
            history.push(m);
        }
    }
    history
}

/// Benchmark late-round Swiss pairing where repeat avoidance bites hardest
fn bench_swiss_pairing(c: &mut Criterion) {
    let stage = SwissStage {
        rounds: 7,
        pairing: SwissPairing::Seed,
        tiebreakers: vec![
            Tiebreaker::Points,
            Tiebreaker::OpponentsScore,
            Tiebreaker::Buchholz,
        ],
    };
    let mut group = c.benchmark_group("swiss_pairing_round_7");
    for n in [16, 64] {
        let players = names(n);
        let history = swiss_history(&stage, &players, 6);
        group.bench_with_input(BenchmarkId::from_parameter(n), &history, |b, history| {
            b.iter(|| pair_round(&stage, StageContext::new(1, 0), &players, black_box(history), 7));
        });
    }
    group.finish();
}

fn bench_standings(c: &mut Criterion) {
    let stage = SwissStage {
        rounds: 7,
        pairing: SwissPairing::Seed,
        tiebreakers: vec![Tiebreaker::Points, Tiebreaker::Buchholz],
    };
    let players = names(64);
    let history = swiss_history(&stage, &players, 7);

    c.bench_function("standings_64_players", |b| {
        b.iter(|| {
            compute_standings(
                &players,
                black_box(&history),
                Points::swiss(),
                &stage.tiebreakers,
            )
        });
    });
}

/// Benchmark legacy translation for a typical record
fn bench_translate(c: &mut Criterion) {
    let mut legacy = LegacyTournament::new(1, "County Championship");
    legacy.tournament_type = Some("round-robin".to_string());
    legacy.sport = Some("Soccer".to_string());
    legacy.age_group = Some("High School".to_string());
    legacy.gender_division = Some("Girls".to_string());
    legacy.max_participants = Some(24);

    c.bench_function("translate_legacy", |b| {
        b.iter(|| translate(black_box(&legacy)));
    });
}

criterion_group!(
    generation,
    bench_single_elimination,
    bench_double_elimination,
    bench_round_robin,
    bench_swiss_pairing,
);

criterion_group!(ranking, bench_standings, bench_translate);

criterion_main!(generation, ranking);
