//! Performance benchmarks for rating updates, pairing and ranking

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use course_ranker::rating::{
    EloRatingCalculator, PairingSelector, RatingCalculator, UniformPairingSelector,
};
use course_ranker::types::{Item, ItemRating, RequestContext};
use course_ranker::utils::current_timestamp;
use course_ranker::{CourseStore, InMemoryStore, RankingEngine, SqliteStore};
use std::sync::Arc;

fn items(count: i64) -> Vec<Item> {
    (1..=count)
        .map(|id| Item {
            id,
            user_id: 1,
            name: format!("Course {id}"),
            created_at: current_timestamp(),
        })
        .collect()
}

fn bench_elo_update(c: &mut Criterion) {
    let calculator = EloRatingCalculator::default();
    let winner = ItemRating {
        id: 1,
        user_id: 1,
        item_id: 1,
        rating: 1350.0,
    };
    let loser = ItemRating {
        id: 2,
        user_id: 1,
        item_id: 2,
        rating: 1180.0,
    };

    c.bench_function("elo_rating_update", |b| {
        b.iter(|| {
            calculator
                .calculate_rating_changes(black_box(&winner), black_box(&loser))
                .unwrap()
        })
    });
}

fn bench_pairing(c: &mut Criterion) {
    let selector = UniformPairingSelector::seeded(42);
    let mut group = c.benchmark_group("pairing_selection");

    for count in [2, 50, 1000] {
        let items = items(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &items, |b, items| {
            b.iter(|| selector.select_pair(black_box(items)).unwrap())
        });
    }

    group.finish();
}

fn engine_with_courses(store: Arc<dyn CourseStore>, count: usize) -> (RankingEngine, RequestContext) {
    let user = store.create_user("bench", "hash").unwrap();
    let ctx = RequestContext::new(user.id);
    let engine = RankingEngine::new(
        store,
        Arc::new(EloRatingCalculator::default()),
        Arc::new(UniformPairingSelector::seeded(7)),
    );

    for i in 0..count {
        engine.add_item(&ctx, &format!("Course {i}")).unwrap();
    }
    (engine, ctx)
}

fn bench_vote_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("vote_round_trip");

    let backends: [(&str, Arc<dyn CourseStore>); 2] = [
        ("memory", Arc::new(InMemoryStore::new())),
        ("sqlite", Arc::new(SqliteStore::open_in_memory().unwrap())),
    ];
    for (name, store) in backends {
        let (engine, ctx) = engine_with_courses(store, 100);
        group.bench_function(name, |b| {
            b.iter(|| {
                let pair = engine.next_pair(&ctx).unwrap();
                engine
                    .record_vote(&ctx, &pair.first.name, &pair.second.name)
                    .unwrap()
            })
        });
    }

    group.finish();
}

fn bench_rankings(c: &mut Criterion) {
    let (engine, ctx) = engine_with_courses(Arc::new(InMemoryStore::new()), 500);
    for _ in 0..1000 {
        let pair = engine.next_pair(&ctx).unwrap();
        engine
            .record_vote(&ctx, &pair.first.name, &pair.second.name)
            .unwrap();
    }

    c.bench_function("rankings_500_courses", |b| {
        b.iter(|| engine.rankings(black_box(&ctx)).unwrap())
    });
}

criterion_group!(
    benches,
    bench_elo_update,
    bench_pairing,
    bench_vote_round_trip,
    bench_rankings
);
criterion_main!(benches);
