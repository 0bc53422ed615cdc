// Criterion benchmarks for the MatchMeet engine

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use matchmeet::core::{CandidateSelector, DecisionRecorder};
use matchmeet::models::{Decision, UserId};
use matchmeet::services::{MemoryStore, ProfileStore};
use tokio::runtime::Runtime;

async fn seed_pool(count: usize) -> (MemoryStore, UserId) {
    let store = MemoryStore::new();
    let viewer = store
        .create_user("viewer", "hash", None, "unknown_user.png")
        .await
        .unwrap()
        .id;
    for i in 0..count {
        store
            .create_user(&format!("user{}", i), "hash", None, "unknown_user.png")
            .await
            .unwrap();
    }
    (store, viewer)
}

fn bench_next_candidate(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("next_candidate");

    for pool_size in [10, 100, 1000].iter() {
        let (store, viewer) = rt.block_on(seed_pool(*pool_size));

        // Half-seen pool: a realistic mid-session exclusion set.
        rt.block_on(async {
            for target in 2..(2 + (*pool_size as i64) / 2) {
                store.mark_seen(viewer, target).await.unwrap();
            }
        });

        group.bench_with_input(
            BenchmarkId::new("pool", pool_size),
            pool_size,
            |b, _| {
                b.iter(|| {
                    rt.block_on(async {
                        let selector = CandidateSelector::new(&store);
                        black_box(selector.next_candidate(black_box(viewer)).await.unwrap())
                    })
                });
            },
        );
    }

    group.finish();
}

fn bench_record_like(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let (store, viewer) = rt.block_on(seed_pool(100));

    c.bench_function("record_like_replay", |b| {
        b.iter(|| {
            rt.block_on(async {
                let recorder = DecisionRecorder::new(&store);
                black_box(
                    recorder
                        .record(black_box(viewer), black_box(2), Decision::Like)
                        .await
                        .unwrap(),
                )
            })
        });
    });
}

criterion_group!(benches, bench_next_candidate, bench_record_like);
criterion_main!(benches);
