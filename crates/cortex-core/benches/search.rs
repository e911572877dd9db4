use criterion::{black_box, criterion_group, criterion_main, Criterion};

use cortex_core::content::ContentStore;
use cortex_core::model::{Enumerated, Question, Region, System};
use cortex_core::search::{highlight, SearchIndex};

fn make_store(per_section: usize) -> ContentStore {
    let mut store = ContentStore::default();
    for region in Region::ALL {
        for system in System::ALL {
            for i in 0..per_section {
                store.insert_question(
                    *region,
                    *system,
                    Question::mcq(
                        &format!("Which structure of the {region} belongs to {system} item {i}?"),
                        &["Scapula", "Humerus", "Radius", "Ulna"],
                        i % 4,
                        "The scapula articulates with the humerus at the shoulder joint.",
                    ),
                );
                store.insert_question(
                    *region,
                    *system,
                    Question::true_false(&format!("The {system} of the {region} is statement {i}"), i % 2 == 0, ""),
                );
            }
        }
    }
    store
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("search_build");

    for per_section in [10, 100] {
        let store = make_store(per_section);
        group.bench_function(format!("questions={}", per_section * 60), |b| {
            b.iter(|| SearchIndex::build(black_box(&store)))
        });
    }

    group.finish();
}

fn bench_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("search_query");
    let index = SearchIndex::build(&make_store(100));

    group.bench_function("single_token", |b| {
        b.iter(|| index.search(black_box("scapula")))
    });

    group.bench_function("three_tokens", |b| {
        b.iter(|| index.search(black_box("thorax myology shoulder")))
    });

    group.bench_function("no_match", |b| {
        b.iter(|| index.search(black_box("zzzz")))
    });

    group.finish();
}

fn bench_highlight(c: &mut Criterion) {
    let text = "The scapula articulates with the humerus at the shoulder joint; the Scapula spine divides its lateral surface.";

    c.bench_function("highlight", |b| {
        b.iter(|| highlight(black_box(text), black_box("scapula humerus joint")))
    });
}

criterion_group!(benches, bench_build, bench_query, bench_highlight);
criterion_main!(benches);
