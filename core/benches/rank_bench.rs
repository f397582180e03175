use criterion::{criterion_group, criterion_main, Criterion};
use coursematch_core::{CatalogItem, Level, Snapshot, Tokenizer};

const SUBJECTS: &[&str] = &["Business Finance", "Graphic Design", "Musical Instruments", "Web Development"];
const LEVELS: &[Level] = &[Level::Beginner, Level::Intermediate, Level::Advanced];

fn catalog(n: usize) -> Vec<CatalogItem> {
    (0..n)
        .map(|i| {
            CatalogItem::new(
                i.to_string(),
                format!("Course {i} on topic{} and skill{}", i % 97, i % 13),
                SUBJECTS[i % SUBJECTS.len()],
                LEVELS[i % LEVELS.len()],
            )
        })
        .collect()
}

fn bench_rank(c: &mut Criterion) {
    let snapshot = Snapshot::build(catalog(3_600), Tokenizer::default(), 1).expect("build");
    c.bench_function("rank_3600_courses", |b| b.iter(|| snapshot.rank("Web Development Beginner", 5)));
    c.bench_function("build_3600_courses", |b| b.iter(|| Snapshot::build(catalog(3_600), Tokenizer::default(), 1)));
}

criterion_group!(benches, bench_rank);
criterion_main!(benches);
