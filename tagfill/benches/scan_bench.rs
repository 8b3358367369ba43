use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tagfill::tag::scanner::scan;
use tagfill::tag::{Engine, ParseCache, TagContext};

fn make_text(repeats: usize) -> String {
    let chunk = "Say <element[hello].to_uppercase> to <list[a|b|c].size> friends. ";
    chunk.repeat(repeats)
}

fn bench_scan(c: &mut Criterion) {
    let small = make_text(10);
    let large = make_text(1000);

    let mut g = c.benchmark_group("scan");
    g.bench_function("scan_small", |b| b.iter(|| scan(black_box(&small))));
    g.bench_function("scan_large", |b| b.iter(|| scan(black_box(&large))));
    g.bench_function("plain_fast_path", |b| {
        b.iter(|| scan(black_box("no tags in this line at all")))
    });
    g.finish();
}

fn bench_fill(c: &mut Criterion) {
    let text = make_text(10);
    let ctx = TagContext::default();
    let cached = Engine::builder().cache(Arc::new(ParseCache::new())).build();

    let mut g = c.benchmark_group("fill");
    g.bench_function("fill_cached", |b| b.iter(|| cached.tag(black_box(&text), &ctx)));
    g.bench_function("fill_cold", |b| {
        b.iter(|| {
            let engine = Engine::builder().cache(Arc::new(ParseCache::new())).build();
            engine.tag(black_box(&text), &ctx)
        })
    });
    g.finish();
}

criterion_group!(benches, bench_scan, bench_fill);
criterion_main!(benches);
