use criterion::{black_box, criterion_group, criterion_main, Criterion};
use widgetopia::dashboard::grid::{compact, move_item, GridItem};

fn build_items(count: usize) -> Vec<GridItem> {
    (0..count)
        .map(|i| GridItem {
            id: format!("notes-{i}"),
            x: ((i * 2) % 12) as i32,
            y: i32::MAX,
            w: 2 + (i % 3) as i32,
            h: 2 + (i % 4) as i32,
            min_w: 1,
            min_h: 1,
        })
        .collect()
}

fn bench_grid(c: &mut Criterion) {
    let items = build_items(200);
    let compacted = compact(&items, 12);

    c.bench_function("compact_appended_200", |b| {
        b.iter(|| compact(black_box(&items), black_box(12)))
    });

    c.bench_function("move_item_200", |b| {
        b.iter(|| move_item(black_box(&compacted), "notes-100", 4, 0, 12))
    });
}

criterion_group!(benches, bench_grid);
criterion_main!(benches);
