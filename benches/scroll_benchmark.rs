//! Scroll performance benchmarks.
//!
//! Measures per-frame layout cost on a document of roughly 150k words, plus
//! the height-index queries every frame depends on.
//!
//! Run with: cargo bench --bench scroll_benchmark

#![allow(missing_docs)] // criterion macros generate undocumented items

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use parlay::view_state::height_index::HeightIndex;
use parlay::view_state::{EngineConfig, LazyLayoutEngine, MonospaceShaper};

const PARAGRAPHS: usize = 15_000;
const VIEWPORT_HEIGHT: f64 = 900.0;
const SCROLL_STEP: f64 = 120.0;

/// Scroll position in the document.
#[derive(Debug, Clone, Copy)]
enum ScrollPosition {
    Start,
    Quarter,
    Middle,
    ThreeQuarters,
    End,
}

impl ScrollPosition {
    const ALL: [ScrollPosition; 5] = [
        ScrollPosition::Start,
        ScrollPosition::Quarter,
        ScrollPosition::Middle,
        ScrollPosition::ThreeQuarters,
        ScrollPosition::End,
    ];

    /// Get the position name for benchmark IDs.
    fn name(&self) -> &'static str {
        match self {
            ScrollPosition::Start => "start",
            ScrollPosition::Quarter => "quarter",
            ScrollPosition::Middle => "middle",
            ScrollPosition::ThreeQuarters => "three_quarters",
            ScrollPosition::End => "end",
        }
    }

    fn fraction(&self) -> f64 {
        match self {
            ScrollPosition::Start => 0.0,
            ScrollPosition::Quarter => 0.25,
            ScrollPosition::Middle => 0.5,
            ScrollPosition::ThreeQuarters => 0.75,
            ScrollPosition::End => 1.0,
        }
    }
}

/// Ten words per sentence, one to three sentences per paragraph.
fn document() -> Vec<String> {
    const WORDS: [&str; 8] = [
        "lorem", "ipsum", "dolor", "sit", "amet", "consectetur", "adipiscing", "elit",
    ];
    (0..PARAGRAPHS)
        .map(|i| {
            let sentences = 1 + i % 3;
            (0..sentences * 10)
                .map(|w| WORDS[(i + w) % WORDS.len()])
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

fn engine_at(texts: &[String], position: ScrollPosition) -> LazyLayoutEngine<MonospaceShaper> {
    let mut engine = LazyLayoutEngine::new(MonospaceShaper::default(), EngineConfig::default());
    engine.load_texts(texts.iter().cloned());
    engine.set_viewport(0.0, VIEWPORT_HEIGHT);
    engine.set_scrollbar_position(position.fraction());
    engine
}

/// First frame after jumping to a position: the whole band is shaped.
fn benchmark_cold_frame(c: &mut Criterion) {
    let texts = document();
    let mut group = c.benchmark_group("cold_frame");
    group.sample_size(20);

    for position in ScrollPosition::ALL {
        group.bench_with_input(
            BenchmarkId::new("position", position.name()),
            &position,
            |b, &pos| {
                b.iter_batched(
                    || engine_at(&texts, pos),
                    |mut engine| black_box(engine.layout_viewport().unwrap()),
                    BatchSize::LargeInput,
                );
            },
        );
    }

    group.finish();
}

/// Steady scrolling: one step down and back up, each with a frame.
fn benchmark_warm_scroll(c: &mut Criterion) {
    let texts = document();
    let mut group = c.benchmark_group("warm_scroll");

    for position in ScrollPosition::ALL {
        let mut engine = engine_at(&texts, position);
        engine.layout_viewport().unwrap();

        group.bench_function(BenchmarkId::new("position", position.name()), |b| {
            b.iter(|| {
                engine.scroll_by(SCROLL_STEP);
                black_box(engine.layout_viewport().unwrap());
                engine.scroll_by(-SCROLL_STEP);
                black_box(engine.layout_viewport().unwrap())
            });
        });
    }

    group.finish();
}

fn benchmark_load(c: &mut Criterion) {
    let texts = document();
    c.bench_function("load_texts", |b| {
        b.iter_batched(
            || texts.clone(),
            |texts| {
                let mut engine =
                    LazyLayoutEngine::new(MonospaceShaper::default(), EngineConfig::default());
                engine.load_texts(texts);
                black_box(engine.store().total_height())
            },
            BatchSize::LargeInput,
        );
    });
}

/// Height-index queries on a large document.
fn benchmark_height_index(c: &mut Criterion) {
    let len = 150_000;
    let heights: Vec<f64> = (0..len).map(|i| 20.0 * (1 + i % 4) as f64).collect();
    let mut index = HeightIndex::from_heights(heights).unwrap();
    let total = index.total_height();

    let mut group = c.benchmark_group("height_index");

    group.bench_function("prefix_sum", |b| {
        let mut i = 0;
        b.iter(|| {
            i = (i + 7919) % len;
            black_box(index.prefix_sum(i))
        });
    });

    group.bench_function("find_index_for_y", |b| {
        let mut y = 0.0;
        b.iter(|| {
            y = (y + 7919.5) % total;
            black_box(index.find_index_for_y(y))
        });
    });

    group.bench_function("set_height", |b| {
        let mut i = 0;
        b.iter(|| {
            i = (i + 7919) % len;
            black_box(index.set_height(i, 40.0).unwrap())
        });
    });

    group.bench_function("insert_remove", |b| {
        b.iter(|| {
            index.insert(len / 2, 20.0).unwrap();
            black_box(index.remove(len / 2).unwrap())
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_cold_frame,
    benchmark_warm_scroll,
    benchmark_load,
    benchmark_height_index
);
criterion_main!(benches);
