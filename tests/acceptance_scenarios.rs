//! End-to-end scenarios for the paragraph store and lazy layout engine.

mod common;

use common::{engine, short_paragraphs, LINE_HEIGHT};
use parlay::model::{DocumentError, HeightState, ParagraphChange};
use parlay::view_state::height_index::HeightIndex;
use parlay::view_state::hit_test::HitTestResult;
use parlay::view_state::{BufferPolicy, EngineConfig, ParagraphRange};

// ===== Height index scenario =====

#[test]
fn hundred_paragraphs_visible_range_and_height_correction() {
    let mut index = HeightIndex::with_len(100, 20.0);
    assert_eq!(index.prefix_sum(10), 200.0);
    assert_eq!(index.prefix_sum(15), 300.0);

    let total_before = index.total_height();
    let prefix_12 = index.prefix_sum(12);
    let prefix_13 = index.prefix_sum(13);

    index.set_height(12, 40.0).unwrap();

    assert_eq!(index.total_height(), total_before + 20.0);
    assert_eq!(index.prefix_sum(13), prefix_13 + 20.0);
    assert_eq!(index.prefix_sum(12), prefix_12);
}

#[test]
fn engine_reports_visible_range_from_estimates() {
    let mut engine = engine(EngineConfig::default());
    engine.load_texts(short_paragraphs(100));
    assert_eq!(engine.store().total_height(), 2000.0);

    engine.set_viewport(200.0, 100.0);

    assert_eq!(engine.visible_range(), Some(ParagraphRange::new(10, 14)));
}

#[test]
fn measured_height_replaces_estimate_in_prefix_sums() {
    let mut engine = engine(EngineConfig::default());
    let mut texts = short_paragraphs(100);
    // 120 chars at 80 columns: estimated and shaped as two lines.
    texts[12] = "x".repeat(120);
    engine.load_texts(texts);
    assert_eq!(engine.store().paragraph_height(12), Ok(40.0));

    // Narrower layout makes paragraph 12 three lines tall once shaped.
    engine.set_width(500.0).unwrap();
    let total_before = engine.store().total_height();
    let y_12 = engine.store().paragraph_y(12).unwrap();
    let y_13 = engine.store().paragraph_y(13).unwrap();

    engine.ensure_layouted(12, 12).unwrap();

    assert_eq!(engine.store().height_state(12), Ok(HeightState::Measured));
    assert_eq!(engine.store().paragraph_height(12), Ok(60.0));
    assert_eq!(engine.store().total_height(), total_before + 20.0);
    assert_eq!(engine.store().paragraph_y(13), Ok(y_13 + 20.0));
    assert_eq!(engine.store().paragraph_y(12), Ok(y_12));
}

// ===== Index shifting =====

#[test]
fn insert_at_front_shifts_cached_layouts_up() {
    let mut engine = engine(EngineConfig::default());
    let texts: Vec<String> = (0..50).map(|i| "w".repeat(70 + i * 10)).collect();
    engine.load_texts(texts);
    engine.ensure_layouted(0, 10).unwrap();

    let layout_5 = engine.peek_layout(5).cloned().unwrap();
    let layout_4 = engine.peek_layout(4).cloned().unwrap();
    assert_ne!(layout_5, layout_4);
    let calls = engine.shaper().calls();

    let change = engine.insert_paragraph(0, "fresh").unwrap();

    assert_eq!(change, ParagraphChange::Inserted { index: 0 });
    assert_eq!(engine.store().paragraph_count(), 51);
    assert!(!engine.has_layout(0), "new paragraph is not laid out yet");
    assert_eq!(engine.peek_layout(6), Some(&layout_5));
    assert_eq!(engine.peek_layout(5), Some(&layout_4));
    assert_eq!(
        engine.store().paragraph_height(6),
        Ok(layout_5.height()),
        "measured height moved with the paragraph"
    );
    assert_eq!(engine.store().height_state(6), Ok(HeightState::Measured));
    assert_eq!(engine.shaper().calls(), calls, "shifting never reshapes");
}

#[test]
fn remove_shifts_cached_layouts_down_and_drops_the_removed_one() {
    let mut engine = engine(EngineConfig::default());
    let texts: Vec<String> = (0..20).map(|i| "w".repeat(70 + i * 10)).collect();
    engine.load_texts(texts);
    engine.ensure_layouted(0, 9).unwrap();
    let layout_7 = engine.peek_layout(7).cloned().unwrap();

    engine.remove_paragraph(3).unwrap();

    assert_eq!(engine.layout_count(), 9);
    assert_eq!(engine.peek_layout(6), Some(&layout_7));
    assert!(!engine.has_layout(9), "old index 10 was never laid out");
}

#[test]
fn editing_text_invalidates_only_that_paragraph() {
    let mut engine = engine(EngineConfig::default());
    engine.load_texts(short_paragraphs(10));
    engine.ensure_layouted(0, 9).unwrap();

    engine.insert_text(4, 0, "edited ").unwrap();

    assert!(!engine.has_layout(4));
    assert!(engine.has_layout(3) && engine.has_layout(5));
    assert_eq!(engine.store().height_state(4), Ok(HeightState::Estimated));
    assert_eq!(engine.store().paragraph_text(4), Ok("edited paragraph 4"));

    let pass = engine.ensure_layouted(0, 9).unwrap();
    assert_eq!(pass.shaped, 1);
    assert_eq!(pass.skipped, 9);
}

// ===== Error handling =====

#[test]
fn out_of_range_indices_fail_fast() {
    let mut engine = engine(EngineConfig::default());
    engine.load_texts(short_paragraphs(50));

    assert!(matches!(
        engine.remove_paragraph(50),
        Err(DocumentError::IndexOutOfRange { index: 50, len: 50, .. })
    ));
    assert!(matches!(
        engine.ensure_layouted(40, 50),
        Err(DocumentError::InvalidRange { .. })
    ));
    assert!(matches!(
        engine.ensure_layouted(10, 5),
        Err(DocumentError::InvalidRange { .. })
    ));
    assert!(engine.paragraph_rect(50).is_err());
    assert!(engine.insert_paragraph(51, "late").is_err());
    assert!(engine.insert_paragraph(50, "end").is_ok());
    assert_eq!(engine.store().paragraph_count(), 51);
}

#[test]
fn shaping_failure_keeps_estimate_and_is_not_retried() {
    let mut engine = engine(EngineConfig::default());
    let mut texts = short_paragraphs(10);
    texts[3] = "!broken".to_string();
    engine.load_texts(texts);

    let first = engine.ensure_layouted(0, 9).unwrap();
    assert_eq!(first.failed, 1);
    assert_eq!(first.shaped, 9);
    assert_eq!(engine.failed_paragraph_count(), 1);
    assert_eq!(engine.store().height_state(3), Ok(HeightState::Estimated));
    assert_eq!(engine.store().paragraph_height(3), Ok(LINE_HEIGHT));

    let calls = engine.shaper().calls();
    let second = engine.ensure_layouted(0, 9).unwrap();
    assert_eq!(second.failed, 0);
    assert_eq!(engine.shaper().calls(), calls);

    engine.set_paragraph_text(3, "fixed").unwrap();
    let third = engine.ensure_layouted(0, 9).unwrap();
    assert_eq!(third.shaped, 1);
    assert_eq!(engine.failed_paragraph_count(), 0);
}

// ===== Layout params =====

#[test]
fn width_round_trip_revalidates_without_reshaping() {
    let mut engine = engine(EngineConfig::default());
    engine.load_texts(short_paragraphs(30));
    engine.set_viewport(0.0, 200.0);
    engine.layout_viewport().unwrap();
    let cached = engine.layout_count();
    assert!(cached > 0);

    engine.set_width(400.0).unwrap();
    assert!((0..30).all(|i| !engine.has_layout(i)));
    assert_eq!(engine.store().measured_count(), 0);
    assert_eq!(engine.layout_count(), cached, "dirty entries stay cached");

    engine.set_width(800.0).unwrap();
    let calls = engine.shaper().calls();
    let pass = engine.layout_viewport().unwrap();

    assert_eq!(pass.shaped, 0);
    assert_eq!(pass.revalidated, cached);
    assert_eq!(engine.shaper().calls(), calls);
}

// ===== Viewport-driven layout =====

#[test]
fn layout_viewport_lays_out_buffer_band_only() {
    let mut engine = engine(EngineConfig {
        buffer: BufferPolicy::Paragraphs(5),
        ..EngineConfig::default()
    });
    engine.load_texts(short_paragraphs(1000));
    engine.set_viewport(10_000.0, 100.0);

    let pass = engine.layout_viewport().unwrap();

    // Visible 500..=504 plus five on each side.
    assert_eq!(pass.shaped, 15);
    assert_eq!(engine.buffered_range(), Some(ParagraphRange::new(495, 509)));
    assert!(engine.has_layout(495) && engine.has_layout(509));
    assert!(!engine.has_layout(494) && !engine.has_layout(510));
}

#[test]
fn pixel_buffer_policy_widens_by_distance() {
    let mut engine = engine(EngineConfig {
        buffer: BufferPolicy::Pixels(100.0),
        ..EngineConfig::default()
    });
    engine.load_texts(short_paragraphs(100));
    engine.set_viewport(400.0, 100.0);

    // Visible 20..=24; the band reaches 300..600px.
    assert_eq!(engine.visible_range(), Some(ParagraphRange::new(20, 24)));
    assert_eq!(engine.buffered_range(), Some(ParagraphRange::new(15, 29)));
}

#[test]
fn scrolling_evicts_distant_layouts() {
    let mut engine = engine(EngineConfig {
        buffer: BufferPolicy::Paragraphs(2),
        ..EngineConfig::default()
    });
    engine.load_texts(short_paragraphs(200));
    engine.set_viewport(0.0, 100.0);
    engine.layout_viewport().unwrap();
    assert!(engine.has_layout(0));

    engine.scroll_by(2000.0);
    engine.layout_viewport().unwrap();

    assert!(!engine.has_layout(0));
    let band = engine.buffered_range().unwrap();
    assert!(band.indices().all(|i| engine.has_layout(i)));
    assert_eq!(engine.layout_count(), band.len());
}

#[test]
fn first_visible_paragraph_stays_put_when_heights_above_change() {
    let mut engine = engine(EngineConfig {
        buffer: BufferPolicy::Paragraphs(20),
        ..EngineConfig::default()
    });
    // Each paragraph is estimated at one line but shapes to three at 400px.
    let texts: Vec<String> = (0..100).map(|_| "z".repeat(100)).collect();
    engine.load_texts(texts);
    engine.set_width(400.0).unwrap();
    assert_eq!(engine.store().paragraph_height(0), Ok(40.0));

    engine.set_viewport(1210.0, 200.0);
    let first = engine.visible_range().unwrap().first;
    let offset = engine.viewport().scroll_y() - engine.store().paragraph_y(first).unwrap();

    engine.layout_viewport().unwrap();

    let after = engine.visible_range().unwrap();
    assert_eq!(after.first, first);
    let new_offset = engine.viewport().scroll_y() - engine.store().paragraph_y(first).unwrap();
    assert_eq!(new_offset, offset);
    assert!(after.indices().all(|i| engine.has_layout(i)));
}

#[test]
fn hit_test_finds_paragraph_and_line() {
    let mut engine = engine(EngineConfig::default());
    let mut texts = short_paragraphs(10);
    texts[2] = "q".repeat(200);
    engine.load_texts(texts);
    engine.set_viewport(0.0, 300.0);
    engine.layout_viewport().unwrap();

    // Paragraph 2 starts at 40px and is three lines tall.
    match engine.hit_test(85.0) {
        HitTestResult::Hit {
            paragraph,
            line,
            local_y,
        } => {
            assert_eq!(paragraph, 2);
            assert_eq!(line, Some(2));
            assert_eq!(local_y, 45.0);
        }
        HitTestResult::Miss => panic!("expected a hit"),
    }
    assert_eq!(engine.hit_test(10_000.0), HitTestResult::Miss);
}

#[test]
fn scroll_to_paragraph_brings_it_into_view() {
    let mut engine = engine(EngineConfig::default());
    engine.load_texts(short_paragraphs(100));
    engine.set_viewport(0.0, 100.0);

    engine.scroll_to_paragraph(50).unwrap();

    assert!(engine.visible_range().unwrap().contains(50));
    assert!(engine.scroll_to_paragraph(100).is_err());
}
