//! Shared helpers for integration tests.

#![allow(dead_code)]

use parlay::model::{FormatRun, ShapeError};
use parlay::view_state::{
    EngineConfig, Font, LayoutParams, LazyLayoutEngine, ShapedLine, ShapedParagraph, TextShaper,
};
use std::cell::Cell;

/// Pixels per character column.
pub const COLUMN_WIDTH: f64 = 10.0;
/// Pixels per line.
pub const LINE_HEIGHT: f64 = 20.0;

/// Deterministic stub shaper that counts its calls.
///
/// Wraps every `width / COLUMN_WIDTH` chars, `LINE_HEIGHT` per line, at
/// least one line. Text starting with `!` fails to shape.
#[derive(Debug, Default)]
pub struct CountingShaper {
    calls: Cell<usize>,
}

impl CountingShaper {
    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl TextShaper for CountingShaper {
    fn shape(
        &self,
        text: &str,
        _formats: &[FormatRun],
        params: &LayoutParams,
    ) -> Result<ShapedParagraph, ShapeError> {
        self.calls.set(self.calls.get() + 1);
        if text.starts_with('!') {
            return Err(ShapeError::Unshapeable {
                reason: "leading bang".to_string(),
            });
        }
        let columns = ((params.width / COLUMN_WIDTH).floor() as usize).max(1);
        let chars = text.chars().count();
        let line_count = chars.div_ceil(columns).max(1);
        let lines = (0..line_count)
            .map(|i| ShapedLine {
                start: i * columns,
                end: ((i + 1) * columns).min(chars),
                y: i as f64 * LINE_HEIGHT,
                height: LINE_HEIGHT,
                width: ((((i + 1) * columns).min(chars) - i * columns) as f64) * COLUMN_WIDTH,
            })
            .collect();
        Ok(ShapedParagraph::new(lines))
    }

    fn line_height(&self, _font: &Font) -> f64 {
        LINE_HEIGHT
    }
}

/// Engine with an 800px layout width (80 columns), matching the default
/// estimator, so one-line paragraphs estimate and measure at 20px.
pub fn engine(config: EngineConfig) -> LazyLayoutEngine<CountingShaper> {
    LazyLayoutEngine::new(
        CountingShaper::default(),
        EngineConfig {
            params: LayoutParams::new(800.0, Font::default()),
            ..config
        },
    )
}

/// `count` short one-line paragraphs with distinct text.
pub fn short_paragraphs(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("paragraph {i}")).collect()
}
