//! Text shaping boundary and shaped paragraph layouts
//!
//! The engine never shapes text itself: it hands paragraph text to a
//! [`TextShaper`] and caches the resulting [`ShapedParagraph`].

use super::layout_params::{Font, LayoutParams};
use crate::model::{FormatRun, ShapeError};
use unicode_width::UnicodeWidthChar;

/// One laid-out line of a paragraph.
///
/// Offsets are in chars relative to the paragraph start; `y` is relative to
/// the paragraph top.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapedLine {
    /// First char of the line (inclusive).
    pub start: usize,
    /// End char of the line (exclusive, hard breaks not included).
    pub end: usize,
    /// Top of the line relative to the paragraph top.
    pub y: f64,
    /// Line height.
    pub height: f64,
    /// Advance width of the line content.
    pub width: f64,
}

/// Line-break and hit-testing result for one paragraph.
///
/// # Invariants
/// - Lines are stacked without gaps: `lines[i + 1].y == lines[i].y + lines[i].height`
/// - `height()` is the sum of line heights
#[derive(Debug, Clone, PartialEq)]
pub struct ShapedParagraph {
    lines: Vec<ShapedLine>,
    height: f64,
}

impl ShapedParagraph {
    /// Build a layout from stacked lines.
    pub fn new(lines: Vec<ShapedLine>) -> Self {
        let height = lines.iter().map(|line| line.height).sum();
        Self { lines, height }
    }

    /// Measured paragraph height.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// All lines, top to bottom.
    pub fn lines(&self) -> &[ShapedLine] {
        &self.lines
    }

    /// Number of lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Index of the line containing a paragraph-local Y position.
    ///
    /// Returns `None` above the first line or at/below the paragraph bottom.
    pub fn line_at_y(&self, local_y: f64) -> Option<usize> {
        if local_y < 0.0 || local_y >= self.height {
            return None;
        }
        let index = self
            .lines
            .partition_point(|line| line.y + line.height <= local_y);
        (index < self.lines.len()).then_some(index)
    }

    /// Index of the line holding a char offset.
    ///
    /// An offset at the end of a soft-wrapped line belongs to that line.
    /// Returns `None` past the end of the text.
    pub fn line_for_offset(&self, char_offset: usize) -> Option<usize> {
        let index = self.lines.partition_point(|line| line.end < char_offset);
        (index < self.lines.len()).then_some(index)
    }
}

/// Text shaping / font-metrics provider.
///
/// Implementations must be deterministic: identical text, formats and params
/// produce identical layouts. The engine relies on this to skip reshaping.
pub trait TextShaper {
    /// Break a paragraph into lines at the given width and font.
    ///
    /// # Errors
    ///
    /// `ShapeError` for content that cannot be laid out. The engine keeps the
    /// paragraph's estimated height and does not retry until it changes.
    fn shape(
        &self,
        text: &str,
        formats: &[FormatRun],
        params: &LayoutParams,
    ) -> Result<ShapedParagraph, ShapeError>;

    /// Height of one line of text in the given font, used for estimates.
    fn line_height(&self, font: &Font) -> f64;
}

/// Deterministic fixed-pitch shaper.
///
/// Every glyph advances `pixel_size * advance_ratio` per terminal cell as
/// reported by `unicode-width`, lines are `pixel_size * line_spacing` tall,
/// and text wraps greedily at whitespace. Trailing whitespace hangs past the
/// right edge instead of forcing a break.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonospaceShaper {
    /// Cell advance as a fraction of the font's pixel size.
    pub advance_ratio: f64,
    /// Line height as a multiple of the font's pixel size.
    pub line_spacing: f64,
}

impl Default for MonospaceShaper {
    fn default() -> Self {
        Self {
            advance_ratio: 0.6,
            line_spacing: 1.25,
        }
    }
}

impl MonospaceShaper {
    /// Width of one cell in the given font.
    pub fn cell_width(&self, font: &Font) -> f64 {
        f64::from(font.pixel_size) * self.advance_ratio
    }

    /// Append the wrapped lines of one hard line starting at char `base`.
    fn wrap_hard_line(
        &self,
        chars: &[char],
        base: usize,
        columns: usize,
        cell: f64,
        line_height: f64,
        out: &mut Vec<ShapedLine>,
    ) {
        let emit = |start: usize, end: usize, cols: usize, out: &mut Vec<ShapedLine>| {
            let y = out.last().map_or(0.0, |l: &ShapedLine| l.y + l.height);
            out.push(ShapedLine {
                start: base + start,
                end: base + end,
                y,
                height: line_height,
                width: cols.min(columns) as f64 * cell,
            });
        };

        let mut line_start = 0;
        let mut line_cols = 0;
        // Char index just after the last whitespace, and the columns used up to it.
        let mut break_at = 0;
        let mut cols_at_break = 0;

        for (i, &c) in chars.iter().enumerate() {
            let w = c.width().unwrap_or(0);
            if !c.is_whitespace() && line_cols > 0 && line_cols + w > columns {
                if break_at > line_start {
                    emit(line_start, break_at, cols_at_break, out);
                    line_start = break_at;
                    line_cols -= cols_at_break;
                } else {
                    emit(line_start, i, line_cols, out);
                    line_start = i;
                    line_cols = 0;
                }
                break_at = line_start;
                cols_at_break = 0;
            }
            line_cols += w;
            if c.is_whitespace() {
                break_at = i + 1;
                cols_at_break = line_cols;
            }
        }
        emit(line_start, chars.len(), line_cols, out);
    }
}

impl TextShaper for MonospaceShaper {
    fn shape(
        &self,
        text: &str,
        _formats: &[FormatRun],
        params: &LayoutParams,
    ) -> Result<ShapedParagraph, ShapeError> {
        if text.contains('\0') {
            return Err(ShapeError::Unshapeable {
                reason: "NUL character in paragraph text".to_string(),
            });
        }
        let cell = self.cell_width(&params.font);
        if cell <= 0.0 || params.width.is_nan() || params.width < cell {
            return Err(ShapeError::WidthTooNarrow {
                width: params.width,
                min: cell,
            });
        }

        let columns = (params.width / cell).floor() as usize;
        let line_height = self.line_height(&params.font);

        let mut lines = Vec::new();
        let mut base = 0;
        for hard_line in text.split('\n') {
            let chars: Vec<char> = hard_line.chars().collect();
            self.wrap_hard_line(&chars, base, columns, cell, line_height, &mut lines);
            base += chars.len() + 1;
        }
        Ok(ShapedParagraph::new(lines))
    }

    fn line_height(&self, font: &Font) -> f64 {
        f64::from(font.pixel_size) * self.line_spacing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 10 px cells, 20 px lines, 10 columns.
    fn narrow_params() -> LayoutParams {
        LayoutParams::new(100.0, Font::new("monospace", 16))
    }

    fn shaper() -> MonospaceShaper {
        MonospaceShaper {
            advance_ratio: 0.625,
            line_spacing: 1.25,
        }
    }

    fn line_texts(text: &str, layout: &ShapedParagraph) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        layout
            .lines()
            .iter()
            .map(|l| chars[l.start..l.end].iter().collect())
            .collect()
    }

    mod monospace_shaper {
        use super::*;

        #[test]
        fn default_metrics_give_twenty_pixel_lines() {
            let shaper = MonospaceShaper::default();
            assert_eq!(shaper.line_height(&Font::default()), 20.0);
        }

        #[test]
        fn empty_text_is_one_line() {
            let layout = shaper().shape("", &[], &narrow_params()).unwrap();
            assert_eq!(layout.line_count(), 1);
            assert_eq!(layout.height(), 20.0);
        }

        #[test]
        fn short_text_fits_on_one_line() {
            let layout = shaper().shape("hello", &[], &narrow_params()).unwrap();
            assert_eq!(layout.line_count(), 1);
            assert_eq!(layout.lines()[0].width, 50.0);
        }

        #[test]
        fn wraps_at_whitespace() {
            let text = "aaaaaaa bbbbbbb ccccccc";
            let layout = shaper().shape(text, &[], &narrow_params()).unwrap();
            assert_eq!(
                line_texts(text, &layout),
                vec!["aaaaaaa ", "bbbbbbb ", "ccccccc"]
            );
            assert_eq!(layout.height(), 60.0);
        }

        #[test]
        fn trailing_space_hangs_past_edge() {
            let text = "alpha beta gamma";
            let layout = shaper().shape(text, &[], &narrow_params()).unwrap();
            assert_eq!(line_texts(text, &layout), vec!["alpha beta ", "gamma"]);
            assert_eq!(layout.lines()[0].width, 100.0);
        }

        #[test]
        fn hard_breaks_long_words() {
            let text = "abcdefghijklmnopqrstuvwxy";
            let layout = shaper().shape(text, &[], &narrow_params()).unwrap();
            assert_eq!(
                line_texts(text, &layout),
                vec!["abcdefghij", "klmnopqrst", "uvwxy"]
            );
        }

        #[test]
        fn newline_is_hard_break() {
            let text = "one\ntwo";
            let layout = shaper().shape(text, &[], &narrow_params()).unwrap();
            assert_eq!(line_texts(text, &layout), vec!["one", "two"]);
            assert_eq!(layout.lines()[1].start, 4);
        }

        #[test]
        fn wide_chars_take_two_cells() {
            let text = "漢字漢字漢字";
            let layout = shaper().shape(text, &[], &narrow_params()).unwrap();
            assert_eq!(line_texts(text, &layout), vec!["漢字漢字漢", "字"]);
        }

        #[test]
        fn lines_are_stacked() {
            let layout = shaper()
                .shape("aaa bbb ccc ddd eee fff", &[], &narrow_params())
                .unwrap();
            for pair in layout.lines().windows(2) {
                assert_eq!(pair[1].y, pair[0].y + pair[0].height);
            }
        }

        #[test]
        fn nul_character_is_unshapeable() {
            let err = shaper().shape("a\0b", &[], &narrow_params()).unwrap_err();
            assert!(matches!(err, ShapeError::Unshapeable { .. }));
        }

        #[test]
        fn width_below_one_cell_fails() {
            let params = LayoutParams::new(5.0, Font::new("monospace", 16));
            let err = shaper().shape("abc", &[], &params).unwrap_err();
            assert_eq!(
                err,
                ShapeError::WidthTooNarrow {
                    width: 5.0,
                    min: 10.0
                }
            );
        }

        #[test]
        fn identical_input_gives_identical_layout() {
            let a = shaper().shape("same text here", &[], &narrow_params());
            let b = shaper().shape("same text here", &[], &narrow_params());
            assert_eq!(a, b);
        }
    }

    mod hit_testing {
        use super::*;

        fn three_lines() -> ShapedParagraph {
            shaper()
                .shape("aaaaaaa bbbbbbb ccccccc", &[], &narrow_params())
                .unwrap()
        }

        #[test]
        fn line_at_y_finds_containing_line() {
            let layout = three_lines();
            assert_eq!(layout.line_at_y(0.0), Some(0));
            assert_eq!(layout.line_at_y(19.9), Some(0));
            assert_eq!(layout.line_at_y(20.0), Some(1));
            assert_eq!(layout.line_at_y(59.0), Some(2));
        }

        #[test]
        fn line_at_y_outside_paragraph_is_none() {
            let layout = three_lines();
            assert_eq!(layout.line_at_y(-1.0), None);
            assert_eq!(layout.line_at_y(60.0), None);
        }

        #[test]
        fn line_for_offset_keeps_wrap_point_on_upper_line() {
            let layout = three_lines();
            assert_eq!(layout.line_for_offset(0), Some(0));
            assert_eq!(layout.line_for_offset(8), Some(0));
            assert_eq!(layout.line_for_offset(9), Some(1));
            assert_eq!(layout.line_for_offset(23), Some(2));
            assert_eq!(layout.line_for_offset(24), None);
        }
    }
}
