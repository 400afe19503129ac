//! Viewport over a height-indexed document
//!
//! Holds the scroll offset, the visible size and the buffer policy. All
//! ranges are derived on demand from a [`HeightIndex`]; the viewport never
//! owns document data.

use super::height_index::HeightIndex;
use super::scroll::ScrollPosition;
use super::types::ViewportDimensions;
use super::visible_range::ParagraphRange;
use crate::model::DocumentError;

/// Default paragraph margin above and below the visible band.
pub const DEFAULT_BUFFER_PARAGRAPHS: usize = 50;

/// Default pixel margin above and below the visible band.
pub const DEFAULT_BUFFER_PIXELS: f64 = 1000.0;

/// Smallest scrollbar thumb, as a fraction of the track.
pub const MIN_SCROLLBAR_THUMB: f64 = 0.05;

/// How far beyond the visible band paragraphs are kept laid out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BufferPolicy {
    /// Fixed number of paragraphs on each side.
    Paragraphs(usize),
    /// Fixed pixel distance on each side.
    Pixels(f64),
}

impl Default for BufferPolicy {
    fn default() -> Self {
        Self::Paragraphs(DEFAULT_BUFFER_PARAGRAPHS)
    }
}

/// Scroll offset plus visible size.
///
/// # Invariants
/// - `scroll_y` stays inside `[0, max_scroll]` for the index it was last
///   clamped against
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Viewport {
    scroll_y: f64,
    dimensions: ViewportDimensions,
    buffer: BufferPolicy,
}

fn sanitize_extent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.max(0.0)
    }
}

impl Viewport {
    /// Create a viewport at the top with zero size.
    pub fn new(buffer: BufferPolicy) -> Self {
        Self {
            scroll_y: 0.0,
            dimensions: ViewportDimensions::default(),
            buffer,
        }
    }

    /// Current scroll offset.
    pub fn scroll_y(&self) -> f64 {
        self.scroll_y
    }

    /// Visible size.
    pub fn dimensions(&self) -> ViewportDimensions {
        self.dimensions
    }

    /// Visible height.
    pub fn height(&self) -> f64 {
        self.dimensions.height
    }

    /// Buffer policy in effect.
    pub fn buffer_policy(&self) -> BufferPolicy {
        self.buffer
    }

    /// Replace the buffer policy.
    pub fn set_buffer_policy(&mut self, buffer: BufferPolicy) {
        self.buffer = buffer;
    }

    /// Set the visible width. Width does not affect vertical queries.
    pub fn set_width(&mut self, width: f64) {
        self.dimensions.width = sanitize_extent(width);
    }

    /// Set scroll offset and visible height, clamping the offset.
    ///
    /// Returns the clamped offset.
    pub fn set_viewport(&mut self, scroll_y: f64, height: f64, heights: &HeightIndex) -> f64 {
        self.dimensions.height = sanitize_extent(height);
        self.scroll_y = self.clamp(scroll_y, heights);
        self.scroll_y
    }

    /// Largest valid scroll offset.
    pub fn max_scroll(&self, heights: &HeightIndex) -> f64 {
        (heights.total_height() - self.dimensions.height).max(0.0)
    }

    /// Re-clamp the offset after the document height changed.
    pub fn reclamp(&mut self, heights: &HeightIndex) -> f64 {
        self.scroll_y = self.clamp(self.scroll_y, heights);
        self.scroll_y
    }

    /// Scroll by a pixel delta.
    pub fn scroll_by(&mut self, delta: f64, heights: &HeightIndex) -> f64 {
        self.scroll_y = self.clamp(self.scroll_y + delta, heights);
        self.scroll_y
    }

    /// Scroll to a semantic position.
    pub fn scroll_to(&mut self, position: &ScrollPosition, heights: &HeightIndex) -> f64 {
        self.scroll_y = position.resolve(heights.total_height(), self.dimensions.height, |i| {
            (i < heights.len()).then(|| heights.prefix_sum(i))
        });
        self.scroll_y
    }

    /// Bring a whole paragraph into view with the smallest scroll change.
    ///
    /// # Errors
    ///
    /// `DocumentError::IndexOutOfRange` if `index >= heights.len()`.
    pub fn scroll_to_paragraph(
        &mut self,
        index: usize,
        heights: &HeightIndex,
    ) -> Result<f64, DocumentError> {
        let height = heights
            .height(index)
            .ok_or(DocumentError::IndexOutOfRange {
                operation: "Viewport::scroll_to_paragraph",
                index,
                len: heights.len(),
            })?;
        self.scroll_to_position(index, 0.0, height, heights)
    }

    /// Bring a band inside a paragraph into view with the smallest scroll
    /// change.
    ///
    /// A band already fully visible leaves the offset unchanged. A band above
    /// the viewport aligns to the top edge; one below aligns to the bottom
    /// edge unless it is taller than the viewport, in which case its top is
    /// shown.
    ///
    /// # Errors
    ///
    /// `DocumentError::IndexOutOfRange` if `index >= heights.len()`.
    pub fn scroll_to_position(
        &mut self,
        index: usize,
        local_top: f64,
        local_height: f64,
        heights: &HeightIndex,
    ) -> Result<f64, DocumentError> {
        if index >= heights.len() {
            return Err(DocumentError::IndexOutOfRange {
                operation: "Viewport::scroll_to_position",
                index,
                len: heights.len(),
            });
        }
        let top = heights.prefix_sum(index) + local_top;
        let bottom = top + sanitize_extent(local_height);
        let view_bottom = self.scroll_y + self.dimensions.height;

        let target = if top >= self.scroll_y && bottom <= view_bottom {
            self.scroll_y
        } else if top < self.scroll_y || bottom - top > self.dimensions.height {
            top
        } else {
            bottom - self.dimensions.height
        };
        self.scroll_y = self.clamp(target, heights);
        Ok(self.scroll_y)
    }

    /// Paragraphs intersecting `[scroll_y, scroll_y + height)`.
    ///
    /// `None` for an empty document or a zero-height viewport.
    pub fn visible_range(&self, heights: &HeightIndex) -> Option<ParagraphRange> {
        if heights.is_empty() || self.dimensions.height <= 0.0 {
            return None;
        }
        let last_valid = heights.len() - 1;
        let first = heights.find_index_for_y(self.scroll_y).min(last_valid);
        let bottom = self.scroll_y + self.dimensions.height;
        let last = heights
            .find_index_before_y(bottom)
            .clamp(first, last_valid);
        Some(ParagraphRange::new(first, last))
    }

    /// Visible range widened by the buffer policy.
    pub fn buffered_range(&self, heights: &HeightIndex) -> Option<ParagraphRange> {
        let visible = self.visible_range(heights)?;
        let range = match self.buffer {
            BufferPolicy::Paragraphs(count) => visible.expand(count, heights.len()),
            BufferPolicy::Pixels(pixels) => {
                let pixels = sanitize_extent(pixels);
                let last_valid = heights.len() - 1;
                let first = heights
                    .find_index_for_y(self.scroll_y - pixels)
                    .min(visible.first);
                let bottom = self.scroll_y + self.dimensions.height + pixels;
                let last = heights
                    .find_index_before_y(bottom)
                    .clamp(visible.last, last_valid);
                ParagraphRange::new(first, last)
            }
        };
        Some(range)
    }

    /// Whether a paragraph intersects the visible band.
    pub fn is_paragraph_visible(&self, index: usize, heights: &HeightIndex) -> bool {
        self.visible_range(heights)
            .is_some_and(|range| range.contains(index))
    }

    /// Whether a paragraph lies inside the buffered band.
    pub fn is_paragraph_buffered(&self, index: usize, heights: &HeightIndex) -> bool {
        self.buffered_range(heights)
            .is_some_and(|range| range.contains(index))
    }

    /// Scroll progress in `[0, 1]`; zero when nothing can scroll.
    pub fn scrollbar_position(&self, heights: &HeightIndex) -> f64 {
        let max = self.max_scroll(heights);
        if max <= 0.0 {
            0.0
        } else {
            (self.scroll_y / max).clamp(0.0, 1.0)
        }
    }

    /// Thumb length as a fraction of the track, clamped to
    /// `[MIN_SCROLLBAR_THUMB, 1]`.
    pub fn scrollbar_thumb_size(&self, heights: &HeightIndex) -> f64 {
        let total = heights.total_height();
        if total <= 0.0 {
            return 1.0;
        }
        (self.dimensions.height / total).clamp(MIN_SCROLLBAR_THUMB, 1.0)
    }

    /// Scroll to a fraction of the scroll range.
    pub fn set_scrollbar_position(&mut self, fraction: f64, heights: &HeightIndex) -> f64 {
        self.scroll_to(&ScrollPosition::Fraction(fraction), heights)
    }

    /// Whether the document is taller than the viewport.
    pub fn is_scrollbar_needed(&self, heights: &HeightIndex) -> bool {
        heights.total_height() > self.dimensions.height
    }

    /// Convert a viewport-relative Y to a document Y.
    pub fn to_document_y(&self, viewport_y: f64) -> f64 {
        self.scroll_y + viewport_y
    }

    /// Convert a document Y to a viewport-relative Y.
    pub fn to_viewport_y(&self, document_y: f64) -> f64 {
        document_y - self.scroll_y
    }

    fn clamp(&self, scroll_y: f64, heights: &HeightIndex) -> f64 {
        if scroll_y.is_nan() {
            return 0.0;
        }
        scroll_y.clamp(0.0, self.max_scroll(heights))
    }
}
