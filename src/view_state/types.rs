//! Core view-state geometry types

/// Viewport size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewportDimensions {
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl ViewportDimensions {
    /// Create new viewport dimensions.
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Document-space rectangle occupied by one paragraph.
///
/// Paragraphs span the full layout width, so only the vertical extent varies.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ParagraphRect {
    /// Y position of the paragraph top (sum of all preceding heights).
    pub y: f64,
    /// Paragraph height.
    pub height: f64,
    /// Layout width.
    pub width: f64,
}

impl ParagraphRect {
    /// Create a new rectangle.
    pub fn new(y: f64, height: f64, width: f64) -> Self {
        Self { y, height, width }
    }

    /// Y position just below the paragraph.
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Check if a document Y position falls inside `[y, bottom)`.
    pub fn contains_y(&self, y: f64) -> bool {
        y >= self.y && y < self.bottom()
    }
}
