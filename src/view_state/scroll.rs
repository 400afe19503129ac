//! Semantic scroll position

/// Semantic scroll position within a document.
///
/// A sum type that preserves scroll intent across height corrections:
/// - `Top`: Always shows from y = 0
/// - `Bottom`: Always shows the last pixels of the document
/// - `AtY`: Specific absolute document offset
/// - `AtParagraph`: Keep a specific paragraph at the top (survives relayout)
/// - `Fraction`: Proportional position (for scrollbar)
///
/// # Clamping Behavior
/// Every variant resolves into `[0, max(0, total_height - viewport_height)]`,
/// so no request can produce a blank viewport.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ScrollPosition {
    /// View from the very top.
    #[default]
    Top,

    /// View from the very bottom.
    Bottom,

    /// Specific document Y offset.
    AtY(f64),

    /// Keep a paragraph at the top of the viewport.
    AtParagraph {
        /// Paragraph index.
        index: usize,
        /// Offset below the paragraph top.
        offset: f64,
    },

    /// Fractional position (0.0 = top, 1.0 = bottom), clamped to [0, 1].
    Fraction(f64),
}

impl ScrollPosition {
    /// Resolve to an absolute scroll offset.
    ///
    /// `paragraph_y` maps a paragraph index to its document Y; an unknown
    /// paragraph resolves to the top.
    pub fn resolve<F>(&self, total_height: f64, viewport_height: f64, paragraph_y: F) -> f64
    where
        F: Fn(usize) -> Option<f64>,
    {
        let max_offset = (total_height - viewport_height).max(0.0);
        let raw = match self {
            Self::Top => 0.0,
            Self::Bottom => max_offset,
            Self::AtY(y) => *y,
            Self::AtParagraph { index, offset } => {
                paragraph_y(*index).map_or(0.0, |y| y + offset)
            }
            Self::Fraction(f) => {
                if f.is_nan() {
                    0.0
                } else {
                    f.clamp(0.0, 1.0) * max_offset
                }
            }
        };
        if raw.is_nan() {
            0.0
        } else {
            raw.clamp(0.0, max_offset)
        }
    }

    /// Create an `AtParagraph` position at the paragraph top.
    pub fn at_paragraph(index: usize) -> Self {
        Self::AtParagraph { index, offset: 0.0 }
    }
}
