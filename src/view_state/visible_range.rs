//! Paragraph range produced by viewport queries

use crate::model::DocumentError;

/// Inclusive range of paragraph indices, `first..=last`.
///
/// Produced by [`Viewport::visible_range`](super::viewport::Viewport::visible_range)
/// and [`Viewport::buffered_range`](super::viewport::Viewport::buffered_range)
/// and accepted by the layout engine's range operations.
///
/// # Invariants
/// - `first <= last`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParagraphRange {
    /// Index of the first paragraph (inclusive).
    pub first: usize,
    /// Index of the last paragraph (inclusive).
    pub last: usize,
}

impl ParagraphRange {
    /// Create a new range.
    ///
    /// # Panics
    /// In debug builds, panics if `first > last`.
    pub fn new(first: usize, last: usize) -> Self {
        debug_assert!(first <= last, "range start {first} after end {last}");
        Self { first, last }
    }

    /// Validate a caller-supplied range against a paragraph count.
    ///
    /// # Errors
    ///
    /// `DocumentError::InvalidRange` if `first > last` or `last >= len`.
    pub fn checked(first: usize, last: usize, len: usize) -> Result<Self, DocumentError> {
        if first > last || last >= len {
            Err(DocumentError::InvalidRange { first, last, len })
        } else {
            Ok(Self { first, last })
        }
    }

    /// Number of paragraphs in the range (always >= 1).
    pub fn len(&self) -> usize {
        self.last - self.first + 1
    }

    /// Always false: a range holds at least one paragraph.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Iterate over the paragraph indices.
    pub fn indices(&self) -> std::ops::RangeInclusive<usize> {
        self.first..=self.last
    }

    /// Check if a paragraph index is inside the range.
    pub fn contains(&self, index: usize) -> bool {
        index >= self.first && index <= self.last
    }

    /// Grow the range by `amount` paragraphs on each side, clamped to `[0, len)`.
    pub fn expand(&self, amount: usize, len: usize) -> Self {
        let last_valid = len.saturating_sub(1);
        Self {
            first: self.first.saturating_sub(amount).min(last_valid),
            last: self.last.saturating_add(amount).min(last_valid),
        }
    }
}
