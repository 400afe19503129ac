//! Error types for the document model and layout engine.
//!
//! This module defines the error taxonomy using `thiserror`. Errors are local to
//! a single paragraph or operation; there is no global error state.
//!
//! # Error Hierarchy
//!
//! - [`DocumentError`] - caller passed an index, range, height, width or format
//!   run that does not fit the current document. Reported, never silently clamped.
//! - [`ShapeError`] - the text shaper could not lay out a paragraph. Non-fatal:
//!   the paragraph keeps its estimated height and the failure is reported once.
//!
//! Divergence between the paragraph list and the height index is a programming
//! error and is caught by debug assertions instead of an error variant.

use thiserror::Error;

/// Failures of index-taking document and layout operations.
///
/// # Recovery Behavior
///
/// Every variant carries the offending value and the bound it was checked
/// against, so off-by-one bugs in index-shifting callers show up in the message.
///
/// # Examples
///
/// ```
/// use parlay::model::error::DocumentError;
///
/// let err = DocumentError::IndexOutOfRange {
///     operation: "remove_paragraph",
///     index: 5,
///     len: 5,
/// };
/// assert_eq!(
///     err.to_string(),
///     "remove_paragraph: index 5 out of range (len 5)"
/// );
/// ```
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DocumentError {
    /// A paragraph index was outside the valid bounds for the operation.
    ///
    /// Reads and removals accept `[0, len)`, insertions accept `[0, len]`.
    #[error("{operation}: index {index} out of range (len {len})")]
    IndexOutOfRange {
        /// Operation that rejected the index.
        operation: &'static str,
        /// Index supplied by the caller.
        index: usize,
        /// Paragraph count at the time of the call.
        len: usize,
    },

    /// An inclusive paragraph range was empty or reached past the document end.
    #[error("invalid paragraph range [{first}, {last}] (len {len})")]
    InvalidRange {
        /// First index of the requested range.
        first: usize,
        /// Last index (inclusive) of the requested range.
        last: usize,
        /// Paragraph count at the time of the call.
        len: usize,
    },

    /// A height was negative or not a number.
    #[error("invalid height {height} for paragraph {index}")]
    InvalidHeight {
        /// Paragraph whose height was being set.
        index: usize,
        /// Rejected value.
        height: f64,
    },

    /// A format run did not fit the paragraph text or partially overlapped another run.
    #[error("invalid format run {start}+{len} in paragraph {index}: {reason}")]
    InvalidFormatRun {
        /// Paragraph the run belongs to.
        index: usize,
        /// Run start offset in chars.
        start: usize,
        /// Run length in chars.
        len: usize,
        /// Why the run was rejected.
        reason: &'static str,
    },

    /// A layout width was zero, negative or not finite.
    #[error("invalid layout width {width}")]
    InvalidWidth {
        /// Rejected value.
        width: f64,
    },

    /// A char offset inside a paragraph was past the end of its text.
    #[error("offset {offset} out of range in paragraph {index} (len {len})")]
    OffsetOutOfRange {
        /// Paragraph being edited.
        index: usize,
        /// Offending char offset (or end offset of a deletion).
        offset: usize,
        /// Paragraph length in chars.
        len: usize,
    },
}

/// Failures reported by a [`TextShaper`](crate::view_state::layout::TextShaper).
///
/// Shaping failures are non-fatal. The engine logs them once per paragraph and
/// layout configuration and does not retry until the text, width or font changes.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ShapeError {
    /// The text contains content the shaper cannot lay out.
    #[error("unshapeable content: {reason}")]
    Unshapeable {
        /// Description of the offending content.
        reason: String,
    },

    /// The layout width cannot fit even a single glyph cell.
    #[error("layout width {width} is narrower than one glyph cell ({min})")]
    WidthTooNarrow {
        /// Configured layout width in pixels.
        width: f64,
        /// Minimum width required.
        min: f64,
    },
}
