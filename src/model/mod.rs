//! Document model types (pure).
//!
//! Paragraph records, format runs and the ordered paragraph store.
//! Nothing in this module knows about viewports or text shaping.

pub mod error;
pub mod paragraph;
pub mod store;

// Re-export for convenience
pub use error::{DocumentError, ShapeError};
pub use paragraph::{FormatRun, HeightState, Paragraph, ParagraphData, StyleTag};
pub use store::{HeightEstimator, ParagraphChange, ParagraphStore};
