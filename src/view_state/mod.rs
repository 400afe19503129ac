//! View-state layer - Height index, viewport, layout cache and lazy layout
//!
//! This module maps the paragraph document onto pixel space: where each
//! paragraph sits, which paragraphs a viewport shows, and which of them
//! have a shaped layout ready to paint.
//!
//! # Module Structure
//!
//! - `types`: Geometry values (ViewportDimensions, ParagraphRect)
//! - `visible_range`: ParagraphRange - inclusive index range from viewport queries
//! - `height_index`: HeightIndex - O(log n) prefix sums via Fenwick tree
//! - `layout_params`: Font and LayoutParams - inputs that invalidate layouts
//! - `layout`: TextShaper boundary, ShapedParagraph, MonospaceShaper
//! - `cache`: LayoutCache - bounded LRU of shaped layouts
//! - `scroll`: ScrollPosition - semantic scroll position enum
//! - `hit_test`: HitTestResult - result of pointer hit-testing
//! - `viewport`: Viewport and BufferPolicy
//! - `engine`: LazyLayoutEngine - ties the store, cache and viewport together

pub mod cache;
pub mod engine;
pub mod height_index;
pub mod hit_test;
pub mod layout;
pub mod layout_params;
pub mod scroll;
pub mod types;
pub mod viewport;
pub mod visible_range;

pub use engine::{DocumentObserver, EngineConfig, LayoutPass, LazyLayoutEngine};
pub use layout::{MonospaceShaper, ShapedLine, ShapedParagraph, TextShaper};
pub use layout_params::{Font, LayoutParams};
pub use viewport::{BufferPolicy, Viewport};
pub use visible_range::ParagraphRange;
