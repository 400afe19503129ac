//! Parlay - paragraph document model and lazy layout engine
//!
//! Keeps a text editor responsive on documents with hundreds of thousands of
//! words by only laying out the paragraphs near the viewport.
//!
//! The crate follows a Pure Core / Impure Shell split:
//! - `model`: paragraph storage, format runs and the error taxonomy
//! - `view_state`: height index, viewport, layout cache and the lazy engine
//! - `config` / `logging`: ambient shell used by the `parlay` binary

pub mod config;
pub mod logging;
pub mod model;
pub mod view_state;
