//! Ordered paragraph store with a height index kept in lock-step.
//!
//! Every mutation updates the paragraph list first and the height index
//! second, inside one call, so no caller can observe the two disagreeing
//! about the paragraph count.

use super::error::DocumentError;
use super::paragraph::{
    adjust_runs_for_delete, byte_offset, clip_runs, normalize_runs, shift_runs_for_insert,
    FormatRun, HeightState, Paragraph, ParagraphData,
};
use crate::view_state::height_index::HeightIndex;

/// Text-based height guess used before a paragraph is shaped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightEstimator {
    /// Height of one estimated line in pixels.
    pub line_height: f64,
    /// Chars that fit on one estimated line.
    pub chars_per_line: usize,
}

impl Default for HeightEstimator {
    fn default() -> Self {
        Self {
            line_height: 20.0,
            chars_per_line: 80,
        }
    }
}

impl HeightEstimator {
    /// Create an estimator.
    pub fn new(line_height: f64, chars_per_line: usize) -> Self {
        Self {
            line_height,
            chars_per_line,
        }
    }

    /// Estimated line count: each hard line wraps every `chars_per_line`
    /// chars and takes at least one line.
    ///
    /// A line of exactly `chars_per_line` chars counts as one line, matching
    /// what a shaper at that width produces.
    pub fn estimate_lines(&self, text: &str) -> usize {
        let per_line = self.chars_per_line.max(1);
        text.split('\n')
            .map(|line| line.chars().count().div_ceil(per_line).max(1))
            .sum()
    }

    /// Estimated height in pixels, always finite and never negative.
    pub fn estimate(&self, text: &str) -> f64 {
        let height = self.estimate_lines(text) as f64 * self.line_height;
        if height.is_finite() && height >= 0.0 {
            height
        } else {
            0.0
        }
    }
}

/// What a store mutation did, for cache maintenance and observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParagraphChange {
    /// A paragraph was inserted; later paragraphs moved up by one.
    Inserted {
        /// Index of the new paragraph.
        index: usize,
    },
    /// A paragraph was removed; later paragraphs moved down by one.
    Removed {
        /// Index the paragraph had.
        index: usize,
    },
    /// Text or formats of a paragraph changed in place.
    Changed {
        /// Index of the changed paragraph.
        index: usize,
    },
    /// The whole document was replaced.
    Reloaded {
        /// New paragraph count.
        count: usize,
    },
}

/// Ordered paragraphs plus their height index.
///
/// # Invariants
/// - `paragraph_count() == heights().len()` after every call
/// - The height index is only written through its update primitives
#[derive(Debug, Clone, Default)]
pub struct ParagraphStore {
    paragraphs: Vec<Paragraph>,
    heights: HeightIndex,
    estimator: HeightEstimator,
}

impl ParagraphStore {
    /// Create an empty store.
    pub fn new(estimator: HeightEstimator) -> Self {
        Self {
            paragraphs: Vec::new(),
            heights: HeightIndex::new(),
            estimator,
        }
    }

    /// Create a store from plain paragraph texts.
    pub fn from_texts<I, S>(texts: I, estimator: HeightEstimator) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let paragraphs: Vec<Paragraph> = texts
            .into_iter()
            .map(|text| {
                let text = text.into();
                let estimate = estimator.estimate(&text);
                Paragraph::new(text, Vec::new(), estimate)
            })
            .collect();
        let heights = HeightIndex::from_estimates(
            paragraphs.iter().map(Paragraph::estimated_height).collect(),
        );
        let store = Self {
            paragraphs,
            heights,
            estimator,
        };
        store.check_invariants();
        store
    }

    /// Replace the whole document in one O(n) pass.
    ///
    /// # Errors
    ///
    /// `DocumentError::InvalidFormatRun` if any paragraph carries an invalid
    /// run; the store is left untouched.
    pub fn load(&mut self, data: Vec<ParagraphData>) -> Result<ParagraphChange, DocumentError> {
        let mut paragraphs = Vec::with_capacity(data.len());
        for (index, ParagraphData { text, formats }) in data.into_iter().enumerate() {
            let formats = normalize_runs(index, formats, text.chars().count())?;
            let estimate = self.estimator.estimate(&text);
            paragraphs.push(Paragraph::new(text, formats, estimate));
        }
        let heights =
            HeightIndex::from_heights(paragraphs.iter().map(Paragraph::estimated_height).collect())?;

        self.paragraphs = paragraphs;
        self.heights = heights;
        self.check_invariants();
        Ok(ParagraphChange::Reloaded {
            count: self.paragraphs.len(),
        })
    }

    /// Remove every paragraph.
    pub fn clear(&mut self) -> ParagraphChange {
        self.paragraphs.clear();
        self.heights.clear();
        ParagraphChange::Reloaded { count: 0 }
    }

    /// Estimator used for new and edited paragraphs.
    pub fn estimator(&self) -> HeightEstimator {
        self.estimator
    }

    /// Replace the estimator and re-estimate paragraphs still in the
    /// `Estimated` state.
    ///
    /// Returns the number of re-estimated paragraphs.
    ///
    /// # Errors
    ///
    /// Only if the height index has diverged from the paragraph list.
    pub fn set_estimator(&mut self, estimator: HeightEstimator) -> Result<usize, DocumentError> {
        self.estimator = estimator;
        let mut updated = 0;
        for (index, paragraph) in self.paragraphs.iter_mut().enumerate() {
            if paragraph.height_state() != HeightState::Estimated {
                continue;
            }
            let estimate = estimator.estimate(paragraph.text());
            paragraph.set_estimated_height(estimate);
            self.heights.set_height(index, estimate)?;
            updated += 1;
        }
        Ok(updated)
    }

    // ===== Reads =====

    /// Number of paragraphs.
    pub fn paragraph_count(&self) -> usize {
        self.paragraphs.len()
    }

    /// Whether the document has no paragraphs.
    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }

    /// Paragraph record at `index`.
    ///
    /// # Errors
    ///
    /// `DocumentError::IndexOutOfRange` if `index >= paragraph_count()`.
    pub fn paragraph(&self, index: usize) -> Result<&Paragraph, DocumentError> {
        self.paragraphs
            .get(index)
            .ok_or(DocumentError::IndexOutOfRange {
                operation: "paragraph",
                index,
                len: self.paragraphs.len(),
            })
    }

    /// Text of the paragraph at `index`.
    ///
    /// # Errors
    ///
    /// `DocumentError::IndexOutOfRange` if `index >= paragraph_count()`.
    pub fn paragraph_text(&self, index: usize) -> Result<&str, DocumentError> {
        self.paragraph(index).map(Paragraph::text)
    }

    /// Format runs of the paragraph at `index`.
    ///
    /// # Errors
    ///
    /// `DocumentError::IndexOutOfRange` if `index >= paragraph_count()`.
    pub fn paragraph_formats(&self, index: usize) -> Result<&[FormatRun], DocumentError> {
        self.paragraph(index).map(Paragraph::formats)
    }

    /// Current height (estimated or measured) of the paragraph at `index`.
    ///
    /// # Errors
    ///
    /// `DocumentError::IndexOutOfRange` if `index >= paragraph_count()`.
    pub fn paragraph_height(&self, index: usize) -> Result<f64, DocumentError> {
        self.heights
            .height(index)
            .ok_or(DocumentError::IndexOutOfRange {
                operation: "paragraph_height",
                index,
                len: self.paragraphs.len(),
            })
    }

    /// Document Y of the top of paragraph `index`.
    ///
    /// `index == paragraph_count()` gives the document end.
    ///
    /// # Errors
    ///
    /// `DocumentError::IndexOutOfRange` if `index > paragraph_count()`.
    pub fn paragraph_y(&self, index: usize) -> Result<f64, DocumentError> {
        if index > self.paragraphs.len() {
            return Err(DocumentError::IndexOutOfRange {
                operation: "paragraph_y",
                index,
                len: self.paragraphs.len(),
            });
        }
        Ok(self.heights.prefix_sum(index))
    }

    /// Height state of the paragraph at `index`.
    ///
    /// # Errors
    ///
    /// `DocumentError::IndexOutOfRange` if `index >= paragraph_count()`.
    pub fn height_state(&self, index: usize) -> Result<HeightState, DocumentError> {
        self.paragraph(index).map(Paragraph::height_state)
    }

    /// Sum of all paragraph heights.
    pub fn total_height(&self) -> f64 {
        self.heights.total_height()
    }

    /// Paragraph containing document Y, or `None` outside `[0, total_height)`.
    pub fn paragraph_at_y(&self, y: f64) -> Option<usize> {
        if !(0.0..self.total_height()).contains(&y) {
            return None;
        }
        let index = self.heights.find_index_for_y(y);
        (index < self.paragraphs.len()).then_some(index)
    }

    /// Number of paragraphs with a measured height.
    pub fn measured_count(&self) -> usize {
        self.paragraphs
            .iter()
            .filter(|p| p.height_state().is_measured())
            .count()
    }

    /// Iterate over paragraphs in document order.
    pub fn iter(&self) -> impl Iterator<Item = &Paragraph> + '_ {
        self.paragraphs.iter()
    }

    /// Read-only view of the height index.
    pub fn heights(&self) -> &HeightIndex {
        &self.heights
    }

    /// All paragraph texts joined with `\n`.
    pub fn plain_text(&self) -> String {
        self.paragraphs
            .iter()
            .map(Paragraph::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Total chars over all paragraphs, separators excluded.
    pub fn character_count(&self) -> usize {
        self.paragraphs.iter().map(Paragraph::char_len).sum()
    }

    // ===== Structural mutations =====

    /// Insert a plain paragraph at `index`.
    ///
    /// # Errors
    ///
    /// `DocumentError::IndexOutOfRange` if `index > paragraph_count()`.
    pub fn insert_paragraph(
        &mut self,
        index: usize,
        text: impl Into<String>,
    ) -> Result<ParagraphChange, DocumentError> {
        self.insert_paragraph_with_formats(index, ParagraphData::new(text))
    }

    /// Insert a paragraph with format runs at `index`.
    ///
    /// # Errors
    ///
    /// `DocumentError::IndexOutOfRange` if `index > paragraph_count()`,
    /// `DocumentError::InvalidFormatRun` for a bad run.
    pub fn insert_paragraph_with_formats(
        &mut self,
        index: usize,
        data: ParagraphData,
    ) -> Result<ParagraphChange, DocumentError> {
        if index > self.paragraphs.len() {
            return Err(DocumentError::IndexOutOfRange {
                operation: "insert_paragraph",
                index,
                len: self.paragraphs.len(),
            });
        }
        let formats = normalize_runs(index, data.formats, data.text.chars().count())?;
        let estimate = self.estimator.estimate(&data.text);

        self.paragraphs
            .insert(index, Paragraph::new(data.text, formats, estimate));
        self.heights.insert(index, estimate)?;
        self.check_invariants();
        Ok(ParagraphChange::Inserted { index })
    }

    /// Remove the paragraph at `index`.
    ///
    /// # Errors
    ///
    /// `DocumentError::IndexOutOfRange` if `index >= paragraph_count()`.
    pub fn remove_paragraph(&mut self, index: usize) -> Result<ParagraphChange, DocumentError> {
        self.check_index("remove_paragraph", index)?;
        self.paragraphs.remove(index);
        self.heights.remove(index)?;
        self.check_invariants();
        Ok(ParagraphChange::Removed { index })
    }

    // ===== In-place edits =====

    /// Replace the text of a paragraph, clipping its format runs.
    ///
    /// The paragraph goes back to `Estimated` with a fresh estimate.
    ///
    /// # Errors
    ///
    /// `DocumentError::IndexOutOfRange` if `index >= paragraph_count()`.
    pub fn set_paragraph_text(
        &mut self,
        index: usize,
        text: impl Into<String>,
    ) -> Result<ParagraphChange, DocumentError> {
        self.check_index("set_paragraph_text", index)?;
        let text = text.into();
        let mut formats = self.paragraphs[index].formats().to_vec();
        clip_runs(&mut formats, text.chars().count());
        self.replace_content(index, text, formats)
    }

    /// Replace the format runs of a paragraph.
    ///
    /// # Errors
    ///
    /// `DocumentError::IndexOutOfRange` if `index >= paragraph_count()`,
    /// `DocumentError::InvalidFormatRun` for a bad run.
    pub fn set_paragraph_formats(
        &mut self,
        index: usize,
        formats: Vec<FormatRun>,
    ) -> Result<ParagraphChange, DocumentError> {
        self.check_index("set_paragraph_formats", index)?;
        let formats = normalize_runs(index, formats, self.paragraphs[index].char_len())?;
        self.paragraphs[index].set_formats(formats);
        Ok(ParagraphChange::Changed { index })
    }

    /// Insert text at a char offset, shifting and growing format runs.
    ///
    /// # Errors
    ///
    /// `DocumentError::IndexOutOfRange` for a bad paragraph,
    /// `DocumentError::OffsetOutOfRange` if `char_offset` is past the end.
    pub fn insert_text(
        &mut self,
        index: usize,
        char_offset: usize,
        text: &str,
    ) -> Result<ParagraphChange, DocumentError> {
        self.check_index("insert_text", index)?;
        let paragraph = &self.paragraphs[index];
        let byte = byte_offset(paragraph.text(), char_offset).ok_or(
            DocumentError::OffsetOutOfRange {
                index,
                offset: char_offset,
                len: paragraph.char_len(),
            },
        )?;

        let mut new_text = paragraph.text().to_string();
        new_text.insert_str(byte, text);
        let mut formats = paragraph.formats().to_vec();
        shift_runs_for_insert(&mut formats, char_offset, text.chars().count());
        self.replace_content(index, new_text, formats)
    }

    /// Delete `char_len` chars starting at `char_offset`, shrinking or
    /// dropping format runs.
    ///
    /// # Errors
    ///
    /// `DocumentError::IndexOutOfRange` for a bad paragraph,
    /// `DocumentError::OffsetOutOfRange` if the deletion reaches past the end.
    pub fn delete_text(
        &mut self,
        index: usize,
        char_offset: usize,
        char_len: usize,
    ) -> Result<ParagraphChange, DocumentError> {
        self.check_index("delete_text", index)?;
        let paragraph = &self.paragraphs[index];
        let out_of_range = || DocumentError::OffsetOutOfRange {
            index,
            offset: char_offset.saturating_add(char_len),
            len: paragraph.char_len(),
        };
        let end = char_offset.checked_add(char_len).ok_or_else(out_of_range)?;
        let start_byte = byte_offset(paragraph.text(), char_offset).ok_or_else(out_of_range)?;
        let end_byte = byte_offset(paragraph.text(), end).ok_or_else(out_of_range)?;

        let mut new_text = paragraph.text().to_string();
        new_text.replace_range(start_byte..end_byte, "");
        let mut formats = paragraph.formats().to_vec();
        adjust_runs_for_delete(&mut formats, char_offset, char_len);
        self.replace_content(index, new_text, formats)
    }

    // ===== Height-state transitions (driven by the layout engine) =====

    /// Mark a paragraph as being shaped.
    pub(crate) fn begin_measure(&mut self, index: usize) -> Result<(), DocumentError> {
        self.check_index("begin_measure", index)?;
        self.paragraphs[index].set_height_state(HeightState::Calculating);
        Ok(())
    }

    /// Store a measured height. Returns the previous height.
    pub(crate) fn set_measured_height(
        &mut self,
        index: usize,
        height: f64,
    ) -> Result<f64, DocumentError> {
        self.check_index("set_measured_height", index)?;
        let old = self.heights.set_height(index, height)?;
        self.paragraphs[index].set_height_state(HeightState::Measured);
        Ok(old)
    }

    /// Give up on a measurement; the paragraph keeps its current height.
    pub(crate) fn abandon_measure(&mut self, index: usize) -> Result<(), DocumentError> {
        self.check_index("abandon_measure", index)?;
        let paragraph = &mut self.paragraphs[index];
        if paragraph.height_state() == HeightState::Calculating {
            paragraph.set_height_state(HeightState::Estimated);
        }
        Ok(())
    }

    /// Demote every measured paragraph after a width or font change.
    ///
    /// The last measurement becomes the estimate, so heights do not change
    /// until the paragraph is shaped again. Returns the number demoted.
    pub(crate) fn mark_all_estimated(&mut self) -> usize {
        let mut demoted = 0;
        for (index, paragraph) in self.paragraphs.iter_mut().enumerate() {
            if paragraph.height_state() == HeightState::Estimated {
                continue;
            }
            if let Some(height) = self.heights.height(index) {
                paragraph.set_estimated_height(height);
            }
            paragraph.set_height_state(HeightState::Estimated);
            demoted += 1;
        }
        demoted
    }

    // ===== Internals =====

    fn check_index(&self, operation: &'static str, index: usize) -> Result<(), DocumentError> {
        if index < self.paragraphs.len() {
            Ok(())
        } else {
            Err(DocumentError::IndexOutOfRange {
                operation,
                index,
                len: self.paragraphs.len(),
            })
        }
    }

    /// Swap in new content, reset the estimate and update the height index.
    fn replace_content(
        &mut self,
        index: usize,
        text: String,
        formats: Vec<FormatRun>,
    ) -> Result<ParagraphChange, DocumentError> {
        let estimate = self.estimator.estimate(&text);
        let paragraph = &mut self.paragraphs[index];
        paragraph.set_content(text, formats);
        paragraph.set_estimated_height(estimate);
        paragraph.set_height_state(HeightState::Estimated);
        self.heights.set_height(index, estimate)?;
        Ok(ParagraphChange::Changed { index })
    }

    fn check_invariants(&self) {
        debug_assert_eq!(
            self.paragraphs.len(),
            self.heights.len(),
            "paragraph list and height index diverged"
        );
    }
}
