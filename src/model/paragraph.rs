//! Paragraph records and inline format runs

/// Style carried by a format run.
///
/// The core never interprets styles itself; they are passed through to the
/// text shaper, which may use them to pick font weights or baselines.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StyleTag {
    /// Bold weight.
    Bold,
    /// Italic slant.
    Italic,
    /// Underline decoration.
    Underline,
    /// Strike-through decoration.
    Strikethrough,
    /// Raised, smaller glyphs.
    Superscript,
    /// Lowered, smaller glyphs.
    Subscript,
    /// Inline code span.
    Code,
    /// Range annotated with a comment.
    Comment,
    /// Range annotated with a footnote.
    Footnote,
    /// Application-defined style name.
    Custom(String),
}

/// A styled range inside a paragraph.
///
/// Offsets are measured in `char`s from the start of the paragraph text.
/// Runs of one paragraph are either disjoint or nested, never partially
/// overlapping.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FormatRun {
    /// Start offset (inclusive) in chars.
    pub start: usize,
    /// Length in chars.
    pub len: usize,
    /// Style applied to the range.
    pub style: StyleTag,
}

impl FormatRun {
    /// Create a new run.
    pub fn new(start: usize, len: usize, style: StyleTag) -> Self {
        Self { start, len, style }
    }

    /// End offset (exclusive) in chars, saturating at `usize::MAX`.
    pub fn end(&self) -> usize {
        self.start.saturating_add(self.len)
    }

    /// Check if the run covers no characters.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Check if `offset` falls inside the run.
    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end()
    }

    /// Check if the run shares at least one character with `[start, end)`.
    pub fn overlaps(&self, start: usize, end: usize) -> bool {
        self.start < end && self.end() > start
    }
}

/// How trustworthy a paragraph's height currently is.
///
/// Transitions: `Estimated -> Calculating -> Measured`, driven by the layout
/// engine, and back to `Estimated` on any text, width or font change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeightState {
    /// Height is a guess derived from the character count.
    #[default]
    Estimated,
    /// Layout for the paragraph is being computed.
    Calculating,
    /// Height came from a real layout at the current width and font.
    Measured,
}

impl HeightState {
    /// Check if the height is authoritative.
    pub fn is_measured(&self) -> bool {
        matches!(self, Self::Measured)
    }
}

/// Input record for bulk loading and insertion.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParagraphData {
    /// Plain text content.
    pub text: String,
    /// Inline format runs.
    pub formats: Vec<FormatRun>,
}

impl ParagraphData {
    /// Create paragraph data without formatting.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            formats: Vec::new(),
        }
    }

    /// Attach format runs.
    pub fn with_formats(mut self, formats: Vec<FormatRun>) -> Self {
        self.formats = formats;
        self
    }
}

impl From<&str> for ParagraphData {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for ParagraphData {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

/// One paragraph owned by the [`ParagraphStore`](super::store::ParagraphStore).
///
/// The paragraph's identity is its ordinal position in the store; it shifts
/// when earlier paragraphs are inserted or removed. The current height lives
/// in the store's height index, the paragraph only remembers its estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    text: String,
    char_len: usize,
    formats: Vec<FormatRun>,
    estimated_height: f64,
    height_state: HeightState,
}

impl Paragraph {
    pub(crate) fn new(text: String, formats: Vec<FormatRun>, estimated_height: f64) -> Self {
        let char_len = text.chars().count();
        Self {
            text,
            char_len,
            formats,
            estimated_height,
            height_state: HeightState::Estimated,
        }
    }

    /// Plain text content.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length of the text in chars.
    pub fn char_len(&self) -> usize {
        self.char_len
    }

    /// Format runs, sorted by start offset with enclosing runs first.
    pub fn formats(&self) -> &[FormatRun] {
        &self.formats
    }

    /// Height estimate derived from the text.
    pub fn estimated_height(&self) -> f64 {
        self.estimated_height
    }

    /// Current height state.
    pub fn height_state(&self) -> HeightState {
        self.height_state
    }

    pub(crate) fn set_content(&mut self, text: String, formats: Vec<FormatRun>) {
        self.char_len = text.chars().count();
        self.text = text;
        self.formats = formats;
    }

    pub(crate) fn set_formats(&mut self, formats: Vec<FormatRun>) {
        self.formats = formats;
    }

    pub(crate) fn set_estimated_height(&mut self, height: f64) {
        self.estimated_height = height;
    }

    pub(crate) fn set_height_state(&mut self, state: HeightState) {
        self.height_state = state;
    }
}

/// Byte offset of the `char_offset`-th char, or `text.len()` at the end.
pub(crate) fn byte_offset(text: &str, char_offset: usize) -> Option<usize> {
    text.char_indices()
        .map(|(byte, _)| byte)
        .chain(std::iter::once(text.len()))
        .nth(char_offset)
}

/// Validate runs against a text length and return them in canonical order.
///
/// Canonical order is ascending start, longer run first on ties, so an
/// enclosing run always precedes the runs nested in it.
pub(crate) fn normalize_runs(
    index: usize,
    mut runs: Vec<FormatRun>,
    text_len: usize,
) -> Result<Vec<FormatRun>, crate::model::DocumentError> {
    let reject = |run: &FormatRun, reason| crate::model::DocumentError::InvalidFormatRun {
        index,
        start: run.start,
        len: run.len,
        reason,
    };

    runs.sort_by(|a, b| a.start.cmp(&b.start).then(b.len.cmp(&a.len)));

    // Ends of the runs enclosing the current position.
    let mut open_ends: Vec<usize> = Vec::new();
    for run in &runs {
        if run.is_empty() {
            return Err(reject(run, "run is empty"));
        }
        if run.start.checked_add(run.len).is_none_or(|end| end > text_len) {
            return Err(reject(run, "run extends past end of text"));
        }
        while open_ends.last().is_some_and(|&end| end <= run.start) {
            open_ends.pop();
        }
        if open_ends.last().is_some_and(|&end| run.end() > end) {
            return Err(reject(run, "run partially overlaps another run"));
        }
        open_ends.push(run.end());
    }
    Ok(runs)
}

/// Shift runs for `count` chars inserted at `offset`.
///
/// Runs starting at or after the insertion point move right; runs strictly
/// containing it grow. A run ending exactly at `offset` is not extended.
pub(crate) fn shift_runs_for_insert(runs: &mut [FormatRun], offset: usize, count: usize) {
    for run in runs.iter_mut() {
        if run.start >= offset {
            run.start = run.start.saturating_add(count);
        } else if run.end() > offset {
            run.len = run.len.saturating_add(count);
        }
    }
}

/// Adjust runs for the deletion of `[offset, offset + count)`.
///
/// Both run boundaries are mapped through the deletion; runs that collapse
/// to nothing are dropped. The mapping is monotone, so nesting survives.
pub(crate) fn adjust_runs_for_delete(runs: &mut Vec<FormatRun>, offset: usize, count: usize) {
    let delete_end = offset.saturating_add(count);
    let map = |pos: usize| {
        if pos <= offset {
            pos
        } else if pos <= delete_end {
            offset
        } else {
            pos - count
        }
    };
    for run in runs.iter_mut() {
        let start = map(run.start);
        let end = map(run.end());
        run.start = start;
        run.len = end - start;
    }
    runs.retain(|run| !run.is_empty());
}

/// Clip runs to a new text length, dropping runs that become empty.
pub(crate) fn clip_runs(runs: &mut Vec<FormatRun>, text_len: usize) {
    for run in runs.iter_mut() {
        let end = run.end().min(text_len);
        run.start = run.start.min(text_len);
        run.len = end - run.start;
    }
    runs.retain(|run| !run.is_empty());
}
