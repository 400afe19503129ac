//! Viewport-driven lazy layout engine
//!
//! Owns the paragraph store, the layout cache, the viewport and the text
//! shaper. Paragraphs are shaped only when they enter the buffered band;
//! until then they contribute an estimated height to the height index.
//!
//! # Mutation ordering
//!
//! Every document mutation runs content → height index → cache → observers
//! inside one call, so observers always see a consistent document.

use super::cache::{LayoutCache, LayoutEntry, DEFAULT_CACHE_CEILING};
use super::hit_test::HitTestResult;
use super::layout::{ShapedParagraph, TextShaper};
use super::layout_params::{Font, LayoutParams};
use super::scroll::ScrollPosition;
use super::types::ParagraphRect;
use super::viewport::{BufferPolicy, Viewport};
use super::visible_range::ParagraphRange;
use crate::model::{
    DocumentError, FormatRun, HeightEstimator, ParagraphChange, ParagraphData, ParagraphStore,
};
use serde::Serialize;
use tracing::{debug, trace, warn};

fn check_width(width: f64) -> Result<(), DocumentError> {
    if width.is_finite() && width > 0.0 {
        Ok(())
    } else {
        Err(DocumentError::InvalidWidth { width })
    }
}

/// Receives document notifications after each mutation completes.
pub trait DocumentObserver {
    /// Paragraphs were inserted, removed, edited or reloaded.
    fn on_paragraphs_changed(&mut self, change: &ParagraphChange);

    /// The document height changed (edit or measurement).
    fn on_total_height_changed(&mut self, _total_height: f64) {}
}

/// Engine construction parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Initial layout width and font.
    pub params: LayoutParams,
    /// Buffer band around the visible paragraphs.
    pub buffer: BufferPolicy,
    /// Maximum number of cached layouts.
    pub cache_ceiling: usize,
    /// Height guess for paragraphs not yet shaped.
    pub estimator: HeightEstimator,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            params: LayoutParams::default(),
            buffer: BufferPolicy::default(),
            cache_ceiling: DEFAULT_CACHE_CEILING,
            estimator: HeightEstimator::default(),
        }
    }
}

/// Work done by one layout call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LayoutPass {
    /// Paragraphs shaped from scratch.
    pub shaped: usize,
    /// Dirty cache entries re-trusted without shaping.
    pub revalidated: usize,
    /// Paragraphs whose shaping failed in this pass.
    pub failed: usize,
    /// Paragraphs skipped because a trusted layout or a known failure exists.
    pub skipped: usize,
    /// Cache entries evicted.
    pub evicted: usize,
}

impl LayoutPass {
    fn absorb(&mut self, other: LayoutPass) {
        self.shaped += other.shaped;
        self.revalidated += other.revalidated;
        self.failed += other.failed;
        self.skipped += other.skipped;
        self.evicted += other.evicted;
    }
}

/// Lazy layout over a paragraph document.
pub struct LazyLayoutEngine<S: TextShaper> {
    store: ParagraphStore,
    cache: LayoutCache,
    viewport: Viewport,
    params: LayoutParams,
    shaper: S,
    observers: Vec<Box<dyn DocumentObserver>>,
}

impl<S: TextShaper> std::fmt::Debug for LazyLayoutEngine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyLayoutEngine")
            .field("paragraphs", &self.store.paragraph_count())
            .field("cache", &self.cache)
            .field("viewport", &self.viewport)
            .field("params", &self.params)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl<S: TextShaper> LazyLayoutEngine<S> {
    /// Create an engine over an empty document.
    ///
    /// An unusable width in `config.params` falls back to the default width.
    pub fn new(shaper: S, config: EngineConfig) -> Self {
        let mut params = config.params;
        if check_width(params.width).is_err() {
            warn!(width = params.width, "Invalid layout width, using default");
            params.width = LayoutParams::default().width;
        }
        let mut viewport = Viewport::new(config.buffer);
        viewport.set_width(params.width);
        Self {
            store: ParagraphStore::new(config.estimator),
            cache: LayoutCache::new(config.cache_ceiling),
            viewport,
            params,
            shaper,
            observers: Vec::new(),
        }
    }

    // ===== Accessors =====

    /// Read-only paragraph store.
    pub fn store(&self) -> &ParagraphStore {
        &self.store
    }

    /// Current viewport.
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Current layout params.
    pub fn params(&self) -> &LayoutParams {
        &self.params
    }

    /// The text shaper.
    pub fn shaper(&self) -> &S {
        &self.shaper
    }

    /// Register an observer. Observers are called in registration order.
    pub fn add_observer(&mut self, observer: Box<dyn DocumentObserver>) {
        self.observers.push(observer);
    }

    // ===== Document mutations =====

    /// Replace the whole document.
    ///
    /// # Errors
    ///
    /// `DocumentError::InvalidFormatRun` for a bad run; nothing changes.
    pub fn load(&mut self, data: Vec<ParagraphData>) -> Result<ParagraphChange, DocumentError> {
        let old_total = self.store.total_height();
        let change = self.store.load(data)?;
        self.apply_change(change, old_total);
        Ok(change)
    }

    /// Replace the whole document with plain paragraphs.
    pub fn load_texts<I, T>(&mut self, texts: I) -> ParagraphChange
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let old_total = self.store.total_height();
        self.store = ParagraphStore::from_texts(texts, self.store.estimator());
        let change = ParagraphChange::Reloaded {
            count: self.store.paragraph_count(),
        };
        self.apply_change(change, old_total);
        change
    }

    /// Remove every paragraph.
    pub fn clear(&mut self) -> ParagraphChange {
        let old_total = self.store.total_height();
        let change = self.store.clear();
        self.apply_change(change, old_total);
        change
    }

    /// Insert a plain paragraph.
    ///
    /// # Errors
    ///
    /// See [`ParagraphStore::insert_paragraph`].
    pub fn insert_paragraph(
        &mut self,
        index: usize,
        text: impl Into<String>,
    ) -> Result<ParagraphChange, DocumentError> {
        let old_total = self.store.total_height();
        let change = self.store.insert_paragraph(index, text)?;
        self.apply_change(change, old_total);
        Ok(change)
    }

    /// Insert a paragraph with format runs.
    ///
    /// # Errors
    ///
    /// See [`ParagraphStore::insert_paragraph_with_formats`].
    pub fn insert_paragraph_with_formats(
        &mut self,
        index: usize,
        data: ParagraphData,
    ) -> Result<ParagraphChange, DocumentError> {
        let old_total = self.store.total_height();
        let change = self.store.insert_paragraph_with_formats(index, data)?;
        self.apply_change(change, old_total);
        Ok(change)
    }

    /// Remove a paragraph.
    ///
    /// # Errors
    ///
    /// See [`ParagraphStore::remove_paragraph`].
    pub fn remove_paragraph(&mut self, index: usize) -> Result<ParagraphChange, DocumentError> {
        let old_total = self.store.total_height();
        let change = self.store.remove_paragraph(index)?;
        self.apply_change(change, old_total);
        Ok(change)
    }

    /// Replace a paragraph's text.
    ///
    /// # Errors
    ///
    /// See [`ParagraphStore::set_paragraph_text`].
    pub fn set_paragraph_text(
        &mut self,
        index: usize,
        text: impl Into<String>,
    ) -> Result<ParagraphChange, DocumentError> {
        let old_total = self.store.total_height();
        let change = self.store.set_paragraph_text(index, text)?;
        self.apply_change(change, old_total);
        Ok(change)
    }

    /// Replace a paragraph's format runs.
    ///
    /// # Errors
    ///
    /// See [`ParagraphStore::set_paragraph_formats`].
    pub fn set_paragraph_formats(
        &mut self,
        index: usize,
        formats: Vec<FormatRun>,
    ) -> Result<ParagraphChange, DocumentError> {
        let old_total = self.store.total_height();
        let change = self.store.set_paragraph_formats(index, formats)?;
        self.apply_change(change, old_total);
        Ok(change)
    }

    /// Insert text inside a paragraph.
    ///
    /// # Errors
    ///
    /// See [`ParagraphStore::insert_text`].
    pub fn insert_text(
        &mut self,
        index: usize,
        char_offset: usize,
        text: &str,
    ) -> Result<ParagraphChange, DocumentError> {
        let old_total = self.store.total_height();
        let change = self.store.insert_text(index, char_offset, text)?;
        self.apply_change(change, old_total);
        Ok(change)
    }

    /// Delete text inside a paragraph.
    ///
    /// # Errors
    ///
    /// See [`ParagraphStore::delete_text`].
    pub fn delete_text(
        &mut self,
        index: usize,
        char_offset: usize,
        char_len: usize,
    ) -> Result<ParagraphChange, DocumentError> {
        let old_total = self.store.total_height();
        let change = self.store.delete_text(index, char_offset, char_len)?;
        self.apply_change(change, old_total);
        Ok(change)
    }

    /// Replace the height estimator, re-estimating unmeasured paragraphs.
    ///
    /// # Errors
    ///
    /// See [`ParagraphStore::set_estimator`].
    pub fn set_estimator(&mut self, estimator: HeightEstimator) -> Result<(), DocumentError> {
        let old_total = self.store.total_height();
        self.store.set_estimator(estimator)?;
        self.viewport.reclamp(self.store.heights());
        self.notify_total_height(old_total);
        Ok(())
    }

    // ===== Layout params =====

    /// Change the layout width. Every cached layout becomes dirty.
    ///
    /// # Errors
    ///
    /// `DocumentError::InvalidWidth` if `width` is not finite or not
    /// positive; nothing changes.
    pub fn set_width(&mut self, width: f64) -> Result<(), DocumentError> {
        check_width(width)?;
        if self.params.width == width {
            return Ok(());
        }
        self.viewport.set_width(width);
        self.params.width = width;
        self.params_changed(false)
    }

    /// Change the font. Every cached layout becomes dirty and unmeasured
    /// paragraphs are re-estimated at the new line height.
    ///
    /// # Errors
    ///
    /// Only on an internal index mismatch.
    pub fn set_font(&mut self, font: Font) -> Result<(), DocumentError> {
        if self.params.font == font {
            return Ok(());
        }
        self.params.font = font;
        self.params_changed(true)
    }

    /// Replace width and font at once.
    ///
    /// # Errors
    ///
    /// `DocumentError::InvalidWidth` for an unusable width; nothing changes.
    pub fn set_layout_params(&mut self, params: LayoutParams) -> Result<(), DocumentError> {
        check_width(params.width)?;
        if self.params == params {
            return Ok(());
        }
        let font_changed = self.params.font != params.font;
        self.viewport.set_width(params.width);
        self.params = params;
        self.params_changed(font_changed)
    }

    fn params_changed(&mut self, font_changed: bool) -> Result<(), DocumentError> {
        let old_total = self.store.total_height();
        self.cache.invalidate_all();
        // Re-estimate before demoting, so measured heights survive as estimates.
        if font_changed {
            let estimator = HeightEstimator {
                line_height: self.shaper.line_height(&self.params.font),
                ..self.store.estimator()
            };
            self.store.set_estimator(estimator)?;
        }
        let demoted = self.store.mark_all_estimated();
        debug!(
            width = self.params.width,
            font = %self.params.font.family,
            size = self.params.font.pixel_size,
            demoted,
            "Layout params changed, cached layouts invalidated"
        );
        self.notify_total_height(old_total);
        Ok(())
    }

    // ===== Layout =====

    /// Make sure every paragraph in `[first, last]` has a trusted layout.
    ///
    /// Shapes only what is missing, replaces estimates with measured heights
    /// and never retries a paragraph that already failed with the current
    /// params.
    ///
    /// # Errors
    ///
    /// `DocumentError::InvalidRange` if the range is reversed or reaches
    /// past the document end.
    pub fn ensure_layouted(&mut self, first: usize, last: usize) -> Result<LayoutPass, DocumentError> {
        let range = ParagraphRange::checked(first, last, self.store.paragraph_count())?;
        let old_total = self.store.total_height();
        let mut pass = LayoutPass::default();

        for index in range.indices() {
            if self.cache.has_layout(index, &self.params) || self.cache.is_failed(index, &self.params)
            {
                pass.skipped += 1;
                continue;
            }
            let paragraph = self.store.paragraph(index)?;
            let text = paragraph.text().to_string();
            let formats = paragraph.formats().to_vec();

            if self
                .cache
                .try_revalidate(index, &text, &formats, &self.params)
            {
                if let Some(height) = self.cache.peek(index, &self.params).map(ShapedParagraph::height) {
                    self.store.set_measured_height(index, height)?;
                }
                pass.revalidated += 1;
                continue;
            }

            self.store.begin_measure(index)?;
            match self.shaper.shape(&text, &formats, &self.params) {
                Ok(layout) => {
                    let height = layout.height();
                    self.store.set_measured_height(index, height)?;
                    trace!(paragraph = index, height, lines = layout.line_count(), "Shaped paragraph");
                    let entry = LayoutEntry::new(layout, self.params.clone(), text, formats);
                    pass.evicted += self.cache.insert(index, entry);
                    pass.shaped += 1;
                }
                Err(err) => {
                    self.store.abandon_measure(index)?;
                    if self.cache.record_failure(index, &self.params) {
                        warn!(paragraph = index, error = %err, "Layout failed, keeping estimated height");
                    }
                    pass.failed += 1;
                }
            }
        }

        if pass.shaped > 0 || pass.revalidated > 0 || pass.failed > 0 {
            debug!(
                first,
                last,
                shaped = pass.shaped,
                revalidated = pass.revalidated,
                failed = pass.failed,
                evicted = pass.evicted,
                cached = self.cache.len(),
                "Layout pass"
            );
        }
        self.notify_total_height(old_total);
        Ok(pass)
    }

    /// Trusted layout for a paragraph, marking it recently used.
    ///
    /// Never shapes: call [`ensure_layouted`](Self::ensure_layouted) first.
    pub fn get_layout(&mut self, index: usize) -> Option<&ShapedParagraph> {
        self.cache.get(index, &self.params)
    }

    /// Trusted layout for a paragraph without touching recency.
    pub fn peek_layout(&self, index: usize) -> Option<&ShapedParagraph> {
        self.cache.peek(index, &self.params)
    }

    /// Whether a paragraph has a trusted layout.
    pub fn has_layout(&self, index: usize) -> bool {
        self.cache.has_layout(index, &self.params)
    }

    /// Number of cached layouts, dirty ones included.
    pub fn layout_count(&self) -> usize {
        self.cache.len()
    }

    /// Cache ceiling.
    pub fn cache_ceiling(&self) -> usize {
        self.cache.ceiling()
    }

    /// Change the cache ceiling. Returns the number of evicted entries.
    pub fn set_cache_ceiling(&mut self, ceiling: usize) -> usize {
        self.cache.set_ceiling(ceiling)
    }

    /// Evict layouts outside `[keep_first, keep_last]` and enforce the
    /// ceiling. Returns the number of evicted entries.
    pub fn release_distant_layouts(&mut self, keep_first: usize, keep_last: usize) -> usize {
        let evicted = self.cache.release_distant(keep_first, keep_last);
        if evicted > 0 {
            debug!(
                keep_first,
                keep_last,
                evicted,
                cached = self.cache.len(),
                "Released distant layouts"
            );
        }
        evicted
    }

    /// Mark one layout dirty and allow a failed paragraph to be retried.
    ///
    /// # Errors
    ///
    /// `DocumentError::IndexOutOfRange` if `index >= paragraph_count()`.
    pub fn invalidate_layout(&mut self, index: usize) -> Result<bool, DocumentError> {
        self.store.paragraph(index)?;
        Ok(self.cache.invalidate(index))
    }

    /// Mark every layout dirty.
    pub fn invalidate_all(&mut self) {
        self.cache.invalidate_all();
    }

    /// Paragraphs that could not be shaped with the current params.
    pub fn failed_paragraph_count(&self) -> usize {
        self.cache.failure_count(&self.params)
    }

    /// Lay out the buffered band for the current viewport.
    ///
    /// The first visible paragraph stays at the same screen position while
    /// measured heights replace estimates above and inside the band.
    ///
    /// # Errors
    ///
    /// Only on an internal index mismatch; the ranges come from the
    /// viewport and are always valid.
    pub fn layout_viewport(&mut self) -> Result<LayoutPass, DocumentError> {
        let heights = self.store.heights();
        let Some(buffered) = self.viewport.buffered_range(heights) else {
            return Ok(LayoutPass::default());
        };
        let anchor = self.viewport.visible_range(heights).map(|visible| {
            let offset = self.viewport.scroll_y() - heights.prefix_sum(visible.first);
            ScrollPosition::AtParagraph {
                index: visible.first,
                offset,
            }
        });

        let mut pass = self.ensure_layouted(buffered.first, buffered.last)?;
        pass.evicted += self.release_distant_layouts(buffered.first, buffered.last);

        match anchor {
            Some(position) => self.viewport.scroll_to(&position, self.store.heights()),
            None => self.viewport.reclamp(self.store.heights()),
        };

        // Measured heights can pull paragraphs into view that were outside
        // the band when it was computed.
        if let Some(visible) = self.viewport.visible_range(self.store.heights()) {
            if !visible.indices().all(|i| self.has_layout(i) || self.cache.is_failed(i, &self.params)) {
                pass.absorb(self.ensure_layouted(visible.first, visible.last)?);
            }
        }
        Ok(pass)
    }

    // ===== Viewport =====

    /// Set scroll offset and visible height. Returns the clamped offset.
    pub fn set_viewport(&mut self, scroll_y: f64, height: f64) -> f64 {
        self.viewport.set_viewport(scroll_y, height, self.store.heights())
    }

    /// Scroll by a pixel delta.
    pub fn scroll_by(&mut self, delta: f64) -> f64 {
        self.viewport.scroll_by(delta, self.store.heights())
    }

    /// Scroll to a semantic position.
    pub fn scroll_to(&mut self, position: &ScrollPosition) -> f64 {
        self.viewport.scroll_to(position, self.store.heights())
    }

    /// Bring a paragraph fully into view.
    ///
    /// # Errors
    ///
    /// `DocumentError::IndexOutOfRange` for a bad index.
    pub fn scroll_to_paragraph(&mut self, index: usize) -> Result<f64, DocumentError> {
        self.viewport.scroll_to_paragraph(index, self.store.heights())
    }

    /// Bring a band inside a paragraph into view.
    ///
    /// # Errors
    ///
    /// `DocumentError::IndexOutOfRange` for a bad index.
    pub fn scroll_to_position(
        &mut self,
        index: usize,
        local_top: f64,
        local_height: f64,
    ) -> Result<f64, DocumentError> {
        self.viewport
            .scroll_to_position(index, local_top, local_height, self.store.heights())
    }

    /// Paragraphs intersecting the viewport.
    pub fn visible_range(&self) -> Option<ParagraphRange> {
        self.viewport.visible_range(self.store.heights())
    }

    /// Visible range widened by the buffer policy.
    pub fn buffered_range(&self) -> Option<ParagraphRange> {
        self.viewport.buffered_range(self.store.heights())
    }

    /// Change the buffer policy.
    pub fn set_buffer_policy(&mut self, buffer: BufferPolicy) {
        self.viewport.set_buffer_policy(buffer);
    }

    /// Scroll progress in `[0, 1]`.
    pub fn scrollbar_position(&self) -> f64 {
        self.viewport.scrollbar_position(self.store.heights())
    }

    /// Scrollbar thumb size as a fraction of the track.
    pub fn scrollbar_thumb_size(&self) -> f64 {
        self.viewport.scrollbar_thumb_size(self.store.heights())
    }

    /// Scroll to a fraction of the scroll range.
    pub fn set_scrollbar_position(&mut self, fraction: f64) -> f64 {
        self.viewport
            .set_scrollbar_position(fraction, self.store.heights())
    }

    /// Largest valid scroll offset.
    pub fn max_scroll(&self) -> f64 {
        self.viewport.max_scroll(self.store.heights())
    }

    /// Document rectangle of a paragraph.
    ///
    /// # Errors
    ///
    /// `DocumentError::IndexOutOfRange` for a bad index.
    pub fn paragraph_rect(&self, index: usize) -> Result<ParagraphRect, DocumentError> {
        let height = self.store.paragraph_height(index)?;
        let y = self.store.paragraph_y(index)?;
        Ok(ParagraphRect::new(y, height, self.params.width))
    }

    /// Find the paragraph and line under a viewport-relative Y.
    pub fn hit_test(&self, viewport_y: f64) -> HitTestResult {
        let document_y = self.viewport.to_document_y(viewport_y);
        let Some(paragraph) = self.store.paragraph_at_y(document_y) else {
            return HitTestResult::Miss;
        };
        let local_y = document_y - self.store.heights().prefix_sum(paragraph);
        let line = self
            .peek_layout(paragraph)
            .and_then(|layout| layout.line_at_y(local_y));
        HitTestResult::Hit {
            paragraph,
            line,
            local_y,
        }
    }

    // ===== Internals =====

    fn apply_change(&mut self, change: ParagraphChange, old_total: f64) {
        match change {
            ParagraphChange::Inserted { index } => self.cache.paragraph_inserted(index),
            ParagraphChange::Removed { index } => self.cache.paragraph_removed(index),
            ParagraphChange::Changed { index } => {
                self.cache.invalidate(index);
            }
            ParagraphChange::Reloaded { count } => {
                self.cache.clear();
                debug!(paragraphs = count, "Document reloaded");
            }
        }
        self.viewport.reclamp(self.store.heights());

        for observer in &mut self.observers {
            observer.on_paragraphs_changed(&change);
        }
        self.notify_total_height(old_total);
    }

    fn notify_total_height(&mut self, old_total: f64) {
        let total = self.store.total_height();
        if total == old_total {
            return;
        }
        self.viewport.reclamp(self.store.heights());
        for observer in &mut self.observers {
            observer.on_total_height_changed(total);
        }
    }
}
