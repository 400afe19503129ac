//! LRU cache for shaped paragraph layouts
//!
//! Keyed by paragraph index. Entries remember the params and source they
//! were shaped from so a dirty entry can be re-trusted without reshaping
//! when the same inputs come back.

use super::layout::ShapedParagraph;
use super::layout_params::LayoutParams;
use crate::model::FormatRun;
use lru::LruCache;
use std::collections::HashMap;

/// Default maximum number of cached layouts.
pub const DEFAULT_CACHE_CEILING: usize = 150;

/// Cached layout for one paragraph.
#[derive(Debug, Clone)]
pub struct LayoutEntry {
    layout: ShapedParagraph,
    params: LayoutParams,
    text: String,
    formats: Vec<FormatRun>,
    dirty: bool,
}

impl LayoutEntry {
    /// Create a clean entry for a freshly shaped paragraph.
    pub fn new(
        layout: ShapedParagraph,
        params: LayoutParams,
        text: impl Into<String>,
        formats: Vec<FormatRun>,
    ) -> Self {
        Self {
            layout,
            params,
            text: text.into(),
            formats,
            dirty: false,
        }
    }

    /// The shaped layout.
    pub fn layout(&self) -> &ShapedParagraph {
        &self.layout
    }

    /// Params the layout was computed with.
    pub fn params(&self) -> &LayoutParams {
        &self.params
    }

    /// Whether the entry has been invalidated.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Clean and computed with the given params.
    pub fn is_trusted(&self, params: &LayoutParams) -> bool {
        !self.dirty && self.params == *params
    }

    fn matches_source(&self, text: &str, formats: &[FormatRun], params: &LayoutParams) -> bool {
        self.params == *params && self.text == text && self.formats == formats
    }
}

/// Bounded layout cache with least-recently-used eviction.
///
/// # Invariants
/// - `len() <= ceiling()` after every public call
/// - An entry is trusted only when clean and shaped with the caller's params
pub struct LayoutCache {
    entries: LruCache<usize, LayoutEntry>,
    ceiling: usize,
    /// Paragraphs whose shaping failed, with the params that failed.
    failures: HashMap<usize, LayoutParams>,
}

impl Default for LayoutCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CEILING)
    }
}

impl std::fmt::Debug for LayoutCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutCache")
            .field("len", &self.entries.len())
            .field("ceiling", &self.ceiling)
            .field("failures", &self.failures.len())
            .finish()
    }
}

impl LayoutCache {
    /// Create an empty cache holding at most `ceiling` layouts.
    ///
    /// A ceiling of zero is treated as one.
    pub fn new(ceiling: usize) -> Self {
        Self {
            entries: LruCache::unbounded(),
            ceiling: ceiling.max(1),
            failures: HashMap::new(),
        }
    }

    /// Maximum number of cached layouts.
    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    /// Change the ceiling, evicting LRU entries if needed.
    ///
    /// Returns the number of evicted entries.
    pub fn set_ceiling(&mut self, ceiling: usize) -> usize {
        self.ceiling = ceiling.max(1);
        self.enforce_ceiling()
    }

    /// Number of cached entries, dirty ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cached paragraph indices, most recently used first.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.iter().map(|(index, _)| *index)
    }

    /// Check for a trusted layout without touching recency.
    pub fn has_layout(&self, index: usize, params: &LayoutParams) -> bool {
        self.entries
            .peek(&index)
            .is_some_and(|entry| entry.is_trusted(params))
    }

    /// Get a trusted layout and mark it most recently used.
    pub fn get(&mut self, index: usize, params: &LayoutParams) -> Option<&ShapedParagraph> {
        if !self.has_layout(index, params) {
            return None;
        }
        self.entries.get(&index).map(LayoutEntry::layout)
    }

    /// Get a trusted layout without touching recency.
    pub fn peek(&self, index: usize, params: &LayoutParams) -> Option<&ShapedParagraph> {
        self.entries
            .peek(&index)
            .filter(|entry| entry.is_trusted(params))
            .map(LayoutEntry::layout)
    }

    /// Get the raw entry, trusted or not, without touching recency.
    pub fn entry(&self, index: usize) -> Option<&LayoutEntry> {
        self.entries.peek(&index)
    }

    /// Store a fresh layout as most recently used.
    ///
    /// Clears any recorded failure for the paragraph. Returns the number of
    /// entries evicted to stay under the ceiling.
    pub fn insert(&mut self, index: usize, entry: LayoutEntry) -> usize {
        self.failures.remove(&index);
        self.entries.put(index, entry);
        self.enforce_ceiling()
    }

    /// Re-trust a dirty entry whose source and params match again.
    ///
    /// Returns true if the entry is now trusted; it is also promoted.
    pub fn try_revalidate(
        &mut self,
        index: usize,
        text: &str,
        formats: &[FormatRun],
        params: &LayoutParams,
    ) -> bool {
        match self.entries.peek_mut(&index) {
            Some(entry) if entry.dirty && entry.matches_source(text, formats, params) => {
                entry.dirty = false;
            }
            _ => return false,
        }
        self.entries.promote(&index);
        true
    }

    /// Mark one entry dirty and forget any failure for it.
    ///
    /// Returns true if an entry was present.
    pub fn invalidate(&mut self, index: usize) -> bool {
        self.failures.remove(&index);
        match self.entries.peek_mut(&index) {
            Some(entry) => {
                entry.dirty = true;
                true
            }
            None => false,
        }
    }

    /// Mark every entry dirty.
    ///
    /// Failures are kept: they are tied to the params that failed and stop
    /// matching on their own once params change.
    pub fn invalidate_all(&mut self) {
        for (_, entry) in self.entries.iter_mut() {
            entry.dirty = true;
        }
    }

    /// Shift keys for a paragraph inserted at `index`.
    ///
    /// Entries at `index` and above move up by one; recency order is kept.
    pub fn paragraph_inserted(&mut self, index: usize) {
        self.rekey(|key| Some(if key >= index { key + 1 } else { key }));
    }

    /// Drop the entry for a removed paragraph and shift higher keys down.
    pub fn paragraph_removed(&mut self, index: usize) {
        self.rekey(|key| match key.cmp(&index) {
            std::cmp::Ordering::Less => Some(key),
            std::cmp::Ordering::Equal => None,
            std::cmp::Ordering::Greater => Some(key - 1),
        });
    }

    /// Evict every entry outside `[keep_first, keep_last]`, then LRU entries
    /// until the ceiling holds.
    ///
    /// Returns the number of evicted entries.
    pub fn release_distant(&mut self, keep_first: usize, keep_last: usize) -> usize {
        let distant: Vec<usize> = self
            .indices()
            .filter(|&index| index < keep_first || index > keep_last)
            .collect();
        for index in &distant {
            self.entries.pop(index);
        }
        distant.len() + self.enforce_ceiling()
    }

    /// Record a shaping failure.
    ///
    /// Returns true if this is the first report for these params.
    pub fn record_failure(&mut self, index: usize, params: &LayoutParams) -> bool {
        match self.failures.insert(index, params.clone()) {
            Some(previous) => previous != *params,
            None => true,
        }
    }

    /// Check whether shaping already failed for this paragraph and params.
    pub fn is_failed(&self, index: usize, params: &LayoutParams) -> bool {
        self.failures.get(&index) == Some(params)
    }

    /// Forget a recorded failure.
    pub fn clear_failure(&mut self, index: usize) {
        self.failures.remove(&index);
    }

    /// Number of paragraphs with a failure recorded for `params`.
    pub fn failure_count(&self, params: &LayoutParams) -> usize {
        self.failures.values().filter(|p| *p == params).count()
    }

    /// Drop all entries and failures.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.failures.clear();
    }

    fn enforce_ceiling(&mut self) -> usize {
        let mut evicted = 0;
        while self.entries.len() > self.ceiling {
            if self.entries.pop_lru().is_none() {
                break;
            }
            evicted += 1;
        }
        evicted
    }

    /// Apply a key mapping to every entry and failure; `None` drops it.
    fn rekey(&mut self, map: impl Fn(usize) -> Option<usize>) {
        // pop_lru yields least recent first, so re-inserting in that order
        // rebuilds the same recency list.
        let mut drained = Vec::with_capacity(self.entries.len());
        while let Some(item) = self.entries.pop_lru() {
            drained.push(item);
        }
        for (key, entry) in drained {
            if let Some(new_key) = map(key) {
                self.entries.put(new_key, entry);
            }
        }

        self.failures = self
            .failures
            .drain()
            .filter_map(|(key, params)| map(key).map(|new_key| (new_key, params)))
            .collect();
    }
}
