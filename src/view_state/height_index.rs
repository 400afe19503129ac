//! HeightIndex - O(log n) prefix sums and position search via Fenwick tree
//!
//! Provides efficient operations for computing the Y position of a paragraph
//! and finding the paragraph under a vertical offset (scroll position).
//!
//! # Complexity
//!
//! - `set_height`: O(log n)
//! - `prefix_sum`: O(log n)
//! - `find_index_for_y`: O(log n), a single descent over the tree
//! - `insert` / `remove`: O(n), splice then linear rebuild
//! - `resize` / `from_heights`: O(n)
//! - `len`: O(1)
//!
//! Structural changes are rare compared to height corrections during
//! scrolling, so they rebuild the whole tree instead of shifting it.

use crate::model::DocumentError;

/// HeightIndex keeps a Fenwick tree over per-paragraph heights.
///
/// `tree` is 1-indexed with `len() + 1` slots; node `i` holds the sum of the
/// heights in `(i - lowbit(i), i]`. Heights are only ever changed through
/// [`set_height`](Self::set_height), [`insert`](Self::insert) or
/// [`remove`](Self::remove), which keep the tree consistent with `heights`.
#[derive(Debug, Clone)]
pub struct HeightIndex {
    /// Height of each paragraph, 0-indexed.
    heights: Vec<f64>,
    /// Fenwick tree backing storage (1-indexed, `tree[0]` unused).
    tree: Vec<f64>,
}

#[inline]
fn lowbit(i: usize) -> usize {
    i & i.wrapping_neg()
}

/// Largest power of two `<= n`, or 0 for `n == 0`.
#[inline]
fn highest_bit(n: usize) -> usize {
    if n == 0 {
        0
    } else {
        1 << (usize::BITS - 1 - n.leading_zeros())
    }
}

fn check_height(index: usize, height: f64) -> Result<(), DocumentError> {
    if height.is_finite() && height >= 0.0 {
        Ok(())
    } else {
        Err(DocumentError::InvalidHeight { index, height })
    }
}

impl Default for HeightIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl HeightIndex {
    /// Creates an empty HeightIndex.
    ///
    /// # Examples
    ///
    /// ```
    /// # use parlay::view_state::height_index::HeightIndex;
    /// let index = HeightIndex::new();
    /// assert_eq!(index.len(), 0);
    /// assert_eq!(index.total_height(), 0.0);
    /// ```
    pub fn new() -> Self {
        Self {
            heights: Vec::new(),
            tree: vec![0.0],
        }
    }

    /// Creates an index of `len` paragraphs, all `default_height` tall.
    ///
    /// # Panics
    ///
    /// Panics if `default_height` is negative or not finite.
    pub fn with_len(len: usize, default_height: f64) -> Self {
        let mut index = Self::new();
        index.resize(len, default_height);
        index
    }

    /// Builds an index from explicit heights in O(n).
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::InvalidHeight` for the first negative or
    /// non-finite height.
    ///
    /// # Examples
    ///
    /// ```
    /// # use parlay::view_state::height_index::HeightIndex;
    /// let index = HeightIndex::from_heights(vec![10.0, 20.0, 15.0]).unwrap();
    /// assert_eq!(index.prefix_sum(2), 30.0);
    /// assert_eq!(index.total_height(), 45.0);
    /// ```
    pub fn from_heights(heights: Vec<f64>) -> Result<Self, DocumentError> {
        for (i, &h) in heights.iter().enumerate() {
            check_height(i, h)?;
        }
        let mut index = Self {
            heights,
            tree: Vec::new(),
        };
        index.rebuild();
        Ok(index)
    }

    /// Builds an index from heights produced by
    /// [`HeightEstimator::estimate`](crate::model::HeightEstimator::estimate),
    /// which is always finite and non-negative. O(n).
    pub(crate) fn from_estimates(heights: Vec<f64>) -> Self {
        debug_assert!(
            heights.iter().enumerate().all(|(i, &h)| check_height(i, h).is_ok()),
            "estimator produced an invalid height"
        );
        let mut index = Self {
            heights,
            tree: Vec::new(),
        };
        index.rebuild();
        index
    }

    /// Reinitializes to `len` entries, all `default_height`. O(n).
    ///
    /// # Panics
    ///
    /// Panics if `default_height` is negative or not finite.
    pub fn resize(&mut self, len: usize, default_height: f64) {
        assert!(
            check_height(0, default_height).is_ok(),
            "invalid default height {default_height}"
        );
        self.heights.clear();
        self.heights.resize(len, default_height);
        self.rebuild();
    }

    /// Returns the number of paragraphs in the index.
    pub fn len(&self) -> usize {
        self.heights.len()
    }

    /// Returns true if the index contains no paragraphs.
    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }

    /// Height of the paragraph at `index`, or `None` if out of range.
    pub fn height(&self, index: usize) -> Option<f64> {
        self.heights.get(index).copied()
    }

    /// Iterate over all heights in paragraph order.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.heights.iter().copied()
    }

    /// Sets the height at the given index and returns the previous height.
    ///
    /// Applies the delta to the tree in O(log n).
    ///
    /// # Errors
    ///
    /// Fails if `index >= len()` or the height is negative or not finite.
    ///
    /// # Examples
    ///
    /// ```
    /// # use parlay::view_state::height_index::HeightIndex;
    /// let mut index = HeightIndex::with_len(3, 10.0);
    /// let old = index.set_height(1, 25.0).unwrap();
    /// assert_eq!(old, 10.0);
    /// assert_eq!(index.total_height(), 45.0);
    /// assert!(index.set_height(3, 1.0).is_err());
    /// ```
    pub fn set_height(&mut self, index: usize, height: f64) -> Result<f64, DocumentError> {
        let len = self.len();
        let slot = self
            .heights
            .get_mut(index)
            .ok_or(DocumentError::IndexOutOfRange {
                operation: "HeightIndex::set_height",
                index,
                len,
            })?;
        check_height(index, height)?;

        let old = *slot;
        *slot = height;
        let delta = height - old;
        if delta != 0.0 {
            let mut i = index + 1;
            while i <= len {
                self.tree[i] += delta;
                i += lowbit(i);
            }
        }
        Ok(old)
    }

    /// Returns the sum of `heights[0..index)`, the Y position of paragraph `index`.
    ///
    /// `prefix_sum(0) == 0.0` and `prefix_sum(len()) == total_height()`.
    ///
    /// Nodes are accumulated high bit first, the same order in which
    /// [`find_index_for_y`](Self::find_index_for_y) accumulates them, so the
    /// two agree exactly on paragraph boundaries.
    ///
    /// # Panics
    ///
    /// Panics if `index > len()`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use parlay::view_state::height_index::HeightIndex;
    /// let index = HeightIndex::from_heights(vec![3.0, 4.0, 5.0]).unwrap();
    /// assert_eq!(index.prefix_sum(0), 0.0);
    /// assert_eq!(index.prefix_sum(1), 3.0);
    /// assert_eq!(index.prefix_sum(3), 12.0);
    /// ```
    pub fn prefix_sum(&self, index: usize) -> f64 {
        assert!(
            index <= self.len(),
            "index {} out of bounds (len: {})",
            index,
            self.len()
        );

        let mut sum = 0.0;
        let mut pos = 0;
        let mut bit = highest_bit(index);
        while bit > 0 {
            if index & bit != 0 {
                pos += bit;
                sum += self.tree[pos];
            }
            bit >>= 1;
        }
        sum
    }

    /// Returns the total height of all paragraphs.
    pub fn total_height(&self) -> f64 {
        self.prefix_sum(self.len())
    }

    /// Returns the paragraph whose `[y, y + height)` range contains `y`.
    ///
    /// This is the largest `p` with `prefix_sum(p) <= y`, found with one
    /// descent over the tree's power-of-two decomposition. A boundary belongs
    /// to the paragraph starting there; zero-height paragraphs own no
    /// position and are never returned for `y` inside the document.
    ///
    /// - `y < 0` (or NaN) returns 0
    /// - `y >= total_height()` returns `len()`
    ///
    /// # Examples
    ///
    /// ```
    /// # use parlay::view_state::height_index::HeightIndex;
    /// let index = HeightIndex::from_heights(vec![10.0, 20.0, 15.0]).unwrap();
    /// assert_eq!(index.find_index_for_y(0.0), 0);
    /// assert_eq!(index.find_index_for_y(9.5), 0);
    /// assert_eq!(index.find_index_for_y(10.0), 1);
    /// assert_eq!(index.find_index_for_y(30.0), 2);
    /// assert_eq!(index.find_index_for_y(45.0), 3);
    /// assert_eq!(index.find_index_for_y(-5.0), 0);
    /// ```
    pub fn find_index_for_y(&self, y: f64) -> usize {
        if y.is_nan() || y < 0.0 || self.is_empty() {
            return 0;
        }
        if y >= self.total_height() {
            return self.len();
        }
        self.descend(|sum| sum <= y)
    }

    /// Returns the largest `p` with `prefix_sum(p) < y`.
    ///
    /// This is the paragraph whose `(y, y + height]` range contains `y`: the
    /// last paragraph that reaches above an exclusive bottom edge at `y`.
    /// Returns 0 for `y <= 0` and `len()` when `y > total_height()`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use parlay::view_state::height_index::HeightIndex;
    /// let index = HeightIndex::with_len(4, 10.0);
    /// assert_eq!(index.find_index_before_y(20.0), 1);
    /// assert_eq!(index.find_index_before_y(20.5), 2);
    /// assert_eq!(index.find_index_before_y(0.0), 0);
    /// ```
    pub fn find_index_before_y(&self, y: f64) -> usize {
        if y.is_nan() || y <= 0.0 || self.is_empty() {
            return 0;
        }
        self.descend(|sum| sum < y)
    }

    /// Largest `pos` such that `accept(prefix_sum(pos))` holds, for a
    /// predicate that is monotone over the prefix sums.
    fn descend(&self, accept: impl Fn(f64) -> bool) -> usize {
        let len = self.len();
        let mut pos = 0;
        let mut sum = 0.0;
        let mut mask = highest_bit(len);
        while mask > 0 {
            let next = pos + mask;
            if next <= len && accept(sum + self.tree[next]) {
                pos = next;
                sum += self.tree[next];
            }
            mask >>= 1;
        }
        pos
    }

    /// Inserts a paragraph height at `index`, shifting later paragraphs. O(n).
    ///
    /// # Errors
    ///
    /// Fails if `index > len()` or the height is invalid.
    pub fn insert(&mut self, index: usize, height: f64) -> Result<(), DocumentError> {
        if index > self.len() {
            return Err(DocumentError::IndexOutOfRange {
                operation: "HeightIndex::insert",
                index,
                len: self.len(),
            });
        }
        check_height(index, height)?;
        self.heights.insert(index, height);
        self.rebuild();
        Ok(())
    }

    /// Removes the paragraph height at `index` and returns it. O(n).
    ///
    /// # Errors
    ///
    /// Fails if `index >= len()`.
    pub fn remove(&mut self, index: usize) -> Result<f64, DocumentError> {
        if index >= self.len() {
            return Err(DocumentError::IndexOutOfRange {
                operation: "HeightIndex::remove",
                index,
                len: self.len(),
            });
        }
        let removed = self.heights.remove(index);
        self.rebuild();
        Ok(removed)
    }

    /// Clears all entries, resetting to empty state.
    pub fn clear(&mut self) {
        self.heights.clear();
        self.rebuild();
    }

    /// Linear-time construction: seed each node with its own height, then
    /// push every node's total into its parent.
    fn rebuild(&mut self) {
        let len = self.heights.len();
        self.tree.clear();
        self.tree.reserve(len + 1);
        self.tree.push(0.0);
        self.tree.extend_from_slice(&self.heights);
        for i in 1..=len {
            let parent = i + lowbit(i);
            if parent <= len {
                let node = self.tree[i];
                self.tree[parent] += node;
            }
        }
    }
}
