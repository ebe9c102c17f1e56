//! Windowed rendering support for the planned row list.
//!
//! Builds a prefix-sum offset table over the rows (O(n) once per plan,
//! O(1) position lookups, O(log n) range queries) so only the visible slice
//! plus an overscan margin is ever rendered. Measured heights override the
//! per-type estimates via a cache keyed by stable row identity, which also
//! powers scroll anchoring across replans. The table presentation mode never
//! goes through here — it renders full period sub-trees.

use crate::grouping::CategoryGroup;
use crate::planner::{row_key, Row, RowKey};
use std::collections::HashMap;
use std::ops::Range;

/// Estimated height of a category header row.
pub const HEADER_HEIGHT: f32 = 94.0;
/// Estimated height of a period sub-header row.
pub const SUBHEADER_HEIGHT: f32 = 50.0;
/// Estimated height of a coin card row.
pub const DATA_ROW_HEIGHT: f32 = 380.0;
/// Rows rendered beyond each edge of the viewport to avoid pop-in.
pub const OVERSCAN: usize = 5;

/// Estimated height for a row by type.
pub fn estimate(row: &Row) -> f32 {
    match row {
        Row::Header { .. } => HEADER_HEIGHT,
        Row::SubHeader { .. } => SUBHEADER_HEIGHT,
        Row::Coins { .. } => DATA_ROW_HEIGHT,
    }
}

// ---------------------------------------------------------------------------
// HeightCache
// ---------------------------------------------------------------------------

/// Measured row heights, keyed by stable row identity so they survive
/// replans (collapse toggles, refetches, resizes that keep the same rows).
#[derive(Debug, Clone, Default)]
pub struct HeightCache {
    measured: HashMap<RowKey, f32>,
}

impl HeightCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a measured height for a row.
    pub fn record(&mut self, key: RowKey, height: f32) {
        self.measured.insert(key, height);
    }

    pub fn get(&self, key: RowKey) -> Option<f32> {
        self.measured.get(&key).copied()
    }

    /// Drop all measurements (e.g. after a column-count change, which
    /// invalidates every chunk identity anyway).
    pub fn clear(&mut self) {
        self.measured.clear();
    }
}

// ---------------------------------------------------------------------------
// Virtualizer
// ---------------------------------------------------------------------------

/// Offset table over one planned row list.
///
/// `offsets` holds `n + 1` prefix sums: `offsets[i]` is row `i`'s top edge,
/// `offsets[n]` the total content height.
#[derive(Debug, Clone)]
pub struct Virtualizer {
    keys: Vec<RowKey>,
    offsets: Vec<f32>,
    index: HashMap<RowKey, usize>,
}

impl Virtualizer {
    /// Build the offset table for a planned row list.
    pub fn new(rows: &[Row], groups: &[CategoryGroup], cache: &HeightCache) -> Self {
        let mut keys = Vec::with_capacity(rows.len());
        let mut offsets = Vec::with_capacity(rows.len() + 1);
        let mut index = HashMap::with_capacity(rows.len());

        let mut cursor = 0.0f32;
        offsets.push(cursor);
        for (i, row) in rows.iter().enumerate() {
            let key = row_key(groups, row);
            let height = cache.get(key).unwrap_or_else(|| estimate(row));
            cursor += height;
            offsets.push(cursor);
            index.insert(key, i);
            keys.push(key);
        }

        Self {
            keys,
            offsets,
            index,
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Total content height.
    pub fn total_size(&self) -> f32 {
        *self.offsets.last().unwrap_or(&0.0)
    }

    /// Top edge of row `i`.
    pub fn offset_of(&self, i: usize) -> f32 {
        self.offsets[i]
    }

    /// Height of row `i`.
    pub fn height_of(&self, i: usize) -> f32 {
        self.offsets[i + 1] - self.offsets[i]
    }

    /// Stable identity of row `i`.
    pub fn key_of(&self, i: usize) -> RowKey {
        self.keys[i]
    }

    /// Index of a row by identity, if it survived the latest replan.
    pub fn index_of(&self, key: RowKey) -> Option<usize> {
        self.index.get(&key).copied()
    }

    /// Index of the row containing the given scroll position.
    pub fn row_at(&self, scroll_top: f32) -> usize {
        let n = self.len();
        self.offsets[..n]
            .partition_point(|&o| o <= scroll_top)
            .saturating_sub(1)
    }

    /// The render window: rows intersecting the viewport, widened by
    /// [`OVERSCAN`] on each side.
    pub fn visible_range(&self, scroll_top: f32, viewport_height: f32) -> Range<usize> {
        let n = self.len();
        if n == 0 {
            return 0..0;
        }

        let first = self.row_at(scroll_top);
        let bottom = scroll_top + viewport_height;
        let end = self.offsets[..n].partition_point(|&o| o < bottom);

        first.saturating_sub(OVERSCAN)..(end + OVERSCAN).min(n)
    }

    /// Scroll offset that keeps the previous anchor row visually stable
    /// after a replan (typically a collapse toggle above the viewport).
    ///
    /// Anchors on the row at `scroll_top` in the previous layout, walking
    /// backward to the nearest surviving row when the anchor itself was
    /// collapsed away.
    pub fn scroll_correction(&self, prev: &Virtualizer, scroll_top: f32) -> f32 {
        if prev.is_empty() || self.is_empty() {
            return scroll_top.min(self.total_size());
        }

        let anchor = prev.row_at(scroll_top);
        for j in (0..=anchor).rev() {
            if let Some(i) = self.index_of(prev.keys[j]) {
                let within = if j == anchor {
                    (scroll_top - prev.offset_of(j)).clamp(0.0, self.height_of(i))
                } else {
                    0.0
                };
                return (self.offset_of(i) + within).min(self.total_size());
            }
        }

        scroll_top.min(self.total_size())
    }
}
