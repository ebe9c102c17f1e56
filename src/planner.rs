//! Hierarchical row planner.
//!
//! Flattens the Category -> Period -> Coin hierarchy into a linear sequence
//! of typed rows for the virtualized grid, honoring independent collapse
//! state per category and per (category, period) pair. Pure and cheap: it is
//! recomputed on every collapse toggle, resize, and refetch.

use crate::grouping::{CategoryGroup, GroupKey, PeriodKey};
use std::collections::HashMap;
use std::ops::Range;

// ---------------------------------------------------------------------------
// Columns
// ---------------------------------------------------------------------------

/// Cards per data row at a given viewport width.
pub fn columns_for_width(width: u32) -> usize {
    if width < 650 {
        1
    } else if width < 950 {
        2
    } else if width < 1300 {
        3
    } else {
        4
    }
}

// ---------------------------------------------------------------------------
// CollapseState
// ---------------------------------------------------------------------------

/// Expand/collapse state for the hierarchy.
///
/// Two independent maps with opposite defaults, both intentional: categories
/// start collapsed (absence = collapsed), periods inside an expanded
/// category start expanded (absence = expanded). Period keys are compound —
/// the same period id under two categories collapses independently.
#[derive(Debug, Clone, Default)]
pub struct CollapseState {
    expanded: HashMap<GroupKey, bool>,
    collapsed: HashMap<(GroupKey, PeriodKey), bool>,
}

impl CollapseState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_category_expanded(&self, group: GroupKey) -> bool {
        self.expanded.get(&group).copied().unwrap_or(false)
    }

    pub fn toggle_category(&mut self, group: GroupKey) {
        let entry = self.expanded.entry(group).or_insert(false);
        *entry = !*entry;
    }

    pub fn is_period_expanded(&self, group: GroupKey, period: PeriodKey) -> bool {
        !self
            .collapsed
            .get(&(group, period))
            .copied()
            .unwrap_or(false)
    }

    pub fn toggle_period(&mut self, group: GroupKey, period: PeriodKey) {
        let entry = self.collapsed.entry((group, period)).or_insert(false);
        *entry = !*entry;
    }
}

// ---------------------------------------------------------------------------
// Row / RowKey
// ---------------------------------------------------------------------------

/// One row of the flattened hierarchy. Indices address the `CategoryGroup`
/// slice the plan was computed from; `coins` is a range into that period's
/// coin list (the last chunk may be short — padding is presentation).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Row {
    Header {
        group: usize,
    },
    SubHeader {
        group: usize,
        period: usize,
        count: usize,
        owned_count: usize,
        expanded: bool,
        /// Last visual element of its category: last period, collapsed.
        /// Drives the closing border treatment.
        last_in_group: bool,
    },
    Coins {
        group: usize,
        period: usize,
        coins: Range<usize>,
        /// Final data row of the final period of the final expanded stretch
        /// of its category.
        last: bool,
    },
}

/// Stable identity for a row across replans, keyed by catalog ids rather
/// than positions. Used by the measurement cache and scroll anchoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowKey {
    Header(GroupKey),
    SubHeader(GroupKey, PeriodKey),
    Coins(GroupKey, PeriodKey, usize),
}

/// Resolve a row's stable identity against the groups it was planned from.
pub fn row_key(groups: &[CategoryGroup], row: &Row) -> RowKey {
    match row {
        Row::Header { group } => RowKey::Header(groups[*group].key),
        Row::SubHeader { group, period, .. } => {
            let g = &groups[*group];
            RowKey::SubHeader(g.key, g.periods[*period].key)
        }
        Row::Coins {
            group,
            period,
            coins,
            ..
        } => {
            let g = &groups[*group];
            RowKey::Coins(g.key, g.periods[*period].key, coins.start)
        }
    }
}

// ---------------------------------------------------------------------------
// plan
// ---------------------------------------------------------------------------

/// Flatten the grouped hierarchy into the linear row sequence.
pub fn plan(groups: &[CategoryGroup], collapse: &CollapseState, columns: usize) -> Vec<Row> {
    let columns = columns.max(1);
    let mut rows = Vec::new();

    for (gi, group) in groups.iter().enumerate() {
        rows.push(Row::Header { group: gi });

        if !collapse.is_category_expanded(group.key) {
            continue;
        }

        let period_count = group.periods.len();
        for (pi, period) in group.periods.iter().enumerate() {
            let expanded = collapse.is_period_expanded(group.key, period.key);
            let last_period = pi + 1 == period_count;

            rows.push(Row::SubHeader {
                group: gi,
                period: pi,
                count: period.coins.len(),
                owned_count: period.owned_count(),
                expanded,
                last_in_group: last_period && !expanded,
            });

            if !expanded {
                continue;
            }

            let mut start = 0;
            while start < period.coins.len() {
                let end = (start + columns).min(period.coins.len());
                let last_chunk = end == period.coins.len();
                rows.push(Row::Coins {
                    group: gi,
                    period: pi,
                    coins: start..end,
                    last: last_period && last_chunk,
                });
                start = end;
            }
        }
    }

    rows
}
