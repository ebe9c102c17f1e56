//! Grouping & sort engine.
//!
//! Partitions a flat coin list into Category -> Period -> Coin hierarchies.
//! Categories are always alphabetical; period order depends on the
//! presentation mode:
//!
//! - **Table mode** is chronological (`period_start_year`), because the pivot
//!   table's row axis is itself chronological.
//! - **Grid mode** bubbles periods up by the extreme coin value matching the
//!   active sort key, so the periods a sort is "about" surface first.

use crate::filters::SortBy;
use crate::models::{Category, Coin};
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Palette
// ---------------------------------------------------------------------------

/// Visual identity of a category band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryColor {
    pub bg: &'static str,
    pub border: &'static str,
    pub text: &'static str,
}

/// Fixed category palette, assigned cyclically by sorted group position.
pub const CATEGORY_PALETTE: [CategoryColor; 6] = [
    CategoryColor { bg: "#fef3c7", border: "#f59e0b", text: "#92400e" },
    CategoryColor { bg: "#fee2e2", border: "#ef4444", text: "#991b1b" },
    CategoryColor { bg: "#dbeafe", border: "#3b82f6", text: "#1e40af" },
    CategoryColor { bg: "#d1fae5", border: "#10b981", text: "#065f46" },
    CategoryColor { bg: "#f3e8ff", border: "#8b5cf6", text: "#5b21b6" },
    CategoryColor { bg: "#f1f5f9", border: "#94a3b8", text: "#475569" },
];

/// Palette slot for a group at `position` among the sorted groups.
pub fn palette_slot(position: usize) -> usize {
    position % CATEGORY_PALETTE.len()
}

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// Identity of a category group. Coins whose `type_id` is absent or unknown
/// land in the synthetic `Uncategorized` bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GroupKey {
    Category(i64),
    Uncategorized,
}

/// Identity of a period group within a category. Period-less coins land in
/// the synthetic `NoPeriod` bucket ("General Issues").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PeriodKey {
    Period(i64),
    NoPeriod,
}

// ---------------------------------------------------------------------------
// PeriodStats / PeriodGroup / CategoryGroup
// ---------------------------------------------------------------------------

/// Aggregate statistics folded over a period's coins, driving grid-mode
/// bubble-up ordering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodStats {
    pub min_year: i32,
    pub max_year: i32,
    pub min_price: f64,
    pub max_price: f64,
}

impl PeriodStats {
    fn new() -> Self {
        Self {
            min_year: i32::MAX,
            max_year: i32::MIN,
            min_price: f64::INFINITY,
            max_price: 0.0,
        }
    }

    fn fold(&mut self, coin: &Coin) {
        let year = coin.year_bucket();
        self.min_year = self.min_year.min(year);
        self.max_year = self.max_year.max(year);
        if let Some(price) = coin.price_usd {
            self.min_price = self.min_price.min(price);
            self.max_price = self.max_price.max(price);
        }
    }

    /// Minimum price with the untouched sentinel read as 0 (a period whose
    /// coins are all unpriced sorts ahead of every priced one, ascending).
    pub fn min_price_or_zero(&self) -> f64 {
        if self.min_price.is_finite() {
            self.min_price
        } else {
            0.0
        }
    }
}

/// One historical period's coins within a category.
#[derive(Debug, Clone)]
pub struct PeriodGroup {
    pub key: PeriodKey,
    pub name: String,
    pub start_year: i32,
    pub coins: Vec<Coin>,
    pub stats: PeriodStats,
}

impl PeriodGroup {
    pub fn owned_count(&self) -> usize {
        self.coins.iter().filter(|c| c.is_owned).count()
    }
}

/// One category band: alphabetically placed, cyclically colored, holding its
/// sorted periods.
#[derive(Debug, Clone)]
pub struct CategoryGroup {
    pub key: GroupKey,
    pub name: String,
    pub palette_slot: usize,
    pub periods: Vec<PeriodGroup>,
}

impl CategoryGroup {
    pub fn coin_count(&self) -> usize {
        self.periods.iter().map(|p| p.coins.len()).sum()
    }

    pub fn owned_count(&self) -> usize {
        self.periods.iter().map(|p| p.owned_count()).sum()
    }

    pub fn color(&self) -> &'static CategoryColor {
        &CATEGORY_PALETTE[self.palette_slot]
    }
}

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

/// Group a flat coin list into sorted category/period hierarchies.
///
/// Pure: same inputs, same output. Empty categories are dropped;
/// "Uncategorized" owes its last place to alphabetical order alone.
pub fn group_coins(
    coins: &[Coin],
    categories: &[Category],
    sort_by: SortBy,
    table_mode: bool,
) -> Vec<CategoryGroup> {
    let names: HashMap<i64, &str> = categories
        .iter()
        .map(|c| (c.type_id, c.type_name.as_str()))
        .collect();

    // Partition by category
    let mut buckets: HashMap<GroupKey, Vec<Coin>> = HashMap::new();
    for coin in coins {
        let key = match coin.type_id {
            Some(id) if names.contains_key(&id) => GroupKey::Category(id),
            _ => GroupKey::Uncategorized,
        };
        buckets.entry(key).or_default().push(coin.clone());
    }

    let mut groups: Vec<CategoryGroup> = buckets
        .into_iter()
        .map(|(key, coins)| {
            let name = match key {
                GroupKey::Category(id) => names[&id].to_string(),
                GroupKey::Uncategorized => "Uncategorized".to_string(),
            };
            CategoryGroup {
                key,
                name,
                palette_slot: 0,
                periods: build_periods(coins, sort_by, table_mode),
            }
        })
        .collect();

    // Alphabetical always, regardless of the active sort
    groups.sort_by(|a, b| a.name.cmp(&b.name));
    for (i, group) in groups.iter_mut().enumerate() {
        group.palette_slot = palette_slot(i);
    }

    groups
}

/// Partition one category's coins into sorted periods.
fn build_periods(coins: Vec<Coin>, sort_by: SortBy, table_mode: bool) -> Vec<PeriodGroup> {
    let mut buckets: HashMap<PeriodKey, PeriodGroup> = HashMap::new();

    for coin in coins {
        let key = match coin.period_id {
            Some(id) => PeriodKey::Period(id),
            None => PeriodKey::NoPeriod,
        };
        let entry = buckets.entry(key).or_insert_with(|| PeriodGroup {
            key,
            name: coin
                .period_name
                .clone()
                .unwrap_or_else(|| "General Issues".to_string()),
            start_year: coin.period_start_year.unwrap_or(0),
            coins: Vec::new(),
            stats: PeriodStats::new(),
        });
        entry.stats.fold(&coin);
        entry.coins.push(coin);
    }

    let mut periods: Vec<PeriodGroup> = buckets.into_values().collect();

    if table_mode {
        // Chronological, matching the pivot table's year axis
        periods.sort_by(|a, b| {
            if sort_by == SortBy::YearAsc {
                a.start_year.cmp(&b.start_year)
            } else {
                b.start_year.cmp(&a.start_year)
            }
        });
    } else {
        // Bubble-up: order by the statistic the active sort is about,
        // falling back to chronology on ties
        periods.sort_by(|a, b| {
            let primary = match sort_by {
                SortBy::YearAsc => a.stats.min_year.cmp(&b.stats.min_year),
                SortBy::YearDesc => b.stats.max_year.cmp(&a.stats.max_year),
                SortBy::PriceDesc => b.stats.max_price.total_cmp(&a.stats.max_price),
                SortBy::PriceAsc => a
                    .stats
                    .min_price_or_zero()
                    .total_cmp(&b.stats.min_price_or_zero()),
            };
            primary.then(b.start_year.cmp(&a.start_year))
        });
    }

    for period in &mut periods {
        sort_period_coins(&mut period.coins, sort_by);
    }

    periods
}

/// Sort a period's coins by the active key and direction.
fn sort_period_coins(coins: &mut [Coin], sort_by: SortBy) {
    coins.sort_by(|a, b| {
        let ord = if sort_by.by_price() {
            a.price_usd
                .unwrap_or(0.0)
                .total_cmp(&b.price_usd.unwrap_or(0.0))
        } else {
            a.year_bucket().cmp(&b.year_bucket())
        };
        if sort_by.ascending() {
            ord
        } else {
            ord.reverse()
        }
    });
}
