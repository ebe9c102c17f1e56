//! Pivot table engine.
//!
//! Pivots one period's coins into a Year x Denomination matrix for the table
//! presentation mode: rows are distinct years (newest first, undated coins in
//! a "no date" bucket), columns are denominations ordered by parsed face
//! value, and each cell holds every coin sharing that (year, denomination)
//! pair together with its aggregate ownership state.

use crate::models::Coin;
use std::collections::HashMap;

/// Aggregate ownership state of one matrix cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellState {
    /// Every coin in the cell is owned.
    AllOwned,
    /// Some, but not all, coins in the cell are owned.
    Mixed,
    /// The cell has coins, none owned.
    Unowned,
    /// No coins map to this (year, denomination) pair.
    Empty,
}

/// Row label for a year bucket; 0 (or negative) is the "no date" bucket.
pub fn year_label(year: i32) -> String {
    if year > 0 {
        year.to_string()
    } else {
        "ND".to_string()
    }
}

/// Leading numeric face value of a denomination name, `parseFloat`-style:
/// `"2 Francs"` -> 2.0, `"0.5 Rupee"` -> 0.5, `"Half Dollar"` -> 0.0.
pub fn parse_face_value(name: &str) -> f64 {
    let t = name.trim_start();
    let mut end = 0;
    for (i, ch) in t.char_indices() {
        let numeric = ch.is_ascii_digit() || ch == '.' || (i == 0 && (ch == '-' || ch == '+'));
        if !numeric {
            break;
        }
        end = i + ch.len_utf8();
    }

    let mut prefix = &t[..end];
    while !prefix.is_empty() {
        if let Ok(v) = prefix.parse::<f64>() {
            return v;
        }
        prefix = &prefix[..prefix.len() - 1];
    }
    0.0
}

// ---------------------------------------------------------------------------
// PivotTable
// ---------------------------------------------------------------------------

/// Year x Denomination matrix over one period's coins.
#[derive(Debug, Clone)]
pub struct PivotTable {
    /// Distinct year buckets, descending (0 = "no date").
    pub years: Vec<i32>,
    /// Distinct denomination names, by face value ascending, ties lexical.
    pub denominations: Vec<String>,
    cells: HashMap<i32, HashMap<String, Vec<Coin>>>,
}

/// Pivot a period's coins into the year x denomination matrix.
pub fn pivot(coins: &[Coin]) -> PivotTable {
    let mut cells: HashMap<i32, HashMap<String, Vec<Coin>>> = HashMap::new();

    for coin in coins {
        let year = coin.year_bucket();
        let denom = coin
            .denomination_name
            .clone()
            .unwrap_or_else(|| "Unknown".to_string());
        cells
            .entry(year)
            .or_default()
            .entry(denom)
            .or_default()
            .push(coin.clone());
    }

    // Owned coins lead each cell, then subject order
    for by_denom in cells.values_mut() {
        for cell in by_denom.values_mut() {
            cell.sort_by(|a, b| {
                b.is_owned.cmp(&a.is_owned).then_with(|| {
                    a.subject
                        .as_deref()
                        .unwrap_or("")
                        .cmp(b.subject.as_deref().unwrap_or(""))
                })
            });
        }
    }

    let mut years: Vec<i32> = cells.keys().copied().collect();
    years.sort_unstable_by(|a, b| b.cmp(a));

    let mut denominations: Vec<String> = cells
        .values()
        .flat_map(|by_denom| by_denom.keys().cloned())
        .collect();
    denominations.sort();
    denominations.dedup();
    denominations.sort_by(|a, b| {
        parse_face_value(a)
            .total_cmp(&parse_face_value(b))
            .then_with(|| a.cmp(b))
    });

    PivotTable {
        years,
        denominations,
        cells,
    }
}

impl PivotTable {
    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    /// Coins in one cell, owned-first. Empty slice for empty cells.
    pub fn cell(&self, year: i32, denomination: &str) -> &[Coin] {
        self.cells
            .get(&year)
            .and_then(|by_denom| by_denom.get(denomination))
            .map(|cell| cell.as_slice())
            .unwrap_or(&[])
    }

    /// Aggregate ownership state of one cell.
    pub fn cell_state(&self, year: i32, denomination: &str) -> CellState {
        let cell = self.cell(year, denomination);
        if cell.is_empty() {
            return CellState::Empty;
        }
        let owned = cell.iter().filter(|c| c.is_owned).count();
        if owned == cell.len() {
            CellState::AllOwned
        } else if owned > 0 {
            CellState::Mixed
        } else {
            CellState::Unowned
        }
    }

    /// Coins across the whole matrix belonging to one series, in table
    /// order. Backs the cross-cell series highlight.
    pub fn series_members(&self, series_id: i64) -> Vec<&Coin> {
        let mut members = Vec::new();
        for year in &self.years {
            for denom in &self.denominations {
                for coin in self.cell(*year, denom) {
                    if coin.series_id == Some(series_id) {
                        members.push(coin);
                    }
                }
            }
        }
        members
    }
}
