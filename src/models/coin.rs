use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Coin — the primary record (fact row + denormalized dimension columns)
// ---------------------------------------------------------------------------

/// A single coin as returned by the fetcher.
///
/// The first block of fields mirrors the `coins` fact table; the
/// `*_name`/`*_link`/`*_range` columns are denormalized from the dimension
/// tables at query time. The final block is the ownership overlay, attached
/// by the fetcher and never read from the remote store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coin {
    pub coin_id: i64,
    pub name: Option<String>,
    pub year: Option<i32>,
    pub price_usd: Option<f64>,
    pub km: Option<String>,
    pub subject: Option<String>,
    pub marked: Option<bool>,

    pub type_id: Option<i64>,
    pub period_id: Option<i64>,
    pub denomination_id: Option<i64>,
    pub series_id: Option<i64>,

    pub denomination_name: Option<String>,
    pub period_name: Option<String>,
    pub period_start_year: Option<i32>,
    pub period_link: Option<String>,
    pub series_name: Option<String>,
    pub series_range: Option<String>,
    pub series_link: Option<String>,

    // -- Ownership overlay (attached by the fetcher) --
    #[serde(default)]
    pub is_owned: bool,
    #[serde(default)]
    pub display_obverse: Option<String>,
    #[serde(default)]
    pub display_reverse: Option<String>,
}

impl Coin {
    /// Display name, falling back to `"Unnamed Coin"`.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unnamed Coin")
    }

    /// The year bucket this coin falls in: 0 (or absent) means "no date".
    pub fn year_bucket(&self) -> i32 {
        self.year.unwrap_or(0)
    }

    /// Year label, `"ND"` for undated coins.
    pub fn year_label(&self) -> String {
        match self.year {
            Some(y) if y > 0 => y.to_string(),
            _ => "ND".to_string(),
        }
    }

    /// Formatted USD price, `"N/A"` when unpriced.
    pub fn price_label(&self) -> String {
        match self.price_usd {
            Some(p) => format!("${:.2}", p),
            None => "N/A".to_string(),
        }
    }

    /// Whether the rarity flag is set.
    pub fn is_marked(&self) -> bool {
        self.marked.unwrap_or(false)
    }
}

// ---------------------------------------------------------------------------
// CoinDetail — full joined record for the detail view
// ---------------------------------------------------------------------------

/// Full coin record for the detail view.
///
/// Carries every [`Coin`] column plus the category name and the country
/// name (resolved through the period -> country bridge in a secondary
/// lookup).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoinDetail {
    #[serde(flatten)]
    pub coin: Coin,
    pub type_name: Option<String>,
    #[serde(default)]
    pub country_name: Option<String>,
}

impl CoinDetail {
    /// Carry the ownership overlay over from the summary record.
    ///
    /// The detail fetch goes straight to the remote store and knows nothing
    /// about the overlay, so the summary's ownership fields win.
    pub fn merge_summary(&mut self, summary: &Coin) {
        self.coin.is_owned = summary.is_owned;
        self.coin.display_obverse = summary.display_obverse.clone();
        self.coin.display_reverse = summary.display_reverse.clone();
    }

    /// Country label, falling back to `"Unknown"`.
    pub fn country_label(&self) -> &str {
        self.country_name.as_deref().unwrap_or("Unknown")
    }
}
