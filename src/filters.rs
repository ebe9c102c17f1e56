//! Filter state for the coin browser.
//!
//! A [`FilterSpec`] is an immutable-ish value object; its serialized form is
//! the identity used for fetch caching and request deduplication.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Quiet period a search string must survive before it triggers a fetch.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

// ---------------------------------------------------------------------------
// SortBy / ShowOwned
// ---------------------------------------------------------------------------

/// Sort key + direction for the coin list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    #[default]
    YearDesc,
    YearAsc,
    PriceDesc,
    PriceAsc,
}

impl SortBy {
    /// The remote column this sort key orders by.
    pub fn column(self) -> &'static str {
        match self {
            SortBy::YearDesc | SortBy::YearAsc => "year",
            SortBy::PriceDesc | SortBy::PriceAsc => "price_usd",
        }
    }

    /// Whether this sort key orders ascending.
    pub fn ascending(self) -> bool {
        matches!(self, SortBy::YearAsc | SortBy::PriceAsc)
    }

    /// Whether this sort key orders by price (rather than year).
    pub fn by_price(self) -> bool {
        matches!(self, SortBy::PriceDesc | SortBy::PriceAsc)
    }
}

/// Ownership filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShowOwned {
    #[default]
    All,
    Owned,
}

// ---------------------------------------------------------------------------
// FilterSpec
// ---------------------------------------------------------------------------

/// The complete filter state driving a coin fetch.
///
/// Invariant: `period` is never set without a consistent `country` — the
/// setters clear the period whenever the country clears or changes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterSpec {
    pub search: String,
    pub country: Option<i64>,
    pub period: Option<i64>,
    pub show_owned: ShowOwned,
    pub sort_by: SortBy,
}

impl FilterSpec {
    /// Set (or clear) the country filter. Clearing or changing the country
    /// always clears the period, which is scoped to it.
    pub fn set_country(&mut self, country: Option<i64>) {
        if self.country != country {
            self.period = None;
        }
        self.country = country;
    }

    /// Set (or clear) the period filter. Ignored while no country is active.
    pub fn set_period(&mut self, period: Option<i64>) {
        if self.country.is_some() {
            self.period = period;
        }
    }

    /// Browsing mode: nothing filtered at all. The fetcher takes a bounded,
    /// randomized sample instead of an exhaustive batched fetch.
    pub fn is_browsing(&self) -> bool {
        self.search.is_empty()
            && self.country.is_none()
            && self.period.is_none()
            && self.show_owned == ShowOwned::All
    }

    /// Cache/dedup key: the serialized filter state.
    pub fn cache_key(&self) -> String {
        serde_json::to_string(self).expect("FilterSpec serializes")
    }
}

// ---------------------------------------------------------------------------
// SearchDebouncer
// ---------------------------------------------------------------------------

/// Coalesces rapid search keystrokes into a single value per quiet window.
///
/// `push` records the latest text; `poll` yields it once the quiet period
/// has elapsed with no further pushes. Only the final text of a window is
/// ever yielded.
#[derive(Debug)]
pub struct SearchDebouncer {
    pending: Option<String>,
    since: Instant,
    quiet: Duration,
}

impl Default for SearchDebouncer {
    fn default() -> Self {
        Self::new(SEARCH_DEBOUNCE)
    }
}

impl SearchDebouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            pending: None,
            since: Instant::now(),
            quiet,
        }
    }

    /// Record a keystroke's worth of search text, restarting the quiet timer.
    pub fn push(&mut self, text: impl Into<String>) {
        self.push_at(text, Instant::now());
    }

    /// `push` with an explicit timestamp.
    pub fn push_at(&mut self, text: impl Into<String>, now: Instant) {
        self.pending = Some(text.into());
        self.since = now;
    }

    /// Yield the pending text if the quiet period has elapsed.
    pub fn poll(&mut self) -> Option<String> {
        self.poll_at(Instant::now())
    }

    /// `poll` with an explicit timestamp.
    pub fn poll_at(&mut self, now: Instant) -> Option<String> {
        if self.pending.is_some() && now.duration_since(self.since) >= self.quiet {
            self.pending.take()
        } else {
            None
        }
    }

    /// Yield the pending text immediately, bypassing the quiet period.
    pub fn flush(&mut self) -> Option<String> {
        self.pending.take()
    }

    /// Whether a push is waiting out its quiet period.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}
