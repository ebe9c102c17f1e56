//! Incremental coin fetcher.
//!
//! Turns a [`FilterSpec`] plus an [`OwnedOverlay`] snapshot into an ordered,
//! overlay-merged coin list:
//!
//! - **Browsing** (no filters at all): one bounded request, order randomized.
//! - **Filtered** (anything else): range-bounded batches concatenated until a
//!   short page signals the end of data.
//!
//! Results are cached per serialized filter key with a short TTL, and the
//! last successful result is kept displayable while a fetch for a changed
//! key is in flight (stale-while-revalidate). A completion that lost the
//! race to a newer request for a different key is cached but never shown.

use crate::error::Result;
use crate::filters::{FilterSpec, ShowOwned};
use crate::models::Coin;
use crate::overlay::OwnedOverlay;
use crate::store::{CoinQuery, RemoteStore, RowRange};
use rand::seq::SliceRandom;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Safety cap on the unfiltered browsing sample.
pub const BROWSE_LIMIT: usize = 200;

/// Window size for the exhaustive batched fetch.
pub const BATCH_SIZE: usize = 1000;

/// How long a fetched result stays fresh in the per-filter cache.
pub const RESULT_TTL: Duration = Duration::from_secs(5 * 60);

// ---------------------------------------------------------------------------
// FetchTicket
// ---------------------------------------------------------------------------

/// Handle for an announced fetch, used to detect superseded completions.
///
/// [`CoinFetcher::fetch`] manages tickets internally; async front-ends that
/// overlap requests call [`begin`](CoinFetcher::begin) /
/// [`complete`](CoinFetcher::complete) themselves.
#[derive(Debug)]
pub struct FetchTicket {
    id: u64,
    key: String,
}

impl FetchTicket {
    /// The filter key this ticket was issued for.
    pub fn key(&self) -> &str {
        &self.key
    }
}

// ---------------------------------------------------------------------------
// CoinFetcher
// ---------------------------------------------------------------------------

struct CacheEntry {
    coins: Arc<Vec<Coin>>,
    fetched_at: Instant,
}

/// Fetches coin lists and caches them per filter key.
pub struct CoinFetcher {
    ttl: Duration,
    cache: RefCell<HashMap<String, CacheEntry>>,
    seq: Cell<u64>,
    newest: RefCell<Option<(u64, String)>>,
    displayed: RefCell<Option<(String, Arc<Vec<Coin>>)>>,
}

impl Default for CoinFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl CoinFetcher {
    pub fn new() -> Self {
        Self::with_ttl(RESULT_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            cache: RefCell::new(HashMap::new()),
            seq: Cell::new(0),
            newest: RefCell::new(None),
            displayed: RefCell::new(None),
        }
    }

    /// Fetch the coin list for a filter, consulting the cache first.
    ///
    /// The overlay snapshot must already be loaded — the fetcher never runs
    /// without one, which is what keeps `is_owned` populated on every coin
    /// it returns.
    pub fn fetch<S: RemoteStore>(
        &self,
        store: &S,
        filter: &FilterSpec,
        overlay: &OwnedOverlay,
    ) -> Result<Arc<Vec<Coin>>> {
        let key = filter.cache_key();

        if let Some(hit) = self.cached_by_key(&key) {
            // A cache hit still represents the current intent: point the
            // displayed slot at it so an older in-flight completion for a
            // different key cannot replace it.
            self.begin(filter);
            *self.displayed.borrow_mut() = Some((key, hit.clone()));
            return Ok(hit);
        }

        let ticket = self.begin(filter);
        let coins = run_query(store, filter, overlay)?;
        Ok(self.complete(ticket, coins))
    }

    /// Announce a fetch for a filter, superseding older announcements.
    pub fn begin(&self, filter: &FilterSpec) -> FetchTicket {
        let id = self.seq.get() + 1;
        self.seq.set(id);
        let key = filter.cache_key();
        *self.newest.borrow_mut() = Some((id, key.clone()));
        FetchTicket { id, key }
    }

    /// Install a completed fetch.
    ///
    /// The result is always cached under its own key; the displayed slot is
    /// only updated when no newer request for a *different* key has been
    /// announced since this ticket was issued.
    pub fn complete(&self, ticket: FetchTicket, coins: Vec<Coin>) -> Arc<Vec<Coin>> {
        let coins = Arc::new(coins);
        self.cache.borrow_mut().insert(
            ticket.key.clone(),
            CacheEntry {
                coins: coins.clone(),
                fetched_at: Instant::now(),
            },
        );

        let superseded = match &*self.newest.borrow() {
            Some((newest_id, newest_key)) => *newest_id > ticket.id && *newest_key != ticket.key,
            None => false,
        };
        if !superseded {
            *self.displayed.borrow_mut() = Some((ticket.key, coins.clone()));
        }

        coins
    }

    /// The last successfully displayed result (stale-while-revalidate view).
    pub fn displayed(&self) -> Option<Arc<Vec<Coin>>> {
        self.displayed.borrow().as_ref().map(|(_, c)| c.clone())
    }

    /// The filter key whose result is currently displayed.
    pub fn displayed_key(&self) -> Option<String> {
        self.displayed.borrow().as_ref().map(|(k, _)| k.clone())
    }

    /// Fresh cached result for a filter, if any.
    pub fn cached(&self, filter: &FilterSpec) -> Option<Arc<Vec<Coin>>> {
        self.cached_by_key(&filter.cache_key())
    }

    /// Drop every cached result (displayed slot is left alone).
    pub fn invalidate(&self) {
        self.cache.borrow_mut().clear();
    }

    fn cached_by_key(&self, key: &str) -> Option<Arc<Vec<Coin>>> {
        let cache = self.cache.borrow();
        let entry = cache.get(key)?;
        if entry.fetched_at.elapsed() < self.ttl {
            Some(entry.coins.clone())
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Query execution
// ---------------------------------------------------------------------------

/// Execute the remote side of a fetch and merge the overlay.
fn run_query<S: RemoteStore>(
    store: &S,
    filter: &FilterSpec,
    overlay: &OwnedOverlay,
) -> Result<Vec<Coin>> {
    // Filtering down to owned coins with nothing owned needs no remote call.
    if filter.show_owned == ShowOwned::Owned && overlay.is_empty() {
        return Ok(Vec::new());
    }

    let mut query = CoinQuery {
        sort: filter.sort_by,
        ..CoinQuery::default()
    };

    if filter.show_owned == ShowOwned::Owned {
        query.owned_ids = Some(overlay.owned_ids());
    }

    if !filter.search.is_empty() {
        query.search = Some(filter.search.clone());
    }

    match (filter.country, filter.period) {
        (Some(country), None) => {
            // Resolve the country's periods up front so the main query stays
            // join-free. No periods means no coins can match.
            let period_ids = store.period_ids_for_country(country)?;
            if period_ids.is_empty() {
                return Ok(Vec::new());
            }
            query.period_ids = Some(period_ids);
        }
        (_, Some(period)) => {
            query.period_id = Some(period);
        }
        _ => {}
    }

    let mut coins = if filter.is_browsing() {
        let mut sample = store.coins(
            &query,
            Some(RowRange {
                offset: 0,
                limit: BROWSE_LIMIT,
            }),
        )?;
        // The browsing view is for exploration, not inspection: present a
        // random order rather than the sort column.
        sample.shuffle(&mut rand::thread_rng());
        sample
    } else {
        let mut all = Vec::new();
        let mut offset = 0;
        loop {
            let page = store.coins(
                &query,
                Some(RowRange {
                    offset,
                    limit: BATCH_SIZE,
                }),
            )?;
            let n = page.len();
            if n == 0 {
                break;
            }
            all.extend(page);
            if n < BATCH_SIZE {
                break;
            }
            offset += BATCH_SIZE;
        }
        all
    };

    for coin in &mut coins {
        overlay.apply(coin);
    }

    Ok(coins)
}
