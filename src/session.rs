//! Browse session: filter state, overlay freshness, and the
//! fetch -> group -> plan pipeline behind one mutable facade.
//!
//! A session is the state a front end keeps per browsing surface. Every
//! accessor recomputes from explicit inputs (no hidden reactive graph): a
//! caller changes filters or collapse state, then pulls `coins()` /
//! `plan_rows()` again. Remote work only happens in `coins()`, the metadata
//! accessors, and `detail()`.

use crate::error::{CatalogError, Result};
use crate::fetcher::CoinFetcher;
use crate::filters::{FilterSpec, SearchDebouncer, ShowOwned, SortBy};
use crate::grouping::{group_coins, CategoryGroup, GroupKey, PeriodKey};
use crate::metadata::MetadataProvider;
use crate::models::{Category, Coin, CoinDetail, Country, Period};
use crate::overlay::OwnedOverlay;
use crate::planner::{columns_for_width, plan, CollapseState, Row};
use crate::store::RemoteStore;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How long a fetched coin detail stays fresh.
pub const DETAIL_TTL: Duration = Duration::from_secs(30 * 60);

/// Presentation mode: virtualized card grid or per-period pivot tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Grid,
    Table,
}

/// Output of one planning pass: the grouped hierarchy, the column count it
/// was chunked for, and the flattened row list.
#[derive(Debug, Clone)]
pub struct RowPlan {
    pub groups: Vec<CategoryGroup>,
    pub columns: usize,
    pub rows: Vec<Row>,
}

/// One browsing surface's state over a remote store.
pub struct BrowseSession<S: RemoteStore> {
    store: S,
    fetcher: CoinFetcher,
    metadata: MetadataProvider,
    overlay: Option<OwnedOverlay>,
    filters: FilterSpec,
    debouncer: SearchDebouncer,
    collapse: CollapseState,
    view_mode: ViewMode,
    details: HashMap<i64, (CoinDetail, Instant)>,
}

impl<S: RemoteStore> BrowseSession<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            fetcher: CoinFetcher::new(),
            metadata: MetadataProvider::new(),
            overlay: None,
            filters: FilterSpec::default(),
            debouncer: SearchDebouncer::default(),
            collapse: CollapseState::new(),
            view_mode: ViewMode::default(),
            details: HashMap::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // -- Filters -----------------------------------------------------------

    pub fn filters(&self) -> &FilterSpec {
        &self.filters
    }

    /// Record search input. The text is debounced: it only reaches the
    /// filter (and triggers a different fetch key) once the quiet period
    /// elapses before the next `coins()` call.
    pub fn set_search(&mut self, text: impl Into<String>) {
        self.debouncer.push(text);
    }

    pub fn set_country(&mut self, country: Option<i64>) {
        self.filters.set_country(country);
    }

    pub fn set_period(&mut self, period: Option<i64>) {
        self.filters.set_period(period);
    }

    pub fn set_show_owned(&mut self, show_owned: ShowOwned) {
        self.filters.show_owned = show_owned;
    }

    pub fn set_sort_by(&mut self, sort_by: SortBy) {
        self.filters.sort_by = sort_by;
    }

    /// Browsing with no filters at all — the bounded, randomized sample.
    /// Surfaced so the filter bar can gray out the sort control.
    pub fn is_explore_mode(&self) -> bool {
        self.filters.is_browsing() && !self.debouncer.is_pending()
    }

    // -- View state ----------------------------------------------------------

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        self.view_mode = mode;
    }

    pub fn collapse(&self) -> &CollapseState {
        &self.collapse
    }

    pub fn toggle_category(&mut self, group: GroupKey) {
        self.collapse.toggle_category(group);
    }

    pub fn toggle_period(&mut self, group: GroupKey, period: PeriodKey) {
        self.collapse.toggle_period(group, period);
    }

    // -- Metadata ------------------------------------------------------------

    pub fn countries(&mut self) -> Result<&[Country]> {
        self.metadata.countries(&self.store)
    }

    pub fn categories(&mut self) -> Result<&[Category]> {
        self.metadata.categories(&self.store)
    }

    /// Periods for the active country (empty when no country is set).
    pub fn periods(&mut self) -> Result<&[Period]> {
        match self.filters.country {
            Some(country) => self.metadata.periods_for_country(&self.store, country),
            None => Ok(&[]),
        }
    }

    // -- Ownership overlay ---------------------------------------------------

    /// Load the overlay if missing or stale. Coin fetches never run without
    /// it.
    pub fn ensure_overlay(&mut self) -> Result<&OwnedOverlay> {
        let needs_load = self
            .overlay
            .as_ref()
            .map(|o| o.is_stale())
            .unwrap_or(true);
        if needs_load {
            self.overlay = Some(OwnedOverlay::load(&self.store)?);
        }
        Ok(self.overlay.as_ref().unwrap())
    }

    /// Force-reload the overlay, returning the owned-coin count.
    pub fn refresh_overlay(&mut self) -> Result<usize> {
        let overlay = OwnedOverlay::load(&self.store)?;
        let count = overlay.len();
        self.overlay = Some(overlay);
        Ok(count)
    }

    /// Number of owned coins in the current overlay snapshot (0 before the
    /// first load).
    pub fn owned_count(&self) -> usize {
        self.overlay.as_ref().map(|o| o.len()).unwrap_or(0)
    }

    // -- Coins ---------------------------------------------------------------

    /// Fetch the coin list for the current filters.
    ///
    /// Applies any search text whose quiet period has elapsed, makes sure
    /// the overlay snapshot is loaded, then goes through the caching
    /// fetcher.
    pub fn coins(&mut self) -> Result<Arc<Vec<Coin>>> {
        if let Some(search) = self.debouncer.poll() {
            self.filters.search = search;
        }
        self.ensure_overlay()?;
        let overlay = self.overlay.as_ref().unwrap();
        self.fetcher.fetch(&self.store, &self.filters, overlay)
    }

    /// The last successfully displayed coin list, regardless of what the
    /// current filters are (stale-while-revalidate).
    pub fn displayed(&self) -> Option<Arc<Vec<Coin>>> {
        self.fetcher.displayed()
    }

    // -- Grouping / planning -------------------------------------------------

    /// Fetch and group the current coin list for the active view mode.
    pub fn grouped(&mut self) -> Result<Vec<CategoryGroup>> {
        let coins = self.coins()?;
        let table_mode = self.view_mode == ViewMode::Table;
        let sort_by = self.filters.sort_by;
        let categories = self.metadata.categories(&self.store)?;
        Ok(group_coins(&coins, categories, sort_by, table_mode))
    }

    /// Fetch, group, and flatten into the virtualizable row list for a
    /// viewport of the given width.
    pub fn plan_rows(&mut self, viewport_width: u32) -> Result<RowPlan> {
        let groups = self.grouped()?;
        let columns = columns_for_width(viewport_width);
        let rows = plan(&groups, &self.collapse, columns);
        Ok(RowPlan {
            groups,
            columns,
            rows,
        })
    }

    // -- Detail --------------------------------------------------------------

    /// Full detail record for a summary coin, cached for [`DETAIL_TTL`].
    ///
    /// The summary's ownership overlay wins over whatever the detail fetch
    /// returned, so the modal never loses the owned badge or collection
    /// photos.
    pub fn detail(&mut self, summary: &Coin) -> Result<CoinDetail> {
        let id = summary.coin_id;

        let cached = self
            .details
            .get(&id)
            .filter(|(_, at)| at.elapsed() < DETAIL_TTL)
            .map(|(d, _)| d.clone());

        let mut detail = match cached {
            Some(d) => d,
            None => {
                let d = self
                    .store
                    .coin_detail(id)?
                    .ok_or_else(|| CatalogError::NotFound(format!("coin {}", id)))?;
                self.details.insert(id, (d.clone(), Instant::now()));
                d
            }
        };

        detail.merge_summary(summary);
        Ok(detail)
    }
}
