//! Numisma SDK for Rust.
//!
//! Provides a high-level client for browsing a numismatic catalog: tens of
//! thousands of coin records are published as parquet snapshots on a CDN,
//! cached locally, and queried in-process via DuckDB. On top of the store
//! sit the browsing engines: an incremental, caching coin fetcher with an
//! ownership overlay, a category/period grouping engine with per-mode sort
//! policies, a hierarchical row planner plus virtualizer for windowed
//! rendering, and a year x denomination pivot for the table view.
//!
//! # Quick start
//!
//! ```no_run
//! use numisma_sdk::NumismaSdk;
//!
//! let sdk = NumismaSdk::builder().build().unwrap();
//!
//! // Browse: fetch, group, and flatten for a 1280px viewport
//! let mut session = sdk.session();
//! let plan = session.plan_rows(1280).unwrap();
//! println!("{} rows over {} categories", plan.rows.len(), plan.groups.len());
//! ```

#[cfg(feature = "async")]
pub mod async_client;
pub mod cache;
pub mod config;
pub mod connection;
pub mod error;
pub mod fetcher;
pub mod filters;
pub mod grouping;
pub mod metadata;
pub mod models;
pub mod overlay;
pub mod pivot;
pub mod planner;
pub mod session;
pub mod sql_builder;
pub mod store;
pub mod virtualizer;

#[cfg(feature = "async")]
pub use async_client::AsyncNumismaSdk;
pub use cache::CacheManager;
pub use connection::Connection;
pub use error::{CatalogError, Result};
pub use fetcher::CoinFetcher;
pub use filters::{FilterSpec, SearchDebouncer, ShowOwned, SortBy};
pub use grouping::{group_coins, CategoryGroup, GroupKey, PeriodGroup, PeriodKey};
pub use metadata::MetadataProvider;
pub use models::{Category, Coin, CoinDetail, Country, OwnedCoin, Period};
pub use overlay::OwnedOverlay;
pub use pivot::{pivot, CellState, PivotTable};
pub use planner::{columns_for_width, plan, CollapseState, Row, RowKey};
pub use session::{BrowseSession, RowPlan, ViewMode};
pub use sql_builder::SqlBuilder;
pub use store::{CatalogStore, CoinQuery, RemoteStore, RowRange};
pub use virtualizer::{HeightCache, Virtualizer};

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ---------------------------------------------------------------------------
// NumismaSdkBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing a [`NumismaSdk`] instance.
///
/// Use [`NumismaSdk::builder()`] to obtain a builder, chain configuration
/// methods, and call [`build()`](NumismaSdkBuilder::build) to create the SDK.
pub struct NumismaSdkBuilder {
    cache_dir: Option<PathBuf>,
    offline: bool,
    timeout: Duration,
}

impl Default for NumismaSdkBuilder {
    fn default() -> Self {
        Self {
            cache_dir: None,
            offline: false,
            timeout: Duration::from_secs(120),
        }
    }
}

impl NumismaSdkBuilder {
    /// Set a custom cache directory.
    ///
    /// If not set, the platform-appropriate default cache directory is used
    /// (e.g. `~/.cache/numisma-sdk` on Linux, `~/Library/Caches/numisma-sdk`
    /// on macOS, `%LOCALAPPDATA%\numisma-sdk` on Windows).
    pub fn cache_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.cache_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enable or disable offline mode.
    ///
    /// When offline, the SDK never downloads from the CDN and only uses
    /// previously cached snapshot files. Defaults to `false`.
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Set the HTTP request timeout for CDN downloads.
    ///
    /// Defaults to 120 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the SDK, initializing the cache and DuckDB connection.
    ///
    /// This may trigger a version check against the CDN (unless offline mode
    /// is enabled) but does **not** download any snapshot files eagerly --
    /// they are fetched lazily on first query.
    pub fn build(self) -> Result<NumismaSdk> {
        let cache = CacheManager::new(self.cache_dir, self.offline, self.timeout)?;
        let conn = Connection::new(cache)?;
        Ok(NumismaSdk {
            store: CatalogStore::new(conn),
        })
    }
}

// ---------------------------------------------------------------------------
// NumismaSdk
// ---------------------------------------------------------------------------

/// The main entry point for the Numisma SDK.
///
/// Owns the [`CatalogStore`] (which owns the [`Connection`] and
/// [`CacheManager`]) and hands out [`BrowseSession`]s that borrow it.
///
/// Created via [`NumismaSdk::builder()`].
pub struct NumismaSdk {
    store: CatalogStore,
}

impl NumismaSdk {
    /// Create a new builder for configuring the SDK.
    pub fn builder() -> NumismaSdkBuilder {
        NumismaSdkBuilder::default()
    }

    /// The DuckDB-backed store, for direct [`RemoteStore`] queries.
    pub fn store(&self) -> &CatalogStore {
        &self.store
    }

    /// Start a browsing session over this SDK's store.
    ///
    /// A session owns its own filter, collapse, overlay, and cache state;
    /// independent surfaces get independent sessions.
    pub fn session(&self) -> BrowseSession<&CatalogStore> {
        BrowseSession::new(&self.store)
    }

    // -- Metadata and utility methods --------------------------------------

    /// Load and return the snapshot metadata (version, published date, etc.).
    ///
    /// Fetches `Meta.json` from the cache (downloading if necessary) and
    /// returns the parsed JSON object.
    pub fn meta(&self) -> Result<serde_json::Value> {
        self.store.connection().cache.borrow_mut().load_json("meta")
    }

    /// Return the list of currently registered DuckDB view names.
    ///
    /// Views are registered lazily on first query, so this list grows as
    /// different queries are issued.
    pub fn views(&self) -> Vec<String> {
        self.store.connection().views()
    }

    /// Execute a raw SQL query against the DuckDB database.
    ///
    /// Provides escape-hatch access for queries not covered by the store
    /// interface.
    ///
    /// # Arguments
    ///
    /// * `query` - SQL string with `?` positional placeholders.
    /// * `params` - Parameter values corresponding to the placeholders.
    ///
    /// # Returns
    ///
    /// A vector of rows, each represented as a `HashMap<String, serde_json::Value>`.
    pub fn sql(
        &self,
        query: &str,
        params: &[String],
    ) -> Result<Vec<HashMap<String, serde_json::Value>>> {
        self.store.connection().execute(query, params)
    }

    /// Check for a newer catalog snapshot and reset views if stale.
    ///
    /// Returns `true` if the snapshot was stale and views were reset (meaning
    /// subsequent queries will re-download data), or `false` if already
    /// up to date.
    pub fn refresh(&self) -> Result<bool> {
        let conn = self.store.connection();
        let stale = conn.cache.borrow_mut().is_stale()?;
        if stale {
            conn.cache.borrow().clear()?;
            conn.reset_views();
            eprintln!("Catalog snapshot was stale; cache cleared and views reset");
        }
        Ok(stale)
    }

    /// Consume the SDK and release all resources.
    ///
    /// Closes the DuckDB connection and HTTP client. This is called
    /// automatically when the SDK is dropped, but can be invoked explicitly
    /// for deterministic cleanup.
    pub fn close(self) {
        drop(self);
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for NumismaSdk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let conn = self.store.connection();
        let views = conn.views();
        let cache = conn.cache.borrow();
        write!(
            f,
            "NumismaSdk(cache_dir={}, views=[{}], offline={})",
            cache.cache_dir.display(),
            views.join(", "),
            cache.offline
        )
    }
}
