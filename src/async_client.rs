//! Async wrapper around [`NumismaSdk`] for use in async runtimes (Tokio, etc.).
//!
//! Runs all SDK operations on a blocking thread pool via
//! [`tokio::task::spawn_blocking`], keeping the async event loop free.
//! DuckDB queries are CPU-bound but fast, making this approach efficient.
//! Front ends that overlap fetches use the fetcher's ticket API
//! ([`CoinFetcher::begin`](crate::fetcher::CoinFetcher::begin) /
//! [`complete`](crate::fetcher::CoinFetcher::complete)) so a slow completion
//! can never clobber a newer filter's result.
//!
//! # Example
//!
//! ```no_run
//! use numisma_sdk::AsyncNumismaSdk;
//!
//! #[tokio::main]
//! async fn main() {
//!     let sdk = AsyncNumismaSdk::builder().build().await.unwrap();
//!
//!     // Run any sync SDK method via closure
//!     let countries = sdk.run(|s| {
//!         use numisma_sdk::store::RemoteStore;
//!         s.store().countries()
//!     }).await.unwrap();
//!     println!("{} countries", countries.len());
//! }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::{CatalogError, Result};
use crate::NumismaSdk;

// ---------------------------------------------------------------------------
// AsyncNumismaSdkBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing an [`AsyncNumismaSdk`] instance.
pub struct AsyncNumismaSdkBuilder {
    cache_dir: Option<PathBuf>,
    offline: bool,
    timeout: Duration,
}

impl Default for AsyncNumismaSdkBuilder {
    fn default() -> Self {
        Self {
            cache_dir: None,
            offline: false,
            timeout: Duration::from_secs(120),
        }
    }
}

impl AsyncNumismaSdkBuilder {
    /// Set a custom cache directory.
    pub fn cache_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.cache_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enable or disable offline mode.
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Set the HTTP request timeout for CDN downloads.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the async SDK, initializing the cache and DuckDB connection.
    ///
    /// Initialization runs on the blocking thread pool so it won't block
    /// the async event loop.
    pub async fn build(self) -> Result<AsyncNumismaSdk> {
        tokio::task::spawn_blocking(move || {
            let mut builder = NumismaSdk::builder();
            if let Some(dir) = self.cache_dir {
                builder = builder.cache_dir(dir);
            }
            builder = builder.offline(self.offline).timeout(self.timeout);
            let sdk = builder.build()?;
            Ok(AsyncNumismaSdk {
                inner: Arc::new(Mutex::new(sdk)),
            })
        })
        .await
        .map_err(|e| CatalogError::InvalidArgument(format!("Task join error: {e}")))?
    }
}

// ---------------------------------------------------------------------------
// AsyncNumismaSdk
// ---------------------------------------------------------------------------

/// Async wrapper around [`NumismaSdk`].
///
/// All operations are dispatched to a blocking thread pool via
/// [`tokio::task::spawn_blocking`]. The underlying [`NumismaSdk`] is
/// protected by a [`Mutex`] since it uses `RefCell` internally.
pub struct AsyncNumismaSdk {
    inner: Arc<Mutex<NumismaSdk>>,
}

impl AsyncNumismaSdk {
    /// Create a new builder for configuring the async SDK.
    pub fn builder() -> AsyncNumismaSdkBuilder {
        AsyncNumismaSdkBuilder::default()
    }

    /// Run a sync SDK operation on the blocking thread pool.
    ///
    /// The closure receives an `&NumismaSdk` reference and should return
    /// a `Result<T>`. The operation runs on a dedicated blocking thread,
    /// keeping the async event loop free.
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&NumismaSdk) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let sdk = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let guard = sdk
                .lock()
                .map_err(|_| CatalogError::InvalidArgument("SDK lock poisoned".into()))?;
            f(&guard)
        })
        .await
        .map_err(|e| CatalogError::InvalidArgument(format!("Task join error: {e}")))?
    }

    /// Execute a raw SQL query asynchronously.
    pub async fn sql(
        &self,
        query: &str,
        params: &[String],
    ) -> Result<Vec<HashMap<String, serde_json::Value>>> {
        let query = query.to_string();
        let params = params.to_vec();
        self.run(move |s| s.sql(&query, &params)).await
    }

    /// Load and return the snapshot metadata asynchronously.
    pub async fn meta(&self) -> Result<serde_json::Value> {
        self.run(|s| s.meta()).await
    }

    /// Check for a newer snapshot and reset views if stale.
    pub async fn refresh(&self) -> Result<bool> {
        self.run(|s| s.refresh()).await
    }

    /// Close the SDK, releasing all resources.
    pub async fn close(self) -> Result<()> {
        tokio::task::spawn_blocking(move || {
            let sdk = self
                .inner
                .lock()
                .map_err(|_| CatalogError::InvalidArgument("SDK lock poisoned".into()))?;
            drop(sdk);
            Ok(())
        })
        .await
        .map_err(|e| CatalogError::InvalidArgument(format!("Task join error: {e}")))?
    }
}
