//! Ownership overlay cache.
//!
//! A small side-table mapping coin id -> owned flag + collection photos,
//! loaded in one call and merged onto every fetched coin. The fetcher never
//! runs without a snapshot of this map, so `is_owned` is always populated.

use crate::error::Result;
use crate::models::Coin;
use crate::store::RemoteStore;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// How long an overlay snapshot is considered fresh.
pub const OVERLAY_TTL: Duration = Duration::from_secs(5 * 60);

/// Collection photos for one owned coin. Either side may be missing, in
/// which case the display falls back to the catalog stock photo.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OwnedImages {
    pub obverse: Option<String>,
    pub reverse: Option<String>,
}

/// Snapshot of the owned-coins side table.
///
/// Reloading produces a fresh snapshot; readers holding the old one keep a
/// consistent view (whole-snapshot replacement, no in-place mutation).
#[derive(Debug, Clone)]
pub struct OwnedOverlay {
    entries: HashMap<i64, OwnedImages>,
    loaded_at: Instant,
}

impl OwnedOverlay {
    /// An empty overlay, already considered stale.
    pub fn empty() -> Self {
        let now = Instant::now();
        Self {
            entries: HashMap::new(),
            loaded_at: now.checked_sub(OVERLAY_TTL).unwrap_or(now),
        }
    }

    /// Load the ownership side table from the store.
    pub fn load<S: RemoteStore>(store: &S) -> Result<Self> {
        let rows = store.owned()?;
        let mut entries = HashMap::with_capacity(rows.len());
        for row in rows {
            entries.insert(
                row.coin_id,
                OwnedImages {
                    obverse: row.image_url_obverse,
                    reverse: row.image_url_reverse,
                },
            );
        }
        Ok(Self {
            entries,
            loaded_at: Instant::now(),
        })
    }

    pub fn get(&self, coin_id: i64) -> Option<&OwnedImages> {
        self.entries.get(&coin_id)
    }

    pub fn contains(&self, coin_id: i64) -> bool {
        self.entries.contains_key(&coin_id)
    }

    /// Number of owned coins.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Owned coin ids, sorted for deterministic membership queries.
    pub fn owned_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.entries.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Whether the snapshot has outlived [`OVERLAY_TTL`].
    pub fn is_stale(&self) -> bool {
        self.loaded_at.elapsed() >= OVERLAY_TTL
    }

    /// Attach ownership data to a fetched coin.
    ///
    /// Collection photos win over catalog stock photos; an owned coin with
    /// no photos keeps `None` and the caller falls back to stock imagery.
    pub fn apply(&self, coin: &mut Coin) {
        match self.entries.get(&coin.coin_id) {
            Some(images) => {
                coin.is_owned = true;
                coin.display_obverse = images.obverse.clone();
                coin.display_reverse = images.reverse.clone();
            }
            None => {
                coin.is_owned = false;
                coin.display_obverse = None;
                coin.display_reverse = None;
            }
        }
    }
}
