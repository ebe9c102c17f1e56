//! Shared test fixtures for the Numisma SDK integration tests.
//!
//! Two fixtures:
//! - [`MockStore`]: a scripted in-memory [`RemoteStore`] with call counters,
//!   for asserting fetch behavior (batch counts, short-circuits) without a
//!   database.
//! - [`setup_sample_db`]: a real DuckDB-backed [`CatalogStore`] populated
//!   with small sample catalog tables via NDJSON temp files.
#![allow(dead_code)]

use numisma_sdk::error::{CatalogError, Result};
use numisma_sdk::models::{Category, Coin, CoinDetail, Country, OwnedCoin, Period};
use numisma_sdk::store::{CatalogStore, CoinQuery, RemoteStore, RowRange};
use numisma_sdk::{CacheManager, Connection};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

// ---------------------------------------------------------------------------
// Coin builders
// ---------------------------------------------------------------------------

/// A minimal coin: everything optional left empty.
pub fn coin(id: i64) -> Coin {
    Coin {
        coin_id: id,
        name: Some(format!("Coin {}", id)),
        year: None,
        price_usd: None,
        km: None,
        subject: None,
        marked: None,
        type_id: None,
        period_id: None,
        denomination_id: None,
        series_id: None,
        denomination_name: None,
        period_name: None,
        period_start_year: None,
        period_link: None,
        series_name: None,
        series_range: None,
        series_link: None,
        is_owned: false,
        display_obverse: None,
        display_reverse: None,
    }
}

/// A coin placed in a category and period, with a year.
pub fn coin_in(id: i64, type_id: i64, period_id: i64, period_start: i32, year: i32) -> Coin {
    Coin {
        type_id: Some(type_id),
        period_id: Some(period_id),
        period_name: Some(format!("Period {}", period_id)),
        period_start_year: Some(period_start),
        year: Some(year),
        ..coin(id)
    }
}

pub fn category(type_id: i64, name: &str) -> Category {
    Category {
        type_id,
        type_name: name.to_string(),
    }
}

// ---------------------------------------------------------------------------
// MockStore
// ---------------------------------------------------------------------------

/// Scripted [`RemoteStore`] over a plain coin vector.
///
/// `coins()` applies the membership/search/period filters and sort the way
/// the real store would, then slices by the requested range, logging each
/// call so tests can assert batch behavior.
#[derive(Default)]
pub struct MockStore {
    pub coins: Vec<Coin>,
    pub countries: Vec<Country>,
    pub categories: Vec<Category>,
    pub owned_rows: Vec<OwnedCoin>,
    pub periods: HashMap<i64, Vec<Period>>,
    pub period_ids: HashMap<i64, Vec<i64>>,
    pub details: HashMap<i64, CoinDetail>,
    /// When set, every store method fails with `CatalogError::Remote`.
    pub fail: Cell<bool>,
    pub coin_calls: RefCell<Vec<Option<RowRange>>>,
    pub period_id_calls: Cell<usize>,
    pub owned_calls: Cell<usize>,
    pub detail_calls: Cell<usize>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_coins(coins: Vec<Coin>) -> Self {
        Self {
            coins,
            ..Self::default()
        }
    }

    /// Number of `coins()` calls issued so far.
    pub fn coin_call_count(&self) -> usize {
        self.coin_calls.borrow().len()
    }

    fn check_up(&self) -> Result<()> {
        if self.fail.get() {
            Err(CatalogError::Remote("mock store down".to_string()))
        } else {
            Ok(())
        }
    }
}

impl RemoteStore for MockStore {
    fn countries(&self) -> Result<Vec<Country>> {
        self.check_up()?;
        Ok(self.countries.clone())
    }

    fn categories(&self) -> Result<Vec<Category>> {
        self.check_up()?;
        Ok(self.categories.clone())
    }

    fn owned(&self) -> Result<Vec<OwnedCoin>> {
        self.check_up()?;
        self.owned_calls.set(self.owned_calls.get() + 1);
        Ok(self.owned_rows.clone())
    }

    fn periods_for_country(&self, country_id: i64) -> Result<Vec<Period>> {
        self.check_up()?;
        Ok(self.periods.get(&country_id).cloned().unwrap_or_default())
    }

    fn period_ids_for_country(&self, country_id: i64) -> Result<Vec<i64>> {
        self.check_up()?;
        self.period_id_calls.set(self.period_id_calls.get() + 1);
        Ok(self.period_ids.get(&country_id).cloned().unwrap_or_default())
    }

    fn coins(&self, query: &CoinQuery, range: Option<RowRange>) -> Result<Vec<Coin>> {
        self.check_up()?;
        self.coin_calls.borrow_mut().push(range);

        let mut matched: Vec<Coin> = self
            .coins
            .iter()
            .filter(|c| {
                if let Some(ref ids) = query.owned_ids {
                    if !ids.contains(&c.coin_id) {
                        return false;
                    }
                }
                if let Some(ref ids) = query.period_ids {
                    match c.period_id {
                        Some(pid) if ids.contains(&pid) => {}
                        _ => return false,
                    }
                }
                if let Some(pid) = query.period_id {
                    if c.period_id != Some(pid) {
                        return false;
                    }
                }
                if let Some(ref search) = query.search {
                    let needle = search.to_lowercase();
                    let hit = [c.name.as_deref(), c.subject.as_deref(), c.km.as_deref()]
                        .iter()
                        .any(|f| {
                            f.map(|s| s.to_lowercase().contains(&needle))
                                .unwrap_or(false)
                        });
                    if !hit {
                        return false;
                    }
                }
                true
            })
            .cloned()
            .collect();

        matched.sort_by(|a, b| {
            let ord = if query.sort.by_price() {
                a.price_usd
                    .unwrap_or(0.0)
                    .total_cmp(&b.price_usd.unwrap_or(0.0))
            } else {
                a.year.unwrap_or(0).cmp(&b.year.unwrap_or(0))
            };
            if query.sort.ascending() {
                ord
            } else {
                ord.reverse()
            }
        });

        Ok(match range {
            Some(r) => {
                let start = r.offset.min(matched.len());
                let end = (r.offset + r.limit).min(matched.len());
                matched[start..end].to_vec()
            }
            None => matched,
        })
    }

    fn coin_detail(&self, coin_id: i64) -> Result<Option<CoinDetail>> {
        self.check_up()?;
        self.detail_calls.set(self.detail_calls.get() + 1);
        Ok(self.details.get(&coin_id).cloned())
    }
}

// ---------------------------------------------------------------------------
// DuckDB fixture
// ---------------------------------------------------------------------------

/// Create a [`CatalogStore`] backed by a temporary cache directory with
/// sample catalog tables loaded into DuckDB via NDJSON temp files.
///
/// Returns `(CatalogStore, tempfile::TempDir)`. The caller must keep the
/// `TempDir` alive for the duration of the test so the cache directory is
/// not deleted prematurely.
pub fn setup_sample_db() -> (CatalogStore, tempfile::TempDir) {
    let tmp_dir = tempfile::tempdir().unwrap();
    let cache = CacheManager::new(
        Some(tmp_dir.path().to_path_buf()),
        true,
        Duration::from_secs(30),
    )
    .unwrap();
    let conn = Connection::new(cache).unwrap();

    register_countries(&conn);
    register_categories(&conn);
    register_periods(&conn);
    register_periods_countries(&conn);
    register_denominations(&conn);
    register_series(&conn);
    register_coins(&conn);
    register_coins_owned(&conn);

    (CatalogStore::new(conn), tmp_dir)
}

fn register_countries(conn: &Connection) {
    let rows = vec![
        serde_json::json!({"country_id": 1, "country_name": "France"}),
        serde_json::json!({"country_id": 2, "country_name": "Germany"}),
        serde_json::json!({"country_id": 3, "country_name": "Austria"}),
    ];
    write_ndjson_and_register(conn, "countries", &rows);
}

fn register_categories(conn: &Connection) {
    let rows = vec![
        serde_json::json!({"type_id": 10, "type_name": "Circulating"}),
        serde_json::json!({"type_id": 11, "type_name": "Commemorative"}),
    ];
    write_ndjson_and_register(conn, "categories", &rows);
}

fn register_periods(conn: &Connection) {
    let rows = vec![
        serde_json::json!({
            "period_id": 100,
            "period_name": "Fifth Republic",
            "period_start_year": 1958,
            "period_link": "https://en.numista.com/fifth-republic"
        }),
        serde_json::json!({
            "period_id": 101,
            "period_name": "Third Republic",
            "period_start_year": 1870,
            "period_link": null
        }),
        serde_json::json!({
            "period_id": 102,
            "period_name": "Weimar Republic",
            "period_start_year": 1919,
            "period_link": null
        }),
    ];
    write_ndjson_and_register(conn, "periods", &rows);
}

fn register_periods_countries(conn: &Connection) {
    let rows = vec![
        serde_json::json!({"country_id": 1, "period_id": 100}),
        serde_json::json!({"country_id": 1, "period_id": 101}),
        serde_json::json!({"country_id": 2, "period_id": 102}),
    ];
    write_ndjson_and_register(conn, "periods_countries", &rows);
}

fn register_denominations(conn: &Connection) {
    let rows = vec![
        serde_json::json!({"denomination_id": 1000, "denomination_name": "1 Franc"}),
        serde_json::json!({"denomination_id": 1001, "denomination_name": "5 Francs"}),
        serde_json::json!({"denomination_id": 1002, "denomination_name": "2 Mark"}),
    ];
    write_ndjson_and_register(conn, "denominations", &rows);
}

fn register_series(conn: &Connection) {
    let rows = vec![serde_json::json!({
        "series_id": 500,
        "series_name": "Semeuse",
        "series_range": "1959-2001",
        "series_link": "https://en.numista.com/semeuse"
    })];
    write_ndjson_and_register(conn, "series", &rows);
}

fn register_coins(conn: &Connection) {
    let rows = vec![
        serde_json::json!({
            "coin_id": 1, "name": "1 Franc Semeuse", "year": 1960,
            "price_usd": 2.5, "km": "KM#925.1", "subject": null, "marked": false,
            "type_id": 10, "period_id": 100, "denomination_id": 1000, "series_id": 500
        }),
        serde_json::json!({
            "coin_id": 2, "name": "5 Francs Semeuse", "year": 1962,
            "price_usd": 12.0, "km": "KM#926", "subject": null, "marked": true,
            "type_id": 10, "period_id": 100, "denomination_id": 1001, "series_id": 500
        }),
        serde_json::json!({
            "coin_id": 3, "name": "5 Francs Hercule", "year": 1873,
            "price_usd": 45.0, "km": "KM#820.1", "subject": "Hercule group", "marked": false,
            "type_id": 10, "period_id": 101, "denomination_id": 1001, "series_id": null
        }),
        serde_json::json!({
            "coin_id": 4, "name": "2 Mark Eichbaum", "year": 1925,
            "price_usd": 30.0, "km": "KM#45", "subject": "Oak tree", "marked": false,
            "type_id": 11, "period_id": 102, "denomination_id": 1002, "series_id": null
        }),
        serde_json::json!({
            "coin_id": 5, "name": "Pattern Franc", "year": null,
            "price_usd": null, "km": null, "subject": null, "marked": false,
            "type_id": null, "period_id": null, "denomination_id": 1000, "series_id": null
        }),
    ];
    write_ndjson_and_register(conn, "coins", &rows);
}

fn register_coins_owned(conn: &Connection) {
    let rows = vec![
        serde_json::json!({
            "coin_id": 1,
            "image_url_obverse": "https://img.example/1-obv.jpg",
            "image_url_reverse": "https://img.example/1-rev.jpg"
        }),
        serde_json::json!({
            "coin_id": 3,
            "image_url_obverse": null,
            "image_url_reverse": null
        }),
    ];
    write_ndjson_and_register(conn, "coins_owned", &rows);
}

/// Write a slice of JSON values as NDJSON to a temp file and register it
/// as a DuckDB table via `Connection::register_table_from_ndjson`.
fn write_ndjson_and_register(conn: &Connection, table_name: &str, rows: &[serde_json::Value]) {
    let mut file = NamedTempFile::new().unwrap();
    for row in rows {
        writeln!(file, "{}", serde_json::to_string(row).unwrap()).unwrap();
    }
    file.flush().unwrap();

    let path = file.path().to_str().unwrap();
    conn.register_table_from_ndjson(table_name, path).unwrap();
    // NamedTempFile is dropped here, but DuckDB has already read the data
    // into an in-memory table, so this is fine.
}
