//! The remote store seam and its DuckDB-backed implementation.
//!
//! [`RemoteStore`] is the abstract paginated query service the engines are
//! written against; [`CatalogStore`] implements it over the DuckDB views
//! registered from the CDN snapshot. Tests substitute a scripted in-memory
//! store to assert fetch behavior (batch counts, short-circuits) without a
//! database.

use crate::connection::Connection;
use crate::error::Result;
use crate::filters::SortBy;
use crate::models::{Category, Coin, CoinDetail, Country, OwnedCoin, Period};
use crate::sql_builder::SqlBuilder;

// ---------------------------------------------------------------------------
// CoinQuery / RowRange
// ---------------------------------------------------------------------------

/// A join-free coin query, pre-resolved from a
/// [`FilterSpec`](crate::filters::FilterSpec) by the fetcher.
///
/// `owned_ids` and `period_ids` are membership filters the fetcher resolves
/// ahead of time (from the ownership overlay and the country -> period
/// bridge respectively), so the store never has to express a join in the
/// main query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoinQuery {
    pub owned_ids: Option<Vec<i64>>,
    pub search: Option<String>,
    pub period_ids: Option<Vec<i64>>,
    pub period_id: Option<i64>,
    pub sort: SortBy,
}

/// Offset/limit window for paginated coin queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRange {
    pub offset: usize,
    pub limit: usize,
}

// ---------------------------------------------------------------------------
// RemoteStore
// ---------------------------------------------------------------------------

/// The abstract paginated/filterable record store the browsing engines
/// consume.
///
/// Implementations must return `countries`/`categories` ordered by name.
/// `coins` honors every populated `CoinQuery` field plus the optional
/// `RowRange` window.
pub trait RemoteStore {
    fn countries(&self) -> Result<Vec<Country>>;
    fn categories(&self) -> Result<Vec<Category>>;
    fn owned(&self) -> Result<Vec<OwnedCoin>>;
    fn periods_for_country(&self, country_id: i64) -> Result<Vec<Period>>;
    fn period_ids_for_country(&self, country_id: i64) -> Result<Vec<i64>>;
    fn coins(&self, query: &CoinQuery, range: Option<RowRange>) -> Result<Vec<Coin>>;
    fn coin_detail(&self, coin_id: i64) -> Result<Option<CoinDetail>>;
}

impl<S: RemoteStore + ?Sized> RemoteStore for &S {
    fn countries(&self) -> Result<Vec<Country>> {
        (**self).countries()
    }
    fn categories(&self) -> Result<Vec<Category>> {
        (**self).categories()
    }
    fn owned(&self) -> Result<Vec<OwnedCoin>> {
        (**self).owned()
    }
    fn periods_for_country(&self, country_id: i64) -> Result<Vec<Period>> {
        (**self).periods_for_country(country_id)
    }
    fn period_ids_for_country(&self, country_id: i64) -> Result<Vec<i64>> {
        (**self).period_ids_for_country(country_id)
    }
    fn coins(&self, query: &CoinQuery, range: Option<RowRange>) -> Result<Vec<Coin>> {
        (**self).coins(query, range)
    }
    fn coin_detail(&self, coin_id: i64) -> Result<Option<CoinDetail>> {
        (**self).coin_detail(coin_id)
    }
}

// ---------------------------------------------------------------------------
// CatalogStore (DuckDB)
// ---------------------------------------------------------------------------

/// Columns selected for every coin summary row: the fact columns plus the
/// denormalized dimension names/links the browser renders.
const COIN_COLUMNS: &[&str] = &[
    "c.coin_id",
    "c.name",
    "c.year",
    "c.price_usd",
    "c.km",
    "c.subject",
    "c.marked",
    "c.type_id",
    "c.period_id",
    "c.denomination_id",
    "c.series_id",
    "d.denomination_name",
    "p.period_name",
    "p.period_start_year",
    "p.period_link",
    "s.series_name",
    "s.series_range",
    "s.series_link",
];

/// DuckDB-backed [`RemoteStore`] over the catalog snapshot views.
pub struct CatalogStore {
    conn: Connection,
}

impl CatalogStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Access the underlying connection (raw SQL escape hatch, cache access).
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn coin_builder(&self) -> SqlBuilder {
        let mut qb = SqlBuilder::new("coins c");
        qb.select(COIN_COLUMNS)
            .join("LEFT JOIN denominations d ON c.denomination_id = d.denomination_id")
            .join("LEFT JOIN periods p ON c.period_id = p.period_id")
            .join("LEFT JOIN series s ON c.series_id = s.series_id");
        qb
    }
}

impl RemoteStore for CatalogStore {
    fn countries(&self) -> Result<Vec<Country>> {
        self.conn.ensure_views(&["countries"])?;

        let (sql, params) = SqlBuilder::new("countries")
            .order_by(&["country_name"])
            .build();
        self.conn.execute_into(&sql, &params)
    }

    fn categories(&self) -> Result<Vec<Category>> {
        self.conn.ensure_views(&["categories"])?;

        let (sql, params) = SqlBuilder::new("categories")
            .order_by(&["type_name"])
            .build();
        self.conn.execute_into(&sql, &params)
    }

    fn owned(&self) -> Result<Vec<OwnedCoin>> {
        self.conn.ensure_views(&["coins_owned"])?;

        let (sql, params) = SqlBuilder::new("coins_owned")
            .select(&["coin_id", "image_url_obverse", "image_url_reverse"])
            .build();
        self.conn.execute_into(&sql, &params)
    }

    fn periods_for_country(&self, country_id: i64) -> Result<Vec<Period>> {
        self.conn.ensure_views(&["periods", "periods_countries"])?;

        let (sql, params) = SqlBuilder::new("periods p")
            .select(&[
                "p.period_id",
                "p.period_name",
                "p.period_start_year",
                "p.period_link",
            ])
            .join("JOIN periods_countries pc ON p.period_id = pc.period_id")
            .where_eq("pc.country_id", &country_id.to_string())
            .build();
        self.conn.execute_into(&sql, &params)
    }

    fn period_ids_for_country(&self, country_id: i64) -> Result<Vec<i64>> {
        self.conn.ensure_views(&["periods_countries"])?;

        let (sql, params) = SqlBuilder::new("periods_countries")
            .select(&["period_id"])
            .where_eq("country_id", &country_id.to_string())
            .build();

        let rows = self.conn.execute(&sql, &params)?;
        Ok(rows
            .iter()
            .filter_map(|r| r.get("period_id").and_then(|v| v.as_i64()))
            .collect())
    }

    fn coins(&self, query: &CoinQuery, range: Option<RowRange>) -> Result<Vec<Coin>> {
        self.conn
            .ensure_views(&["coins", "denominations", "periods", "series"])?;

        let mut qb = self.coin_builder();

        if let Some(ref ids) = query.owned_ids {
            let strs: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
            let refs: Vec<&str> = strs.iter().map(String::as_str).collect();
            qb.where_in("c.coin_id", &refs);
        }

        let (sql, params) = finish_coin_query(&mut qb, query, range);
        self.conn.execute_into(&sql, &params)
    }

    fn coin_detail(&self, coin_id: i64) -> Result<Option<CoinDetail>> {
        self.conn.ensure_views(&[
            "coins",
            "denominations",
            "periods",
            "series",
            "categories",
        ])?;

        let mut cols: Vec<&str> = COIN_COLUMNS.to_vec();
        cols.push("t.type_name");

        let mut qb = self.coin_builder();
        qb.select(&cols)
            .join("LEFT JOIN categories t ON c.type_id = t.type_id")
            .where_eq("c.coin_id", &coin_id.to_string())
            .limit(1);

        let (sql, params) = qb.build();
        let mut details: Vec<CoinDetail> = self.conn.execute_into(&sql, &params)?;

        let Some(mut detail) = details.pop() else {
            return Ok(None);
        };

        // Country is reached through the period bridge; first match wins.
        if let Some(period_id) = detail.coin.period_id {
            self.conn
                .ensure_views(&["periods_countries", "countries"])?;

            let (sql, params) = SqlBuilder::new("periods_countries pc")
                .select(&["co.country_name"])
                .join("JOIN countries co ON pc.country_id = co.country_id")
                .where_eq("pc.period_id", &period_id.to_string())
                .limit(1)
                .build();

            let rows = self.conn.execute(&sql, &params)?;
            detail.country_name = rows
                .first()
                .and_then(|r| r.get("country_name"))
                .and_then(|v| v.as_str())
                .map(|s| s.to_string());
        }

        Ok(Some(detail))
    }
}

/// Apply the shared tail of a coin query: search, period filters, ordering,
/// and the pagination window.
fn finish_coin_query(
    qb: &mut SqlBuilder,
    query: &CoinQuery,
    range: Option<RowRange>,
) -> (String, Vec<String>) {
    if let Some(ref search) = query.search {
        let pattern = format!("%{}%", search);
        qb.where_or(&[
            ("LOWER(c.name) LIKE LOWER(?)", pattern.as_str()),
            ("LOWER(c.subject) LIKE LOWER(?)", pattern.as_str()),
            ("LOWER(c.km) LIKE LOWER(?)", pattern.as_str()),
        ]);
    }

    if let Some(ref ids) = query.period_ids {
        let strs: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
        let refs: Vec<&str> = strs.iter().map(String::as_str).collect();
        qb.where_in("c.period_id", &refs);
    }

    if let Some(period_id) = query.period_id {
        qb.where_eq("c.period_id", &period_id.to_string());
    }

    let direction = if query.sort.ascending() { "ASC" } else { "DESC" };
    qb.order_by(&[&format!("c.{} {}", query.sort.column(), direction)]);

    if let Some(r) = range {
        qb.limit(r.limit).offset(r.offset);
    }

    qb.build()
}
