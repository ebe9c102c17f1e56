use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Dimension tables: countries, categories, periods, ownership side table
// ---------------------------------------------------------------------------

/// A country, scoping the set of historical periods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Country {
    pub country_id: i64,
    pub country_name: String,
}

/// A coin category (circulating, commemorative, bullion, ...).
///
/// Fixed low-cardinality dimension, loaded once per session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub type_id: i64,
    pub type_name: String,
}

/// A historical period within a country (e.g. "Third Republic").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Period {
    pub period_id: i64,
    pub period_name: Option<String>,
    pub period_start_year: Option<i32>,
    pub period_link: Option<String>,
}

/// A row of the owned-coins side table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnedCoin {
    pub coin_id: i64,
    pub image_url_obverse: Option<String>,
    pub image_url_reverse: Option<String>,
}
