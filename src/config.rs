use std::collections::HashMap;
use std::path::PathBuf;

pub const CDN_BASE: &str = "https://data.numisma.app/api/v1";
pub const META_URL: &str = "https://data.numisma.app/api/v1/Meta.json";

pub fn parquet_files() -> HashMap<&'static str, &'static str> {
    HashMap::from([
        // Fact table
        ("coins", "parquet/coins.parquet"),
        // Dimension tables
        ("countries", "parquet/countries.parquet"),
        ("categories", "parquet/categories.parquet"),
        ("periods", "parquet/periods.parquet"),
        ("denominations", "parquet/denominations.parquet"),
        ("series", "parquet/series.parquet"),
        // Country <-> period bridge
        ("periods_countries", "parquet/periodsCountries.parquet"),
        // Ownership side table
        ("coins_owned", "parquet/coinsOwned.parquet"),
    ])
}

pub fn json_files() -> HashMap<&'static str, &'static str> {
    HashMap::from([("meta", "Meta.json")])
}

pub fn default_cache_dir() -> PathBuf {
    if let Some(cache) = dirs::cache_dir() {
        cache.join("numisma-sdk")
    } else {
        PathBuf::from(".numisma-sdk-cache")
    }
}
