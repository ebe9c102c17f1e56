//! Metadata provider: countries, categories, and periods-per-country.
//!
//! All three are low-cardinality dimensions. Countries and categories are
//! loaded once and held for the whole session; periods are loaded lazily per
//! country with a 30-minute TTL.

use crate::error::Result;
use crate::models::{Category, Country, Period};
use crate::store::RemoteStore;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// How long a per-country period list is considered fresh.
pub const PERIOD_TTL: Duration = Duration::from_secs(30 * 60);

/// Session-scoped cache of the catalog dimensions.
#[derive(Debug, Default)]
pub struct MetadataProvider {
    countries: Option<Vec<Country>>,
    categories: Option<Vec<Category>>,
    periods: HashMap<i64, (Vec<Period>, Instant)>,
}

impl MetadataProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Countries, ordered by name. Loaded once per session.
    pub fn countries<S: RemoteStore>(&mut self, store: &S) -> Result<&[Country]> {
        if self.countries.is_none() {
            self.countries = Some(store.countries()?);
        }
        Ok(self.countries.as_deref().unwrap())
    }

    /// Categories, ordered by name. Loaded once per session.
    pub fn categories<S: RemoteStore>(&mut self, store: &S) -> Result<&[Category]> {
        if self.categories.is_none() {
            self.categories = Some(store.categories()?);
        }
        Ok(self.categories.as_deref().unwrap())
    }

    /// Periods belonging to a country, newest start year first.
    ///
    /// Cached per country; refetched after [`PERIOD_TTL`].
    pub fn periods_for_country<S: RemoteStore>(
        &mut self,
        store: &S,
        country_id: i64,
    ) -> Result<&[Period]> {
        let fresh = self
            .periods
            .get(&country_id)
            .map(|(_, at)| at.elapsed() < PERIOD_TTL)
            .unwrap_or(false);

        if !fresh {
            let mut periods = store.periods_for_country(country_id)?;
            periods.sort_by_key(|p| std::cmp::Reverse(p.period_start_year.unwrap_or(0)));
            self.periods.insert(country_id, (periods, Instant::now()));
        }

        Ok(&self.periods[&country_id].0)
    }

    /// Drop every cached dimension so the next access refetches.
    pub fn invalidate(&mut self) {
        self.countries = None;
        self.categories = None;
        self.periods.clear();
    }
}
