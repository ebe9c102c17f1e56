//! Fetch-behavior tests against the scripted mock store: batching, the
//! browsing cap, empty-prerequisite short-circuits, caching, and
//! stale-while-revalidate supersession.

mod common;

use common::{coin, MockStore};
use numisma_sdk::models::OwnedCoin;
use numisma_sdk::{CoinFetcher, FilterSpec, OwnedOverlay, ShowOwned};
use std::time::Duration;

fn loaded_overlay(store: &MockStore) -> OwnedOverlay {
    OwnedOverlay::load(&store).unwrap()
}

fn owned_row(coin_id: i64) -> OwnedCoin {
    OwnedCoin {
        coin_id,
        image_url_obverse: Some(format!("https://img.example/{}-obv.jpg", coin_id)),
        image_url_reverse: None,
    }
}

// ---------------------------------------------------------------------------
// Short-circuits
// ---------------------------------------------------------------------------

#[test]
fn owned_filter_with_empty_overlay_skips_remote_entirely() {
    let store = MockStore::with_coins((1..=50).map(coin).collect());
    let fetcher = CoinFetcher::new();

    let mut filter = FilterSpec::default();
    filter.show_owned = ShowOwned::Owned;

    let coins = fetcher
        .fetch(&store, &filter, &OwnedOverlay::empty())
        .unwrap();
    assert!(coins.is_empty());
    assert_eq!(store.coin_call_count(), 0);
    assert_eq!(store.period_id_calls.get(), 0);
}

#[test]
fn country_with_no_periods_short_circuits_to_empty() {
    let store = MockStore::with_coins((1..=10).map(coin).collect());
    let fetcher = CoinFetcher::new();

    let mut filter = FilterSpec::default();
    filter.set_country(Some(99));

    let coins = fetcher
        .fetch(&store, &filter, &loaded_overlay(&store))
        .unwrap();
    assert!(coins.is_empty());
    assert_eq!(store.period_id_calls.get(), 1);
    assert_eq!(store.coin_call_count(), 0);
}

// ---------------------------------------------------------------------------
// Batched (filtered) fetch
// ---------------------------------------------------------------------------

#[test]
fn filtered_fetch_issues_two_batches_for_1500_rows() {
    let mut store = MockStore::with_coins((1..=1500).map(coin).collect());
    store.owned_rows = vec![owned_row(7)];
    let fetcher = CoinFetcher::new();

    let mut filter = FilterSpec::default();
    filter.search = "coin".to_string();

    let overlay = loaded_overlay(&store);
    let coins = fetcher.fetch(&store, &filter, &overlay).unwrap();

    assert_eq!(coins.len(), 1500);

    let calls = store.coin_calls.borrow();
    assert_eq!(calls.len(), 2);
    let first = calls[0].unwrap();
    let second = calls[1].unwrap();
    assert_eq!((first.offset, first.limit), (0, 1000));
    assert_eq!((second.offset, second.limit), (1000, 1000));

    // Every returned coin carries the overlay merge
    let merged = coins.iter().find(|c| c.coin_id == 7).unwrap();
    assert!(merged.is_owned);
    assert!(merged.display_obverse.is_some());
    assert!(coins.iter().filter(|c| c.is_owned).count() == 1);
}

#[test]
fn filtered_fetch_stops_on_empty_page_at_exact_boundary() {
    let store = MockStore::with_coins((1..=2000).map(coin).collect());
    let fetcher = CoinFetcher::new();

    let mut filter = FilterSpec::default();
    filter.search = "coin".to_string();

    let coins = fetcher
        .fetch(&store, &filter, &loaded_overlay(&store))
        .unwrap();

    assert_eq!(coins.len(), 2000);
    // Two full pages plus the empty page that signals end of data
    assert_eq!(store.coin_call_count(), 3);
}

#[test]
fn country_filter_resolves_period_ids_before_fetching() {
    let mut store = MockStore::new();
    store.coins = vec![
        numisma_sdk::Coin {
            period_id: Some(100),
            ..coin(1)
        },
        numisma_sdk::Coin {
            period_id: Some(101),
            ..coin(2)
        },
        numisma_sdk::Coin {
            period_id: Some(200),
            ..coin(3)
        },
    ];
    store.period_ids.insert(1, vec![100, 101]);
    let fetcher = CoinFetcher::new();

    let mut filter = FilterSpec::default();
    filter.set_country(Some(1));

    let coins = fetcher
        .fetch(&store, &filter, &loaded_overlay(&store))
        .unwrap();

    let ids: Vec<i64> = coins.iter().map(|c| c.coin_id).collect();
    assert_eq!(store.period_id_calls.get(), 1);
    assert!(ids.contains(&1) && ids.contains(&2));
    assert!(!ids.contains(&3));
}

#[test]
fn explicit_period_filter_skips_period_resolution() {
    let mut store = MockStore::new();
    store.coins = vec![
        numisma_sdk::Coin {
            period_id: Some(100),
            ..coin(1)
        },
        numisma_sdk::Coin {
            period_id: Some(101),
            ..coin(2)
        },
    ];
    store.period_ids.insert(1, vec![100, 101]);
    let fetcher = CoinFetcher::new();

    let mut filter = FilterSpec::default();
    filter.set_country(Some(1));
    filter.set_period(Some(101));

    let coins = fetcher
        .fetch(&store, &filter, &loaded_overlay(&store))
        .unwrap();

    assert_eq!(store.period_id_calls.get(), 0);
    assert_eq!(coins.len(), 1);
    assert_eq!(coins[0].coin_id, 2);
}

// ---------------------------------------------------------------------------
// Browsing fetch
// ---------------------------------------------------------------------------

#[test]
fn browsing_issues_one_bounded_call() {
    let store = MockStore::with_coins((1..=5000).map(coin).collect());
    let fetcher = CoinFetcher::new();

    let filter = FilterSpec::default();
    assert!(filter.is_browsing());

    let coins = fetcher
        .fetch(&store, &filter, &loaded_overlay(&store))
        .unwrap();

    assert_eq!(coins.len(), 200);
    let calls = store.coin_calls.borrow();
    assert_eq!(calls.len(), 1);
    let range = calls[0].unwrap();
    assert_eq!((range.offset, range.limit), (0, 200));

    // Randomized but size-bounded and duplicate-free
    let mut ids: Vec<i64> = coins.iter().map(|c| c.coin_id).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 200);
}

#[test]
fn browsing_small_table_returns_everything() {
    let store = MockStore::with_coins((1..=7).map(coin).collect());
    let fetcher = CoinFetcher::new();

    let coins = fetcher
        .fetch(&store, &FilterSpec::default(), &loaded_overlay(&store))
        .unwrap();
    assert_eq!(coins.len(), 7);
}

// ---------------------------------------------------------------------------
// Caching and stale-while-revalidate
// ---------------------------------------------------------------------------

#[test]
fn cache_hit_within_ttl_skips_remote() {
    let store = MockStore::with_coins((1..=30).map(coin).collect());
    let fetcher = CoinFetcher::new();
    let overlay = loaded_overlay(&store);

    let mut filter = FilterSpec::default();
    filter.search = "coin".to_string();

    let first = fetcher.fetch(&store, &filter, &overlay).unwrap();
    let calls_after_first = store.coin_call_count();
    let second = fetcher.fetch(&store, &filter, &overlay).unwrap();

    assert_eq!(store.coin_call_count(), calls_after_first);
    assert_eq!(first.len(), second.len());
}

#[test]
fn expired_cache_refetches() {
    let store = MockStore::with_coins((1..=30).map(coin).collect());
    let fetcher = CoinFetcher::with_ttl(Duration::from_millis(0));
    let overlay = loaded_overlay(&store);

    let mut filter = FilterSpec::default();
    filter.search = "coin".to_string();

    fetcher.fetch(&store, &filter, &overlay).unwrap();
    let calls_after_first = store.coin_call_count();
    fetcher.fetch(&store, &filter, &overlay).unwrap();

    assert!(store.coin_call_count() > calls_after_first);
}

#[test]
fn remote_failure_keeps_displayed_result() {
    let store = MockStore::with_coins((1..=30).map(coin).collect());
    let fetcher = CoinFetcher::new();
    let overlay = loaded_overlay(&store);

    let mut good = FilterSpec::default();
    good.search = "coin".to_string();
    fetcher.fetch(&store, &good, &overlay).unwrap();
    assert_eq!(fetcher.displayed().unwrap().len(), 30);

    let mut changed = FilterSpec::default();
    changed.search = "other".to_string();
    store.fail.set(true);
    let result = fetcher.fetch(&store, &changed, &overlay);

    assert!(result.is_err());
    // The failed fetch never clobbers the last good result
    assert_eq!(fetcher.displayed().unwrap().len(), 30);
    assert_eq!(fetcher.displayed_key().unwrap(), good.cache_key());
}

#[test]
fn superseded_completion_never_clobbers_newer_key() {
    let fetcher = CoinFetcher::new();

    let mut old_filter = FilterSpec::default();
    old_filter.search = "old".to_string();
    let mut new_filter = FilterSpec::default();
    new_filter.search = "new".to_string();

    // Old request starts, then a newer one for a different key
    let old_ticket = fetcher.begin(&old_filter);
    let new_ticket = fetcher.begin(&new_filter);

    fetcher.complete(new_ticket, vec![coin(1), coin(2)]);
    assert_eq!(fetcher.displayed().unwrap().len(), 2);

    // The straggler lands in the cache but not in the displayed slot
    fetcher.complete(old_ticket, vec![coin(9)]);
    assert_eq!(fetcher.displayed().unwrap().len(), 2);
    assert_eq!(fetcher.displayed_key().unwrap(), new_filter.cache_key());
    assert_eq!(fetcher.cached(&old_filter).unwrap().len(), 1);
}

#[test]
fn recompletion_of_same_key_updates_display() {
    let fetcher = CoinFetcher::new();

    let filter = FilterSpec::default();
    let t1 = fetcher.begin(&filter);
    let t2 = fetcher.begin(&filter);

    fetcher.complete(t2, vec![coin(1)]);
    // Same key: an older ticket finishing later may still refresh the slot
    fetcher.complete(t1, vec![coin(1), coin(2)]);
    assert_eq!(fetcher.displayed().unwrap().len(), 2);
}

// ---------------------------------------------------------------------------
// Overlay merge
// ---------------------------------------------------------------------------

#[test]
fn every_fetched_coin_carries_overlay_fields() {
    let mut store = MockStore::with_coins((1..=10).map(coin).collect());
    store.owned_rows = vec![owned_row(2), owned_row(5)];
    let fetcher = CoinFetcher::new();

    let mut filter = FilterSpec::default();
    filter.search = "coin".to_string();

    let coins = fetcher
        .fetch(&store, &filter, &loaded_overlay(&store))
        .unwrap();

    for c in coins.iter() {
        let should_own = c.coin_id == 2 || c.coin_id == 5;
        assert_eq!(c.is_owned, should_own, "coin {}", c.coin_id);
        if !should_own {
            assert!(c.display_obverse.is_none());
            assert!(c.display_reverse.is_none());
        }
    }
}

#[test]
fn owned_filter_queries_by_membership() {
    let mut store = MockStore::with_coins((1..=10).map(coin).collect());
    store.owned_rows = vec![owned_row(3), owned_row(8)];
    let fetcher = CoinFetcher::new();

    let mut filter = FilterSpec::default();
    filter.show_owned = ShowOwned::Owned;

    let coins = fetcher
        .fetch(&store, &filter, &loaded_overlay(&store))
        .unwrap();

    let mut ids: Vec<i64> = coins.iter().map(|c| c.coin_id).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![3, 8]);
    assert!(coins.iter().all(|c| c.is_owned));
}
