// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Favorites view: resolution, partial failure, live updates.

use easycook::services::favorites_view::{resolve_favorites, UNNAMED_MEAL};
use easycook::services::{FavoritesReconciler, FavoritesStore, MealCatalog};
use easycook::storage::{keys, MemoryStore};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

mod common;
use common::{meal, StaticCatalog};

const WAIT: Duration = Duration::from_secs(5);
const LOOKUP_DELAY: Duration = Duration::from_millis(200);

fn catalog() -> StaticCatalog {
    let mut unnamed = meal("4", "", "British", "Beef");
    unnamed.name = None;
    StaticCatalog::new(vec![
        meal("1", "zucchini fritters", "British", "Vegetarian"),
        meal("2", "Apple Frangipan Tart", "British", "Dessert"),
        meal("3", "beef Wellington", "British", "Beef"),
        unnamed,
    ])
}

fn store(raw: &str) -> FavoritesStore {
    FavoritesStore::load(Arc::new(MemoryStore::with_entry(keys::FAVORITES, raw)))
}

fn start(catalog: StaticCatalog, favorites: &FavoritesStore) -> FavoritesReconciler {
    let catalog: Arc<dyn MealCatalog> = Arc::new(catalog);
    FavoritesReconciler::start(catalog, favorites.clone(), &CancellationToken::new())
}

fn names(reconciler: &FavoritesReconciler) -> Vec<String> {
    reconciler
        .view()
        .meals
        .iter()
        .map(|m| m.meal.name_or_empty().to_string())
        .collect()
}

#[tokio::test]
async fn test_failed_lookup_drops_only_that_id() {
    let ids = store(r#"["1","2","3"]"#).all();
    let catalog = catalog().failing_id("2");

    let meals = resolve_favorites(&catalog, &ids).await;
    let ids: Vec<&str> = meals.iter().map(|m| m.meal.id.as_str()).collect();
    assert_eq!(ids, vec!["3", "1"]);
    assert!(meals.iter().all(|m| m.is_favorite));
}

#[tokio::test]
async fn test_sorted_case_insensitively_with_unnamed_default() {
    let favorites = store(r#"["1","2","3","4","999"]"#);
    let reconciler = start(catalog(), &favorites);

    let view = timeout(WAIT, reconciler.wait_for(|v| v.refreshed_at.is_some()))
        .await
        .unwrap()
        .unwrap();
    assert!(!view.loading);
    assert_eq!(view.favorite_count, 5);
    assert_eq!(
        names(&reconciler),
        vec![
            "Apple Frangipan Tart",
            "beef Wellington",
            UNNAMED_MEAL,
            "zucchini fritters",
        ]
    );
}

#[tokio::test]
async fn test_remove_is_immediate() {
    let favorites = store(r#"["1","2","3"]"#);
    let reconciler = start(catalog(), &favorites);
    timeout(WAIT, reconciler.wait_for(|v| v.meals.len() == 3))
        .await
        .unwrap()
        .unwrap();

    assert!(reconciler.remove("3").unwrap());
    // No waiting: the entry is gone from the published view already.
    assert_eq!(
        names(&reconciler),
        vec!["Apple Frangipan Tart", "zucchini fritters"]
    );
    assert!(!favorites.is_favorite("3"));
    assert!(!reconciler.remove("3").unwrap());
}

#[tokio::test]
async fn test_toggle_adds_then_hides() {
    let favorites = store(r#"["1"]"#);
    let reconciler = start(catalog(), &favorites);
    timeout(WAIT, reconciler.wait_for(|v| v.meals.len() == 1))
        .await
        .unwrap()
        .unwrap();

    assert!(reconciler.toggle("2").unwrap());
    timeout(WAIT, reconciler.wait_for(|v| v.meals.len() == 2))
        .await
        .unwrap()
        .unwrap();

    assert!(!reconciler.toggle("1").unwrap());
    assert_eq!(names(&reconciler), vec!["Apple Frangipan Tart"]);
    assert_eq!(reconciler.view().favorite_count, 1);
    assert_eq!(favorites.all().as_slice(), &["2".to_string()]);
}

#[tokio::test]
async fn test_follows_store_changes() {
    let favorites = store("[]");
    let reconciler = start(catalog(), &favorites);
    timeout(WAIT, reconciler.wait_for(|v| v.refreshed_at.is_some()))
        .await
        .unwrap()
        .unwrap();
    assert!(reconciler.view().is_empty());

    // Favorited elsewhere, e.g. from the detail view.
    favorites.add("2").unwrap();
    timeout(WAIT, reconciler.wait_for(|v| v.meals.len() == 1))
        .await
        .unwrap()
        .unwrap();

    favorites.add("1").unwrap();
    let view = timeout(WAIT, reconciler.wait_for(|v| v.meals.len() == 2))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(view.favorite_count, 2);

    // Same count, different membership still reconciles.
    favorites.remove("1").unwrap();
    favorites.add("3").unwrap();
    timeout(
        WAIT,
        reconciler.wait_for(|v| v.meals.iter().any(|m| m.meal.id == "3")),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(
        names(&reconciler),
        vec!["Apple Frangipan Tart", "beef Wellington"]
    );
}

#[tokio::test]
async fn test_accented_names_sort_with_base_letter() {
    let catalog = StaticCatalog::new(vec![
        meal("10", "Teriyaki Chicken", "Japanese", "Chicken"),
        meal("11", "Šaltibarščiai", "Lithuanian", "Vegetarian"),
        meal("12", "Zucchini", "Italian", "Vegetarian"),
        meal("13", "Écrevisses", "French", "Seafood"),
        meal("14", "Apple Crumble", "British", "Dessert"),
    ]);
    let favorites = store(r#"["10","11","12","13","14"]"#);
    let reconciler = start(catalog, &favorites);
    timeout(WAIT, reconciler.wait_for(|v| v.meals.len() == 5))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(
        names(&reconciler),
        vec![
            "Apple Crumble",
            "Écrevisses",
            "Šaltibarščiai",
            "Teriyaki Chicken",
            "Zucchini",
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_clear_all_and_refresh() {
    let favorites = store(r#"["1","2"]"#);
    let catalog = Arc::new(catalog().with_delay(LOOKUP_DELAY));
    let reconciler =
        FavoritesReconciler::start(catalog.clone(), favorites.clone(), &CancellationToken::new());
    timeout(WAIT, reconciler.wait_for(|v| v.meals.len() == 2))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(reconciler.clear_all().unwrap(), 2);
    assert!(reconciler.view().meals.is_empty());
    assert!(favorites.is_empty());

    favorites.add("3").unwrap();
    timeout(WAIT, reconciler.wait_for(|v| v.meals.len() == 1))
        .await
        .unwrap()
        .unwrap();

    // Refresh re-resolves: loading while the lookups run, keeping the
    // current list on screen, then the new result.
    let lookups = catalog.lookup_calls.load(Ordering::SeqCst);
    reconciler.refresh();
    let view = timeout(WAIT, reconciler.wait_for(|v| v.loading))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(view.meals.len(), 1);

    tokio::time::advance(LOOKUP_DELAY).await;
    let view = timeout(WAIT, reconciler.wait_for(|v| !v.loading))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(view.meals.len(), 1);
    assert_eq!(catalog.lookup_calls.load(Ordering::SeqCst), lookups + 1);
}

#[tokio::test]
async fn test_closed_view_stops_following() {
    let favorites = store(r#"["1"]"#);
    let reconciler = start(catalog(), &favorites);
    timeout(WAIT, reconciler.wait_for(|v| v.meals.len() == 1))
        .await
        .unwrap()
        .unwrap();

    reconciler.close();
    tokio::time::sleep(Duration::from_millis(20)).await;
    favorites.add("2").unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(reconciler.view().meals.len(), 1);
}
