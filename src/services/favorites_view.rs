// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Favorites view: resolves favorite ids to meal records and keeps them in
//! sync with the favorites store.
//!
//! The reconciler subscribes to the store's change feed and re-resolves the
//! whole list whenever the published membership differs from the membership
//! it last resolved. Each id is fetched independently; a failed lookup drops
//! that id only.

use crate::error::AppError;
use crate::models::{FavoriteIds, Meal};
use crate::services::catalog::MealCatalog;
use crate::services::favorites::FavoritesStore;
use chrono::{SecondsFormat, Utc};
use futures_util::future::join_all;
use serde::Serialize;
use std::cmp::Ordering;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Name shown for records that arrive without one.
pub const UNNAMED_MEAL: &str = "Unnamed Meal";

/// A resolved favorite. Always a favorite by construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FavoriteMeal {
    #[serde(flatten)]
    pub meal: Meal,
    #[serde(rename = "isFavorite")]
    pub is_favorite: bool,
}

/// Published view state.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FavoritesViewState {
    pub meals: Vec<FavoriteMeal>,
    pub loading: bool,
    /// Ids currently in the store, resolved or not.
    pub favorite_count: usize,
    /// RFC3339 time of the last completed resolution.
    pub refreshed_at: Option<String>,
}

impl FavoritesViewState {
    pub fn is_empty(&self) -> bool {
        !self.loading && self.meals.is_empty()
    }
}

/// Resolve every id independently and build the sorted display list.
///
/// Missing or failing ids are dropped; blank names become [`UNNAMED_MEAL`].
pub async fn resolve_favorites(catalog: &dyn MealCatalog, ids: &FavoriteIds) -> Vec<FavoriteMeal> {
    let lookups = ids.iter().map(|id| catalog.get_meal_by_id(id));
    let mut meals: Vec<FavoriteMeal> = join_all(lookups)
        .await
        .into_iter()
        .flatten()
        .map(|mut meal| {
            if meal.name.as_deref().map_or(true, |n| n.trim().is_empty()) {
                meal.name = Some(UNNAMED_MEAL.to_string());
            }
            FavoriteMeal {
                meal,
                is_favorite: true,
            }
        })
        .collect();

    meals.sort_by(|a, b| compare_names(a.meal.name_or_empty(), b.meal.name_or_empty()));
    meals
}

/// Display order for meal names: accents and case are ignored first, so
/// "Écrevisses" sorts with the E's. Ties put unaccented before accented and
/// lowercase before uppercase.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    fold_name(a)
        .cmp(&fold_name(b))
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        .then_with(|| b.cmp(a))
}

/// Decompose, drop combining marks, lowercase.
fn fold_name(name: &str) -> String {
    name.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Current time, RFC3339 at second precision.
fn refresh_stamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

enum Command {
    Refresh,
}

/// Live favorites view.
///
/// Dropping the handle (or calling [`close`](Self::close)) stops the
/// subscription task and abandons any in-flight resolution.
pub struct FavoritesReconciler {
    favorites: FavoritesStore,
    state: Arc<watch::Sender<FavoritesViewState>>,
    commands: mpsc::UnboundedSender<Command>,
    cancel: CancellationToken,
}

impl FavoritesReconciler {
    /// Start the view: resolve the current favorites, then follow the store.
    pub fn start(
        catalog: Arc<dyn MealCatalog>,
        favorites: FavoritesStore,
        parent: &CancellationToken,
    ) -> Self {
        let cancel = parent.child_token();
        let (state_tx, _) = watch::channel(FavoritesViewState::default());
        let state = Arc::new(state_tx);
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        let task = ReconcileTask {
            catalog,
            favorites: favorites.clone(),
            state: state.clone(),
            cancel: cancel.clone(),
        };
        tokio::spawn(task.run(command_rx));

        Self {
            favorites,
            state,
            commands: command_tx,
            cancel,
        }
    }

    /// Current view snapshot.
    pub fn view(&self) -> FavoritesViewState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FavoritesViewState> {
        self.state.subscribe()
    }

    /// Wait until the published view satisfies `pred`.
    pub async fn wait_for<F>(&self, mut pred: F) -> Result<FavoritesViewState, AppError>
    where
        F: FnMut(&FavoritesViewState) -> bool,
    {
        let mut rx = self.state.subscribe();
        let view = rx
            .wait_for(|v| pred(v))
            .await
            .map_err(|_| AppError::Cancelled)?;
        Ok(view.clone())
    }

    /// Un-favorite `id` and drop it from the displayed list immediately.
    pub fn remove(&self, id: &str) -> Result<bool, AppError> {
        let removed = self.favorites.remove(id)?;
        self.forget(id);
        Ok(removed)
    }

    /// Flip membership of `id`. Returns whether it is now a favorite.
    ///
    /// Un-favoriting hides the entry immediately, as [`remove`](Self::remove)
    /// does; a new favorite appears once the reconciler resolves it.
    pub fn toggle(&self, id: &str) -> Result<bool, AppError> {
        let now_favorite = self.favorites.toggle(id)?;
        if !now_favorite {
            self.forget(id);
        }
        Ok(now_favorite)
    }

    fn forget(&self, id: &str) {
        self.state.send_modify(|view| {
            view.meals.retain(|m| m.meal.id != id);
            view.favorite_count = self.favorites.len();
        });
    }

    /// Remove every favorite and empty the displayed list.
    pub fn clear_all(&self) -> Result<usize, AppError> {
        let removed = self.favorites.clear()?;
        self.state.send_modify(|view| {
            view.meals.clear();
            view.favorite_count = 0;
        });
        Ok(removed)
    }

    /// Re-resolve the current favorites (the retry action).
    pub fn refresh(&self) {
        if self.commands.send(Command::Refresh).is_err() {
            tracing::debug!("Favorites view closed, refresh dropped");
        }
    }

    pub fn close(&self) {
        self.cancel.cancel();
    }
}

impl Drop for FavoritesReconciler {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct ReconcileTask {
    catalog: Arc<dyn MealCatalog>,
    favorites: FavoritesStore,
    state: Arc<watch::Sender<FavoritesViewState>>,
    cancel: CancellationToken,
}

impl ReconcileTask {
    async fn run(self, mut commands: mpsc::UnboundedReceiver<Command>) {
        let mut changes = self.favorites.subscribe();
        let mut resolved = changes.borrow_and_update().clone();
        if !self.reconcile(&resolved).await {
            return;
        }

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                changed = changes.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let latest = changes.borrow_and_update().clone();
                    if latest == resolved {
                        continue;
                    }
                    tracing::debug!(
                        previous = resolved.len(),
                        current = latest.len(),
                        "Favorites changed, reconciling"
                    );
                    resolved = latest;
                    if !self.reconcile(&resolved).await {
                        break;
                    }
                }
                command = commands.recv() => match command {
                    Some(Command::Refresh) => {
                        resolved = self.favorites.all();
                        if !self.reconcile(&resolved).await {
                            break;
                        }
                    }
                    None => break,
                },
            }
        }

        tracing::debug!("Favorites view stopped");
    }

    /// Resolve `ids` and publish the result. Returns `false` if cancelled.
    async fn reconcile(&self, ids: &FavoriteIds) -> bool {
        if ids.is_empty() {
            self.state.send_modify(|view| {
                view.meals.clear();
                view.loading = false;
                view.favorite_count = 0;
                view.refreshed_at = Some(refresh_stamp());
            });
            return true;
        }

        self.state.send_modify(|view| {
            view.loading = true;
        });

        let catalog = self.catalog.as_ref();
        let meals = tokio::select! {
            _ = self.cancel.cancelled() => return false,
            meals = resolve_favorites(catalog, ids) => meals,
        };

        // Ids removed while the lookups were in flight must not reappear.
        let current = self.favorites.all();
        let meals: Vec<FavoriteMeal> = meals
            .into_iter()
            .filter(|m| current.contains(&m.meal.id))
            .collect();

        tracing::info!(
            requested = ids.len(),
            resolved = meals.len(),
            "Favorites resolved"
        );

        self.state.send_modify(|view| {
            view.meals = meals;
            view.loading = false;
            view.favorite_count = current.len();
            view.refreshed_at = Some(refresh_stamp());
        });
        true
    }
}
