// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Favorite meal ids, persisted to local storage and published to subscribers.
//!
//! Every mutation serializes the full id list to storage before it returns;
//! the in-memory set and the published snapshot change only after the write
//! succeeds. Subscribers receive each committed snapshot over a `watch`
//! channel.

use crate::error::AppError;
use crate::models::FavoriteIds;
use crate::storage::{keys, KeyValueStore};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

/// Shared favorites store. Clones share state.
#[derive(Clone)]
pub struct FavoritesStore {
    inner: Arc<Inner>,
}

struct Inner {
    storage: Arc<dyn KeyValueStore>,
    /// Serializes mutations so persist-then-publish happens in call order.
    write_lock: Mutex<()>,
    tx: watch::Sender<FavoriteIds>,
}

impl FavoritesStore {
    /// Rehydrate the store from `storage`.
    ///
    /// A missing or unparsable entry yields an empty set; it is never an error.
    pub fn load(storage: Arc<dyn KeyValueStore>) -> Self {
        let ids = read_favorites(storage.as_ref());
        tracing::debug!(count = ids.len(), "Loaded favorites");

        let (tx, _rx) = watch::channel(ids);
        Self {
            inner: Arc::new(Inner {
                storage,
                write_lock: Mutex::new(()),
                tx,
            }),
        }
    }

    /// Membership test against the current snapshot.
    pub fn is_favorite(&self, id: &str) -> bool {
        self.inner.tx.borrow().contains(id)
    }

    /// Current snapshot. Stale once any caller mutates the store.
    pub fn all(&self) -> FavoriteIds {
        self.inner.tx.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.tx.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Receive every committed snapshot.
    pub fn subscribe(&self) -> watch::Receiver<FavoriteIds> {
        self.inner.tx.subscribe()
    }

    /// Add `id`. Returns `false` if it was already a favorite.
    pub fn add(&self, id: &str) -> Result<bool, AppError> {
        let changed = self.commit(|ids| ids.with(id))?;
        if changed {
            tracing::info!(meal_id = %id, "Added favorite");
        }
        Ok(changed)
    }

    /// Remove `id`. Returns `false` if it was not a favorite.
    pub fn remove(&self, id: &str) -> Result<bool, AppError> {
        let changed = self.commit(|ids| ids.without(id))?;
        if changed {
            tracing::info!(meal_id = %id, "Removed favorite");
        }
        Ok(changed)
    }

    /// Add when absent, remove when present. Returns the new membership.
    pub fn toggle(&self, id: &str) -> Result<bool, AppError> {
        let mut now_favorite = false;
        self.commit(|ids| match ids.without(id) {
            Some(next) => Some(next),
            None => {
                now_favorite = true;
                ids.with(id)
            }
        })?;
        Ok(now_favorite)
    }

    /// Remove every favorite with a single write. Returns how many were removed.
    pub fn clear(&self) -> Result<usize, AppError> {
        let mut removed = 0;
        self.commit(|ids| {
            removed = ids.len();
            (!ids.is_empty()).then(FavoriteIds::default)
        })?;
        if removed > 0 {
            tracing::info!(count = removed, "Cleared favorites");
        }
        Ok(removed)
    }

    /// Compute the next snapshot, persist it, then publish it.
    ///
    /// `next` returns `None` when nothing changes; no write happens then.
    fn commit<F>(&self, next: F) -> Result<bool, AppError>
    where
        F: FnOnce(&FavoriteIds) -> Option<FavoriteIds>,
    {
        let _guard = self
            .inner
            .write_lock
            .lock()
            .unwrap_or_else(|e| e.into_inner());

        let current = self.all();
        let Some(updated) = next(&current) else {
            return Ok(false);
        };

        self.persist(&updated)?;
        self.inner.tx.send_replace(updated);
        Ok(true)
    }

    /// Write `ids` to storage. The empty set is stored as no entry.
    fn persist(&self, ids: &FavoriteIds) -> Result<(), AppError> {
        if ids.is_empty() {
            return self.inner.storage.remove(keys::FAVORITES);
        }
        let json = serde_json::to_string(ids)
            .map_err(|e| AppError::Storage(format!("Failed to encode favorites: {}", e)))?;
        self.inner.storage.set(keys::FAVORITES, &json)
    }
}

/// Decode the persisted favorites entry, degrading to empty on any fault.
fn read_favorites(storage: &dyn KeyValueStore) -> FavoriteIds {
    let Some(raw) = storage.get(keys::FAVORITES) else {
        return FavoriteIds::default();
    };

    match serde_json::from_str::<Vec<String>>(&raw) {
        Ok(ids) => FavoriteIds::new(ids),
        Err(e) => {
            tracing::warn!(error = %e, "Stored favorites are corrupt, using empty set");
            FavoriteIds::default()
        }
    }
}
