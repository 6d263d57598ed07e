// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Favorite meal id set.

use serde::{Serialize, Serializer};
use std::sync::Arc;

/// Immutable, ordered snapshot of favorite meal ids.
///
/// Snapshots are cheap to clone and never change; a mutation of the
/// favorites store produces a new snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavoriteIds(Arc<[String]>);

impl FavoriteIds {
    /// Build a snapshot, dropping repeated ids while keeping first-seen order.
    pub fn new(ids: Vec<String>) -> Self {
        let mut unique: Vec<String> = Vec::with_capacity(ids.len());
        for id in ids {
            if !unique.contains(&id) {
                unique.push(id);
            }
        }
        Self(unique.into())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.iter().any(|fav| fav == id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Snapshot with `id` appended, or `None` if it is already present.
    pub fn with(&self, id: &str) -> Option<Self> {
        if self.contains(id) {
            return None;
        }
        let mut ids = self.0.to_vec();
        ids.push(id.to_string());
        Some(Self(ids.into()))
    }

    /// Snapshot without `id`, or `None` if it was absent.
    pub fn without(&self, id: &str) -> Option<Self> {
        if !self.contains(id) {
            return None;
        }
        let ids: Vec<String> = self.0.iter().filter(|fav| *fav != id).cloned().collect();
        Some(Self(ids.into()))
    }
}

impl Default for FavoriteIds {
    fn default() -> Self {
        Self(Vec::new().into())
    }
}

impl Serialize for FavoriteIds {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.as_ref().serialize(serializer)
    }
}
