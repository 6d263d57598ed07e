// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod auth;
pub mod catalog;
pub mod detail;
pub mod favorites;
pub mod favorites_view;
pub mod listing;

pub use auth::AuthService;
pub use catalog::{CatalogClient, MealCatalog};
pub use detail::{DetailAssembler, MealDetail};
pub use favorites::FavoritesStore;
pub use favorites_view::{FavoritesReconciler, FavoritesViewState};
pub use listing::{ListingOptions, ListingPipeline, PageView};
