// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! EasyCook: browse, search and favorite recipes from TheMealDB
//!
//! This crate provides the client core (catalog access, the paged listing
//! pipeline, meal detail assembly and persisted favorites) and serves it to
//! a local frontend as a JSON API.

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod storage;

use config::Config;
use services::{
    AuthService, DetailAssembler, FavoritesReconciler, FavoritesStore, ListingOptions,
    ListingPipeline, MealCatalog,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub catalog: Arc<dyn MealCatalog>,
    pub favorites: FavoritesStore,
    pub detail: DetailAssembler,
    pub favorites_view: FavoritesReconciler,
    pub auth: AuthService,
    /// The open listing, if any. Replaced whenever a listing is (re)opened.
    pub listing: Mutex<Option<ListingPipeline>>,
    /// Root token; cancelled at shutdown.
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Wire the services together. Must be called inside a tokio runtime.
    pub fn new(
        config: Config,
        catalog: Arc<dyn MealCatalog>,
        favorites: FavoritesStore,
        auth: AuthService,
        shutdown: CancellationToken,
    ) -> Self {
        let detail = DetailAssembler::new(catalog.clone(), favorites.clone());
        let favorites_view =
            FavoritesReconciler::start(catalog.clone(), favorites.clone(), &shutdown);

        Self {
            config,
            catalog,
            favorites,
            detail,
            favorites_view,
            auth,
            listing: Mutex::new(None),
            shutdown,
        }
    }

    /// Listing options from config, optionally preselecting a category.
    pub fn listing_options(&self, preselect_category: Option<String>) -> ListingOptions {
        ListingOptions {
            page_size: self.config.page_size,
            search_debounce: self.config.search_debounce,
            pagination_radius: self.config.pagination_radius,
            preselect_category,
        }
    }
}
