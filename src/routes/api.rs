// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{annotate, AnnotatedMeal, Category};
use crate::services::detail::{short_description, MealDetail};
use crate::services::favorites_view::FavoritesViewState;
use crate::services::listing::{ListingPipeline, PageView};
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::MutexGuard;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Categories shown in the home carousel.
const CAROUSEL_CATEGORIES: usize = 12;

/// API routes (require authentication via the session token).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/meals", get(get_listing))
        .route("/api/meals/open", post(open_listing))
        .route("/api/meals/filters", post(set_filters))
        .route("/api/meals/page/{page}", post(go_to_page))
        .route("/api/meals/next", post(next_page))
        .route("/api/meals/prev", post(prev_page))
        .route("/api/meals/clear", post(clear_filters))
        .route("/api/meals/reload", post(reload_listing))
        .route("/api/meals/{id}", get(get_meal_detail))
        .route("/api/categories", get(get_categories))
        .route("/api/categories/full", get(get_full_categories))
        .route("/api/countries", get(get_countries))
        .route("/api/random", get(get_random_meal))
        .route(
            "/api/favorites",
            get(get_favorites).delete(clear_favorites),
        )
        .route("/api/favorites/refresh", post(refresh_favorites))
        .route(
            "/api/favorites/{id}",
            put(add_favorite).delete(remove_favorite),
        )
        .route("/api/favorites/{id}/toggle", post(toggle_favorite))
}

// ─── User Profile ────────────────────────────────────────────

/// Current user response.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserResponse {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: u64,
    pub username: String,
    pub display_name: String,
    pub email: String,
    pub image: String,
    pub signed_in_at: Option<String>,
}

async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Json<UserResponse> {
    let signed_in_at = state
        .auth
        .current_session()
        .map(|s| s.signed_in_rfc3339());

    Json(UserResponse {
        id: user.id,
        display_name: user.display_name(),
        username: user.username,
        email: user.email,
        image: user.image,
        signed_in_at,
    })
}

// ─── Listing ─────────────────────────────────────────────────

#[derive(Deserialize, Default)]
pub struct OpenListingRequest {
    /// Category to preselect, as when arriving from the category carousel.
    #[serde(default)]
    pub category: Option<String>,
}

/// Filter changes; absent fields are left alone.
#[derive(Deserialize, Default)]
pub struct FiltersRequest {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

/// Lock the listing slot, opening a pipeline if none is open.
async fn listing_slot(state: &AppState) -> MutexGuard<'_, Option<ListingPipeline>> {
    let mut slot = state.listing.lock().await;
    if slot.as_ref().map_or(true, ListingPipeline::is_closed) {
        *slot = Some(ListingPipeline::open(
            state.catalog.clone(),
            state.favorites.clone(),
            state.listing_options(None),
            &state.shutdown,
        ));
    }
    slot
}

/// Run `action` on the open listing and return the view once it is applied.
async fn with_listing<F>(state: &AppState, action: F) -> Result<Json<PageView>>
where
    F: FnOnce(&ListingPipeline),
{
    let slot = listing_slot(state).await;
    let pipeline = slot
        .as_ref()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("listing slot empty")))?;
    action(pipeline);
    pipeline.flush().await?;
    Ok(Json(pipeline.view()))
}

async fn get_listing(State(state): State<Arc<AppState>>) -> Result<Json<PageView>> {
    with_listing(&state, |_| {}).await
}

/// Replace the open listing with a fresh one.
async fn open_listing(
    State(state): State<Arc<AppState>>,
    Json(body): Json<OpenListingRequest>,
) -> Result<Json<PageView>> {
    let preselect = body.category.filter(|c| !c.trim().is_empty());
    tracing::info!(category = ?preselect, "Opening listing");

    let pipeline = ListingPipeline::open(
        state.catalog.clone(),
        state.favorites.clone(),
        state.listing_options(preselect),
        &state.shutdown,
    );
    let view = pipeline.view();

    // Dropping the previous pipeline cancels its work.
    *state.listing.lock().await = Some(pipeline);
    Ok(Json(view))
}

async fn set_filters(
    State(state): State<Arc<AppState>>,
    Json(body): Json<FiltersRequest>,
) -> Result<Json<PageView>> {
    with_listing(&state, |pipeline| {
        if let Some(country) = body.country {
            pipeline.set_country(country);
        }
        if let Some(category) = body.category {
            pipeline.set_category(category);
        }
        if let Some(search) = body.search {
            pipeline.set_search(search);
        }
    })
    .await
}

async fn go_to_page(
    State(state): State<Arc<AppState>>,
    Path(page): Path<usize>,
) -> Result<Json<PageView>> {
    with_listing(&state, |pipeline| pipeline.go_to_page(page)).await
}

async fn next_page(State(state): State<Arc<AppState>>) -> Result<Json<PageView>> {
    with_listing(&state, ListingPipeline::next_page).await
}

async fn prev_page(State(state): State<Arc<AppState>>) -> Result<Json<PageView>> {
    with_listing(&state, ListingPipeline::prev_page).await
}

async fn clear_filters(State(state): State<Arc<AppState>>) -> Result<Json<PageView>> {
    with_listing(&state, ListingPipeline::clear_filters).await
}

async fn reload_listing(State(state): State<Arc<AppState>>) -> Result<Json<PageView>> {
    with_listing(&state, ListingPipeline::reload).await
}

// ─── Detail ──────────────────────────────────────────────────

async fn get_meal_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MealDetail>> {
    let cancel = state.shutdown.child_token();
    let detail = state.detail.assemble(&id, &cancel).await?;
    Ok(Json(detail))
}

// ─── Catalog ─────────────────────────────────────────────────

#[derive(Serialize)]
pub struct NamesResponse {
    pub names: Vec<String>,
}

/// Category card for the home carousel.
#[derive(Clone, Serialize)]
pub struct CategoryCard {
    #[serde(flatten)]
    pub category: Category,
    pub short_description: String,
}

#[derive(Serialize)]
pub struct CategoriesResponse {
    pub categories: Vec<CategoryCard>,
    /// Leading entries shown in the carousel.
    pub carousel: Vec<CategoryCard>,
}

async fn get_categories(State(state): State<Arc<AppState>>) -> Result<Json<NamesResponse>> {
    let names = state.catalog.list_categories().await?;
    Ok(Json(NamesResponse { names }))
}

async fn get_countries(State(state): State<Arc<AppState>>) -> Result<Json<NamesResponse>> {
    let names = state.catalog.list_countries().await?;
    Ok(Json(NamesResponse { names }))
}

async fn get_full_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CategoriesResponse>> {
    let categories: Vec<CategoryCard> = state
        .catalog
        .full_categories()
        .await?
        .into_iter()
        .map(|category| CategoryCard {
            short_description: short_description(
                category.description.as_deref().unwrap_or(""),
            ),
            category,
        })
        .collect();

    let carousel = categories
        .iter()
        .take(CAROUSEL_CATEGORIES)
        .cloned()
        .collect();

    Ok(Json(CategoriesResponse {
        categories,
        carousel,
    }))
}

async fn get_random_meal(State(state): State<Arc<AppState>>) -> Result<Json<AnnotatedMeal>> {
    let meal = state
        .catalog
        .random_meal()
        .await?
        .ok_or_else(|| AppError::NotFound("Random meal".to_string()))?;
    Ok(Json(annotate(&meal, &state.favorites.all())))
}

// ─── Favorites ───────────────────────────────────────────────

#[derive(Serialize)]
pub struct FavoriteChangeResponse {
    pub id: String,
    #[serde(rename = "isFavorite")]
    pub is_favorite: bool,
    pub changed: bool,
    pub favorite_count: usize,
}

#[derive(Serialize)]
pub struct ClearFavoritesResponse {
    pub removed: usize,
}

async fn get_favorites(State(state): State<Arc<AppState>>) -> Json<FavoritesViewState> {
    Json(state.favorites_view.view())
}

async fn add_favorite(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<FavoriteChangeResponse>> {
    if id.trim().is_empty() {
        return Err(AppError::BadRequest("meal id is required".to_string()));
    }
    let changed = state.favorites.add(&id)?;
    Ok(Json(FavoriteChangeResponse {
        id,
        is_favorite: true,
        changed,
        favorite_count: state.favorites.len(),
    }))
}

async fn remove_favorite(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<FavoriteChangeResponse>> {
    let changed = state.favorites_view.remove(&id)?;
    Ok(Json(FavoriteChangeResponse {
        id,
        is_favorite: false,
        changed,
        favorite_count: state.favorites.len(),
    }))
}

/// Heart button on the listing and detail views.
async fn toggle_favorite(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<FavoriteChangeResponse>> {
    if id.trim().is_empty() {
        return Err(AppError::BadRequest("meal id is required".to_string()));
    }
    let is_favorite = state.favorites_view.toggle(&id)?;
    Ok(Json(FavoriteChangeResponse {
        id,
        is_favorite,
        changed: true,
        favorite_count: state.favorites.len(),
    }))
}

async fn clear_favorites(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ClearFavoritesResponse>> {
    let removed = state.favorites_view.clear_all()?;
    Ok(Json(ClearFavoritesResponse { removed }))
}

async fn refresh_favorites(State(state): State<Arc<AppState>>) -> Json<FavoritesViewState> {
    state.favorites_view.refresh();
    Json(state.favorites_view.view())
}
