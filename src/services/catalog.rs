// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! TheMealDB API client.
//!
//! Handles:
//! - Lookup by id, search by name or first letter
//! - Filtering by category and by area (country)
//! - Category / area name lists and the full category listing
//! - Random meal
//!
//! Every list-style endpoint wraps its payload in an envelope whose array may
//! be `null`; a `null` array is an empty result, not an error.

use crate::error::AppError;
use crate::models::{AreaName, Category, CategoryName, Meal};
use async_trait::async_trait;
use futures_util::future::try_join_all;
use serde::Deserialize;

/// Letters queried by the full-catalog fetch.
pub const CATALOG_LETTERS: &str = "abcdefghijklmnopqrstuvwxyz";

/// Read-only access to the remote meal catalog.
///
/// Implemented by [`CatalogClient`] over HTTP; tests substitute in-memory
/// catalogs.
#[async_trait]
pub trait MealCatalog: Send + Sync {
    /// Look up one meal. `Ok(None)` when the id is unknown.
    async fn lookup_meal(&self, id: &str) -> Result<Option<Meal>, AppError>;

    /// Meals whose name starts with `letter`.
    async fn meals_by_first_letter(&self, letter: char) -> Result<Vec<Meal>, AppError>;

    /// Meals whose name contains `text`.
    async fn search_meals(&self, text: &str) -> Result<Vec<Meal>, AppError>;

    async fn meals_by_category(&self, category: &str) -> Result<Vec<Meal>, AppError>;

    async fn meals_by_area(&self, area: &str) -> Result<Vec<Meal>, AppError>;

    /// Raw category names, in API order.
    async fn category_names(&self) -> Result<Vec<String>, AppError>;

    /// Raw area names, in API order.
    async fn area_names(&self) -> Result<Vec<String>, AppError>;

    async fn full_categories(&self) -> Result<Vec<Category>, AppError>;

    async fn random_meal(&self) -> Result<Option<Meal>, AppError>;

    // ─── Composed operations ────────────────────────────────────────────────

    /// Look up one meal, reporting any fault as absent.
    ///
    /// Batch callers use this so one failing id does not sink the batch.
    async fn get_meal_by_id(&self, id: &str) -> Option<Meal> {
        match self.lookup_meal(id).await {
            Ok(meal) => meal,
            Err(e) => {
                tracing::warn!(meal_id = %id, error = %e, "Meal lookup failed, treating as absent");
                None
            }
        }
    }

    /// Fetch every meal by querying each letter concurrently.
    ///
    /// Results are concatenated in letter order regardless of arrival order.
    /// The first failing letter fails the whole fetch.
    async fn all_meals_by_first_letter(&self) -> Result<Vec<Meal>, AppError> {
        let requests = CATALOG_LETTERS
            .chars()
            .map(|letter| self.meals_by_first_letter(letter));

        let pages = try_join_all(requests).await.inspect_err(|e| {
            tracing::error!(error = %e, "Full catalog fetch failed");
        })?;

        let meals: Vec<Meal> = pages.into_iter().flatten().collect();
        tracing::debug!(count = meals.len(), "Fetched full catalog");
        Ok(meals)
    }

    /// Search by name; blank text yields nothing without a request.
    async fn search_by_name(&self, text: &str) -> Result<Vec<Meal>, AppError> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        self.search_meals(text).await
    }

    /// Sorted, de-duplicated category names.
    async fn list_categories(&self) -> Result<Vec<String>, AppError> {
        Ok(sorted_unique(self.category_names().await?))
    }

    /// Sorted, de-duplicated country (area) names.
    async fn list_countries(&self) -> Result<Vec<String>, AppError> {
        Ok(sorted_unique(self.area_names().await?))
    }
}

/// Sort lexicographically and drop duplicates.
pub fn sorted_unique(mut names: Vec<String>) -> Vec<String> {
    names.sort();
    names.dedup();
    names
}

/// `{ "meals": [...] | null }`
#[derive(Debug, Deserialize)]
struct MealsEnvelope<T> {
    meals: Option<Vec<T>>,
}

/// `{ "categories": [...] | null }`
#[derive(Debug, Deserialize)]
struct CategoriesEnvelope {
    categories: Option<Vec<Category>>,
}

/// HTTP client for TheMealDB.
#[derive(Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    base_url: String,
}

impl CatalogClient {
    /// Create a client for the API rooted at `base_url`
    /// (e.g. `https://www.themealdb.com/api/json/v1/1`).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `{base}/{endpoint}` with query parameters and unwrap the `meals` envelope.
    async fn get_meals<T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, AppError> {
        let envelope: MealsEnvelope<T> = self.get_json(endpoint, query).await?;
        Ok(envelope.meals.unwrap_or_default())
    }

    /// Generic GET request with JSON response.
    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<T, AppError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        tracing::debug!(endpoint, ?query, "Catalog request");

        let response = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| AppError::CatalogApi(e.to_string()))?;

        self.check_response_json(response).await
    }

    /// Check response status and parse JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                tracing::warn!("Catalog rate limit hit (429)");
            }

            return Err(AppError::CatalogApi(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::CatalogApi(format!("JSON parse error: {}", e)))
    }
}

#[async_trait]
impl MealCatalog for CatalogClient {
    async fn lookup_meal(&self, id: &str) -> Result<Option<Meal>, AppError> {
        let meals: Vec<Meal> = self.get_meals("lookup.php", &[("i", id)]).await?;
        Ok(meals.into_iter().next())
    }

    async fn meals_by_first_letter(&self, letter: char) -> Result<Vec<Meal>, AppError> {
        let letter = letter.to_string();
        self.get_meals("search.php", &[("f", letter.as_str())]).await
    }

    async fn search_meals(&self, text: &str) -> Result<Vec<Meal>, AppError> {
        self.get_meals("search.php", &[("s", text)]).await
    }

    async fn meals_by_category(&self, category: &str) -> Result<Vec<Meal>, AppError> {
        self.get_meals("filter.php", &[("c", category)]).await
    }

    async fn meals_by_area(&self, area: &str) -> Result<Vec<Meal>, AppError> {
        self.get_meals("filter.php", &[("a", area)]).await
    }

    async fn category_names(&self) -> Result<Vec<String>, AppError> {
        let names: Vec<CategoryName> = self.get_meals("list.php", &[("c", "list")]).await?;
        Ok(names.into_iter().map(|c| c.name).collect())
    }

    async fn area_names(&self) -> Result<Vec<String>, AppError> {
        let names: Vec<AreaName> = self.get_meals("list.php", &[("a", "list")]).await?;
        Ok(names.into_iter().map(|a| a.name).collect())
    }

    async fn full_categories(&self) -> Result<Vec<Category>, AppError> {
        let envelope: CategoriesEnvelope = self.get_json("categories.php", &[]).await?;
        Ok(envelope.categories.unwrap_or_default())
    }

    async fn random_meal(&self) -> Result<Option<Meal>, AppError> {
        let meals: Vec<Meal> = self.get_meals("random.php", &[]).await?;
        Ok(meals.into_iter().next())
    }
}
