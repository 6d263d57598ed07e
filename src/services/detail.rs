// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Meal detail assembly: ingredients, embeddable video, tags and steps.

use crate::error::AppError;
use crate::models::{annotate, AnnotatedMeal, Ingredient, Meal, INGREDIENT_SLOTS};
use crate::services::catalog::MealCatalog;
use crate::services::favorites::FavoritesStore;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Length of a platform video id.
const VIDEO_ID_LEN: usize = 11;
const SHORT_DESCRIPTION_LEN: usize = 150;

lazy_static! {
    /// Known video URL shapes; group 7 captures the candidate id.
    static ref VIDEO_URL_RE: Regex =
        Regex::new(r"^.*((youtu.be/)|(v/)|(/u/\w/)|(embed/)|(watch\?))\??v?=?([^#&?]*).*").unwrap();
    static ref LINE_BREAK_RE: Regex = Regex::new(r"\r\n|\r|\n").unwrap();
}

/// Fully assembled meal detail view.
#[derive(Debug, Clone, Serialize)]
pub struct MealDetail {
    pub meal: AnnotatedMeal,
    pub ingredients: Vec<Ingredient>,
    /// Embeddable video id, when the video URL has a recognized shape.
    pub video_id: Option<String>,
    pub embed_url: Option<String>,
    pub tags: Vec<String>,
    pub steps: Vec<String>,
}

/// Builds [`MealDetail`] views from the catalog and the favorites store.
#[derive(Clone)]
pub struct DetailAssembler {
    catalog: Arc<dyn MealCatalog>,
    favorites: FavoritesStore,
}

impl DetailAssembler {
    pub fn new(catalog: Arc<dyn MealCatalog>, favorites: FavoritesStore) -> Self {
        Self { catalog, favorites }
    }

    /// Fetch and assemble meal `id`.
    ///
    /// Unknown ids are `NotFound`; a transport fault is `CatalogApi` and
    /// retryable. If `cancel` fires first the fetch is abandoned and nothing
    /// is assembled.
    pub async fn assemble(&self, id: &str, cancel: &CancellationToken) -> Result<MealDetail, AppError> {
        let meal = tokio::select! {
            _ = cancel.cancelled() => return Err(AppError::Cancelled),
            result = self.catalog.lookup_meal(id) => result?,
        };

        if cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }

        let meal = meal.ok_or_else(|| AppError::NotFound(format!("Meal {}", id)))?;
        Ok(build_detail(&meal, &self.favorites))
    }
}

/// Assemble the detail view of an already fetched meal.
pub fn build_detail(meal: &Meal, favorites: &FavoritesStore) -> MealDetail {
    let video_id = meal.youtube.as_deref().and_then(video_id);
    MealDetail {
        meal: annotate(meal, &favorites.all()),
        ingredients: extract_ingredients(meal),
        embed_url: video_id
            .as_ref()
            .map(|id| format!("https://www.youtube.com/embed/{}", id)),
        video_id,
        tags: split_tags(meal.tags.as_deref().unwrap_or("")),
        steps: instruction_steps(meal.instructions.as_deref().unwrap_or("")),
    }
}

/// Non-blank ingredient slots in slot order, with trimmed measures.
pub fn extract_ingredients(meal: &Meal) -> Vec<Ingredient> {
    (1..=INGREDIENT_SLOTS)
        .filter_map(|n| {
            let slot = meal.ingredient_slot(n);
            let name = slot.ingredient.map(str::trim).filter(|s| !s.is_empty())?;
            Some(Ingredient {
                name: name.to_string(),
                measure: slot.measure.map(str::trim).unwrap_or("").to_string(),
            })
        })
        .collect()
}

/// Extract an embeddable video id from a video URL.
///
/// Only ids of exactly 11 characters are accepted.
pub fn video_id(url: &str) -> Option<String> {
    let captures = VIDEO_URL_RE.captures(url)?;
    let id = captures.get(7)?.as_str();
    (id.chars().count() == VIDEO_ID_LEN).then(|| id.to_string())
}

/// Comma-separated tags, trimmed, blanks dropped.
pub fn split_tags(tags: &str) -> Vec<String> {
    tags.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Instruction lines split on any newline variant, trimmed, blanks dropped.
pub fn instruction_steps(instructions: &str) -> Vec<String> {
    LINE_BREAK_RE
        .split(instructions)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Card blurb: the first 150 characters followed by `...` when longer.
pub fn short_description(text: &str) -> String {
    if text.is_empty() {
        return "No Description Available".to_string();
    }
    if text.chars().count() > SHORT_DESCRIPTION_LEN {
        let cut: String = text.chars().take(SHORT_DESCRIPTION_LEN).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}
