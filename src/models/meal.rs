// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Meal record from TheMealDB and its favorite-annotated projection.

use crate::models::FavoriteIds;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Number of parallel `strIngredientN` / `strMeasureN` slots in a meal record.
pub const INGREDIENT_SLOTS: usize = 20;

/// A meal as returned by the catalog API.
///
/// Filter endpoints return only id, name and thumbnail, so everything but the
/// id is optional. The numbered ingredient/measure slots and any fields this
/// crate does not model are kept verbatim in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    #[serde(rename = "idMeal")]
    pub id: String,
    #[serde(rename = "strMeal", default)]
    pub name: Option<String>,
    #[serde(rename = "strCategory", default)]
    pub category: Option<String>,
    #[serde(rename = "strArea", default)]
    pub area: Option<String>,
    #[serde(rename = "strInstructions", default)]
    pub instructions: Option<String>,
    #[serde(rename = "strMealThumb", default)]
    pub thumbnail: Option<String>,
    #[serde(rename = "strTags", default)]
    pub tags: Option<String>,
    #[serde(rename = "strYoutube", default)]
    pub youtube: Option<String>,
    #[serde(rename = "strSource", default)]
    pub source: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Raw contents of one numbered ingredient slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngredientSlot<'a> {
    pub ingredient: Option<&'a str>,
    pub measure: Option<&'a str>,
}

impl Meal {
    /// A meal with only an id and name, as filter endpoints return.
    pub fn summary(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: Some(name.into()),
            category: None,
            area: None,
            instructions: None,
            thumbnail: None,
            tags: None,
            youtube: None,
            source: None,
            extra: BTreeMap::new(),
        }
    }

    /// Slot `n` (1-based, `1..=INGREDIENT_SLOTS`).
    pub fn ingredient_slot(&self, n: usize) -> IngredientSlot<'_> {
        IngredientSlot {
            ingredient: self.extra_str(&format!("strIngredient{}", n)),
            measure: self.extra_str(&format!("strMeasure{}", n)),
        }
    }

    /// Set slot `n`; used when building records by hand.
    pub fn set_ingredient_slot(&mut self, n: usize, ingredient: &str, measure: &str) {
        self.extra.insert(
            format!("strIngredient{}", n),
            Value::String(ingredient.to_string()),
        );
        self.extra
            .insert(format!("strMeasure{}", n), Value::String(measure.to_string()));
    }

    fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(Value::as_str)
    }

    pub fn name_or_empty(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    pub fn area_or_empty(&self) -> &str {
        self.area.as_deref().unwrap_or("")
    }
}

/// A meal paired with its favorite status at projection time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedMeal {
    #[serde(flatten)]
    pub meal: Meal,
    #[serde(rename = "isFavorite")]
    pub is_favorite: bool,
}

/// Project a catalog record against a favorites snapshot.
///
/// The catalog record itself never carries favorite state; callers re-project
/// whenever the snapshot changes.
pub fn annotate(meal: &Meal, favorites: &FavoriteIds) -> AnnotatedMeal {
    AnnotatedMeal {
        meal: meal.clone(),
        is_favorite: favorites.contains(&meal.id),
    }
}

/// One normalized ingredient line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Ingredient {
    pub name: String,
    /// Trimmed measure; empty when the slot had none.
    pub measure: String,
}

impl fmt::Display for Ingredient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.measure.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} {}", self.measure, self.name)
        }
    }
}
