// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod category;
pub mod favorite;
pub mod meal;
pub mod user;

pub use category::{AreaName, Category, CategoryName};
pub use favorite::FavoriteIds;
pub use meal::{annotate, AnnotatedMeal, Ingredient, IngredientSlot, Meal, INGREDIENT_SLOTS};
pub use user::{AuthResponse, LoginRequest, User};
