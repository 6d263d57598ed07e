// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Category and country lookup records from TheMealDB.

use serde::{Deserialize, Serialize};

/// Full category record (`categories.php`), used by the carousel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    #[serde(rename = "idCategory")]
    pub id: String,
    #[serde(rename = "strCategory")]
    pub name: String,
    #[serde(rename = "strCategoryThumb", default)]
    pub thumbnail: Option<String>,
    #[serde(rename = "strCategoryDescription", default)]
    pub description: Option<String>,
}

/// Entry of `list.php?c=list`.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryName {
    #[serde(rename = "strCategory")]
    pub name: String,
}

/// Entry of `list.php?a=list`.
#[derive(Debug, Clone, Deserialize)]
pub struct AreaName {
    #[serde(rename = "strArea")]
    pub name: String,
}
