//! Retrospective and template DTOs

use crate::entities::{ActionItem, Retro, RetroCategory, RetroItem, RetroStatus, RetroTemplate};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use validator::{Validate, ValidationError};

lazy_static! {
    static ref HEX_COLOR_RE: Regex = Regex::new(r"^#[0-9A-Fa-f]{6}$").unwrap();
}

/// Categories must be non-empty, uniquely identified and carry `#rrggbb` colors
pub fn validate_categories(categories: &[RetroCategory]) -> Result<(), ValidationError> {
    if categories.is_empty() {
        return Err(ValidationError::new("categories_empty"));
    }
    let mut seen = HashSet::new();
    for category in categories {
        if category.id.trim().is_empty() || category.name.trim().is_empty() {
            return Err(ValidationError::new("category_blank"));
        }
        if !seen.insert(category.id.as_str()) {
            return Err(ValidationError::new("category_duplicate_id"));
        }
        if !HEX_COLOR_RE.is_match(&category.color) {
            return Err(ValidationError::new("category_color"));
        }
    }
    Ok(())
}

fn validate_category_list(categories: &Vec<RetroCategory>) -> Result<(), ValidationError> {
    validate_categories(categories)
}

#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CreateTemplateDTO {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    #[validate(custom(function = "validate_category_list"))]
    pub categories: Vec<RetroCategory>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, Validate)]
pub struct UpdateTemplateDTO {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    #[validate(custom(function = "validate_category_list"))]
    pub categories: Option<Vec<RetroCategory>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CreateRetroDTO {
    pub sprint_id: Option<i64>,
    #[validate(length(min = 1, max = 200, message = "Retro title must be between 1 and 200 characters"))]
    pub title: String,
    pub template_id: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UpdateRetroStatusDTO {
    pub status: RetroStatus,
}

#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CreateRetroItemDTO {
    #[validate(length(min = 1, max = 64))]
    pub category_id: String,
    #[validate(length(min = 1, max = 2000, message = "Item content must be between 1 and 2000 characters"))]
    pub content: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, Validate)]
pub struct UpdateRetroItemDTO {
    #[validate(length(min = 1, max = 64))]
    pub category_id: Option<String>,
    #[validate(length(min = 1, max = 2000))]
    pub content: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CreateActionItemDTO {
    #[validate(length(min = 1, max = 2000))]
    pub content: String,
    #[validate(length(max = 100))]
    pub assignee: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, Validate)]
pub struct UpdateActionItemDTO {
    #[validate(length(min = 1, max = 2000))]
    pub content: Option<String>,
    #[validate(length(max = 100))]
    pub assignee: Option<String>,
    pub done: Option<bool>,
}

/// A retro with everything needed to render or export it
#[derive(Serialize, Deserialize, Debug)]
pub struct RetroDetailsDTO {
    #[serde(flatten)]
    pub retro: Retro,
    pub items: Vec<RetroItem>,
    pub template: Option<RetroTemplate>,
    pub action_items: Vec<ActionItem>,
}

impl RetroDetailsDTO {
    pub fn category_name(&self, category_id: &str) -> &str {
        self.retro
            .categories
            .0
            .iter()
            .find(|c| c.id == category_id)
            .map(|c| c.name.as_str())
            .unwrap_or("")
    }
}
