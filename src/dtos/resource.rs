//! Learning resource DTOs

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CreateResourceDTO {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 50))]
    pub resource_type: String,
    #[validate(length(min = 1, max = 50))]
    pub category: String,
    #[validate(length(min = 1, max = 50))]
    pub difficulty: String,
    #[serde(default)]
    pub content: serde_json::Value,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, Validate)]
pub struct UpdateResourceDTO {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub resource_type: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub category: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub difficulty: Option<String>,
    pub content: Option<serde_json::Value>,
    pub tags: Option<Vec<String>>,
}

/// Exact-match filters for `GET /api/resources`; `tag` matches any tag
#[derive(Serialize, Deserialize, Debug, Default, Clone)]
pub struct ResourceFilter {
    pub category: Option<String>,
    pub difficulty: Option<String>,
    pub resource_type: Option<String>,
    pub tag: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct TagsQuery {
    #[serde(default)]
    pub tags: String,
}

impl TagsQuery {
    /// Comma separated list, blanks dropped
    pub fn tag_list(&self) -> Vec<String> {
        self.tags
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect()
    }
}
