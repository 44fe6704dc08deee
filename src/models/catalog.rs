use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::validate::validate_required;

/// A catalog entry as stored in the `catalog_items` collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogItem {
    pub id: i64,
    pub title: String,
    pub category: String,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a new catalog entry. The service assigns `id` and `created_at`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct NewCatalogItem {
    pub title: String,
    pub category: String,
    pub image_url: String,
}

impl NewCatalogItem {
    pub fn new(title: &str, category: &str, image_url: &str) -> Self {
        Self {
            title: title.trim().to_string(),
            category: category.trim().to_string(),
            image_url: image_url.trim().to_string(),
        }
    }

    /// All three fields are required. Duplicates are not checked.
    pub fn validate(&self) -> Vec<String> {
        [
            validate_required(&self.title, "Title", 200),
            validate_required(&self.category, "Category", 100),
            validate_required(&self.image_url, "Image URL", 2048),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}
