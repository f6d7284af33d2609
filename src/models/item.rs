use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// An installable application listed in the catalog
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct CatalogItem {
    /// Short code used in `/install/:code`
    pub code: String,
    pub title: String,
    pub description: String,
    /// Release asset path, relative to the configured download base url
    pub download: String,
}

/// Response listing the catalog
#[derive(Serialize, Deserialize, ToSchema)]
pub struct CatalogResponse {
    pub items: Vec<CatalogItem>,
}
