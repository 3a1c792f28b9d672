use serde::Deserialize;
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::Category;

/// Create and update share one shape: updates are full-replace.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CategoryPayload {
    pub name: String,
    pub icon: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct CategoryList {
    #[schema(value_type = Vec<Category>)]
    pub items: Vec<Category>,
}
