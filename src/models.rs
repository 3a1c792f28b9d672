use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub icon: Option<String>,
    pub color: Option<String>,
}

impl From<entity::categories::Model> for Category {
    fn from(model: entity::categories::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            icon: model.icon,
            color: model.color,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub rich_description: String,
    pub image: String,
    pub brand: String,
    pub price: i64,
    /// Expanded inline when the category row still exists.
    pub category: Option<Category>,
    pub count_in_stock: i32,
    pub rating: f32,
    pub num_reviews: i32,
    pub is_featured: bool,
    pub images: Vec<String>,
    pub date_created: DateTime<Utc>,
}

impl Product {
    pub fn from_entity(
        model: entity::products::Model,
        category: Option<entity::categories::Model>,
    ) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            rich_description: model.rich_description,
            image: model.image,
            brand: model.brand,
            price: model.price,
            category: category.map(Category::from),
            count_in_stock: model.count_in_stock,
            rating: model.rating,
            num_reviews: model.num_reviews,
            is_featured: model.is_featured,
            images: model.images.0,
            date_created: model.date_created.with_timezone(&Utc),
        }
    }
}

// The password hash is excluded here by construction; this is the only user
// shape ever serialized to clients.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub is_admin: bool,
    pub street: String,
    pub apartment: String,
    pub zip: String,
    pub city: String,
    pub country: String,
}

impl From<entity::users::Model> for User {
    fn from(model: entity::users::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            phone: model.phone,
            is_admin: model.is_admin,
            street: model.street,
            apartment: model.apartment,
            zip: model.zip,
            city: model.city,
            country: model.country,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FilteredUser {
    pub name: String,
    pub phone: String,
    pub email: String,
}

impl From<entity::users::Model> for FilteredUser {
    fn from(model: entity::users::Model) -> Self {
        Self {
            name: model.name,
            phone: model.phone,
            email: model.email,
        }
    }
}

/// Owning user as exposed on order listings: id and name, nothing else.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderUser {
    pub id: Uuid,
    pub name: String,
}

impl From<entity::users::Model> for OrderUser {
    fn from(model: entity::users::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub order_items: Vec<Uuid>,
    pub shipping_address1: String,
    pub shipping_address2: Option<String>,
    pub city: String,
    pub zip: String,
    pub country: String,
    pub phone: String,
    pub status: String,
    pub total_price: i64,
    pub user: Option<OrderUser>,
    pub date_ordered: DateTime<Utc>,
}

impl Order {
    pub fn from_entity(
        model: entity::orders::Model,
        user: Option<entity::users::Model>,
    ) -> Self {
        Self {
            id: model.id,
            order_items: model.order_item_ids.0,
            shipping_address1: model.shipping_address1,
            shipping_address2: model.shipping_address2,
            city: model.city,
            zip: model.zip,
            country: model.country,
            phone: model.phone,
            status: model.status,
            total_price: model.total_price,
            user: user.map(OrderUser::from),
            date_ordered: model.date_ordered.with_timezone(&Utc),
        }
    }
}

/// Order item with its product (and the product's category) expanded.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemDetail {
    pub id: Uuid,
    pub quantity: i32,
    pub product: Option<Product>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    pub id: Uuid,
    pub order_items: Vec<OrderItemDetail>,
    pub shipping_address1: String,
    pub shipping_address2: Option<String>,
    pub city: String,
    pub zip: String,
    pub country: String,
    pub phone: String,
    pub status: String,
    pub total_price: i64,
    pub user: Option<OrderUser>,
    pub date_ordered: DateTime<Utc>,
}
