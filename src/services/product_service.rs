use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect, Set};
use uuid::Uuid;

use crate::{
    dto::products::{ProductForm, ProductList, ProductQuery},
    entity::{
        Categories,
        products::{ActiveModel, Column, Entity as Products, ImageUrls},
    },
    error::{AppError, AppResult},
    models::Product,
    response::{ApiResponse, CountData, Meta},
    state::AppState,
};

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let mut finder = Products::find();

    if let Some(raw) = query.categories.as_ref().filter(|s| !s.is_empty()) {
        let ids = raw
            .split(',')
            .map(|part| {
                Uuid::parse_str(part.trim())
                    .map_err(|_| AppError::BadRequest("Invalid category id".into()))
            })
            .collect::<AppResult<Vec<_>>>()?;
        finder = finder.filter(Column::CategoryId.is_in(ids));
    }

    let items: Vec<Product> = finder
        .find_also_related(Categories)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|(product, category)| Product::from_entity(product, category))
        .collect();

    let meta = Meta::total(items.len() as i64);
    Ok(ApiResponse::success(
        "Products",
        ProductList { items },
        Some(meta),
    ))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let (product, category) = Products::find_by_id(id)
        .find_also_related(Categories)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(ApiResponse::success(
        "Product",
        Product::from_entity(product, category),
        None,
    ))
}

pub async fn create_product(
    state: &AppState,
    form: ProductForm,
    image_url: String,
) -> AppResult<ApiResponse<Product>> {
    ensure_category_exists(state, form.category).await?;

    let active = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(form.name),
        description: Set(form.description),
        rich_description: Set(form.rich_description),
        image: Set(image_url),
        brand: Set(form.brand),
        price: Set(form.price),
        category_id: Set(form.category),
        count_in_stock: Set(form.count_in_stock),
        rating: Set(form.rating),
        num_reviews: Set(form.num_reviews),
        is_featured: Set(form.is_featured),
        images: Set(ImageUrls::default()),
        date_created: NotSet,
    };
    let product = active.insert(&state.orm).await?;

    let category = Categories::find_by_id(product.category_id)
        .one(&state.orm)
        .await?;
    Ok(ApiResponse::success(
        "Product created",
        Product::from_entity(product, category),
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    id: Uuid,
    form: ProductForm,
    image_url: Option<String>,
) -> AppResult<ApiResponse<Product>> {
    ensure_category_exists(state, form.category).await?;

    let existing = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    // A freshly uploaded image replaces the stored URL; otherwise keep it.
    let image = image_url.unwrap_or_else(|| existing.image.clone());

    let mut active: ActiveModel = existing.into();
    active.name = Set(form.name);
    active.description = Set(form.description);
    active.rich_description = Set(form.rich_description);
    active.image = Set(image);
    active.brand = Set(form.brand);
    active.price = Set(form.price);
    active.category_id = Set(form.category);
    active.count_in_stock = Set(form.count_in_stock);
    active.rating = Set(form.rating);
    active.num_reviews = Set(form.num_reviews);
    active.is_featured = Set(form.is_featured);
    let product = active.update(&state.orm).await?;

    let category = Categories::find_by_id(product.category_id)
        .one(&state.orm)
        .await?;
    Ok(ApiResponse::success(
        "Product updated",
        Product::from_entity(product, category),
        Some(Meta::empty()),
    ))
}

/// Replace the gallery array wholesale.
pub async fn update_gallery(
    state: &AppState,
    id: Uuid,
    image_urls: Vec<String>,
) -> AppResult<ApiResponse<Product>> {
    let existing = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: ActiveModel = existing.into();
    active.images = Set(ImageUrls(image_urls));
    let product = active.update(&state.orm).await?;

    let category = Categories::find_by_id(product.category_id)
        .one(&state.orm)
        .await?;
    Ok(ApiResponse::success(
        "Product gallery updated",
        Product::from_entity(product, category),
        Some(Meta::empty()),
    ))
}

pub async fn delete_product(
    state: &AppState,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = Products::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    Ok(ApiResponse::success(
        "Product deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn count_products(state: &AppState) -> AppResult<ApiResponse<CountData>> {
    let count = Products::find().count(&state.orm).await? as i64;
    Ok(ApiResponse::success(
        "Product count",
        CountData { count },
        None,
    ))
}

pub async fn featured_products(
    state: &AppState,
    limit: Option<u64>,
) -> AppResult<ApiResponse<ProductList>> {
    let mut finder = Products::find().filter(Column::IsFeatured.eq(true));
    if let Some(limit) = limit {
        finder = finder.limit(limit);
    }

    let items: Vec<Product> = finder
        .find_also_related(Categories)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|(product, category)| Product::from_entity(product, category))
        .collect();

    let meta = Meta::total(items.len() as i64);
    Ok(ApiResponse::success(
        "Featured products",
        ProductList { items },
        Some(meta),
    ))
}

/// Products must point at an existing category at write time; this is the only
/// referential check in the system.
async fn ensure_category_exists(state: &AppState, category_id: Uuid) -> AppResult<()> {
    let found = Categories::find_by_id(category_id).one(&state.orm).await?;
    if found.is_none() {
        return Err(AppError::BadRequest("Invalid category".into()));
    }
    Ok(())
}
