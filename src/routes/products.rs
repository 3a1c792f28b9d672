use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    http::HeaderMap,
    routing::{delete, get, post, put},
};
use uuid::Uuid;

use crate::{
    dto::products::{self, ProductList, ProductQuery, ProductUpload},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Product,
    response::{ApiResponse, CountData},
    services::product_service,
    state::AppState,
    upload,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products))
        .route("/", post(create_product))
        .route("/get/count", get(product_count))
        .route("/get/featured", get(featured_products))
        .route("/get/featured/{count}", get(featured_products_limited))
        .route("/gallery-images/{id}", put(update_gallery))
        .route("/{id}", get(get_product))
        .route("/{id}", put(update_product))
        .route("/{id}", delete(delete_product))
}

// Malformed ids short-circuit with a 400 before any lookup.
fn parse_product_id(id: &str) -> AppResult<Uuid> {
    Uuid::parse_str(id).map_err(|_| AppError::BadRequest("Invalid product id".into()))
}

#[utoipa::path(
    get,
    path = "/products",
    params(
        ("categories" = Option<String>, Query, description = "Comma-separated category ids")
    ),
    responses(
        (status = 200, description = "List products", body = ApiResponse<ProductList>)
    ),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    Ok(Json(product_service::list_products(&state, query).await?))
}

#[utoipa::path(
    get,
    path = "/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Get product", body = ApiResponse<Product>),
        (status = 404, description = "Product not found"),
    ),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let id = parse_product_id(&id)?;
    Ok(Json(product_service::get_product(&state, id).await?))
}

#[utoipa::path(
    post,
    path = "/products",
    responses(
        (status = 200, description = "Create product (multipart, field `image`)", body = ApiResponse<Product>),
        (status = 400, description = "Invalid category, missing image or bad image type"),
    ),
    tag = "Products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    _user: AuthUser,
    headers: HeaderMap,
    multipart: Multipart,
) -> AppResult<Json<ApiResponse<Product>>> {
    let ProductUpload { form, image } = ProductUpload::from_multipart(multipart).await?;
    let image = image.ok_or_else(|| AppError::BadRequest("No image in the request".into()))?;

    let file_name = upload::store_image(&state.config.upload_dir, &image).await?;
    let image_url = upload::public_url(&headers, &file_name);

    Ok(Json(
        product_service::create_product(&state, form, image_url).await?,
    ))
}

#[utoipa::path(
    put,
    path = "/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Update product (multipart, optional `image`)", body = ApiResponse<Product>),
        (status = 404, description = "Product not found"),
    ),
    tag = "Products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
    headers: HeaderMap,
    multipart: Multipart,
) -> AppResult<Json<ApiResponse<Product>>> {
    let id = parse_product_id(&id)?;
    let ProductUpload { form, image } = ProductUpload::from_multipart(multipart).await?;

    let image_url = match image {
        Some(image) => {
            let file_name = upload::store_image(&state.config.upload_dir, &image).await?;
            Some(upload::public_url(&headers, &file_name))
        }
        None => None,
    };

    Ok(Json(
        product_service::update_product(&state, id, form, image_url).await?,
    ))
}

#[utoipa::path(
    put,
    path = "/products/gallery-images/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Replace the gallery images (multipart, field `images`, max 10)", body = ApiResponse<Product>),
        (status = 404, description = "Product not found"),
    ),
    tag = "Products"
)]
pub async fn update_gallery(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
    headers: HeaderMap,
    multipart: Multipart,
) -> AppResult<Json<ApiResponse<Product>>> {
    let id = parse_product_id(&id)?;
    let images = products::gallery_from_multipart(multipart).await?;

    let mut image_urls = Vec::with_capacity(images.len());
    for image in &images {
        let file_name = upload::store_image(&state.config.upload_dir, image).await?;
        image_urls.push(upload::public_url(&headers, &file_name));
    }

    Ok(Json(
        product_service::update_gallery(&state, id, image_urls).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Delete product"),
        (status = 404, description = "Product not found"),
    ),
    tag = "Products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let id = parse_product_id(&id)?;
    Ok(Json(product_service::delete_product(&state, id).await?))
}

#[utoipa::path(
    get,
    path = "/products/get/count",
    responses(
        (status = 200, description = "Count products", body = ApiResponse<CountData>)
    ),
    tag = "Products"
)]
pub async fn product_count(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<CountData>>> {
    Ok(Json(product_service::count_products(&state).await?))
}

#[utoipa::path(
    get,
    path = "/products/get/featured",
    responses(
        (status = 200, description = "Featured products", body = ApiResponse<ProductList>)
    ),
    tag = "Products"
)]
pub async fn featured_products(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    Ok(Json(product_service::featured_products(&state, None).await?))
}

#[utoipa::path(
    get,
    path = "/products/get/featured/{count}",
    params(("count" = u64, Path, description = "Maximum number of products")),
    responses(
        (status = 200, description = "Featured products", body = ApiResponse<ProductList>)
    ),
    tag = "Products"
)]
pub async fn featured_products_limited(
    State(state): State<AppState>,
    Path(count): Path<String>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let count = count
        .parse::<u64>()
        .map_err(|_| AppError::BadRequest("Invalid count".into()))?;
    Ok(Json(
        product_service::featured_products(&state, Some(count)).await?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_product_ids_are_rejected_before_lookup() {
        assert!(matches!(
            parse_product_id("not-a-uuid"),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            parse_product_id(""),
            Err(AppError::BadRequest(_))
        ));

        let id = Uuid::new_v4();
        assert_eq!(parse_product_id(&id.to_string()).unwrap(), id);
    }
}
