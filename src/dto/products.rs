use axum::extract::Multipart;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::Product,
    upload::UploadedImage,
};

pub const GALLERY_LIMIT: usize = 10;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProductQuery {
    /// Comma-separated category ids.
    pub categories: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<Product>)]
    pub items: Vec<Product>,
}

/// Text fields of the product multipart form. Create and update both carry the
/// full field set (full-replace semantics).
#[derive(Debug, ToSchema)]
pub struct ProductForm {
    pub name: String,
    pub description: String,
    pub rich_description: String,
    pub brand: String,
    pub price: i64,
    pub category: Uuid,
    pub count_in_stock: i32,
    pub rating: f32,
    pub num_reviews: i32,
    pub is_featured: bool,
}

/// Parsed `multipart/form-data` product payload: the text form plus the
/// optional `image` file part.
pub struct ProductUpload {
    pub form: ProductForm,
    pub image: Option<UploadedImage>,
}

impl ProductUpload {
    pub async fn from_multipart(mut multipart: Multipart) -> AppResult<Self> {
        let mut builder = ProductFormBuilder::default();
        let mut image = None;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|_| AppError::BadRequest("Malformed multipart body".into()))?
        {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };
            if name == "image" {
                let file_name = field.file_name().unwrap_or("image").to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|_| AppError::BadRequest("Malformed multipart body".into()))?
                    .to_vec();
                image = Some(UploadedImage {
                    file_name,
                    content_type,
                    bytes,
                });
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|_| AppError::BadRequest("Malformed multipart body".into()))?;
                builder.set(&name, value)?;
            }
        }

        Ok(Self {
            form: builder.finish()?,
            image,
        })
    }
}

#[derive(Default)]
struct ProductFormBuilder {
    name: Option<String>,
    description: Option<String>,
    rich_description: Option<String>,
    brand: Option<String>,
    price: Option<i64>,
    category: Option<Uuid>,
    count_in_stock: Option<i32>,
    rating: Option<f32>,
    num_reviews: Option<i32>,
    is_featured: Option<bool>,
}

impl ProductFormBuilder {
    fn set(&mut self, field: &str, value: String) -> AppResult<()> {
        match field {
            "name" => self.name = Some(value),
            "description" => self.description = Some(value),
            "richDescription" => self.rich_description = Some(value),
            "brand" => self.brand = Some(value),
            "price" => self.price = Some(parse_field(field, &value)?),
            "category" => {
                self.category = Some(
                    Uuid::parse_str(&value)
                        .map_err(|_| AppError::BadRequest("Invalid category id".into()))?,
                )
            }
            "countInStock" => self.count_in_stock = Some(parse_field(field, &value)?),
            "rating" => self.rating = Some(parse_field(field, &value)?),
            "numReviews" => self.num_reviews = Some(parse_field(field, &value)?),
            "isFeatured" => self.is_featured = Some(parse_field(field, &value)?),
            // Unknown fields are ignored, like any form parser would.
            _ => {}
        }
        Ok(())
    }

    fn finish(self) -> AppResult<ProductForm> {
        Ok(ProductForm {
            name: self
                .name
                .ok_or_else(|| AppError::BadRequest("Missing field: name".into()))?,
            description: self.description.unwrap_or_default(),
            rich_description: self.rich_description.unwrap_or_default(),
            brand: self.brand.unwrap_or_default(),
            price: self.price.unwrap_or_default(),
            category: self
                .category
                .ok_or_else(|| AppError::BadRequest("Missing field: category".into()))?,
            count_in_stock: self
                .count_in_stock
                .ok_or_else(|| AppError::BadRequest("Missing field: countInStock".into()))?,
            rating: self.rating.unwrap_or_default(),
            num_reviews: self.num_reviews.unwrap_or_default(),
            is_featured: self.is_featured.unwrap_or_default(),
        })
    }
}

fn parse_field<T: std::str::FromStr>(field: &str, value: &str) -> AppResult<T> {
    value
        .parse::<T>()
        .map_err(|_| AppError::BadRequest(format!("Invalid value for field: {field}")))
}

/// Parse the gallery form: every `images` file part, at most [`GALLERY_LIMIT`].
pub async fn gallery_from_multipart(mut multipart: Multipart) -> AppResult<Vec<UploadedImage>> {
    let mut images = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| AppError::BadRequest("Malformed multipart body".into()))?
    {
        if field.name() != Some("images") {
            continue;
        }
        if images.len() == GALLERY_LIMIT {
            return Err(AppError::BadRequest(format!(
                "At most {GALLERY_LIMIT} gallery images are allowed"
            )));
        }
        let file_name = field.file_name().unwrap_or("image").to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|_| AppError::BadRequest("Malformed multipart body".into()))?
            .to_vec();
        images.push(UploadedImage {
            file_name,
            content_type,
            bytes,
        });
    }

    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        extract::FromRequest,
        http::{Request, header},
    };

    const BOUNDARY: &str = "gallery-test-boundary";

    fn gallery_request(image_parts: usize) -> Request<Body> {
        let mut body = String::new();
        for n in 0..image_parts {
            body.push_str(&format!(
                "--{BOUNDARY}\r\n\
                 Content-Disposition: form-data; name=\"images\"; filename=\"shot {n}.png\"\r\n\
                 Content-Type: image/png\r\n\r\n\
                 pixels\r\n"
            ));
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));
        Request::builder()
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn gallery_accepts_up_to_the_limit() {
        let multipart = Multipart::from_request(gallery_request(GALLERY_LIMIT), &())
            .await
            .unwrap();
        let images = gallery_from_multipart(multipart).await.unwrap();
        assert_eq!(images.len(), GALLERY_LIMIT);
        assert_eq!(images[0].file_name, "shot 0.png");
        assert_eq!(images[0].content_type, "image/png");
    }

    #[tokio::test]
    async fn gallery_rejects_more_parts_than_the_limit() {
        let multipart = Multipart::from_request(gallery_request(GALLERY_LIMIT + 1), &())
            .await
            .unwrap();
        let err = gallery_from_multipart(multipart).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
