use base64::{Engine, engine::general_purpose::STANDARD};
use rust_decimal::Decimal;
use sea_orm::*;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::models::products::{self, ImageUrls};
use crate::services::blob_store::BlobStore;
use crate::utils::error::{AppError, AppResult};

pub const MIN_IMAGES: usize = 5;
pub const MAX_IMAGES: usize = 5;
pub const MAX_IMAGE_BYTES: usize = 6 * 1024 * 1024;

#[derive(Debug, Clone, Deserialize)]
pub struct ImageUpload {
    pub filename: String,
    /// Contenu encodé en base64 (un préfixe `data:...;base64,` est toléré)
    pub data: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    pub price: Decimal,
    pub category: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    pub stock: i32,
    #[serde(default)]
    pub images: Vec<ImageUpload>,
}

fn decode_image(upload: &ImageUpload) -> AppResult<Vec<u8>> {
    let payload = match upload.data.split_once(";base64,") {
        Some((_, rest)) => rest,
        None => upload.data.as_str(),
    };
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|_| AppError::validation(format!("Image {} is not valid base64", upload.filename)))?;

    if bytes.is_empty() {
        return Err(AppError::validation(format!("Image {} is empty", upload.filename)));
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(AppError::validation(format!(
            "Image {} exceeds {} bytes",
            upload.filename, MAX_IMAGE_BYTES
        )));
    }
    Ok(bytes)
}

pub struct ProductService;

impl ProductService {
    pub async fn list(db: &DatabaseConnection) -> AppResult<Vec<products::Model>> {
        Ok(products::Entity::find()
            .order_by_asc(products::Column::Name)
            .all(db)
            .await?)
    }

    pub async fn get(db: &DatabaseConnection, id: &str) -> AppResult<products::Model> {
        let not_found = || AppError::not_found("Product not found");
        let id = Uuid::try_parse(id.trim()).map_err(|_| not_found())?;
        products::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(not_found)
    }

    /// Valide tout avant d'envoyer la moindre image au stockage
    pub async fn create(
        db: &DatabaseConnection,
        blobs: &dyn BlobStore,
        request: CreateProductRequest,
    ) -> AppResult<products::Model> {
        request
            .validate()
            .map_err(|e| AppError::validation(e.to_string()))?;
        if request.price < Decimal::ZERO {
            return Err(AppError::validation("Price cannot be negative"));
        }
        if request.images.len() < MIN_IMAGES {
            return Err(AppError::validation(format!(
                "Please upload at least {} images.",
                MIN_IMAGES
            )));
        }
        if request.images.len() > MAX_IMAGES {
            return Err(AppError::validation(format!(
                "At most {} images can be uploaded.",
                MAX_IMAGES
            )));
        }

        let decoded = request
            .images
            .iter()
            .map(|upload| decode_image(upload).map(|bytes| (upload.filename.as_str(), bytes)))
            .collect::<AppResult<Vec<_>>>()?;

        let mut urls = Vec::with_capacity(decoded.len());
        for (filename, bytes) in decoded {
            let url = blobs.store(filename, bytes).await.map_err(AppError::Internal)?;
            urls.push(url);
        }

        let product = products::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name.trim().to_string()),
            price: Set(request.price),
            category: Set(request.category),
            description: Set(request.description),
            images: Set(ImageUrls(urls)),
            stock: Set(request.stock),
        }
        .insert(db)
        .await?;

        tracing::info!(product_id = %product.id, "product created");
        Ok(product)
    }
}
