use actix_web::{get, post, web, HttpResponse};
use sea_orm::DatabaseConnection;

use crate::services::blob_store::BlobStore;
use crate::services::product_service::{CreateProductRequest, ProductService};
use crate::utils::error::AppResult;

/// GET /api/products - Catalogue complet
#[get("")]
pub async fn list_products(db: web::Data<DatabaseConnection>) -> AppResult<HttpResponse> {
    let products = ProductService::list(db.get_ref()).await?;
    Ok(HttpResponse::Ok().json(products))
}

/// GET /api/products/{id}
#[get("/{id}")]
pub async fn get_product(
    path: web::Path<String>,
    db: web::Data<DatabaseConnection>,
) -> AppResult<HttpResponse> {
    let product = ProductService::get(db.get_ref(), &path).await?;
    Ok(HttpResponse::Ok().json(product))
}

/// POST /api/products/add - Création avec 5 images en base64
#[post("/add")]
pub async fn add_product(
    body: web::Json<CreateProductRequest>,
    db: web::Data<DatabaseConnection>,
    blobs: web::Data<dyn BlobStore>,
) -> AppResult<HttpResponse> {
    let product = ProductService::create(db.get_ref(), blobs.get_ref(), body.into_inner()).await?;
    Ok(HttpResponse::Created().json(product))
}

pub fn product_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/products")
            .service(list_products)
            .service(add_product)
            .service(get_product),
    );
}
