use actix_web::{delete, get, post, put, web, HttpResponse};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use uuid::Uuid;

use crate::middleware::AuthUser;
use crate::services::cart_service::CartService;
use crate::utils::error::{AppError, AppResult};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: String,
    pub quantity: Option<i32>,
}

#[derive(Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: i32,
}

fn product_id(raw: &str) -> AppResult<Uuid> {
    Uuid::try_parse(raw.trim()).map_err(|_| AppError::not_found("Item not found"))
}

/// GET /api/cart (PROTÉGÉE)
#[get("")]
pub async fn get_cart(auth_user: AuthUser, db: web::Data<DatabaseConnection>) -> AppResult<HttpResponse> {
    let items = CartService::items(db.get_ref(), &auth_user.token()).await?;
    Ok(HttpResponse::Ok().json(items))
}

/// POST /api/cart - Ajouter un produit (PROTÉGÉE)
#[post("")]
pub async fn add_to_cart(
    auth_user: AuthUser,
    body: web::Json<AddToCartRequest>,
    db: web::Data<DatabaseConnection>,
) -> AppResult<HttpResponse> {
    let item = CartService::add(db.get_ref(), &auth_user.token(), &body.product_id, body.quantity).await?;
    Ok(HttpResponse::Ok().json(item))
}

/// PUT /api/cart/{product_id} - Fixer la quantité (PROTÉGÉE)
#[put("/{product_id}")]
pub async fn update_quantity(
    auth_user: AuthUser,
    path: web::Path<String>,
    body: web::Json<UpdateQuantityRequest>,
    db: web::Data<DatabaseConnection>,
) -> AppResult<HttpResponse> {
    let item = CartService::set_quantity(
        db.get_ref(),
        &auth_user.token(),
        product_id(&path)?,
        body.quantity,
    )
    .await?;
    Ok(HttpResponse::Ok().json(item))
}

/// DELETE /api/cart/{product_id} (PROTÉGÉE)
#[delete("/{product_id}")]
pub async fn remove_from_cart(
    auth_user: AuthUser,
    path: web::Path<String>,
    db: web::Data<DatabaseConnection>,
) -> AppResult<HttpResponse> {
    CartService::remove(db.get_ref(), &auth_user.token(), product_id(&path)?).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Removed" })))
}

/// DELETE /api/cart - Vider le panier (PROTÉGÉE)
#[delete("")]
pub async fn clear_cart(auth_user: AuthUser, db: web::Data<DatabaseConnection>) -> AppResult<HttpResponse> {
    let removed = CartService::clear(db.get_ref(), &auth_user.token()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "removed": removed })))
}

pub fn cart_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/cart")
            .service(get_cart)
            .service(add_to_cart)
            .service(clear_cart)
            .service(update_quantity)
            .service(remove_from_cart),
    );
}
