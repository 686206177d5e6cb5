use actix_web::{delete, get, post, put, web, HttpResponse};
use sea_orm::DatabaseConnection;

use crate::models::dto::{
    BackfillResponse, CreateOrderRequest, UpdateAddressRequest, UpdateStatusRequest,
};
use crate::services::backfill_service::BackfillService;
use crate::services::order_assembler::OrderAssembler;
use crate::services::order_service::{NewOrder, OrderService};
use crate::utils::error::{AppError, AppResult};

/// POST /api/orders - Créer une commande
#[post("")]
pub async fn create_order(
    body: web::Json<CreateOrderRequest>,
    db: web::Data<DatabaseConnection>,
) -> AppResult<HttpResponse> {
    let new_order = NewOrder::from_request(body.into_inner())?;
    let order = OrderService::create(db.get_ref(), new_order).await?;
    Ok(HttpResponse::Created().json(order))
}

/// GET /api/orders - Toutes les commandes avec l'utilisateur attaché (admin)
#[get("")]
pub async fn list_orders(db: web::Data<DatabaseConnection>) -> AppResult<HttpResponse> {
    let orders = OrderService::find_all(db.get_ref()).await?;
    let views = OrderAssembler::attach_users(db.get_ref(), orders).await;
    Ok(HttpResponse::Ok().json(views))
}

/// GET /api/orders/lookup/{key} - Une commande (id durable ou code)
#[get("/lookup/{key}")]
pub async fn get_order(
    path: web::Path<String>,
    db: web::Data<DatabaseConnection>,
) -> AppResult<HttpResponse> {
    let order = OrderService::find(db.get_ref(), &path).await?;
    Ok(HttpResponse::Ok().json(OrderAssembler::attach_user(db.get_ref(), order).await))
}

/// GET /api/orders/{user_token} - Commandes d'un client (id ou ancien username)
#[get("/{user_token}")]
pub async fn orders_for_user(
    path: web::Path<String>,
    db: web::Data<DatabaseConnection>,
) -> AppResult<HttpResponse> {
    let orders = OrderService::find_by_user_token(db.get_ref(), &path).await?;
    Ok(HttpResponse::Ok().json(orders))
}

/// PUT /api/orders/status/{key} - Statut + infos de livraison, renvoie la commande avec l'utilisateur
#[put("/status/{key}")]
pub async fn update_status(
    path: web::Path<String>,
    body: web::Json<UpdateStatusRequest>,
    db: web::Data<DatabaseConnection>,
) -> AppResult<HttpResponse> {
    let body = body.into_inner();
    let order = OrderService::update_status(
        db.get_ref(),
        &path,
        body.status,
        body.arriving_info,
        body.arriving_date,
    )
    .await?;
    Ok(HttpResponse::Ok().json(OrderAssembler::attach_user(db.get_ref(), order).await))
}

/// PUT /api/orders/address/{key} - Adresse de livraison (une chaîne vide est acceptée)
#[put("/address/{key}")]
pub async fn update_address(
    path: web::Path<String>,
    body: web::Json<UpdateAddressRequest>,
    db: web::Data<DatabaseConnection>,
) -> AppResult<HttpResponse> {
    let address = body
        .into_inner()
        .address
        .ok_or_else(|| AppError::validation("Address required"))?;
    let order = OrderService::update_address(db.get_ref(), &path, address).await?;
    Ok(HttpResponse::Ok().json(order))
}

/// PUT /api/orders/cancel/{key}
#[put("/cancel/{key}")]
pub async fn cancel_order(
    path: web::Path<String>,
    db: web::Data<DatabaseConnection>,
) -> AppResult<HttpResponse> {
    let order = OrderService::cancel(db.get_ref(), &path).await?;
    Ok(HttpResponse::Ok().json(order))
}

/// DELETE /api/orders/{key}
#[delete("/{key}")]
pub async fn delete_order(
    path: web::Path<String>,
    db: web::Data<DatabaseConnection>,
) -> AppResult<HttpResponse> {
    OrderService::delete(db.get_ref(), &path).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Deleted" })))
}

/// POST /api/orders/backfill-addresses
#[post("/backfill-addresses")]
pub async fn backfill_addresses(db: web::Data<DatabaseConnection>) -> AppResult<HttpResponse> {
    let report = BackfillService::backfill_addresses(db.get_ref()).await?;
    Ok(HttpResponse::Ok().json(BackfillResponse {
        message: "Backfill complete",
        scanned: report.scanned,
        updated: report.updated,
    }))
}

/// POST /api/orders/backfill-codes
#[post("/backfill-codes")]
pub async fn backfill_codes(db: web::Data<DatabaseConnection>) -> AppResult<HttpResponse> {
    let report = BackfillService::backfill_order_codes(db.get_ref()).await?;
    Ok(HttpResponse::Ok().json(BackfillResponse {
        message: "Backfill complete",
        scanned: report.scanned,
        updated: report.updated,
    }))
}

pub fn order_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/orders")
            .service(create_order)
            .service(list_orders)
            .service(backfill_addresses)
            .service(backfill_codes)
            .service(get_order)
            .service(update_status)
            .service(update_address)
            .service(cancel_order)
            .service(orders_for_user)
            .service(delete_order),
    );
}
